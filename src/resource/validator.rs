//! Response Validator
//!
//! Decides from a creation response body whether the provider accepted the
//! resource. Every check is a pure function of the response.

use super::kind::ResourceKind;
use serde_json::Value;

pub const SUCCESS: &str = "SUCCESS";
pub const PASSED: &str = "PASSED";
pub const CONNECTED: &str = "CONNECTED";

/// Connectivity phases a new connector must pass
pub const REQUIRED_CONNECTOR_PHASES: [&str; 3] = [
    "database_connection",
    "host_connection",
    "certificate_validation",
];

/// Setup test fields searched when matching a phase
const DESCRIPTIVE_FIELDS: [&str; 3] = ["title", "description", "message"];

/// Validate a creation response for `kind`
pub fn validate(kind: ResourceKind, response: &Value) -> bool {
    match kind {
        ResourceKind::Warehouse => validate_warehouse(response),
        ResourceKind::Connector => validate_connector(response),
        ResourceKind::Destination => validate_destination(response),
    }
}

/// Group: the response code is `SUCCESS`
pub fn validate_warehouse(response: &Value) -> bool {
    code_is_success(response)
}

/// Connector: `SUCCESS`, every required phase passed and setup state `CONNECTED`
pub fn validate_connector(response: &Value) -> bool {
    if !code_is_success(response) {
        return false;
    }

    let tests = setup_tests(response);
    let phases_passed = REQUIRED_CONNECTOR_PHASES
        .iter()
        .all(|phase| phase_passed(phase, tests));

    phases_passed && eq_ci(response.pointer("/data/status/setup_state"), CONNECTED)
}

/// Destination: `SUCCESS`, setup status `CONNECTED` and the first setup test passed.
/// Later setup tests are not consulted.
pub fn validate_destination(response: &Value) -> bool {
    code_is_success(response)
        && eq_ci(response.pointer("/data/setup_status"), CONNECTED)
        && setup_tests(response)
            .first()
            .map(|test| eq_ci(test.get("status"), PASSED))
            .unwrap_or(false)
}

/// Human-readable reason for a rejected response
pub fn failure_reason(response: &Value) -> String {
    if let Some(message) = non_empty_str(response.get("message")) {
        return format!("Error message: {}", message);
    }

    let tests = setup_tests(response);
    let test_message = tests
        .iter()
        .find(|test| !eq_ci(test.get("status"), PASSED))
        .or_else(|| tests.first())
        .and_then(|test| non_empty_str(test.get("message")))
        .unwrap_or("no details");

    format!("Test run: {}", test_message)
}

fn code_is_success(response: &Value) -> bool {
    eq_ci(response.get("code"), SUCCESS)
}

fn eq_ci(value: Option<&Value>, expected: &str) -> bool {
    value
        .and_then(|v| v.as_str())
        .map(|s| s.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn setup_tests(response: &Value) -> &[Value] {
    response
        .pointer("/data/setup_tests")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// How closely a setup test's text names a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PhaseMatch {
    /// Only the phase's subject term (`database`, `host`, `certificate`)
    Subject,
    /// The full phase name with underscores as spaces
    Full,
}

/// Fuzzy match of a phase against a setup test's descriptive text
fn phase_match(phase: &str, test: &Value) -> Option<PhaseMatch> {
    let normalized = phase.replace('_', " ").to_lowercase();
    let subject = normalized.split(' ').next().unwrap_or(&normalized);

    DESCRIPTIVE_FIELDS
        .iter()
        .filter_map(|field| test.get(*field).and_then(|v| v.as_str()))
        .map(str::to_lowercase)
        .filter_map(|text| {
            if text.contains(&normalized) {
                Some(PhaseMatch::Full)
            } else if text.contains(subject) {
                Some(PhaseMatch::Subject)
            } else {
                None
            }
        })
        .max()
}

/// A phase passes when one of its closest-matching setup tests passed.
/// Subject-only matches count only when no test names the full phase.
fn phase_passed(phase: &str, tests: &[Value]) -> bool {
    let matches: Vec<(PhaseMatch, &Value)> = tests
        .iter()
        .filter_map(|test| phase_match(phase, test).map(|m| (m, test)))
        .collect();

    let Some(best) = matches.iter().map(|(m, _)| *m).max() else {
        return false;
    };

    matches
        .iter()
        .filter(|(m, _)| *m == best)
        .any(|(_, test)| eq_ci(test.get("status"), PASSED))
}
