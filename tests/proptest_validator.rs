//! Property-based tests using proptest
//!
//! These tests check the response validators and listing scans over
//! randomized provider responses.

use ftprov::resource::{failure_reason, resolver::scan_page, validate, Collection, PageScan, ResourceKind};
use proptest::prelude::*;
use serde_json::{json, Value};

const PHASE_TITLES: [&str; 3] = [
    "Connecting to database",
    "Connecting to host",
    "Validating certificate",
];

fn arb_status() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PASSED".to_string()),
        Just("passed".to_string()),
        Just("FAILED".to_string()),
        Just("WARNING".to_string()),
        Just("SKIPPED".to_string()),
    ]
}

fn arb_code() -> impl Strategy<Value = String> {
    prop_oneof!["[sS][uU][cC][cC][eE][sS][sS]", "[A-Za-z]{0,12}"]
}

fn connector_response(code: &str, statuses: &[String], setup_state: &str) -> Value {
    let tests: Vec<Value> = PHASE_TITLES
        .iter()
        .zip(statuses)
        .map(|(title, status)| json!({"title": title, "status": status, "message": format!("{} result", title)}))
        .collect();
    json!({
        "code": code,
        "data": {"status": {"setup_state": setup_state}, "setup_tests": tests}
    })
}

fn destination_response(first: &str, rest: &[String]) -> Value {
    let mut tests = vec![json!({"title": "Connection test", "status": first})];
    tests.extend(rest.iter().map(|s| json!({"title": "Permission test", "status": s})));
    json!({
        "code": "Success",
        "data": {"setup_status": "CONNECTED", "setup_tests": tests}
    })
}

fn arb_group_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9_]{0,15}", 0..30)
}

proptest! {
    /// Validation only depends on the response and repeats identically
    #[test]
    fn validate_is_deterministic(
        code in arb_code(),
        statuses in prop::collection::vec(arb_status(), 3),
        connected in any::<bool>(),
    ) {
        let response = connector_response(&code, &statuses, if connected { "connected" } else { "incomplete" });
        for kind in ResourceKind::ALL {
            prop_assert_eq!(validate(kind, &response), validate(kind, &response));
        }
    }

    /// Groups pass exactly when the code is SUCCESS, in any case
    #[test]
    fn warehouse_follows_code(code in arb_code()) {
        let response = json!({"code": code, "data": {"id": "grp_1"}});
        prop_assert_eq!(validate(ResourceKind::Warehouse, &response), code.eq_ignore_ascii_case("success"));
    }

    /// A connector passes exactly when every phase passed and setup is connected
    #[test]
    fn connector_requires_every_phase(
        statuses in prop::collection::vec(arb_status(), 3),
        connected in any::<bool>(),
    ) {
        let response = connector_response("SUCCESS", &statuses, if connected { "CONNECTED" } else { "broken" });
        let expected = connected && statuses.iter().all(|s| s.eq_ignore_ascii_case("passed"));
        prop_assert_eq!(validate(ResourceKind::Connector, &response), expected);
    }

    /// Only the first destination setup test decides the outcome
    #[test]
    fn destination_uses_first_test_only(
        first in arb_status(),
        rest in prop::collection::vec(arb_status(), 0..5),
    ) {
        let response = destination_response(&first, &rest);
        prop_assert_eq!(
            validate(ResourceKind::Destination, &response),
            first.eq_ignore_ascii_case("passed")
        );
    }

    /// Every rejected response gets a non-empty reason with a known prefix
    #[test]
    fn failure_reason_is_always_reported(
        message in proptest::option::of("[ -~]{0,40}"),
        statuses in prop::collection::vec(arb_status(), 3),
    ) {
        let mut response = connector_response("FAILED", &statuses, "broken");
        if let Some(m) = &message {
            response["message"] = json!(m);
        }
        let reason = failure_reason(&response);
        prop_assert!(reason.starts_with("Error message: ") || reason.starts_with("Test run: "));
        prop_assert!(reason.len() > "Test run: ".len());
    }

    /// A page scan finds a name exactly when some item carries it
    #[test]
    fn scan_finds_present_names(names in arb_group_names(), wanted in "[a-z][a-z0-9_]{0,15}") {
        let items: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({"id": format!("grp_{}", i), "name": name}))
            .collect();
        let page = json!({"code": "Success", "data": {"items": items}});

        let scan = scan_page(Collection::Groups, &wanted.to_uppercase(), &page).unwrap();
        match names.iter().position(|n| *n == wanted) {
            Some(i) => prop_assert_eq!(scan, PageScan::Found(format!("grp_{}", i))),
            None => prop_assert_eq!(scan, PageScan::Exhausted),
        }
    }
}
