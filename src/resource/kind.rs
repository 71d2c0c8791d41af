//! Resource kinds
//!
//! The three resource kinds the provisioner creates, the collections the
//! name resolver can search, and the CLI target selector.

use serde::Serialize;
use std::fmt;

/// Kind of provider resource
///
/// Variant order is dependency order: groups first, then the connectors and
/// destinations attached to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Group (the warehouse container)
    Warehouse,
    Connector,
    Destination,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Warehouse, Self::Connector, Self::Destination];

    /// Creation route under the API version
    pub fn route(self) -> &'static str {
        match self {
            Self::Warehouse => "groups",
            Self::Connector => "connectors",
            Self::Destination => "destinations",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "group",
            Self::Connector => "connector",
            Self::Destination => "destination",
        }
    }

    /// Whether the kind is attached to a parent group
    pub fn needs_group(self) -> bool {
        !matches!(self, Self::Warehouse)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing collection searchable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Groups,
    Connectors,
}

impl Collection {
    pub fn route(self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::Connectors => "connectors",
        }
    }

    /// Item field compared against the searched name
    pub fn match_field(self) -> &'static str {
        match self {
            Self::Groups => "name",
            Self::Connectors => "schema",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Groups => "group",
            Self::Connectors => "connector",
        })
    }
}

/// What a run should create
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    Groups,
    Connectors,
    Destinations,
    /// Group, then connector, then destination
    All,
}

impl Target {
    /// Kinds created for this target, in dependency order
    pub fn kinds(self) -> &'static [ResourceKind] {
        match self {
            Self::Groups => &[ResourceKind::Warehouse],
            Self::Connectors => &[ResourceKind::Connector],
            Self::Destinations => &[ResourceKind::Destination],
            Self::All => &ResourceKind::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(ResourceKind::Warehouse.route(), "groups");
        assert_eq!(ResourceKind::Connector.route(), "connectors");
        assert_eq!(ResourceKind::Destination.route(), "destinations");
        assert_eq!(Collection::Connectors.match_field(), "schema");
    }

    #[test]
    fn test_kind_order_is_dependency_order() {
        let mut kinds = vec![ResourceKind::Destination, ResourceKind::Warehouse, ResourceKind::Connector];
        kinds.sort();
        assert_eq!(kinds, ResourceKind::ALL);
    }

    #[test]
    fn test_all_target_sequences_every_kind() {
        assert_eq!(Target::All.kinds(), &ResourceKind::ALL);
        assert_eq!(Target::Destinations.kinds(), &[ResourceKind::Destination]);
    }
}
