use crate::network::{InterfaceId, interface_code};
use crate::types::{Metric, Prefix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A neighbor's announcement of its distance to `prefix`, received on
/// `interface`. The metric does not include the hop to that neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingUpdate {
    pub prefix: Prefix,
    pub interface: InterfaceId,
    pub metric: Metric,
    pub update_id: u32,
}

/// Emitted whenever the router's best route for a prefix changes.
///
/// A withdrawal carries no interface and the unreachable metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub prefix: Prefix,
    pub interface: Option<InterfaceId>,
    pub metric: Metric,
    pub update_id: u32,
}

impl Advertisement {
    pub fn is_withdrawal(&self) -> bool {
        self.interface.is_none()
    }

    pub fn route_change(&self) -> RouteChange {
        RouteChange {
            prefix: self.prefix,
            metric: self.metric,
            update_id: self.update_id,
        }
    }

    pub fn table_change(&self) -> TableChange {
        TableChange {
            prefix: self.prefix,
            interface: self.interface,
        }
    }
}

impl fmt::Display for Advertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.route_change(), self.table_change())
    }
}

/// Route advertisement sent to the neighbors (`A` line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteChange {
    pub prefix: Prefix,
    pub metric: Metric,
    pub update_id: u32,
}

impl fmt::Display for RouteChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A {} {} {}", self.prefix, self.metric, self.update_id)
    }
}

/// Forwarding table change (`T` line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub prefix: Prefix,
    pub interface: Option<InterfaceId>,
}

impl fmt::Display for TableChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T {} {}", self.prefix, interface_code(self.interface))
    }
}
