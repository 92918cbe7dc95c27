use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::network::{InterfaceId, interface_code};
use crate::types::{Metric, Prefix};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subnet learned from the neighbors, with the last metric each
/// interface advertised for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    prefix: Prefix,
    best_interface: Option<InterfaceId>,
    best_metric: Metric,
    neighbor_metrics: Vec<Metric>,
}

impl RouteRecord {
    fn new(prefix: Prefix, interface: InterfaceId, cost: Metric, config: &RouterConfig) -> Self {
        let mut neighbor_metrics = vec![config.metric_unreachable; config.num_nics];
        neighbor_metrics[interface.index()] = cost;
        Self {
            prefix,
            best_interface: Some(interface),
            best_metric: cost,
            neighbor_metrics,
        }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn best_interface(&self) -> Option<InterfaceId> {
        self.best_interface
    }

    pub fn best_metric(&self) -> Metric {
        self.best_metric
    }

    /// Metric last heard from `interface`, `None` when the interface does
    /// not exist on this router.
    pub fn neighbor_metric(&self, interface: InterfaceId) -> Option<Metric> {
        self.neighbor_metrics.get(interface.index()).copied()
    }

    pub fn neighbor_metrics(&self) -> &[Metric] {
        &self.neighbor_metrics
    }

    pub(crate) fn set_neighbor_metric(&mut self, interface: InterfaceId, metric: Metric) {
        self.neighbor_metrics[interface.index()] = metric;
    }

    /// Switches the best route to an interface already advertising the
    /// current best metric.
    pub(crate) fn prefer(&mut self, interface: InterfaceId) {
        debug_assert_eq!(self.neighbor_metric(interface), Some(self.best_metric));
        self.best_interface = Some(interface);
    }

    /// Picks the interface with the lowest metric, the lowest index winning
    /// ties. Returns `true` when every neighbor reports the route as
    /// unreachable, in which case the record must be removed.
    pub fn recompute_best(&mut self, metric_unreachable: Metric) -> bool {
        let mut best_interface = None;
        let mut best_metric = metric_unreachable;

        for (index, &metric) in self.neighbor_metrics.iter().enumerate() {
            if metric < best_metric {
                best_interface = Some(InterfaceId(index));
                best_metric = metric;
            }
        }

        self.best_interface = best_interface;
        self.best_metric = best_metric;
        best_interface.is_none()
    }
}

impl fmt::Display for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [",
            self.prefix,
            interface_code(self.best_interface),
            self.best_metric
        )?;
        for (index, metric) in self.neighbor_metrics.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", metric)?;
        }
        write!(f, "]")
    }
}

/// Learned routes, kept in insertion-rule order.
///
/// A new record is spliced in front of the first record whose address is
/// not greater than the new one and whose prefix is strictly shorter, or
/// appended when there is none. Enumeration order is observable and must
/// follow this rule exactly.
#[derive(Debug, Clone)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
    config: RouterConfig,
}

impl RouteTable {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            records: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn find(&self, prefix: Prefix) -> Option<&RouteRecord> {
        self.records.iter().find(|record| record.prefix == prefix)
    }

    pub fn find_mut(&mut self, prefix: Prefix) -> Option<&mut RouteRecord> {
        self.records.iter_mut().find(|record| record.prefix == prefix)
    }

    pub fn position(&self, prefix: Prefix) -> Option<usize> {
        self.records.iter().position(|record| record.prefix == prefix)
    }

    pub(crate) fn record(&self, index: usize) -> &RouteRecord {
        &self.records[index]
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> &mut RouteRecord {
        &mut self.records[index]
    }

    /// Creates the record for a prefix first advertised by `interface` with
    /// `advertised_metric`. The caller makes sure the prefix is not known yet.
    pub fn insert(
        &mut self,
        prefix: Prefix,
        interface: InterfaceId,
        advertised_metric: Metric,
    ) -> Result<&RouteRecord, RouterError> {
        let interface = interface.ensure_within(self.config.num_nics)?;
        debug_assert!(self.find(prefix).is_none(), "duplicate route for {}", prefix);

        let record = RouteRecord::new(
            prefix,
            interface,
            self.config.cost(advertised_metric),
            &self.config,
        );
        let index = self
            .records
            .iter()
            .position(|r| r.prefix.addr() <= prefix.addr() && r.prefix.len() < prefix.len())
            .unwrap_or(self.records.len());

        debug!("New route {} via nic {} at position {}", prefix, interface, index);
        self.records.insert(index, record);
        Ok(&self.records[index])
    }

    /// Recomputes the best route of the record at `index`; see
    /// [`RouteRecord::recompute_best`].
    pub fn recompute_best(&mut self, index: usize) -> bool {
        let unreachable = self.config.metric_unreachable;
        self.records[index].recompute_best(unreachable)
    }

    pub fn remove(&mut self, prefix: Prefix) -> Option<RouteRecord> {
        let index = self.position(prefix)?;
        Some(self.remove_at(index))
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> RouteRecord {
        let record = self.records.remove(index);
        debug!("Removed route {}", record.prefix);
        record
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
