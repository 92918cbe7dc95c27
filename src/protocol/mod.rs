//! Distance-vector route processing.
//!
//! Each routing update is applied to the [`RouteTable`] on its own. The
//! neighbor's metric is stored, the best route recomputed when it may have
//! moved, and an [`Advertisement`] returned when the best route changed.

pub mod messages;

pub use messages::*;

use crate::error::RouterError;
use crate::network::InterfaceId;
use crate::routing_table::RouteTable;
use crate::types::{Metric, Prefix};
use log::debug;
use serde::{Deserialize, Serialize};

/// Counters kept across updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    pub updates: u64,
    pub advertisements: u64,
    pub withdrawals: u64,
}

#[derive(Debug, Default)]
pub struct DistanceVectorProcessor {
    stats: ProcessorStats,
}

impl DistanceVectorProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Applies one routing update. Returns the advertisement to send, if the
    /// best route for the prefix changed or was re-confirmed by its neighbor.
    pub fn process_update(
        &mut self,
        table: &mut RouteTable,
        update: RoutingUpdate,
    ) -> Result<Option<Advertisement>, RouterError> {
        let config = *table.config();
        let nic = update.interface.ensure_within(config.num_nics)?;
        let prefix = update.prefix;
        let cost = config.cost(update.metric);
        self.stats.updates += 1;

        let Some(index) = table.position(prefix) else {
            if config.is_unreachable(cost) {
                debug!("Update {}: {} unreachable via nic {}, nothing to withdraw",
                       update.update_id, prefix, nic);
                return Ok(None);
            }
            table.insert(prefix, nic, update.metric)?;
            return Ok(Some(self.advertise(prefix, Some(nic), cost, update.update_id)));
        };

        if config.is_unreachable(cost) {
            let record = table.record_mut(index);
            record.set_neighbor_metric(nic, config.metric_unreachable);
            if record.best_interface() != Some(nic) {
                debug!("Update {}: backup nic {} lost {}", update.update_id, nic, prefix);
                return Ok(None);
            }

            if table.recompute_best(index) {
                table.remove_at(index);
                return Ok(Some(self.advertise(
                    prefix,
                    None,
                    config.metric_unreachable,
                    update.update_id,
                )));
            }
            return Ok(Some(self.advertise_best(table, index, update.update_id)));
        }

        let record = table.record_mut(index);
        let best_interface = record.best_interface();
        let best_metric = record.best_metric();
        record.set_neighbor_metric(nic, cost);

        if best_interface == Some(nic) && cost >= best_metric {
            // The best neighbor got worse (or stayed put): another one may
            // now be better.
            table.recompute_best(index);
            Ok(Some(self.advertise_best(table, index, update.update_id)))
        } else if cost < best_metric {
            table.recompute_best(index);
            Ok(Some(self.advertise_best(table, index, update.update_id)))
        } else if cost == best_metric && best_interface.is_some_and(|best| nic < best) {
            record.prefer(nic);
            Ok(Some(self.advertise_best(table, index, update.update_id)))
        } else {
            debug!("Update {}: nic {} now at {} for {}, best unchanged",
                   update.update_id, nic, cost, prefix);
            Ok(None)
        }
    }

    fn advertise_best(&mut self, table: &RouteTable, index: usize, update_id: u32) -> Advertisement {
        let record = table.record(index);
        self.advertise(record.prefix(), record.best_interface(), record.best_metric(), update_id)
    }

    fn advertise(
        &mut self,
        prefix: Prefix,
        interface: Option<InterfaceId>,
        metric: Metric,
        update_id: u32,
    ) -> Advertisement {
        self.stats.advertisements += 1;
        if interface.is_none() {
            self.stats.withdrawals += 1;
        }
        let advertisement = Advertisement {
            prefix,
            interface,
            metric,
            update_id,
        };
        debug!("Advertising {:?}", advertisement);
        advertisement
    }
}
