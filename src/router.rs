use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::forwarding::{ForwardingDecision, ForwardingEngine, ForwardingEntry};
use crate::network::InterfaceId;
use crate::protocol::{Advertisement, DistanceVectorProcessor, ProcessorStats, RoutingUpdate};
use crate::routing_table::{RouteRecord, RouteTable};
use crate::types::Prefix;
use log::info;
use serde::{Deserialize, Serialize};

/// Snapshot of the router's table sizes and protocol counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStats {
    pub forwarding_rules: usize,
    pub trie_nodes: usize,
    pub routes: usize,
    pub protocol: ProcessorStats,
}

/// State of one simulated router: the forwarding trie, the learned route
/// table, and the distance-vector processor feeding it.
///
/// The two tables are independent; routing updates never touch the
/// forwarding trie.
#[derive(Debug)]
pub struct Router {
    config: RouterConfig,
    forwarding: ForwardingEngine,
    routes: RouteTable,
    processor: DistanceVectorProcessor,
}

impl Router {
    pub fn initialize(config: RouterConfig) -> Result<Self, RouterError> {
        config.validate()?;
        info!(
            "Initializing router with {} interfaces (unreachable metric {})",
            config.num_nics, config.metric_unreachable
        );

        Ok(Self {
            config,
            forwarding: ForwardingEngine::new(config.num_nics),
            routes: RouteTable::new(config),
            processor: DistanceVectorProcessor::new(),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Installs, replaces or (with `None`) withdraws a forwarding rule.
    pub fn set_forwarding_rule(
        &mut self,
        prefix: Prefix,
        interface: Option<InterfaceId>,
    ) -> Result<bool, RouterError> {
        self.forwarding.set_rule(prefix, interface)
    }

    pub fn forward(&self, addr: u32, packet_id: u32) -> ForwardingDecision {
        self.forwarding.forward(addr, packet_id)
    }

    pub fn forwarding_table(&self) -> impl Iterator<Item = ForwardingEntry> + '_ {
        self.forwarding.entries()
    }

    pub fn process_routing_update(
        &mut self,
        update: RoutingUpdate,
    ) -> Result<Option<Advertisement>, RouterError> {
        self.processor.process_update(&mut self.routes, update)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteRecord> {
        self.routes.iter()
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.routes
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            forwarding_rules: self.forwarding.trie().len(),
            trie_nodes: self.forwarding.trie().node_count(),
            routes: self.routes.len(),
            protocol: self.processor.stats(),
        }
    }

    /// Releases both tables and returns the final statistics.
    pub fn teardown(mut self) -> RouterStats {
        let stats = self.stats();
        self.forwarding.clear();
        self.routes.clear();
        info!(
            "Router torn down: {} forwarding rules, {} routes, {} updates processed",
            stats.forwarding_rules, stats.routes, stats.protocol.updates
        );
        stats
    }
}
