use crate::algorithms::prefix_trie::{PrefixTrie, Rule};
use crate::error::RouterError;
use crate::network::{InterfaceId, interface_code};
use crate::types::Prefix;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Where a packet was sent. `interface == None` means no rule matched and
/// the packet is broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingDecision {
    pub packet_id: u32,
    pub interface: Option<InterfaceId>,
}

impl ForwardingDecision {
    pub fn is_broadcast(&self) -> bool {
        self.interface.is_none()
    }
}

impl fmt::Display for ForwardingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O {} {}", self.packet_id, interface_code(self.interface))
    }
}

/// One line of the forwarding table dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingEntry {
    pub prefix: Prefix,
    pub interface: InterfaceId,
}

impl From<Rule> for ForwardingEntry {
    fn from(rule: Rule) -> Self {
        Self {
            prefix: rule.prefix,
            interface: rule.interface,
        }
    }
}

impl fmt::Display for ForwardingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.interface)
    }
}

/// Longest-prefix-match forwarding over a [`PrefixTrie`].
#[derive(Debug)]
pub struct ForwardingEngine {
    trie: PrefixTrie,
    num_nics: usize,
}

impl ForwardingEngine {
    pub fn new(num_nics: usize) -> Self {
        Self {
            trie: PrefixTrie::new(),
            num_nics,
        }
    }

    /// Installs, replaces or (with `None`) withdraws the rule for `prefix`.
    /// Returns whether the table changed.
    pub fn set_rule(
        &mut self,
        prefix: Prefix,
        interface: Option<InterfaceId>,
    ) -> Result<bool, RouterError> {
        if let Some(nic) = interface {
            nic.ensure_within(self.num_nics)?;
        }
        Ok(self.trie.set(prefix, interface))
    }

    pub fn forward(&self, addr: u32, packet_id: u32) -> ForwardingDecision {
        let interface = self.trie.lookup(addr);
        debug!(
            "Packet {} to {} -> {}",
            packet_id,
            Ipv4Addr::from(addr),
            interface.map_or("broadcast".to_string(), |nic| format!("nic {}", nic))
        );
        ForwardingDecision {
            packet_id,
            interface,
        }
    }

    /// Forwarding table in trie pre-order.
    pub fn entries(&self) -> impl Iterator<Item = ForwardingEntry> + '_ {
        self.trie.iter().map(ForwardingEntry::from)
    }

    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    pub fn clear(&mut self) {
        self.trie.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(s: &str) -> Prefix {
        s.parse().unwrap()
    }

    fn addr(s: &str) -> u32 {
        u32::from(s.parse::<Ipv4Addr>().unwrap())
    }

    #[test]
    fn test_forward_longest_match() {
        let mut engine = ForwardingEngine::new(4);
        engine.set_rule(p("10.0.0.0/8"), Some(InterfaceId(0))).unwrap();
        engine.set_rule(p("10.0.0.0/16"), Some(InterfaceId(1))).unwrap();

        let decision = engine.forward(addr("10.0.5.5"), 1);
        assert_eq!(decision.to_string(), "O 1 1");
        assert!(!decision.is_broadcast());
    }

    #[test]
    fn test_forward_unresolved_is_broadcast() {
        let engine = ForwardingEngine::new(4);
        let decision = engine.forward(addr("1.1.1.1"), 42);
        assert!(decision.is_broadcast());
        assert_eq!(decision.to_string(), "O 42 -1");
    }

    #[test]
    fn test_interface_out_of_range_is_rejected() {
        let mut engine = ForwardingEngine::new(2);
        let err = engine
            .set_rule(p("10.0.0.0/8"), Some(InterfaceId(2)))
            .unwrap_err();
        assert_eq!(
            err,
            RouterError::InterfaceOutOfRange {
                index: 2,
                num_nics: 2
            }
        );
        assert!(engine.trie().is_empty());
        assert_eq!(engine.trie().node_count(), 1);
    }

    #[test]
    fn test_entries_format() {
        let mut engine = ForwardingEngine::new(4);
        engine.set_rule(p("192.168.0.0/16"), Some(InterfaceId(2))).unwrap();
        engine.set_rule(p("10.1.0.0/16"), Some(InterfaceId(3))).unwrap();
        engine.set_rule(p("10.0.0.0/8"), Some(InterfaceId(1))).unwrap();

        let lines: Vec<String> = engine.entries().map(|e| e.to_string()).collect();
        assert_eq!(
            lines,
            vec!["10.0.0.0/8 1", "10.1.0.0/16 3", "192.168.0.0/16 2"]
        );
    }

    #[test]
    fn test_withdraw_then_lookup() {
        let mut engine = ForwardingEngine::new(4);
        engine.set_rule(p("10.0.0.0/8"), Some(InterfaceId(0))).unwrap();
        assert_eq!(engine.set_rule(p("10.0.0.0/8"), None), Ok(true));
        assert_eq!(engine.set_rule(p("10.0.0.0/8"), None), Ok(false));
        assert!(engine.forward(addr("10.2.3.4"), 9).is_broadcast());
        assert_eq!(engine.entries().count(), 0);
    }
}
