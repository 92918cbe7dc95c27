//! Binary trie over IPv4 address bits, used as the forwarding table.
//!
//! Every node sits at the depth equal to the number of address bits consumed
//! to reach it, so a node's depth is also the length of the prefix it can
//! hold. Walking down while remembering the last rule seen therefore yields
//! the longest matching prefix.
//!
//! Withdrawing a prefix only clears the rule of its node. The node, and the
//! placeholder nodes above it, stay in the tree so a later re-announcement
//! reuses the existing path.

use crate::network::InterfaceId;
use crate::types::{MAX_PREFIX_LEN, Prefix, address_bit};
use log::debug;

/// An active forwarding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub prefix: Prefix,
    pub interface: InterfaceId,
}

#[derive(Debug, Default)]
struct TrieNode {
    /// Index 0 follows a zero bit, index 1 a one bit.
    children: [Option<Box<TrieNode>>; 2],
    rule: Option<Rule>,
}

impl TrieNode {
    fn child(&self, bit: bool) -> Option<&TrieNode> {
        self.children[bit as usize].as_deref()
    }
}

#[derive(Debug)]
pub struct PrefixTrie {
    root: TrieNode,
    rules: usize,
    nodes: usize,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
            rules: 0,
            nodes: 1,
        }
    }

    /// Installs (`Some`) or withdraws (`None`) the rule for `prefix`.
    ///
    /// Returns whether the table changed. Withdrawing a prefix that was never
    /// installed is a no-op.
    pub fn set(&mut self, prefix: Prefix, interface: Option<InterfaceId>) -> bool {
        match interface {
            Some(interface) => self.insert(prefix, interface),
            None => self.withdraw(prefix),
        }
    }

    fn insert(&mut self, prefix: Prefix, interface: InterfaceId) -> bool {
        let mut created = 0;
        let mut node = &mut self.root;
        for depth in 0..prefix.len() {
            node = node.children[prefix.bit(depth) as usize]
                .get_or_insert_with(|| {
                    created += 1;
                    Box::default()
                })
                .as_mut();
        }

        let rule = Rule { prefix, interface };
        let previous = node.rule.replace(rule);
        self.nodes += created;
        if previous.is_none() {
            self.rules += 1;
        }

        let changed = previous != Some(rule);
        if changed {
            debug!(
                "Forwarding rule {} -> nic {} ({} new nodes)",
                prefix, interface, created
            );
        }
        changed
    }

    fn withdraw(&mut self, prefix: Prefix) -> bool {
        let mut node = &mut self.root;
        for depth in 0..prefix.len() {
            match node.children[prefix.bit(depth) as usize].as_deref_mut() {
                Some(child) => node = child,
                None => return false,
            }
        }

        // The node itself is kept as a placeholder.
        match node.rule.take() {
            Some(rule) => {
                self.rules -= 1;
                debug!("Withdrew forwarding rule {} (was nic {})", prefix, rule.interface);
                true
            }
            None => false,
        }
    }

    /// Longest-prefix match for `addr`.
    pub fn longest_match(&self, addr: u32) -> Option<Rule> {
        let mut best = None;
        let mut node = Some(&self.root);
        let mut depth = 0;

        while let Some(current) = node {
            // Deeper rules are always more specific.
            if current.rule.is_some() {
                best = current.rule;
            }
            if depth == MAX_PREFIX_LEN {
                break;
            }
            node = current.child(address_bit(addr, depth));
            depth += 1;
        }

        best
    }

    /// Outgoing interface for `addr`, or `None` when no rule matches.
    pub fn lookup(&self, addr: u32) -> Option<InterfaceId> {
        self.longest_match(addr).map(|rule| rule.interface)
    }

    /// Exact-match lookup of the rule installed for `prefix`.
    pub fn get(&self, prefix: Prefix) -> Option<InterfaceId> {
        let mut node = &self.root;
        for depth in 0..prefix.len() {
            node = node.child(prefix.bit(depth))?;
        }
        node.rule.map(|rule| rule.interface)
    }

    /// Active rules in pre-order: a prefix comes before its sub-prefixes, and
    /// the zero branch is visited before the one branch.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![&self.root],
        }
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules == 0
    }

    /// Number of allocated nodes, placeholders and the root included.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Drops every rule and node.
    pub fn clear(&mut self) {
        let released = self.release();
        debug!("Cleared forwarding trie ({} nodes released)", released);
    }

    fn release(&mut self) -> usize {
        let mut released = 0;
        let mut stack: Vec<Box<TrieNode>> =
            self.root.children.iter_mut().filter_map(Option::take).collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.children.iter_mut().filter_map(Option::take));
            released += 1;
        }
        self.root.rule = None;
        self.rules = 0;
        self.nodes = 1;
        released
    }
}

impl Drop for PrefixTrie {
    fn drop(&mut self) {
        self.release();
    }
}

impl<'a> IntoIterator for &'a PrefixTrie {
    type Item = Rule;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator over the active rules of a [`PrefixTrie`].
pub struct Iter<'a> {
    stack: Vec<&'a TrieNode>,
}

impl Iterator for Iter<'_> {
    type Item = Rule;

    fn next(&mut self) -> Option<Rule> {
        while let Some(node) = self.stack.pop() {
            // one pushed first so the zero subtree pops first
            if let Some(one) = node.child(true) {
                self.stack.push(one);
            }
            if let Some(zero) = node.child(false) {
                self.stack.push(zero);
            }
            if node.rule.is_some() {
                return node.rule;
            }
        }
        None
    }
}
