pub mod prefix_trie;

pub use prefix_trie::{PrefixTrie, Rule};
