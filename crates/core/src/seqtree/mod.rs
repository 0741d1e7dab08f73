//! The sequence-trie dominance index (§4.8): per-branch-point preference
//! hierarchies over sequence prefixes, with a plain and a pruning variant.
//!
//! Ground truth: `operators/seqtree.py`, `operators/seqtreehierarchy.py`,
//! `operators/seqtreeindex.py`.

pub mod index;
pub mod node;
pub mod preference_dict;

pub use index::SeqIndex;
pub use node::SeqTree;
pub use preference_dict::{NodeHierarchy, PreferenceDict};
