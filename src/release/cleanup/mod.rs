//! Pruning of the staged tree.
//!
//! - [`exclusion`] - rule lists and the `should_exclude` decision
//! - [`tree`] - ordered directory snapshot and pruning

pub mod exclusion;
pub mod tree;

pub use exclusion::{ExclusionMatch, ExclusionRules, PatternRule, should_exclude};
pub use tree::{TreeNode, prune, snapshot};
