pub mod rank_tree;

pub use rank_tree::{RankTree, RecencyEntry};
