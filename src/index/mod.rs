//! Geohash prefix-tree spatial index.
//!
//! ```text
//! root ("", 3)
//! ├─ 9 ("9", 2) ─ q ─ 8 ─ y ─ y ─ k ("9q8yyk", 2) stores: [sf-1, sf-2]
//! └─ d ("d", 1) ─ r ─ 5 ─ r ─ e ─ g ("dr5reg", 1) stores: [nyc]
//! ```
//!
//! Every node counts the stores beneath it; only nodes at the index precision
//! (or at the end of a shorter geohash) hold leaf entries.

pub mod node;
pub mod snapshot;
pub mod tree;

pub use node::{GeohashNode, StoreRef};
pub use tree::{DEFAULT_PRECISION, GeohashTree, TreeStats};
