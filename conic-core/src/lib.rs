//! Exact integer, bitset, and graph primitives shared by the `conic` extreme-ray engine.
//!
//! - exact integer scalars with explicit overflow reporting (`int`)
//! - compact growable bitsets for zero-sets and supports (`bitset`)
//! - undirected adjacency graphs over enumerated rays (`adjacency_list`)

pub mod adjacency_list;
pub mod bitset;
pub mod int;

pub use adjacency_list::{AdjacencyList, AdjacencyListBuilder};
pub use bitset::BitSet;
pub use int::{ExactInt, IntOverflow, Sign};
