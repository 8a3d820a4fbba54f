//! Extreme-ray enumeration for pointed polyhedral cones.
//!
//! The cone is the non-negative orthant cut by homogeneous equality and inequality
//! constraints. [`dd::Enumerator`] applies the constraints one at a time with the double
//! description method and yields every extreme ray as a primitive integer vector.
//!
//! ```
//! use conic::dd::{Constraint, Enumerator};
//!
//! let rays = Enumerator::<i64>::new(3)
//!     .constraint(Constraint::inequality([1, -1, 0]))
//!     .run()
//!     .unwrap();
//! let vectors: Vec<Vec<i64>> = rays.iter().map(<[i64]>::to_vec).collect();
//! assert_eq!(vectors, vec![vec![1, 0, 0], vec![0, 0, 1], vec![1, 1, 0]]);
//! ```

pub mod dd;

pub use conic_core::{AdjacencyList, BitSet, ExactInt, IntOverflow, Sign};

/// Errors surfaced by the enumeration engine.
///
/// An empty ray set is not an error: a cone that collapses to the origin is reported through
/// [`dd::ExtremeRays::is_degenerate`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConicError {
    #[error("constraint {constraint} has {found} coefficients but the cone has dimension {expected}")]
    DimensionMismatch {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("bounded-width arithmetic overflowed while applying constraint {constraint}")]
    ArithmeticOverflow { constraint: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
