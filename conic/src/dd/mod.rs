//! Double-description engine.
//!
//! Layering, leaves first: [`vector`] (exact arithmetic), [`zero`] (zero-set bookkeeping and
//! rank queries), [`store`] (the ray arena), [`engine`] (one constraint step), and [`driver`]
//! (the full run).

mod constraint;
pub mod driver;
pub mod engine;
mod filter;
mod options;
mod precision;
mod ray;
pub mod store;
pub mod vector;
pub mod zero;

pub use constraint::{Constraint, ConstraintKind};
pub use driver::{Completion, Enumerator, ExtremeRays, Steps};
pub use engine::{AppliedConstraint, ConeState, EnumerationStats, StepReport};
pub use filter::SupportFilter;
pub use options::{AdjacencyTest, ConstraintOrder, EnumerationOptions};
pub use precision::{AnyExtremeRays, Precision, enumerate};
pub use ray::{Ray, RayId};
pub use store::RayStore;
pub use zero::ZeroSet;
