use conic_core::ExactInt;
use num_bigint::BigInt;
use tracing::warn;

use crate::ConicError as Error;
use crate::dd::constraint::Constraint;
use crate::dd::driver::{Completion, Enumerator, ExtremeRays};
use crate::dd::options::EnumerationOptions;

/// Coordinate type for [`enumerate`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Precision {
    /// Checked `i64`.
    Bounded,
    /// Checked `i128`.
    Wide,
    /// `BigInt`; never overflows.
    Exact,
    /// `i64`, rerun with `BigInt` if a step overflows.
    #[default]
    Adaptive,
}

/// Result of [`enumerate`], tagged with the coordinate type that produced it.
#[derive(Clone, Debug)]
pub enum AnyExtremeRays {
    Bounded(ExtremeRays<i64>),
    Wide(ExtremeRays<i128>),
    Exact(ExtremeRays<BigInt>),
}

impl AnyExtremeRays {
    pub fn len(&self) -> usize {
        match self {
            Self::Bounded(r) => r.len(),
            Self::Wide(r) => r.len(),
            Self::Exact(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_degenerate(&self) -> bool {
        self.is_empty()
    }

    pub fn completion(&self) -> Completion {
        match self {
            Self::Bounded(r) => r.completion(),
            Self::Wide(r) => r.completion(),
            Self::Exact(r) => r.completion(),
        }
    }

    /// Coordinate type actually used; `Adaptive` resolves to `Bounded` or `Exact`.
    pub fn precision(&self) -> Precision {
        match self {
            Self::Bounded(_) => Precision::Bounded,
            Self::Wide(_) => Precision::Wide,
            Self::Exact(_) => Precision::Exact,
        }
    }

    pub fn to_bigint_rays(&self) -> Vec<Vec<BigInt>> {
        fn widen<Z: ExactInt>(rays: &ExtremeRays<Z>) -> Vec<Vec<BigInt>> {
            rays.iter()
                .map(|v| v.iter().map(ExactInt::to_bigint).collect())
                .collect()
        }
        match self {
            Self::Bounded(r) => widen(r),
            Self::Wide(r) => widen(r),
            Self::Exact(r) => widen(r),
        }
    }
}

fn run<Z: ExactInt>(
    dimension: usize,
    constraints: &[Constraint],
    options: EnumerationOptions,
) -> Result<ExtremeRays<Z>, Error> {
    Enumerator::<Z>::new(dimension)
        .constraints(constraints.iter().cloned())
        .options(options)
        .run()
}

/// Enumerates with the coordinate type chosen at runtime.
pub fn enumerate(
    dimension: usize,
    constraints: &[Constraint],
    options: EnumerationOptions,
    precision: Precision,
) -> Result<AnyExtremeRays, Error> {
    match precision {
        Precision::Bounded => run(dimension, constraints, options).map(AnyExtremeRays::Bounded),
        Precision::Wide => run(dimension, constraints, options).map(AnyExtremeRays::Wide),
        Precision::Exact => run(dimension, constraints, options).map(AnyExtremeRays::Exact),
        Precision::Adaptive => match run::<i64>(dimension, constraints, options.clone()) {
            Ok(rays) => Ok(AnyExtremeRays::Bounded(rays)),
            Err(Error::ArithmeticOverflow { constraint }) => {
                warn!(constraint, "i64 overflow, retrying with arbitrary precision");
                run(dimension, constraints, options).map(AnyExtremeRays::Exact)
            }
            Err(err) => Err(err),
        },
    }
}
