//! Whole-run driver: orders the constraints, feeds them to a [`ConeState`], and packages the
//! final rays.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use conic_core::{AdjacencyList, AdjacencyListBuilder, ExactInt, IntOverflow};
use tracing::{debug, warn};

use crate::ConicError as Error;
use crate::dd::constraint::Constraint;
use crate::dd::engine::{AppliedConstraint, ConeState, EnumerationStats, StepReport};
use crate::dd::options::{ConstraintOrder, EnumerationOptions};
use crate::dd::ray::Ray;
use crate::dd::store::RayStore;
use crate::dd::zero::RankScratch;

type AbortPredicate = Box<dyn FnMut(&StepReport) -> bool + Send>;

/// Whether every constraint was applied.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Completion {
    Complete,
    /// The run stopped early; the rays describe the cone of the first `steps_applied`
    /// constraints in application order.
    Aborted { steps_applied: usize },
}

/// Builder for a full enumeration over a fixed constraint list.
pub struct Enumerator<Z: ExactInt = i64> {
    dimension: usize,
    constraints: Vec<Constraint>,
    options: EnumerationOptions,
    abort: Option<AbortPredicate>,
    _coords: PhantomData<fn() -> Z>,
}

impl<Z: ExactInt> fmt::Debug for Enumerator<Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumerator")
            .field("dimension", &self.dimension)
            .field("constraints", &self.constraints.len())
            .field("options", &self.options)
            .field("abort", &self.abort.is_some())
            .finish()
    }
}

impl<Z: ExactInt> Enumerator<Z> {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            constraints: Vec::new(),
            options: EnumerationOptions::default(),
            abort: None,
            _coords: PhantomData,
        }
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn options(mut self, options: EnumerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Stops the run after any step for which `predicate` returns `true`.
    pub fn abort_when<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&StepReport) -> bool + Send + 'static,
    {
        self.abort = Some(Box::new(predicate));
        self
    }

    /// Indices into the constraint list, in the order they will be applied.
    pub fn application_order(&self) -> Vec<usize> {
        let all = 0..self.constraints.len();
        match self.options.constraint_order() {
            ConstraintOrder::AsGiven => all.collect(),
            ConstraintOrder::EqualitiesFirst => {
                let (mut order, inequalities): (Vec<usize>, Vec<usize>) =
                    all.partition(|&i| self.constraints[i].is_equality());
                order.extend(inequalities);
                order
            }
        }
    }

    /// Validates every constraint, then returns the lazy step sequence.
    pub fn steps(self) -> Result<Steps<Z>, Error> {
        for (index, constraint) in self.constraints.iter().enumerate() {
            constraint.check_dimension(index, self.dimension)?;
        }
        let order = self.application_order();
        let state = ConeState::new(self.dimension, self.options)?;
        debug!(
            dimension = self.dimension,
            constraints = self.constraints.len(),
            "starting enumeration"
        );
        Ok(Steps {
            state,
            constraints: self.constraints,
            order,
            cursor: 0,
            abort: self.abort,
            halted: false,
        })
    }

    pub fn run(self) -> Result<ExtremeRays<Z>, Error> {
        let mut steps = self.steps()?;
        for report in steps.by_ref() {
            report?;
        }
        Ok(steps.into_output())
    }
}

/// Step-by-step view of a run. Only the current ray store is kept.
///
/// Yields one [`StepReport`] per applied constraint and stops after the first error, after
/// the last constraint, or when the ray cap or abort predicate fires.
pub struct Steps<Z: ExactInt = i64> {
    state: ConeState<Z>,
    constraints: Vec<Constraint>,
    order: Vec<usize>,
    cursor: usize,
    abort: Option<AbortPredicate>,
    halted: bool,
}

impl<Z: ExactInt> fmt::Debug for Steps<Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Steps")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("remaining", &(self.order.len() - self.cursor))
            .field("halted", &self.halted)
            .finish()
    }
}

impl<Z: ExactInt> Steps<Z> {
    #[inline]
    pub fn state(&self) -> &ConeState<Z> {
        &self.state
    }

    #[inline]
    pub fn store(&self) -> &RayStore<Z> {
        self.state.store()
    }

    #[inline]
    pub fn steps_applied(&self) -> usize {
        self.cursor
    }

    pub fn completion(&self) -> Completion {
        if self.cursor == self.order.len() {
            Completion::Complete
        } else {
            Completion::Aborted {
                steps_applied: self.cursor,
            }
        }
    }

    /// Final (or partial) result. Rays are in store order.
    pub fn into_output(self) -> ExtremeRays<Z> {
        let completion = self.completion();
        let dimension = self.state.dimension();
        let (store, constraints, stats) = self.state.into_parts();
        ExtremeRays {
            dimension,
            rays: store.into_rays(),
            constraints,
            stats,
            completion,
        }
    }

    fn should_stop(&mut self, report: &StepReport) -> bool {
        if let Some(limit) = self.state.options().max_rays()
            && report.ray_count > limit
        {
            warn!(
                rays = report.ray_count,
                limit,
                steps_applied = self.cursor,
                "ray cap exceeded, stopping early"
            );
            return true;
        }
        if let Some(predicate) = self.abort.as_mut()
            && predicate(report)
        {
            warn!(steps_applied = self.cursor, "enumeration aborted by caller");
            return true;
        }
        false
    }
}

impl<Z: ExactInt> Iterator for Steps<Z> {
    type Item = Result<StepReport, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let Some(&source) = self.order.get(self.cursor) else {
            self.halted = true;
            return None;
        };
        let report = match self.state.apply_from(&self.constraints[source], source) {
            Ok(report) => report,
            Err(err) => {
                self.halted = true;
                return Some(Err(err));
            }
        };
        self.cursor += 1;
        if self.cursor < self.order.len() && self.should_stop(&report) {
            self.halted = true;
        }
        Some(Ok(report))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.halted {
            return (0, Some(0));
        }
        (0, Some(self.order.len() - self.cursor))
    }
}

impl<Z: ExactInt> FusedIterator for Steps<Z> {}

/// Extreme rays of the cone, each a primitive integer vector.
#[derive(Clone, Debug)]
pub struct ExtremeRays<Z: ExactInt = i64> {
    dimension: usize,
    rays: Vec<Ray<Z>>,
    constraints: Vec<AppliedConstraint<Z>>,
    stats: EnumerationStats,
    completion: Completion,
}

impl<Z: ExactInt> ExtremeRays<Z> {
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[Z]> + '_ {
        self.rays.iter().map(Ray::vector)
    }

    #[inline]
    pub fn rays(&self) -> &[Ray<Z>] {
        &self.rays
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&[Z]> {
        self.rays.get(index).map(Ray::vector)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// `true` when the cone is `{0}`. Not an error.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.rays.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn completion(&self) -> Completion {
        self.completion
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }

    #[inline]
    pub fn stats(&self) -> &EnumerationStats {
        &self.stats
    }

    /// Applied rows in application order; zero-set bit `d + k` refers to entry `k`.
    #[inline]
    pub fn constraints(&self) -> &[AppliedConstraint<Z>] {
        &self.constraints
    }

    /// Indices (into the caller's list) of the constraints ray `index` meets with equality.
    pub fn incidence(&self, index: usize) -> Option<Vec<usize>> {
        let ray = self.rays.get(index)?;
        let mut tight: Vec<usize> = ray
            .zero_set()
            .iter()
            .skip_while(|&bit| bit < self.dimension)
            .filter_map(|bit| self.constraints.get(bit - self.dimension))
            .map(AppliedConstraint::source)
            .collect();
        tight.sort_unstable();
        Some(tight)
    }

    /// Edges between adjacent extreme rays, indexed like [`iter`](Self::iter).
    ///
    /// Uses the rank test, so it is exact even for filtered or partial results. Fails only when
    /// the elimination overflows `Z`.
    pub fn adjacency(&self) -> Result<AdjacencyList, IntOverflow> {
        let n = self.rays.len();
        let mut builder = AdjacencyListBuilder::new(n);
        let Some(target) = self.dimension.checked_sub(2) else {
            return Ok(builder.finish());
        };
        let mut scratch = RankScratch::new();
        for i in 0..n {
            let a = self.rays[i].zero_set();
            for j in (i + 1)..n {
                let b = self.rays[j].zero_set();
                if a.count_intersection(b) < target {
                    continue;
                }
                let rank =
                    scratch.common_rank(a, b, self.dimension, &self.constraints, target)?;
                if rank == target {
                    builder.add_undirected_edge(i, j);
                }
            }
        }
        Ok(builder.finish())
    }

    pub fn into_vectors(self) -> Vec<Vec<Z>> {
        self.rays.into_iter().map(Ray::into_vector).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, Enumerator};
    use crate::dd::{Constraint, ConstraintOrder, EnumerationOptions};

    #[test]
    fn equalities_first_is_stable() {
        let e = Enumerator::<i64>::new(3)
            .constraints([
                Constraint::inequality([1, 0, 0]),
                Constraint::equality([1, -1, 0]),
                Constraint::inequality([0, 1, 0]),
                Constraint::equality([0, 1, -1]),
            ])
            .options(
                EnumerationOptions::default()
                    .with_constraint_order(ConstraintOrder::EqualitiesFirst),
            );
        assert_eq!(e.application_order(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn bad_dimension_is_caught_before_any_step() {
        let err = Enumerator::<i64>::new(3)
            .constraint(Constraint::inequality([1, -1, 0]))
            .constraint(Constraint::inequality([1, -1]))
            .steps()
            .unwrap_err();
        assert_eq!(
            err,
            crate::ConicError::DimensionMismatch {
                constraint: 1,
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn abort_predicate_stops_between_steps() {
        let rays = Enumerator::<i64>::new(3)
            .constraint(Constraint::inequality([1, -1, 0]))
            .constraint(Constraint::inequality([0, 1, -1]))
            .abort_when(|report| report.step == 0)
            .run()
            .unwrap();
        assert_eq!(rays.completion(), Completion::Aborted { steps_applied: 1 });
        assert_eq!(rays.len(), 3);
    }

    #[test]
    fn incidence_reports_caller_indices() {
        let rays = Enumerator::<i64>::new(3)
            .constraint(Constraint::inequality([1, -1, 0]))
            .run()
            .unwrap();
        // (1,0,0), (0,0,1), (1,1,0)
        assert_eq!(rays.incidence(0), Some(vec![]));
        assert_eq!(rays.incidence(1), Some(vec![0]));
        assert_eq!(rays.incidence(2), Some(vec![0]));
        assert_eq!(rays.incidence(3), None);
    }

    #[test]
    fn steps_expose_the_current_store() {
        let mut steps = Enumerator::<i64>::new(3)
            .constraint(Constraint::inequality([1, -1, 0]))
            .steps()
            .unwrap();
        assert_eq!(steps.store().len(), 3);
        let report = steps.next().unwrap().unwrap();
        assert_eq!(report.created, 1);
        assert!(steps.next().is_none());
        assert!(steps.next().is_none());
        assert_eq!(steps.completion(), Completion::Complete);
    }
}
