//! One double-description step at a time.
//!
//! [`ConeState`] owns the current rays and the constraint rows applied so far. A step runs in
//! two phases: candidate rays are generated against the untouched store (the only phase that
//! can fail), then the store is updated in place. A failed step therefore leaves the cone
//! exactly as it was.

use conic_core::{ExactInt, IntOverflow};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::ConicError as Error;
use crate::dd::constraint::{Constraint, ConstraintKind};
use crate::dd::options::{AdjacencyTest, EnumerationOptions};
use crate::dd::ray::{Ray, RayId};
use crate::dd::store::{Partition, RayStore};
use crate::dd::vector;
use crate::dd::zero::{self, RankScratch, ZeroSet};

/// A constraint row as held by the engine: converted to `Z` and divided by its content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppliedConstraint<Z: ExactInt> {
    kind: ConstraintKind,
    row: Vec<Z>,
    source: usize,
}

impl<Z: ExactInt> AppliedConstraint<Z> {
    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    #[inline]
    pub fn row(&self) -> &[Z] {
        &self.row
    }

    /// Position of the constraint in the caller's list.
    #[inline]
    pub fn source(&self) -> usize {
        self.source
    }
}

impl<Z: ExactInt> AsRef<[Z]> for AppliedConstraint<Z> {
    #[inline]
    fn as_ref(&self) -> &[Z] {
        &self.row
    }
}

/// What a single step did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StepReport {
    /// Number of constraints applied before this one.
    pub step: usize,
    /// Index of the constraint in the caller's list.
    pub source: usize,
    pub kind: ConstraintKind,
    pub positive: usize,
    pub negative: usize,
    pub zero: usize,
    pub pairs_tested: usize,
    pub adjacent_pairs: usize,
    /// Rays inserted by the step.
    pub created: usize,
    /// Candidates equal to a ray already present.
    pub duplicates: usize,
    /// Candidates pruned by the support filter.
    pub filtered: usize,
    /// Store size after the step.
    pub ray_count: usize,
}

/// Counters accumulated over a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EnumerationStats {
    pub steps: usize,
    pub pairs_tested: usize,
    pub adjacent_pairs: usize,
    pub rays_created: usize,
    pub duplicates_dropped: usize,
    pub rays_filtered: usize,
    pub peak_rays: usize,
}

impl EnumerationStats {
    fn record(&mut self, report: &StepReport) {
        self.steps += 1;
        self.pairs_tested += report.pairs_tested;
        self.adjacent_pairs += report.adjacent_pairs;
        self.rays_created += report.created;
        self.duplicates_dropped += report.duplicates;
        self.rays_filtered += report.filtered;
        self.peak_rays = self.peak_rays.max(report.ray_count);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PairCounts {
    tested: usize,
    adjacent: usize,
}

impl PairCounts {
    #[inline]
    fn merge(&mut self, other: PairCounts) {
        self.tested += other.tested;
        self.adjacent += other.adjacent;
    }
}

#[derive(Clone, Debug)]
struct PairScratch<Z: ExactInt> {
    rank: RankScratch<Z>,
    common: ZeroSet,
}

impl<Z: ExactInt> PairScratch<Z> {
    fn new() -> Self {
        Self {
            rank: RankScratch::new(),
            common: ZeroSet::new(),
        }
    }
}

/// The cone after some prefix of the constraints, starting from the non-negative orthant.
#[derive(Clone, Debug)]
pub struct ConeState<Z: ExactInt = i64> {
    dimension: usize,
    store: RayStore<Z>,
    rows: Vec<AppliedConstraint<Z>>,
    options: EnumerationOptions,
    stats: EnumerationStats,
}

impl<Z: ExactInt> ConeState<Z> {
    pub fn new(dimension: usize, options: EnumerationOptions) -> Result<Self, Error> {
        if dimension == 0 {
            return Err(Error::InvalidArgument(
                "cone dimension must be positive".to_string(),
            ));
        }
        if let Some(filter) = options.support_filter() {
            filter.check_dimension(dimension)?;
        }

        let mut store = RayStore::orthant(dimension);
        if let Some(filter) = options.support_filter() {
            let rejected: Vec<RayId> = store
                .ids()
                .iter()
                .copied()
                .filter(|&id| store.get(id).is_some_and(|r| !filter.allows(r.zero_set())))
                .collect();
            store.remove_many(&rejected);
        }

        let stats = EnumerationStats {
            peak_rays: store.len(),
            ..EnumerationStats::default()
        };
        Ok(Self {
            dimension,
            store,
            rows: Vec::new(),
            options,
            stats,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn store(&self) -> &RayStore<Z> {
        &self.store
    }

    /// Current rays in store order.
    pub fn rays(&self) -> impl ExactSizeIterator<Item = &Ray<Z>> + '_ {
        self.store.iter()
    }

    #[inline]
    pub fn ray_count(&self) -> usize {
        self.store.len()
    }

    /// `true` once the cone has collapsed to the origin.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn constraints(&self) -> &[AppliedConstraint<Z>] {
        &self.rows
    }

    #[inline]
    pub fn options(&self) -> &EnumerationOptions {
        &self.options
    }

    #[inline]
    pub fn stats(&self) -> &EnumerationStats {
        &self.stats
    }

    pub(crate) fn into_parts(
        self,
    ) -> (RayStore<Z>, Vec<AppliedConstraint<Z>>, EnumerationStats) {
        (self.store, self.rows, self.stats)
    }

    /// Intersects the cone with one more constraint.
    pub fn apply(&mut self, constraint: &Constraint) -> Result<StepReport, Error> {
        let source = self.rows.len();
        self.apply_from(constraint, source)
    }

    /// [`apply`](Self::apply), reporting errors against `source`.
    pub(crate) fn apply_from(
        &mut self,
        constraint: &Constraint,
        source: usize,
    ) -> Result<StepReport, Error> {
        constraint.check_dimension(source, self.dimension)?;
        let overflow = |_: IntOverflow| Error::ArithmeticOverflow { constraint: source };

        let mut row: Vec<Z> = vector::from_i64_slice(constraint.coefficients());
        vector::normalize_in_place(&mut row).map_err(overflow)?;
        let partition = self.store.partition(&row).map_err(overflow)?;
        let step = self.rows.len();
        let bit = zero::constraint_bit(self.dimension, step);

        let (candidates, pairs) =
            if partition.positive.is_empty() || partition.negative.is_empty() {
                (Vec::new(), PairCounts::default())
            } else {
                self.candidates(&partition, bit).map_err(overflow)?
            };

        let mut report = StepReport {
            step,
            source,
            kind: constraint.kind(),
            positive: partition.positive.len(),
            negative: partition.negative.len(),
            zero: partition.zero.len(),
            pairs_tested: pairs.tested,
            adjacent_pairs: pairs.adjacent,
            created: 0,
            duplicates: 0,
            filtered: 0,
            ray_count: 0,
        };

        for &id in &partition.zero {
            self.store.extend_zero_set(id, bit);
        }
        let mut removed: Vec<RayId> = partition.negative.iter().map(|(id, _)| *id).collect();
        if constraint.is_equality() {
            removed.extend(partition.positive.iter().map(|(id, _)| *id));
        }
        self.store.remove_many(&removed);

        let filter = self.options.support_filter();
        for ray in candidates {
            if filter.is_some_and(|f| !f.allows(ray.zero_set())) {
                trace!(step, "support filter dropped a candidate");
                report.filtered += 1;
                continue;
            }
            match self.store.insert(ray) {
                Some(_) => report.created += 1,
                None => report.duplicates += 1,
            }
        }

        self.rows.push(AppliedConstraint {
            kind: constraint.kind(),
            row,
            source,
        });
        report.ray_count = self.store.len();
        self.stats.record(&report);

        debug!(
            step,
            source,
            kind = ?report.kind,
            positive = report.positive,
            negative = report.negative,
            zero = report.zero,
            adjacent = report.adjacent_pairs,
            created = report.created,
            rays = report.ray_count,
            "applied constraint"
        );

        #[cfg(debug_assertions)]
        self.assert_consistent();

        Ok(report)
    }

    fn candidates(
        &self,
        partition: &Partition<Z>,
        bit: usize,
    ) -> Result<(Vec<Ray<Z>>, PairCounts), IntOverflow> {
        #[cfg(feature = "parallel")]
        {
            let pairs = partition.positive.len() * partition.negative.len();
            if self.options.parallel() && pairs >= self.options.parallel_threshold() {
                let chunks = partition
                    .positive
                    .par_iter()
                    .map_init(PairScratch::new, |scratch, pos| {
                        self.candidates_for(scratch, pos, &partition.negative, bit)
                    })
                    .collect::<Result<Vec<_>, IntOverflow>>()?;
                let mut out = Vec::new();
                let mut counts = PairCounts::default();
                for (rays, c) in chunks {
                    out.extend(rays);
                    counts.merge(c);
                }
                return Ok((out, counts));
            }
        }

        let mut scratch = PairScratch::new();
        let mut out = Vec::new();
        let mut counts = PairCounts::default();
        for pos in &partition.positive {
            let (rays, c) = self.candidates_for(&mut scratch, pos, &partition.negative, bit)?;
            out.extend(rays);
            counts.merge(c);
        }
        Ok((out, counts))
    }

    /// Candidates from one positive ray against every negative ray, in negative order.
    fn candidates_for(
        &self,
        scratch: &mut PairScratch<Z>,
        (pos, pos_value): &(RayId, Z),
        negative: &[(RayId, Z)],
        bit: usize,
    ) -> Result<(Vec<Ray<Z>>, PairCounts), IntOverflow> {
        let mut out = Vec::new();
        let mut counts = PairCounts::default();
        for (neg, neg_value) in negative {
            counts.tested += 1;
            if !self.adjacent(scratch, *pos, *neg)? {
                trace!(pos = pos.as_index(), neg = neg.as_index(), "pair not adjacent");
                continue;
            }
            counts.adjacent += 1;
            if let Some(ray) = self.store.combine(*pos, pos_value, *neg, neg_value, bit)? {
                out.push(ray);
            }
        }
        Ok((out, counts))
    }

    #[inline]
    fn adjacent(
        &self,
        scratch: &mut PairScratch<Z>,
        a: RayId,
        b: RayId,
    ) -> Result<bool, IntOverflow> {
        match self.options.adjacency_test() {
            AdjacencyTest::Rank => self.store.is_adjacent(a, b, &self.rows, &mut scratch.rank),
            AdjacencyTest::Combinatorial => {
                Ok(self
                    .store
                    .is_adjacent_combinatorial(a, b, &mut scratch.common))
            }
        }
    }

    /// Panics if a stored ray is not primitive, leaves the feasible cone, or carries a
    /// zero-set that disagrees with its vector.
    ///
    /// Rays whose residuals overflow the coordinate type are skipped.
    pub fn assert_consistent(&self) {
        let d = self.dimension;
        for ray in self.store.iter() {
            let v = ray.vector();
            assert_eq!(v.len(), d, "ray {v:?} has the wrong dimension");
            assert!(vector::is_primitive(v), "ray {v:?} is not primitive");
            assert_eq!(
                ray.zero_set_count(),
                ray.zero_set().cardinality(),
                "cached zero-set size of {v:?} is stale"
            );
            assert!(
                ray.zero_set().iter().all(|bit| bit < d + self.rows.len()),
                "zero-set of {v:?} names an unapplied constraint"
            );
            for (col, x) in v.iter().enumerate() {
                assert!(!x.is_negative(), "ray {v:?} leaves the orthant");
                assert_eq!(
                    ray.zero_set().contains(col),
                    x.is_zero(),
                    "zero-set of {v:?} disagrees at coordinate {col}"
                );
            }

            let Ok(values) = self
                .rows
                .iter()
                .map(|r| vector::dot(r.row(), v))
                .collect::<Result<Vec<Z>, IntOverflow>>()
            else {
                continue;
            };
            for (k, (applied, value)) in self.rows.iter().zip(values.iter()).enumerate() {
                match applied.kind {
                    ConstraintKind::Equality => {
                        assert!(value.is_zero(), "ray {v:?} violates equality {k}")
                    }
                    ConstraintKind::Inequality => {
                        assert!(!value.is_negative(), "ray {v:?} violates inequality {k}")
                    }
                }
                assert_eq!(
                    ray.zero_set().contains(zero::constraint_bit(d, k)),
                    value.is_zero(),
                    "zero-set of {v:?} disagrees on constraint {k}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::ConeState;
    use crate::ConicError;
    use crate::dd::{AdjacencyTest, Constraint, EnumerationOptions};

    fn vectors(state: &ConeState<i64>) -> Vec<Vec<i64>> {
        state.rays().map(|r| r.vector().to_vec()).collect()
    }

    #[test]
    fn orthant_without_constraints() {
        let state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        assert_eq!(
            vectors(&state),
            vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]
        );
        state.assert_consistent();
    }

    #[test]
    fn simplex_cut_appends_the_new_ray() {
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        let report = state.apply(&Constraint::inequality([1, -1, 0])).unwrap();
        assert_eq!(
            vectors(&state),
            vec![vec![1, 0, 0], vec![0, 0, 1], vec![1, 1, 0]]
        );
        assert_eq!((report.positive, report.negative, report.zero), (1, 1, 1));
        assert_eq!(report.created, 1);
        assert_eq!(report.ray_count, 3);
    }

    #[test]
    fn equality_with_only_positive_rays_empties_the_cone() {
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        state.apply(&Constraint::equality([1, 1, 1])).unwrap();
        assert!(state.is_degenerate());
        state.apply(&Constraint::inequality([1, -1, 0])).unwrap();
        assert!(state.is_degenerate());
    }

    #[test]
    fn equality_keeps_only_the_hyperplane() {
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        state.apply(&Constraint::equality([1, -1, 0])).unwrap();
        assert_eq!(vectors(&state), vec![vec![0, 0, 1], vec![1, 1, 0]]);
    }

    #[test]
    fn repeated_constraint_is_idempotent() {
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        let c = Constraint::inequality([1, -1, 0]);
        state.apply(&c).unwrap();
        let once = vectors(&state);
        let report = state.apply(&c).unwrap();
        assert_eq!(vectors(&state), once);
        assert_eq!(report.negative, 0);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn dimension_mismatch_leaves_state_untouched() {
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        state.apply(&Constraint::inequality([1, -1, 0])).unwrap();
        let before = vectors(&state);
        let err = state.apply(&Constraint::inequality([1, 1])).unwrap_err();
        assert_eq!(
            err,
            ConicError::DimensionMismatch {
                constraint: 1,
                expected: 3,
                found: 2,
            }
        );
        assert_eq!(vectors(&state), before);
        assert_eq!(state.constraints().len(), 1);
    }

    #[test]
    fn overflow_leaves_state_untouched() {
        let max = i64::MAX;
        let mut state = ConeState::<i64>::new(3, EnumerationOptions::default()).unwrap();
        state
            .apply(&Constraint::inequality([max, -(max - 1), 0]))
            .unwrap();
        assert_eq!(
            vectors(&state),
            vec![vec![1, 0, 0], vec![0, 0, 1], vec![max - 1, max, 0]]
        );
        let zero_sets: Vec<_> = state.rays().map(|r| r.zero_set().clone()).collect();

        let err = state.apply(&Constraint::inequality([0, -1, 2])).unwrap_err();
        assert_eq!(err, ConicError::ArithmeticOverflow { constraint: 1 });
        assert_eq!(
            vectors(&state),
            vec![vec![1, 0, 0], vec![0, 0, 1], vec![max - 1, max, 0]]
        );
        let after: Vec<_> = state.rays().map(|r| r.zero_set().clone()).collect();
        assert_eq!(after, zero_sets);
        assert_eq!(state.stats().steps, 1);
    }

    #[test]
    fn arbitrary_precision_survives_the_overflowing_step() {
        let max = i64::MAX;
        let mut state = ConeState::<BigInt>::new(3, EnumerationOptions::default()).unwrap();
        state
            .apply(&Constraint::inequality([max, -(max - 1), 0]))
            .unwrap();
        state.apply(&Constraint::inequality([0, -1, 2])).unwrap();
        assert!(
            state
                .rays()
                .any(|r| r.vector()[0] == BigInt::from(max - 1) * 2)
        );
    }

    #[test]
    fn both_adjacency_tests_agree_on_a_square_pyramid() {
        // x0 + x1 >= x2 and x0 + x1 >= x3 cut the orthant in R^4.
        let constraints = [
            Constraint::inequality([1, 1, -1, 0]),
            Constraint::inequality([1, 1, 0, -1]),
            Constraint::inequality([1, -1, 1, 1]),
        ];
        let run = |test| {
            let opts = EnumerationOptions::default().with_adjacency_test(test);
            let mut state = ConeState::<i64>::new(4, opts).unwrap();
            for c in &constraints {
                state.apply(c).unwrap();
            }
            vectors(&state)
        };
        assert_eq!(run(AdjacencyTest::Rank), run(AdjacencyTest::Combinatorial));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            ConeState::<i64>::new(0, EnumerationOptions::default()),
            Err(ConicError::InvalidArgument(_))
        ));
    }
}
