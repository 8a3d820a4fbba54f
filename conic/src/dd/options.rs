use crate::dd::filter::SupportFilter;

/// Order in which the driver applies the constraint list.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ConstraintOrder {
    #[default]
    AsGiven,
    /// Equalities first (stable), then inequalities (stable).
    ///
    /// Equalities only ever shrink the ray set, so applying them early keeps intermediate
    /// stores small.
    EqualitiesFirst,
}

/// Test deciding whether a positive and a negative ray are adjacent.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AdjacencyTest {
    /// Rank of the common tight rows equals `d - 2`.
    #[default]
    Rank,
    /// No third ray is tight on every common row.
    Combinatorial,
}

/// Knobs for a run.
#[derive(Clone, Debug)]
pub struct EnumerationOptions {
    order: ConstraintOrder,
    adjacency: AdjacencyTest,
    parallel: bool,
    parallel_threshold: usize,
    max_rays: Option<usize>,
    support_filter: Option<SupportFilter>,
}

impl Default for EnumerationOptions {
    fn default() -> Self {
        Self {
            order: ConstraintOrder::AsGiven,
            adjacency: AdjacencyTest::Rank,
            parallel: cfg!(feature = "parallel"),
            parallel_threshold: 4096,
            max_rays: None,
            support_filter: None,
        }
    }
}

impl EnumerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint_order(mut self, order: ConstraintOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_adjacency_test(mut self, test: AdjacencyTest) -> Self {
        self.adjacency = test;
        self
    }

    /// Enables pair testing on the rayon pool. Ignored without the `parallel` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Minimum number of candidate pairs in a step before work is spread over threads.
    pub fn with_parallel_threshold(mut self, pairs: usize) -> Self {
        self.parallel_threshold = pairs;
        self
    }

    /// Stops the run after the first step that leaves more than `limit` rays.
    pub fn with_max_rays(mut self, limit: usize) -> Self {
        self.max_rays = Some(limit);
        self
    }

    pub fn with_support_filter(mut self, filter: SupportFilter) -> Self {
        self.support_filter = Some(filter);
        self
    }

    #[inline]
    pub fn constraint_order(&self) -> ConstraintOrder {
        self.order
    }

    /// The test in effect. A support filter forces [`AdjacencyTest::Rank`], since the
    /// combinatorial test needs every ray of the current cone.
    #[inline]
    pub fn adjacency_test(&self) -> AdjacencyTest {
        if self.support_filter.is_some() {
            return AdjacencyTest::Rank;
        }
        self.adjacency
    }

    #[inline]
    pub fn parallel(&self) -> bool {
        cfg!(feature = "parallel") && self.parallel
    }

    #[inline]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    #[inline]
    pub fn max_rays(&self) -> Option<usize> {
        self.max_rays
    }

    #[inline]
    pub fn support_filter(&self) -> Option<&SupportFilter> {
        self.support_filter.as_ref()
    }
}
