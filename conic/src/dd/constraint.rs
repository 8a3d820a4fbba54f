use crate::ConicError as Error;

/// Relation imposed by a constraint row `a`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConstraintKind {
    /// `a·x = 0`
    Equality,
    /// `a·x ≥ 0`
    Inequality,
}

/// One homogeneous constraint on the cone.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
    coefficients: Vec<i64>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, coefficients: impl Into<Vec<i64>>) -> Self {
        Self {
            kind,
            coefficients: coefficients.into(),
        }
    }

    pub fn equality(coefficients: impl Into<Vec<i64>>) -> Self {
        Self::new(ConstraintKind::Equality, coefficients)
    }

    pub fn inequality(coefficients: impl Into<Vec<i64>>) -> Self {
        Self::new(ConstraintKind::Inequality, coefficients)
    }

    /// One equality per row of `M`, i.e. the cone `{x ≥ 0 : M·x = 0}`.
    pub fn equalities<I, R>(rows: I) -> Vec<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<i64>>,
    {
        rows.into_iter().map(Self::equality).collect()
    }

    #[inline]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    #[inline]
    pub fn is_equality(&self) -> bool {
        self.kind == ConstraintKind::Equality
    }

    #[inline]
    pub fn coefficients(&self) -> &[i64] {
        &self.coefficients
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.coefficients.len()
    }

    pub(crate) fn check_dimension(&self, index: usize, expected: usize) -> Result<(), Error> {
        if self.coefficients.len() == expected {
            return Ok(());
        }
        Err(Error::DimensionMismatch {
            constraint: index,
            expected,
            found: self.coefficients.len(),
        })
    }
}
