use std::fmt;

use conic_core::{ExactInt, IntOverflow};

use crate::dd::vector;
use crate::dd::zero::ZeroSet;

/// Stable handle of a ray inside a [`RayStore`](crate::dd::RayStore) arena.
///
/// Handles stay valid until the ray is removed; a freed slot may be reused by a later ray.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RayId(pub(crate) usize);

impl RayId {
    #[inline(always)]
    pub fn as_index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for RayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RayId").field(&self.0).finish()
    }
}

/// A primitive non-zero integer vector together with its zero-set.
///
/// Rays are normalised when they are built, so two rays describe the same half-line exactly
/// when their vectors are equal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ray<Z: ExactInt> {
    pub(crate) vector: Vec<Z>,
    pub(crate) zero_set: ZeroSet,
    pub(crate) zero_set_count: usize,
}

impl<Z: ExactInt> Ray<Z> {
    /// Normalises `vector` and attaches `zero_set`; `None` for the zero vector.
    pub(crate) fn new(mut vector: Vec<Z>, zero_set: ZeroSet) -> Result<Option<Self>, IntOverflow> {
        if !vector::normalize_in_place(&mut vector)? {
            return Ok(None);
        }
        Ok(Some(Self::from_primitive(vector, zero_set)))
    }

    #[inline]
    pub(crate) fn from_primitive(vector: Vec<Z>, zero_set: ZeroSet) -> Self {
        debug_assert!(vector::is_primitive(&vector), "ray vector must be primitive");
        let zero_set_count = zero_set.cardinality();
        Self {
            vector,
            zero_set,
            zero_set_count,
        }
    }

    /// Standard basis vector `e_axis` of the non-negative orthant in dimension `dimension`.
    pub(crate) fn axis(dimension: usize, axis: usize) -> Self {
        let mut vector = vec![Z::zero(); dimension];
        vector[axis] = Z::one();
        let zero_set: ZeroSet = (0..dimension).filter(|&c| c != axis).collect();
        Self::from_primitive(vector, zero_set)
    }

    #[inline(always)]
    pub fn vector(&self) -> &[Z] {
        &self.vector
    }

    #[inline]
    pub fn into_vector(self) -> Vec<Z> {
        self.vector
    }

    /// Indices of the tight rows: coordinate `i` for `x_i = 0`, then `d + k` for the `k`-th
    /// applied constraint met with equality.
    #[inline(always)]
    pub fn zero_set(&self) -> &ZeroSet {
        &self.zero_set
    }

    #[inline(always)]
    pub fn zero_set_count(&self) -> usize {
        self.zero_set_count
    }

    #[inline]
    pub(crate) fn mark_zero(&mut self, bit: usize) {
        if !self.zero_set.contains(bit) {
            self.zero_set.insert(bit);
            self.zero_set_count += 1;
        }
    }

    /// Coordinates with a non-zero entry.
    pub fn support(&self) -> impl Iterator<Item = usize> + '_ {
        self.vector
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .map(|(i, _)| i)
    }
}
