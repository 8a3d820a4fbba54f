//! Zero-set bookkeeping and the rank query behind the adjacency test.
//!
//! A zero-set is a bitset over the tight rows of a ray. The first `d` bits are the implicit
//! orthant facets `x_i ≥ 0`; bit `d + k` is the `k`-th applied constraint. Keeping the facets
//! in the same set lets the rank query treat every tight row uniformly.

use conic_core::{BitSet, ExactInt, IntOverflow};

use crate::dd::vector;

pub type ZeroSet = BitSet;

#[inline(always)]
pub fn constraint_bit(dimension: usize, index: usize) -> usize {
    dimension + index
}

/// Zero-set of `vector` under the orthant facets and the given constraint rows.
pub fn zero_set_of<Z, R>(vector: &[Z], rows: &[R]) -> Result<ZeroSet, IntOverflow>
where
    Z: ExactInt,
    R: AsRef<[Z]>,
{
    let dimension = vector.len();
    let mut set = ZeroSet::with_capacity(dimension + rows.len());
    for (col, v) in vector.iter().enumerate() {
        if v.is_zero() {
            set.insert(col);
        }
    }
    let mut acc = Z::zero();
    let mut tmp = Z::zero();
    for (k, row) in rows.iter().enumerate() {
        vector::dot_into(&mut acc, &mut tmp, row.as_ref(), vector)?;
        if acc.is_zero() {
            set.insert(constraint_bit(dimension, k));
        }
    }
    Ok(set)
}

/// Reusable workspace for exact rank computations over tight rows.
///
/// Facet rows are unit vectors, so they are accounted for by dropping their columns; the
/// remaining constraint rows are reduced by fraction-free elimination on the free columns.
#[derive(Clone, Debug, Default)]
pub struct RankScratch<Z: ExactInt> {
    common: ZeroSet,
    free_cols: Vec<usize>,
    basis: Vec<Vec<Z>>,
    pivots: Vec<usize>,
    work: Vec<Z>,
}

impl<Z: ExactInt> RankScratch<Z> {
    pub fn new() -> Self {
        Self {
            common: ZeroSet::new(),
            free_cols: Vec::new(),
            basis: Vec::new(),
            pivots: Vec::new(),
            work: Vec::new(),
        }
    }

    /// Rank of the rows tight at both `a` and `b`, capped at `limit`.
    pub fn common_rank<R: AsRef<[Z]>>(
        &mut self,
        a: &ZeroSet,
        b: &ZeroSet,
        dimension: usize,
        rows: &[R],
        limit: usize,
    ) -> Result<usize, IntOverflow> {
        let mut common = std::mem::take(&mut self.common);
        common.copy_from(a);
        common.intersection_inplace(b);
        let rank = self.rank_of(&common, dimension, rows, limit);
        self.common = common;
        rank
    }

    /// Rank of the rows in `set`, capped at `limit`.
    ///
    /// An empty set has rank 0; a set holding every facet has rank `dimension`.
    pub fn rank_of<R: AsRef<[Z]>>(
        &mut self,
        set: &ZeroSet,
        dimension: usize,
        rows: &[R],
        limit: usize,
    ) -> Result<usize, IntOverflow> {
        let facets = set.count_below(dimension);
        if facets >= limit {
            return Ok(limit);
        }

        self.free_cols.clear();
        self.free_cols
            .extend((0..dimension).filter(|&c| !set.contains(c)));
        let width = self.free_cols.len();
        self.basis.clear();
        self.pivots.clear();
        self.work.clear();
        self.work.resize(width, Z::zero());

        let mut rank = facets;
        let mut tmp = Z::zero();
        for bit in set.iter().skip(facets) {
            if rank >= limit || self.pivots.len() == width {
                break;
            }
            let Some(row) = rows.get(bit - dimension) else {
                panic!("zero-set references constraint {} but only {} are applied", bit - dimension, rows.len());
            };
            let row = row.as_ref();
            for (dst, &col) in self.work.iter_mut().zip(self.free_cols.iter()) {
                dst.assign_from(&row[col]);
            }

            for (basis_row, &pivot_col) in self.basis.iter().zip(self.pivots.iter()) {
                if self.work[pivot_col].is_zero() {
                    continue;
                }
                let mut g = basis_row[pivot_col].clone();
                g.gcd_assign(&self.work[pivot_col])?;
                let mut scale_work = basis_row[pivot_col].clone();
                scale_work.div_assign_exact(&g)?;
                let mut scale_basis = self.work[pivot_col].clone();
                scale_basis.div_assign_exact(&g)?;

                for (w, bv) in self.work.iter_mut().zip(basis_row.iter()) {
                    w.mul_assign(&scale_work)?;
                    tmp.assign_from(bv);
                    tmp.mul_assign(&scale_basis)?;
                    w.sub_assign(&tmp)?;
                }
            }

            let Some(pivot_col) = self.work.iter().position(|v| !v.is_zero()) else {
                continue;
            };
            vector::normalize_in_place(&mut self.work)?;
            self.basis.push(self.work.clone());
            self.pivots.push(pivot_col);
            rank += 1;
        }
        Ok(rank.min(limit))
    }
}
