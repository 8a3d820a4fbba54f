//! Arena of the current rays.
//!
//! Rays live in slots addressed by [`RayId`]; a separate order list keeps the insertion order
//! that callers observe, and a hash index on the vectors rejects duplicates.

use std::hash::BuildHasher;

use ahash::{AHashMap, RandomState};
use conic_core::{ExactInt, IntOverflow, Sign};
use smallvec::SmallVec;

use crate::dd::ray::{Ray, RayId};
use crate::dd::vector;
use crate::dd::zero::{RankScratch, ZeroSet};

/// Ray split by the sign of a constraint row.
#[derive(Clone, Debug, Default)]
pub struct Partition<Z: ExactInt> {
    pub positive: Vec<(RayId, Z)>,
    pub negative: Vec<(RayId, Z)>,
    pub zero: Vec<RayId>,
}

impl<Z: ExactInt> Partition<Z> {
    #[inline]
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len() + self.zero.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct RayStore<Z: ExactInt> {
    dimension: usize,
    slots: Vec<Option<Ray<Z>>>,
    free_slots: Vec<usize>,
    order: Vec<RayId>,
    index: AHashMap<u64, SmallVec<[RayId; 2]>>,
    hasher: RandomState,
    removal_marks: Vec<u32>,
    removal_epoch: u32,
}

impl<Z: ExactInt> RayStore<Z> {
    /// Empty store for rays of length `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            slots: Vec::new(),
            free_slots: Vec::new(),
            order: Vec::new(),
            index: AHashMap::new(),
            // Fixed seeds keep bucket contents identical between runs.
            hasher: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
            removal_marks: Vec::new(),
            removal_epoch: 0,
        }
    }

    /// The `d` unit vectors generating the non-negative orthant, in coordinate order.
    pub fn orthant(dimension: usize) -> Self {
        let mut store = Self::new(dimension);
        for axis in 0..dimension {
            store.insert(Ray::axis(dimension, axis));
        }
        store
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live handles in insertion order.
    #[inline]
    pub fn ids(&self) -> &[RayId] {
        &self.order
    }

    #[inline]
    pub fn get(&self, id: RayId) -> Option<&Ray<Z>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    #[inline]
    fn ray(&self, id: RayId) -> &Ray<Z> {
        match self.get(id) {
            Some(ray) => ray,
            None => panic!("stale ray handle {id:?}"),
        }
    }

    /// Live rays in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Ray<Z>> + '_ {
        self.order.iter().map(|&id| self.ray(id))
    }

    pub fn contains_vector(&self, vector: &[Z]) -> bool {
        let key = self.key(vector);
        self.index
            .get(&key)
            .is_some_and(|bucket| bucket.iter().any(|&id| self.ray(id).vector == vector))
    }

    /// Sign and value of `row · ray`.
    pub fn classify(&self, id: RayId, row: &[Z]) -> Result<(Sign, Z), IntOverflow> {
        let value = vector::dot(row, &self.ray(id).vector)?;
        Ok((value.sign(), value))
    }

    /// Splits every live ray by the sign of `row`, keeping insertion order in each part.
    pub fn partition(&self, row: &[Z]) -> Result<Partition<Z>, IntOverflow> {
        let mut out = Partition {
            positive: Vec::new(),
            negative: Vec::new(),
            zero: Vec::new(),
        };
        let mut acc = Z::zero();
        let mut tmp = Z::zero();
        for &id in &self.order {
            vector::dot_into(&mut acc, &mut tmp, row, &self.ray(id).vector)?;
            match acc.sign() {
                Sign::Positive => out.positive.push((id, acc.clone())),
                Sign::Negative => out.negative.push((id, acc.clone())),
                Sign::Zero => out.zero.push(id),
            }
        }
        Ok(out)
    }

    /// Cancelling combination of `pos` and `neg` on the row at zero-set bit `bit`.
    ///
    /// The new zero-set is the common zero-set of the parents plus `bit`. Since both parents
    /// satisfy every earlier row, no other row can become tight.
    pub fn combine(
        &self,
        pos: RayId,
        pos_value: &Z,
        neg: RayId,
        neg_value: &Z,
        bit: usize,
    ) -> Result<Option<Ray<Z>>, IntOverflow> {
        let p = self.ray(pos);
        let n = self.ray(neg);
        let Some(vector) = vector::combine(&p.vector, pos_value, &n.vector, neg_value)? else {
            return Ok(None);
        };
        let mut zero_set = p.zero_set.clone();
        zero_set.intersection_inplace(&n.zero_set);
        zero_set.insert(bit);
        Ok(Some(Ray::from_primitive(vector, zero_set)))
    }

    /// Number of tight rows shared by `a` and `b`.
    #[inline]
    pub fn common_zero_count(&self, a: RayId, b: RayId) -> usize {
        self.ray(a).zero_set.count_intersection(&self.ray(b).zero_set)
    }

    /// Algebraic adjacency: the shared tight rows have rank `d - 2`.
    ///
    /// `rows` are the constraint rows applied so far, in zero-set bit order after the facets.
    pub fn is_adjacent<R: AsRef<[Z]>>(
        &self,
        a: RayId,
        b: RayId,
        rows: &[R],
        scratch: &mut RankScratch<Z>,
    ) -> Result<bool, IntOverflow> {
        let Some(target) = self.dimension.checked_sub(2) else {
            return Ok(false);
        };
        if self.common_zero_count(a, b) < target {
            return Ok(false);
        }
        let rank = scratch.common_rank(
            &self.ray(a).zero_set,
            &self.ray(b).zero_set,
            self.dimension,
            rows,
            target,
        )?;
        Ok(rank == target)
    }

    /// Combinatorial adjacency: no third live ray is tight on every row shared by `a` and `b`.
    ///
    /// Only meaningful while the store holds every extreme ray of the current cone.
    pub fn is_adjacent_combinatorial(&self, a: RayId, b: RayId, common: &mut ZeroSet) -> bool {
        let Some(target) = self.dimension.checked_sub(2) else {
            return false;
        };
        let ra = self.ray(a);
        let rb = self.ray(b);
        common.copy_from(&ra.zero_set);
        if common.intersection_inplace_and_count(&rb.zero_set) < target {
            return false;
        }
        !self
            .order
            .iter()
            .filter(|&&id| id != a && id != b)
            .any(|&id| common.subset_of(&self.ray(id).zero_set))
    }

    /// Adds `ray` unless an equal vector is already present.
    pub fn insert(&mut self, ray: Ray<Z>) -> Option<RayId> {
        debug_assert_eq!(ray.vector.len(), self.dimension, "ray dimension mismatch");
        let key = self.key(&ray.vector);
        if let Some(bucket) = self.index.get(&key)
            && bucket.iter().any(|&id| self.ray(id).vector == ray.vector)
        {
            return None;
        }

        let id = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(ray);
                RayId(slot)
            }
            None => {
                self.slots.push(Some(ray));
                RayId(self.slots.len() - 1)
            }
        };
        self.index.entry(key).or_default().push(id);
        self.order.push(id);
        Some(id)
    }

    pub fn remove(&mut self, id: RayId) -> Option<Ray<Z>> {
        let ray = self.detach(id)?;
        if let Some(pos) = self.order.iter().position(|&x| x == id) {
            self.order.remove(pos);
        }
        Some(ray)
    }

    /// Removes every ray in `ids`, preserving the order of the survivors.
    pub fn remove_many(&mut self, ids: &[RayId]) {
        if ids.is_empty() {
            return;
        }
        self.removal_epoch = self.removal_epoch.wrapping_add(1);
        if self.removal_epoch == 0 {
            self.removal_marks.fill(0);
            self.removal_epoch = 1;
        }
        if self.removal_marks.len() < self.slots.len() {
            self.removal_marks.resize(self.slots.len(), 0);
        }
        for &id in ids {
            if self.detach(id).is_some() {
                self.removal_marks[id.0] = self.removal_epoch;
            }
        }
        let marks = &self.removal_marks;
        let epoch = self.removal_epoch;
        self.order.retain(|id| marks[id.0] != epoch);
    }

    /// Marks the row at `bit` as tight for `id`.
    pub fn extend_zero_set(&mut self, id: RayId, bit: usize) {
        if let Some(Some(ray)) = self.slots.get_mut(id.0) {
            ray.mark_zero(bit);
        }
    }

    pub fn into_rays(mut self) -> Vec<Ray<Z>> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.slots.get_mut(id.0).and_then(Option::take))
            .collect()
    }

    fn detach(&mut self, id: RayId) -> Option<Ray<Z>> {
        let ray = self.slots.get_mut(id.0)?.take()?;
        let key = self.key(&ray.vector);
        if let Some(bucket) = self.index.get_mut(&key) {
            if let Some(pos) = bucket.iter().position(|&x| x == id) {
                bucket.swap_remove(pos);
            }
            if bucket.is_empty() {
                self.index.remove(&key);
            }
        }
        self.free_slots.push(id.0);
        Some(ray)
    }

    #[inline]
    fn key(&self, vector: &[Z]) -> u64 {
        BuildHasher::hash_one(&self.hasher, vector)
    }
}

#[cfg(test)]
mod tests {
    use conic_core::Sign;

    use super::RayStore;
    use crate::dd::ray::Ray;
    use crate::dd::zero::{RankScratch, ZeroSet};

    fn vectors(store: &RayStore<i64>) -> Vec<Vec<i64>> {
        store.iter().map(|r| r.vector().to_vec()).collect()
    }

    #[test]
    fn orthant_holds_unit_vectors_in_order() {
        let store = RayStore::<i64>::orthant(3);
        assert_eq!(vectors(&store), vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 1]]);
        for ray in store.iter() {
            assert_eq!(ray.zero_set_count(), 2);
        }
    }

    #[test]
    fn duplicate_vectors_are_rejected() {
        let mut store = RayStore::<i64>::orthant(2);
        let dup = Ray::new(vec![3, 0], ZeroSet::new()).unwrap().unwrap();
        assert!(store.insert(dup).is_none());
        assert_eq!(store.len(), 2);
        assert!(store.contains_vector(&[1, 0]));
        assert!(!store.contains_vector(&[1, 1]));
    }

    #[test]
    fn removal_keeps_survivor_order_and_reuses_slots() {
        let mut store = RayStore::<i64>::orthant(4);
        let ids = store.ids().to_vec();
        store.remove_many(&[ids[0], ids[2]]);
        assert_eq!(vectors(&store), vec![vec![0, 1, 0, 0], vec![0, 0, 0, 1]]);

        let fresh = Ray::new(vec![1, 1, 0, 0], [2, 3].into_iter().collect())
            .unwrap()
            .unwrap();
        let id = store.insert(fresh).unwrap();
        assert!(id == ids[0] || id == ids[2]);
        assert_eq!(store.ids().last(), Some(&id));
        assert!(store.remove(ids[1]).is_some());
        assert!(store.remove(ids[1]).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn partition_splits_by_sign() {
        let store = RayStore::<i64>::orthant(3);
        let part = store.partition(&[1, -1, 0]).unwrap();
        assert_eq!(part.positive.len(), 1);
        assert_eq!(part.negative.len(), 1);
        assert_eq!(part.zero.len(), 1);
        let (sign, value) = store.classify(part.negative[0].0, &[1, -1, 0]).unwrap();
        assert_eq!((sign, value), (Sign::Negative, -1));
    }

    #[test]
    fn combination_zero_set_adds_the_new_row() {
        let store = RayStore::<i64>::orthant(3);
        let part = store.partition(&[1, -1, 0]).unwrap();
        let (p, vp) = part.positive[0];
        let (n, vn) = part.negative[0];
        let ray = store.combine(p, &vp, n, &vn, 3).unwrap().unwrap();
        assert_eq!(ray.vector(), &[1, 1, 0]);
        assert_eq!(ray.zero_set().iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn unit_vectors_of_the_orthant_are_pairwise_adjacent() {
        let store = RayStore::<i64>::orthant(3);
        let ids = store.ids().to_vec();
        let rows: Vec<Vec<i64>> = Vec::new();
        let mut scratch = RankScratch::new();
        let mut common = ZeroSet::new();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                assert!(store.is_adjacent(a, b, &rows, &mut scratch).unwrap());
                assert!(store.is_adjacent_combinatorial(a, b, &mut common));
            }
        }
    }
}
