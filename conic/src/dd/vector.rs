//! Exact integer vector arithmetic.
//!
//! All routines propagate [`IntOverflow`] so bounded coordinate types fail loudly instead of
//! producing a corrupted ray.

use conic_core::{ExactInt, IntOverflow};

/// Writes `row · ray` into `acc`, using `tmp` as the product scratch.
#[inline(always)]
pub fn dot_into<Z: ExactInt>(
    acc: &mut Z,
    tmp: &mut Z,
    row: &[Z],
    ray: &[Z],
) -> Result<(), IntOverflow> {
    debug_assert_eq!(row.len(), ray.len(), "dot product dimension mismatch");
    acc.assign_from(&Z::zero());
    for (a, b) in row.iter().zip(ray.iter()) {
        if a.is_zero() || b.is_zero() {
            continue;
        }
        tmp.assign_from(a);
        tmp.mul_assign(b)?;
        acc.add_assign(tmp)?;
    }
    Ok(())
}

#[inline]
pub fn dot<Z: ExactInt>(row: &[Z], ray: &[Z]) -> Result<Z, IntOverflow> {
    let mut acc = Z::zero();
    let mut tmp = Z::zero();
    dot_into(&mut acc, &mut tmp, row, ray)?;
    Ok(acc)
}

/// Gcd of the non-zero entries, or `None` for the zero vector.
pub fn content<Z: ExactInt>(vector: &[Z]) -> Result<Option<Z>, IntOverflow> {
    let mut gcd: Option<Z> = None;
    for v in vector.iter().filter(|v| !v.is_zero()) {
        match gcd.as_mut() {
            None => gcd = Some(v.abs()?),
            Some(g) => g.gcd_assign(v)?,
        }
    }
    Ok(gcd)
}

/// Divides by the content so the entries are coprime.
///
/// Returns `false` (leaving the vector untouched) when every entry is zero.
pub fn normalize_in_place<Z: ExactInt>(vector: &mut [Z]) -> Result<bool, IntOverflow> {
    let Some(g) = content(vector)? else {
        return Ok(false);
    };
    if g == Z::one() {
        return Ok(true);
    }
    for v in vector.iter_mut().filter(|v| !v.is_zero()) {
        v.div_assign_exact(&g)?;
    }
    Ok(true)
}

/// `true` when the entries are coprime.
pub fn is_primitive<Z: ExactInt>(vector: &[Z]) -> bool {
    matches!(content(vector), Ok(Some(g)) if g == Z::one())
}

/// Cancelling combination of a ray with positive value `pos_value` and a ray with negative
/// value `neg_value` on the same constraint row.
///
/// The result `|neg_value|·pos + |pos_value|·neg` (scaled down by the gcd of the two weights,
/// then normalised) evaluates to exactly zero on that row. Returns `None` when the combination
/// vanishes.
pub fn combine<Z: ExactInt>(
    pos: &[Z],
    pos_value: &Z,
    neg: &[Z],
    neg_value: &Z,
) -> Result<Option<Vec<Z>>, IntOverflow> {
    debug_assert_eq!(pos.len(), neg.len(), "combine dimension mismatch");
    let mut a1 = pos_value.abs()?;
    let mut a2 = neg_value.abs()?;
    if a1.is_zero() && a2.is_zero() {
        return Ok(None);
    }

    let mut g = a1.clone();
    g.gcd_assign(&a2)?;
    if !g.is_zero() && g != Z::one() {
        a1.div_assign_exact(&g)?;
        a2.div_assign_exact(&g)?;
    }

    let mut out = Vec::with_capacity(pos.len());
    let mut tmp = Z::zero();
    for (p, n) in pos.iter().zip(neg.iter()) {
        let mut acc = p.clone();
        acc.mul_assign(&a2)?;
        tmp.assign_from(n);
        tmp.mul_assign(&a1)?;
        acc.add_assign(&tmp)?;
        out.push(acc);
    }

    if !normalize_in_place(&mut out)? {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Converts machine coefficients into the engine's coordinate type.
pub fn from_i64_slice<Z: ExactInt>(values: &[i64]) -> Vec<Z> {
    values.iter().map(|&v| Z::from_i64(v)).collect()
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::{combine, content, dot, from_i64_slice, is_primitive, normalize_in_place};
    use conic_core::IntOverflow;

    #[test]
    fn combination_cancels_the_row() {
        let row = [2i64, -3, 1];
        let p = [1i64, 0, 0];
        let n = [0i64, 1, 0];
        let vp = dot(&row, &p).unwrap();
        let vn = dot(&row, &n).unwrap();
        assert_eq!((vp, vn), (2, -3));

        let c = combine(&p, &vp, &n, &vn).unwrap().unwrap();
        assert_eq!(c, vec![3, 2, 0]);
        assert_eq!(dot(&row, &c).unwrap(), 0);
    }

    #[test]
    fn combination_is_primitive() {
        let p = [2i64, 0, 4];
        let n = [0i64, 6, 2];
        let c = combine(&p, &4, &n, &-4).unwrap().unwrap();
        assert_eq!(c, vec![1, 3, 3]);
        assert!(is_primitive(&c));
    }

    #[test]
    fn normalisation_divides_by_content() {
        let mut v = vec![0i64, -6, 9, 12];
        assert_eq!(content(&v).unwrap(), Some(3));
        assert!(normalize_in_place(&mut v).unwrap());
        assert_eq!(v, vec![0, -2, 3, 4]);

        let mut zero = vec![0i64; 3];
        assert!(!normalize_in_place(&mut zero).unwrap());
    }

    #[test]
    fn bounded_overflow_is_reported() {
        let big = i64::MAX / 2;
        let p = [big, 0];
        let n = [0, 1];
        assert_eq!(combine(&p, &7, &n, &-5), Err(IntOverflow));
    }

    #[test]
    fn arbitrary_precision_handles_the_same_inputs() {
        let big = i64::MAX / 2;
        let p: Vec<BigInt> = from_i64_slice(&[big, 0]);
        let n: Vec<BigInt> = from_i64_slice(&[0, 1]);
        let c = combine(&p, &BigInt::from(7), &n, &BigInt::from(-5))
            .unwrap()
            .unwrap();
        assert_eq!(c, vec![BigInt::from(big) * 5, BigInt::from(7)]);
    }
}
