//! Exact integer scalars used for ray coordinates.
//!
//! Every fallible operation reports [`IntOverflow`] instead of wrapping, so bounded machine
//! integers and arbitrary-precision integers can share one engine.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{Signed, ToPrimitive, Zero};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    #[inline(always)]
    pub fn from_ordering(ord: Ordering) -> Self {
        match ord {
            Ordering::Less => Self::Negative,
            Ordering::Equal => Self::Zero,
            Ordering::Greater => Self::Positive,
        }
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self == Self::Zero
    }
}

/// A bounded-width operation left the representable range.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, thiserror::Error)]
#[error("bounded-width integer arithmetic overflowed")]
pub struct IntOverflow;

/// Signed integer with exact, overflow-reporting arithmetic.
///
/// The in-place API avoids temporaries for arbitrary-precision types in the hot dot-product
/// and combination loops.
pub trait ExactInt:
    Clone + fmt::Debug + fmt::Display + Default + Eq + Ord + Hash + Send + Sync + 'static
{
    /// `true` when arithmetic can fail with [`IntOverflow`].
    const BOUNDED: bool;

    fn zero() -> Self;
    fn one() -> Self;
    fn from_i64(value: i64) -> Self;
    fn to_i64(&self) -> Option<i64>;
    fn to_bigint(&self) -> BigInt;

    fn is_zero(&self) -> bool;
    fn is_negative(&self) -> bool;

    #[inline(always)]
    fn sign(&self) -> Sign {
        if self.is_zero() {
            Sign::Zero
        } else if self.is_negative() {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    #[inline(always)]
    fn assign_from(&mut self, other: &Self) {
        self.clone_from(other);
    }

    fn add_assign(&mut self, other: &Self) -> Result<(), IntOverflow>;
    fn sub_assign(&mut self, other: &Self) -> Result<(), IntOverflow>;
    fn mul_assign(&mut self, other: &Self) -> Result<(), IntOverflow>;
    fn neg_mut(&mut self) -> Result<(), IntOverflow>;
    fn abs(&self) -> Result<Self, IntOverflow>;

    /// Replaces `self` with the non-negative gcd of `self` and `other`.
    fn gcd_assign(&mut self, other: &Self) -> Result<(), IntOverflow>;

    /// Divides by `divisor`, which must divide `self` exactly.
    fn div_assign_exact(&mut self, divisor: &Self) -> Result<(), IntOverflow>;
}

macro_rules! impl_bounded_exact_int {
    ($int:ty, $uint:ty) => {
        impl ExactInt for $int {
            const BOUNDED: bool = true;

            #[inline(always)]
            fn zero() -> Self {
                0
            }

            #[inline(always)]
            fn one() -> Self {
                1
            }

            #[inline(always)]
            fn from_i64(value: i64) -> Self {
                <$int>::from(value)
            }

            #[inline(always)]
            fn to_i64(&self) -> Option<i64> {
                i64::try_from(*self).ok()
            }

            #[inline(always)]
            fn to_bigint(&self) -> BigInt {
                BigInt::from(*self)
            }

            #[inline(always)]
            fn is_zero(&self) -> bool {
                *self == 0
            }

            #[inline(always)]
            fn is_negative(&self) -> bool {
                *self < 0
            }

            #[inline(always)]
            fn add_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
                *self = self.checked_add(*other).ok_or(IntOverflow)?;
                Ok(())
            }

            #[inline(always)]
            fn sub_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
                *self = self.checked_sub(*other).ok_or(IntOverflow)?;
                Ok(())
            }

            #[inline(always)]
            fn mul_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
                *self = self.checked_mul(*other).ok_or(IntOverflow)?;
                Ok(())
            }

            #[inline(always)]
            fn neg_mut(&mut self) -> Result<(), IntOverflow> {
                *self = self.checked_neg().ok_or(IntOverflow)?;
                Ok(())
            }

            #[inline(always)]
            fn abs(&self) -> Result<Self, IntOverflow> {
                self.checked_abs().ok_or(IntOverflow)
            }

            fn gcd_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
                let mut a: $uint = self.unsigned_abs();
                let mut b: $uint = other.unsigned_abs();
                while b != 0 {
                    let r = a % b;
                    a = b;
                    b = r;
                }
                *self = <$int>::try_from(a).map_err(|_| IntOverflow)?;
                Ok(())
            }

            #[inline(always)]
            fn div_assign_exact(&mut self, divisor: &Self) -> Result<(), IntOverflow> {
                debug_assert!(
                    *divisor != 0 && *self % *divisor == 0,
                    "inexact division {} / {}",
                    self,
                    divisor
                );
                *self = self.checked_div(*divisor).ok_or(IntOverflow)?;
                Ok(())
            }
        }
    };
}

impl_bounded_exact_int!(i64, u64);
impl_bounded_exact_int!(i128, u128);

impl ExactInt for BigInt {
    const BOUNDED: bool = false;

    #[inline(always)]
    fn zero() -> Self {
        <BigInt as Zero>::zero()
    }

    #[inline(always)]
    fn one() -> Self {
        BigInt::from(1u8)
    }

    #[inline(always)]
    fn from_i64(value: i64) -> Self {
        BigInt::from(value)
    }

    #[inline(always)]
    fn to_i64(&self) -> Option<i64> {
        ToPrimitive::to_i64(self)
    }

    #[inline(always)]
    fn to_bigint(&self) -> BigInt {
        self.clone()
    }

    #[inline(always)]
    fn is_zero(&self) -> bool {
        <BigInt as Zero>::is_zero(self)
    }

    #[inline(always)]
    fn is_negative(&self) -> bool {
        <BigInt as Signed>::is_negative(self)
    }

    #[inline(always)]
    fn add_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
        *self += other;
        Ok(())
    }

    #[inline(always)]
    fn sub_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
        *self -= other;
        Ok(())
    }

    #[inline(always)]
    fn mul_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
        *self *= other;
        Ok(())
    }

    #[inline(always)]
    fn neg_mut(&mut self) -> Result<(), IntOverflow> {
        let value = std::mem::take(self);
        *self = -value;
        Ok(())
    }

    #[inline(always)]
    fn abs(&self) -> Result<Self, IntOverflow> {
        Ok(<BigInt as Signed>::abs(self))
    }

    #[inline(always)]
    fn gcd_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
        *self = self.gcd(other);
        Ok(())
    }

    #[inline(always)]
    fn div_assign_exact(&mut self, divisor: &Self) -> Result<(), IntOverflow> {
        debug_assert!(
            <BigInt as Zero>::is_zero(&(&*self % divisor)),
            "inexact division {self} / {divisor}"
        );
        *self /= divisor;
        Ok(())
    }
}

#[cfg(feature = "rug")]
mod rug_impl {
    use std::cmp::Ordering;

    use num_bigint::BigInt;
    use num_traits::Num as _;
    use rug::Integer;
    use rug::ops::NegAssign;

    use super::{ExactInt, IntOverflow};

    impl ExactInt for Integer {
        const BOUNDED: bool = false;

        #[inline(always)]
        fn zero() -> Self {
            Integer::new()
        }

        #[inline(always)]
        fn one() -> Self {
            Integer::from(1)
        }

        #[inline(always)]
        fn from_i64(value: i64) -> Self {
            Integer::from(value)
        }

        #[inline(always)]
        fn to_i64(&self) -> Option<i64> {
            Integer::to_i64(self)
        }

        fn to_bigint(&self) -> BigInt {
            BigInt::from_str_radix(&self.to_string_radix(16), 16)
                .expect("rug renders valid radix-16 digits")
        }

        #[inline(always)]
        fn is_zero(&self) -> bool {
            self.cmp0() == Ordering::Equal
        }

        #[inline(always)]
        fn is_negative(&self) -> bool {
            self.cmp0() == Ordering::Less
        }

        #[inline(always)]
        fn add_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
            *self += other;
            Ok(())
        }

        #[inline(always)]
        fn sub_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
            *self -= other;
            Ok(())
        }

        #[inline(always)]
        fn mul_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
            *self *= other;
            Ok(())
        }

        #[inline(always)]
        fn neg_mut(&mut self) -> Result<(), IntOverflow> {
            self.neg_assign();
            Ok(())
        }

        #[inline(always)]
        fn abs(&self) -> Result<Self, IntOverflow> {
            Ok(self.clone().abs())
        }

        #[inline(always)]
        fn gcd_assign(&mut self, other: &Self) -> Result<(), IntOverflow> {
            self.gcd_mut(other);
            Ok(())
        }

        #[inline(always)]
        fn div_assign_exact(&mut self, divisor: &Self) -> Result<(), IntOverflow> {
            self.div_exact_mut(divisor);
            Ok(())
        }
    }
}
