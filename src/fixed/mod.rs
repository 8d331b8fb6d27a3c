//! Q32.32 fixed-point arithmetic
//!
//! The numeric substrate of the rasterizer. Targets without a fast hardware
//! divider get integer-only multiply, divide and reciprocal:
//! - `mul` never needs a 128-bit product
//! - `div` builds the fraction with binary long division
//! - `recip` is a two-step Newton-Raphson approximation
//!
//! Every operation is total. Results that leave the representable range
//! saturate to `Fix::MAX` / `Fix::MIN`.

mod ops;
mod recip;

pub use recip::clz64;

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

/// Number of fractional bits (fixed: the multiply splits on this boundary)
pub const FRAC_BITS: u32 = 32;

const FRAC_MASK: i64 = (1 << FRAC_BITS) - 1;
const SCALE_F64: f64 = (1u64 << FRAC_BITS) as f64;
const SCALE_F32: f32 = (1u64 << FRAC_BITS) as f32;

/// Signed Q32.32 fixed-point number.
///
/// High 32 bits are the signed integer part, low 32 bits the unsigned fraction.
/// Equality and ordering compare the raw bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fix(i64);

impl Fix {
    pub const ZERO: Fix = Fix(0);
    pub const ONE: Fix = Fix(1 << FRAC_BITS);
    pub const ONE_HALF: Fix = Fix(1 << (FRAC_BITS - 1));
    /// Largest value: full integer part, full fraction
    pub const MAX: Fix = Fix(i64::MAX);
    pub const MIN: Fix = Fix(i64::MIN);

    #[inline]
    pub const fn from_bits(bits: i64) -> Self {
        Fix(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i64 {
        self.0
    }

    /// Exact conversion from an integer
    #[inline]
    pub const fn from_int(n: i32) -> Self {
        Fix((n as i64) << FRAC_BITS)
    }

    /// Integer part, rounding toward negative infinity (no rounding to nearest)
    #[inline]
    pub const fn to_int(self) -> i32 {
        (self.0 >> FRAC_BITS) as i32
    }

    /// Lossy conversion. Out-of-range inputs saturate, NaN becomes zero.
    #[inline]
    pub fn from_f32(f: f32) -> Self {
        Fix((f * SCALE_F32) as i64)
    }

    #[inline]
    pub fn from_f64(d: f64) -> Self {
        Fix((d * SCALE_F64) as i64)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / SCALE_F32
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / SCALE_F64
    }

    /// Signed integer half (`self >> 32`)
    #[inline]
    pub const fn int_part(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    /// Unsigned fraction half
    #[inline]
    pub const fn frac_part(self) -> i64 {
        self.0 & FRAC_MASK
    }

    /// Absolute value, `MIN` saturates to `MAX`
    #[inline]
    pub const fn abs(self) -> Self {
        Fix(self.0.saturating_abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Saturated value carrying the given sign
    #[inline]
    pub(crate) const fn saturated(negative: bool) -> Self {
        if negative { Fix::MIN } else { Fix::MAX }
    }
}

impl From<i32> for Fix {
    fn from(n: i32) -> Self {
        Fix::from_int(n)
    }
}

impl From<f32> for Fix {
    fn from(f: f32) -> Self {
        Fix::from_f32(f)
    }
}

impl From<f64> for Fix {
    fn from(d: f64) -> Self {
        Fix::from_f64(d)
    }
}

impl Add for Fix {
    type Output = Fix;
    fn add(self, other: Fix) -> Fix {
        Fix(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Fix {
    fn add_assign(&mut self, other: Fix) {
        *self = *self + other;
    }
}

impl Sub for Fix {
    type Output = Fix;
    fn sub(self, other: Fix) -> Fix {
        Fix(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Fix {
    fn sub_assign(&mut self, other: Fix) {
        *self = *self - other;
    }
}

impl Neg for Fix {
    type Output = Fix;
    fn neg(self) -> Fix {
        Fix(self.0.saturating_neg())
    }
}

impl Mul for Fix {
    type Output = Fix;
    fn mul(self, other: Fix) -> Fix {
        Fix::mul(self, other)
    }
}

impl Div for Fix {
    type Output = Fix;
    fn div(self, other: Fix) -> Fix {
        Fix::div(self, other)
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
