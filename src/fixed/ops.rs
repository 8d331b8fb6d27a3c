//! Multiplication and division without 128-bit intermediates

use super::{Fix, FRAC_BITS, FRAC_MASK};

/// Clamp a high word (floor of value / 2^32) and low word into a `Fix`
#[inline]
fn join(hi: i64, lo: i64) -> Fix {
    if hi > i32::MAX as i64 {
        Fix::MAX
    } else if hi < i32::MIN as i64 {
        Fix::MIN
    } else {
        Fix::from_bits((hi << FRAC_BITS) | (lo & FRAC_MASK))
    }
}

impl Fix {
    /// Exact product.
    ///
    /// Expands `(i1 + f1)(i2 + f2)` into `i1*i2 << 32`, `i1*f2`, `i2*f1` and
    /// `f1*f2 >> 32`. Each partial product fits in 64 bits; the cross terms are
    /// split into high and low words so carries are summed without overflow
    /// and out-of-range products saturate.
    pub fn mul(self, other: Fix) -> Fix {
        let (i1, f1) = (self.int_part(), self.frac_part());
        let (i2, f2) = (other.int_part(), other.frac_part());

        let ff = ((f1 as u64 * f2 as u64) >> FRAC_BITS) as i64;
        let cross1 = i1 * f2;
        let cross2 = i2 * f1;

        let lo = (cross1 & FRAC_MASK) + (cross2 & FRAC_MASK) + ff;
        let hi = i1 * i2 + (cross1 >> FRAC_BITS) + (cross2 >> FRAC_BITS) + (lo >> FRAC_BITS);
        join(hi, lo)
    }

    /// Integer part of the product, skipping the fraction * fraction term.
    ///
    /// For pixel and texel indices where only the integer result matters.
    /// May be one below `mul(..).to_int()` when the dropped term carries.
    pub fn mul_fast_int(self, other: Fix) -> i32 {
        let (i1, f1) = (self.int_part(), self.frac_part());
        let (i2, f2) = (other.int_part(), other.frac_part());

        let cross = (i1 * f2).saturating_add(i2 * f1);
        let hi = (i1 * i2).saturating_add(cross >> FRAC_BITS);
        hi.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Product of both operands truncated to 16 fraction bits.
    ///
    /// One native multiply; the low 16 fraction bits of each operand are lost.
    /// Good enough for shading and other low-importance interpolation.
    pub fn mul_fast_low_precision(self, other: Fix) -> Fix {
        let a = self.to_bits() >> 16;
        let b = other.to_bits() >> 16;
        match a.checked_mul(b) {
            Some(p) => Fix::from_bits(p),
            None => Fix::saturated((a < 0) != (b < 0)),
        }
    }

    /// Quotient `self / denom`, truncated toward zero.
    ///
    /// Division by zero saturates to `MAX` for a non-negative numerator and
    /// `MIN` otherwise. Quotients outside the range saturate the same way.
    pub fn div(self, denom: Fix) -> Fix {
        if denom == Fix::ZERO {
            return Fix::saturated(self.is_negative());
        }

        let negative = self.is_negative() != denom.is_negative();
        let a = self.to_bits().unsigned_abs();
        let b = denom.to_bits().unsigned_abs();

        // (a << 32) / b would overflow, so take the integer quotient first and
        // extend the remainder one bit at a time for the fraction
        let quot_hi = a / b;
        if quot_hi > u32::MAX as u64 {
            return Fix::saturated(negative);
        }

        let mut rem = a % b;
        let mut quot_lo = 0u64;
        for _ in 0..FRAC_BITS {
            // rem < b <= 2^63, so the shift cannot lose a bit
            rem <<= 1;
            quot_lo <<= 1;
            if rem >= b {
                rem -= b;
                quot_lo |= 1;
            }
        }

        let magnitude = (quot_hi << FRAC_BITS) | quot_lo;
        if negative {
            if magnitude >= 1 << 63 {
                Fix::MIN
            } else {
                Fix::from_bits(-(magnitude as i64))
            }
        } else if magnitude > i64::MAX as u64 {
            Fix::MAX
        } else {
            Fix::from_bits(magnitude as i64)
        }
    }

    /// Floating-point division for non-critical paths.
    ///
    /// Approximate (53-bit mantissa), never use where `div`'s exactness is
    /// required. Shares `div`'s zero-divisor saturation.
    pub fn div_approx(self, denom: Fix) -> Fix {
        if denom == Fix::ZERO {
            return Fix::saturated(self.is_negative());
        }
        Fix::from_bits((self.to_bits() as f64 / denom.to_f64()) as i64)
    }
}
