//! Element types the filter and smoother recursions are generic over.
//!
//! The four numeric variants (single/double precision, real/complex) share
//! one implementation of every recursion. Complex variants use plain
//! (non-conjugating) transposes throughout, so a complex model with zero
//! imaginary parts reproduces the real results exactly.

use std::fmt::Debug;

use ndarray::{LinalgScalar, ScalarOperand};
use num_complex::Complex;
use num_traits::Zero;

/// Matrix element usable by the Kalman filter and smoother.
///
/// Implemented for `f32`, `f64`, `Complex<f32>` and `Complex<f64>`.
pub trait Scalar: LinalgScalar + ScalarOperand + PartialEq + Debug + Send + Sync {
    /// Converts a real `f64` constant into `Self`.
    fn from_f64(x: f64) -> Self;

    /// Returns `true` if every component is finite.
    fn is_finite(self) -> bool;

    /// Absolute value (modulus for complex numbers) as `f64`.
    fn modulus(self) -> f64;

    /// Natural logarithm (principal branch for complex numbers).
    fn ln(self) -> Self;

    /// Returns `true` if `self` is exactly zero or not finite.
    ///
    /// A forecast error variance in this state carries no information and
    /// cannot be divided by.
    fn is_degenerate(self) -> bool {
        self == Self::zero() || !self.is_finite()
    }
}

macro_rules! impl_scalar_real {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                #[inline] fn from_f64(x: f64) -> $t { x as $t }
                #[inline] fn is_finite(self) -> bool { <$t>::is_finite(self) }
                #[inline] fn modulus(self) -> f64 { <$t>::abs(self) as f64 }
                #[inline] fn ln(self) -> $t { <$t>::ln(self) }
            }
        )*
    };
}

macro_rules! impl_scalar_complex {
    ($($t:ty),*) => {
        $(
            impl Scalar for Complex<$t> {
                #[inline] fn from_f64(x: f64) -> Self { Complex::new(x as $t, 0.0) }
                #[inline] fn is_finite(self) -> bool { Complex::<$t>::is_finite(self) }
                #[inline] fn modulus(self) -> f64 { self.norm() as f64 }
                #[inline] fn ln(self) -> Self { Complex::<$t>::ln(self) }
            }
        )*
    };
}

impl_scalar_real!(f32, f64);
impl_scalar_complex!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn degenerate_real() {
        assert!(0.0_f64.is_degenerate());
        assert!(f64::NAN.is_degenerate());
        assert!(f64::INFINITY.is_degenerate());
        assert!(!1e-300_f64.is_degenerate());
        assert!(0.0_f32.is_degenerate());
        assert!(!2.0_f32.is_degenerate());
    }

    #[test]
    fn degenerate_complex() {
        assert!(Complex::new(0.0_f64, 0.0).is_degenerate());
        assert!(Complex::new(f64::NAN, 1.0).is_degenerate());
        assert!(!Complex::new(0.0_f64, 1.0).is_degenerate());
    }

    #[test]
    fn from_f64_and_modulus() {
        assert_abs_diff_eq!(<f32 as Scalar>::from_f64(0.5).modulus(), 0.5, epsilon = 1e-7);
        let z = <Complex<f64> as Scalar>::from_f64(-2.0);
        assert_eq!(z, Complex::new(-2.0, 0.0));
        assert_abs_diff_eq!(Complex::new(3.0_f64, 4.0).modulus(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn ln_matches_real_on_positive_axis() {
        let z = <Complex<f64> as Scalar>::ln(Complex::new(2.0, 0.0));
        assert_abs_diff_eq!(z.re, 2.0_f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(z.im, 0.0, epsilon = 1e-12);
    }
}
