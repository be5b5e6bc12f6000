//! Float trait abstraction for f32/f64 support.
//!
//! This module provides a unified trait for floating-point operations,
//! enabling the diffusion kernels to work with both f32 and f64 precision.

use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::Debug;
use std::iter::Sum;

/// Trait alias for floating point types supported by the diffusion kernels.
///
/// This trait combines all the bounds needed for the stencil computations:
/// - Basic float operations (Float, NumAssign)
/// - Conversion from primitive types (FromPrimitive)
/// - Iteration support (Sum)
/// - Thread safety for rayon fan-out (Send, Sync)
pub trait DiffusionFloat:
    Float + FromPrimitive + NumAssign + Sum + Debug + Send + Sync + 'static
{
    /// Create a value from an f64 constant.
    fn from_f64_c(val: f64) -> Self;

    /// Create a value from a usize constant.
    fn usize_as(val: usize) -> Self;
}

impl DiffusionFloat for f32 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val as f32
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f32
    }
}

impl DiffusionFloat for f64 {
    #[inline]
    fn from_f64_c(val: f64) -> Self {
        val
    }

    #[inline]
    fn usize_as(val: usize) -> Self {
        val as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_trait_impl() {
        let val: f32 = DiffusionFloat::from_f64_c(0.25);
        assert_eq!(val, 0.25f32);

        let usize_val: f32 = DiffusionFloat::usize_as(42);
        assert_eq!(usize_val, 42.0f32);
    }

    #[test]
    fn test_f64_trait_impl() {
        let val: f64 = DiffusionFloat::from_f64_c(0.25);
        assert_eq!(val, 0.25f64);

        let usize_val: f64 = DiffusionFloat::usize_as(42);
        assert_eq!(usize_val, 42.0f64);
    }
}
