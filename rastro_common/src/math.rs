// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical helper functions.

use core::ops::Sub;

// From <https://github.com/linebender/tiny-skia/blob/68b198a7210a6bbf752b43d6bc4db62445730313/path/src/scalar.rs#L12>
const SCALAR_NEARLY_ZERO: f32 = 1.0 / (1 << 12) as f32;

/// A number of useful methods for f32 numbers.
pub trait FloatExt: Sized + Sub<f32, Output = f32> {
    /// Whether the number is approximately 0.
    fn is_nearly_zero(&self) -> bool {
        self.is_nearly_zero_within_tolerance(SCALAR_NEARLY_ZERO)
    }

    /// Whether the number is approximately 0, with a given tolerance.
    fn is_nearly_zero_within_tolerance(&self, tolerance: f32) -> bool;
}

impl FloatExt for f32 {
    fn is_nearly_zero_within_tolerance(&self, tolerance: f32) -> bool {
        debug_assert!(tolerance >= 0.0, "tolerance must be positive");

        self.abs() <= tolerance
    }
}

/// `sqrt` for f32, available with either the `std` or the `libm` feature.
#[cfg(feature = "std")]
#[inline(always)]
pub fn sqrtf(val: f32) -> f32 {
    val.sqrt()
}

/// `sqrt` for f32, available with either the `std` or the `libm` feature.
#[cfg(not(feature = "std"))]
#[inline(always)]
pub fn sqrtf(val: f32) -> f32 {
    #[cfg(feature = "libm")]
    return libm::sqrtf(val);
    #[cfg(not(feature = "libm"))]
    compile_error!("rastro_common requires either the `std` or `libm` feature");
}

/// `floor` for f32, available with either the `std` or the `libm` feature.
#[cfg(feature = "std")]
#[inline(always)]
pub fn floorf(val: f32) -> f32 {
    val.floor()
}

/// `ceil` for f32, available with either the `std` or the `libm` feature.
#[cfg(feature = "std")]
#[inline(always)]
pub fn ceilf(val: f32) -> f32 {
    val.ceil()
}

/// `ceil` for f32, available with either the `std` or the `libm` feature.
#[cfg(not(feature = "std"))]
#[inline(always)]
pub fn ceilf(val: f32) -> f32 {
    #[cfg(feature = "libm")]
    return libm::ceilf(val);
    #[cfg(not(feature = "libm"))]
    compile_error!("rastro_common requires either the `std` or `libm` feature");
}

/// `floor` for f32, available with either the `std` or the `libm` feature.
#[cfg(not(feature = "std"))]
#[inline(always)]
pub fn floorf(val: f32) -> f32 {
    #[cfg(feature = "libm")]
    return libm::floorf(val);
    #[cfg(not(feature = "libm"))]
    compile_error!("rastro_common requires either the `std` or `libm` feature");
}
