// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared data structures for the [Rastro CPU][rastro_cpu] software rasterizer.
//!
//! # Usage
//!
//! This crate should not be used on its own; it exists so that the pixel
//! algebra, colour-space handling and geometry carriers have a single home
//! that the rasterizer and any frontend can agree on.
//!
//! # Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm][].
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! # Contents
//!
//! - Premultiplied-alpha pixel algebra on packed 32-bit words
//! - Colour spaces and the byte-order-dependent [`Blender`][color::Blender]
//! - RLE coverage spans, integer bounding boxes, image sources, gradient
//!   fills and the 3×3 transform matrix
//!
//! [rastro_cpu]: https://crates.io/crates/rastro_cpu
#![cfg_attr(feature = "libm", doc = "[libm]: libm")]
#![cfg_attr(not(feature = "libm"), doc = "[libm]: https://crates.io/crates/libm")]
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![no_std]

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use libm as _;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod bbox;
pub mod blend;
pub mod color;
pub mod composite;
pub mod fill;
pub mod image;
pub mod math;
pub mod matrix;
pub mod mesh;
pub mod rle;

pub use bbox::Bbox;
pub use color::{Blender, ColorSpace};
pub use composite::CompositeMode;
pub use fill::{FillKind, FillSpread, GradientFill};
pub use image::{BlitPath, Image};
pub use matrix::Matrix;
pub use mesh::{Mesh, Triangle, Vertex};
pub use rle::{RleSpans, Span};
