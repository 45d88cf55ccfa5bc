// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rastro CPU is the software rasterization core of a 2D vector-graphics
//! engine: the pixel-producing stage that turns already-prepared geometry
//! (axis-aligned rectangles, RLE coverage spans, images) into pixels in a
//! destination surface, honoring colour, gradient fills, opacity, affine
//! transforms, image scaling and compositing against a mask/matte buffer.
//!
//! Geometry preparation (path flattening, RLE generation, stroke expansion),
//! gradient *geometry*, loaders and the public painter API live upstream;
//! this crate consumes their outputs and writes pixels.
//!
//! ## Usage
//!
//! - Wrap an externally owned pixel buffer in a [`Surface`].
//! - Hand prepared geometry to the entry points in [`raster`]:
//!   [`raster_shape`][raster::raster_shape], [`raster_stroke`][raster::raster_stroke],
//!   [`raster_gradient_shape`][raster::raster_gradient_shape],
//!   [`raster_image`][raster::raster_image].
//! - For nested off-screen passes, use [`Surface::begin_composite`] /
//!   [`Surface::end_composite`]; for mask/matte compositing, attach a
//!   [`Compositor`] and pick a [`CompositeMode`][rastro_common::CompositeMode].
//!
//! ```rust
//! use rastro_cpu::common::{Bbox, ColorSpace};
//! use rastro_cpu::raster::{raster_shape, Shape};
//! use rastro_cpu::Surface;
//!
//! let mut pixels = vec![0_u32; 16 * 16];
//! let mut surface =
//!     Surface::new_rgba(&mut pixels, 16, 16, 16, ColorSpace::Abgr8888).unwrap();
//! let shape = Shape::fast_track(Bbox::new(4, 4, 12, 12));
//! assert!(raster_shape(&mut surface, &shape, 255, 0, 0, 255));
//! drop(surface);
//! assert_eq!(pixels[4 * 16 + 4], 0xff00_00ff);
//! assert_eq!(pixels[0], 0x0000_0000);
//! ```
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from `libm`.
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! ## Error surface
//!
//! The raster entry points return `bool`; `false` is silent apart from a
//! structured log line under the `sw_engine` target, and leaves the affected
//! destination pixels unchanged. The rasterizer is strictly single-threaded
//! per surface and allocates only when a compositor buffer is created.
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
#![expect(
    clippy::cast_possible_truncation,
    reason = "coordinates and channel sums are range-checked before narrowing"
)]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod raster;
mod surface;

pub use rastro_common as common;
pub use surface::{CompositeCtx, Compositor, LayerBuf, Surface, SurfaceBuf, SurfaceError};
