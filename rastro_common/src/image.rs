// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only image sources for the image rasterizer.

use crate::color::ColorSpace;
use crate::rle::RleSpans;

/// Which blit path the prepared transform admits.
///
/// Decided by the preparation stage from the forward matrix: identity (up to
/// sub-pixel tolerance) is `Direct`, a pure uniform scale is `Scaled`,
/// anything else is `Transformed` and goes through the texmap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlitPath {
    /// Plain row copy, blended by opacity.
    Direct,
    /// Axis-aligned resampling through the inverse transform.
    Scaled,
    /// General transform; textured-polygon fill.
    Transformed,
}

/// A borrowed premultiplied pixel source.
///
/// The buffer is owned by the enclosing paint object and must outlive any
/// in-flight raster call against it. `ox`/`oy` shift the sampled region for
/// the direct path; `rle`, when present, clips the blit to a span list.
#[derive(Debug)]
pub struct Image<'a> {
    /// Premultiplied pixels in the surface's colour space, row-major.
    pub buf: &'a [u32],
    /// Row stride in elements.
    pub stride: usize,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
    /// Horizontal shift of the sampled region.
    pub ox: i32,
    /// Vertical shift of the sampled region.
    pub oy: i32,
    /// Optional span clip driving the blit.
    pub rle: Option<&'a RleSpans>,
    /// Row-major mean of the inverse-transform scale; selects the resampler.
    pub scale: f32,
    /// The admissible blit path.
    pub path: BlitPath,
    /// Source colour space; must match the surface's.
    pub cs: ColorSpace,
}

impl<'a> Image<'a> {
    /// An untransformed whole image: direct path, unit scale, no clip.
    pub fn new(buf: &'a [u32], stride: usize, w: u32, h: u32, cs: ColorSpace) -> Self {
        debug_assert!(buf.len() >= stride * h as usize, "image buffer too short");
        Self {
            buf,
            stride,
            w,
            h,
            ox: 0,
            oy: 0,
            rle: None,
            scale: 1.0,
            path: BlitPath::Direct,
            cs,
        }
    }
}
