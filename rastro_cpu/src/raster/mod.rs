// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rasterizer entry points and their dispatch.
//!
//! Every combination of {rect | RLE} × {solid | gradient | image} ×
//! {plain | matte | mask} resolves to one concrete inner loop; the
//! compositing mode is matched once per call or span, never per pixel.

pub(crate) mod gradient;
pub(crate) mod image;
pub(crate) mod rect;
pub(crate) mod rle;
pub(crate) mod span;
pub(crate) mod texmap;

use crate::surface::{Surface, SurfaceBuf};
use rastro_common::blend::{alpha, alpha_blend, inv_alpha, mul_255};
use rastro_common::{Bbox, CompositeMode, GradientFill, Image, Matrix, Mesh, RleSpans};

/// Prepared geometry for one shape, as produced by the geometry stage.
#[derive(Debug, Default)]
pub struct Shape<'a> {
    /// The shape's pixel bounds.
    pub bbox: Bbox,
    /// Whether the path reduces to the axis-aligned rect `bbox`.
    pub fast_track: bool,
    /// Fill coverage spans (ignored on the fast track).
    pub rle: Option<&'a RleSpans>,
    /// Stroke coverage spans.
    pub stroke_rle: Option<&'a RleSpans>,
    /// Gradient fill of the shape body.
    pub fill: Option<&'a GradientFill>,
    /// Gradient fill of the stroke.
    pub stroke_fill: Option<&'a GradientFill>,
}

impl<'a> Shape<'a> {
    /// A shape whose path is exactly an axis-aligned rectangle.
    pub fn fast_track(bbox: Bbox) -> Self {
        Self {
            bbox,
            fast_track: true,
            ..Self::default()
        }
    }

    /// A shape rasterized through its coverage spans.
    pub fn from_rle(rle: &'a RleSpans) -> Self {
        Self {
            bbox: rle.bbox(),
            rle: Some(rle),
            ..Self::default()
        }
    }
}

/// Whether draws on this surface composite at all.
#[inline]
pub(crate) fn compositing(surface: &Surface<'_>) -> bool {
    surface
        .compositor
        .as_deref()
        .is_some_and(|c| c.mode.is_compositing())
}

/// Whether the active mode is a matte mode.
#[inline]
pub(crate) fn matting(surface: &Surface<'_>) -> bool {
    surface
        .compositor
        .as_deref()
        .is_some_and(|c| c.mode.is_matting())
}

/// The active mode, `None` outside a compositing draw.
#[inline]
pub(crate) fn composite_mode(surface: &Surface<'_>) -> CompositeMode {
    surface
        .compositor
        .as_deref()
        .map_or(CompositeMode::None, |c| c.mode)
}

/// One mask mode's per-pixel compositor update, resolved at span start.
pub(crate) trait MaskOp {
    /// Fold a fully prepared source pixel into the compositor.
    fn compose(cmp: u32, src: u32) -> u32;

    /// Fold a source pixel scaled by `a` (coverage or opacity).
    #[inline(always)]
    fn compose_scaled(cmp: u32, src: u32, a: u8) -> u32 {
        Self::compose(cmp, alpha_blend(src, a))
    }
}

/// `cmp ← src + blend(cmp, iα(src))`.
pub(crate) struct AddMaskOp;

impl MaskOp for AddMaskOp {
    #[inline(always)]
    fn compose(cmp: u32, src: u32) -> u32 {
        src + alpha_blend(cmp, inv_alpha(src))
    }
}

/// `cmp ← blend(cmp, iα(src))`.
pub(crate) struct SubMaskOp;

impl MaskOp for SubMaskOp {
    #[inline(always)]
    fn compose(cmp: u32, src: u32) -> u32 {
        alpha_blend(cmp, inv_alpha(src))
    }
}

/// `cmp ← blend(cmp, α(src))`; the zeroing outside the source is the
/// caller's loop structure.
pub(crate) struct IntMaskOp;

impl MaskOp for IntMaskOp {
    #[inline(always)]
    fn compose(cmp: u32, src: u32) -> u32 {
        alpha_blend(cmp, alpha(src))
    }
}

/// `cmp ← blend(src, iα(cmp)) + blend(cmp, iα(src))`.
pub(crate) struct DifMaskOp;

impl MaskOp for DifMaskOp {
    #[inline(always)]
    fn compose(cmp: u32, src: u32) -> u32 {
        alpha_blend(src, inv_alpha(cmp)) + alpha_blend(cmp, inv_alpha(src))
    }
}

/// Blit the compositor buffer onto the destination; every mask draw ends
/// with this composition.
pub(crate) fn composite_mask_result(surface: &mut Surface<'_>) -> bool {
    let stride = surface.stride;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let bbox = cmp.bbox.clamp_to(surface.w, surface.h);
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };
    let cbuf = cmp.image.data();
    let cstride = cmp.image.stride();
    let w = bbox.width() as usize;

    for y in bbox.y0..bbox.y1 {
        let drow = &mut buf[y as usize * stride + bbox.x0 as usize..][..w];
        let srow = &cbuf[y as usize * cstride + bbox.x0 as usize..][..w];
        for (d, &s) in drow.iter_mut().zip(srow) {
            *d = s + alpha_blend(*d, inv_alpha(s));
        }
    }
    true
}

/// Fill a shape with the colour `(r, g, b, a)`.
///
/// Returns `false` only on an unsupported surface configuration or empty
/// geometry.
pub fn raster_shape(surface: &mut Surface<'_>, shape: &Shape<'_>, r: u8, g: u8, b: u8, a: u8) -> bool {
    let (r, g, b) = premultiply_color(r, g, b, a);

    if shape.fast_track {
        let region = shape.bbox.clamp_to(surface.w, surface.h);
        if region.is_empty() {
            return false;
        }
        rect::raster_rect(surface, &region, r, g, b, a)
    } else {
        match shape.rle {
            Some(spans) => rle::raster_rle(surface, spans, r, g, b, a),
            None => false,
        }
    }
}

/// Fill a shape's stroke with the colour `(r, g, b, a)`.
pub fn raster_stroke(surface: &mut Surface<'_>, shape: &Shape<'_>, r: u8, g: u8, b: u8, a: u8) -> bool {
    let (r, g, b) = premultiply_color(r, g, b, a);

    match shape.stroke_rle {
        Some(spans) => rle::raster_rle(surface, spans, r, g, b, a),
        None => false,
    }
}

/// Fill a shape with its prepared gradient.
pub fn raster_gradient_shape(surface: &mut Surface<'_>, shape: &Shape<'_>) -> bool {
    if surface.channel_size() == 1 {
        log::error!(target: "sw_engine", "gradient on grayscale unsupported");
        return false;
    }
    let Some(fill) = shape.fill else {
        return false;
    };

    if shape.fast_track {
        let region = shape.bbox.clamp_to(surface.w, surface.h);
        if region.is_empty() {
            return false;
        }
        gradient::raster_gradient_rect(surface, &region, fill)
    } else {
        match shape.rle {
            Some(spans) => gradient::raster_gradient_rle(surface, spans, fill),
            None => false,
        }
    }
}

/// Fill a shape's stroke with its prepared gradient.
pub fn raster_gradient_stroke(surface: &mut Surface<'_>, shape: &Shape<'_>) -> bool {
    if surface.channel_size() == 1 {
        log::error!(target: "sw_engine", "gradient on grayscale unsupported");
        return false;
    }
    match (shape.stroke_rle, shape.stroke_fill) {
        (Some(spans), Some(fill)) => gradient::raster_gradient_rle(surface, spans, fill),
        _ => false,
    }
}

/// Draw an image under an optional transform and mesh, clipped to `bbox`.
///
/// The transform is inverted once here; a degenerate matrix fails the call.
pub fn raster_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    mesh: Option<&Mesh>,
    transform: Option<&Matrix>,
    bbox: &Bbox,
    opacity: u8,
) -> bool {
    if surface.channel_size() == 1 {
        log::error!(target: "sw_engine", "image on grayscale unsupported");
        return false;
    }
    if bbox.x1 < 0 || bbox.y1 < 0 || bbox.x0 >= surface.w as i32 || bbox.y0 >= surface.h as i32 {
        log::error!(target: "sw_engine", "image bbox outside the surface");
        return false;
    }
    let region = bbox.clamp_to(surface.w, surface.h);

    if let Some(mesh) = mesh {
        if !mesh.is_empty() {
            return image::mesh_image(surface, image, mesh, transform, &region, opacity);
        }
    }
    if image.rle.is_some() {
        image::rle_image(surface, image, transform, &region, opacity)
    } else {
        image::whole_image(surface, image, transform, &region, opacity)
    }
}

/// Scale `(r, g, b)` by `a` so the inner loops see premultiplied source.
#[inline]
fn premultiply_color(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8) {
    if a < 255 {
        (mul_255(r, a), mul_255(g, a), mul_255(b, a))
    } else {
        (r, g, b)
    }
}
