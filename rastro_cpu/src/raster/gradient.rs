// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient span writers and the rect/RLE gradient rasterizers.
//!
//! The gradient parameter advances in closed form (`t = dx·x + dy·y + c`
//! for linear, a square root per pixel for radial); the write operation is
//! a zero-sized tag resolved at span start, so the per-pixel loop carries
//! no mode branching. Coverage scaling of gradient spans happens here and
//! nowhere else.

use super::rle::clip_span;
use super::{
    composite_mask_result, composite_mode, compositing, matting, AddMaskOp, DifMaskOp, IntMaskOp,
    MaskOp, SubMaskOp,
};
use crate::surface::{Compositor, Surface, SurfaceBuf};
use core::marker::PhantomData;
use rastro_common::blend::{alpha_blend, interpolate, inv_alpha, mul_255};
use rastro_common::color::MatteFn;
use rastro_common::fill::{LinearFill, RadialFill};
use rastro_common::math::{floorf, sqrtf};
use rastro_common::{Bbox, CompositeMode, FillKind, FillSpread, GradientFill, RleSpans};

/// One write operation applied to every pixel of a gradient span.
pub(crate) trait GradOp {
    fn apply(d: &mut u32, src: u32, a: u8);
}

/// Plain ramp store (opaque ramp, full coverage).
pub(crate) struct SourceOp;

impl GradOp for SourceOp {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, _a: u8) {
        *d = src;
    }
}

/// Source-over (translucent ramp, full coverage).
pub(crate) struct BlendOp;

impl GradOp for BlendOp {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, _a: u8) {
        *d = src + alpha_blend(*d, inv_alpha(src));
    }
}

/// Coverage-scaled source-over (translucent ramp, partial coverage).
pub(crate) struct AlphaBlendOp;

impl GradOp for AlphaBlendOp {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, a: u8) {
        let s = alpha_blend(src, a);
        *d = s + alpha_blend(*d, inv_alpha(s));
    }
}

/// Coverage interpolation (opaque ramp, partial coverage).
pub(crate) struct InterpOp;

impl GradOp for InterpOp {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, a: u8) {
        *d = interpolate(src, *d, a);
    }
}

/// Mask update at full coverage.
pub(crate) struct MaskFullOp<O>(PhantomData<O>);

impl<O: MaskOp> GradOp for MaskFullOp<O> {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, _a: u8) {
        *d = O::compose(*d, src);
    }
}

/// Mask update at partial coverage.
pub(crate) struct MaskScaledOp<O>(PhantomData<O>);

impl<O: MaskOp> GradOp for MaskScaledOp<O> {
    #[inline(always)]
    fn apply(d: &mut u32, src: u32, a: u8) {
        *d = O::compose_scaled(*d, src, a);
    }
}

/// Per-pixel gradient parameters along one horizontal run.
pub(crate) trait FillEval: Copy {
    type Params: Iterator<Item = f32>;
    fn params(&self, x: i32, y: i32) -> Self::Params;
}

#[derive(Copy, Clone)]
pub(crate) struct LinearEval<'a>(pub &'a LinearFill);

pub(crate) struct LinearParams {
    t: f32,
    dt: f32,
}

impl Iterator for LinearParams {
    type Item = f32;

    #[inline(always)]
    fn next(&mut self) -> Option<f32> {
        let t = self.t;
        self.t += self.dt;
        Some(t)
    }
}

impl FillEval for LinearEval<'_> {
    type Params = LinearParams;

    #[inline(always)]
    fn params(&self, x: i32, y: i32) -> LinearParams {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let t = (x as f32 + 0.5) * self.0.dx + (y as f32 + 0.5) * self.0.dy + self.0.offset;
        LinearParams { t, dt: self.0.dx }
    }
}

#[derive(Copy, Clone)]
pub(crate) struct RadialEval<'a>(pub &'a RadialFill);

pub(crate) struct RadialParams {
    rx: f32,
    ry2: f32,
    inv_r: f32,
}

impl Iterator for RadialParams {
    type Item = f32;

    #[inline(always)]
    fn next(&mut self) -> Option<f32> {
        let t = sqrtf(self.rx * self.rx + self.ry2) * self.inv_r;
        self.rx += 1.0;
        Some(t)
    }
}

impl FillEval for RadialEval<'_> {
    type Params = RadialParams;

    #[inline(always)]
    fn params(&self, x: i32, y: i32) -> RadialParams {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let (rx, ry) = (
            x as f32 + 0.5 - self.0.fx,
            y as f32 + 0.5 - self.0.fy,
        );
        RadialParams {
            rx,
            ry2: ry * ry,
            inv_r: 1.0 / self.0.a,
        }
    }
}

/// Map the gradient parameter into the ramp under the fill's spread.
#[inline(always)]
fn ramp_index(t: f32, spread: FillSpread) -> usize {
    let t = match spread {
        FillSpread::Pad => t.clamp(0.0, 1.0),
        FillSpread::Repeat => t - floorf(t),
        FillSpread::Reflect => {
            let m = t - 2.0 * floorf(t * 0.5);
            if m > 1.0 {
                2.0 - m
            } else {
                m
            }
        }
    };
    #[expect(clippy::cast_sign_loss, reason = "t is non-negative after the spread")]
    {
        ((t * 255.0 + 0.5) as usize).min(255)
    }
}

/// Write one gradient run with a constant coverage.
fn fill_span<E: FillEval, O: GradOp>(
    fill: &GradientFill,
    eval: E,
    dst: &mut [u32],
    x: i32,
    y: i32,
    a: u8,
) {
    let ramp = fill.ramp();
    let mut params = eval.params(x, y);
    for d in dst {
        let t = params.next().unwrap();
        O::apply(d, ramp[ramp_index(t, fill.spread)], a);
    }
}

/// Write one matted gradient run; the per-pixel factor comes from the
/// compositor row.
fn fill_span_matted<E: FillEval>(
    fill: &GradientFill,
    eval: E,
    dst: &mut [u32],
    cmp: &[u32],
    matte: MatteFn,
    x: i32,
    y: i32,
    a: u8,
) {
    let ramp = fill.ramp();
    let mut params = eval.params(x, y);
    for (d, &c) in dst.iter_mut().zip(cmp) {
        let t = params.next().unwrap();
        let src = ramp[ramp_index(t, fill.spread)];
        let m = if a == 255 {
            matte(c)
        } else {
            mul_255(a, matte(c))
        };
        let s = alpha_blend(src, m);
        *d = s + alpha_blend(*d, inv_alpha(s));
    }
}

/// Fill a rect region with a gradient.
pub(crate) fn raster_gradient_rect(
    surface: &mut Surface<'_>,
    region: &Bbox,
    fill: &GradientFill,
) -> bool {
    match &fill.kind {
        FillKind::Linear(lin) => {
            if lin.len < f32::EPSILON {
                return false;
            }
            grad_rect(surface, region, fill, LinearEval(lin))
        }
        FillKind::Radial(rad) => {
            if rad.a < f32::EPSILON {
                return false;
            }
            grad_rect(surface, region, fill, RadialEval(rad))
        }
    }
}

/// Fill a span list with a gradient.
pub(crate) fn raster_gradient_rle(
    surface: &mut Surface<'_>,
    rle: &RleSpans,
    fill: &GradientFill,
) -> bool {
    if rle.is_empty() {
        return false;
    }
    match &fill.kind {
        FillKind::Linear(lin) => {
            if lin.len < f32::EPSILON {
                return false;
            }
            grad_rle(surface, rle, fill, LinearEval(lin))
        }
        FillKind::Radial(rad) => {
            if rad.a < f32::EPSILON {
                return false;
            }
            grad_rle(surface, rle, fill, RadialEval(rad))
        }
    }
}

fn grad_rect<E: FillEval>(
    surface: &mut Surface<'_>,
    region: &Bbox,
    fill: &GradientFill,
    eval: E,
) -> bool {
    if compositing(surface) {
        if matting(surface) {
            grad_rect_matted(surface, region, fill, eval)
        } else {
            grad_rect_masked(surface, region, fill, eval)
        }
    } else {
        let stride = surface.stride;
        let w = region.width() as usize;
        let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
            return false;
        };
        for y in region.y0..region.y1 {
            let row = &mut buf[y as usize * stride + region.x0 as usize..][..w];
            if fill.translucent {
                fill_span::<E, BlendOp>(fill, eval, row, region.x0, y, 255);
            } else {
                fill_span::<E, SourceOp>(fill, eval, row, region.x0, y, 255);
            }
        }
        true
    }
}

fn grad_rect_matted<E: FillEval>(
    surface: &mut Surface<'_>,
    region: &Bbox,
    fill: &GradientFill,
    eval: E,
) -> bool {
    let stride = surface.stride;
    let w = region.width() as usize;
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(
        target: "sw_engine",
        "matted({:?}) gradient rect [region: {} {} {w} {}]",
        cmp.mode, region.x0, region.y0, region.height()
    );
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for y in region.y0..region.y1 {
        let drow = &mut buf[y as usize * stride + region.x0 as usize..][..w];
        let crow = &cbuf[y as usize * cstride + region.x0 as usize..][..w];
        fill_span_matted(fill, eval, drow, crow, matte, region.x0, y, 255);
    }
    true
}

fn grad_rect_masked<E: FillEval>(
    surface: &mut Surface<'_>,
    region: &Bbox,
    fill: &GradientFill,
    eval: E,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let mode = composite_mode(surface);
    log::debug!(
        target: "sw_engine",
        "masked({mode:?}) gradient rect [region: {} {} {} {}]",
        region.x0, region.y0, region.width(), region.height()
    );
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => grad_rect_mask_loop::<E, AddMaskOp>(cmp, region, fill, eval),
        CompositeMode::SubtractMask => grad_rect_mask_loop::<E, SubMaskOp>(cmp, region, fill, eval),
        CompositeMode::DifferenceMask => grad_rect_mask_loop::<E, DifMaskOp>(cmp, region, fill, eval),
        CompositeMode::IntersectMask => grad_rect_mask_int(cmp, region, fill, eval),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn grad_rect_mask_loop<E: FillEval, O: MaskOp>(
    cmp: &mut Compositor,
    region: &Bbox,
    fill: &GradientFill,
    eval: E,
) {
    let stride = cmp.image.stride();
    let w = region.width() as usize;
    let buf = cmp.image.data_mut();
    for y in region.y0..region.y1 {
        let row = &mut buf[y as usize * stride + region.x0 as usize..][..w];
        fill_span::<E, MaskFullOp<O>>(fill, eval, row, region.x0, y, 255);
    }
}

fn grad_rect_mask_int<E: FillEval>(
    cmp: &mut Compositor,
    region: &Bbox,
    fill: &GradientFill,
    eval: E,
) {
    let bbox = cmp.bbox;
    let region = region.intersect(&bbox);
    let stride = cmp.image.stride();
    let buf = cmp.image.data_mut();

    for y in bbox.y0..bbox.y1 {
        let row = &mut buf[y as usize * stride..];
        if !region.is_empty() && y >= region.y0 && y < region.y1 {
            row[bbox.x0 as usize..region.x0 as usize].fill(0);
            let span = &mut row[region.x0 as usize..region.x1 as usize];
            fill_span::<E, MaskFullOp<IntMaskOp>>(fill, eval, span, region.x0, y, 255);
            row[region.x1 as usize..bbox.x1 as usize].fill(0);
        } else {
            row[bbox.x0 as usize..bbox.x1 as usize].fill(0);
        }
    }
}

fn grad_rle<E: FillEval>(
    surface: &mut Surface<'_>,
    rle: &RleSpans,
    fill: &GradientFill,
    eval: E,
) -> bool {
    if compositing(surface) {
        if matting(surface) {
            grad_rle_matted(surface, rle, fill, eval)
        } else {
            grad_rle_masked(surface, rle, fill, eval)
        }
    } else {
        let stride = surface.stride;
        let (w, h) = (surface.w, surface.h);
        let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
            return false;
        };
        for s in rle.spans() {
            let Some((x, y, len)) = clip_span(s, w, h) else {
                continue;
            };
            let row = &mut buf[y * stride + x..][..len];
            let (x, y) = (x as i32, y as i32);
            if fill.translucent {
                if s.coverage == 255 {
                    fill_span::<E, BlendOp>(fill, eval, row, x, y, 255);
                } else {
                    fill_span::<E, AlphaBlendOp>(fill, eval, row, x, y, s.coverage);
                }
            } else if s.coverage == 255 {
                fill_span::<E, SourceOp>(fill, eval, row, x, y, 255);
            } else {
                fill_span::<E, InterpOp>(fill, eval, row, x, y, s.coverage);
            }
        }
        true
    }
}

fn grad_rle_matted<E: FillEval>(
    surface: &mut Surface<'_>,
    rle: &RleSpans,
    fill: &GradientFill,
    eval: E,
) -> bool {
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(target: "sw_engine", "matted({:?}) gradient rle", cmp.mode);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        let drow = &mut buf[y * stride + x..][..len];
        let crow = &cbuf[y * cstride + x..][..len];
        fill_span_matted(fill, eval, drow, crow, matte, x as i32, y as i32, s.coverage);
    }
    true
}

fn grad_rle_masked<E: FillEval>(
    surface: &mut Surface<'_>,
    rle: &RleSpans,
    fill: &GradientFill,
    eval: E,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let mode = composite_mode(surface);
    log::debug!(target: "sw_engine", "masked({mode:?}) gradient rle");
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => grad_rle_mask_loop::<E, AddMaskOp>(cmp, rle, fill, eval),
        CompositeMode::SubtractMask => grad_rle_mask_loop::<E, SubMaskOp>(cmp, rle, fill, eval),
        CompositeMode::DifferenceMask => grad_rle_mask_loop::<E, DifMaskOp>(cmp, rle, fill, eval),
        CompositeMode::IntersectMask => grad_rle_mask_int(cmp, rle, fill, eval),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn grad_rle_mask_loop<E: FillEval, O: MaskOp>(
    cmp: &mut Compositor,
    rle: &RleSpans,
    fill: &GradientFill,
    eval: E,
) {
    let (w, h) = (cmp.image.width(), cmp.image.height());
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        let row = &mut cbuf[y * cstride + x..][..len];
        if s.coverage == 255 {
            fill_span::<E, MaskFullOp<O>>(fill, eval, row, x as i32, y as i32, 255);
        } else {
            fill_span::<E, MaskScaledOp<O>>(fill, eval, row, x as i32, y as i32, s.coverage);
        }
    }
}

fn grad_rle_mask_int<E: FillEval>(
    cmp: &mut Compositor,
    rle: &RleSpans,
    fill: &GradientFill,
    eval: E,
) {
    let bbox = cmp.bbox;
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();
    let spans = rle.spans();
    let mut next = 0_usize;

    for y in bbox.y0..bbox.y1 {
        let row = &mut cbuf[y as usize * cstride..];
        let mut x = bbox.x0;
        while x < bbox.x1 {
            let hit = next < spans.len()
                && i32::from(spans[next].y) == y
                && i32::from(spans[next].x) == x
                && x + i32::from(spans[next].len) <= bbox.x1;
            if hit {
                let s = &spans[next];
                let run = &mut row[x as usize..][..s.len as usize];
                if s.coverage == 255 {
                    fill_span::<E, MaskFullOp<IntMaskOp>>(fill, eval, run, x, y, 255);
                } else {
                    fill_span::<E, MaskScaledOp<IntMaskOp>>(fill, eval, run, x, y, s.coverage);
                }
                x += i32::from(s.len);
                next += 1;
            } else {
                row[x as usize] = 0;
                x += 1;
            }
        }
    }
}
