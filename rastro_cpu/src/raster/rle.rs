// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colour fills over RLE coverage span lists.

use super::{
    composite_mask_result, composite_mode, compositing, matting, span, AddMaskOp, DifMaskOp,
    MaskOp, SubMaskOp,
};
use crate::surface::{Compositor, Surface, SurfaceBuf};
use rastro_common::blend::{alpha, alpha_blend, interpolate, interpolate8, mul_255};
use rastro_common::rle::Span;
use rastro_common::{CompositeMode, RleSpans};

/// Clip a span against a `w × h` surface.
///
/// Returns the usable `(x, y, len)` or [`None`] when nothing of the span is
/// visible. Negative coordinates are a geometry-stage bug and only
/// debug-checked.
#[inline]
pub(crate) fn clip_span(s: &Span, w: u32, h: u32) -> Option<(usize, usize, usize)> {
    debug_assert!(s.x >= 0 && s.y >= 0, "span coordinates must be non-negative");
    let x = i32::from(s.x);
    let y = i32::from(s.y);
    if y < 0 || y >= h as i32 || x >= w as i32 || x < 0 {
        return None;
    }
    let len = i32::from(s.len).min(w as i32 - x);
    if len <= 0 {
        return None;
    }
    Some((x as usize, y as usize, len as usize))
}

/// Fill a span list with a premultiplied colour.
pub(crate) fn raster_rle(
    surface: &mut Surface<'_>,
    rle: &RleSpans,
    r: u8,
    g: u8,
    b: u8,
    a: u8,
) -> bool {
    if rle.is_empty() {
        return false;
    }

    if compositing(surface) {
        if matting(surface) {
            matted_rle(surface, rle, r, g, b, a)
        } else {
            masked_rle(surface, rle, r, g, b, a)
        }
    } else if a == 255 {
        solid_rle(surface, rle, r, g, b)
    } else {
        translucent_rle(surface, rle, r, g, b, a)
    }
}

fn solid_rle(surface: &mut Surface<'_>, rle: &RleSpans, r: u8, g: u8, b: u8) -> bool {
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let join = surface.blender.join;

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = join(r, g, b, 255);
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                if s.coverage == 255 {
                    span::fill_row32(&mut buf[y * stride..], color, x, len);
                } else {
                    let src = alpha_blend(color, s.coverage);
                    let ia = 255 - s.coverage;
                    for d in &mut buf[y * stride + x..][..len] {
                        *d = src + alpha_blend(*d, ia);
                    }
                }
            }
        }
        SurfaceBuf::Gray8(buf) => {
            // The coverage is written as-is; callers bake shape alpha into
            // the coverage when targeting a grayscale sink.
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                span::fill_row8(&mut buf[y * stride..], s.coverage, x, len);
            }
        }
    }
    true
}

fn translucent_rle(surface: &mut Surface<'_>, rle: &RleSpans, r: u8, g: u8, b: u8, a: u8) -> bool {
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let join = surface.blender.join;

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = join(r, g, b, a);
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                let src = if s.coverage == 255 {
                    color
                } else {
                    alpha_blend(color, s.coverage)
                };
                span::blend_row32(&mut buf[y * stride + x..][..len], src);
            }
        }
        SurfaceBuf::Gray8(buf) => {
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                let src = if s.coverage == 255 {
                    a
                } else {
                    mul_255(a, s.coverage)
                };
                let ia = 255 - src;
                for d in &mut buf[y * stride + x..][..len] {
                    *d = src + mul_255(*d, ia);
                }
            }
        }
    }
    true
}

fn matted_rle(surface: &mut Surface<'_>, rle: &RleSpans, r: u8, g: u8, b: u8, a: u8) -> bool {
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(target: "sw_engine", "matted({:?}) rle", cmp.mode);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = (blender.join)(r, g, b, a);
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                let src = if s.coverage == 255 {
                    color
                } else {
                    alpha_blend(color, s.coverage)
                };
                let drow = &mut buf[y * stride + x..][..len];
                let crow = &cbuf[y * cstride + x..][..len];
                for (d, &c) in drow.iter_mut().zip(crow) {
                    *d = interpolate(src, *d, matte(c));
                }
            }
        }
        SurfaceBuf::Gray8(buf) => {
            for s in rle.spans() {
                let Some((x, y, len)) = clip_span(s, w, h) else {
                    continue;
                };
                let src = if s.coverage == 255 {
                    a
                } else {
                    mul_255(a, s.coverage)
                };
                let drow = &mut buf[y * stride + x..][..len];
                let crow = &cbuf[y * cstride + x..][..len];
                for (d, &c) in drow.iter_mut().zip(crow) {
                    *d = interpolate8(src, *d, matte(c));
                }
            }
        }
    }
    true
}

fn masked_rle(surface: &mut Surface<'_>, rle: &RleSpans, r: u8, g: u8, b: u8, a: u8) -> bool {
    // 32-bit channel composition only.
    if surface.channel_size() != 4 {
        return false;
    }
    let color = (surface.blender.join)(r, g, b, a);
    let mode = composite_mode(surface);
    log::debug!(target: "sw_engine", "masked({mode:?}) rle");
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => masked_rle_loop::<AddMaskOp>(cmp, rle, color),
        CompositeMode::SubtractMask => masked_rle_loop::<SubMaskOp>(cmp, rle, color),
        CompositeMode::DifferenceMask => masked_rle_loop::<DifMaskOp>(cmp, rle, color),
        CompositeMode::IntersectMask => masked_rle_int(cmp, rle, color),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn masked_rle_loop<O: MaskOp>(cmp: &mut Compositor, rle: &RleSpans, color: u32) {
    let (w, h) = (cmp.image.width(), cmp.image.height());
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        let src = if s.coverage == 255 {
            color
        } else {
            alpha_blend(color, s.coverage)
        };
        for c in &mut cbuf[y * cstride + x..][..len] {
            *c = O::compose(*c, src);
        }
    }
}

// The only mode whose loop visits pixels the spans do not touch: walk the
// compositor bbox with a span cursor, zeroing everything between spans.
fn masked_rle_int(cmp: &mut Compositor, rle: &RleSpans, color: u32) {
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
                let src = if s.coverage == 255 {
                    color
                } else {
                    alpha_blend(color, s.coverage)
                };
                let va = alpha(src);
                for c in &mut row[x as usize..][..s.len as usize] {
                    *c = alpha_blend(*c, va);
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

#[cfg(test)]
mod tests {
    use super::*;
    use rastro_common::{Bbox, ColorSpace};

    #[test]
    fn clip_span_truncates_to_surface() {
        let s = Span {
            x: 6,
            y: 2,
            len: 10,
            coverage: 255,
        };
        assert_eq!(clip_span(&s, 8, 8), Some((6, 2, 2)));
        let off = Span {
            x: 9,
            y: 2,
            len: 4,
            coverage: 255,
        };
        assert_eq!(clip_span(&off, 8, 8), None);
    }

    #[test]
    fn solid_rle_half_coverage_blends() {
        let mut buf = [0xffff_ffff_u32; 8];
        let mut s = Surface::new_rgba(&mut buf, 8, 8, 1, ColorSpace::Abgr8888).unwrap();
        let rle = RleSpans::from_spans(alloc::vec![Span {
            x: 0,
            y: 0,
            len: 4,
            coverage: 128,
        }]);
        assert!(raster_rle(&mut s, &rle, 0, 0, 255, 255));
        drop(s);
        let color = 0xffff_0000_u32; // opaque blue, ABGR
        let expected = alpha_blend(color, 128) + alpha_blend(0xffff_ffff, 127);
        assert_eq!(&buf[..4], &[expected; 4]);
        assert_eq!(buf[4], 0xffff_ffff);
    }

    #[test]
    fn grayscale_solid_rle_writes_coverage_as_is() {
        let mut buf = [0_u8; 8];
        let mut s = Surface::new_gray(&mut buf, 8, 8, 1, ColorSpace::Abgr8888).unwrap();
        let rle = RleSpans::from_rect(&Bbox::new(0, 0, 4, 1), 200);
        assert!(raster_rle(&mut s, &rle, 255, 255, 255, 255));
        drop(s);
        assert_eq!(&buf[..4], &[200; 4]);
    }
}
