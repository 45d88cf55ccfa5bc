// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned rectangle fills (the "fast track" for rect-shaped paths).

use super::{
    composite_mask_result, composite_mode, compositing, matting, span, AddMaskOp, DifMaskOp,
    MaskOp, SubMaskOp,
};
use crate::surface::{Compositor, Surface, SurfaceBuf};
use rastro_common::blend::{alpha_blend, interpolate, interpolate8, mul_255};
use rastro_common::{Bbox, CompositeMode};

/// Fill `region` (already clamped to the surface) with a premultiplied
/// colour.
pub(crate) fn raster_rect(
    surface: &mut Surface<'_>,
    region: &Bbox,
    r: u8,
    g: u8,
    b: u8,
    a: u8,
) -> bool {
    if compositing(surface) {
        if matting(surface) {
            matted_rect(surface, region, r, g, b, a)
        } else {
            masked_rect(surface, region, r, g, b, a)
        }
    } else if a == 255 {
        solid_rect(surface, region, r, g, b)
    } else {
        translucent_rect(surface, region, r, g, b, a)
    }
}

fn solid_rect(surface: &mut Surface<'_>, region: &Bbox, r: u8, g: u8, b: u8) -> bool {
    let stride = surface.stride;
    let w = region.width() as usize;
    let join = surface.blender.join;

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = join(r, g, b, 255);
            for y in region.y0..region.y1 {
                span::fill_row32(&mut buf[y as usize * stride..], color, region.x0 as usize, w);
            }
        }
        SurfaceBuf::Gray8(buf) => {
            for y in region.y0..region.y1 {
                span::fill_row8(&mut buf[y as usize * stride..], 255, region.x0 as usize, w);
            }
        }
    }
    true
}

fn translucent_rect(surface: &mut Surface<'_>, region: &Bbox, r: u8, g: u8, b: u8, a: u8) -> bool {
    let stride = surface.stride;
    let w = region.width() as usize;
    let join = surface.blender.join;

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = join(r, g, b, a);
            for y in region.y0..region.y1 {
                let row = &mut buf[y as usize * stride + region.x0 as usize..][..w];
                span::blend_row32(row, color);
            }
        }
        SurfaceBuf::Gray8(buf) => {
            let ia = 255 - a;
            for y in region.y0..region.y1 {
                let row = &mut buf[y as usize * stride + region.x0 as usize..][..w];
                for d in row {
                    *d = a + mul_255(*d, ia);
                }
            }
        }
    }
    true
}

fn matted_rect(surface: &mut Surface<'_>, region: &Bbox, r: u8, g: u8, b: u8, a: u8) -> bool {
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
        "matted({:?}) rect [region: {} {} {w} {}]",
        cmp.mode, region.x0, region.y0, region.height()
    );
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();

    match &mut surface.buf {
        SurfaceBuf::Rgba32(buf) => {
            let color = (blender.join)(r, g, b, a);
            for y in region.y0..region.y1 {
                let drow = &mut buf[y as usize * stride + region.x0 as usize..][..w];
                let crow = &cbuf[y as usize * cstride + region.x0 as usize..][..w];
                for (d, &c) in drow.iter_mut().zip(crow) {
                    *d = interpolate(color, *d, matte(c));
                }
            }
        }
        SurfaceBuf::Gray8(buf) => {
            for y in region.y0..region.y1 {
                let drow = &mut buf[y as usize * stride + region.x0 as usize..][..w];
                let crow = &cbuf[y as usize * cstride + region.x0 as usize..][..w];
                for (d, &c) in drow.iter_mut().zip(crow) {
                    *d = interpolate8(a, *d, matte(c));
                }
            }
        }
    }
    true
}

fn masked_rect(surface: &mut Surface<'_>, region: &Bbox, r: u8, g: u8, b: u8, a: u8) -> bool {
    // 32-bit channel composition only.
    if surface.channel_size() != 4 {
        return false;
    }
    let color = (surface.blender.join)(r, g, b, a);
    let mode = composite_mode(surface);
    log::debug!(
        target: "sw_engine",
        "masked({mode:?}) rect [region: {} {} {} {}]",
        region.x0, region.y0, region.width(), region.height()
    );
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => masked_rect_loop::<AddMaskOp>(cmp, region, color),
        CompositeMode::SubtractMask => masked_rect_loop::<SubMaskOp>(cmp, region, color),
        CompositeMode::DifferenceMask => masked_rect_loop::<DifMaskOp>(cmp, region, color),
        CompositeMode::IntersectMask => masked_rect_int(cmp, region, a),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn masked_rect_loop<O: MaskOp>(cmp: &mut Compositor, region: &Bbox, color: u32) {
    let stride = cmp.image.stride();
    let w = region.width() as usize;
    let buf = cmp.image.data_mut();
    for y in region.y0..region.y1 {
        let row = &mut buf[y as usize * stride + region.x0 as usize..][..w];
        for c in row {
            *c = O::compose(*c, color);
        }
    }
}

// Intersect visits the whole compositor bbox: pixels the source does not
// touch are zeroed, the source rows alternate zero fill with the in-source
// update as x crosses the region boundary.
fn masked_rect_int(cmp: &mut Compositor, region: &Bbox, a: u8) {
    let bbox = cmp.bbox;
    let stride = cmp.image.stride();
    let buf = cmp.image.data_mut();

    for y in bbox.y0..bbox.y1 {
        let row = &mut buf[y as usize * stride..];
        if y >= region.y0 && y < region.y1 {
            for x in bbox.x0..bbox.x1 {
                let c = &mut row[x as usize];
                if x >= region.x0 && x < region.x1 {
                    *c = alpha_blend(*c, a);
                } else {
                    *c = 0;
                }
            }
        } else {
            row[bbox.x0 as usize..bbox.x1 as usize].fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rastro_common::ColorSpace;

    #[test]
    fn solid_rect_writes_opaque_words() {
        let mut buf = [0_u32; 16];
        let mut s = Surface::new_rgba(&mut buf, 4, 4, 4, ColorSpace::Abgr8888).unwrap();
        assert!(raster_rect(&mut s, &Bbox::new(1, 1, 3, 3), 0, 255, 0, 255));
        drop(s);
        assert_eq!(buf[5], 0xff00_ff00);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn translucent_rect_blends() {
        let mut buf = [0xffff_ffff_u32; 16];
        let mut s = Surface::new_rgba(&mut buf, 4, 4, 4, ColorSpace::Abgr8888).unwrap();
        // Premultiplied half-opaque black.
        assert!(raster_rect(&mut s, &Bbox::new(0, 0, 4, 4), 0, 0, 0, 128));
        drop(s);
        let expected = 0x8000_0000 + alpha_blend(0xffff_ffff, 127);
        assert!(buf.iter().all(|&c| c == expected));
    }

    #[test]
    fn grayscale_solid_rect_writes_coverage() {
        let mut buf = [0_u8; 16];
        let mut s = Surface::new_gray(&mut buf, 4, 4, 4, ColorSpace::Abgr8888).unwrap();
        assert!(raster_rect(&mut s, &Bbox::new(0, 0, 2, 2), 9, 9, 9, 255));
        drop(s);
        assert_eq!(buf[0], 255);
        assert_eq!(buf[2], 0);
    }
}
