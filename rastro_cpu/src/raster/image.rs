// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image blits: direct, scaled and transformed, over a rect region or the
//! image's own RLE clip, each in plain, matte and mask flavours.

use super::rle::clip_span;
use super::{
    composite_mask_result, composite_mode, compositing, matting, texmap, AddMaskOp, DifMaskOp,
    IntMaskOp, MaskOp, SubMaskOp,
};
use crate::surface::{Compositor, Surface, SurfaceBuf};
use rastro_common::blend::{alpha_blend, interpolate, inv_alpha, mul_255};
use rastro_common::{Bbox, BlitPath, CompositeMode, Image, Matrix, Mesh};

/// Inverse scales below this go through the box down-sampler.
pub(crate) const DOWN_SCALE_TOLERANCE: f32 = 0.5;

/// The half-extent of the down-sampling box: a `2n × 2n` kernel.
pub(crate) fn half_scale(scale: f32) -> u32 {
    #[expect(clippy::cast_sign_loss, reason = "image scales are positive")]
    let half = (0.5 / scale) as u32;
    half.max(1)
}

/// Bilinear up-sampling at a fractional source position.
///
/// Neighbours are clamped to the image edge; callers clip `sx`/`sy` to the
/// valid range beforehand.
pub(crate) fn up_scale(image: &Image<'_>, sx: f32, sy: f32) -> u32 {
    #[expect(clippy::cast_sign_loss, reason = "caller clips to non-negative")]
    let (rx, ry) = (sx as u32, sy as u32);
    let rx2 = (rx + 1).min(image.w - 1);
    let ry2 = (ry + 1).min(image.h - 1);

    #[expect(clippy::cast_sign_loss, reason = "fraction is in [0, 1)")]
    let dx = ((sx - rx as f32) * 255.0) as u8;
    #[expect(clippy::cast_sign_loss, reason = "fraction is in [0, 1)")]
    let dy = ((sy - ry as f32) * 255.0) as u8;

    let at = |x: u32, y: u32| image.buf[y as usize * image.stride + x as usize];
    let c1 = at(rx, ry);
    let c2 = at(rx2, ry);
    let c3 = at(rx2, ry2);
    let c4 = at(rx, ry2);

    interpolate(interpolate(c3, c4, dx), interpolate(c2, c1, dx), dy)
}

/// Box down-sampling: the mean of the `2n × 2n` kernel centred at
/// `(rx, ry)`, with out-of-bounds samples skipped rather than clamped.
pub(crate) fn down_scale(image: &Image<'_>, rx: u32, ry: u32, n: u32) -> u32 {
    let mut c = [0_u32; 4];
    let n2 = n * n;
    let (x0, x1) = (i64::from(rx) - i64::from(n), i64::from(rx) + i64::from(n));
    let (y0, y1) = (i64::from(ry) - i64::from(n), i64::from(ry) + i64::from(n));

    for y in y0..y1 {
        if y < 0 || y >= i64::from(image.h) {
            continue;
        }
        let row = &image.buf[y as usize * image.stride..];
        for x in x0..x1 {
            if x < 0 || x >= i64::from(image.w) {
                continue;
            }
            let p = row[x as usize];
            c[0] += p >> 24;
            c[1] += (p >> 16) & 0xff;
            c[2] += (p >> 8) & 0xff;
            c[3] += p & 0xff;
        }
    }
    for ch in &mut c {
        // Each axis contributes 2n samples, so the kernel holds 4n² of them.
        *ch = (*ch >> 2) / n2;
    }
    (c[0] << 24) | (c[1] << 16) | (c[2] << 8) | c[3]
}

/// One resampling strategy, resolved per call.
pub(crate) trait Resample {
    fn sample(image: &Image<'_>, sx: f32, sy: f32, n: u32) -> u32;
}

pub(crate) struct UpSampler;

impl Resample for UpSampler {
    #[inline(always)]
    fn sample(image: &Image<'_>, sx: f32, sy: f32, _n: u32) -> u32 {
        up_scale(image, sx, sy)
    }
}

pub(crate) struct DownSampler;

impl Resample for DownSampler {
    #[inline(always)]
    fn sample(image: &Image<'_>, sx: f32, sy: f32, n: u32) -> u32 {
        #[expect(clippy::cast_sign_loss, reason = "caller clips to non-negative")]
        down_scale(image, sx as u32, sy as u32, n)
    }
}

/// Whether the sample position is inside the image.
#[inline(always)]
fn in_source(image: &Image<'_>, sx: f32, sy: f32) -> bool {
    #[expect(clippy::cast_precision_loss, reason = "image dimensions fit f32")]
    {
        sx >= 0.0 && sx < image.w as f32 && sy >= 0.0 && sy < image.h as f32
    }
}

/// Whole-image dispatch over the blit path.
pub(crate) fn whole_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    match image.path {
        BlitPath::Direct => direct_image(surface, image, region, opacity),
        BlitPath::Scaled => scaled_image(surface, image, transform, region, opacity),
        BlitPath::Transformed => transformed_image(surface, image, transform, region, opacity),
    }
}

/// RLE-clipped image dispatch over the blit path.
pub(crate) fn rle_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    match image.path {
        BlitPath::Direct => direct_rle_image(surface, image, opacity),
        BlitPath::Scaled => scaled_rle_image(surface, image, transform, opacity),
        BlitPath::Transformed => {
            // The texmap is driven by the quad; the span clip played its part
            // at geometry time.
            let _ = region;
            let ret = texmap::raster_texmap_polygon(surface, image, transform, None, opacity);
            if compositing(surface) && !matting(surface) {
                return composite_mask_result(surface);
            }
            ret
        }
    }
}

/// Mesh dispatch: always the texmap.
pub(crate) fn mesh_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    mesh: &Mesh,
    transform: Option<&Matrix>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    let ret = texmap::raster_texmap_mesh(surface, image, mesh, transform, Some(region), opacity);
    if compositing(surface) && !matting(surface) {
        return composite_mask_result(surface);
    }
    ret
}

fn transformed_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    let ret = texmap::raster_texmap_polygon(surface, image, transform, Some(region), opacity);
    if compositing(surface) && !matting(surface) {
        return composite_mask_result(surface);
    }
    ret
}

/// Clip a destination region so every direct source index stays in bounds.
fn clamp_to_source(region: &Bbox, image: &Image<'_>) -> Bbox {
    region.intersect(&Bbox::new(
        -image.ox,
        -image.oy,
        image.w as i32 - image.ox,
        image.h as i32 - image.oy,
    ))
}

/// Direct blit of a whole image, in the flavour the compositor state picks.
///
/// Also the final composition step of every mask draw and of
/// [`Surface::end_composite`](crate::Surface::end_composite).
pub(crate) fn direct_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    if compositing(surface) {
        if matting(surface) {
            direct_matted(surface, image, region, opacity)
        } else {
            direct_masked(surface, image, region, opacity)
        }
    } else {
        direct_plain(surface, image, region, opacity)
    }
}

fn direct_plain(surface: &mut Surface<'_>, image: &Image<'_>, region: &Bbox, opacity: u8) -> bool {
    let region = clamp_to_source(region, image);
    let stride = surface.stride;
    let w = region.width() as usize;
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for y in region.y0..region.y1 {
        let drow = &mut buf[y as usize * stride + region.x0 as usize..][..w];
        let si = (y + image.oy) as usize * image.stride + (region.x0 + image.ox) as usize;
        let srow = &image.buf[si..][..w];
        if opacity == 255 {
            for (d, &s) in drow.iter_mut().zip(srow) {
                *d = s + alpha_blend(*d, inv_alpha(s));
            }
        } else {
            for (d, &s) in drow.iter_mut().zip(srow) {
                let t = alpha_blend(s, opacity);
                *d = t + alpha_blend(*d, inv_alpha(t));
            }
        }
    }
    true
}

fn direct_matted(surface: &mut Surface<'_>, image: &Image<'_>, region: &Bbox, opacity: u8) -> bool {
    let region = clamp_to_source(region, image);
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
        "direct matted({:?}) image [region: {} {} {w} {}]",
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
        let si = (y + image.oy) as usize * image.stride + (region.x0 + image.ox) as usize;
        let srow = &image.buf[si..][..w];
        for ((d, &c), &s) in drow.iter_mut().zip(crow).zip(srow) {
            let a = if opacity == 255 {
                matte(c)
            } else {
                mul_255(opacity, matte(c))
            };
            let t = alpha_blend(s, a);
            *d = t + alpha_blend(*d, inv_alpha(t));
        }
    }
    true
}

fn direct_masked(surface: &mut Surface<'_>, image: &Image<'_>, region: &Bbox, opacity: u8) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let region = clamp_to_source(region, image);
    let mode = composite_mode(surface);
    log::debug!(
        target: "sw_engine",
        "direct masked({mode:?}) image [region: {} {} {} {}]",
        region.x0, region.y0, region.width(), region.height()
    );
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => direct_mask_loop::<AddMaskOp>(cmp, image, &region, opacity),
        CompositeMode::SubtractMask => direct_mask_loop::<SubMaskOp>(cmp, image, &region, opacity),
        CompositeMode::DifferenceMask => direct_mask_loop::<DifMaskOp>(cmp, image, &region, opacity),
        CompositeMode::IntersectMask => direct_mask_int(cmp, image, &region, opacity),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn direct_mask_loop<O: MaskOp>(cmp: &mut Compositor, image: &Image<'_>, region: &Bbox, opacity: u8) {
    let cstride = cmp.image.stride();
    let w = region.width() as usize;
    let cbuf = cmp.image.data_mut();

    for y in region.y0..region.y1 {
        let crow = &mut cbuf[y as usize * cstride + region.x0 as usize..][..w];
        let si = (y + image.oy) as usize * image.stride + (region.x0 + image.ox) as usize;
        let srow = &image.buf[si..][..w];
        if opacity == 255 {
            for (c, &s) in crow.iter_mut().zip(srow) {
                *c = O::compose(*c, s);
            }
        } else {
            for (c, &s) in crow.iter_mut().zip(srow) {
                *c = O::compose_scaled(*c, s, opacity);
            }
        }
    }
}

fn direct_mask_int(cmp: &mut Compositor, image: &Image<'_>, region: &Bbox, opacity: u8) {
    let bbox = cmp.bbox;
    let region = region.intersect(&bbox);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for y in bbox.y0..bbox.y1 {
        let row = &mut cbuf[y as usize * cstride..];
        if !region.is_empty() && y >= region.y0 && y < region.y1 {
            let base = (y + image.oy) as usize * image.stride;
            for x in bbox.x0..bbox.x1 {
                let c = &mut row[x as usize];
                if x >= region.x0 && x < region.x1 {
                    let s = image.buf[base + (x + image.ox) as usize];
                    *c = if opacity == 255 {
                        IntMaskOp::compose(*c, s)
                    } else {
                        IntMaskOp::compose_scaled(*c, s, opacity)
                    };
                } else {
                    *c = 0;
                }
            }
        } else {
            row[bbox.x0 as usize..bbox.x1 as usize].fill(0);
        }
    }
}

fn direct_rle_image(surface: &mut Surface<'_>, image: &Image<'_>, opacity: u8) -> bool {
    if compositing(surface) {
        if matting(surface) {
            direct_rle_matted(surface, image, opacity)
        } else {
            direct_rle_masked(surface, image, opacity)
        }
    } else {
        direct_rle_plain(surface, image, opacity)
    }
}

/// Clip a span to both the surface and the image's shifted extent.
#[inline]
fn clip_span_to_source(
    s: &rastro_common::Span,
    image: &Image<'_>,
    w: u32,
    h: u32,
) -> Option<(usize, usize, usize)> {
    let (x, y, len) = clip_span(s, w, h)?;
    let sy = y as i32 + image.oy;
    if sy < 0 || sy >= image.h as i32 {
        return None;
    }
    let sx = x as i32 + image.ox;
    if sx < 0 || sx >= image.w as i32 {
        return None;
    }
    let len = len.min((image.w as i32 - sx) as usize);
    Some((x, y, len))
}

fn direct_rle_plain(surface: &mut Surface<'_>, image: &Image<'_>, opacity: u8) -> bool {
    let Some(rle) = image.rle else {
        return false;
    };
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span_to_source(s, image, w, h) else {
            continue;
        };
        let drow = &mut buf[y * stride + x..][..len];
        let si = (y as i32 + image.oy) as usize * image.stride + (x as i32 + image.ox) as usize;
        let srow = &image.buf[si..][..len];
        let a = mul_255(s.coverage, opacity);
        if a == 255 {
            for (d, &s) in drow.iter_mut().zip(srow) {
                *d = s + alpha_blend(*d, inv_alpha(s));
            }
        } else {
            for (d, &s) in drow.iter_mut().zip(srow) {
                let t = alpha_blend(s, a);
                *d = t + alpha_blend(*d, inv_alpha(t));
            }
        }
    }
    true
}

fn direct_rle_matted(surface: &mut Surface<'_>, image: &Image<'_>, opacity: u8) -> bool {
    let Some(rle) = image.rle else {
        return false;
    };
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(target: "sw_engine", "direct matted({:?}) rle image", cmp.mode);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span_to_source(s, image, w, h) else {
            continue;
        };
        let drow = &mut buf[y * stride + x..][..len];
        let crow = &cbuf[y * cstride + x..][..len];
        let si = (y as i32 + image.oy) as usize * image.stride + (x as i32 + image.ox) as usize;
        let srow = &image.buf[si..][..len];
        let a = mul_255(s.coverage, opacity);
        for ((d, &c), &sp) in drow.iter_mut().zip(crow).zip(srow) {
            let m = if a == 255 {
                matte(c)
            } else {
                mul_255(a, matte(c))
            };
            let t = alpha_blend(sp, m);
            *d = t + alpha_blend(*d, inv_alpha(t));
        }
    }
    true
}

fn direct_rle_masked(surface: &mut Surface<'_>, image: &Image<'_>, opacity: u8) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let Some(rle) = image.rle else {
        return false;
    };
    let mode = composite_mode(surface);
    log::debug!(target: "sw_engine", "direct masked({mode:?}) rle image");
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => direct_rle_mask_loop::<AddMaskOp>(cmp, image, rle, opacity),
        CompositeMode::SubtractMask => direct_rle_mask_loop::<SubMaskOp>(cmp, image, rle, opacity),
        CompositeMode::DifferenceMask => direct_rle_mask_loop::<DifMaskOp>(cmp, image, rle, opacity),
        CompositeMode::IntersectMask => direct_rle_mask_int(cmp, image, rle, opacity),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn direct_rle_mask_loop<O: MaskOp>(
    cmp: &mut Compositor,
    image: &Image<'_>,
    rle: &rastro_common::RleSpans,
    opacity: u8,
) {
    let (w, h) = (cmp.image.width(), cmp.image.height());
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for s in rle.spans() {
        let Some((x, y, len)) = clip_span_to_source(s, image, w, h) else {
            continue;
        };
        let crow = &mut cbuf[y * cstride + x..][..len];
        let si = (y as i32 + image.oy) as usize * image.stride + (x as i32 + image.ox) as usize;
        let srow = &image.buf[si..][..len];
        let a = mul_255(s.coverage, opacity);
        if a == 255 {
            for (c, &sp) in crow.iter_mut().zip(srow) {
                *c = O::compose(*c, sp);
            }
        } else {
            for (c, &sp) in crow.iter_mut().zip(srow) {
                *c = O::compose_scaled(*c, sp, a);
            }
        }
    }
}

fn direct_rle_mask_int(
    cmp: &mut Compositor,
    image: &Image<'_>,
    rle: &rastro_common::RleSpans,
    opacity: u8,
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
                let in_image = (y + image.oy) >= 0
                    && (y + image.oy) < image.h as i32
                    && (x + image.ox) >= 0
                    && x + i32::from(s.len) + image.ox <= image.w as i32;
                if in_image {
                    let a = mul_255(s.coverage, opacity);
                    let si = (y + image.oy) as usize * image.stride + (x + image.ox) as usize;
                    for (i, c) in row[x as usize..][..s.len as usize].iter_mut().enumerate() {
                        let sp = image.buf[si + i];
                        *c = if a == 255 {
                            IntMaskOp::compose(*c, sp)
                        } else {
                            IntMaskOp::compose_scaled(*c, sp, a)
                        };
                    }
                } else {
                    row[x as usize..][..s.len as usize].fill(0);
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

fn scaled_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    region: &Bbox,
    opacity: u8,
) -> bool {
    let it = match transform {
        Some(m) => match m.inverse() {
            Some(it) => it,
            None => {
                log::error!(target: "sw_engine", "degenerate transform");
                return false;
            }
        },
        None => Matrix::identity(),
    };
    let n = half_scale(image.scale);
    let down = image.scale < DOWN_SCALE_TOLERANCE;

    if compositing(surface) {
        if matting(surface) {
            if down {
                scaled_matted::<DownSampler>(surface, image, &it, region, opacity, n)
            } else {
                scaled_matted::<UpSampler>(surface, image, &it, region, opacity, n)
            }
        } else if down {
            scaled_masked::<DownSampler>(surface, image, &it, region, opacity, n)
        } else {
            scaled_masked::<UpSampler>(surface, image, &it, region, opacity, n)
        }
    } else if down {
        scaled_plain::<DownSampler>(surface, image, &it, region, opacity, n)
    } else {
        scaled_plain::<UpSampler>(surface, image, &it, region, opacity, n)
    }
}

fn scaled_plain<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    region: &Bbox,
    opacity: u8,
    n: u32,
) -> bool {
    let stride = surface.stride;
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for y in region.y0..region.y1 {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let drow = &mut buf[y as usize * stride..];
        for x in region.x0..region.x1 {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let src = if opacity == 255 {
                src
            } else {
                alpha_blend(src, opacity)
            };
            let d = &mut drow[x as usize];
            *d = src + alpha_blend(*d, inv_alpha(src));
        }
    }
    true
}

fn scaled_matted<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    region: &Bbox,
    opacity: u8,
    n: u32,
) -> bool {
    let stride = surface.stride;
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(
        target: "sw_engine",
        "scaled matted({:?}) image [region: {} {} {} {}]",
        cmp.mode, region.x0, region.y0, region.width(), region.height()
    );
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for y in region.y0..region.y1 {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let drow = &mut buf[y as usize * stride..];
        let crow = &cbuf[y as usize * cstride..];
        for x in region.x0..region.x1 {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let m = if opacity == 255 {
                matte(crow[x as usize])
            } else {
                mul_255(opacity, matte(crow[x as usize]))
            };
            let t = alpha_blend(src, m);
            let d = &mut drow[x as usize];
            *d = t + alpha_blend(*d, inv_alpha(t));
        }
    }
    true
}

fn scaled_masked<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    region: &Bbox,
    opacity: u8,
    n: u32,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let mode = composite_mode(surface);
    log::debug!(
        target: "sw_engine",
        "scaled masked({mode:?}) image [region: {} {} {} {}]",
        region.x0, region.y0, region.width(), region.height()
    );
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => scaled_mask_loop::<R, AddMaskOp>(cmp, image, it, region, opacity, n),
        CompositeMode::SubtractMask => {
            scaled_mask_loop::<R, SubMaskOp>(cmp, image, it, region, opacity, n);
        }
        CompositeMode::DifferenceMask => {
            scaled_mask_loop::<R, DifMaskOp>(cmp, image, it, region, opacity, n);
        }
        CompositeMode::IntersectMask => scaled_mask_int::<R>(cmp, image, it, region, opacity, n),
        _ => return false,
    }

    composite_mask_result(surface)
}

fn scaled_mask_loop<R: Resample, O: MaskOp>(
    cmp: &mut Compositor,
    image: &Image<'_>,
    it: &Matrix,
    region: &Bbox,
    opacity: u8,
    n: u32,
) {
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for y in region.y0..region.y1 {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let crow = &mut cbuf[y as usize * cstride..];
        for x in region.x0..region.x1 {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let c = &mut crow[x as usize];
            *c = if opacity == 255 {
                O::compose(*c, src)
            } else {
                O::compose_scaled(*c, src, opacity)
            };
        }
    }
}

fn scaled_mask_int<R: Resample>(
    cmp: &mut Compositor,
    image: &Image<'_>,
    it: &Matrix,
    region: &Bbox,
    opacity: u8,
    n: u32,
) {
    let bbox = cmp.bbox;
    let region = region.intersect(&bbox);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for y in bbox.y0..bbox.y1 {
        let row = &mut cbuf[y as usize * cstride..];
        let inside_rows = !region.is_empty() && y >= region.y0 && y < region.y1;
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        for x in bbox.x0..bbox.x1 {
            let c = &mut row[x as usize];
            if inside_rows && x >= region.x0 && x < region.x1 {
                #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
                let sx = x as f32 * it.e11 + it.e13;
                if !in_source(image, sx, sy) {
                    continue;
                }
                let src = R::sample(image, sx, sy, n);
                *c = if opacity == 255 {
                    IntMaskOp::compose(*c, src)
                } else {
                    IntMaskOp::compose_scaled(*c, src, opacity)
                };
            } else {
                *c = 0;
            }
        }
    }
}

fn scaled_rle_image(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    opacity: u8,
) -> bool {
    let it = match transform {
        Some(m) => match m.inverse() {
            Some(it) => it,
            None => {
                log::error!(target: "sw_engine", "degenerate transform");
                return false;
            }
        },
        None => Matrix::identity(),
    };
    let n = half_scale(image.scale);
    let down = image.scale < DOWN_SCALE_TOLERANCE;

    if compositing(surface) {
        if matting(surface) {
            if down {
                scaled_rle_matted::<DownSampler>(surface, image, &it, opacity, n)
            } else {
                scaled_rle_matted::<UpSampler>(surface, image, &it, opacity, n)
            }
        } else if down {
            scaled_rle_masked::<DownSampler>(surface, image, &it, opacity, n)
        } else {
            scaled_rle_masked::<UpSampler>(surface, image, &it, opacity, n)
        }
    } else if down {
        scaled_rle_plain::<DownSampler>(surface, image, &it, opacity, n)
    } else {
        scaled_rle_plain::<UpSampler>(surface, image, &it, opacity, n)
    }
}

fn scaled_rle_plain<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    opacity: u8,
    n: u32,
) -> bool {
    let Some(rle) = image.rle else {
        return false;
    };
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for s in rle.spans() {
        let Some((x0, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let a = mul_255(s.coverage, opacity);
        let drow = &mut buf[y * stride..];
        for x in x0..x0 + len {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let src = if a == 255 { src } else { alpha_blend(src, a) };
            let d = &mut drow[x];
            *d = src + alpha_blend(*d, inv_alpha(src));
        }
    }
    true
}

fn scaled_rle_matted<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    opacity: u8,
    n: u32,
) -> bool {
    let Some(rle) = image.rle else {
        return false;
    };
    let stride = surface.stride;
    let (w, h) = (surface.w, surface.h);
    let blender = surface.blender;
    let Some(cmp) = surface.compositor.as_deref() else {
        return false;
    };
    let Some(matte) = blender.matte_alpha(cmp.mode) else {
        return false;
    };
    log::debug!(target: "sw_engine", "scaled matted({:?}) rle image", cmp.mode);
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data();
    let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
        return false;
    };

    for s in rle.spans() {
        let Some((x0, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let a = mul_255(s.coverage, opacity);
        let drow = &mut buf[y * stride..];
        let crow = &cbuf[y * cstride..];
        for x in x0..x0 + len {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let m = if a == 255 {
                matte(crow[x])
            } else {
                mul_255(matte(crow[x]), a)
            };
            let t = alpha_blend(src, m);
            let d = &mut drow[x];
            *d = t + alpha_blend(*d, inv_alpha(t));
        }
    }
    true
}

fn scaled_rle_masked<R: Resample>(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    it: &Matrix,
    opacity: u8,
    n: u32,
) -> bool {
    if surface.channel_size() != 4 {
        return false;
    }
    let Some(rle) = image.rle else {
        return false;
    };
    let mode = composite_mode(surface);
    log::debug!(target: "sw_engine", "scaled masked({mode:?}) rle image");
    let Some(cmp) = surface.compositor.as_deref_mut() else {
        return false;
    };

    match mode {
        CompositeMode::AddMask => scaled_rle_mask_loop::<R, AddMaskOp>(cmp, image, it, rle, opacity, n),
        CompositeMode::SubtractMask => {
            scaled_rle_mask_loop::<R, SubMaskOp>(cmp, image, it, rle, opacity, n);
        }
        CompositeMode::DifferenceMask => {
            scaled_rle_mask_loop::<R, DifMaskOp>(cmp, image, it, rle, opacity, n);
        }
        CompositeMode::IntersectMask => {
            scaled_rle_mask_int::<R>(cmp, image, it, rle, opacity, n);
        }
        _ => return false,
    }

    composite_mask_result(surface)
}

fn scaled_rle_mask_loop<R: Resample, O: MaskOp>(
    cmp: &mut Compositor,
    image: &Image<'_>,
    it: &Matrix,
    rle: &rastro_common::RleSpans,
    opacity: u8,
    n: u32,
) {
    let (w, h) = (cmp.image.width(), cmp.image.height());
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();

    for s in rle.spans() {
        let Some((x0, y, len)) = clip_span(s, w, h) else {
            continue;
        };
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let a = mul_255(s.coverage, opacity);
        let crow = &mut cbuf[y * cstride..];
        for x in x0..x0 + len {
            #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
            let sx = x as f32 * it.e11 + it.e13;
            if !in_source(image, sx, sy) {
                continue;
            }
            let src = R::sample(image, sx, sy, n);
            let c = &mut crow[x];
            *c = if a == 255 {
                O::compose(*c, src)
            } else {
                O::compose_scaled(*c, src, a)
            };
        }
    }
}

fn scaled_rle_mask_int<R: Resample>(
    cmp: &mut Compositor,
    image: &Image<'_>,
    it: &Matrix,
    rle: &rastro_common::RleSpans,
    opacity: u8,
    n: u32,
) {
    let bbox = cmp.bbox;
    let cstride = cmp.image.stride();
    let cbuf = cmp.image.data_mut();
    let spans = rle.spans();
    let mut next = 0_usize;

    for y in bbox.y0..bbox.y1 {
        let row = &mut cbuf[y as usize * cstride..];
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let sy = y as f32 * it.e22 + it.e23;
        let mut x = bbox.x0;
        while x < bbox.x1 {
            let hit = next < spans.len()
                && i32::from(spans[next].y) == y
                && i32::from(spans[next].x) == x
                && x + i32::from(spans[next].len) <= bbox.x1;
            if hit {
                let s = &spans[next];
                let a = mul_255(s.coverage, opacity);
                for xi in x..x + i32::from(s.len) {
                    #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
                    let sx = xi as f32 * it.e11 + it.e13;
                    if !in_source(image, sx, sy) {
                        continue;
                    }
                    let src = R::sample(image, sx, sy, n);
                    let c = &mut row[xi as usize];
                    *c = if a == 255 {
                        IntMaskOp::compose(*c, src)
                    } else {
                        IntMaskOp::compose_scaled(*c, src, a)
                    };
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
