// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Perspective-correct textured-polygon fill, used for general transforms.
//!
//! The only subsystem that sees the forward matrix: the image corners (or a
//! supplied mesh) are projected to screen space, scan-converted triangle by
//! triangle stepping `(u/w, v/w, 1/w)` linearly, and `(u, v)` is recovered
//! by division at each pixel before bilinear sampling.

use super::image::up_scale;
use super::{composite_mode, compositing, matting, AddMaskOp, DifMaskOp, IntMaskOp, MaskOp, SubMaskOp};
use crate::surface::{Surface, SurfaceBuf};
use alloc::vec;
use alloc::vec::Vec;
use rastro_common::blend::{alpha_blend, inv_alpha, mul_255};
use rastro_common::color::MatteFn;
use rastro_common::math::{ceilf, FloatExt};
use rastro_common::{Bbox, CompositeMode, Image, Matrix, Mesh};

/// One projected vertex: screen position plus perspective-ready attributes.
#[derive(Copy, Clone, Debug, Default)]
struct ScreenVert {
    x: f32,
    y: f32,
    uw: f32,
    vw: f32,
    iw: f32,
}

#[derive(Copy, Clone)]
enum TexMode {
    Plain,
    Matte(MatteFn),
    Mask(CompositeMode),
}

/// Draw the whole image as a transformed quad.
pub(crate) fn raster_texmap_polygon(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    transform: Option<&Matrix>,
    region: Option<&Bbox>,
    opacity: u8,
) -> bool {
    let m = transform.copied().unwrap_or_default();
    #[expect(clippy::cast_precision_loss, reason = "image dimensions fit f32")]
    let (w, h) = (image.w as f32, image.h as f32);

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let mut verts = [ScreenVert::default(); 4];
    for (vert, &(cx, cy)) in verts.iter_mut().zip(&corners) {
        let Some(v) = project(&m, cx, cy, cx, cy) else {
            log::error!(target: "sw_engine", "degenerate transform");
            return false;
        };
        *vert = v;
    }

    let tris = [
        [verts[0], verts[1], verts[3]],
        [verts[1], verts[2], verts[3]],
    ];
    texmap_draw(surface, image, &tris, region, opacity)
}

/// Draw the image through a triangle mesh.
pub(crate) fn raster_texmap_mesh(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    mesh: &Mesh,
    transform: Option<&Matrix>,
    region: Option<&Bbox>,
    opacity: u8,
) -> bool {
    let m = transform.copied().unwrap_or_default();
    let mut tris = Vec::with_capacity(mesh.triangles.len());

    for tri in &mesh.triangles {
        let mut out = [ScreenVert::default(); 3];
        let mut ok = true;
        for (o, v) in out.iter_mut().zip(&tri.vertex) {
            match project(&m, v.x, v.y, v.u, v.v) {
                Some(p) => *o = p,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            tris.push(out);
        }
    }
    if tris.is_empty() {
        return false;
    }
    texmap_draw(surface, image, &tris, region, opacity)
}

fn project(m: &Matrix, x: f32, y: f32, u: f32, v: f32) -> Option<ScreenVert> {
    let (tx, ty, tw) = m.apply_homogeneous(x, y);
    if tw.is_nearly_zero() || tw < 0.0 {
        return None;
    }
    let iw = 1.0 / tw;
    Some(ScreenVert {
        x: tx * iw,
        y: ty * iw,
        uw: u * iw,
        vw: v * iw,
        iw,
    })
}

fn texmap_draw(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    tris: &[[ScreenVert; 3]],
    region: Option<&Bbox>,
    opacity: u8,
) -> bool {
    let surface_box = Bbox::new(0, 0, surface.w as i32, surface.h as i32);
    let mut clip = match region {
        Some(r) => r.intersect(&surface_box),
        None => surface_box,
    };

    let mode = if compositing(surface) {
        if matting(surface) {
            let Some(matte) = surface.blender.matte_alpha(composite_mode(surface)) else {
                return false;
            };
            TexMode::Matte(matte)
        } else {
            TexMode::Mask(composite_mode(surface))
        }
    } else {
        TexMode::Plain
    };

    // Mask writes target the compositor buffer and stay within its bbox.
    let mut extents: Option<Vec<(i32, i32)>> = None;
    let mut cbbox = clip;
    if let TexMode::Mask(m) = mode {
        let Some(cmp) = surface.compositor.as_deref() else {
            return false;
        };
        cbbox = cmp.bbox;
        clip = clip.intersect(&cbbox);
        if m == CompositeMode::IntersectMask {
            extents = Some(vec![(i32::MAX, i32::MIN); cbbox.height() as usize]);
        }
    }
    if clip.is_empty() {
        return false;
    }

    for tri in tris {
        raster_triangle(surface, image, tri, &clip, opacity, mode, &mut extents, &cbbox);
    }

    // Intersect zeroes every compositor pixel the polygon never covered.
    if let Some(extents) = extents {
        let Some(cmp) = surface.compositor.as_deref_mut() else {
            return false;
        };
        let cstride = cmp.image.stride();
        let cbuf = cmp.image.data_mut();
        for (i, &(x0, x1)) in extents.iter().enumerate() {
            let y = cbbox.y0 + i as i32;
            let row = &mut cbuf[y as usize * cstride..];
            if x0 > x1 {
                row[cbbox.x0 as usize..cbbox.x1 as usize].fill(0);
            } else {
                row[cbbox.x0 as usize..x0 as usize].fill(0);
                row[x1 as usize..cbbox.x1 as usize].fill(0);
            }
        }
    }
    true
}

fn edge_at(a: &ScreenVert, b: &ScreenVert, yc: f32) -> Option<ScreenVert> {
    let dy = b.y - a.y;
    if dy.is_nearly_zero() {
        return None;
    }
    let t = (yc - a.y) / dy;
    Some(ScreenVert {
        x: a.x + (b.x - a.x) * t,
        uw: a.uw + (b.uw - a.uw) * t,
        vw: a.vw + (b.vw - a.vw) * t,
        iw: a.iw + (b.iw - a.iw) * t,
        y: yc,
    })
}

#[derive(Copy, Clone)]
struct SpanAttr {
    uw: f32,
    vw: f32,
    iw: f32,
    duw: f32,
    dvw: f32,
    diw: f32,
}

impl SpanAttr {
    #[inline(always)]
    fn sample(&mut self, image: &Image<'_>) -> u32 {
        let w = 1.0 / self.iw;
        #[expect(clippy::cast_precision_loss, reason = "image dimensions fit f32")]
        let u = (self.uw * w).clamp(0.0, image.w as f32 - 1.0);
        #[expect(clippy::cast_precision_loss, reason = "image dimensions fit f32")]
        let v = (self.vw * w).clamp(0.0, image.h as f32 - 1.0);
        self.uw += self.duw;
        self.vw += self.dvw;
        self.iw += self.diw;
        up_scale(image, u, v)
    }
}

#[expect(clippy::too_many_arguments, reason = "scanline state is inherently wide")]
fn raster_triangle(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    tri: &[ScreenVert; 3],
    clip: &Bbox,
    opacity: u8,
    mode: TexMode,
    extents: &mut Option<Vec<(i32, i32)>>,
    cbbox: &Bbox,
) {
    // Zero-area triangles contribute nothing.
    let area = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
        - (tri[2].x - tri[0].x) * (tri[1].y - tri[0].y);
    if area.is_nearly_zero() {
        return;
    }

    let mut v = *tri;
    v.sort_unstable_by(|a, b| a.y.total_cmp(&b.y));

    #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
    let (clip_t, clip_b) = (clip.y0 as f32, clip.y1 as f32);
    if v[2].y <= clip_t || v[0].y >= clip_b {
        return;
    }

    let y_start = (ceilf(v[0].y - 0.5) as i32).max(clip.y0);
    let y_end = (ceilf(v[2].y - 0.5) as i32).min(clip.y1);

    for y in y_start..y_end {
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let yc = y as f32 + 0.5;
        let Some(a) = edge_at(&v[0], &v[2], yc) else {
            continue;
        };
        let b = if yc < v[1].y {
            edge_at(&v[0], &v[1], yc)
        } else {
            edge_at(&v[1], &v[2], yc)
        };
        let Some(b) = b else {
            continue;
        };
        let (l, r) = if a.x <= b.x { (a, b) } else { (b, a) };

        let x_start = (ceilf(l.x - 0.5) as i32).max(clip.x0);
        let x_end = (ceilf(r.x - 0.5) as i32).min(clip.x1);
        if x_end <= x_start {
            continue;
        }

        let dx = r.x - l.x;
        let inv = if dx.is_nearly_zero() { 0.0 } else { 1.0 / dx };
        #[expect(clippy::cast_precision_loss, reason = "pixel coordinates fit f32")]
        let off = x_start as f32 + 0.5 - l.x;
        let mut attr = SpanAttr {
            duw: (r.uw - l.uw) * inv,
            dvw: (r.vw - l.vw) * inv,
            diw: (r.iw - l.iw) * inv,
            uw: l.uw + (r.uw - l.uw) * inv * off,
            vw: l.vw + (r.vw - l.vw) * inv * off,
            iw: l.iw + (r.iw - l.iw) * inv * off,
        };

        let len = (x_end - x_start) as usize;
        if let Some(extents) = extents.as_deref_mut() {
            let ext = &mut extents[(y - cbbox.y0) as usize];
            ext.0 = ext.0.min(x_start);
            ext.1 = ext.1.max(x_end);
        }

        tex_span(surface, image, y, x_start, len, &mut attr, opacity, mode);
    }
}

#[expect(clippy::too_many_arguments, reason = "scanline state is inherently wide")]
fn tex_span(
    surface: &mut Surface<'_>,
    image: &Image<'_>,
    y: i32,
    x: i32,
    len: usize,
    attr: &mut SpanAttr,
    opacity: u8,
    mode: TexMode,
) {
    let stride = surface.stride;
    match mode {
        TexMode::Plain => {
            let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
                return;
            };
            let row = &mut buf[y as usize * stride + x as usize..][..len];
            for d in row {
                let s = attr.sample(image);
                let s = if opacity == 255 {
                    s
                } else {
                    alpha_blend(s, opacity)
                };
                *d = s + alpha_blend(*d, inv_alpha(s));
            }
        }
        TexMode::Matte(matte) => {
            let Some(cmp) = surface.compositor.as_deref() else {
                return;
            };
            let cstride = cmp.image.stride();
            let cbuf = cmp.image.data();
            let crow = &cbuf[y as usize * cstride + x as usize..][..len];
            let SurfaceBuf::Rgba32(buf) = &mut surface.buf else {
                return;
            };
            let row = &mut buf[y as usize * stride + x as usize..][..len];
            for (d, &c) in row.iter_mut().zip(crow) {
                let s = attr.sample(image);
                let m = if opacity == 255 {
                    matte(c)
                } else {
                    mul_255(opacity, matte(c))
                };
                let t = alpha_blend(s, m);
                *d = t + alpha_blend(*d, inv_alpha(t));
            }
        }
        TexMode::Mask(m) => {
            let Some(cmp) = surface.compositor.as_deref_mut() else {
                return;
            };
            let cstride = cmp.image.stride();
            let crow = &mut cmp.image.data_mut()[y as usize * cstride + x as usize..][..len];
            match m {
                CompositeMode::AddMask => tex_span_mask::<AddMaskOp>(crow, image, attr, opacity),
                CompositeMode::SubtractMask => {
                    tex_span_mask::<SubMaskOp>(crow, image, attr, opacity);
                }
                CompositeMode::IntersectMask => {
                    tex_span_mask::<IntMaskOp>(crow, image, attr, opacity);
                }
                CompositeMode::DifferenceMask => {
                    tex_span_mask::<DifMaskOp>(crow, image, attr, opacity);
                }
                _ => {}
            }
        }
    }
}

fn tex_span_mask<O: MaskOp>(crow: &mut [u32], image: &Image<'_>, attr: &mut SpanAttr, opacity: u8) {
    if opacity == 255 {
        for c in crow {
            let s = attr.sample(image);
            *c = O::compose(*c, s);
        }
    } else {
        for c in crow {
            let s = attr.sample(image);
            *c = O::compose_scaled(*c, s, opacity);
        }
    }
}
