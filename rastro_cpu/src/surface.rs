// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The destination surface and its optional compositor buffer.

use crate::raster;
use alloc::boxed::Box;
use alloc::vec::Vec;
use rastro_common::blend::alpha_blend;
use rastro_common::{Bbox, Blender, ColorSpace, CompositeMode, Image};

/// Why a surface or compositor could not be constructed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    /// Width or height is zero.
    ZeroDimension,
    /// The stride is smaller than the width.
    StrideTooSmall,
    /// The pixel buffer does not cover `stride * height` elements.
    BufferTooShort,
    /// The compositor buffer could not be allocated.
    AllocationFailed,
}

/// The borrowed pixel storage of a surface.
///
/// Colour surfaces use one `u32` element per pixel, grayscale surfaces one
/// byte. Strides are in elements either way.
#[derive(Debug)]
pub enum SurfaceBuf<'a> {
    /// 32-bit pixels in the surface's colour space.
    Rgba32(&'a mut [u32]),
    /// 8-bit coverage/alpha pixels.
    Gray8(&'a mut [u8]),
}

impl SurfaceBuf<'_> {
    /// Element size in bytes: 4 for colour, 1 for grayscale.
    pub fn channel_size(&self) -> usize {
        match self {
            Self::Rgba32(_) => 4,
            Self::Gray8(_) => 1,
        }
    }
}

/// A surface-sized, owned 32-bit pixel buffer used for compositing.
#[derive(Clone, Debug)]
pub struct LayerBuf {
    buf: Vec<u32>,
    stride: usize,
    w: u32,
    h: u32,
}

impl LayerBuf {
    /// Allocate a zeroed buffer, failing cleanly instead of aborting.
    pub(crate) fn new(w: u32, h: u32) -> Result<Self, SurfaceError> {
        let len = (w as usize)
            .checked_mul(h as usize)
            .ok_or(SurfaceError::AllocationFailed)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| SurfaceError::AllocationFailed)?;
        buf.resize(len, 0);
        Ok(Self {
            buf,
            stride: w as usize,
            w,
            h,
        })
    }

    /// The pixels, row-major.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.buf
    }

    /// The pixels, row-major.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.buf
    }

    /// Row stride in elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.h
    }

    /// View the layer as an image source for the final blit.
    pub(crate) fn as_image(&self, cs: ColorSpace) -> Image<'_> {
        Image::new(&self.buf, self.stride, self.w, self.h, cs)
    }
}

/// The mask/matte buffer consulted by composited draws.
///
/// Matte modes read it as a per-pixel factor; mask modes write into it and
/// blit it onto the destination when the draw finishes. Always 32-bit.
#[derive(Debug)]
pub struct Compositor {
    /// The active compositing mode.
    pub mode: CompositeMode,
    /// The mask pixels.
    pub image: LayerBuf,
    /// The region mask loops may touch, in surface coordinates.
    pub bbox: Bbox,
}

/// A destination surface borrowed from the embedder for the frame.
#[derive(Debug)]
pub struct Surface<'a> {
    pub(crate) buf: SurfaceBuf<'a>,
    pub(crate) stride: usize,
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) cs: ColorSpace,
    pub(crate) premultiplied: bool,
    pub(crate) blender: Blender,
    pub(crate) compositor: Option<Box<Compositor>>,
}

impl<'a> Surface<'a> {
    /// Wrap a 32-bit pixel buffer.
    ///
    /// The premultiplied flag is seeded from the colour space tag: the `S`
    /// variants carry straight alpha.
    pub fn new_rgba(
        buf: &'a mut [u32],
        stride: usize,
        w: u32,
        h: u32,
        cs: ColorSpace,
    ) -> Result<Self, SurfaceError> {
        Self::validate(buf.len(), stride, w, h)?;
        Ok(Self {
            buf: SurfaceBuf::Rgba32(buf),
            stride,
            w,
            h,
            cs,
            premultiplied: !cs.is_straight(),
            blender: Blender::new(cs),
            compositor: None,
        })
    }

    /// Wrap an 8-bit grayscale buffer.
    ///
    /// The colour space describes the byte order of any compositor pixels
    /// matted against this surface.
    pub fn new_gray(
        buf: &'a mut [u8],
        stride: usize,
        w: u32,
        h: u32,
        cs: ColorSpace,
    ) -> Result<Self, SurfaceError> {
        Self::validate(buf.len(), stride, w, h)?;
        Ok(Self {
            buf: SurfaceBuf::Gray8(buf),
            stride,
            w,
            h,
            cs,
            premultiplied: true,
            blender: Blender::new(cs),
            compositor: None,
        })
    }

    fn validate(len: usize, stride: usize, w: u32, h: u32) -> Result<(), SurfaceError> {
        if w == 0 || h == 0 {
            return Err(SurfaceError::ZeroDimension);
        }
        if stride < w as usize {
            return Err(SurfaceError::StrideTooSmall);
        }
        if len < stride * h as usize {
            return Err(SurfaceError::BufferTooShort);
        }
        Ok(())
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Row stride in elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The surface's colour space.
    #[inline]
    pub fn color_space(&self) -> ColorSpace {
        self.cs
    }

    /// Whether the pixels are premultiplied.
    #[inline]
    pub fn premultiplied(&self) -> bool {
        self.premultiplied
    }

    /// The blender configured for the colour space.
    #[inline]
    pub fn blender(&self) -> &Blender {
        &self.blender
    }

    /// Element size in bytes: 4 for colour, 1 for grayscale.
    #[inline]
    pub fn channel_size(&self) -> usize {
        self.buf.channel_size()
    }

    /// The attached compositor, if any.
    #[inline]
    pub fn compositor(&self) -> Option<&Compositor> {
        self.compositor.as_deref()
    }

    /// The attached compositor, if any.
    #[inline]
    pub fn compositor_mut(&mut self) -> Option<&mut Compositor> {
        self.compositor.as_deref_mut()
    }

    /// Zero a rectangle of pixels. Uses a single run when the rectangle
    /// spans full rows.
    pub fn clear(&mut self, x: u32, y: u32, w: u32, h: u32) -> bool {
        if w == 0 || h == 0 || x >= self.w || y >= self.h {
            return false;
        }
        let w = w.min(self.w - x) as usize;
        let h = h.min(self.h - y) as usize;
        let (x, y) = (x as usize, y as usize);
        let stride = self.stride;

        match &mut self.buf {
            SurfaceBuf::Rgba32(buf) => {
                if w == stride {
                    buf[y * stride..(y + h) * stride].fill(0);
                } else {
                    for row in 0..h {
                        let start = (y + row) * stride + x;
                        buf[start..start + w].fill(0);
                    }
                }
            }
            SurfaceBuf::Gray8(buf) => {
                if w == stride {
                    buf[y * stride..(y + h) * stride].fill(0);
                } else {
                    for row in 0..h {
                        let start = (y + row) * stride + x;
                        buf[start..start + w].fill(0);
                    }
                }
            }
        }
        true
    }

    /// Zero the whole surface.
    pub fn clear_all(&mut self) -> bool {
        let (w, h) = (self.stride as u32, self.h);
        self.clear(0, 0, w, h)
    }

    /// Multiply the colour channels of every pixel by its alpha.
    ///
    /// Grayscale surfaces are left untouched and report `false`.
    pub fn premultiply(&mut self) -> bool {
        let SurfaceBuf::Rgba32(buf) = &mut self.buf else {
            return false;
        };
        log::debug!(target: "sw_engine", "premultiply [size: {} x {}]", self.w, self.h);

        for y in 0..self.h as usize {
            let row = &mut buf[y * self.stride..][..self.w as usize];
            for c in row {
                let a = (*c >> 24) as u8;
                *c = (*c & 0xff00_0000) | (alpha_blend(*c, a) & 0x00ff_ffff);
            }
        }
        self.premultiplied = true;
        true
    }

    /// Divide the colour channels of every pixel by its alpha.
    ///
    /// A fully transparent pixel becomes `0x00ffffff`, preserving white RGB
    /// as the defined choice for α = 0.
    pub fn unpremultiply(&mut self) -> bool {
        let SurfaceBuf::Rgba32(buf) = &mut self.buf else {
            return false;
        };
        log::debug!(target: "sw_engine", "unpremultiply [size: {} x {}]", self.w, self.h);

        for y in 0..self.h as usize {
            let row = &mut buf[y * self.stride..][..self.w as usize];
            for c in row {
                let a = *c >> 24;
                if a == 255 {
                    continue;
                }
                if a == 0 {
                    *c = 0x00ff_ffff;
                    continue;
                }
                let r = (((*c >> 8) & 0xff00) / a).min(0xff);
                let g = ((*c & 0xff00) / a).min(0xff);
                let b = (((*c << 8) & 0xff00) / a).min(0xff);
                *c = (a << 24) | (r << 16) | (g << 8) | b;
            }
        }
        self.premultiplied = false;
        true
    }

    /// Convert between the two supported byte orders.
    ///
    /// Only the ABGR ↔ ARGB swap within the same alpha convention is
    /// supported; anything else returns `false` and leaves the surface
    /// unchanged.
    pub fn convert_color_space(&mut self, to: ColorSpace) -> bool {
        if to != self.cs.swapped() {
            log::error!(target: "sw_engine", "unsupported colour space conversion {:?} -> {to:?}", self.cs);
            return false;
        }
        let SurfaceBuf::Rgba32(buf) = &mut self.buf else {
            return false;
        };

        for y in 0..self.h as usize {
            let row = &mut buf[y * self.stride..][..self.w as usize];
            for c in row {
                *c = (*c & 0xff00_ff00) | ((*c >> 16) & 0xff) | ((*c & 0xff) << 16);
            }
        }
        self.cs = to;
        self.blender = Blender::new(to);
        true
    }

    /// Attach a cleared mask/matte buffer sized to the surface.
    ///
    /// Subsequent draws composite against it according to `mode` until
    /// [`detach_compositor`](Self::detach_compositor) is called.
    pub fn attach_compositor(&mut self, mode: CompositeMode, bbox: Bbox) -> bool {
        let Ok(image) = LayerBuf::new(self.w, self.h) else {
            log::error!(target: "sw_engine", "compositor allocation failed ({} x {})", self.w, self.h);
            return false;
        };
        self.compositor = Some(Box::new(Compositor {
            mode,
            image,
            bbox: bbox.clamp_to(self.w, self.h),
        }));
        true
    }

    /// Switch the compositing mode of the attached compositor.
    pub fn set_composite_mode(&mut self, mode: CompositeMode) -> bool {
        match self.compositor.as_deref_mut() {
            Some(cmp) => {
                cmp.mode = mode;
                true
            }
            None => false,
        }
    }

    /// Detach and return the compositor, if any.
    pub fn detach_compositor(&mut self) -> Option<Box<Compositor>> {
        self.compositor.take()
    }

    /// Begin one nested off-screen rendering pass.
    ///
    /// Allocates a surface-sized zeroed layer and returns the context whose
    /// [`surface`](CompositeCtx::surface) view the inner draws target.
    /// Passes nest LIFO through that view; the requested region is clamped
    /// to the surface and bounds the final blit.
    pub fn begin_composite(&self, bbox: Bbox) -> Option<CompositeCtx> {
        let bbox = bbox.clamp_to(self.w, self.h);
        if bbox.is_empty() {
            log::error!(target: "sw_engine", "composite region outside the surface");
            return None;
        }
        let Ok(layer) = LayerBuf::new(self.w, self.h) else {
            log::error!(target: "sw_engine", "composite layer allocation failed ({} x {})", self.w, self.h);
            return None;
        };
        Some(CompositeCtx {
            layer,
            bbox,
            cs: self.cs,
        })
    }

    /// Finish a pass begun with [`begin_composite`](Self::begin_composite):
    /// blit the layer back onto this surface under `opacity` and free it.
    ///
    /// The blit honours this surface's own compositor state, so nested
    /// mask/matte composition carries through.
    pub fn end_composite(&mut self, ctx: CompositeCtx, opacity: u8) -> bool {
        let image = ctx.layer.as_image(self.cs);
        raster::image::direct_image(self, &image, &ctx.bbox, opacity)
    }
}

/// One nested off-screen rendering pass.
///
/// Owns the layer pixels; the parent surface is restored simply by dropping
/// the borrowed view, which keeps nesting LIFO by construction.
#[derive(Debug)]
pub struct CompositeCtx {
    layer: LayerBuf,
    bbox: Bbox,
    cs: ColorSpace,
}

impl CompositeCtx {
    /// A surface view over the layer for the inner draws.
    ///
    /// The view inherits the parent's colour space and blender. A compositor
    /// attached to the view lives exactly as long as the view does.
    pub fn surface(&mut self) -> Surface<'_> {
        Surface {
            stride: self.layer.stride,
            w: self.layer.w,
            h: self.layer.h,
            cs: self.cs,
            premultiplied: true,
            blender: Blender::new(self.cs),
            compositor: None,
            buf: SurfaceBuf::Rgba32(&mut self.layer.buf),
        }
    }

    /// The clamped pass region.
    #[inline]
    pub fn bbox(&self) -> Bbox {
        self.bbox
    }

    /// The layer pixels, row-major.
    #[inline]
    pub fn layer(&self) -> &LayerBuf {
        &self.layer
    }
}
