// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions shared across different tests.
#![allow(dead_code)]

use rastro_common::ColorSpace;
use rastro_cpu::Surface;

/// An owned pixel target a test borrows surfaces from.
pub struct Target {
    pub buf: Vec<u32>,
    pub w: u32,
    pub h: u32,
}

impl Target {
    /// A zero-cleared `w × h` target.
    pub fn new(w: u32, h: u32) -> Self {
        Self::filled(w, h, 0)
    }

    /// A target prefilled with one word.
    pub fn filled(w: u32, h: u32, val: u32) -> Self {
        Self {
            buf: vec![val; (w * h) as usize],
            w,
            h,
        }
    }

    /// A fresh ABGR8888 surface over the pixels.
    pub fn surface(&mut self) -> Surface<'_> {
        self.surface_cs(ColorSpace::Abgr8888)
    }

    /// A fresh surface over the pixels in the given colour space.
    pub fn surface_cs(&mut self, cs: ColorSpace) -> Surface<'_> {
        Surface::new_rgba(&mut self.buf, self.w as usize, self.w, self.h, cs).unwrap()
    }

    /// The pixel at `(x, y)`.
    pub fn px(&self, x: u32, y: u32) -> u32 {
        self.buf[(y * self.w + x) as usize]
    }

    /// Assert that exactly the pixels inside `pred` hold `inside`, and
    /// everything else holds `outside`.
    pub fn assert_partition(
        &self,
        pred: impl Fn(u32, u32) -> bool,
        inside: u32,
        outside: u32,
    ) {
        for y in 0..self.h {
            for x in 0..self.w {
                let expected = if pred(x, y) { inside } else { outside };
                assert_eq!(
                    self.px(x, y),
                    expected,
                    "pixel ({x}, {y}) expected {expected:#010x}, got {:#010x}",
                    self.px(x, y)
                );
            }
        }
    }
}

/// Pack an ABGR8888 word (the little-endian `[R, G, B, A]` byte order).
pub fn abgr(r: u8, g: u8, b: u8, a: u8) -> u32 {
    u32::from(a) << 24 | u32::from(b) << 16 | u32::from(g) << 8 | u32::from(r)
}
