// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rect fast-track fills.

mod util;

use rastro_common::blend::alpha_blend;
use rastro_common::{Bbox, ColorSpace};
use rastro_cpu::raster::{raster_shape, Shape};
use util::{abgr, Target};

#[test]
fn solid_rect_over_cleared_surface() {
    let mut target = Target::new(16, 16);
    let mut surface = target.surface();
    let shape = Shape::fast_track(Bbox::new(4, 4, 12, 12));
    assert!(raster_shape(&mut surface, &shape, 255, 0, 0, 255));
    drop(surface);

    target.assert_partition(
        |x, y| (4..12).contains(&x) && (4..12).contains(&y),
        0xff00_00ff,
        0x0000_0000,
    );
}

#[test]
fn solid_rect_argb_byte_order() {
    let mut target = Target::new(8, 8);
    let mut surface = target.surface_cs(ColorSpace::Argb8888);
    let shape = Shape::fast_track(Bbox::new(0, 0, 8, 8));
    assert!(raster_shape(&mut surface, &shape, 255, 0, 0, 255));
    drop(surface);
    assert_eq!(target.px(3, 3), 0xffff_0000);
}

#[test]
fn zero_alpha_draw_is_identity() {
    let mut target = Target::filled(8, 8, 0xff33_2211);
    let before = target.buf.clone();
    let mut surface = target.surface();
    let shape = Shape::fast_track(Bbox::new(0, 0, 8, 8));
    assert!(raster_shape(&mut surface, &shape, 200, 100, 50, 0));
    drop(surface);
    assert_eq!(target.buf, before);
}

#[test]
fn translucent_rect_blends_premultiplied() {
    let mut target = Target::filled(4, 4, 0xffff_ffff);
    let mut surface = target.surface();
    let shape = Shape::fast_track(Bbox::new(0, 0, 4, 4));
    // (0, 0, 255, 128): premultiplied blue at half opacity.
    assert!(raster_shape(&mut surface, &shape, 0, 0, 255, 128));
    drop(surface);

    let src = abgr(0, 0, 128, 128);
    let expected = src + alpha_blend(0xffff_ffff, 255 - 128);
    assert!(target.buf.iter().all(|&c| c == expected));
}

#[test]
fn rect_clipped_to_surface() {
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    let shape = Shape::fast_track(Bbox::new(6, 6, 20, 20));
    assert!(raster_shape(&mut surface, &shape, 0, 255, 0, 255));
    drop(surface);
    target.assert_partition(|x, y| x >= 6 && y >= 6, abgr(0, 255, 0, 255), 0);
}

#[test]
fn offscreen_rect_is_rejected() {
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    let shape = Shape::fast_track(Bbox::new(9, 9, 12, 12));
    assert!(!raster_shape(&mut surface, &shape, 0, 255, 0, 255));
    drop(surface);
    assert!(target.buf.iter().all(|&c| c == 0));
}
