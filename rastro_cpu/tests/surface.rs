// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface maintenance operations.

mod util;

use rastro_common::ColorSpace;
use util::{abgr, Target};

#[test]
fn clear_is_idempotent_after_drawing() {
    let mut target = Target::filled(8, 8, 0xff55_66aa);
    let mut surface = target.surface();
    assert!(surface.clear_all());
    drop(surface);
    let once = target.buf.clone();

    let mut surface = target.surface();
    assert!(surface.clear_all());
    drop(surface);
    assert_eq!(target.buf, once);
    assert!(target.buf.iter().all(|&c| c == 0));
}

#[test]
fn partial_clear_touches_only_the_rect() {
    let mut target = Target::filled(8, 8, 0xffff_ffff);
    let mut surface = target.surface();
    assert!(surface.clear(2, 2, 4, 4));
    drop(surface);
    target.assert_partition(
        |x, y| (2..6).contains(&x) && (2..6).contains(&y),
        0,
        0xffff_ffff,
    );
}

#[test]
fn premultiply_round_trips_opaque_pixels() {
    let mut target = Target::new(2, 2);
    target.buf[0] = abgr(18, 52, 86, 255);
    target.buf[1] = abgr(255, 1, 128, 255);
    target.buf[2] = abgr(9, 9, 9, 0); // α = 0
    let mut surface = target.surface_cs(ColorSpace::Abgr8888S);
    assert!(surface.premultiply());
    assert!(surface.premultiplied());
    assert!(surface.unpremultiply());
    assert!(!surface.premultiplied());
    drop(surface);

    assert_eq!(target.buf[0], abgr(18, 52, 86, 255));
    assert_eq!(target.buf[1], abgr(255, 1, 128, 255));
    assert_eq!(target.buf[2], 0x00ff_ffff, "α = 0 maps to white RGB");
}

#[test]
fn convert_color_space_round_trips() {
    let mut target = Target::new(2, 1);
    target.buf[0] = abgr(0x11, 0x22, 0x33, 0x44);
    target.buf[1] = abgr(0xff, 0x00, 0x7f, 0xff);
    let original = target.buf.clone();

    let mut surface = target.surface();
    assert!(surface.convert_color_space(ColorSpace::Argb8888));
    assert_eq!(surface.color_space(), ColorSpace::Argb8888);
    assert!(surface.convert_color_space(ColorSpace::Abgr8888));
    drop(surface);
    assert_eq!(target.buf, original);
}

#[test]
fn convert_across_alpha_conventions_is_unsupported() {
    let mut target = Target::filled(2, 1, 0x8811_2233);
    let before = target.buf.clone();
    let mut surface = target.surface();
    assert!(!surface.convert_color_space(ColorSpace::Argb8888S));
    assert!(!surface.convert_color_space(ColorSpace::Abgr8888));
    drop(surface);
    assert_eq!(target.buf, before, "failed conversions must not write");
}

#[test]
fn straight_alpha_conversion_pairs_work() {
    let mut target = Target::filled(2, 1, 0x8011_2233);
    let mut surface = target.surface_cs(ColorSpace::Abgr8888S);
    assert!(surface.convert_color_space(ColorSpace::Argb8888S));
    assert_eq!(surface.color_space(), ColorSpace::Argb8888S);
    drop(surface);
    assert_eq!(target.buf[0], 0x8033_2211);
}
