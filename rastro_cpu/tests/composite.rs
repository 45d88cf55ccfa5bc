// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nested off-screen composite passes.

mod util;

use rastro_common::blend::{alpha_blend, inv_alpha};
use rastro_common::{Bbox, CompositeMode};
use rastro_cpu::raster::{raster_shape, Shape};
use util::{abgr, Target};

#[test]
fn composite_pass_blits_back_at_full_opacity() {
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    let mut ctx = surface.begin_composite(Bbox::new(0, 0, 8, 8)).unwrap();
    {
        let mut inner = ctx.surface();
        let shape = Shape::fast_track(Bbox::new(2, 2, 6, 6));
        assert!(raster_shape(&mut inner, &shape, 255, 0, 0, 255));
    }
    assert!(surface.end_composite(ctx, 255));
    drop(surface);

    target.assert_partition(
        |x, y| (2..6).contains(&x) && (2..6).contains(&y),
        abgr(255, 0, 0, 255),
        0,
    );
}

#[test]
fn composite_pass_applies_group_opacity() {
    let mut target = Target::new(4, 4);
    let mut surface = target.surface();
    let mut ctx = surface.begin_composite(Bbox::new(0, 0, 4, 4)).unwrap();
    {
        let mut inner = ctx.surface();
        let shape = Shape::fast_track(Bbox::new(0, 0, 4, 4));
        assert!(raster_shape(&mut inner, &shape, 255, 255, 255, 255));
    }
    assert!(surface.end_composite(ctx, 128));
    drop(surface);

    let t = alpha_blend(0xffff_ffff, 128);
    let expected = t + alpha_blend(0, inv_alpha(t));
    assert!(target.buf.iter().all(|&c| c == expected));
}

#[test]
fn composite_passes_nest_lifo() {
    let mut target = Target::new(8, 1);
    let mut surface = target.surface();
    let mut outer = surface.begin_composite(Bbox::new(0, 0, 8, 1)).unwrap();
    {
        let mut mid = outer.surface();
        assert!(raster_shape(
            &mut mid,
            &Shape::fast_track(Bbox::new(0, 0, 4, 1)),
            0,
            255,
            0,
            255
        ));

        let mut inner_ctx = mid.begin_composite(Bbox::new(0, 0, 8, 1)).unwrap();
        {
            let mut inner = inner_ctx.surface();
            assert!(raster_shape(
                &mut inner,
                &Shape::fast_track(Bbox::new(6, 0, 8, 1)),
                255,
                0,
                0,
                255
            ));
        }
        assert!(mid.end_composite(inner_ctx, 255));
    }
    assert!(surface.end_composite(outer, 255));
    drop(surface);

    assert_eq!(target.px(0, 0), abgr(0, 255, 0, 255));
    assert_eq!(target.px(5, 0), 0);
    assert_eq!(target.px(7, 0), abgr(255, 0, 0, 255));
}

#[test]
fn mask_inside_a_composite_pass() {
    let mut target = Target::new(8, 1);
    let mut surface = target.surface();
    let mut ctx = surface.begin_composite(Bbox::new(0, 0, 8, 1)).unwrap();
    {
        let mut inner = ctx.surface();
        assert!(inner.attach_compositor(CompositeMode::AddMask, Bbox::new(0, 0, 8, 1)));
        assert!(raster_shape(
            &mut inner,
            &Shape::fast_track(Bbox::new(0, 0, 2, 1)),
            0,
            0,
            255,
            255
        ));
    }
    assert!(surface.end_composite(ctx, 255));
    drop(surface);

    target.assert_partition(|x, _| x < 2, abgr(0, 0, 255, 255), 0);
}

#[test]
fn end_composite_respects_outer_matte() {
    let mut target = Target::new(4, 1);
    let mut surface = target.surface();
    assert!(surface.attach_compositor(CompositeMode::AlphaMask, Bbox::new(0, 0, 4, 1)));
    {
        let data = surface.compositor_mut().unwrap().image.data_mut();
        data[0] = 0xff00_0000;
        data[1] = 0xff00_0000;
    }
    let mut ctx = surface.begin_composite(Bbox::new(0, 0, 4, 1)).unwrap();
    {
        let mut inner = ctx.surface();
        assert!(raster_shape(
            &mut inner,
            &Shape::fast_track(Bbox::new(0, 0, 4, 1)),
            255,
            255,
            255,
            255
        ));
    }
    assert!(surface.end_composite(ctx, 255));
    drop(surface);

    target.assert_partition(|x, _| x < 2, 0xffff_ffff, 0);
}
