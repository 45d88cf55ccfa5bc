// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear and radial gradient fills.

mod util;

use rastro_common::blend::{alpha_blend, inv_alpha};
use rastro_common::{
    Bbox, Blender, ColorSpace, CompositeMode, FillSpread, GradientFill, RleSpans, Span,
};
use rastro_cpu::raster::{raster_gradient_shape, raster_gradient_stroke, Shape};
use rastro_cpu::Surface;
use util::Target;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn blender() -> Blender {
    Blender::new(ColorSpace::Abgr8888)
}

fn two_stop_linear(start: (f32, f32), end: (f32, f32)) -> GradientFill {
    GradientFill::linear(
        start,
        end,
        &[(0.0, RED), (1.0, BLUE)],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap()
}

/// The pad-spread ramp index the span writers compute for parameter `t`.
fn pad_index(t: f32) -> usize {
    ((t.clamp(0.0, 1.0) * 255.0 + 0.5) as usize).min(255)
}

#[test]
fn linear_rect_matches_closed_form() {
    let fill = two_stop_linear((0.0, 0.0), (8.0, 0.0));
    let mut target = Target::new(8, 2);
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 8, 2))
    };
    assert!(raster_gradient_shape(&mut surface, &shape));
    drop(surface);

    for x in 0..8 {
        let t = (x as f32 + 0.5) * 0.125;
        let expected = fill.ramp()[pad_index(t)];
        assert_eq!(target.px(x, 0), expected, "column {x}");
        assert_eq!(target.px(x, 1), expected, "rows share the horizontal axis");
    }
}

#[test]
fn gradient_reversal_mirrors_bit_exactly() {
    let fill = two_stop_linear((0.0, 0.0), (8.0, 0.0));
    let reversed = GradientFill::linear(
        (0.0, 0.0),
        (8.0, 0.0),
        &[(0.0, BLUE), (1.0, RED)],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap();

    let draw = |fill: &GradientFill| -> Vec<u32> {
        let mut target = Target::new(8, 1);
        let mut surface = target.surface();
        let shape = Shape {
            fill: Some(fill),
            ..Shape::fast_track(Bbox::new(0, 0, 8, 1))
        };
        assert!(raster_gradient_shape(&mut surface, &shape));
        drop(surface);
        target.buf
    };

    let forward = draw(&fill);
    let mut mirrored = draw(&reversed);
    mirrored.reverse();
    assert_eq!(forward, mirrored);
}

#[test]
fn degenerate_linear_gradient_is_rejected_without_writes() {
    let fill = two_stop_linear((3.0, 3.0), (3.0, 3.0));
    let mut target = Target::filled(4, 4, 0xff11_2233);
    let before = target.buf.clone();
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 4, 4))
    };
    assert!(!raster_gradient_shape(&mut surface, &shape));
    drop(surface);
    assert_eq!(target.buf, before);
}

#[test]
fn degenerate_radial_gradient_is_rejected() {
    let fill = GradientFill::radial(
        (2.0, 2.0),
        0.0,
        None,
        &[(0.0, RED), (1.0, BLUE)],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap();
    let mut target = Target::new(4, 4);
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 4, 4))
    };
    assert!(!raster_gradient_shape(&mut surface, &shape));
}

#[test]
fn radial_rect_pads_outside_the_radius() {
    let fill = GradientFill::radial(
        (4.0, 4.0),
        4.0,
        None,
        &[(0.0, RED), (1.0, BLUE)],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap();
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 8, 8))
    };
    assert!(raster_gradient_shape(&mut surface, &shape));
    drop(surface);

    // The corner lies past the radius and pads to the last stop.
    assert_eq!(target.px(0, 0), fill.ramp()[255]);
    // The centre reproduces the closed form.
    let t = (0.5_f32 * 0.5 + 0.25).sqrt() * (1.0 / 4.0);
    assert_eq!(target.px(4, 4), fill.ramp()[pad_index(t)]);
}

#[test]
fn translucent_gradient_blends_into_destination() {
    let fill = GradientFill::linear(
        (0.0, 0.0),
        (8.0, 0.0),
        &[(0.0, [255, 0, 0, 128]), (1.0, [0, 0, 255, 128])],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap();
    assert!(fill.translucent);

    let mut target = Target::filled(8, 1, 0xffff_ffff);
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 8, 1))
    };
    assert!(raster_gradient_shape(&mut surface, &shape));
    drop(surface);

    for x in 0..8 {
        let t = (x as f32 + 0.5) * 0.125;
        let src = fill.ramp()[pad_index(t)];
        let expected = src + alpha_blend(0xffff_ffff, inv_alpha(src));
        assert_eq!(target.px(x, 0), expected, "column {x}");
    }
}

#[test]
fn gradient_rle_interpolates_partial_coverage() {
    let fill = two_stop_linear((0.0, 0.0), (4.0, 0.0));
    let rle = RleSpans::from_spans(vec![Span {
        x: 0,
        y: 0,
        len: 4,
        coverage: 128,
    }]);
    let mut target = Target::filled(4, 1, 0xff00_0000);
    let mut surface = target.surface();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::from_rle(&rle)
    };
    assert!(raster_gradient_shape(&mut surface, &shape));
    drop(surface);

    for x in 0..4 {
        let t = (x as f32 + 0.5) * 0.25;
        let src = fill.ramp()[pad_index(t)];
        let expected = alpha_blend(src, 128) + alpha_blend(0xff00_0000, 127);
        assert_eq!(target.px(x, 0), expected, "column {x}");
    }
}

#[test]
fn add_mask_gradient_scales_the_ramp_by_coverage() {
    // A translucent ramp under anti-aliased coverage: the mask update must
    // be cmp ← t + blend(cmp, iα(t)) with t = blend(src, coverage), per the
    // add-mask formula over the coverage-scaled source.
    let fill = GradientFill::linear(
        (0.0, 0.0),
        (4.0, 0.0),
        &[(0.0, [255, 0, 0, 128]), (1.0, [0, 0, 255, 128])],
        FillSpread::Pad,
        &blender(),
    )
    .unwrap();
    assert!(fill.translucent);

    let rle = RleSpans::from_spans(vec![Span {
        x: 0,
        y: 0,
        len: 4,
        coverage: 128,
    }]);
    let mut target = Target::new(4, 1);
    let mut surface = target.surface();
    assert!(surface.attach_compositor(CompositeMode::AddMask, Bbox::new(0, 0, 4, 1)));
    let cmp0 = 0x6020_1000_u32;
    surface.compositor_mut().unwrap().image.data_mut().fill(cmp0);

    let shape = Shape {
        fill: Some(&fill),
        ..Shape::from_rle(&rle)
    };
    assert!(raster_gradient_shape(&mut surface, &shape));

    let cmp = surface.detach_compositor().unwrap();
    for x in 0..4_usize {
        let t = (x as f32 + 0.5) * 0.25;
        let src = fill.ramp()[pad_index(t)];
        let scaled = alpha_blend(src, 128);
        let expected = scaled + alpha_blend(cmp0, inv_alpha(scaled));
        assert_eq!(cmp.image.data()[x], expected, "column {x}");
    }
}

#[test]
fn gradient_stroke_uses_stroke_fill() {
    let fill = two_stop_linear((0.0, 0.0), (8.0, 0.0));
    let stroke_rle = RleSpans::from_rect(&Bbox::new(0, 0, 8, 1), 255);
    let mut target = Target::new(8, 1);
    let mut surface = target.surface();
    let shape = Shape {
        stroke_rle: Some(&stroke_rle),
        stroke_fill: Some(&fill),
        ..Shape::default()
    };
    assert!(raster_gradient_stroke(&mut surface, &shape));
    drop(surface);
    assert_eq!(target.px(0, 0), fill.ramp()[pad_index(0.5 * 0.125)]);
}

#[test]
fn grayscale_gradient_is_unsupported() {
    let fill = two_stop_linear((0.0, 0.0), (8.0, 0.0));
    let mut gray = vec![0_u8; 8];
    let mut surface = Surface::new_gray(&mut gray, 8, 8, 1, ColorSpace::Abgr8888).unwrap();
    let shape = Shape {
        fill: Some(&fill),
        ..Shape::fast_track(Bbox::new(0, 0, 8, 1))
    };
    assert!(!raster_gradient_shape(&mut surface, &shape));
}
