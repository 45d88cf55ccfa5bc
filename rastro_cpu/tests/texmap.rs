// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Textured-polygon (general transform) image fills.

mod util;

use rastro_common::blend::alpha_blend;
use rastro_common::{Bbox, BlitPath, ColorSpace, Image, Matrix, Mesh, Triangle, Vertex};
use rastro_cpu::raster::raster_image;
use util::{abgr, Target};

fn transformed_image<'a>(buf: &'a [u32], w: u32, h: u32) -> Image<'a> {
    let mut image = Image::new(buf, w as usize, w, h, ColorSpace::Abgr8888);
    image.path = BlitPath::Transformed;
    image
}

#[test]
fn identity_quad_covers_the_image_rect() {
    let src = vec![abgr(0, 0, 255, 255); 16];
    let image = transformed_image(&src, 4, 4);
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    assert!(raster_image(
        &mut surface,
        &image,
        None,
        Some(&Matrix::identity()),
        &Bbox::new(0, 0, 8, 8),
        255
    ));
    drop(surface);
    target.assert_partition(|x, y| x < 4 && y < 4, abgr(0, 0, 255, 255), 0);
}

#[test]
fn translated_quad_lands_at_the_offset() {
    let src = vec![abgr(255, 0, 0, 255); 16];
    let image = transformed_image(&src, 4, 4);
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    assert!(raster_image(
        &mut surface,
        &image,
        None,
        Some(&Matrix::translate(3.0, 2.0)),
        &Bbox::new(0, 0, 8, 8),
        255
    ));
    drop(surface);
    target.assert_partition(
        |x, y| (3..7).contains(&x) && (2..6).contains(&y),
        abgr(255, 0, 0, 255),
        0,
    );
}

#[test]
fn quarter_rotation_keeps_the_cover_count() {
    // Rotate the 4×4 quad by 90° about its centre (2, 2): the cover is the
    // same square.
    let src = vec![abgr(0, 255, 0, 255); 16];
    let image = transformed_image(&src, 4, 4);
    let rot = Matrix {
        e11: 0.0,
        e12: -1.0,
        e13: 4.0,
        e21: 1.0,
        e22: 0.0,
        e23: 0.0,
        e31: 0.0,
        e32: 0.0,
        e33: 1.0,
    };
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    assert!(raster_image(
        &mut surface,
        &image,
        None,
        Some(&rot),
        &Bbox::new(0, 0, 8, 8),
        255
    ));
    drop(surface);
    target.assert_partition(|x, y| x < 4 && y < 4, abgr(0, 255, 0, 255), 0);
}

#[test]
fn texmap_applies_opacity() {
    let src = vec![abgr(255, 255, 255, 255); 16];
    let image = transformed_image(&src, 4, 4);
    let mut target = Target::new(4, 4);
    let mut surface = target.surface();
    assert!(raster_image(
        &mut surface,
        &image,
        None,
        Some(&Matrix::identity()),
        &Bbox::new(0, 0, 4, 4),
        128
    ));
    drop(surface);
    let expected = alpha_blend(0xffff_ffff, 128);
    assert!(target.buf.iter().all(|&c| c == expected));
}

#[test]
fn mesh_draws_only_its_triangles() {
    let src = vec![abgr(0, 0, 255, 255); 64];
    let image = transformed_image(&src, 8, 8);
    // One triangle spanning the left half of the image square.
    let mesh = Mesh {
        triangles: vec![Triangle {
            vertex: [
                Vertex {
                    x: 0.0,
                    y: 0.0,
                    u: 0.0,
                    v: 0.0,
                },
                Vertex {
                    x: 0.0,
                    y: 8.0,
                    u: 0.0,
                    v: 8.0,
                },
                Vertex {
                    x: 8.0,
                    y: 8.0,
                    u: 8.0,
                    v: 8.0,
                },
            ],
        }],
    };
    let mut target = Target::new(8, 8);
    let mut surface = target.surface();
    assert!(raster_image(
        &mut surface,
        &image,
        Some(&mesh),
        Some(&Matrix::identity()),
        &Bbox::new(0, 0, 8, 8),
        255
    ));
    drop(surface);

    // Below the diagonal is covered, above it stays clear.
    assert_eq!(target.px(1, 6), abgr(0, 0, 255, 255));
    assert_eq!(target.px(0, 7), abgr(0, 0, 255, 255));
    assert_eq!(target.px(6, 1), 0);
    assert_eq!(target.px(7, 0), 0);
}

#[test]
fn degenerate_projection_is_rejected() {
    let src = vec![0xffff_ffff_u32; 16];
    let image = transformed_image(&src, 4, 4);
    let collapse = Matrix {
        e33: 0.0,
        ..Matrix::identity()
    };
    let mut target = Target::new(4, 4);
    let mut surface = target.surface();
    assert!(!raster_image(
        &mut surface,
        &image,
        None,
        Some(&collapse),
        &Bbox::new(0, 0, 4, 4),
        255
    ));
    drop(surface);
    assert!(target.buf.iter().all(|&c| c == 0));
}
