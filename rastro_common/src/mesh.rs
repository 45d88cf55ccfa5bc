// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle meshes for the textured-polygon rasterizer.

use alloc::vec::Vec;

/// A mesh vertex: position in image space plus texture coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    /// Position, transformed by the image's forward matrix at raster time.
    pub x: f32,
    /// Position, transformed by the image's forward matrix at raster time.
    pub y: f32,
    /// Texture coordinate in image pixels.
    pub u: f32,
    /// Texture coordinate in image pixels.
    pub v: f32,
}

/// One textured triangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    /// The three corners.
    pub vertex: [Vertex; 3],
}

/// An optional triangle mesh replacing the image's implicit quad.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// The triangles, rasterized in order.
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Whether there is nothing to draw.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
