// Copyright 2026 the Rastro Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Run-length-encoded coverage spans produced by the geometry stage.

use crate::bbox::Bbox;
use alloc::vec::Vec;

/// One horizontal run of pixels at constant anti-alias coverage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// Left pixel of the run.
    pub x: i16,
    /// Row of the run.
    pub y: i16,
    /// Number of pixels in the run.
    pub len: u16,
    /// Anti-alias coverage, 255 = fully inside.
    pub coverage: u8,
}

/// An ordered list of non-overlapping spans, sorted by `y` then `x`.
///
/// The geometry stage guarantees the ordering and that no span starts at a
/// negative coordinate; spans running past the surface edge are clipped at
/// raster time rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RleSpans {
    spans: Vec<Span>,
}

impl RleSpans {
    /// Create an empty span list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already sorted span list.
    pub fn from_spans(spans: Vec<Span>) -> Self {
        debug_assert!(
            spans
                .windows(2)
                .all(|w| (w[0].y, w[0].x) < (w[1].y, w[1].x)),
            "spans must be sorted by y then x"
        );
        debug_assert!(
            spans.iter().all(|s| s.x >= 0 && s.y >= 0),
            "negative span coordinates are a geometry-stage bug"
        );
        Self { spans }
    }

    /// Fully covered spans for every row of a rectangle. Test/demo helper;
    /// real callers get their spans from the geometry stage.
    pub fn from_rect(bbox: &Bbox, coverage: u8) -> Self {
        let mut spans = Vec::with_capacity(bbox.height() as usize);
        for y in bbox.y0..bbox.y1 {
            spans.push(Span {
                x: bbox.x0 as i16,
                y: y as i16,
                len: bbox.width() as u16,
                coverage,
            });
        }
        Self { spans }
    }

    /// Append a span; must preserve the sort order.
    pub fn push(&mut self, span: Span) {
        debug_assert!(
            self.spans
                .last()
                .is_none_or(|p| (p.y, p.x) < (span.y, span.x)),
            "spans must be pushed in y-then-x order"
        );
        self.spans.push(span);
    }

    /// The spans in order.
    #[inline]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Whether the list holds no spans.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The tight bbox covering every span, empty for an empty list.
    pub fn bbox(&self) -> Bbox {
        let mut bbox = Bbox::default();
        for (i, span) in self.spans.iter().enumerate() {
            let x0 = i32::from(span.x);
            let x1 = x0 + i32::from(span.len);
            let y = i32::from(span.y);
            if i == 0 {
                bbox = Bbox::new(x0, y, x1, y + 1);
            } else {
                bbox.x0 = bbox.x0.min(x0);
                bbox.x1 = bbox.x1.max(x1);
                bbox.y1 = bbox.y1.max(y + 1);
            }
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_spans_cover_rows() {
        let rle = RleSpans::from_rect(&Bbox::new(2, 3, 6, 5), 255);
        assert_eq!(rle.spans().len(), 2);
        assert_eq!(
            rle.spans()[0],
            Span {
                x: 2,
                y: 3,
                len: 4,
                coverage: 255
            }
        );
        assert_eq!(rle.bbox(), Bbox::new(2, 3, 6, 5));
    }

    #[test]
    fn bbox_spans_multiple_rows() {
        let rle = RleSpans::from_spans(alloc::vec![
            Span {
                x: 4,
                y: 1,
                len: 2,
                coverage: 128
            },
            Span {
                x: 0,
                y: 2,
                len: 10,
                coverage: 255
            },
        ]);
        assert_eq!(rle.bbox(), Bbox::new(0, 1, 10, 3));
    }
}
