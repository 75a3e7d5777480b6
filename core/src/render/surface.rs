//! Minimal drawing-surface abstraction.
//!
//! The render engine only ever needs these primitives, so any backend (a
//! canvas context, an SVG writer, a recording fake in tests) can sit behind
//! the trait. Coordinates are device pixels.

use crate::types::{Color, Point, Rect};

/// Horizontal text anchoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// Anchor at the left edge
    Left,
    /// Anchor at the centre
    #[default]
    Center,
}

/// How a piece of text is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in device pixels
    pub size: f64,
    /// Fill colour
    pub color: Color,
    /// Anchoring relative to the text position
    pub align: TextAlign,
}

/// Something a frame can be drawn onto.
pub trait Surface {
    /// Width in device pixels
    fn width(&self) -> f64;

    /// Height in device pixels
    fn height(&self) -> f64;

    /// Fill the whole surface
    fn clear(&mut self, color: Color);

    /// Fill an axis-aligned rectangle
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Fill a rectangle with rounded corners
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Color);

    /// Stroke a straight line
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color);

    /// Draw text anchored at `at` (vertically centred)
    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle);
}
