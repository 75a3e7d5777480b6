//! A drawing surface that records calls instead of drawing.

use seatmap_core::render::{Surface, TextStyle};
use seatmap_core::types::{Color, Point, Rect};

/// One recorded drawing call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// `clear`
    Clear(Color),
    /// `fill_rect`
    FillRect {
        /// Rectangle
        rect: Rect,
        /// Fill
        color: Color,
    },
    /// `fill_rounded_rect`
    FillRoundedRect {
        /// Rectangle
        rect: Rect,
        /// Corner radius
        radius: f64,
        /// Fill
        color: Color,
    },
    /// `stroke_line`
    StrokeLine {
        /// Start
        from: Point,
        /// End
        to: Point,
        /// Stroke width
        width: f64,
        /// Stroke colour
        color: Color,
    },
    /// `fill_text`
    FillText {
        /// Text drawn
        text: String,
        /// Anchor
        at: Point,
        /// Style
        style: TextStyle,
    },
}

/// Records every call of the current frame.
///
/// `clear` starts a new frame and discards the previous frame's calls.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    calls: Vec<DrawCall>,
    frames: usize,
}

impl RecordingSurface {
    /// Creates a surface of the given size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            frames: 0,
        }
    }

    /// Calls of the current frame, in order
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of frames started so far
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Text drawn in the current frame, in order
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rounded rectangles drawn in the current frame, in order
    #[must_use]
    pub fn rounded_rects(&self) -> Vec<(Rect, Color)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillRoundedRect { rect, color, .. } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    /// Fill colour of the rounded rectangle drawn at `origin`, if any
    #[must_use]
    pub fn fill_at(&self, origin: Point) -> Option<Color> {
        self.rounded_rects()
            .into_iter()
            .rev()
            .find(|(rect, _)| {
                (rect.x - origin.x).abs() < 1e-9 && (rect.y - origin.y).abs() < 1e-9
            })
            .map(|(_, color)| color)
    }

    /// Position of the first call matching the predicate
    pub fn position(&self, predicate: impl Fn(&DrawCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.calls.clear();
        self.frames += 1;
        self.calls.push(DrawCall::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        self.calls.push(DrawCall::FillRoundedRect {
            rect,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        self.calls.push(DrawCall::StrokeLine {
            from,
            to,
            width,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        self.calls.push(DrawCall::FillText {
            text: text.to_string(),
            at,
            style,
        });
    }
}
