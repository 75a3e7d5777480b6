//! SVG serialisation of a frame.

use super::surface::{Surface, TextAlign, TextStyle};
use crate::types::{Color, Point, Rect};

/// A [`Surface`] that accumulates SVG elements.
#[derive(Clone, Debug)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: Vec<String>,
}

impl SvgSurface {
    /// Creates an empty surface of the given size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: Vec::new(),
        }
    }

    /// Number of SVG elements written so far
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.body.len()
    }

    /// Produce the SVG document
    #[must_use]
    pub fn to_document(&self) -> String {
        let mut document = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(self.width),
            h = fmt_num(self.height),
        );
        document.push('\n');
        for element in &self.body {
            document.push_str("  ");
            document.push_str(element);
            document.push('\n');
        }
        document.push_str("</svg>\n");
        document
    }
}

impl Surface for SvgSurface {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.body.clear();
        self.body.push(format!(
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{color}"/>"#,
            fmt_num(self.width),
            fmt_num(self.height),
        ));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.body.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{color}"/>"#,
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
        ));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Color) {
        self.body.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="{color}"/>"#,
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
            r = fmt_num(radius),
        ));
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        self.body.push(format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-width="{}"/>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y),
            fmt_num(width),
        ));
    }

    fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) {
        let anchor = match style.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
        };
        self.body.push(format!(
            r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{anchor}" dominant-baseline="central">{}</text>"#,
            fmt_num(at.x),
            fmt_num(at.y),
            fmt_num(style.size),
            style.color,
            escape(text),
        ));
    }
}

fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
