//! Projection of venue geometry and occupancy onto a drawing surface.
//!
//! [`RenderEngine::render`] is a pure function of geometry, occupancy,
//! selection and viewport: it keeps no state between frames and may be called
//! as often as the caller likes.
//!
//! # Draw order
//!
//! ```text
//! background + grid → stage → sections (then outlines) → seats
//! ```
//!
//! Seats are always drawn last so nothing occludes them.
//!
//! # Seat colours
//!
//! | Condition                         | Colour            |
//! |-----------------------------------|-------------------|
//! | `sold`                            | gray              |
//! | `held` by someone else            | amber             |
//! | in the local selection            | green             |
//! | otherwise                         | category or blue  |
//!
//! A hold owned by this viewer is represented by selection membership, so it
//! renders green rather than amber.

mod surface;
mod svg;

pub use surface::{Surface, TextAlign, TextStyle};
pub use svg::SvgSurface;

use crate::geometry::{Area, Category, Element, ElementType, GeometryModel, Polygon, Seat};
use crate::occupancy::OccupancyStore;
use crate::selection::Selection;
use crate::types::{Color, Point, Rect, SeatId, SeatStatus};
use crate::viewport::Viewport;

/// Minimum scale at which labels and checkmarks are drawn
pub const DEFAULT_LABEL_MIN_SCALE: f64 = 0.7;

/// Grid spacing in world units
pub const DEFAULT_GRID_SPACING: f64 = 50.0;

/// Glyph drawn on selected seats
pub const CHECKMARK: &str = "✓";

/// Colours used by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Surface background
    pub background: Color,
    /// Grid lines
    pub grid: Color,
    /// Stage fill
    pub stage: Color,
    /// Section fill (unless overridden by the document)
    pub section: Color,
    /// Outline stroke (unless overridden by the document)
    pub outline: Color,
    /// Text on stage
    pub stage_text: Color,
    /// Text on sections and outlines
    pub area_text: Color,
    /// Seat labels and checkmarks
    pub seat_text: Color,
    /// Sold seats
    pub sold: Color,
    /// Seats held by someone else
    pub held: Color,
    /// Seats in the local selection
    pub selected: Color,
    /// Seats without a resolvable category colour
    pub default_seat: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::rgb(0xf8, 0xfa, 0xfc),
            grid: Color::rgb(0xe2, 0xe8, 0xf0),
            stage: Color::rgb(0x1f, 0x29, 0x37),
            section: Color::rgb(0xe5, 0xe7, 0xeb),
            outline: Color::rgb(0x64, 0x74, 0x8b),
            stage_text: Color::rgb(0xff, 0xff, 0xff),
            area_text: Color::rgb(0x37, 0x41, 0x51),
            seat_text: Color::rgb(0xff, 0xff, 0xff),
            sold: Color::rgb(0x9c, 0xa3, 0xaf),
            held: Color::rgb(0xf5, 0x9e, 0x0b),
            selected: Color::rgb(0x10, 0xb9, 0x81),
            default_seat: Color::rgb(0x3b, 0x82, 0xf6),
        }
    }
}

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Labels and checkmarks are drawn only at or above this scale
    pub label_min_scale: f64,
    /// Grid spacing in world units
    pub grid_spacing: f64,
    /// Whether to draw the background grid
    pub show_grid: bool,
    /// Seat corner radius as a fraction of the seat size
    pub seat_corner_ratio: f64,
    /// Colours
    pub theme: Theme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            label_min_scale: DEFAULT_LABEL_MIN_SCALE,
            grid_spacing: DEFAULT_GRID_SPACING,
            show_grid: true,
            seat_corner_ratio: 0.2,
            theme: Theme::default(),
        }
    }
}

/// What a render pass drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Stage elements drawn
    pub stages: usize,
    /// Section elements drawn
    pub sections: usize,
    /// Outlines drawn
    pub outlines: usize,
    /// Seats drawn
    pub seats: usize,
    /// Labels and checkmarks drawn
    pub glyphs: usize,
}

/// Draws frames. Holds configuration only.
#[derive(Clone, Debug, Default)]
pub struct RenderEngine {
    options: RenderOptions,
}

impl RenderEngine {
    /// Creates an engine with the given options
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Engine configuration
    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Draw one frame.
    pub fn render<S: Surface + ?Sized>(
        &self,
        geometry: &GeometryModel,
        occupancy: &OccupancyStore,
        selection: &Selection,
        viewport: &Viewport,
        surface: &mut S,
    ) -> FrameStats {
        let theme = &self.options.theme;
        let mut stats = FrameStats::default();
        let glyphs = viewport.scale() >= self.options.label_min_scale;

        surface.clear(theme.background);
        if self.options.show_grid {
            self.draw_grid(viewport, surface);
        }

        for element in geometry.elements_of_type(ElementType::Stage) {
            if let Element::Stage(area) = element {
                if draw_area(area, Corners::Square, theme.stage, theme.stage_text, glyphs, viewport, surface) {
                    stats.stages += 1;
                }
            }
        }

        for element in geometry.elements_of_type(ElementType::Section) {
            if let Element::Section(area) = element {
                let fill = area
                    .color
                    .as_deref()
                    .and_then(Color::from_hex)
                    .unwrap_or(theme.section);
                if draw_area(area, Corners::Rounded, fill, theme.area_text, glyphs, viewport, surface) {
                    stats.sections += 1;
                }
            }
        }

        for element in geometry.elements_of_type(ElementType::Polygon) {
            if let Element::Polygon(polygon) = element {
                draw_outline(polygon, theme, glyphs, viewport, surface);
                stats.outlines += 1;
            }
        }

        for seat in geometry.seats() {
            let rect = device_rect(seat.bounds(), viewport);
            if !is_visible(rect, surface) {
                continue;
            }
            let seat_id = seat.seat_id();
            let selected = selection.contains(&seat_id);
            let category = seat.category().and_then(|id| geometry.category(&id));
            let color = resolve_seat_color(
                occupancy.status_of(&seat_id),
                selected,
                category,
                theme,
            );

            surface.fill_rounded_rect(rect, rect.width * self.options.seat_corner_ratio, color);
            stats.seats += 1;

            if glyphs && draw_seat_glyph(seat, selected, rect, theme, surface) {
                stats.glyphs += 1;
            }
        }

        tracing::trace!(
            seats = stats.seats,
            glyphs = stats.glyphs,
            scale = viewport.scale(),
            "Frame rendered"
        );
        stats
    }

    fn draw_grid<S: Surface + ?Sized>(&self, viewport: &Viewport, surface: &mut S) {
        let step = self.options.grid_spacing * viewport.scale();
        // Too dense to be useful (and too many lines to draw).
        if step < 4.0 {
            return;
        }
        let (width, height) = (surface.width(), surface.height());
        let color = self.options.theme.grid;

        let mut x = viewport.pan().x.rem_euclid(step);
        while x <= width {
            surface.stroke_line(Point::new(x, 0.0), Point::new(x, height), 1.0, color);
            x += step;
        }
        let mut y = viewport.pan().y.rem_euclid(step);
        while y <= height {
            surface.stroke_line(Point::new(0.0, y), Point::new(width, y), 1.0, color);
            y += step;
        }
    }
}

/// Colour of a seat, in priority order: sold, held by someone else, selected,
/// category colour, default blue.
#[must_use]
pub fn resolve_seat_color(
    status: SeatStatus,
    selected: bool,
    category: Option<&Category>,
    theme: &Theme,
) -> Color {
    match (status, selected) {
        (SeatStatus::Sold, _) => theme.sold,
        (SeatStatus::Held, false) => theme.held,
        (SeatStatus::Held | SeatStatus::Free, true) => theme.selected,
        (SeatStatus::Free, false) => category
            .and_then(Category::parsed_color)
            .unwrap_or(theme.default_seat),
    }
}

/// Find the seat under a device point.
///
/// The point is inverse-transformed through the viewport, then the first seat
/// (in document order) whose `size × size` box contains it is returned.
/// Sections, the stage and outlines are never hit.
#[must_use]
pub fn hit_test<'a>(
    geometry: &'a GeometryModel,
    viewport: &Viewport,
    device: Point,
) -> Option<&'a Seat> {
    let world = viewport.to_world(device);
    geometry.seats().find(|seat| seat.bounds().contains(world))
}

/// Convenience wrapper returning only the seat id
#[must_use]
pub fn hit_test_id(geometry: &GeometryModel, viewport: &Viewport, device: Point) -> Option<SeatId> {
    hit_test(geometry, viewport, device).map(Seat::seat_id)
}

fn device_rect(world: Rect, viewport: &Viewport) -> Rect {
    let origin = viewport.to_device(Point::new(world.x, world.y));
    Rect::new(
        origin.x,
        origin.y,
        world.width * viewport.scale(),
        world.height * viewport.scale(),
    )
}

fn is_visible<S: Surface + ?Sized>(rect: Rect, surface: &S) -> bool {
    rect.x + rect.width >= 0.0
        && rect.y + rect.height >= 0.0
        && rect.x <= surface.width()
        && rect.y <= surface.height()
}

/// Corner style of a filled area; the stage is square, sections are rounded.
#[derive(Clone, Copy)]
enum Corners {
    Square,
    Rounded,
}

fn draw_area<S: Surface + ?Sized>(
    area: &Area,
    corners: Corners,
    fill: Color,
    text: Color,
    glyphs: bool,
    viewport: &Viewport,
    surface: &mut S,
) -> bool {
    let rect = device_rect(area.bounds(), viewport);
    if !is_visible(rect, surface) {
        return false;
    }
    match corners {
        Corners::Square => surface.fill_rect(rect, fill),
        Corners::Rounded => surface.fill_rounded_rect(rect, 8.0 * viewport.scale(), fill),
    }
    if glyphs {
        if let Some(label) = area.label.as_deref().filter(|l| !l.is_empty()) {
            let size = (rect.height * 0.3).clamp(8.0, 32.0);
            surface.fill_text(
                label,
                rect.center(),
                TextStyle {
                    size,
                    color: text,
                    align: TextAlign::Center,
                },
            );
        }
    }
    true
}

fn draw_outline<S: Surface + ?Sized>(
    polygon: &Polygon,
    theme: &Theme,
    glyphs: bool,
    viewport: &Viewport,
    surface: &mut S,
) {
    let color = polygon
        .color
        .as_deref()
        .and_then(Color::from_hex)
        .unwrap_or(theme.outline);
    let points: Vec<Point> = polygon.points.iter().map(|p| viewport.to_device(*p)).collect();
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        surface.stroke_line(pair[0], pair[1], 2.0, color);
    }
    if points.len() > 2 {
        surface.stroke_line(points[points.len() - 1], points[0], 2.0, color);
    }
    if glyphs {
        if let Some(label) = polygon.label.as_deref() {
            surface.fill_text(
                label,
                points[0],
                TextStyle {
                    size: 12.0,
                    color: theme.area_text,
                    align: TextAlign::Left,
                },
            );
        }
    }
}

fn draw_seat_glyph<S: Surface + ?Sized>(
    seat: &Seat,
    selected: bool,
    rect: Rect,
    theme: &Theme,
    surface: &mut S,
) -> bool {
    let (text, ratio) = if selected {
        (CHECKMARK, 0.7)
    } else if let Some(number) = seat.number.as_deref() {
        (number, 0.5)
    } else {
        return false;
    };
    surface.fill_text(
        text,
        rect.center(),
        TextStyle {
            size: rect.width * ratio,
            color: theme.seat_text,
            align: TextAlign::Center,
        },
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(color: &str) -> Category {
        Category {
            id: "c".into(),
            name: "C".into(),
            color: color.into(),
        }
    }

    #[test]
    fn test_color_priority() {
        let theme = Theme::default();
        let vip = category("#aa00ff");

        assert_eq!(resolve_seat_color(SeatStatus::Sold, true, Some(&vip), &theme), theme.sold);
        assert_eq!(resolve_seat_color(SeatStatus::Held, false, Some(&vip), &theme), theme.held);
        assert_eq!(resolve_seat_color(SeatStatus::Held, true, Some(&vip), &theme), theme.selected);
        assert_eq!(resolve_seat_color(SeatStatus::Free, true, Some(&vip), &theme), theme.selected);
        assert_eq!(
            resolve_seat_color(SeatStatus::Free, false, Some(&vip), &theme),
            Color::rgb(0xaa, 0x00, 0xff)
        );
    }

    #[test]
    fn test_unresolvable_category_falls_back_to_blue() {
        let theme = Theme::default();
        assert_eq!(resolve_seat_color(SeatStatus::Free, false, None, &theme), theme.default_seat);
        assert_eq!(
            resolve_seat_color(SeatStatus::Free, false, Some(&category("teal")), &theme),
            theme.default_seat
        );
    }
}
