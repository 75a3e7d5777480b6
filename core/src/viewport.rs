//! Pan/zoom state and pointer-input handling.
//!
//! The [`Viewport`] maps world coordinates to device coordinates as
//! `device = world * scale + pan`. The [`ViewportController`] turns pointer
//! and wheel input into viewport mutations or seat-toggle requests.

use crate::geometry::GeometryModel;
use crate::render::hit_test;
use crate::types::{Point, SeatId};

/// Smallest permitted zoom
pub const MIN_SCALE: f64 = 0.2;

/// Largest permitted zoom
pub const MAX_SCALE: f64 = 3.0;

/// Pan offset restored by a reset
pub const DEFAULT_PAN: Point = Point::new(50.0, 50.0);

/// Wheel zoom factor when scrolling down
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Wheel zoom factor when scrolling up
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Zoom factor of the explicit zoom-in action
pub const BUTTON_ZOOM_IN: f64 = 1.2;

/// Zoom factor of the explicit zoom-out action
pub const BUTTON_ZOOM_OUT: f64 = 0.8;

/// Pan offset and zoom scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f64,
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: DEFAULT_PAN,
        }
    }
}

impl Viewport {
    /// Creates a viewport; the scale is clamped to `[MIN_SCALE, MAX_SCALE]`
    #[must_use]
    pub fn new(scale: f64, pan: Point) -> Self {
        Self {
            scale: clamp_scale(scale),
            pan,
        }
    }

    /// Current zoom
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Current pan offset in device pixels
    #[must_use]
    pub const fn pan(&self) -> Point {
        self.pan
    }

    /// Move the pan offset (unbounded)
    pub const fn set_pan(&mut self, pan: Point) {
        self.pan = pan;
    }

    /// Multiply the scale by `factor`, then clamp
    pub fn zoom_by(&mut self, factor: f64) {
        self.scale = clamp_scale(self.scale * factor);
    }

    /// Restore scale 1.0 and the default pan
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Map a device point into world space (subtract pan, divide by scale)
    #[must_use]
    pub fn to_world(&self, device: Point) -> Point {
        Point::new(
            (device.x - self.pan.x) / self.scale,
            (device.y - self.pan.y) / self.scale,
        )
    }

    /// Map a world point into device space
    #[must_use]
    pub fn to_device(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.pan.x,
            world.y * self.scale + self.pan.y,
        )
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Result of feeding one input event to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Nothing changed
    Unchanged,
    /// The viewport changed; the frame must be redrawn
    Redraw,
    /// A selectable seat was clicked
    ToggleSeat(SeatId),
}

/// Owns the viewport and the in-progress pan gesture.
#[derive(Clone, Debug, Default)]
pub struct ViewportController {
    viewport: Viewport,
    pan_anchor: Option<Point>,
}

impl ViewportController {
    /// Creates a controller around a viewport
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pan_anchor: None,
        }
    }

    /// Current viewport
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Whether a pan gesture is in progress
    #[must_use]
    pub const fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// Pointer pressed.
    ///
    /// Hit-tests first: a click on a selectable seat yields
    /// [`InputOutcome::ToggleSeat`] and never starts a pan. Anything else
    /// starts a pan gesture anchored at the pointer.
    pub fn pointer_down(
        &mut self,
        device: Point,
        geometry: &GeometryModel,
        is_selectable: impl Fn(&SeatId) -> bool,
    ) -> InputOutcome {
        if let Some(seat) = hit_test(geometry, &self.viewport, device) {
            let seat_id = seat.seat_id();
            if is_selectable(&seat_id) {
                return InputOutcome::ToggleSeat(seat_id);
            }
        }
        self.pan_anchor = Some(device - self.viewport.pan);
        InputOutcome::Unchanged
    }

    /// Pointer moved; pans while a gesture is in progress
    pub fn pointer_move(&mut self, device: Point) -> InputOutcome {
        let Some(anchor) = self.pan_anchor else {
            return InputOutcome::Unchanged;
        };
        self.viewport.set_pan(device - anchor);
        InputOutcome::Redraw
    }

    /// Pointer released; ends any pan gesture
    pub const fn pointer_up(&mut self) -> InputOutcome {
        self.pan_anchor = None;
        InputOutcome::Unchanged
    }

    /// Wheel scrolled. Positive `delta_y` scrolls down (zoom out).
    pub fn wheel(&mut self, delta_y: f64) -> InputOutcome {
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_OUT
        } else if delta_y < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            return InputOutcome::Unchanged;
        };
        self.viewport.zoom_by(factor);
        InputOutcome::Redraw
    }

    /// Explicit zoom-in action
    pub fn zoom_in(&mut self) -> InputOutcome {
        self.viewport.zoom_by(BUTTON_ZOOM_IN);
        InputOutcome::Redraw
    }

    /// Explicit zoom-out action
    pub fn zoom_out(&mut self) -> InputOutcome {
        self.viewport.zoom_by(BUTTON_ZOOM_OUT);
        InputOutcome::Redraw
    }

    /// Restore the default view
    pub fn reset(&mut self) -> InputOutcome {
        self.viewport.reset();
        self.pan_anchor = None;
        InputOutcome::Redraw
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Area, Element, Seat};
    use crate::types::VenueId;
    use proptest::prelude::*;

    fn venue() -> GeometryModel {
        GeometryModel::new(
            VenueId::from("v"),
            Vec::new(),
            vec![
                Element::Section(Area {
                    id: None,
                    x: 0.0,
                    y: 0.0,
                    width: 500.0,
                    height: 500.0,
                    label: None,
                    color: None,
                }),
                Element::Seat(Seat {
                    id: "A-1".into(),
                    x: 100.0,
                    y: 100.0,
                    size: 20.0,
                    category_id: None,
                    number: None,
                }),
            ],
        )
    }

    #[test]
    fn test_fifty_zoom_ins_end_at_max_scale() {
        let mut controller = ViewportController::default();
        for _ in 0..50 {
            controller.zoom_in();
        }
        assert_eq!(controller.viewport().scale(), MAX_SCALE);
    }

    #[test]
    fn test_wheel_direction() {
        let mut controller = ViewportController::default();
        controller.wheel(120.0);
        assert!((controller.viewport().scale() - 0.9).abs() < 1e-9);
        controller.wheel(-120.0);
        assert!((controller.viewport().scale() - 0.99).abs() < 1e-9);
        assert_eq!(controller.wheel(0.0), InputOutcome::Unchanged);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut controller = ViewportController::new(Viewport::new(2.5, Point::new(-300.0, 90.0)));
        assert_eq!(controller.reset(), InputOutcome::Redraw);
        assert_eq!(controller.viewport().scale(), 1.0);
        assert_eq!(controller.viewport().pan(), DEFAULT_PAN);
    }

    #[test]
    fn test_world_device_round_trip() {
        let viewport = Viewport::new(2.0, Point::new(10.0, -5.0));
        let world = Point::new(7.0, 3.0);
        let device = viewport.to_device(world);
        assert_eq!(device, Point::new(24.0, 1.0));
        assert_eq!(viewport.to_world(device), world);
    }

    #[test]
    fn test_click_on_selectable_seat_toggles_without_panning() {
        let geometry = venue();
        let mut controller = ViewportController::new(Viewport::new(1.0, Point::new(0.0, 0.0)));

        let outcome = controller.pointer_down(Point::new(110.0, 110.0), &geometry, |_| true);

        assert_eq!(outcome, InputOutcome::ToggleSeat(SeatId::from("A-1")));
        assert!(!controller.is_panning());
        assert_eq!(controller.pointer_move(Point::new(200.0, 200.0)), InputOutcome::Unchanged);
    }

    #[test]
    fn test_click_on_unselectable_seat_starts_pan() {
        let geometry = venue();
        let mut controller = ViewportController::new(Viewport::new(1.0, Point::new(0.0, 0.0)));

        let outcome = controller.pointer_down(Point::new(110.0, 110.0), &geometry, |_| false);
        assert_eq!(outcome, InputOutcome::Unchanged);
        assert!(controller.is_panning());
    }

    #[test]
    fn test_pan_follows_pointer_from_anchor() {
        let geometry = venue();
        let mut controller = ViewportController::new(Viewport::new(1.0, Point::new(20.0, 30.0)));

        controller.pointer_down(Point::new(400.0, 400.0), &geometry, |_| true);
        assert_eq!(controller.pointer_move(Point::new(450.0, 380.0)), InputOutcome::Redraw);
        assert_eq!(controller.viewport().pan(), Point::new(70.0, 10.0));

        // Unbounded panning.
        controller.pointer_move(Point::new(-10_000.0, -10_000.0));
        assert_eq!(controller.viewport().pan(), Point::new(-10_380.0, -10_370.0));

        controller.pointer_up();
        assert!(!controller.is_panning());
    }

    #[derive(Debug, Clone, Copy)]
    enum ZoomOp {
        WheelDown,
        WheelUp,
        ZoomIn,
        ZoomOut,
        Reset,
    }

    proptest! {
        #[test]
        fn prop_scale_stays_within_bounds(ops in prop::collection::vec(
            prop_oneof![
                Just(ZoomOp::WheelDown),
                Just(ZoomOp::WheelUp),
                Just(ZoomOp::ZoomIn),
                Just(ZoomOp::ZoomOut),
                Just(ZoomOp::Reset),
            ],
            0..200,
        )) {
            let mut controller = ViewportController::default();
            for op in ops {
                match op {
                    ZoomOp::WheelDown => { controller.wheel(1.0); }
                    ZoomOp::WheelUp => { controller.wheel(-1.0); }
                    ZoomOp::ZoomIn => { controller.zoom_in(); }
                    ZoomOp::ZoomOut => { controller.zoom_out(); }
                    ZoomOp::Reset => { controller.reset(); }
                }
                let scale = controller.viewport().scale();
                prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&scale));
            }
        }

        #[test]
        fn prop_constructor_clamps(scale in -10.0f64..10.0) {
            let viewport = Viewport::new(scale, Point::default());
            prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&viewport.scale()));
        }
    }
}
