//! Venue documents and models for tests.
//!
//! The sample venue (world units, default viewport maps `(x, y)` to
//! `(x + 50, y + 50)` on the device):
//!
//! ```text
//! stage    (80, 10)  160×40   "Stage"
//! section  (80, 80)  160×60   "Stalls"
//! outline  (70, 0) → (250, 0) → (250, 150) → (70, 150)
//! seats    A-1 (100,100) vip   A-2 (130,100) vip
//!          A-3 (160,100) std   A-4 (190,100) uncategorized
//! ```

use seatmap_core::geometry::{Element, GeometryModel, Seat};
use seatmap_core::types::VenueId;
use serde_json::{json, Value};
use std::sync::Arc;

/// Category colour of the `vip` category
pub const VIP_COLOR: &str = "#aa00ff";

/// Category colour of the `std` category
pub const STD_COLOR: &str = "#00aaff";

/// The sample venue in the flat document shape
#[must_use]
pub fn flat_venue_json() -> Value {
    json!({
        "venue_id": "sample-hall",
        "categories": [
            { "id": "vip", "name": "VIP", "color": VIP_COLOR },
            { "id": "std", "name": "Standard", "color": STD_COLOR }
        ],
        "elements": [
            { "type": "stage", "x": 80, "y": 10, "width": 160, "height": 40, "label": "Stage" },
            { "type": "section", "x": 80, "y": 80, "width": 160, "height": 60, "label": "Stalls" },
            {
                "type": "polygon",
                "points": [
                    { "x": 70, "y": 0 }, { "x": 250, "y": 0 },
                    { "x": 250, "y": 150 }, { "x": 70, "y": 150 }
                ],
                "label": "Hall"
            },
            { "type": "seat", "id": "A-1", "x": 100, "y": 100, "size": 20, "categoryId": "vip", "number": 1 },
            { "type": "seat", "id": "A-2", "x": 130, "y": 100, "size": 20, "categoryId": "vip", "number": 2 },
            { "type": "seat", "id": "A-3", "x": 160, "y": 100, "size": 20, "categoryId": "std", "number": 3 },
            { "type": "seat", "id": "A-4", "x": 190, "y": 100, "size": 20, "number": 4 }
        ]
    })
}

/// The sample venue wrapped in `canvas_data`
#[must_use]
pub fn nested_venue_json() -> Value {
    let flat = flat_venue_json();
    json!({
        "venue_id": flat["venue_id"].clone(),
        "canvas_data": {
            "categories": flat["categories"].clone(),
            "elements": flat["elements"].clone(),
        }
    })
}

/// The sample venue as a model
///
/// # Panics
///
/// Panics if the fixture document fails to load, which would be a bug in the
/// fixture itself.
#[must_use]
#[allow(clippy::expect_used)]
pub fn sample_venue() -> GeometryModel {
    GeometryModel::load(&flat_venue_json()).expect("sample venue fixture loads")
}

/// The sample venue behind an `Arc`, as the reducer state holds it
#[must_use]
pub fn sample_venue_arc() -> Arc<GeometryModel> {
    Arc::new(sample_venue())
}

/// A `rows × cols` grid of 20-unit seats on a 30-unit pitch, starting at
/// the world origin. Seat ids are `R{row}-{col}`.
#[must_use]
pub fn grid_venue(rows: usize, cols: usize) -> GeometryModel {
    let mut elements = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (col as f64 * 30.0, row as f64 * 30.0);
            elements.push(Element::Seat(Seat {
                id: format!("R{row}-{col}"),
                x,
                y,
                size: 20.0,
                category_id: None,
                number: Some((col + 1).to_string()),
            }));
        }
    }
    GeometryModel::new(VenueId::from("grid"), Vec::new(), elements)
}
