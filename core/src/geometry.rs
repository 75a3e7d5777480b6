//! Venue geometry: categories and positioned elements.
//!
//! A [`GeometryModel`] is loaded once per venue and is read-only afterwards.
//! Venue documents arrive in one of two equivalent shapes:
//!
//! ```json
//! { "categories": [...], "elements": [...] }
//! { "canvas_data": { "categories": [...], "elements": [...] } }
//! ```
//!
//! [`VenueShape::detect`] decides which shape a document has, and
//! [`GeometryModel::load`] normalizes either one into the same model.

use crate::types::{CategoryId, Color, Point, Rect, SeatId, VenueId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Seat size used when a document omits one
pub const DEFAULT_SEAT_SIZE: f64 = 20.0;

/// Errors raised while loading a venue document.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// The document matches neither recognized shape, or an element is unusable
    #[error("Malformed venue document: {reason}")]
    MalformedVenue {
        /// What was wrong with the document
        reason: String,
    },

    /// The document text is not JSON at all
    #[error("Venue document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeometryError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedVenue {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Model types
// ============================================================================

/// Styling and grouping metadata for seats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier referenced by seats
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Colour as written in the document (`#rrggbb`)
    #[serde(default)]
    pub color: String,
}

impl Category {
    /// Category identifier
    #[must_use]
    pub fn category_id(&self) -> CategoryId {
        CategoryId::new(self.id.clone())
    }

    /// Parsed colour, if the document's value is a valid hex colour
    #[must_use]
    pub fn parsed_color(&self) -> Option<Color> {
        Color::from_hex(&self.color)
    }
}

/// A selectable seat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Seat identifier, unique within the venue
    #[serde(deserialize_with = "flexible_string")]
    pub id: String,
    /// Left edge in world units
    pub x: f64,
    /// Top edge in world units
    pub y: f64,
    /// Edge length of the seat's square
    #[serde(default = "default_seat_size")]
    pub size: f64,
    /// Category the seat belongs to
    #[serde(
        default,
        alias = "category_id",
        deserialize_with = "flexible_optional_string"
    )]
    pub category_id: Option<String>,
    /// Seat number shown as its label
    #[serde(default, deserialize_with = "flexible_optional_string")]
    pub number: Option<String>,
}

impl Seat {
    /// Seat identifier
    #[must_use]
    pub fn seat_id(&self) -> SeatId {
        SeatId::new(self.id.clone())
    }

    /// Category identifier, if any
    #[must_use]
    pub fn category(&self) -> Option<CategoryId> {
        self.category_id.clone().map(CategoryId::new)
    }

    /// Axis-aligned `size × size` box in world units
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }
}

/// A labelled rectangular region (sections and the stage).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Optional identifier
    #[serde(default, deserialize_with = "flexible_optional_string")]
    pub id: Option<String>,
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
    /// Label drawn in the area
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    /// Fill colour override
    #[serde(default)]
    pub color: Option<String>,
}

impl Area {
    /// Bounds in world units
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A free-form outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Optional identifier
    #[serde(default, deserialize_with = "flexible_optional_string")]
    pub id: Option<String>,
    /// Vertices in drawing order; the outline is closed implicitly
    pub points: Vec<Point>,
    /// Label drawn at the first vertex
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    /// Stroke colour override
    #[serde(default)]
    pub color: Option<String>,
}

/// Discriminant of [`Element`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// A seat
    Seat,
    /// A seating section
    Section,
    /// The stage
    Stage,
    /// A free-form outline
    Polygon,
}

impl ElementType {
    /// Name as used in the `type` field of venue documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seat => "seat",
            Self::Section => "section",
            Self::Stage => "stage",
            Self::Polygon => "polygon",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "seat" => Some(Self::Seat),
            "section" => Some(Self::Section),
            "stage" => Some(Self::Stage),
            "polygon" => Some(Self::Polygon),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned piece of venue geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// A seat (the only element with occupancy)
    Seat(Seat),
    /// A seating section
    Section(Area),
    /// The stage
    Stage(Area),
    /// A free-form outline
    Polygon(Polygon),
}

impl Element {
    /// The element's discriminant
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Seat(_) => ElementType::Seat,
            Self::Section(_) => ElementType::Section,
            Self::Stage(_) => ElementType::Stage,
            Self::Polygon(_) => ElementType::Polygon,
        }
    }

    /// The seat, if this element is one
    #[must_use]
    pub const fn as_seat(&self) -> Option<&Seat> {
        match self {
            Self::Seat(seat) => Some(seat),
            _ => None,
        }
    }
}

// ============================================================================
// Document shapes
// ============================================================================

/// The two accepted venue document layouts.
#[derive(Debug, Clone, Copy)]
pub enum VenueShape<'a> {
    /// `{ "categories": [...], "elements": [...] }`
    Flat(&'a Value),
    /// `{ "canvas_data": { "categories": [...], "elements": [...] } }`
    Nested(&'a Value),
}

impl<'a> VenueShape<'a> {
    /// Decide which shape a document has.
    ///
    /// A `canvas_data` wrapper wins when both are present.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MalformedVenue`] if the document is not an
    /// object, or neither shape carries an `elements` array.
    pub fn detect(document: &'a Value) -> Result<Self, GeometryError> {
        let object = document
            .as_object()
            .ok_or_else(|| GeometryError::malformed("document is not a JSON object"))?;

        if let Some(canvas) = object.get("canvas_data") {
            if canvas.get("elements").is_some_and(Value::is_array) {
                return Ok(Self::Nested(canvas));
            }
            return Err(GeometryError::malformed(
                "canvas_data is present but has no elements array",
            ));
        }

        if object.get("elements").is_some_and(Value::is_array) {
            return Ok(Self::Flat(document));
        }

        Err(GeometryError::malformed(
            "expected either `elements`/`categories` or a `canvas_data` wrapper",
        ))
    }

    /// The object holding `categories` and `elements`
    #[must_use]
    pub const fn canvas(self) -> &'a Value {
        match self {
            Self::Flat(canvas) | Self::Nested(canvas) => canvas,
        }
    }
}

// ============================================================================
// GeometryModel
// ============================================================================

/// Immutable description of a venue.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryModel {
    venue_id: VenueId,
    categories: HashMap<CategoryId, Category>,
    elements: Vec<Element>,
    seat_index: HashMap<SeatId, usize>,
}

impl GeometryModel {
    /// Build a model directly from parts.
    #[must_use]
    pub fn new(venue_id: VenueId, categories: Vec<Category>, elements: Vec<Element>) -> Self {
        let categories = categories
            .into_iter()
            .map(|category| (category.category_id(), category))
            .collect();

        // Later seats reusing an id are dropped.
        let mut seat_index = HashMap::new();
        let mut kept = Vec::with_capacity(elements.len());
        for element in elements {
            if let Element::Seat(seat) = &element {
                let seat_id = seat.seat_id();
                if seat_index.contains_key(&seat_id) {
                    tracing::warn!(seat_id = %seat_id, "Duplicate seat id in venue; first occurrence wins");
                    continue;
                }
                seat_index.insert(seat_id, kept.len());
            }
            kept.push(element);
        }

        Self {
            venue_id,
            categories,
            elements: kept,
            seat_index,
        }
    }

    /// Parse a venue document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Json`] for invalid JSON and
    /// [`GeometryError::MalformedVenue`] for an unrecognized document.
    pub fn from_json(text: &str) -> Result<Self, GeometryError> {
        let document: Value = serde_json::from_str(text)?;
        Self::load(&document)
    }

    /// Load a venue document in either accepted shape.
    ///
    /// The venue id is read from `venue_id`, `venueId` or `id` at the top
    /// level, then inside the canvas. Elements with an unknown `type` are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MalformedVenue`] if neither shape is present or
    /// an element of a known type cannot be decoded. No partial model is
    /// returned.
    pub fn load(document: &Value) -> Result<Self, GeometryError> {
        let shape = VenueShape::detect(document)?;
        let canvas = shape.canvas();

        let venue_id = venue_id_of(document)
            .or_else(|| venue_id_of(canvas))
            .unwrap_or_default();

        let categories = match canvas.get("categories") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => Vec::<Category>::deserialize(value).map_err(|e| {
                GeometryError::malformed(format!("categories could not be decoded: {e}"))
            })?,
        };

        let raw_elements = canvas
            .get("elements")
            .and_then(Value::as_array)
            .ok_or_else(|| GeometryError::malformed("elements is not an array"))?;

        let mut elements = Vec::with_capacity(raw_elements.len());
        for (index, raw) in raw_elements.iter().enumerate() {
            let Some(tag) = raw.get("type").and_then(Value::as_str) else {
                return Err(GeometryError::malformed(format!(
                    "element {index} has no type"
                )));
            };
            if ElementType::parse(tag).is_none() {
                tracing::warn!(index, element_type = tag, "Skipping element of unknown type");
                continue;
            }
            let element = Element::deserialize(raw).map_err(|e| {
                GeometryError::malformed(format!("element {index} ({tag}) is invalid: {e}"))
            })?;
            elements.push(element);
        }

        let model = Self::new(venue_id, categories, elements);
        tracing::debug!(
            venue_id = %model.venue_id,
            shape = match shape {
                VenueShape::Flat(_) => "flat",
                VenueShape::Nested(_) => "nested",
            },
            elements = model.elements.len(),
            seats = model.seat_count(),
            categories = model.categories.len(),
            "Venue geometry loaded"
        );
        Ok(model)
    }

    /// Venue identifier
    #[must_use]
    pub const fn venue_id(&self) -> &VenueId {
        &self.venue_id
    }

    /// All elements in document order
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements of one type, in document order.
    ///
    /// The iterator is lazy and `Clone`, so it can be restarted.
    pub fn elements_of_type(
        &self,
        element_type: ElementType,
    ) -> impl Iterator<Item = &Element> + Clone + '_ {
        self.elements
            .iter()
            .filter(move |element| element.element_type() == element_type)
    }

    /// Seats in document order
    pub fn seats(&self) -> impl Iterator<Item = &Seat> + Clone + '_ {
        self.elements.iter().filter_map(Element::as_seat)
    }

    /// Number of seats declared by the layout
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seat_index.len()
    }

    /// Look up a seat by id
    #[must_use]
    pub fn seat(&self, seat_id: &SeatId) -> Option<&Seat> {
        self.seat_index
            .get(seat_id)
            .and_then(|&index| self.elements.get(index))
            .and_then(Element::as_seat)
    }

    /// Look up a category; `None` when the id does not resolve
    #[must_use]
    pub fn category(&self, category_id: &CategoryId) -> Option<&Category> {
        self.categories.get(category_id)
    }

    /// All categories, unordered
    #[must_use]
    pub const fn categories(&self) -> &HashMap<CategoryId, Category> {
        &self.categories
    }
}

fn venue_id_of(value: &Value) -> Option<VenueId> {
    ["venue_id", "venueId", "id"]
        .iter()
        .find_map(|key| match value.get(*key)? {
            Value::String(s) => Some(VenueId::new(s.clone())),
            Value::Number(n) => Some(VenueId::new(n.to_string())),
            _ => None,
        })
}

const fn default_seat_size() -> f64 {
    DEFAULT_SEAT_SIZE
}

/// Identifiers and labels show up as either strings or numbers in venue documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn flexible_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat_document() -> Value {
        json!({
            "venue_id": "hall-1",
            "categories": [
                { "id": "vip", "name": "VIP", "color": "#aa00ff" },
                { "id": 2, "name": "Standard", "color": "#00aaff" }
            ],
            "elements": [
                { "type": "stage", "x": 0, "y": 0, "width": 200, "height": 40, "label": "Stage" },
                { "type": "section", "x": 0, "y": 60, "width": 200, "height": 100, "name": "Stalls" },
                { "type": "seat", "id": "A-1", "x": 10, "y": 70, "size": 18, "categoryId": "vip", "number": 1 },
                { "type": "seat", "id": 42, "x": 40, "y": 70, "category_id": 2 },
                { "type": "polygon", "points": [{ "x": 0, "y": 0 }, { "x": 5, "y": 5 }, { "x": 0, "y": 5 }] }
            ]
        })
    }

    #[test]
    fn test_load_flat_document() {
        let model = GeometryModel::load(&flat_document()).unwrap();

        assert_eq!(model.venue_id().as_str(), "hall-1");
        assert_eq!(model.elements().len(), 5);
        assert_eq!(model.seat_count(), 2);

        let seat = model.seat(&SeatId::from("A-1")).unwrap();
        assert_eq!(seat.size, 18.0);
        assert_eq!(seat.category_id.as_deref(), Some("vip"));
        assert_eq!(seat.number.as_deref(), Some("1"));

        let numeric = model.seat(&SeatId::from("42")).unwrap();
        assert_eq!(numeric.size, DEFAULT_SEAT_SIZE);
        assert_eq!(numeric.category_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_nested_and_flat_documents_normalize_identically() {
        let flat = flat_document();
        let nested = json!({
            "venue_id": "hall-1",
            "canvas_data": {
                "categories": flat["categories"].clone(),
                "elements": flat["elements"].clone(),
            }
        });

        let from_flat = GeometryModel::load(&flat).unwrap();
        let from_nested = GeometryModel::load(&nested).unwrap();

        assert_eq!(from_flat.elements(), from_nested.elements());
        assert_eq!(from_flat.categories(), from_nested.categories());
        assert_eq!(from_flat, from_nested);
    }

    #[test]
    fn test_load_rejects_unrecognized_shape() {
        let result = GeometryModel::load(&json!({ "seats": [] }));
        assert!(matches!(result, Err(GeometryError::MalformedVenue { .. })));

        let result = GeometryModel::load(&json!([1, 2, 3]));
        assert!(matches!(result, Err(GeometryError::MalformedVenue { .. })));

        let result = GeometryModel::load(&json!({ "canvas_data": { "categories": [] } }));
        assert!(matches!(result, Err(GeometryError::MalformedVenue { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_known_element() {
        let document = json!({ "elements": [{ "type": "seat", "id": "A-1" }] });
        let err = GeometryModel::load(&document).unwrap_err();
        assert!(err.to_string().contains("element 0"));
    }

    #[test]
    fn test_unknown_element_types_are_skipped() {
        let document = json!({
            "elements": [
                { "type": "text", "x": 0, "y": 0 },
                { "type": "seat", "id": "A-1", "x": 0, "y": 0 }
            ]
        });
        let model = GeometryModel::load(&document).unwrap();
        assert_eq!(model.elements().len(), 1);
    }

    #[test]
    fn test_from_json_reports_invalid_text() {
        assert!(matches!(
            GeometryModel::from_json("{ not json"),
            Err(GeometryError::Json(_))
        ));
    }

    #[test]
    fn test_elements_of_type_is_restartable() {
        let model = GeometryModel::load(&flat_document()).unwrap();
        let seats = model.elements_of_type(ElementType::Seat);

        assert_eq!(seats.clone().count(), 2);
        assert_eq!(seats.count(), 2);
        assert_eq!(model.elements_of_type(ElementType::Stage).count(), 1);
    }

    #[test]
    fn test_unresolved_category_is_none() {
        let model = GeometryModel::load(&flat_document()).unwrap();
        assert!(model.category(&CategoryId::from("vip")).is_some());
        assert!(model.category(&CategoryId::from("balcony")).is_none());
    }

    #[test]
    fn test_duplicate_seat_ids_keep_first() {
        let document = json!({
            "elements": [
                { "type": "seat", "id": "A-1", "x": 0, "y": 0 },
                { "type": "seat", "id": "A-1", "x": 50, "y": 0 }
            ]
        });
        let model = GeometryModel::load(&document).unwrap();
        assert_eq!(model.seat_count(), 1);
        assert_eq!(model.seats().count(), 1);
        assert_eq!(model.elements().len(), 1);
        assert_eq!(model.seat(&SeatId::from("A-1")).map(|s| s.x), Some(0.0));
    }
}
