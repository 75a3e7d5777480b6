//! Venue integrity verification.
//!
//! Compares the seats a venue layout declares against the seat records
//! persisted for each event held at the venue, and explains the differences.
//! Verification is read-only: discrepancies are data in the returned
//! [`VerificationReport`], never errors.
//!
//! # Severity
//!
//! ```text
//! no persisted seats at all (layout non-empty) → needs regeneration (high)
//! any event with |difference| > 10            → high
//! any event with a non-zero difference         → medium
//! totals match, category counts differ         → low
//! otherwise                                    → none
//! ```

use crate::environment::{Clock, SystemClock};
use crate::geometry::{ElementType, GeometryModel};
use crate::types::{CategoryId, EventId, StatusBreakdown};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Absolute per-event difference above which severity is high
pub const HIGH_SEVERITY_THRESHOLD: u64 = 10;

// ============================================================================
// Input
// ============================================================================

/// Persisted seat records for one event, as supplied by a data collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSeatRecords {
    /// The event
    pub event_id: EventId,
    /// Number of persisted seat records
    pub count: u64,
    /// Records by status
    #[serde(default)]
    pub breakdown: StatusBreakdown,
    /// Records by category; empty when the collaborator does not report it
    #[serde(default)]
    pub by_category: BTreeMap<CategoryId, u64>,
}

impl EventSeatRecords {
    /// Records for an event with the given total and breakdown
    #[must_use]
    pub fn new(event_id: impl Into<EventId>, count: u64, breakdown: StatusBreakdown) -> Self {
        Self {
            event_id: event_id.into(),
            count,
            breakdown,
            by_category: BTreeMap::new(),
        }
    }

    /// Attach a per-category breakdown
    #[must_use]
    pub fn with_categories(mut self, by_category: BTreeMap<CategoryId, u64>) -> Self {
        self.by_category = by_category;
        self
    }
}

/// Persisted seat counts for every event sharing a venue, in event order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedSeatCounts {
    events: Vec<EventSeatRecords>,
}

impl PersistedSeatCounts {
    /// Creates counts from per-event records
    #[must_use]
    pub const fn new(events: Vec<EventSeatRecords>) -> Self {
        Self { events }
    }

    /// Records in event order
    #[must_use]
    pub fn events(&self) -> &[EventSeatRecords] {
        &self.events
    }

    /// Sum of all persisted records
    #[must_use]
    pub fn total(&self) -> u64 {
        self.events.iter().map(|e| e.count).sum()
    }
}

// ============================================================================
// Report
// ============================================================================

/// Coarse classification of how far persisted counts deviate from the layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Counts agree
    #[default]
    None,
    /// Totals agree, category counts do not
    Low,
    /// Some event differs by at most the threshold
    Medium,
    /// Some event differs by more than the threshold, or seats were never generated
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// What the layout declares.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    /// Seats declared
    pub total: u64,
    /// Elements by type
    pub by_type: BTreeMap<ElementType, u64>,
    /// Seats by category (uncategorized seats are not counted)
    pub by_category: BTreeMap<CategoryId, u64>,
}

/// Persisted count for one event.
///
/// Serialized as the bare count; the event id is the key of the enclosing map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventCount {
    /// The event
    #[serde(skip)]
    pub event_id: EventId,
    /// Persisted seat records
    pub count: u64,
}

/// What is persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSummary {
    /// Records across all events
    pub total: u64,
    /// Records per event, in event order; a map keyed by event id on the wire
    #[serde(with = "event_map")]
    pub by_event: Vec<EventCount>,
}

/// A category whose persisted count differs from the layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMismatch {
    /// The category
    pub category_id: CategoryId,
    /// Seats the layout declares in this category
    pub expected: u64,
    /// Records persisted in this category
    pub actual: u64,
}

/// Comparison for one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDiscrepancy {
    /// The event; the key of the enclosing map on the wire
    #[serde(skip)]
    pub event_id: EventId,
    /// Seats the layout declares
    pub expected: u64,
    /// Seat records persisted
    pub actual: u64,
    /// `actual - expected`
    pub difference: i64,
    /// Persisted records by status
    pub breakdown: StatusBreakdown,
    /// Categories whose counts differ
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_mismatches: Vec<CategoryMismatch>,
}

/// Per-event comparison details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyDetails {
    /// One entry per event, in event order; a map keyed by event id on the wire
    #[serde(with = "event_map")]
    pub by_event: Vec<EventDiscrepancy>,
}

/// Classification of the comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancySummary {
    /// `severity != none`
    pub has_discrepancies: bool,
    /// No seats were ever materialized for this venue's events
    pub needs_regeneration: bool,
    /// Overall severity
    pub severity: Severity,
    /// Per-event details
    pub details: DiscrepancyDetails,
}

/// Result of one verification run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// When the report was produced
    pub timestamp: DateTime<Utc>,
    /// Layout side
    pub layout: LayoutSummary,
    /// Persisted side
    pub database: DatabaseSummary,
    /// Classification
    pub discrepancies: DiscrepancySummary,
    /// Actions to take, in event order
    pub recommendations: Vec<String>,
}

impl VerificationReport {
    /// Details for one event
    #[must_use]
    pub fn event(&self, event_id: &EventId) -> Option<&EventDiscrepancy> {
        self.discrepancies
            .details
            .by_event
            .iter()
            .find(|d| &d.event_id == event_id)
    }
}

/// Per-event entries that serialize as a JSON object keyed by event id.
trait EventKeyed {
    fn event_id(&self) -> &EventId;
    fn set_event_id(&mut self, event_id: EventId);
}

impl EventKeyed for EventCount {
    fn event_id(&self) -> &EventId {
        &self.event_id
    }

    fn set_event_id(&mut self, event_id: EventId) {
        self.event_id = event_id;
    }
}

impl EventKeyed for EventDiscrepancy {
    fn event_id(&self) -> &EventId {
        &self.event_id
    }

    fn set_event_id(&mut self, event_id: EventId) {
        self.event_id = event_id;
    }
}

/// `Vec<T>` as `{eventId: T}`, keeping entry order in both directions.
mod event_map {
    use super::{EventId, EventKeyed};
    use serde::de::{DeserializeOwned, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serialize, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub(super) fn serialize<S, T>(entries: &[T], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: EventKeyed + Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for entry in entries {
            map.serialize_entry(entry.event_id(), entry)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: EventKeyed + DeserializeOwned,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: EventKeyed + DeserializeOwned> Visitor<'de> for EntriesVisitor<T> {
            type Value = Vec<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by event id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((event_id, mut entry)) = access.next_entry::<EventId, T>()? {
                    entry.set_event_id(event_id);
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

// ============================================================================
// Verifier
// ============================================================================

/// Reconciles layout geometry against persisted seat records.
#[derive(Clone)]
pub struct VenueVerifier {
    clock: Arc<dyn Clock>,
}

impl Default for VenueVerifier {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl fmt::Debug for VenueVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueVerifier").finish_non_exhaustive()
    }
}

impl VenueVerifier {
    /// Creates a verifier stamping reports with the given clock
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Compare the layout against persisted records.
    #[must_use]
    pub fn verify(
        &self,
        geometry: &GeometryModel,
        persisted: &PersistedSeatCounts,
    ) -> VerificationReport {
        let layout = summarize_layout(geometry);
        let database = DatabaseSummary {
            total: persisted.total(),
            by_event: persisted
                .events()
                .iter()
                .map(|e| EventCount {
                    event_id: e.event_id.clone(),
                    count: e.count,
                })
                .collect(),
        };

        let by_event: Vec<EventDiscrepancy> = persisted
            .events()
            .iter()
            .map(|records| compare_event(&layout, records))
            .collect();

        let needs_regeneration =
            !by_event.is_empty() && database.total == 0 && layout.total > 0;

        let severity = if needs_regeneration {
            Severity::High
        } else {
            score(&by_event)
        };

        let recommendations = recommend(&layout, &by_event, needs_regeneration);

        if severity == Severity::None {
            tracing::debug!(venue_id = %geometry.venue_id(), "Venue verified with no discrepancies");
        } else {
            tracing::info!(
                venue_id = %geometry.venue_id(),
                %severity,
                needs_regeneration,
                layout_total = layout.total,
                database_total = database.total,
                "Venue verification found discrepancies"
            );
        }

        VerificationReport {
            timestamp: self.clock.now(),
            layout,
            database,
            discrepancies: DiscrepancySummary {
                has_discrepancies: severity != Severity::None,
                needs_regeneration,
                severity,
                details: DiscrepancyDetails { by_event },
            },
            recommendations,
        }
    }
}

fn summarize_layout(geometry: &GeometryModel) -> LayoutSummary {
    let mut summary = LayoutSummary {
        total: u64::try_from(geometry.seat_count()).unwrap_or(u64::MAX),
        ..LayoutSummary::default()
    };
    for element in geometry.elements() {
        *summary.by_type.entry(element.element_type()).or_insert(0) += 1;
    }
    for seat in geometry.seats() {
        if let Some(category) = seat.category() {
            *summary.by_category.entry(category).or_insert(0) += 1;
        }
    }
    summary
}

#[allow(clippy::cast_possible_wrap)] // Seat counts are far below i64::MAX
fn compare_event(layout: &LayoutSummary, records: &EventSeatRecords) -> EventDiscrepancy {
    let category_mismatches = if records.by_category.is_empty() {
        Vec::new()
    } else {
        let mut categories: Vec<&CategoryId> = layout.by_category.keys().collect();
        for id in records.by_category.keys() {
            if !layout.by_category.contains_key(id) {
                categories.push(id);
            }
        }
        categories
            .into_iter()
            .filter_map(|id| {
                let expected = layout.by_category.get(id).copied().unwrap_or(0);
                let actual = records.by_category.get(id).copied().unwrap_or(0);
                (expected != actual).then(|| CategoryMismatch {
                    category_id: id.clone(),
                    expected,
                    actual,
                })
            })
            .collect()
    };

    EventDiscrepancy {
        event_id: records.event_id.clone(),
        expected: layout.total,
        actual: records.count,
        difference: records.count as i64 - layout.total as i64,
        breakdown: records.breakdown,
        category_mismatches,
    }
}

fn score(by_event: &[EventDiscrepancy]) -> Severity {
    by_event
        .iter()
        .map(|d| {
            if d.difference.unsigned_abs() > HIGH_SEVERITY_THRESHOLD {
                Severity::High
            } else if d.difference != 0 {
                Severity::Medium
            } else if !d.category_mismatches.is_empty() {
                Severity::Low
            } else {
                Severity::None
            }
        })
        .max()
        .unwrap_or(Severity::None)
}

fn recommend(
    layout: &LayoutSummary,
    by_event: &[EventDiscrepancy],
    needs_regeneration: bool,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    for d in by_event {
        if d.actual == 0 && layout.total > 0 {
            recommendations.push(format!(
                "Regenerate seats for event {}: layout declares {} seats but none are persisted",
                d.event_id, layout.total
            ));
            continue;
        }
        if needs_regeneration {
            continue;
        }

        if d.difference < 0 {
            recommendations.push(format!(
                "Generate {} missing seats for event {} (expected {}, found {})",
                d.difference.unsigned_abs(),
                d.event_id,
                d.expected,
                d.actual
            ));
        } else if d.difference > 0 {
            let mut line = format!(
                "Remove {} surplus seat records for event {} (expected {}, found {})",
                d.difference, d.event_id, d.expected, d.actual
            );
            if d.breakdown.held + d.breakdown.sold > 0 {
                line.push_str(&format!(
                    "; review {} held and {} sold records before deleting",
                    d.breakdown.held, d.breakdown.sold
                ));
            }
            recommendations.push(line);
        }

        for mismatch in &d.category_mismatches {
            recommendations.push(format!(
                "Reconcile category {} count mismatch for event {} (expected {}, found {})",
                mismatch.category_id, d.event_id, mismatch.expected, mismatch.actual
            ));
        }
    }

    recommendations
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Element, Seat};
    use crate::types::VenueId;

    fn venue(seats: usize, category: Option<&str>) -> GeometryModel {
        let elements = (0..seats)
            .map(|i| {
                Element::Seat(Seat {
                    id: format!("S-{i}"),
                    x: i as f64 * 25.0,
                    y: 0.0,
                    size: 20.0,
                    category_id: category.map(str::to_string),
                    number: None,
                })
            })
            .collect();
        GeometryModel::new(VenueId::from("venue"), Vec::new(), elements)
    }

    fn free(count: u64) -> StatusBreakdown {
        StatusBreakdown {
            free: count,
            held: 0,
            sold: 0,
        }
    }

    #[test]
    fn test_zero_persisted_seats_needs_regeneration() {
        let geometry = venue(100, None);
        let persisted = PersistedSeatCounts::new(vec![EventSeatRecords::new("E", 0, free(0))]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);

        assert!(report.discrepancies.needs_regeneration);
        assert!(report.discrepancies.has_discrepancies);
        assert_eq!(report.layout.total, 100);
        assert_eq!(report.database.total, 0);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].starts_with("Regenerate seats for event E"));
    }

    #[test]
    fn test_difference_above_threshold_is_high() {
        let geometry = venue(50, None);
        let persisted = PersistedSeatCounts::new(vec![EventSeatRecords::new("E", 61, free(61))]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);
        let event = report.event(&EventId::from("E")).unwrap();

        assert_eq!(event.expected, 50);
        assert_eq!(event.actual, 61);
        assert_eq!(event.difference, 11);
        assert_eq!(report.discrepancies.severity, Severity::High);
        assert!(!report.discrepancies.needs_regeneration);
    }

    #[test]
    fn test_small_difference_is_medium() {
        let geometry = venue(50, None);
        let persisted = PersistedSeatCounts::new(vec![EventSeatRecords::new("E", 40, free(40))]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);

        assert_eq!(report.discrepancies.severity, Severity::Medium);
        assert_eq!(report.event(&EventId::from("E")).unwrap().difference, -10);
        assert_eq!(
            report.recommendations,
            vec!["Generate 10 missing seats for event E (expected 50, found 40)".to_string()]
        );
    }

    #[test]
    fn test_matching_counts_have_no_discrepancies() {
        let geometry = venue(20, None);
        let persisted = PersistedSeatCounts::new(vec![
            EventSeatRecords::new("E1", 20, free(20)),
            EventSeatRecords::new("E2", 20, free(20)),
        ]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);

        assert_eq!(report.discrepancies.severity, Severity::None);
        assert!(!report.discrepancies.has_discrepancies);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.database.total, 40);
    }

    #[test]
    fn test_recommendations_follow_event_order() {
        let geometry = venue(30, None);
        let persisted = PersistedSeatCounts::new(vec![
            EventSeatRecords::new("late-show", 45, StatusBreakdown { free: 40, held: 2, sold: 3 }),
            EventSeatRecords::new("matinee", 0, free(0)),
            EventSeatRecords::new("gala", 25, free(25)),
        ]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);

        assert_eq!(report.discrepancies.severity, Severity::High);
        assert!(!report.discrepancies.needs_regeneration);
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].contains("late-show"));
        assert!(report.recommendations[0].contains("review 2 held and 3 sold"));
        assert!(report.recommendations[1].starts_with("Regenerate seats for event matinee"));
        assert!(report.recommendations[2].contains("gala"));
    }

    #[test]
    fn test_category_only_mismatch_is_low() {
        let geometry = venue(10, Some("vip"));
        let by_category = BTreeMap::from([
            (CategoryId::from("vip"), 8),
            (CategoryId::from("std"), 2),
        ]);
        let persisted = PersistedSeatCounts::new(vec![
            EventSeatRecords::new("E", 10, free(10)).with_categories(by_category),
        ]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);
        let event = report.event(&EventId::from("E")).unwrap();

        assert_eq!(report.discrepancies.severity, Severity::Low);
        assert_eq!(event.category_mismatches.len(), 2);
        assert_eq!(
            report.recommendations[0],
            "Reconcile category vip count mismatch for event E (expected 10, found 8)"
        );
    }

    #[test]
    fn test_layout_counts_elements_by_type() {
        let geometry = venue(3, Some("vip"));
        let report = VenueVerifier::default().verify(&geometry, &PersistedSeatCounts::default());

        assert_eq!(report.layout.by_type.get(&ElementType::Seat), Some(&3));
        assert_eq!(report.layout.by_category.get(&CategoryId::from("vip")), Some(&3));
        // No events, nothing to regenerate.
        assert!(!report.discrepancies.needs_regeneration);
        assert_eq!(report.discrepancies.severity, Severity::None);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let geometry = venue(1, None);
        let persisted = PersistedSeatCounts::new(vec![EventSeatRecords::new("E", 1, free(1))]);
        let report = VenueVerifier::default().verify(&geometry, &persisted);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["discrepancies"]["hasDiscrepancies"], false);
        assert_eq!(json["discrepancies"]["severity"], "none");
        assert_eq!(json["layout"]["byType"]["seat"], 1);
        assert_eq!(json["database"]["byEvent"]["E"], 1);
        assert_eq!(json["discrepancies"]["details"]["byEvent"]["E"]["expected"], 1);
        assert!(json["discrepancies"]["details"]["byEvent"]["E"].get("eventId").is_none());
    }

    #[test]
    fn test_duplicate_seat_ids_counted_once() {
        let mut elements: Vec<Element> = venue(3, Some("vip")).elements().to_vec();
        elements.push(elements[0].clone());
        let geometry = GeometryModel::new(VenueId::from("v"), Vec::new(), elements);
        let persisted = PersistedSeatCounts::new(vec![EventSeatRecords::new("E", 3, free(3))]);

        let report = VenueVerifier::default().verify(&geometry, &persisted);

        assert_eq!(report.layout.total, geometry.seat_count() as u64);
        assert_eq!(report.layout.total, 3);
        assert_eq!(report.layout.by_type.get(&ElementType::Seat), Some(&3));
        assert_eq!(report.layout.by_category.get(&CategoryId::from("vip")), Some(&3));
        assert_eq!(report.discrepancies.severity, Severity::None);
    }

    #[test]
    fn test_report_round_trips_with_event_order() {
        let geometry = venue(2, None);
        let persisted = PersistedSeatCounts::new(vec![
            EventSeatRecords::new("zeta", 2, free(2)),
            EventSeatRecords::new("alpha", 1, free(1)),
        ]);
        let report = VenueVerifier::default().verify(&geometry, &persisted);

        let text = serde_json::to_string(&report).unwrap();
        assert!(text.find("\"zeta\"").unwrap() < text.find("\"alpha\"").unwrap());

        let parsed: VerificationReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
        let order: Vec<&str> = parsed
            .discrepancies
            .details
            .by_event
            .iter()
            .map(|d| d.event_id.as_str())
            .collect();
        assert_eq!(order, vec!["zeta", "alpha"]);
    }
}
