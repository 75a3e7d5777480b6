//! Integration tests for the seat-map reducer.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use seatmap_core::effect::{Effect, NoticeKind};
use seatmap_core::environment::Clock;
use seatmap_core::message::{PriceBook, SeatStatusMessage, StreamMessage};
use seatmap_core::reducer::Reducer;
use seatmap_core::session::{SeatMapAction, SeatMapEnvironment, SeatMapReducer, SeatMapState};
use seatmap_core::types::{CategoryId, ConnectionState, HolderRef, Point, SeatId, SeatStatus};
use seatmap_testing::{assertions, fixtures, test_clock, ReducerTest};
use std::sync::Arc;

const ME: &str = "viewer-me";

fn env() -> SeatMapEnvironment {
    SeatMapEnvironment::new(Arc::new(test_clock()), HolderRef::from(ME))
}

fn state() -> SeatMapState {
    SeatMapState::new(fixtures::sample_venue_arc())
}

fn toggle(seat: &str) -> SeatMapAction {
    SeatMapAction::ToggleSeat {
        seat_id: SeatId::from(seat),
    }
}

fn remote(seat: &str, status: SeatStatus, holder: Option<&str>) -> SeatMapAction {
    SeatMapAction::SeatStatusChanged {
        seat_id: SeatId::from(seat),
        status,
        holder_ref: holder.map(HolderRef::from),
    }
}

/// State after A-1 was selected in an earlier tick.
fn with_a1_selected() -> SeatMapState {
    let mut state = state();
    SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    state.occupancy.advance_tick();
    state
}

// ============================================================================
// Selecting seats
// ============================================================================

#[test]
fn test_click_on_free_seat_selects_and_sends_hold() {
    ReducerTest::new(SeatMapReducer)
        .with_env(env())
        .given_state(state())
        .when_action(SeatMapAction::PointerDown {
            point: Point::new(160.0, 160.0),
        })
        .then_state(|state| {
            let a1 = SeatId::from("A-1");
            assert!(state.selection.contains(&a1));
            assert_eq!(state.occupancy.status_of(&a1), SeatStatus::Held);
            assert!(state.occupancy.is_provisional(&a1));
            assert!(!state.controller.is_panning());
        })
        .then_effects(|effects| {
            assertions::assert_sends(effects, "A-1", SeatStatus::Held);
            assertions::assert_renders(effects);
        })
        .run();
}

#[test]
fn test_outgoing_hold_carries_holder_ref() {
    let mut state = state();
    let effects = SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());

    assert_eq!(
        effects[0],
        Effect::Send(SeatStatusMessage::hold(
            SeatId::from("A-1"),
            HolderRef::from(ME)
        ))
    );
}

#[test]
fn test_second_click_deselects_and_sends_release() {
    let mut state = with_a1_selected();
    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::PointerDown {
            point: Point::new(160.0, 160.0),
        },
        &env(),
    );

    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-1")), SeatStatus::Free);
    assertions::assert_sends(&effects, "A-1", SeatStatus::Free);
}

#[test]
fn test_click_on_sold_seat_pans_instead_of_selecting() {
    let mut state = state();
    SeatMapReducer.reduce(&mut state, remote("A-2", SeatStatus::Sold, None), &env());
    state.occupancy.advance_tick();

    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::PointerDown {
            point: Point::new(190.0, 160.0),
        },
        &env(),
    );

    assertions::assert_no_effects(&effects);
    assert!(state.selection.is_empty());
    assert!(state.controller.is_panning());
}

#[test]
fn test_toggle_of_unavailable_seat_is_rejected_without_mutation() {
    let mut state = state();
    SeatMapReducer.reduce(&mut state, remote("A-3", SeatStatus::Held, Some("other")), &env());
    state.occupancy.advance_tick();

    let effects = SeatMapReducer.reduce(&mut state, toggle("A-3"), &env());

    assertions::assert_notifies(&effects, NoticeKind::SelectionRejected);
    assertions::assert_sends_nothing(&effects);
    assert!(state.selection.is_empty());
    let a3 = SeatId::from("A-3");
    assert_eq!(state.occupancy.status_of(&a3), SeatStatus::Held);
    assert_eq!(state.occupancy.holder_of(&a3), Some(&HolderRef::from("other")));
}

#[test]
fn test_toggle_of_unknown_seat_does_nothing() {
    ReducerTest::new(SeatMapReducer)
        .with_env(env())
        .given_state(state())
        .when_action(toggle("Z-99"))
        .then_state(|state| assert!(state.occupancy.is_empty()))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn test_selection_limit_is_enforced() {
    let env = env().with_max_selection(2);
    let mut state = state();
    SeatMapReducer.reduce(&mut state, toggle("A-1"), &env);
    SeatMapReducer.reduce(&mut state, toggle("A-2"), &env);
    let effects = SeatMapReducer.reduce(&mut state, toggle("A-3"), &env);

    assertions::assert_notifies(&effects, NoticeKind::SelectionLimit);
    assertions::assert_sends_nothing(&effects);
    assert_eq!(state.selection.len(), 2);
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-3")), SeatStatus::Free);
}

#[test]
fn test_clear_selection_releases_every_seat() {
    let mut state = state();
    SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    SeatMapReducer.reduce(&mut state, toggle("A-2"), &env());
    state.occupancy.advance_tick();

    let effects = SeatMapReducer.reduce(&mut state, SeatMapAction::ClearSelection, &env());

    assert!(state.selection.is_empty());
    assertions::assert_sends(&effects, "A-1", SeatStatus::Free);
    assertions::assert_sends(&effects, "A-2", SeatStatus::Free);
    assertions::assert_renders(&effects);
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_remote_write_in_same_tick_wins_over_click() {
    let mut state = state();
    SeatMapReducer.reduce(&mut state, remote("A-1", SeatStatus::Free, None), &env());

    // Same tick: the optimistic hold is refused.
    let effects = SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    assertions::assert_no_effects(&effects);
    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-1")), SeatStatus::Free);

    // Next tick the click goes through.
    state.occupancy.advance_tick();
    let effects = SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    assertions::assert_sends(&effects, "A-1", SeatStatus::Held);
}

#[test]
fn test_seat_taken_by_someone_else_leaves_selection() {
    let mut state = with_a1_selected();
    let effects = SeatMapReducer.reduce(
        &mut state,
        remote("A-1", SeatStatus::Sold, Some("box-office")),
        &env(),
    );

    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-1")), SeatStatus::Sold);
    assertions::assert_notifies(&effects, NoticeKind::HoldLost);
    assertions::assert_renders(&effects);
}

#[test]
fn test_confirmation_of_own_hold_keeps_selection() {
    for holder in [Some(ME), None] {
        let mut state = with_a1_selected();
        let effects =
            SeatMapReducer.reduce(&mut state, remote("A-1", SeatStatus::Held, holder), &env());

        let a1 = SeatId::from("A-1");
        assert!(state.selection.contains(&a1), "holder {holder:?}");
        assert!(!state.occupancy.is_provisional(&a1));
        assert_eq!(effects.as_slice(), &[Effect::Render]);
    }
}

#[test]
fn test_hold_by_other_viewer_prunes_selection() {
    let mut state = with_a1_selected();
    SeatMapReducer.reduce(&mut state, remote("A-1", SeatStatus::Held, Some("viewer-x")), &env());

    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-1")), SeatStatus::Held);
}

#[test]
fn test_hold_rejection_reverts_optimistic_status() {
    let mut state = with_a1_selected();
    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::HoldRejected {
            seat_id: SeatId::from("A-1"),
            reason: Some("already held".to_string()),
        },
        &env(),
    );

    let a1 = SeatId::from("A-1");
    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&a1), SeatStatus::Free);
    assert!(!state.occupancy.is_provisional(&a1));

    let Some(Effect::Notify(notice)) = effects.first() else {
        panic!("expected a notice, got {effects:?}");
    };
    assert_eq!(notice.kind, NoticeKind::SelectionRejected);
    assert!(notice.message.contains("already held"));
    assert_eq!(notice.at, test_clock().now());
}

#[test]
fn test_failed_hold_send_is_undone() {
    let mut state = with_a1_selected();
    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::SendFailed {
            message: SeatStatusMessage::hold(SeatId::from("A-1"), HolderRef::from(ME)),
        },
        &env(),
    );

    assert!(state.selection.is_empty());
    assert_eq!(state.occupancy.status_of(&SeatId::from("A-1")), SeatStatus::Free);
    assertions::assert_notifies(&effects, NoticeKind::NotConnected);
}

#[test]
fn test_failed_release_send_restores_selection() {
    let mut state = state();
    // Confirmed hold, then a deselect whose release cannot be sent.
    SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    state.occupancy.advance_tick();
    SeatMapReducer.reduce(&mut state, remote("A-1", SeatStatus::Held, Some(ME)), &env());
    state.occupancy.advance_tick();
    SeatMapReducer.reduce(&mut state, toggle("A-1"), &env());
    assert!(state.selection.is_empty());

    SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::SendFailed {
            message: SeatStatusMessage::release(SeatId::from("A-1"), HolderRef::from(ME)),
        },
        &env(),
    );

    let a1 = SeatId::from("A-1");
    assert!(state.selection.contains(&a1));
    assert_eq!(state.occupancy.status_of(&a1), SeatStatus::Held);
}

// ============================================================================
// Prices, viewport and connection
// ============================================================================

#[test]
fn test_selection_total_uses_price_book() {
    let mut state = state();
    let price_book: PriceBook = [
        (CategoryId::from("vip"), 120.0),
        (CategoryId::from("std"), 45.5),
    ]
    .into_iter()
    .collect();
    SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::PriceBookUpdated { price_book },
        &env(),
    );
    state.occupancy.advance_tick();

    for seat in ["A-1", "A-3", "A-4"] {
        SeatMapReducer.reduce(&mut state, toggle(seat), &env());
    }

    // A-4 has no category and contributes nothing.
    assert!((state.selection_total() - 165.5).abs() < f64::EPSILON);
}

#[test]
fn test_wheel_and_pan_update_viewport() {
    ReducerTest::new(SeatMapReducer)
        .with_env(env())
        .given_state(state())
        .when_action(SeatMapAction::PointerDown {
            point: Point::new(10.0, 10.0),
        })
        .when_action(SeatMapAction::PointerMove {
            point: Point::new(30.0, 40.0),
        })
        .then_state(|state| {
            assert_eq!(state.controller.viewport().pan(), Point::new(70.0, 80.0));
        })
        .then_effects(|effects| assert_eq!(effects, &[Effect::Render]))
        .run();

    ReducerTest::new(SeatMapReducer)
        .with_env(env())
        .given_state(state())
        .when_action(SeatMapAction::Wheel { delta_y: 120.0 })
        .then_state(|state| {
            assert!((state.controller.viewport().scale() - 0.9).abs() < 1e-12);
        })
        .run();
}

#[test]
fn test_unreachable_notice_cleared_on_reconnect() {
    let mut state = state();
    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::ChannelUnreachable { attempts: 6 },
        &env(),
    );
    assertions::assert_notifies(&effects, NoticeKind::ChannelUnreachable);
    assert!(state.connection_notice.is_some());

    let effects = SeatMapReducer.reduce(
        &mut state,
        SeatMapAction::ConnectionChanged {
            state: ConnectionState::Connected,
        },
        &env(),
    );
    assertions::assert_notifies(&effects, NoticeKind::Reconnected);
    assert!(state.connection_notice.is_none());
    assert_eq!(state.connection, ConnectionState::Connected);
}

#[test]
fn test_stream_messages_convert_to_actions() {
    let message = StreamMessage::parse(
        r#"{"kind":"seatStatusChanged","seatId":"A-1","status":"held","holderRef":"viewer-9"}"#,
    )
    .unwrap();
    assert_eq!(
        SeatMapAction::from(message),
        remote("A-1", SeatStatus::Held, Some("viewer-9"))
    );
}
