//! Seat-map viewer demo.
//!
//! Loads a venue (the bundled sample, or the JSON file given as the first
//! argument), verifies it against a simulated persisted state, plays a short
//! session through the reducer and writes the final frame as SVG.
//!
//! With `--live` the viewer connects to `SEATMAP_STREAM_URL` and runs until
//! Ctrl-C.

use anyhow::Context;
use seatmap_core::environment::SystemClock;
use seatmap_core::geometry::GeometryModel;
use seatmap_core::render::SvgSurface;
use seatmap_core::session::SeatMapAction;
use seatmap_core::types::{HolderRef, Point, SeatId, SeatStatus, StatusBreakdown};
use seatmap_core::verifier::{EventSeatRecords, PersistedSeatCounts, VenueVerifier};
use seatmap_runtime::{init_tracing, Viewer, ViewerConfig, ViewerInput, WebSocketTransport};
use std::sync::Arc;
use tokio::sync::mpsc;

const SAMPLE_VENUE: &str = include_str!("../../demos/sample_venue.json");
const SURFACE_WIDTH: f64 = 1024.0;
const SURFACE_HEIGHT: f64 = 640.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ViewerConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_level);

    let mut venue_path = None;
    let mut live = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--live" => live = true,
            _ => venue_path = Some(arg),
        }
    }
    let output = std::env::var("SEATMAP_DEMO_OUTPUT").unwrap_or_else(|_| "seatmap.svg".to_string());

    let document = match &venue_path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading venue {path}"))?
        },
        None => SAMPLE_VENUE.to_string(),
    };
    let geometry = Arc::new(GeometryModel::from_json(&document).context("loading venue")?);

    println!("=== Seat Map Viewer ===\n");
    println!(
        "Venue {}: {} elements, {} seats",
        geometry.venue_id(),
        geometry.elements().len(),
        geometry.seat_count()
    );

    let transport = Arc::new(WebSocketTransport::new(config.stream_url.clone()));
    let surface = SvgSurface::new(SURFACE_WIDTH, SURFACE_HEIGHT);
    let mut viewer = Viewer::new(
        Arc::clone(&geometry),
        &config,
        transport,
        surface,
        Arc::new(SystemClock),
    );

    if live {
        run_live(&mut viewer).await;
    } else {
        play_offline_session(&mut viewer, &geometry);
    }

    print_verification(&viewer, &geometry)?;

    std::fs::write(&output, viewer.surface().to_document())
        .with_context(|| format!("writing {output}"))?;
    println!("\nFrame written to {output} ({} frames drawn)", viewer.frames());

    Ok(())
}

/// Simulated broadcasts and clicks with the channel disconnected.
fn play_offline_session(viewer: &mut Viewer<SvgSurface>, geometry: &GeometryModel) {
    viewer.render();

    // Someone else bought every fourth seat and holds every seventh.
    let seat_ids: Vec<SeatId> = geometry.seats().map(|seat| seat.seat_id()).collect();
    for (index, seat_id) in seat_ids.iter().enumerate() {
        let (status, holder_ref) = match index {
            i if i % 4 == 0 => (SeatStatus::Sold, None),
            i if i % 7 == 0 => (SeatStatus::Held, Some(HolderRef::from("box-office"))),
            _ => continue,
        };
        viewer.handle(SeatMapAction::SeatStatusChanged {
            seat_id: seat_id.clone(),
            status,
            holder_ref,
        });
    }

    // Click the first free seat. The channel is not connected, so the hold is
    // reverted and a notice is raised.
    let free_seat = geometry
        .seats()
        .find(|seat| viewer.state().occupancy.status_of(&seat.seat_id()) == SeatStatus::Free);
    if let Some(seat) = free_seat {
        let viewport = viewer.state().controller.viewport();
        let center = viewport.to_device(Point::new(
            seat.x + seat.size / 2.0,
            seat.y + seat.size / 2.0,
        ));
        println!("\n>>> Clicking seat {} at {center:?}", seat.id);
        viewer.handle(SeatMapAction::PointerDown { point: center });
        viewer.handle(SeatMapAction::PointerUp);
    }

    for notice in viewer.take_notices() {
        println!("Notice [{:?}]: {notice}", notice.kind);
    }
}

/// Connect to the configured stream and run until Ctrl-C.
async fn run_live(viewer: &mut Viewer<SvgSurface>) {
    let (inputs, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = inputs.send(ViewerInput::Shutdown).await;
        }
    });

    println!("Connecting; press Ctrl-C to stop");
    viewer.start();
    viewer.run(rx).await;

    for notice in viewer.take_notices() {
        println!("Notice [{:?}]: {notice}", notice.kind);
    }
    if let Some(notice) = viewer.connection_notice() {
        println!("Connection: {notice}");
    }
}

/// Verify the layout against what the session's occupancy would persist.
fn print_verification(
    viewer: &Viewer<SvgSurface>,
    geometry: &GeometryModel,
) -> anyhow::Result<()> {
    let seat_ids: Vec<SeatId> = geometry.seats().map(|seat| seat.seat_id()).collect();
    let breakdown = viewer.state().occupancy.breakdown(&seat_ids);
    let persisted = PersistedSeatCounts::new(vec![
        EventSeatRecords::new("demo-matinee", breakdown.total(), breakdown),
        EventSeatRecords::new("demo-evening", 0, StatusBreakdown::default()),
    ]);

    let report = VenueVerifier::default().verify(geometry, &persisted);
    println!("\n=== Verification ===\n");
    println!("{}", serde_json::to_string_pretty(&report)?);
    for recommendation in &report.recommendations {
        println!("  • {recommendation}");
    }
    Ok(())
}
