//! Cooperative viewer event loop.
//!
//! The [`Viewer`] owns the seat-map state, the drawing surface and the
//! real-time channel, and executes the effects returned by
//! [`SeatMapReducer`]. All mutations happen on the task that drives it; the
//! channel's background worker only ever talks to it through events.
//!
//! # Ticks
//!
//! Each processed event (one user action, one channel event) is one tick of
//! the occupancy store. Actions fed back by effects (a failed send) run in the
//! same tick, and at most one frame is drawn per tick. A request the channel
//! accepted but later lost arrives as its own event and is reverted the same
//! way as one refused up front.

use crate::backoff::ReconnectPolicy;
use crate::channel::{ChannelEvent, RealtimeChannel};
use crate::config::ViewerConfig;
use crate::log::ChannelLog;
use seatmap_core::effect::{Effect, Notice};
use seatmap_core::environment::Clock;
use seatmap_core::geometry::GeometryModel;
use seatmap_core::reducer::Reducer;
use seatmap_core::render::{FrameStats, RenderEngine, RenderOptions, Surface};
use seatmap_core::session::{SeatMapAction, SeatMapEnvironment, SeatMapReducer, SeatMapState};
use seatmap_core::transport::Transport;
use seatmap_core::types::{ConnectionState, HolderRef};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transient notices retained before the oldest are dropped
const NOTICE_CAPACITY: usize = 32;

/// Inputs accepted by [`Viewer::run`].
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerInput {
    /// A user interaction
    Action(SeatMapAction),
    /// Start the channel
    Connect,
    /// Manual reconnect
    Reconnect,
    /// Close the channel
    Disconnect,
    /// Stop the loop
    Shutdown,
}

/// The interactive seat-map viewer.
pub struct Viewer<S: Surface> {
    state: SeatMapState,
    env: SeatMapEnvironment,
    engine: RenderEngine,
    surface: S,
    channel: RealtimeChannel,
    notices: VecDeque<Notice>,
    frames: u64,
    last_frame: Option<FrameStats>,
}

impl<S: Surface> Viewer<S> {
    /// Creates a viewer from configuration.
    ///
    /// The viewer gets a fresh holder reference (`viewer-<uuid>`).
    #[must_use]
    pub fn new(
        geometry: Arc<GeometryModel>,
        config: &ViewerConfig,
        transport: Arc<dyn Transport>,
        surface: S,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let holder_ref = HolderRef::new(format!("viewer-{}", Uuid::new_v4()));
        let env = SeatMapEnvironment::new(clock, holder_ref)
            .with_max_selection(config.max_selection);
        Self::with_parts(
            geometry,
            env,
            config.render_options(),
            RealtimeChannel::new(transport, config.reconnect_policy()),
            surface,
        )
    }

    /// Creates a viewer from explicit parts
    #[must_use]
    pub fn with_parts(
        geometry: Arc<GeometryModel>,
        env: SeatMapEnvironment,
        options: RenderOptions,
        channel: RealtimeChannel,
        surface: S,
    ) -> Self {
        Self {
            state: SeatMapState::new(geometry),
            env,
            engine: RenderEngine::new(options),
            surface,
            channel,
            notices: VecDeque::new(),
            frames: 0,
            last_frame: None,
        }
    }

    /// Creates a viewer with a channel built from `transport` and `policy`
    #[must_use]
    pub fn with_transport(
        geometry: Arc<GeometryModel>,
        env: SeatMapEnvironment,
        transport: Arc<dyn Transport>,
        policy: ReconnectPolicy,
        surface: S,
    ) -> Self {
        Self::with_parts(
            geometry,
            env,
            RenderOptions::default(),
            RealtimeChannel::new(transport, policy),
            surface,
        )
    }

    /// Draw the first frame and start connecting
    pub fn start(&mut self) {
        self.render();
        self.channel.connect();
    }

    /// Process one user action as one tick
    pub fn handle(&mut self, action: SeatMapAction) {
        self.state.occupancy.advance_tick();

        let mut queue = VecDeque::from([action]);
        let mut needs_render = false;
        while let Some(action) = queue.pop_front() {
            let effects = SeatMapReducer.reduce(&mut self.state, action, &self.env);
            for effect in effects {
                match effect {
                    Effect::Render => needs_render = true,
                    Effect::Send(message) => {
                        if let Err(err) = self.channel.send(&message) {
                            tracing::warn!(seat_id = %message.seat_id, error = %err, "Request not sent");
                            queue.push_back(SeatMapAction::SendFailed { message });
                        }
                    },
                    Effect::Notify(notice) => self.push_notice(notice),
                }
            }
        }

        if needs_render {
            self.render();
        }
    }

    /// Process one channel event as one tick
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        let action = match event {
            ChannelEvent::StateChanged(state) => SeatMapAction::ConnectionChanged { state },
            ChannelEvent::Message(message) => SeatMapAction::from(message),
            ChannelEvent::Unreachable { attempts } => SeatMapAction::ChannelUnreachable { attempts },
            ChannelEvent::SendDiscarded { message, .. } => SeatMapAction::SendFailed { message },
        };
        self.handle(action);
    }

    /// Wait for the next channel event and process it.
    ///
    /// Returns the event, or `None` if the channel has no more events.
    pub async fn process_next_event(&mut self) -> Option<ChannelEvent> {
        let event = self.channel.next_event().await?;
        self.handle_channel_event(event.clone());
        Some(event)
    }

    /// Process every channel event that is already queued.
    ///
    /// Returns how many were processed.
    pub fn process_pending_events(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.channel.try_next_event() {
            self.handle_channel_event(event);
            processed += 1;
        }
        processed
    }

    /// Drive the viewer until [`ViewerInput::Shutdown`] or the input channel
    /// closes, then disconnect.
    pub async fn run(&mut self, mut inputs: mpsc::Receiver<ViewerInput>) {
        tracing::info!(endpoint = %self.channel.endpoint(), "Viewer loop started");

        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(ViewerInput::Action(action)) => self.handle(action),
                    Some(ViewerInput::Connect) => self.channel.connect(),
                    Some(ViewerInput::Reconnect) => self.channel.reconnect(),
                    Some(ViewerInput::Disconnect) => self.channel.disconnect(),
                    Some(ViewerInput::Shutdown) | None => break,
                },
                Some(event) = self.channel.next_event() => self.handle_channel_event(event),
            }
        }

        self.channel.disconnect();
        self.process_pending_events();
        tracing::info!(frames = self.frames, "Viewer loop stopped");
    }

    /// Draw the current state
    pub fn render(&mut self) {
        let stats = self.engine.render(
            &self.state.geometry,
            &self.state.occupancy,
            &self.state.selection,
            self.state.controller.viewport(),
            &mut self.surface,
        );
        self.frames += 1;
        self.last_frame = Some(stats);
        tracing::trace!(seats = stats.seats, glyphs = stats.glyphs, "Frame drawn");
    }

    fn push_notice(&mut self, notice: Notice) {
        tracing::debug!(kind = ?notice.kind, message = %notice.message, "Notice");
        if self.notices.len() == NOTICE_CAPACITY {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Seat-map state
    #[must_use]
    pub const fn state(&self) -> &SeatMapState {
        &self.state
    }

    /// This viewer's holder reference
    #[must_use]
    pub const fn holder_ref(&self) -> &HolderRef {
        &self.env.holder_ref
    }

    /// The drawing surface
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Frames drawn so far
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Stats of the most recent frame
    #[must_use]
    pub const fn last_frame(&self) -> Option<FrameStats> {
        self.last_frame
    }

    /// Transient notices, oldest first
    #[must_use]
    pub const fn notices(&self) -> &VecDeque<Notice> {
        &self.notices
    }

    /// Remove and return the transient notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Persistent connection notice, if the channel gave up
    #[must_use]
    pub const fn connection_notice(&self) -> Option<&Notice> {
        self.state.connection_notice.as_ref()
    }

    /// Channel state
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// The channel's event log
    #[must_use]
    pub fn channel_log(&self) -> &ChannelLog {
        self.channel.log()
    }

    /// Start the channel (after [`Viewer::disconnect`] or an unreachable stop)
    pub fn connect(&mut self) {
        self.channel.connect();
    }

    /// Manual reconnect with the attempt counter reset
    pub fn reconnect(&mut self) {
        self.channel.reconnect();
    }

    /// Close the channel
    pub fn disconnect(&mut self) {
        self.channel.disconnect();
    }
}

impl<S: Surface> std::fmt::Debug for Viewer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("holder_ref", &self.env.holder_ref)
            .field("channel", &self.channel)
            .field("selection", &self.state.selection)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
