// Application state and orchestration logic.
//
// The central event loop that coordinates control messages from the
// operator surface, live-feed fetch results, and the timers behind
// debounced broadcasting, pending clicks, and background auto-refresh.
// All session mutation happens here, on discrete events; components only
// ever see fully-committed state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::broadcast::{build_frame, DebounceScheduler};
use crate::catalog::{self, TeamCatalog};
use crate::config::Config;
use crate::drag::{DragAction, DragController, PxPoint, SurfaceSize};
use crate::feed::client::{fetch_fixture, FeedApi, FeedError, FixtureDetail, FixtureLineups};
use crate::feed::reconcile::{self, ReconcileRequest};
use crate::layout::overrides::effective_positions;
use crate::layout::transform;
use crate::protocol::{ControlMessage, OutboundMessage};
use crate::session::{FeedBinding, Session, TeamSide};
use crate::ws_server::WsEvent;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Result of one feed fetch, delivered back to the event loop by the
/// spawned fetch task.
#[derive(Debug)]
pub struct FeedOutcome {
    /// Fixture-binding generation the fetch was started under. Outcomes
    /// from a superseded binding are discarded.
    pub generation: u64,
    pub request: ReconcileRequest,
    pub result: Result<(FixtureLineups, FixtureDetail), FeedError>,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub session: Session,
    pub drag: DragController,
    pub publisher: DebounceScheduler,
    pub catalog: TeamCatalog,
    feed_api: Arc<dyn FeedApi>,
    /// Sender for fetch outcomes; spawned tasks use a clone to deliver
    /// results back to the event loop.
    feed_tx: mpsc::Sender<FeedOutcome>,
    /// Monotonically increasing counter identifying the current fixture
    /// binding. Incremented on every user load, stop, and snapshot
    /// restore so stale fetch results are discarded in
    /// `handle_feed_outcome`.
    feed_generation: u64,
    current_fetch: Option<tokio::task::JoinHandle<()>>,
    out_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: TeamCatalog,
        feed_api: Arc<dyn FeedApi>,
        feed_tx: mpsc::Sender<FeedOutcome>,
        out_tx: broadcast::Sender<String>,
    ) -> Self {
        AppState {
            config,
            session: Session::default(),
            drag: DragController::default(),
            publisher: DebounceScheduler::default(),
            catalog,
            feed_api,
            feed_tx,
            feed_generation: 0,
            current_fetch: None,
            out_tx,
        }
    }

    fn send_outbound(&self, msg: &OutboundMessage) {
        match msg.to_json() {
            // Send failures just mean no client is connected right now.
            Ok(json) => {
                let _ = self.out_tx.send(json);
            }
            Err(e) => warn!("Failed to serialize outbound message: {e}"),
        }
    }

    // -----------------------------------------------------------------------
    // Control messages
    // -----------------------------------------------------------------------

    /// Parse and dispatch a raw control payload from the hub. Malformed
    /// messages are logged and dropped; they never corrupt state.
    pub fn handle_control_json(&mut self, json: &str, now: Instant) {
        match serde_json::from_str::<ControlMessage>(json) {
            Ok(msg) => self.handle_control(msg, now),
            Err(e) => warn!("Failed to parse control message: {e}"),
        }
    }

    pub fn handle_control(&mut self, msg: ControlMessage, now: Instant) {
        match msg {
            ControlMessage::SurfaceResized { team, width, height } => {
                if width > 0.0 && height > 0.0 {
                    self.drag.set_surface(team, SurfaceSize { width, height });
                } else {
                    warn!("Ignoring non-positive surface size {width}x{height}");
                }
            }
            ControlMessage::PointerDown { team, seat, x, y } => {
                self.handle_pointer_down(team, seat, PxPoint::new(x, y), now);
            }
            ControlMessage::PointerMove { team, x, y } => {
                let action =
                    self.drag
                        .on_pointer_move(team, PxPoint::new(x, y), self.session.vertical_mode);
                self.apply_drag_action(team, action, now);
            }
            ControlMessage::PointerUp { team } => {
                let action = self.drag.on_pointer_up(team, now);
                self.apply_drag_action(team, action, now);
            }
            ControlMessage::SetFormation { team, formation } => {
                // Operator input is rejected rather than defaulted: a typo
                // must not wipe the override map.
                match reconcile::try_parse_formation(&formation) {
                    Some(parsed) => {
                        info!("Setting {team:?} formation to {}", parsed.name);
                        self.session.team_mut(team).set_formation(parsed);
                        self.publisher.mark_changed(now);
                    }
                    None => warn!("Ignoring malformed formation string {formation:?}"),
                }
            }
            ControlMessage::SetScore { team, score } => {
                self.session.team_mut(team).score = score;
                self.publisher.mark_changed(now);
            }
            ControlMessage::SetTeamName { team, name } => {
                self.session.team_mut(team).set_name(&name);
                self.publisher.mark_identity_changed(now);
            }
            ControlMessage::SetColors { team, shirt, number } => {
                let state = self.session.team_mut(team);
                state.shirt_color = shirt;
                state.number_color = number;
                self.publisher.mark_changed(now);
            }
            ControlMessage::EditPlayer { team, seat, edit } => {
                if self.session.team_mut(team).edit_player(seat, edit) {
                    self.publisher.mark_changed(now);
                } else {
                    warn!("Ignoring edit for out-of-range seat {seat} on {team:?}");
                }
            }
            ControlMessage::SelectCatalogTeam { index, target } => {
                match self.catalog.get(index) {
                    Some(entry) => {
                        let entry = entry.clone();
                        catalog::apply_selection(self.session.team_mut(target), &entry);
                        self.publisher.mark_identity_changed(now);
                    }
                    None => warn!("Catalog selection index {index} out of range"),
                }
            }
            ControlMessage::ToggleVerticalMode => {
                self.session.vertical_mode = !self.session.vertical_mode;
                self.publisher.mark_changed(now);
            }
            ControlMessage::ResetLayout { team } => {
                self.session.team_mut(team).reset_layout();
                self.publisher.mark_changed(now);
            }
            ControlMessage::SwapTeams => {
                self.session.swap_teams();
                self.publisher.mark_identity_changed(now);
            }
            ControlMessage::LoadFixture { fixture_id } => {
                info!("User-initiated load for fixture {fixture_id}");
                self.start_fetch(ReconcileRequest::UserLoad(fixture_id));
            }
            ControlMessage::StopFeed => {
                self.stop_feed();
            }
            ControlMessage::RestoreSnapshot { session } => {
                let mut restored = *session;
                restored.normalize();
                // The restored session starts unbound; make sure no
                // in-flight fetch writes into it.
                self.cancel_fetch();
                self.feed_generation += 1;
                self.session = restored;
                self.publisher.mark_identity_changed(now);
            }
            ControlMessage::RequestSnapshot => {
                self.send_outbound(&OutboundMessage::Snapshot {
                    session: Box::new(self.session.clone()),
                });
            }
        }
    }

    fn handle_pointer_down(&mut self, team: TeamSide, seat: usize, pointer: PxPoint, now: Instant) {
        let seat_count = self.session.team(team).formation.seat_count();
        if seat >= seat_count {
            warn!("Ignoring pointer-down on out-of-range seat {seat} (seat count {seat_count})");
            return;
        }
        let center = match self.seat_center_px(team, seat) {
            Ok(center) => center,
            Err(e) => {
                warn!("Cannot resolve seat {seat} center: {e}");
                return;
            }
        };
        let action = self.drag.on_pointer_down(team, seat, pointer, center, now);
        self.apply_drag_action(team, action, now);
    }

    /// The seat's current visual center in surface pixels, resolved from
    /// effective positions through the active mode projection.
    fn seat_center_px(
        &self,
        team: TeamSide,
        seat: usize,
    ) -> Result<PxPoint, crate::layout::LayoutError> {
        let positions = effective_positions(self.session.team(team))?;
        let display = transform::project(self.session.vertical_mode, team, positions[seat]);
        let surface = self.drag.surface(team);
        Ok(PxPoint::new(
            display.x / 100.0 * surface.width,
            display.y / 100.0 * surface.height,
        ))
    }

    fn apply_drag_action(&mut self, team: TeamSide, action: DragAction, now: Instant) {
        match action {
            DragAction::None => {}
            DragAction::ClickArmed { .. } => {
                // The loop picks the deadline up from the controller.
            }
            DragAction::OverrideMoved { seat, position } => {
                self.session.team_mut(team).overrides.set(seat, position);
                self.publisher.mark_changed(now);
            }
            DragAction::DragEnded { seat } => {
                debug!("Drag ended for {team:?} seat {seat}");
                self.publisher.mark_changed(now);
            }
            DragAction::DoubleClick { seat } => {
                self.send_outbound(&OutboundMessage::EditRequested { team, seat });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Feed lifecycle
    // -----------------------------------------------------------------------

    /// Spawn a fetch task for the given request. A user load supersedes
    /// whatever was in flight; an auto tick is skipped while a fetch for
    /// the bound fixture is still running.
    pub fn start_fetch(&mut self, request: ReconcileRequest) {
        match request {
            ReconcileRequest::UserLoad(_) => {
                self.cancel_fetch();
                self.feed_generation += 1;
            }
            ReconcileRequest::AutoTick(_) => {
                if self
                    .current_fetch
                    .as_ref()
                    .is_some_and(|handle| !handle.is_finished())
                {
                    debug!("Skipping auto-refresh tick, previous fetch still in flight");
                    return;
                }
            }
        }

        let generation = self.feed_generation;
        let fixture_id = request.fixture_id();
        let api = Arc::clone(&self.feed_api);
        let tx = self.feed_tx.clone();

        let handle = tokio::spawn(async move {
            let result = fetch_fixture(api.as_ref(), fixture_id).await;
            let _ = tx
                .send(FeedOutcome {
                    generation,
                    request,
                    result,
                })
                .await;
        });
        self.current_fetch = Some(handle);
    }

    fn cancel_fetch(&mut self) {
        if let Some(handle) = self.current_fetch.take() {
            handle.abort();
        }
    }

    /// Explicit stop: cancel the interval binding, keep the last-fetched
    /// state in place.
    fn stop_feed(&mut self) {
        self.cancel_fetch();
        self.feed_generation += 1;
        if let Some(binding) = self.session.feed.take() {
            info!("Stopped auto-refresh for fixture {}", binding.fixture_id);
        }
    }

    pub fn auto_refresh_active(&self) -> bool {
        self.session.feed.is_some_and(|binding| binding.auto_refresh)
    }

    pub fn handle_feed_outcome(&mut self, outcome: FeedOutcome, now: Instant) {
        if outcome.generation != self.feed_generation {
            debug!(
                "Discarding stale feed outcome (outcome gen {}, current gen {})",
                outcome.generation, self.feed_generation
            );
            return;
        }
        self.current_fetch = None;

        match (outcome.request, outcome.result) {
            (ReconcileRequest::UserLoad(fixture_id), Ok((lineups, detail))) => {
                reconcile::apply_user_load(&mut self.session, &lineups, &detail);
                self.session.feed = Some(FeedBinding {
                    fixture_id,
                    auto_refresh: true,
                });
                info!(
                    "Loaded fixture {fixture_id}: {} vs {}",
                    self.session.team_a.name, self.session.team_b.name
                );
                self.publisher.mark_identity_changed(now);
                self.send_outbound(&OutboundMessage::FeedStatus {
                    ok: true,
                    message: format!("fixture {fixture_id} loaded"),
                });
            }
            (ReconcileRequest::UserLoad(fixture_id), Err(e)) => {
                // Prior state stays untouched; only the operator hears
                // about the failure.
                warn!("Fixture {fixture_id} load failed: {e}");
                self.send_outbound(&OutboundMessage::FeedStatus {
                    ok: false,
                    message: format!("failed to load fixture {fixture_id}: {e}"),
                });
            }
            (ReconcileRequest::AutoTick(_), Ok((lineups, detail))) => {
                reconcile::apply_auto_tick(&mut self.session, &lineups, &detail);
                self.publisher.mark_changed(now);
            }
            (ReconcileRequest::AutoTick(fixture_id), Err(e)) => {
                // Swallowed: the next interval tick retries. The refresh
                // loop must never stop or clear state on a failed tick.
                warn!("Auto-refresh tick for fixture {fixture_id} failed, retrying next interval: {e}");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Emit a frame if the debounce deadline has passed. The frame is
    /// built from whatever state is current at fire time, so a burst
    /// never leaks intermediate states.
    pub fn flush_broadcast(&mut self, now: Instant) {
        if !self.publisher.take_due(now) {
            return;
        }
        match build_frame(&self.session, chrono::Utc::now()) {
            Ok(frame) => self.send_outbound(&OutboundMessage::StateFrame(frame)),
            Err(e) => warn!("Skipping broadcast, layout error: {e}"),
        }
    }

    /// Emit selection callbacks for clicks whose double-click window has
    /// elapsed.
    pub fn fire_clicks(&mut self, now: Instant) {
        for (team, seat) in self.drag.fire_due_clicks(now) {
            self.send_outbound(&OutboundMessage::SeatSelected { team, seat });
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens with `tokio::select!` on:
/// 1. Hub events (control messages from connected clients)
/// 2. Feed fetch outcomes
/// 3. The auto-refresh interval (only while a fixture is bound)
/// 4. The debounce deadline and the pending-click deadline
pub async fn run(
    mut ws_rx: mpsc::Receiver<WsEvent>,
    mut feed_rx: mpsc::Receiver<FeedOutcome>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let poll_interval = Duration::from_secs(state.config.feed.poll_interval_secs.max(1));
    let mut refresh = time::interval(poll_interval);
    refresh.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first real
    // refresh happens one full interval after binding.
    refresh.tick().await;

    loop {
        let broadcast_deadline = state.publisher.deadline();
        let click_deadline = state.drag.next_click_deadline();

        tokio::select! {
            event = ws_rx.recv() => {
                match event {
                    Some(WsEvent::Connected { addr }) => {
                        info!("Client connected from {addr}");
                    }
                    Some(WsEvent::Disconnected { addr }) => {
                        info!("Client {addr} disconnected");
                    }
                    Some(WsEvent::Message(json)) => {
                        state.handle_control_json(&json, Instant::now());
                    }
                    None => {
                        info!("Hub channel closed, shutting down");
                        break;
                    }
                }
            }

            outcome = feed_rx.recv() => {
                if let Some(outcome) = outcome {
                    state.handle_feed_outcome(outcome, Instant::now());
                }
            }

            _ = refresh.tick(), if state.auto_refresh_active() => {
                if let Some(binding) = state.session.feed {
                    state.start_fetch(ReconcileRequest::AutoTick(binding.fixture_id));
                }
            }

            _ = sleep_until_opt(broadcast_deadline), if broadcast_deadline.is_some() => {
                state.flush_broadcast(Instant::now());
            }

            _ = sleep_until_opt(click_deadline), if click_deadline.is_some() => {
                state.fire_clicks(Instant::now());
            }
        }
    }

    state.cancel_fetch();
    info!("Application event loop exiting");
    Ok(())
}

/// Sleep until the deadline, or forever when there is none. Guarded
/// select branches never poll the pending arm.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
