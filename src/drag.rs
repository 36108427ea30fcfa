// Pointer gesture handling: drag vs. click disambiguation per team track.
//
// The controller is a pure state machine with time injected as `Instant`
// parameters; the app event loop owns the actual sleep timers and calls
// `fire_due_clicks` when a click deadline elapses. One track per team
// side, so simultaneous drags on team A and team B never interfere.

use tokio::time::{Duration, Instant};

use crate::layout::transform;
use crate::session::{Position, TeamSide};

/// Cumulative pointer displacement (surface pixels) below which an
/// interaction is a click, at or above which it becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 6.0;

/// Delay before a single click fires, leaving room for a second press to
/// upgrade the interaction to a double-click.
pub const CLICK_DELAY: Duration = Duration::from_millis(250);

/// A point in surface-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PxPoint {
    pub x: f64,
    pub y: f64,
}

impl PxPoint {
    pub fn new(x: f64, y: f64) -> Self {
        PxPoint { x, y }
    }

    fn distance_to(self, other: PxPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Pixel dimensions of one team's pitch surface, reported by the control
/// surface. Carried as explicit controller state rather than a global so
/// its lifecycle is tied to the surface that reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        SurfaceSize {
            width: 720.0,
            height: 1000.0,
        }
    }
}

/// What the caller must do in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragAction {
    None,
    /// Store this split-space position as the seat's override.
    OverrideMoved { seat: usize, position: Position },
    /// A drag finished; schedule a debounced broadcast, emit no click.
    DragEnded { seat: usize },
    /// A click is pending; fire the selection callback at `fire_at`
    /// unless a second press upgrades it first.
    ClickArmed { seat: usize, fire_at: Instant },
    /// Rapid second press on the same seat: open the edit affordance now.
    DoubleClick { seat: usize },
}

#[derive(Debug, Clone, Copy, Default)]
enum TrackState {
    #[default]
    Idle,
    Pressed {
        seat: usize,
        start: PxPoint,
        grab_offset: PxPoint,
    },
    Dragging {
        seat: usize,
        grab_offset: PxPoint,
    },
}

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    seat: usize,
    fire_at: Instant,
}

#[derive(Debug, Default)]
struct PointerTrack {
    state: TrackState,
    surface: SurfaceSize,
    pending_click: Option<PendingClick>,
}

/// Per-team pointer state machine: `Idle -> Pressed -> {Dragging |
/// ClickPending} -> Idle`.
#[derive(Debug, Default)]
pub struct DragController {
    tracks: [PointerTrack; 2],
}

impl DragController {
    pub fn set_surface(&mut self, side: TeamSide, surface: SurfaceSize) {
        self.tracks[side.index()].surface = surface;
    }

    pub fn surface(&self, side: TeamSide) -> SurfaceSize {
        self.tracks[side.index()].surface
    }

    /// Pointer-down over a seat. `seat_center` is the seat's current
    /// visual center in surface pixels; the offset between it and the
    /// pointer is kept so dragging holds the grabbed point under the
    /// cursor instead of snapping the center to it.
    pub fn on_pointer_down(
        &mut self,
        side: TeamSide,
        seat: usize,
        pointer: PxPoint,
        seat_center: PxPoint,
        now: Instant,
    ) -> DragAction {
        let track = &mut self.tracks[side.index()];

        // A second press while a click is pending either upgrades to a
        // double-click (same seat, within the window) or supersedes the
        // pending selection (different seat).
        if let Some(pending) = track.pending_click.take() {
            if pending.seat == seat && now < pending.fire_at {
                track.state = TrackState::Idle;
                return DragAction::DoubleClick { seat };
            }
        }

        track.state = TrackState::Pressed {
            seat,
            start: pointer,
            grab_offset: PxPoint::new(pointer.x - seat_center.x, pointer.y - seat_center.y),
        };
        DragAction::None
    }

    /// Pointer-move. Crossing the displacement threshold promotes the
    /// press to a drag; every move while dragging yields the seat's new
    /// override position (inverse mode-transformed, clamped).
    pub fn on_pointer_move(
        &mut self,
        side: TeamSide,
        pointer: PxPoint,
        vertical_mode: bool,
    ) -> DragAction {
        let track = &mut self.tracks[side.index()];
        match track.state {
            TrackState::Idle => DragAction::None,
            TrackState::Pressed {
                seat,
                start,
                grab_offset,
            } => {
                if pointer.distance_to(start) < DRAG_THRESHOLD_PX {
                    return DragAction::None;
                }
                track.state = TrackState::Dragging { seat, grab_offset };
                DragAction::OverrideMoved {
                    seat,
                    position: stored_position(track.surface, grab_offset, pointer, vertical_mode, side),
                }
            }
            TrackState::Dragging { seat, grab_offset } => DragAction::OverrideMoved {
                seat,
                position: stored_position(track.surface, grab_offset, pointer, vertical_mode, side),
            },
        }
    }

    /// Pointer-up. Before the threshold this arms a delayed click; after a
    /// drag it ends the drag with no click.
    pub fn on_pointer_up(&mut self, side: TeamSide, now: Instant) -> DragAction {
        let track = &mut self.tracks[side.index()];
        let state = std::mem::take(&mut track.state);
        match state {
            TrackState::Idle => DragAction::None,
            TrackState::Pressed { seat, .. } => {
                let fire_at = now + CLICK_DELAY;
                track.pending_click = Some(PendingClick { seat, fire_at });
                DragAction::ClickArmed { seat, fire_at }
            }
            TrackState::Dragging { seat, .. } => DragAction::DragEnded { seat },
        }
    }

    /// Earliest pending-click deadline across both tracks, for the event
    /// loop's sleep.
    pub fn next_click_deadline(&self) -> Option<Instant> {
        self.tracks
            .iter()
            .filter_map(|t| t.pending_click.as_ref().map(|p| p.fire_at))
            .min()
    }

    /// Take every pending click whose deadline has passed. Each entry is a
    /// selection callback the caller should emit.
    pub fn fire_due_clicks(&mut self, now: Instant) -> Vec<(TeamSide, usize)> {
        let mut fired = Vec::new();
        for side in TeamSide::BOTH {
            let track = &mut self.tracks[side.index()];
            if let Some(pending) = track.pending_click {
                if pending.fire_at <= now {
                    track.pending_click = None;
                    fired.push((side, pending.seat));
                }
            }
        }
        fired
    }
}

/// Convert the pointer into the seat's stored (split-space) position:
/// shift by the grab offset, normalize to display percent, invert the
/// mode projection, clamp to the pitch.
fn stored_position(
    surface: SurfaceSize,
    grab_offset: PxPoint,
    pointer: PxPoint,
    vertical_mode: bool,
    side: TeamSide,
) -> Position {
    let center = PxPoint::new(pointer.x - grab_offset.x, pointer.y - grab_offset.y);
    let display = Position::new(
        center.x / surface.width * 100.0,
        center.y / surface.height * 100.0,
    );
    transform::unproject(vertical_mode, side, display).clamped()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::transform::project;

    fn surface() -> SurfaceSize {
        SurfaceSize {
            width: 800.0,
            height: 1000.0,
        }
    }

    fn controller() -> DragController {
        let mut c = DragController::default();
        c.set_surface(TeamSide::A, surface());
        c.set_surface(TeamSide::B, surface());
        c
    }

    #[tokio::test]
    async fn sub_threshold_release_arms_a_click_and_never_moves() {
        let mut c = controller();
        let now = Instant::now();
        let center = PxPoint::new(400.0, 500.0);

        c.on_pointer_down(TeamSide::A, 4, center, center, now);
        // 5 px of travel stays below the 6 px threshold.
        let action = c.on_pointer_move(TeamSide::A, PxPoint::new(403.0, 504.0), false);
        assert_eq!(action, DragAction::None);

        match c.on_pointer_up(TeamSide::A, now) {
            DragAction::ClickArmed { seat, fire_at } => {
                assert_eq!(seat, 4);
                assert_eq!(fire_at, now + CLICK_DELAY);
            }
            other => panic!("expected ClickArmed, got {other:?}"),
        }

        // Not due yet; due after the delay.
        assert!(c.fire_due_clicks(now + Duration::from_millis(100)).is_empty());
        assert_eq!(
            c.fire_due_clicks(now + CLICK_DELAY),
            vec![(TeamSide::A, 4)]
        );
        assert!(c.next_click_deadline().is_none());
    }

    #[tokio::test]
    async fn crossing_threshold_moves_override_and_suppresses_click() {
        let mut c = controller();
        let now = Instant::now();
        let center = PxPoint::new(400.0, 500.0);

        c.on_pointer_down(TeamSide::A, 2, center, center, now);
        let action = c.on_pointer_move(TeamSide::A, PxPoint::new(410.0, 500.0), false);
        match action {
            DragAction::OverrideMoved { seat, position } => {
                assert_eq!(seat, 2);
                assert!((position.x - 51.25).abs() < 1e-9);
                assert!((position.y - 50.0).abs() < 1e-9);
            }
            other => panic!("expected OverrideMoved, got {other:?}"),
        }

        assert_eq!(c.on_pointer_up(TeamSide::A, now), DragAction::DragEnded { seat: 2 });
        assert!(c.next_click_deadline().is_none());
        assert!(c.fire_due_clicks(now + CLICK_DELAY).is_empty());
    }

    #[tokio::test]
    async fn grab_offset_keeps_grabbed_point_under_cursor() {
        let mut c = controller();
        let now = Instant::now();
        let center = PxPoint::new(100.0, 100.0);
        // Grab the card 4 px right / 3 px below its center.
        c.on_pointer_down(TeamSide::A, 0, PxPoint::new(104.0, 103.0), center, now);
        let action = c.on_pointer_move(TeamSide::A, PxPoint::new(204.0, 103.0), false);
        match action {
            DragAction::OverrideMoved { position, .. } => {
                // Virtual center is (200, 100) -> (25%, 10%).
                assert!((position.x - 25.0).abs() < 1e-9);
                assert!((position.y - 10.0).abs() < 1e-9);
            }
            other => panic!("expected OverrideMoved, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn double_click_upgrades_pending_click() {
        let mut c = controller();
        let now = Instant::now();
        let p = PxPoint::new(400.0, 500.0);

        c.on_pointer_down(TeamSide::A, 7, p, p, now);
        c.on_pointer_up(TeamSide::A, now);
        let action = c.on_pointer_down(TeamSide::A, 7, p, p, now + Duration::from_millis(120));
        assert_eq!(action, DragAction::DoubleClick { seat: 7 });
        // The pending single click was cancelled.
        assert!(c.fire_due_clicks(now + CLICK_DELAY).is_empty());
    }

    #[tokio::test]
    async fn press_on_a_different_seat_supersedes_pending_click() {
        let mut c = controller();
        let now = Instant::now();
        let p = PxPoint::new(400.0, 500.0);

        c.on_pointer_down(TeamSide::A, 1, p, p, now);
        c.on_pointer_up(TeamSide::A, now);
        let action = c.on_pointer_down(TeamSide::A, 2, p, p, now + Duration::from_millis(50));
        assert_eq!(action, DragAction::None);
        assert!(c.fire_due_clicks(now + CLICK_DELAY).is_empty());
    }

    #[tokio::test]
    async fn combined_mode_drag_stores_split_space_position() {
        let mut c = controller();
        let now = Instant::now();
        let start = PxPoint::new(400.0, 200.0);
        c.on_pointer_down(TeamSide::A, 9, start, start, now);
        let pointer = PxPoint::new(480.0, 300.0);
        let action = c.on_pointer_move(TeamSide::A, pointer, true);

        let DragAction::OverrideMoved { position, .. } = action else {
            panic!("expected OverrideMoved, got {action:?}");
        };
        // Projecting the stored position back into combined space must land
        // on the display point the pointer described.
        let display = project(true, TeamSide::A, position);
        assert!((display.x - 60.0).abs() < 1e-6);
        assert!((display.y - 30.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn combined_mode_team_b_inverse_includes_mirror() {
        let mut c = controller();
        let now = Instant::now();
        let start = PxPoint::new(400.0, 900.0);
        c.on_pointer_down(TeamSide::B, 3, start, start, now);
        // The bottom edge of the combined pitch is team B's advanced end
        // after the mirror, so the stored (split-space) y must be low.
        let action = c.on_pointer_move(TeamSide::B, PxPoint::new(400.0, 960.0), true);
        let DragAction::OverrideMoved { position, .. } = action else {
            panic!("expected OverrideMoved, got {action:?}");
        };
        // Display (50, 96) -> mirrored split y of 4.
        assert!((position.x - 50.0).abs() < 1e-6);
        assert!((position.y - 4.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn moves_are_clamped_to_the_pitch() {
        let mut c = controller();
        let now = Instant::now();
        let start = PxPoint::new(10.0, 10.0);
        c.on_pointer_down(TeamSide::A, 5, start, start, now);
        let action = c.on_pointer_move(TeamSide::A, PxPoint::new(-300.0, -300.0), false);
        let DragAction::OverrideMoved { position, .. } = action else {
            panic!("expected OverrideMoved, got {action:?}");
        };
        assert_eq!(position, Position::new(0.0, 0.0));
    }

    #[tokio::test]
    async fn team_tracks_are_independent() {
        let mut c = controller();
        let now = Instant::now();
        let pa = PxPoint::new(100.0, 100.0);
        let pb = PxPoint::new(600.0, 600.0);

        c.on_pointer_down(TeamSide::A, 1, pa, pa, now);
        c.on_pointer_down(TeamSide::B, 8, pb, pb, now);

        let a = c.on_pointer_move(TeamSide::A, PxPoint::new(140.0, 100.0), false);
        let b = c.on_pointer_move(TeamSide::B, PxPoint::new(600.0, 660.0), false);
        assert!(matches!(a, DragAction::OverrideMoved { seat: 1, .. }));
        assert!(matches!(b, DragAction::OverrideMoved { seat: 8, .. }));

        assert_eq!(c.on_pointer_up(TeamSide::A, now), DragAction::DragEnded { seat: 1 });
        assert_eq!(c.on_pointer_up(TeamSide::B, now), DragAction::DragEnded { seat: 8 });
    }

    #[tokio::test]
    async fn move_without_press_is_ignored() {
        let mut c = controller();
        let action = c.on_pointer_move(TeamSide::A, PxPoint::new(10.0, 10.0), false);
        assert_eq!(action, DragAction::None);
        assert_eq!(c.on_pointer_up(TeamSide::A, Instant::now()), DragAction::None);
    }
}
