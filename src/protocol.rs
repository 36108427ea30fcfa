// Wire protocol for the websocket hub: control messages inbound from the
// operator surface, tagged outbound messages toward the overlay viewer
// and operator surface.

use serde::{Deserialize, Serialize};

use crate::broadcast::BroadcastFrame;
use crate::session::{PlayerEdit, Session, TeamSide};

/// A message from the operator's control surface. Pointer coordinates are
/// surface-local pixels; the engine converts them using the most recently
/// reported surface geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ControlMessage {
    /// The pitch surface for one team changed pixel size.
    SurfaceResized { team: TeamSide, width: f64, height: f64 },
    /// Pointer pressed over a seat card.
    PointerDown { team: TeamSide, seat: usize, x: f64, y: f64 },
    PointerMove { team: TeamSide, x: f64, y: f64 },
    PointerUp { team: TeamSide },
    /// Formation string in the usual "4-4-2" form.
    SetFormation { team: TeamSide, formation: String },
    SetScore { team: TeamSide, score: u32 },
    SetTeamName { team: TeamSide, name: String },
    SetColors { team: TeamSide, shirt: String, number: String },
    EditPlayer { team: TeamSide, seat: usize, edit: PlayerEdit },
    /// Selection event from the team-catalog collaborator.
    SelectCatalogTeam { index: usize, target: TeamSide },
    ToggleVerticalMode,
    ResetLayout { team: TeamSide },
    SwapTeams,
    /// Load a fixture from the live feed and begin auto-refresh.
    LoadFixture { fixture_id: u64 },
    /// Stop auto-refresh, keeping the last-fetched state.
    StopFeed,
    /// Replace the session from a snapshot produced earlier.
    RestoreSnapshot { session: Box<Session> },
    /// Ask the engine to emit the current session as a snapshot.
    RequestSnapshot,
}

/// A message pushed out through the hub.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// The composite overlay state (schema documented on
    /// [`BroadcastFrame`]).
    StateFrame(BroadcastFrame),
    /// Result of a user-initiated fixture load.
    FeedStatus { ok: bool, message: String },
    /// A seat was clicked (single click, after the double-click window).
    SeatSelected { team: TeamSide, seat: usize },
    /// A seat was double-clicked: the surface should open its editor.
    EditRequested { team: TeamSide, seat: usize },
    /// Snapshot reply for the file-dialog collaborator.
    Snapshot { session: Box<Session> },
}

impl OutboundMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
