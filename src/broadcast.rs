// Broadcast payload assembly and the debounce scheduler.
//
// The frame is the full composite state the external overlay renders:
// both teams' identity/score/status plus every seat's resolved final
// position (override-resolved, mode-transformed). Emission is debounced
// so bursts of rapid changes (drag moves, reconcile fallout) coalesce
// into one outward message carrying the latest state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::layout::overrides::effective_positions;
use crate::layout::{transform, LayoutError};
use crate::session::{Session, TeamLogo, TeamSide};

/// Quiet period after the last observed change before a frame goes out.
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Frame payloads
// ---------------------------------------------------------------------------

/// One rendered seat in the outward payload. `id` is the stable seat
/// index downstream consumers key off.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatFrame {
    pub id: usize,
    pub team: TeamSide,
    pub number: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub yellow_card: bool,
    pub red_card: bool,
    pub goals: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub name: String,
    pub formation: String,
    pub shirt_color: String,
    pub number_color: String,
    pub logo: Option<TeamLogo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub score_a: u32,
    pub score_b: u32,
    pub elapsed: Option<u32>,
    pub status: String,
    pub team_a: TeamSummary,
    pub team_b: TeamSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSeats {
    pub a: Vec<SeatFrame>,
    pub b: Vec<SeatFrame>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastFrame {
    pub timestamp: DateTime<Utc>,
    pub vertical_mode: bool,
    #[serde(rename = "match")]
    pub match_state: MatchSummary,
    pub teams: TeamSeats,
}

/// Assemble the outward frame from the full session.
pub fn build_frame(
    session: &Session,
    timestamp: DateTime<Utc>,
) -> Result<BroadcastFrame, LayoutError> {
    Ok(BroadcastFrame {
        timestamp,
        vertical_mode: session.vertical_mode,
        match_state: MatchSummary {
            score_a: session.team_a.score,
            score_b: session.team_b.score,
            elapsed: session.status.elapsed,
            status: session.status.code.clone(),
            team_a: team_summary(session, TeamSide::A),
            team_b: team_summary(session, TeamSide::B),
        },
        teams: TeamSeats {
            a: seat_frames(session, TeamSide::A)?,
            b: seat_frames(session, TeamSide::B)?,
        },
    })
}

fn team_summary(session: &Session, side: TeamSide) -> TeamSummary {
    let team = session.team(side);
    TeamSummary {
        name: team.name.clone(),
        formation: team.formation.name.clone(),
        shirt_color: team.shirt_color.clone(),
        number_color: team.number_color.clone(),
        logo: team.logo.clone(),
    }
}

fn seat_frames(session: &Session, side: TeamSide) -> Result<Vec<SeatFrame>, LayoutError> {
    let team = session.team(side);
    let positions = effective_positions(team)?;
    let frames = positions
        .into_iter()
        .enumerate()
        .map(|(seat, position)| {
            let display = transform::project(session.vertical_mode, side, position);
            // A roster shorter than the formation (mid-edit) renders the
            // extra seats as blanks rather than failing the frame.
            let player = team.roster.get(seat).cloned().unwrap_or_default();
            SeatFrame {
                id: seat,
                team: side,
                number: player.number,
                name: player.name,
                x: round2(display.x),
                y: round2(display.y),
                yellow_card: player.yellow_card,
                red_card: player.red_card,
                goals: player.goals,
            }
        })
        .collect();
    Ok(frames)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Debounce scheduler
// ---------------------------------------------------------------------------

/// Tracks when the next frame is due. Starts with no deadline, so nothing
/// is emitted until a real change is observed -- the first render must
/// never push a spurious startup transition at external consumers.
#[derive(Debug, Default)]
pub struct DebounceScheduler {
    deadline: Option<Instant>,
}

impl DebounceScheduler {
    /// An observed state change: (re)start the quiet period.
    pub fn mark_changed(&mut self, now: Instant) {
        self.deadline = Some(now + DEBOUNCE_QUIET);
    }

    /// A team-identity change: flush after a zero-delay tick instead of
    /// the full quiet period. Never pushes an already-earlier deadline
    /// later.
    pub fn mark_identity_changed(&mut self, now: Instant) {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < now => existing,
            _ => now,
        });
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the deadline if it has passed. Returns true exactly once
    /// per elapsed deadline.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
