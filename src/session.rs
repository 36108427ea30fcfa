// Session data model: formations, rosters, team state, snapshots.

use serde::{Deserialize, Serialize};

use crate::layout::overrides::OverrideMap;

/// Maximum accepted length for player/team names at the edit boundary.
pub const MAX_NAME_LEN: usize = 40;

/// Maximum accepted length for a shirt number string.
pub const MAX_NUMBER_LEN: usize = 3;

/// Number of players in a default starting eleven.
pub const DEFAULT_ROSTER_SIZE: usize = 11;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Which of the two teams a value belongs to. Team A renders on the left
/// (split mode) or top half (combined-vertical mode), team B on the right
/// or bottom half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    A,
    B,
}

impl TeamSide {
    /// Both sides, in A-then-B order.
    pub const BOTH: [TeamSide; 2] = [TeamSide::A, TeamSide::B];

    /// Stable array index for per-side storage.
    pub fn index(self) -> usize {
        match self {
            TeamSide::A => 0,
            TeamSide::B => 1,
        }
    }
}

/// A normalized on-pitch coordinate, both axes in percent of pitch
/// width/height (`[0, 100]`), stored in split-mode space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Clamp both axes into the pitch percentage range.
    pub fn clamped(self) -> Self {
        Position {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// An abstract formation: how many players occupy each horizontal line,
/// goalkeeper first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formation {
    /// Display name, e.g. "4-3-3".
    pub name: String,
    /// Ordered line sizes from the goalkeeper line outward. Line 0 is
    /// always the goalkeeper line (exactly 1).
    pub lines: Vec<usize>,
}

impl Formation {
    pub fn new(name: impl Into<String>, lines: Vec<usize>) -> Self {
        Formation {
            name: name.into(),
            lines,
        }
    }

    /// Total number of seats (players) this formation places.
    pub fn seat_count(&self) -> usize {
        self.lines.iter().sum()
    }
}

impl Default for Formation {
    fn default() -> Self {
        Formation::new("4-3-3", vec![1, 4, 3, 3])
    }
}

/// A single roster entry. The index within the roster vector is the stable
/// seat index referenced by overrides and broadcast payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub number: String,
    pub name: String,
    pub yellow_card: bool,
    pub red_card: bool,
    pub goals: u32,
}

impl Default for Player {
    fn default() -> Self {
        Player {
            number: String::new(),
            name: String::new(),
            yellow_card: false,
            red_card: false,
            goals: 0,
        }
    }
}

/// Opaque logo references from the team catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamLogo {
    pub svg: String,
    pub png: String,
}

/// Coarse match status mirrored from the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchStatus {
    /// Short status code, e.g. "NS", "1H", "HT", "FT".
    pub code: String,
    /// Elapsed minutes, when the feed reports them.
    pub elapsed: Option<u32>,
}

impl Default for MatchStatus {
    fn default() -> Self {
        MatchStatus {
            code: "NS".to_string(),
            elapsed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Team state
// ---------------------------------------------------------------------------

/// Everything the overlay knows about one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamState {
    pub name: String,
    pub logo: Option<TeamLogo>,
    pub shirt_color: String,
    pub number_color: String,
    pub score: u32,
    pub formation: Formation,
    pub roster: Vec<Player>,
    /// Manually dragged seat positions, keyed by seat index, stored in
    /// split-mode coordinate space.
    pub overrides: OverrideMap,
}

impl TeamState {
    /// A team with the default eleven and formation.
    pub fn with_defaults(name: &str, shirt_color: &str) -> Self {
        let roster = (1..=DEFAULT_ROSTER_SIZE)
            .map(|n| Player {
                number: n.to_string(),
                name: format!("Player {n}"),
                ..Player::default()
            })
            .collect();

        TeamState {
            name: name.to_string(),
            logo: None,
            shirt_color: shirt_color.to_string(),
            number_color: "#ffffff".to_string(),
            score: 0,
            formation: Formation::default(),
            roster,
            overrides: OverrideMap::default(),
        }
    }

    /// Replace the formation. Seat indices are not meaningful across
    /// differing line structures, so the override map is cleared in full.
    pub fn set_formation(&mut self, formation: Formation) {
        self.formation = formation;
        self.overrides.clear();
    }

    /// Drop all manual positioning for this team.
    pub fn reset_layout(&mut self) {
        self.overrides.clear();
    }

    /// Apply an edit to one roster seat. Returns false (state untouched)
    /// when the seat index is out of range.
    ///
    /// Card flags are mutually exclusive here: setting one clears the
    /// other. Feed reconciliation writes the flags directly and may leave
    /// both set; the model tolerates that.
    pub fn edit_player(&mut self, seat: usize, edit: PlayerEdit) -> bool {
        let Some(player) = self.roster.get_mut(seat) else {
            return false;
        };

        if let Some(number) = edit.number {
            player.number = truncated(&number, MAX_NUMBER_LEN);
        }
        if let Some(name) = edit.name {
            player.name = truncated(&name, MAX_NAME_LEN);
        }
        if let Some(yellow) = edit.yellow_card {
            player.yellow_card = yellow;
            if yellow {
                player.red_card = false;
            }
        }
        if let Some(red) = edit.red_card {
            player.red_card = red;
            if red {
                player.yellow_card = false;
            }
        }
        if let Some(goals) = edit.goals {
            player.goals = goals;
        }
        true
    }

    /// Rename the team, applying the edit-boundary length limit.
    pub fn set_name(&mut self, name: &str) {
        self.name = truncated(name, MAX_NAME_LEN);
    }
}

impl Default for TeamState {
    fn default() -> Self {
        TeamState::with_defaults("Home", "#c8102e")
    }
}

/// A partial edit of one roster seat; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerEdit {
    pub number: Option<String>,
    pub name: Option<String>,
    pub yellow_card: Option<bool>,
    pub red_card: Option<bool>,
    pub goals: Option<u32>,
}

/// Truncate on a char boundary so multi-byte names can't split mid-char.
fn truncated(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Binding to a live-match fixture for background auto-refresh. Absent by
/// default; cleared on explicit stop. Never serialized into snapshots --
/// a restored session starts unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedBinding {
    pub fixture_id: u64,
    pub auto_refresh: bool,
}

/// The full overlay session: both teams plus the display-mode flag. This
/// is the unit exported/imported as a snapshot and the unit serialized
/// for broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub team_a: TeamState,
    pub team_b: TeamState,
    /// false = split (two pitches), true = combined-vertical (one pitch,
    /// mirrored halves).
    pub vertical_mode: bool,
    pub status: MatchStatus,
    #[serde(skip)]
    pub feed: Option<FeedBinding>,
}

impl Session {
    pub fn team(&self, side: TeamSide) -> &TeamState {
        match side {
            TeamSide::A => &self.team_a,
            TeamSide::B => &self.team_b,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut TeamState {
        match side {
            TeamSide::A => &mut self.team_a,
            TeamSide::B => &mut self.team_b,
        }
    }

    /// Swap the two teams wholesale. Manual positioning does not survive a
    /// swap: seat indices now describe different players.
    pub fn swap_teams(&mut self) {
        std::mem::swap(&mut self.team_a, &mut self.team_b);
        self.team_a.overrides.clear();
        self.team_b.overrides.clear();
    }

    /// Serialize the session for the file-dialog collaborator.
    pub fn to_snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a session from snapshot JSON. Unknown fields are ignored
    /// and missing ones default; override entries beyond each team's seat
    /// count are pruned rather than rejected.
    pub fn from_snapshot_json(json: &str) -> serde_json::Result<Session> {
        let mut session: Session = serde_json::from_str(json)?;
        session.normalize();
        Ok(session)
    }

    /// Bring externally supplied session data back into invariant: prune
    /// override entries beyond each team's seat count and drop any feed
    /// binding (a restored session starts unbound).
    pub fn normalize(&mut self) {
        let seats_a = self.team_a.formation.seat_count();
        let seats_b = self.team_b.formation.seat_count();
        self.team_a.overrides.prune(seats_a);
        self.team_b.overrides.prune(seats_b);
        self.feed = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Session {
            team_a: TeamState::with_defaults("Home", "#c8102e"),
            team_b: TeamState::with_defaults("Away", "#003087"),
            vertical_mode: false,
            status: MatchStatus::default(),
            feed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
