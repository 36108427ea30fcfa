// Merging polled fixture data into the session.
//
// Two deliberately separate policies, dispatched by request variant: a
// user-initiated load replaces both teams wholesale and discards manual
// positioning, while a background auto-refresh tick merges selectively so
// nudges the operator made between ticks survive. Do not collapse these
// into one code path.

use crate::feed::client::{FeedEvent, FixtureDetail, FixtureLineups, LineupSide};
use crate::session::{Formation, MatchStatus, Player, Session, TeamState};

/// Goal-type detail string that must never count toward a player's goals.
pub const MISSED_PENALTY: &str = "Missed Penalty";

const GOAL_KIND: &str = "Goal";
const CARD_KIND: &str = "Card";

/// A reconcile to perform against a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileRequest {
    /// Operator asked to load this fixture: full replace.
    UserLoad(u64),
    /// Background refresh of the bound fixture: selective merge.
    AutoTick(u64),
}

impl ReconcileRequest {
    pub fn fixture_id(&self) -> u64 {
        match *self {
            ReconcileRequest::UserLoad(id) | ReconcileRequest::AutoTick(id) => id,
        }
    }
}

// ---------------------------------------------------------------------------
// Formation parsing
// ---------------------------------------------------------------------------

/// Parse a formation string ("4-2-3-1") into a [`Formation`], prefixing
/// the implicit goalkeeper line. Returns `None` for empty, non-numeric,
/// or zero-count input.
pub fn try_parse_formation(raw: &str) -> Option<Formation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut lines = vec![1];
    for part in trimmed.split('-') {
        match part.trim().parse::<usize>() {
            Ok(count) if count > 0 => lines.push(count),
            _ => return None,
        }
    }
    if lines.len() < 2 {
        return None;
    }
    Some(Formation::new(trimmed, lines))
}

/// Feed-side parsing: a missing or unparseable feed formation string
/// falls back to the default 4-3-3 instead of failing the reconcile.
pub fn parse_formation(raw: Option<&str>) -> Formation {
    raw.and_then(try_parse_formation).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Event attribution
// ---------------------------------------------------------------------------

/// Whether an event belongs to a player. Feeds are not guaranteed to
/// supply a stable identifier for every event, so both the id and the
/// exact name are checked.
fn event_matches(player_id: Option<u64>, player_name: &str, event: &FeedEvent) -> bool {
    if let (Some(pid), Some(eid)) = (player_id, event.player_id) {
        if pid == eid {
            return true;
        }
    }
    !player_name.is_empty() && event.player_name.as_deref() == Some(player_name)
}

/// Build a roster from one lineup side, attributing goal and card events.
pub fn build_roster(side: &LineupSide, events: &[FeedEvent]) -> Vec<Player> {
    side.starters
        .iter()
        .map(|starter| {
            let mine: Vec<&FeedEvent> = events
                .iter()
                .filter(|e| event_matches(starter.id, &starter.name, e))
                .collect();
            let goals = mine
                .iter()
                .filter(|e| e.kind == GOAL_KIND && e.detail != MISSED_PENALTY)
                .count() as u32;
            let yellow_card = mine
                .iter()
                .any(|e| e.kind == CARD_KIND && e.detail.contains("Yellow"));
            let red_card = mine
                .iter()
                .any(|e| e.kind == CARD_KIND && e.detail.contains("Red"));

            Player {
                number: starter.number.map(|n| n.to_string()).unwrap_or_default(),
                name: starter.name.clone(),
                yellow_card,
                red_card,
                goals,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Merge policies
// ---------------------------------------------------------------------------

/// User-initiated load: replace both teams' identity, formation, roster,
/// and score wholesale. Manual positioning is presumed stale after a full
/// lineup swap, so both override maps are cleared (via the formation
/// replacement).
pub fn apply_user_load(session: &mut Session, lineups: &FixtureLineups, detail: &FixtureDetail) {
    replace_side(&mut session.team_a, &lineups.home, detail.score_home, &detail.events);
    replace_side(&mut session.team_b, &lineups.away, detail.score_away, &detail.events);
    session.status = MatchStatus {
        code: detail.status_code.clone(),
        elapsed: detail.elapsed,
    };
}

fn replace_side(team: &mut TeamState, side: &LineupSide, score: u32, events: &[FeedEvent]) {
    team.name = side.team_name.clone();
    team.set_formation(parse_formation(side.formation.as_deref()));
    team.roster = build_roster(side, events);
    team.score = score;
}

/// Auto-refresh tick: replace roster, score, and status, but leave each
/// team's formation and override map untouched so in-progress manual
/// edits survive.
pub fn apply_auto_tick(session: &mut Session, lineups: &FixtureLineups, detail: &FixtureDetail) {
    session.team_a.roster = build_roster(&lineups.home, &detail.events);
    session.team_b.roster = build_roster(&lineups.away, &detail.events);
    session.team_a.score = detail.score_home;
    session.team_b.score = detail.score_away;
    session.status = MatchStatus {
        code: detail.status_code.clone(),
        elapsed: detail.elapsed,
    };
}
