// Display-mode projection between split space (two independent pitches)
// and combined-vertical space (one pitch, mirrored top/bottom halves).
//
// The transform is a rendering-time projection only: overrides are always
// stored in split space, and drags performed in combined mode go through
// the inverse before storage so a mode toggle reproduces the same
// on-screen position.

use crate::session::{Position, TeamSide};

pub const TOP_START: f64 = 2.0;
pub const TOP_SPAN: f64 = 50.0;
pub const BOTTOM_START: f64 = 48.0;
pub const BOTTOM_SPAN: f64 = 50.0;
pub const WIDEN_FACTOR: f64 = 1.15;

/// Split space -> combined-vertical space. Team A is compressed into the
/// top half; team B is mirrored, then compressed into the bottom half.
pub fn to_combined(side: TeamSide, p: Position) -> Position {
    let x = 50.0 + (p.x - 50.0) * WIDEN_FACTOR;
    let y = match side {
        TeamSide::A => TOP_START + p.y / 100.0 * TOP_SPAN,
        TeamSide::B => BOTTOM_START + (100.0 - p.y) / 100.0 * BOTTOM_SPAN,
    };
    Position::new(x, y)
}

/// Combined-vertical space -> split space; exact inverse of
/// [`to_combined`].
pub fn from_combined(side: TeamSide, p: Position) -> Position {
    let x = 50.0 + (p.x - 50.0) / WIDEN_FACTOR;
    let y = match side {
        TeamSide::A => (p.y - TOP_START) / TOP_SPAN * 100.0,
        TeamSide::B => 100.0 - (p.y - BOTTOM_START) / BOTTOM_SPAN * 100.0,
    };
    Position::new(x, y)
}

/// Project a stored (split-space) position into the active display space.
pub fn project(vertical_mode: bool, side: TeamSide, p: Position) -> Position {
    if vertical_mode {
        to_combined(side, p)
    } else {
        p
    }
}

/// Map a pointer-derived display-space position back into storage space.
pub fn unproject(vertical_mode: bool, side: TeamSide, p: Position) -> Position {
    if vertical_mode {
        from_combined(side, p)
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(a: Position, b: Position) {
        assert!(
            (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn round_trip_reproduces_original_for_both_teams() {
        let samples = [
            Position::new(0.0, 0.0),
            Position::new(100.0, 100.0),
            Position::new(50.0, 50.0),
            Position::new(13.7, 88.0),
            Position::new(86.0, 12.0),
        ];
        for side in TeamSide::BOTH {
            for p in samples {
                assert_close(from_combined(side, to_combined(side, p)), p);
            }
        }
    }

    #[test]
    fn team_a_lands_in_top_half_team_b_in_bottom_half() {
        for y in [0.0, 25.0, 50.0, 75.0, 100.0] {
            let p = Position::new(50.0, y);
            let a = to_combined(TeamSide::A, p);
            let b = to_combined(TeamSide::B, p);
            assert!((TOP_START..=TOP_START + TOP_SPAN).contains(&a.y));
            assert!((BOTTOM_START..=BOTTOM_START + BOTTOM_SPAN).contains(&b.y));
        }
    }

    #[test]
    fn team_b_is_mirrored() {
        // The mirror flips team B's axis before the bottom-half
        // compression: its own-goal end renders toward the shared middle
        // of the combined pitch and its advanced end toward the bottom
        // edge, opposite to team A's orientation.
        let near_goal = to_combined(TeamSide::B, Position::new(50.0, 88.0));
        let advanced = to_combined(TeamSide::B, Position::new(50.0, 12.0));
        assert!(near_goal.y < advanced.y);
        assert!((near_goal.y - (BOTTOM_START + 12.0 / 100.0 * BOTTOM_SPAN)).abs() < TOLERANCE);
        assert!((advanced.y - (BOTTOM_START + 88.0 / 100.0 * BOTTOM_SPAN)).abs() < TOLERANCE);
    }

    #[test]
    fn x_recentering_is_shared_and_symmetric() {
        let left = to_combined(TeamSide::A, Position::new(30.0, 50.0));
        let right = to_combined(TeamSide::B, Position::new(70.0, 50.0));
        assert!((left.x - (50.0 - 20.0 * WIDEN_FACTOR)).abs() < TOLERANCE);
        assert!((right.x - (50.0 + 20.0 * WIDEN_FACTOR)).abs() < TOLERANCE);
    }

    #[test]
    fn split_mode_projection_is_identity() {
        let p = Position::new(42.0, 17.0);
        for side in TeamSide::BOTH {
            assert_eq!(project(false, side, p), p);
            assert_eq!(unproject(false, side, p), p);
        }
    }
}
