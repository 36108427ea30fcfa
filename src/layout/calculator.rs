// Pure formation -> seat coordinate calculator.
//
// Deterministic and side-effect free: the same formation always yields the
// same ordered seat list, so callers may memoize on formation identity.

use crate::layout::LayoutError;
use crate::session::{Formation, Position};

/// Vertical coordinate of the goalkeeper line (baseline nearest the team's
/// own goal; larger y = closer to own goal in split space).
pub const GOAL_LINE_Y: f64 = 88.0;

/// Vertical coordinate of the most advanced outfield line.
pub const FAR_LINE_Y: f64 = 12.0;

/// Horizontal widening multiplier spreading seats outward from the pitch
/// centerline.
pub const LINE_WIDEN: f64 = 1.2;

/// Map a formation to one normalized position per seat, in roster order.
///
/// Line 0 (the goalkeeper) is pinned at [`GOAL_LINE_Y`]; the remaining
/// lines are evenly spaced from [`FAR_LINE_Y`] back toward the goalkeeper.
/// Within a line, roster index 0 takes the highest-x slot (rightmost,
/// strong side) -- downstream consumers key off seat index, so this
/// correspondence must hold exactly.
pub fn compute_positions(formation: &Formation) -> Result<Vec<Position>, LayoutError> {
    let line_count = formation.lines.len();
    if line_count < 2 {
        return Err(LayoutError::DegenerateFormation {
            name: formation.name.clone(),
        });
    }
    if formation.lines[0] != 1 {
        return Err(LayoutError::GoalkeeperLine {
            name: formation.name.clone(),
            count: formation.lines[0],
        });
    }
    if let Some(index) = formation.lines.iter().position(|&n| n == 0) {
        return Err(LayoutError::EmptyLine {
            name: formation.name.clone(),
            index,
        });
    }

    let mut positions = Vec::with_capacity(formation.seat_count());
    for (line, &seats) in formation.lines.iter().enumerate() {
        let y = line_y(line, line_count);
        for seat_in_line in 0..seats {
            positions.push(Position::new(seat_x(seat_in_line, seats), y));
        }
    }
    Ok(positions)
}

/// Vertical coordinate for line `line` of `line_count` total lines.
///
/// Outfield lines are re-indexed so a higher index means closer to the
/// goalkeeper: the most advanced line sits at `FAR_LINE_Y` and the line
/// directly in front of the goalkeeper sits one even step short of
/// `GOAL_LINE_Y`.
fn line_y(line: usize, line_count: usize) -> f64 {
    if line == 0 {
        return GOAL_LINE_Y;
    }
    let toward_goal = (line_count - 1 - line) as f64;
    FAR_LINE_Y + (GOAL_LINE_Y - FAR_LINE_Y) * toward_goal / (line_count - 1) as f64
}

/// Horizontal coordinate for the `seat`-th roster entry within a line of
/// `seats`. Seats are evenly spaced, symmetric about the centerline, and
/// widened by [`LINE_WIDEN`]; visual slot order is reversed relative to
/// roster order so roster index 0 renders nearest the strong side.
fn seat_x(seat: usize, seats: usize) -> f64 {
    let slot = seats - 1 - seat;
    let even = (slot + 1) as f64 / (seats + 1) as f64 * 100.0;
    (50.0 + (even - 50.0) * LINE_WIDEN).clamp(0.0, 100.0)
}
