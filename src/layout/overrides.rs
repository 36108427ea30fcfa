// Manual position overrides: a per-team side table keyed by seat index
// that shadows the calculator's output until reset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::layout::calculator::compute_positions;
use crate::layout::LayoutError;
use crate::session::{Position, TeamState};

/// Seat index -> manually dragged position, in split-mode space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideMap(HashMap<usize, Position>);

impl OverrideMap {
    pub fn get(&self, seat: usize) -> Option<Position> {
        self.0.get(&seat).copied()
    }

    pub fn set(&mut self, seat: usize, position: Position) {
        self.0.insert(seat, position);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop entries whose seat index falls outside the current formation.
    /// Stale entries are inert either way; pruning keeps the map from
    /// growing without bound across many formation switches.
    pub fn prune(&mut self, seat_count: usize) {
        self.0.retain(|&seat, _| seat < seat_count);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolve every seat of a team to its final split-space position:
/// the override when one exists, the calculator's output otherwise.
pub fn effective_positions(team: &TeamState) -> Result<Vec<Position>, LayoutError> {
    let mut positions = compute_positions(&team.formation)?;
    for (seat, position) in positions.iter_mut().enumerate() {
        if let Some(dragged) = team.overrides.get(seat) {
            *position = dragged;
        }
    }
    Ok(positions)
}
