// Formation layout: deterministic seat placement, manual overrides, and
// the split <-> combined-vertical projection.

pub mod calculator;
pub mod overrides;
pub mod transform;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// A formation needs a goalkeeper line plus at least one outfield line;
    /// single-line input is undefined and rejected at the boundary.
    #[error("formation `{name}` must have a goalkeeper line and at least one outfield line")]
    DegenerateFormation { name: String },

    #[error("formation `{name}` has an empty line at index {index}")]
    EmptyLine { name: String, index: usize },

    #[error("formation `{name}` goalkeeper line must hold exactly one seat, got {count}")]
    GoalkeeperLine { name: String, count: usize },
}
