//! Game entities.

mod food;
mod hazard;
mod snake;

pub use food::Food;
pub use hazard::{ArmedMine, CastNet};
pub use snake::{Snake, SnakeState, StepOutcome, StepResult};
