//! Shared wire protocol for Serpent Royale.
//!
//! Everything a client and the server exchange lives here:
//! - [`Command`]: the closed set of inbound messages
//! - [`Event`]: outbound messages, including the per-tick world snapshot
//! - [`ProtocolError`]: decode failures
//!
//! The wire format is JSON text frames with an internal `type` tag.

mod commands;
mod error;
mod events;

pub use commands::Command;
pub use error::ProtocolError;
pub use events::{Event, FoodKind, FoodView, MineView, NetView, Point, RosterEntry, SnakeView};
