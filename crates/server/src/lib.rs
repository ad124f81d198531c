//! Serpent Royale game server library.

pub mod arena;
pub mod collision;
pub mod config;
pub mod entity;
pub mod math;
pub mod server;
pub mod world;

pub use config::Config;
pub use server::{run, GameState, SessionPhase, TargetedEvent};
