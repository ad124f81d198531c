//! Server to client events and snapshot views.
//!
//! The snapshot is a full-state view: every snake, food, mine and net the
//! world currently holds, plus the arena status flags. Clients render
//! directly from it with no delta bookkeeping.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D point on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Point {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// Food pickup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Normal,
    Boost,
    Shield,
    Mine,
}

/// One lobby roster line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub ready: bool,
}

/// Per-snake snapshot data, keyed by connection id in the snapshot map.
#[derive(Debug, Clone, Serialize)]
pub struct SnakeView {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub points: Vec<Point>,
    pub thickness: f32,
    pub score: u32,
    pub alive: bool,
    pub shielded: bool,
    /// Ticks until the net ability is available again (0 = ready).
    pub net_cooldown: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub kind: FoodKind,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MineView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Ticks until detonation.
    pub fuse: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetView {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub owner: u32,
    /// Ticks until the net dissolves.
    pub lifetime: u32,
}

/// A server-to-client event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Lobby roster, sent every tick while waiting.
    Roster { players: Vec<RosterEntry> },
    /// The session (re)started; ready players are now in the world.
    SessionStarted,
    /// Sent to the eliminated player only.
    Eliminated { score: u32 },
    /// Full world state, sent every tick while running.
    Snapshot {
        players: HashMap<u32, SnakeView>,
        foods: Vec<FoodView>,
        mines: Vec<MineView>,
        nets: Vec<NetView>,
        arena_radius: f32,
        show_warning: bool,
        radius_fixed: bool,
    },
}

impl Event {
    /// Encode the event as a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_shape() {
        let event = Event::Roster {
            players: vec![RosterEntry {
                name: "viper".to_string(),
                ready: true,
            }],
        };
        let json: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "roster");
        assert_eq!(json["players"][0]["name"], "viper");
        assert_eq!(json["players"][0]["ready"], true);
    }

    #[test]
    fn snapshot_keys_players_by_id() {
        let mut players = HashMap::new();
        players.insert(
            7,
            SnakeView {
                name: "viper".to_string(),
                x: 1.0,
                y: 2.0,
                angle: 0.0,
                points: vec![Point { x: 1.0, y: 2.0 }],
                thickness: 12.0,
                score: 0,
                alive: true,
                shielded: false,
                net_cooldown: 0,
            },
        );
        let event = Event::Snapshot {
            players,
            foods: vec![FoodView {
                id: 1,
                x: 0.0,
                y: 0.0,
                kind: FoodKind::Normal,
                radius: 6.0,
            }],
            mines: vec![],
            nets: vec![],
            arena_radius: 6000.0,
            show_warning: false,
            radius_fixed: false,
        };
        let json: serde_json::Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "snapshot");
        // JSON object keys are strings; integer ids stringify.
        assert_eq!(json["players"]["7"]["name"], "viper");
        assert_eq!(json["foods"][0]["kind"], "normal");
        assert_eq!(json["arena_radius"], 6000.0);
    }

    #[test]
    fn eliminated_carries_score() {
        let json: serde_json::Value =
            serde_json::from_str(&Event::Eliminated { score: 230 }.encode().unwrap()).unwrap();
        assert_eq!(json["type"], "eliminated");
        assert_eq!(json["score"], 230);
    }
}
