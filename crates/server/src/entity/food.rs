//! Food pickups.

use glam::Vec2;
use protocol::FoodKind;

/// A collectible pickup on the arena floor.
#[derive(Debug, Clone)]
pub struct Food {
    pub id: u32,
    pub position: Vec2,
    pub kind: FoodKind,
    pub radius: f32,
}

impl Food {
    pub fn new(id: u32, position: Vec2, kind: FoodKind, radius: f32) -> Self {
        Self {
            id,
            position,
            kind,
            radius,
        }
    }
}
