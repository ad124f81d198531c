//! Placed hazards: armed mines and cast nets.

use glam::Vec2;

/// A mine armed by picking up mine food. Detonates when the fuse runs out.
#[derive(Debug, Clone)]
pub struct ArmedMine {
    pub position: Vec2,
    pub blast_radius: f32,
    /// Ticks until detonation.
    pub fuse: u32,
}

/// A net cast by a player. Drains length from other snakes caught inside.
#[derive(Debug, Clone)]
pub struct CastNet {
    pub position: Vec2,
    pub radius: f32,
    /// Caster's connection id; a net never affects its owner.
    pub owner: u32,
    /// Ticks until the net dissolves.
    pub lifetime: u32,
}
