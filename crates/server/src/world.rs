//! World state: every entity in the current session plus the arena.

use std::collections::HashMap;

use glam::Vec2;
use protocol::FoodKind;
use rand::Rng;

use crate::arena::Arena;
use crate::config::{ArenaConfig, FoodConfig};
use crate::entity::{ArmedMine, CastNet, Food, Snake};

/// The game world. Owned by `GameState`, mutated only under its lock.
#[derive(Debug)]
pub struct World {
    next_food_id: u32,
    pub snakes: HashMap<u32, Snake>,
    pub foods: Vec<Food>,
    pub mines: Vec<ArmedMine>,
    pub nets: Vec<CastNet>,
    pub arena: Arena,
}

impl World {
    pub fn new(arena_cfg: &ArenaConfig) -> Self {
        Self {
            next_food_id: 0,
            snakes: HashMap::new(),
            foods: Vec::with_capacity(512),
            mines: Vec::new(),
            nets: Vec::new(),
            arena: Arena::new(arena_cfg),
        }
    }

    fn next_food_id(&mut self) -> u32 {
        let id = self.next_food_id;
        self.next_food_id = self.next_food_id.wrapping_add(1);
        id
    }

    /// Spawn a food item.
    ///
    /// Without a position the item lands at a uniform angle and a radius
    /// uniform in [0, max(100, arena radius)]. Radius-uniform placement is
    /// denser toward the center on purpose, and the floor keeps food
    /// spawning once the arena is fully shrunk.
    pub fn spawn_food(&mut self, cfg: &FoodConfig, position: Option<Vec2>, kind: Option<FoodKind>) {
        let mut rng = rand::rng();
        let position = position.unwrap_or_else(|| {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let r = rng.random::<f32>() * self.arena.radius.max(100.0);
            Vec2::new(angle.cos(), angle.sin()) * r
        });
        let kind = kind.unwrap_or_else(|| {
            let roll: f64 = rng.random();
            if roll < cfg.boost_chance {
                FoodKind::Boost
            } else if roll < cfg.boost_chance + cfg.shield_chance {
                FoodKind::Shield
            } else if roll < cfg.boost_chance + cfg.shield_chance + cfg.mine_chance {
                FoodKind::Mine
            } else {
                FoodKind::Normal
            }
        });
        let radius = if kind == FoodKind::Normal {
            cfg.normal_radius
        } else {
            cfg.special_radius
        };
        let id = self.next_food_id();
        self.foods.push(Food::new(id, position, kind, radius));
    }

    /// Drop a normal food near `position` with a small random jitter; used
    /// to turn a dead snake's trail into pickups.
    pub fn scatter_food(&mut self, cfg: &FoodConfig, position: Vec2) {
        let mut rng = rand::rng();
        let jitter = Vec2::new(
            (rng.random::<f32>() - 0.5) * cfg.scatter_range,
            (rng.random::<f32>() - 0.5) * cfg.scatter_range,
        );
        self.spawn_food(cfg, Some(position + jitter), Some(FoodKind::Normal));
    }

    /// Clear every transient entity. Snakes stay; a session restart
    /// respawns them separately.
    pub fn clear_transients(&mut self) {
        self.foods.clear();
        self.mines.clear();
        self.nets.clear();
    }
}
