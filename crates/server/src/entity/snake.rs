//! The snake avatar and its per-tick simulation.

use std::collections::VecDeque;

use glam::Vec2;

use crate::config::{NetConfig, SnakeConfig};
use crate::math::turn_toward;

/// Lifecycle of a snake, from connection to elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeState {
    /// Connected but not in the lobby yet.
    Unjoined,
    /// In the lobby, waiting for a session to start.
    Waiting,
    /// Simulated in the running session.
    Alive,
    /// Eliminated or left; stays in the set until disconnect or restart.
    Dead,
}

/// What a simulation step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Alive,
    Died,
}

/// Result of one simulation step.
#[derive(Debug)]
pub struct StepResult {
    pub outcome: StepOutcome,
    /// Tail position where boost mass was shed this tick, if any.
    pub shed: Option<Vec2>,
}

/// One player avatar. Trail front is the head.
#[derive(Debug, Clone)]
pub struct Snake {
    pub id: u32,
    pub name: String,
    pub ready: bool,
    pub state: SnakeState,
    pub position: Vec2,
    pub heading: f32,
    /// Latest steering sample; the heading chases it a bounded step per tick.
    pub target_heading: f32,
    pub trail: VecDeque<Vec2>,
    pub target_length: f32,
    pub thickness: f32,
    pub score: u32,
    pub boosting: bool,
    /// Remaining ticks of a boost pickup.
    pub boost_timer: u32,
    /// Remaining ticks of shield invulnerability.
    pub shield_timer: u32,
    /// Consecutive ticks spent outside the arena while unshielded.
    pub poison_timer: u32,
    /// Consecutive boosting ticks since the last mass shed.
    pub mass_drop_timer: u32,
    /// Tick of the last net cast, on the server's monotonic tick counter.
    pub last_cast_tick: Option<u64>,
    /// Ticks until the net ability is available again.
    pub cooldown_remaining: u32,
}

impl Snake {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: "Unknown".to_string(),
            ready: false,
            state: SnakeState::Unjoined,
            position: Vec2::ZERO,
            heading: 0.0,
            target_heading: 0.0,
            trail: VecDeque::new(),
            target_length: 0.0,
            thickness: 0.0,
            score: 0,
            boosting: false,
            boost_timer: 0,
            shield_timer: 0,
            poison_timer: 0,
            mass_drop_timer: 0,
            last_cast_tick: None,
            cooldown_remaining: 0,
        }
    }

    /// Enter the lobby under a display name.
    pub fn join(&mut self, name: String) {
        self.name = name;
        if self.state == SnakeState::Unjoined {
            self.state = SnakeState::Waiting;
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == SnakeState::Alive
    }

    pub fn is_shielded(&self) -> bool {
        self.shield_timer > 0
    }

    /// Put the snake into the running world at `position`.
    pub fn spawn(&mut self, position: Vec2, heading: f32, cfg: &SnakeConfig) {
        self.state = SnakeState::Alive;
        self.position = position;
        self.heading = heading;
        self.target_heading = heading;
        self.target_length = cfg.start_length;
        self.thickness = cfg.base_thickness;
        self.score = 0;
        self.boosting = false;
        self.boost_timer = 0;
        self.shield_timer = 0;
        self.poison_timer = 0;
        self.mass_drop_timer = 0;
        self.trail.clear();
        for _ in 0..cfg.start_length.max(0.0) as usize {
            self.trail.push_back(position);
        }
    }

    /// Mark the snake dead and clear its trail.
    ///
    /// Returns whether the snake was alive, so death side effects run once.
    pub fn kill(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.state = SnakeState::Dead;
        self.trail.clear();
        true
    }

    /// Advance one tick. Dead snakes are inert.
    pub fn step(
        &mut self,
        arena_radius: f32,
        tick: u64,
        cfg: &SnakeConfig,
        net_cfg: &NetConfig,
    ) -> StepResult {
        if !self.is_alive() {
            return StepResult {
                outcome: StepOutcome::Died,
                shed: None,
            };
        }

        // Heading chases the latest steering sample, a bounded step per tick.
        self.heading = turn_toward(self.heading, self.target_heading, cfg.max_turn);

        // Speed, and mass shedding while voluntarily boosting. A boost
        // pickup overrides and costs nothing.
        let mut shed = None;
        let mut speed = cfg.base_speed;
        if self.boost_timer > 0 {
            speed = cfg.boost_speed;
            self.boost_timer -= 1;
        } else if self.boosting {
            if self.target_length > cfg.boost_min_length {
                speed = cfg.boost_speed;
                self.mass_drop_timer += 1;
                if self.mass_drop_timer > cfg.mass_drop_ticks {
                    self.target_length -= 1.0;
                    self.score = self.score.saturating_sub(cfg.mass_drop_score);
                    shed = self.trail.back().copied();
                    self.mass_drop_timer = 0;
                }
            }
        } else {
            self.mass_drop_timer = 0;
        }

        if self.shield_timer > 0 {
            self.shield_timer -= 1;
        }

        self.cooldown_remaining = match self.last_cast_tick {
            Some(cast) => {
                let elapsed = tick.saturating_sub(cast);
                if elapsed >= u64::from(net_cfg.cooldown_ticks) {
                    0
                } else {
                    net_cfg.cooldown_ticks - elapsed as u32
                }
            }
            None => 0,
        };

        self.thickness = (cfg.base_thickness + cfg.thickness_per_length * self.target_length)
            .clamp(cfg.base_thickness, cfg.max_thickness);

        self.position += Vec2::new(self.heading.cos(), self.heading.sin()) * speed;
        self.trail.push_front(self.position);
        self.fit_trail();

        // Time outside the arena poisons, unless shielded.
        if self.position.length() > arena_radius && !self.is_shielded() {
            self.poison_timer += 1;
            if self.poison_timer > cfg.poison_ticks {
                return StepResult {
                    outcome: StepOutcome::Died,
                    shed,
                };
            }
        } else {
            self.poison_timer = 0;
        }

        StepResult {
            outcome: StepOutcome::Alive,
            shed,
        }
    }

    /// Trim or pad the trail so its length is exactly floor(target_length).
    ///
    /// Growth pads with copies of the tail point, so the tail extends in
    /// place instead of teleporting.
    pub fn fit_trail(&mut self) {
        let want = self.target_length.max(0.0) as usize;
        while self.trail.len() > want {
            self.trail.pop_back();
        }
        if let Some(&tail) = self.trail.back() {
            while self.trail.len() < want {
                self.trail.push_back(tail);
            }
        }
    }
}
