//! Arena shrink controller.
//!
//! The playable area is a circle centered at the origin. It alternates
//! between a holding phase and a shrinking phase of equal length, with a
//! warning window at the start of each shrink, until the radius reaches a
//! floor where it stays until the next session reset.

use crate::config::ArenaConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShrinkPhase {
    Holding,
    Shrinking,
}

/// The circular arena and its shrink cycle.
#[derive(Debug, Clone)]
pub struct Arena {
    pub radius: f32,
    /// Up during the first warning window of a shrinking phase.
    pub show_warning: bool,
    /// Latched once the radius reaches the floor; cleared only by reset.
    pub radius_fixed: bool,
    phase: ShrinkPhase,
    phase_timer: u32,
    initial_radius: f32,
    min_radius: f32,
    shrink_rate: f32,
    phase_ticks: u32,
    warning_ticks: u32,
}

impl Arena {
    pub fn new(cfg: &ArenaConfig) -> Self {
        Self {
            radius: cfg.initial_radius,
            show_warning: false,
            radius_fixed: false,
            phase: ShrinkPhase::Holding,
            phase_timer: 0,
            initial_radius: cfg.initial_radius,
            min_radius: cfg.min_radius,
            shrink_rate: cfg.shrink_rate,
            phase_ticks: cfg.phase_ticks,
            warning_ticks: cfg.warning_ticks,
        }
    }

    /// Back to the initial radius at the start of a holding phase.
    pub fn reset(&mut self) {
        self.radius = self.initial_radius;
        self.show_warning = false;
        self.radius_fixed = false;
        self.phase = ShrinkPhase::Holding;
        self.phase_timer = 0;
    }

    /// Advance the shrink cycle by one tick.
    pub fn update(&mut self) {
        self.show_warning = false;

        if self.radius <= self.min_radius {
            self.radius = self.min_radius;
            self.radius_fixed = true;
            return;
        }

        self.phase_timer += 1;
        match self.phase {
            ShrinkPhase::Shrinking => {
                self.radius = (self.radius - self.shrink_rate).max(self.min_radius);
                if self.phase_timer <= self.warning_ticks {
                    self.show_warning = true;
                }
                if self.phase_timer > self.phase_ticks {
                    self.phase = ShrinkPhase::Holding;
                    self.phase_timer = 0;
                }
            }
            ShrinkPhase::Holding => {
                if self.phase_timer > self.phase_ticks {
                    self.phase = ShrinkPhase::Shrinking;
                    self.phase_timer = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(&ArenaConfig::default())
    }

    #[test]
    fn holds_for_a_full_phase_before_shrinking() {
        let mut arena = arena();
        for _ in 0..1200 {
            arena.update();
            assert_eq!(arena.radius, 6000.0);
        }
        // Phase flips on the tick after the phase length, first shrink
        // happens one tick later.
        arena.update();
        assert_eq!(arena.radius, 6000.0);
        arena.update();
        assert_eq!(arena.radius, 5999.0);
        assert!(arena.show_warning);
    }

    #[test]
    fn warning_covers_only_the_window() {
        let mut arena = arena();
        for _ in 0..1201 {
            arena.update();
            assert!(!arena.show_warning);
        }
        for _ in 0..180 {
            arena.update();
            assert!(arena.show_warning);
        }
        arena.update();
        assert!(!arena.show_warning);
    }

    #[test]
    fn radius_never_drops_below_floor_and_latches() {
        let cfg = ArenaConfig {
            initial_radius: 505.0,
            phase_ticks: 2,
            ..ArenaConfig::default()
        };
        let mut arena = Arena::new(&cfg);
        for _ in 0..100 {
            arena.update();
            assert!(arena.radius >= 500.0);
        }
        assert_eq!(arena.radius, 500.0);
        assert!(arena.radius_fixed);
        // Stays fixed on further updates.
        arena.update();
        assert!(arena.radius_fixed);
        assert_eq!(arena.radius, 500.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut arena = arena();
        arena.radius = 500.0;
        arena.update();
        assert!(arena.radius_fixed);
        arena.reset();
        assert_eq!(arena.radius, 6000.0);
        assert!(!arena.radius_fixed);
        assert!(!arena.show_warning);
    }
}
