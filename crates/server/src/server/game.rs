//! Game state and main loop.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use glam::Vec2;
use protocol::{
    Command, Event, FoodKind, FoodView, MineView, NetView, Point, RosterEntry, SnakeView,
};
use rand::Rng;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::collision::{circles_touch, point_in_circle, trail_hit, trail_sample_hit};
use crate::config::Config;
use crate::entity::{ArmedMine, CastNet, Snake, SnakeState, StepOutcome};
use crate::world::World;

use super::client::Client;
use super::TargetedEvent;

/// Global session phase. Once running, it never reverts; a fresh all-ready
/// toggle restarts the session in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Waiting,
    Running,
}

/// Pending broadcasts to send after releasing the game state lock.
pub struct PendingBroadcasts {
    pub roster: Option<Event>,
    pub snapshot: Option<Event>,
}

/// Main game state.
pub struct GameState {
    pub config: Config,
    pub phase: SessionPhase,
    pub tick_count: u64,
    pub start_time: std::time::Instant,

    next_client_id: u32,

    // Connected clients
    pub clients: HashMap<u32, Client>,

    // Game world (entities + arena)
    pub world: World,

    // Broadcast channels
    events_tx: broadcast::Sender<Event>,
    targeted_tx: broadcast::Sender<TargetedEvent>,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create a new game state.
    pub fn new(
        config: &Config,
        events_tx: broadcast::Sender<Event>,
        targeted_tx: broadcast::Sender<TargetedEvent>,
    ) -> Self {
        let world = World::new(&config.arena);

        Self {
            config: config.clone(),
            phase: SessionPhase::Waiting,
            tick_count: 0,
            start_time: std::time::Instant::now(),
            next_client_id: 1,
            clients: HashMap::new(),
            world,
            events_tx,
            targeted_tx,
            update_time_avg: 0.0,
        }
    }

    /// Add a new client and its snake.
    pub fn add_client(&mut self, addr: SocketAddr) -> u32 {
        let id = self.next_client_id;
        self.next_client_id = self.next_client_id.wrapping_add(1).max(1);
        self.clients.insert(id, Client::new(id, addr));
        self.world.snakes.insert(id, Snake::new(id));
        info!("Client {} connected from {}", id, addr);
        id
    }

    /// Remove a client and its snake. Others notice via the next snapshot.
    pub fn remove_client(&mut self, id: u32) {
        if self.clients.remove(&id).is_some() {
            self.world.snakes.remove(&id);
            info!("Client {} removed", id);
        }
    }

    /// Handle a raw text frame from a client.
    ///
    /// Malformed input is discarded without a reply; a command invalid for
    /// the current state is a silent no-op.
    pub fn handle_message(&mut self, client_id: u32, raw: &str) {
        match self.clients.get_mut(&client_id) {
            Some(client) => client.touch(),
            None => return,
        }
        let command = match Command::decode(raw) {
            Ok(command) => command,
            Err(e) => {
                debug!("Client {} sent undecodable message: {}", client_id, e);
                return;
            }
        };
        match command {
            Command::Join { name } => self.handle_join(client_id, name),
            Command::ToggleReady => self.handle_toggle_ready(client_id),
            Command::Leave => self.handle_leave(client_id),
            Command::Steer { angle, boosting } => self.handle_steer(client_id, angle, boosting),
            Command::CastNet => self.handle_cast_net(client_id),
        }
    }

    fn handle_join(&mut self, client_id: u32, name: String) {
        let max_len = self.config.snake.max_name_length;
        let Some(snake) = self.world.snakes.get_mut(&client_id) else {
            return;
        };
        let name = if name.trim().is_empty() {
            "Guest".to_string()
        } else {
            name.chars().take(max_len).collect()
        };
        info!("Client {} joined as {:?}", client_id, name);
        snake.join(name);
    }

    fn handle_toggle_ready(&mut self, client_id: u32) {
        let Some(snake) = self.world.snakes.get_mut(&client_id) else {
            return;
        };
        if snake.state == SnakeState::Unjoined {
            snake.state = SnakeState::Waiting;
        }
        snake.ready = !snake.ready;
        debug!("Client {} ready: {}", client_id, snake.ready);
        self.try_start_session();
    }

    fn handle_leave(&mut self, client_id: u32) {
        let Some(snake) = self.world.snakes.get_mut(&client_id) else {
            return;
        };
        // Back to the lobby quietly: no corpse food, no eliminated event.
        snake.ready = false;
        snake.state = SnakeState::Dead;
        snake.trail.clear();
        info!("Client {} left to the lobby", client_id);
    }

    fn handle_steer(&mut self, client_id: u32, angle: f32, boosting: bool) {
        if self.phase != SessionPhase::Running || !angle.is_finite() {
            return;
        }
        let Some(snake) = self.world.snakes.get_mut(&client_id) else {
            return;
        };
        if !snake.is_alive() {
            return;
        }
        snake.target_heading = angle;
        snake.boosting = boosting;
    }

    fn handle_cast_net(&mut self, client_id: u32) {
        if self.phase != SessionPhase::Running {
            return;
        }
        let cooldown_ticks = self.config.net.cooldown_ticks;
        let cast_offset = self.config.net.cast_offset;
        let radius = self.config.net.radius;
        let lifetime = self.config.net.lifetime_ticks;
        let tick = self.tick_count;

        let Some(snake) = self.world.snakes.get_mut(&client_id) else {
            return;
        };
        if !snake.is_alive() {
            return;
        }
        let ready = match snake.last_cast_tick {
            None => true,
            Some(cast) => tick.saturating_sub(cast) >= u64::from(cooldown_ticks),
        };
        if !ready {
            return;
        }
        snake.last_cast_tick = Some(tick);
        snake.cooldown_remaining = cooldown_ticks;
        let position = snake.position + Vec2::new(snake.heading.cos(), snake.heading.sin()) * cast_offset;

        self.world.nets.push(CastNet {
            position,
            radius,
            owner: client_id,
            lifetime,
        });
        debug!("Client {} cast a net", client_id);
    }

    /// Start the session if everyone known is ready and someone exists.
    fn try_start_session(&mut self) {
        let snakes = &self.world.snakes;
        if snakes.is_empty() || !snakes.values().all(|s| s.ready) {
            return;
        }
        self.start_session();
    }

    /// (Re)start the session: fresh arena, fresh food, ready snakes spawned
    /// inside the safe square.
    fn start_session(&mut self) {
        self.phase = SessionPhase::Running;
        self.world.arena.reset();
        self.world.clear_transients();

        for _ in 0..self.config.food.initial_amount {
            self.world.spawn_food(&self.config.food, None, None);
        }

        let safe_side = (self.world.arena.radius - self.config.arena.spawn_inset).max(100.0);
        let ids: Vec<u32> = self.world.snakes.keys().copied().collect();
        let mut rng = rand::rng();
        let mut spawned = 0usize;
        for id in ids {
            let position = Vec2::new(
                (rng.random::<f32>() - 0.5) * safe_side,
                (rng.random::<f32>() - 0.5) * safe_side,
            );
            let heading = rng.random_range(0.0..std::f32::consts::TAU);
            if let Some(snake) = self.world.snakes.get_mut(&id) {
                if snake.ready {
                    snake.spawn(position, heading, &self.config.snake);
                    spawned += 1;
                }
            }
        }

        info!("Session started with {} players", spawned);
        let _ = self.events_tx.send(Event::SessionStarted);
    }

    /// Kill a snake: scatter corpse food along the trail, clear it, tell
    /// the loser. Safe to call for an already dead snake.
    fn kill_snake(&mut self, id: u32) {
        let stride = self.config.food.scatter_stride.max(1);
        let Some(snake) = self.world.snakes.get_mut(&id) else {
            return;
        };
        if !snake.is_alive() {
            return;
        }
        let corpse: Vec<Vec2> = snake.trail.iter().step_by(stride).copied().collect();
        let score = snake.score;
        snake.kill();

        for point in corpse {
            self.world.scatter_food(&self.config.food, point);
        }
        info!("Snake {} eliminated with score {}", id, score);
        let _ = self.targeted_tx.send(TargetedEvent {
            client_id: id,
            event: Event::Eliminated { score },
        });
    }

    /// Run one game tick. Returns broadcasts for the caller to send once
    /// the lock is released.
    pub fn tick(&mut self) -> PendingBroadcasts {
        self.tick_count += 1;

        if self.phase == SessionPhase::Waiting {
            return PendingBroadcasts {
                roster: Some(self.prepare_roster()),
                snapshot: None,
            };
        }

        self.world.arena.update();

        // Connection-id order: map iteration order is not outcome-safe
        // (mutual crashes resolve in favor of whoever steps second).
        let mut ids: Vec<u32> = self.world.snakes.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let (outcome, shed) = {
                let Some(snake) = self.world.snakes.get_mut(&id) else {
                    continue;
                };
                if !snake.is_alive() {
                    continue;
                }
                let result = snake.step(
                    self.world.arena.radius,
                    self.tick_count,
                    &self.config.snake,
                    &self.config.net,
                );
                (result.outcome, result.shed)
            };
            if let Some(tail) = shed {
                self.world
                    .spawn_food(&self.config.food, Some(tail), Some(FoodKind::Normal));
            }
            if outcome == StepOutcome::Died {
                self.kill_snake(id);
                continue;
            }

            self.resolve_pickups(id);
            self.resolve_nets(id);
            self.resolve_crashes(id);
        }

        self.detonate_mines();
        self.expire_nets();

        PendingBroadcasts {
            roster: None,
            snapshot: Some(self.prepare_snapshot()),
        }
    }

    /// Apply food pickups for one snake. Removal is reverse-index so the
    /// sweep stays valid as foods vanish.
    fn resolve_pickups(&mut self, id: u32) {
        let (head, thickness) = match self.world.snakes.get(&id) {
            Some(s) if s.is_alive() => (s.position, s.thickness),
            _ => return,
        };
        let growth = self.config.food.growth;
        let food_score = self.config.food.score;
        let boost_ticks = self.config.snake.boost_pickup_ticks;
        let shield_ticks = self.config.snake.shield_ticks;
        let blast_radius = self.config.mine.blast_radius;
        let fuse_ticks = self.config.mine.fuse_ticks;

        for i in (0..self.world.foods.len()).rev() {
            let food = &self.world.foods[i];
            if !circles_touch(head, thickness, food.position, food.radius) {
                continue;
            }
            let food = self.world.foods.swap_remove(i);
            if let Some(snake) = self.world.snakes.get_mut(&id) {
                match food.kind {
                    FoodKind::Normal => {
                        snake.target_length += growth;
                        snake.score += food_score;
                        snake.fit_trail();
                    }
                    FoodKind::Boost => snake.boost_timer = boost_ticks,
                    FoodKind::Shield => snake.shield_timer = shield_ticks,
                    FoodKind::Mine => self.world.mines.push(ArmedMine {
                        position: food.position,
                        blast_radius,
                        fuse: fuse_ticks,
                    }),
                }
            }
            // Keep the food population constant.
            self.world.spawn_food(&self.config.food, None, None);
        }
    }

    /// Drain length from one snake for every hostile net covering its head.
    fn resolve_nets(&mut self, id: u32) {
        let (head, shielded) = match self.world.snakes.get(&id) {
            Some(s) if s.is_alive() => (s.position, s.is_shielded()),
            _ => return,
        };
        if shielded {
            return;
        }
        let hits = self
            .world
            .nets
            .iter()
            .filter(|net| net.owner != id && point_in_circle(head, net.position, net.radius))
            .count();
        if hits == 0 {
            return;
        }
        let drain = self.config.net.drain * hits as f32;
        let min_length = self.config.snake.min_length;
        let starved = {
            let Some(snake) = self.world.snakes.get_mut(&id) else {
                return;
            };
            snake.target_length -= drain;
            snake.fit_trail();
            snake.target_length < min_length
        };
        if starved {
            self.kill_snake(id);
        }
    }

    /// Head-into-trail collision against every other alive snake.
    fn resolve_crashes(&mut self, id: u32) {
        let (head, thickness) = match self.world.snakes.get(&id) {
            Some(s) if s.is_alive() && !s.is_shielded() => (s.position, s.thickness),
            _ => return,
        };
        let mut crashed_into = None;
        for (&other_id, other) in &self.world.snakes {
            if other_id == id || !other.is_alive() {
                continue;
            }
            if trail_hit(&other.trail, head, thickness + other.thickness) {
                crashed_into = Some(other_id);
                break;
            }
        }
        let Some(other_id) = crashed_into else {
            return;
        };
        let kill_bonus = self.config.snake.kill_bonus;
        self.kill_snake(id);
        if let Some(other) = self.world.snakes.get_mut(&other_id) {
            if other.is_alive() {
                other.score += kill_bonus;
            }
        }
    }

    /// Burn down mine fuses and detonate the expired ones.
    fn detonate_mines(&mut self) {
        let stride = self.config.mine.trail_stride.max(1);
        for i in (0..self.world.mines.len()).rev() {
            let mine = &mut self.world.mines[i];
            mine.fuse = mine.fuse.saturating_sub(1);
            if mine.fuse > 0 {
                continue;
            }
            let mine = self.world.mines.swap_remove(i);

            let mut ids: Vec<u32> = self.world.snakes.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                let (head, shielded) = match self.world.snakes.get(&id) {
                    Some(s) if s.is_alive() => (s.position, s.is_shielded()),
                    _ => continue,
                };
                if shielded {
                    continue;
                }
                if point_in_circle(head, mine.position, mine.blast_radius) {
                    self.kill_snake(id);
                    continue;
                }
                let Some(snake) = self.world.snakes.get_mut(&id) else {
                    continue;
                };
                if trail_sample_hit(&snake.trail, mine.position, mine.blast_radius, stride) {
                    snake.target_length = (snake.target_length / 2.0).floor();
                    snake.fit_trail();
                }
            }
        }
    }

    /// Burn down net lifetimes and drop the expired ones.
    fn expire_nets(&mut self) {
        self.world.nets.retain_mut(|net| {
            net.lifetime = net.lifetime.saturating_sub(1);
            net.lifetime > 0
        });
    }

    fn prepare_roster(&self) -> Event {
        let mut entries: Vec<(u32, RosterEntry)> = self
            .world
            .snakes
            .iter()
            .map(|(&id, s)| {
                (
                    id,
                    RosterEntry {
                        name: s.name.clone(),
                        ready: s.ready,
                    },
                )
            })
            .collect();
        // Stable order for clients.
        entries.sort_by_key(|(id, _)| *id);
        Event::Roster {
            players: entries.into_iter().map(|(_, e)| e).collect(),
        }
    }

    fn prepare_snapshot(&self) -> Event {
        let players: HashMap<u32, SnakeView> = self
            .world
            .snakes
            .iter()
            .map(|(&id, s)| {
                (
                    id,
                    SnakeView {
                        name: s.name.clone(),
                        x: s.position.x,
                        y: s.position.y,
                        angle: s.heading,
                        points: s.trail.iter().map(|&p| Point::from(p)).collect(),
                        thickness: s.thickness,
                        score: s.score,
                        alive: s.is_alive(),
                        shielded: s.is_shielded(),
                        net_cooldown: s.cooldown_remaining,
                    },
                )
            })
            .collect();
        let foods = self
            .world
            .foods
            .iter()
            .map(|f| FoodView {
                id: f.id,
                x: f.position.x,
                y: f.position.y,
                kind: f.kind,
                radius: f.radius,
            })
            .collect();
        let mines = self
            .world
            .mines
            .iter()
            .map(|m| MineView {
                x: m.position.x,
                y: m.position.y,
                radius: m.blast_radius,
                fuse: m.fuse,
            })
            .collect();
        let nets = self
            .world
            .nets
            .iter()
            .map(|n| NetView {
                x: n.position.x,
                y: n.position.y,
                radius: n.radius,
                owner: n.owner,
                lifetime: n.lifetime,
            })
            .collect();
        Event::Snapshot {
            players,
            foods,
            mines,
            nets,
            arena_radius: self.world.arena.radius,
            show_warning: self.world.arena.show_warning,
            radius_fixed: self.world.arena.radius_fixed,
        }
    }
}

/// Run the fixed-rate game loop until the process exits.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    // Skip keeps game speed consistent when ticks are missed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let scheduled = ticker.tick().await;

        // Hibernate when no clients are connected to reduce CPU usage.
        {
            let game = state.read().await;
            if game.clients.is_empty() {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                continue;
            }
        }

        // Drain any backlog so the tick always runs against current input.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        // Run the tick and extract pending broadcasts.
        let (broadcasts, events_tx) = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let broadcasts = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_interval_ms as f64 * 0.9;
            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} foods",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    game.clients.len(),
                    game.world.foods.len()
                );
            }

            (broadcasts, game.events_tx.clone())
        }; // Write lock released here

        if let Some(roster) = broadcasts.roster {
            let _ = events_tx.send(roster);
        }
        if let Some(snapshot) = broadcasts.snapshot {
            let _ = events_tx.send(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        let (events_tx, _) = broadcast::channel(64);
        let (targeted_tx, _) = broadcast::channel(64);
        GameState::new(&Config::default(), events_tx, targeted_tx)
    }

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    /// Connect, join and ready a player through the command path.
    fn join_ready(state: &mut GameState, name: &str) -> u32 {
        let id = state.add_client(addr(40_000 + state.clients.len() as u16));
        state.handle_message(id, &format!(r#"{{"type":"join","name":"{name}"}}"#));
        state.handle_message(id, r#"{"type":"toggle_ready"}"#);
        id
    }

    /// Strip randomness from a running state so scenarios are deterministic.
    fn clear_board(state: &mut GameState) {
        state.world.foods.clear();
        state.world.mines.clear();
        state.world.nets.clear();
    }

    fn place(state: &mut GameState, id: u32, position: Vec2, heading: f32) {
        let snake = state.world.snakes.get_mut(&id).unwrap();
        snake.position = position;
        snake.heading = heading;
        snake.target_heading = heading;
        snake.trail = (0..snake.target_length as usize).map(|_| position).collect();
    }

    #[test]
    fn session_starts_only_when_all_ready() {
        let mut state = new_state();
        let a = state.add_client(addr(1));
        let b = state.add_client(addr(2));
        state.handle_message(a, r#"{"type":"join","name":"a"}"#);
        state.handle_message(b, r#"{"type":"join","name":"b"}"#);

        state.handle_message(a, r#"{"type":"toggle_ready"}"#);
        assert_eq!(state.phase, SessionPhase::Waiting);

        state.handle_message(b, r#"{"type":"toggle_ready"}"#);
        assert_eq!(state.phase, SessionPhase::Running);
        assert!(state.world.snakes[&a].is_alive());
        assert!(state.world.snakes[&b].is_alive());
        assert_eq!(state.world.foods.len(), state.config.food.initial_amount);
    }

    #[test]
    fn single_ready_player_starts_a_session() {
        let mut state = new_state();
        join_ready(&mut state, "solo");
        assert_eq!(state.phase, SessionPhase::Running);
    }

    #[test]
    fn spawns_land_inside_the_safe_square() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        let half = (state.config.arena.initial_radius - state.config.arena.spawn_inset) / 2.0;
        let snake = &state.world.snakes[&id];
        assert!(snake.position.x.abs() <= half);
        assert!(snake.position.y.abs() <= half);
        assert_eq!(snake.trail.len(), state.config.snake.start_length as usize);
    }

    #[test]
    fn all_ready_toggle_restarts_in_place() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        state.world.arena.radius = 1000.0;
        state.world.snakes.get_mut(&id).unwrap().score = 500;

        // Un-ready then re-ready: the second toggle makes everyone ready
        // again and restarts even though the phase is still Running.
        state.handle_message(id, r#"{"type":"toggle_ready"}"#);
        assert_eq!(state.phase, SessionPhase::Running);
        state.handle_message(id, r#"{"type":"toggle_ready"}"#);
        assert_eq!(state.world.arena.radius, state.config.arena.initial_radius);
        assert_eq!(state.world.snakes[&id].score, 0);
    }

    #[test]
    fn waiting_phase_broadcasts_roster_only() {
        let mut state = new_state();
        let id = state.add_client(addr(1));
        state.handle_message(id, r#"{"type":"join","name":"a"}"#);
        let broadcasts = state.tick();
        assert!(broadcasts.snapshot.is_none());
        match broadcasts.roster {
            Some(Event::Roster { players }) => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "a");
                assert!(!players[0].ready);
            }
            other => panic!("expected roster, got {other:?}"),
        }
    }

    #[test]
    fn running_phase_broadcasts_snapshot() {
        let mut state = new_state();
        join_ready(&mut state, "solo");
        let broadcasts = state.tick();
        assert!(broadcasts.roster.is_none());
        assert!(matches!(broadcasts.snapshot, Some(Event::Snapshot { .. })));
    }

    #[test]
    fn crash_kills_entrant_and_awards_bonus_once() {
        let mut state = new_state();
        let a = join_ready(&mut state, "a");
        let b = join_ready(&mut state, "b");
        clear_board(&mut state);
        // A heads into B's trail; B itself is far away and moving away.
        place(&mut state, a, Vec2::new(0.0, 0.0), 0.0);
        place(&mut state, b, Vec2::new(2000.0, 2000.0), 0.0);
        {
            let snake = state.world.snakes.get_mut(&b).unwrap();
            let len = snake.trail.len();
            snake.trail = (0..len).map(|_| Vec2::new(10.0, 0.0)).collect();
        }

        state.tick();
        assert!(!state.world.snakes[&a].is_alive());
        assert_eq!(state.world.snakes[&b].score, state.config.snake.kill_bonus);

        // No double counting on later ticks.
        state.tick();
        assert_eq!(state.world.snakes[&b].score, state.config.snake.kill_bonus);
    }

    #[test]
    fn mutual_crash_resolves_in_connection_order() {
        // Both heads sit in the other's trail. The earlier connection
        // steps first, crashes, and the later one collects the bonus,
        // independent of map iteration order.
        for _ in 0..10 {
            let mut state = new_state();
            let a = join_ready(&mut state, "a");
            let b = join_ready(&mut state, "b");
            clear_board(&mut state);
            place(&mut state, a, Vec2::new(0.0, 0.0), 0.0);
            place(&mut state, b, Vec2::new(10.0, 0.0), 0.0);

            state.tick();
            assert!(!state.world.snakes[&a].is_alive());
            assert!(state.world.snakes[&b].is_alive());
            // Corpse food can land in pickup reach of the survivor, so
            // the score is at least the kill bonus.
            assert!(state.world.snakes[&b].score >= state.config.snake.kill_bonus);
        }
    }

    #[test]
    fn huge_steer_angle_keeps_the_tick_bounded() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        place(&mut state, id, Vec2::ZERO, 0.0);

        state.handle_message(id, r#"{"type":"steer","angle":1e10,"boosting":false}"#);
        state.tick();
        let snake = &state.world.snakes[&id];
        assert!(snake.heading.is_finite());
        assert!(snake.heading.abs() <= state.config.snake.max_turn + 1e-6);
    }

    #[test]
    fn death_scatters_food_and_targets_the_loser() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        let mut targeted_rx = state.targeted_tx.subscribe();

        state.world.snakes.get_mut(&id).unwrap().score = 230;
        state.kill_snake(id);

        let trail_len = state.config.snake.start_length as usize;
        let expected = trail_len.div_ceil(state.config.food.scatter_stride);
        assert_eq!(state.world.foods.len(), expected);

        let message = targeted_rx.try_recv().unwrap();
        assert_eq!(message.client_id, id);
        assert!(matches!(message.event, Event::Eliminated { score: 230 }));

        // Idempotent: a second kill emits nothing.
        state.kill_snake(id);
        assert!(targeted_rx.try_recv().is_err());
        assert_eq!(state.world.foods.len(), expected);
    }

    #[test]
    fn leave_is_quiet() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        let mut targeted_rx = state.targeted_tx.subscribe();

        state.handle_message(id, r#"{"type":"leave"}"#);
        let snake = &state.world.snakes[&id];
        assert_eq!(snake.state, SnakeState::Dead);
        assert!(!snake.ready);
        assert!(snake.trail.is_empty());
        assert!(state.world.foods.is_empty());
        assert!(targeted_rx.try_recv().is_err());
        assert_eq!(state.phase, SessionPhase::Running);
    }

    #[test]
    fn pickups_apply_effects_and_respawn_food() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        place(&mut state, id, Vec2::ZERO, 0.0);

        let cfg = state.config.food.clone();
        state
            .world
            .spawn_food(&cfg, Some(Vec2::ZERO), Some(FoodKind::Normal));
        let before = state.world.snakes[&id].target_length;
        state.resolve_pickups(id);
        let snake = &state.world.snakes[&id];
        assert_eq!(snake.target_length, before + cfg.growth);
        assert_eq!(snake.score, cfg.score);
        assert_eq!(snake.trail.len(), snake.target_length as usize);
        // Replacement spawned.
        assert_eq!(state.world.foods.len(), 1);

        clear_board(&mut state);
        state
            .world
            .spawn_food(&cfg, Some(Vec2::ZERO), Some(FoodKind::Shield));
        state.resolve_pickups(id);
        assert_eq!(
            state.world.snakes[&id].shield_timer,
            state.config.snake.shield_ticks
        );

        clear_board(&mut state);
        state
            .world
            .spawn_food(&cfg, Some(Vec2::ZERO), Some(FoodKind::Boost));
        state.resolve_pickups(id);
        assert_eq!(
            state.world.snakes[&id].boost_timer,
            state.config.snake.boost_pickup_ticks
        );

        clear_board(&mut state);
        state
            .world
            .spawn_food(&cfg, Some(Vec2::ZERO), Some(FoodKind::Mine));
        state.resolve_pickups(id);
        assert_eq!(state.world.mines.len(), 1);
        assert_eq!(state.world.mines[0].fuse, state.config.mine.fuse_ticks);
    }

    #[test]
    fn nets_drain_others_but_never_the_owner() {
        let mut state = new_state();
        let a = join_ready(&mut state, "a");
        let b = join_ready(&mut state, "b");
        clear_board(&mut state);
        place(&mut state, a, Vec2::ZERO, 0.0);
        place(&mut state, b, Vec2::ZERO, 0.0);

        state.world.nets.push(CastNet {
            position: Vec2::ZERO,
            radius: 100.0,
            owner: a,
            lifetime: 120,
        });

        let a_before = state.world.snakes[&a].target_length;
        let b_before = state.world.snakes[&b].target_length;
        state.resolve_nets(a);
        state.resolve_nets(b);
        assert_eq!(state.world.snakes[&a].target_length, a_before);
        assert_eq!(
            state.world.snakes[&b].target_length,
            b_before - state.config.net.drain
        );
    }

    #[test]
    fn net_starvation_kills() {
        let mut state = new_state();
        let a = join_ready(&mut state, "a");
        let b = join_ready(&mut state, "b");
        clear_board(&mut state);
        place(&mut state, a, Vec2::new(3000.0, 3000.0), 0.0);
        place(&mut state, b, Vec2::ZERO, 0.0);
        state.world.snakes.get_mut(&b).unwrap().target_length = 10.0;

        state.world.nets.push(CastNet {
            position: Vec2::ZERO,
            radius: 100.0,
            owner: a,
            lifetime: 120,
        });
        state.resolve_nets(b);
        assert!(!state.world.snakes[&b].is_alive());
    }

    #[test]
    fn shield_blocks_net_drain() {
        let mut state = new_state();
        let a = join_ready(&mut state, "a");
        let b = join_ready(&mut state, "b");
        clear_board(&mut state);
        place(&mut state, b, Vec2::ZERO, 0.0);
        let before = state.world.snakes[&b].target_length;
        state.world.snakes.get_mut(&b).unwrap().shield_timer = 10;
        state.world.nets.push(CastNet {
            position: Vec2::ZERO,
            radius: 100.0,
            owner: a,
            lifetime: 120,
        });
        state.resolve_nets(b);
        assert_eq!(state.world.snakes[&b].target_length, before);
    }

    #[test]
    fn cast_net_is_cooldown_gated() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);

        state.handle_message(id, r#"{"type":"cast_net"}"#);
        assert_eq!(state.world.nets.len(), 1);

        // Still cooling down.
        state.tick_count += 10;
        state.handle_message(id, r#"{"type":"cast_net"}"#);
        assert_eq!(state.world.nets.len(), 1);

        // Exactly at the cooldown boundary the cast succeeds.
        state.tick_count += u64::from(state.config.net.cooldown_ticks) - 10;
        state.handle_message(id, r#"{"type":"cast_net"}"#);
        assert_eq!(state.world.nets.len(), 2);
    }

    #[test]
    fn net_lands_in_front_of_the_caster() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        place(&mut state, id, Vec2::new(100.0, 0.0), 0.0);

        state.handle_message(id, r#"{"type":"cast_net"}"#);
        let net = &state.world.nets[0];
        assert!((net.position.x - (100.0 + state.config.net.cast_offset)).abs() < 1e-3);
        assert!(net.position.y.abs() < 1e-3);
        assert_eq!(net.owner, id);
    }

    #[test]
    fn mine_blast_kills_at_head_and_halves_on_graze() {
        let mut state = new_state();
        let a = join_ready(&mut state, "a");
        let b = join_ready(&mut state, "b");
        clear_board(&mut state);

        // A's head sits inside the blast. B's head is outside, but its
        // trail reaches into it.
        place(&mut state, a, Vec2::ZERO, 0.0);
        place(&mut state, b, Vec2::new(300.0, 0.0), 0.0);
        {
            let snake = state.world.snakes.get_mut(&b).unwrap();
            snake.target_length = 200.0;
            snake.trail = (0..200).map(|i| Vec2::new(300.0 - i as f32, 0.0)).collect();
        }

        state.world.mines.push(ArmedMine {
            position: Vec2::ZERO,
            blast_radius: 150.0,
            fuse: 1,
        });
        state.detonate_mines();

        assert!(!state.world.snakes[&a].is_alive());
        let b_snake = &state.world.snakes[&b];
        assert!(b_snake.is_alive());
        assert_eq!(b_snake.target_length, 100.0);
        assert_eq!(b_snake.trail.len(), 100);
        assert!(state.world.mines.is_empty());
    }

    #[test]
    fn shield_blocks_mine_blast() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        clear_board(&mut state);
        place(&mut state, id, Vec2::ZERO, 0.0);
        state.world.snakes.get_mut(&id).unwrap().shield_timer = 10;
        state.world.mines.push(ArmedMine {
            position: Vec2::ZERO,
            blast_radius: 150.0,
            fuse: 1,
        });
        state.detonate_mines();
        assert!(state.world.snakes[&id].is_alive());
    }

    #[test]
    fn nets_expire_after_their_lifetime() {
        let mut state = new_state();
        state.world.nets.push(CastNet {
            position: Vec2::ZERO,
            radius: 100.0,
            owner: 1,
            lifetime: 2,
        });
        state.expire_nets();
        assert_eq!(state.world.nets.len(), 1);
        state.expire_nets();
        assert!(state.world.nets.is_empty());
    }

    #[test]
    fn steering_is_ignored_while_waiting_or_dead() {
        let mut state = new_state();
        let id = state.add_client(addr(1));
        state.handle_message(id, r#"{"type":"join","name":"a"}"#);
        state.handle_message(id, r#"{"type":"steer","angle":1.0,"boosting":true}"#);
        assert_eq!(state.world.snakes[&id].target_heading, 0.0);

        state.handle_message(id, r#"{"type":"toggle_ready"}"#);
        state.handle_message(id, r#"{"type":"steer","angle":1.0,"boosting":true}"#);
        assert_eq!(state.world.snakes[&id].target_heading, 1.0);
        assert!(state.world.snakes[&id].boosting);

        state.kill_snake(id);
        state.handle_message(id, r#"{"type":"steer","angle":2.0,"boosting":false}"#);
        assert_eq!(state.world.snakes[&id].target_heading, 1.0);
    }

    #[test]
    fn malformed_input_changes_nothing() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        let heading_before = state.world.snakes[&id].target_heading;
        state.handle_message(id, "not json at all");
        state.handle_message(id, r#"{"type":"steer","angle":1e999}"#);
        state.handle_message(id, r#"{"type":"warp"}"#);
        assert_eq!(state.world.snakes[&id].target_heading, heading_before);
        assert_eq!(state.phase, SessionPhase::Running);
    }

    #[test]
    fn join_sanitizes_names() {
        let mut state = new_state();
        let id = state.add_client(addr(1));
        state.handle_message(id, r#"{"type":"join","name":"   "}"#);
        assert_eq!(state.world.snakes[&id].name, "Guest");

        let long = "x".repeat(100);
        state.handle_message(id, &format!(r#"{{"type":"join","name":"{long}"}}"#));
        assert_eq!(
            state.world.snakes[&id].name.chars().count(),
            state.config.snake.max_name_length
        );
    }

    #[test]
    fn disconnect_removes_the_snake() {
        let mut state = new_state();
        let id = join_ready(&mut state, "solo");
        state.remove_client(id);
        assert!(state.world.snakes.get(&id).is_none());
        assert!(state.clients.get(&id).is_none());
    }
}
