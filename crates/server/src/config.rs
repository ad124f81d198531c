//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub snake: SnakeConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub net: NetConfig,
    #[serde(default)]
    pub mine: MineConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            arena: ArenaConfig::default(),
            snake: SnakeConfig::default(),
            food: FoodConfig::default(),
            net: NetConfig::default(),
            mine: MineConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Server name shown to clients.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    64
}
fn default_ip_limit() -> usize {
    8
}
fn default_name() -> String {
    "Serpent Royale".to_string()
}
fn default_tick_interval() -> u64 {
    16
}

/// Arena shrink-cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default = "default_arena_initial_radius")]
    pub initial_radius: f32,
    /// Shrinking stops for good at this radius.
    #[serde(default = "default_arena_min_radius")]
    pub min_radius: f32,
    /// Radius lost per tick while shrinking.
    #[serde(default = "default_arena_shrink_rate")]
    pub shrink_rate: f32,
    /// Length of each holding and shrinking phase, in ticks.
    #[serde(default = "default_arena_phase_ticks")]
    pub phase_ticks: u32,
    /// Warning flag stays up for this many ticks at the start of a shrink.
    #[serde(default = "default_arena_warning_ticks")]
    pub warning_ticks: u32,
    /// Spawn square inset from the arena edge at session start.
    #[serde(default = "default_arena_spawn_inset")]
    pub spawn_inset: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_radius: default_arena_initial_radius(),
            min_radius: default_arena_min_radius(),
            shrink_rate: default_arena_shrink_rate(),
            phase_ticks: default_arena_phase_ticks(),
            warning_ticks: default_arena_warning_ticks(),
            spawn_inset: default_arena_spawn_inset(),
        }
    }
}

fn default_arena_initial_radius() -> f32 {
    6000.0
}
fn default_arena_min_radius() -> f32 {
    500.0
}
fn default_arena_shrink_rate() -> f32 {
    1.0
}
fn default_arena_phase_ticks() -> u32 {
    1200
}
fn default_arena_warning_ticks() -> u32 {
    180
}
fn default_arena_spawn_inset() -> f32 {
    500.0
}

/// Snake physics and survival tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnakeConfig {
    #[serde(default = "default_snake_start_length")]
    pub start_length: f32,
    #[serde(default = "default_snake_base_speed")]
    pub base_speed: f32,
    #[serde(default = "default_snake_boost_speed")]
    pub boost_speed: f32,
    /// Maximum heading change per tick, in radians.
    #[serde(default = "default_snake_max_turn")]
    pub max_turn: f32,
    #[serde(default = "default_snake_base_thickness")]
    pub base_thickness: f32,
    #[serde(default = "default_snake_thickness_per_length")]
    pub thickness_per_length: f32,
    #[serde(default = "default_snake_max_thickness")]
    pub max_thickness: f32,
    /// Voluntary boost needs more length than this.
    #[serde(default = "default_snake_boost_min_length")]
    pub boost_min_length: f32,
    /// Boosting sheds one length after this many consecutive ticks.
    #[serde(default = "default_snake_mass_drop_ticks")]
    pub mass_drop_ticks: u32,
    /// Score lost per shed length.
    #[serde(default = "default_snake_mass_drop_score")]
    pub mass_drop_score: u32,
    /// Duration of a boost pickup, in ticks.
    #[serde(default = "default_snake_boost_pickup_ticks")]
    pub boost_pickup_ticks: u32,
    /// Duration of a shield pickup, in ticks.
    #[serde(default = "default_snake_shield_ticks")]
    pub shield_ticks: u32,
    /// Ticks survivable outside the arena before dying.
    #[serde(default = "default_snake_poison_ticks")]
    pub poison_ticks: u32,
    /// Nets kill below this length.
    #[serde(default = "default_snake_min_length")]
    pub min_length: f32,
    /// Score awarded for a kill.
    #[serde(default = "default_snake_kill_bonus")]
    pub kill_bonus: u32,
    #[serde(default = "default_snake_max_name_length")]
    pub max_name_length: usize,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            start_length: default_snake_start_length(),
            base_speed: default_snake_base_speed(),
            boost_speed: default_snake_boost_speed(),
            max_turn: default_snake_max_turn(),
            base_thickness: default_snake_base_thickness(),
            thickness_per_length: default_snake_thickness_per_length(),
            max_thickness: default_snake_max_thickness(),
            boost_min_length: default_snake_boost_min_length(),
            mass_drop_ticks: default_snake_mass_drop_ticks(),
            mass_drop_score: default_snake_mass_drop_score(),
            boost_pickup_ticks: default_snake_boost_pickup_ticks(),
            shield_ticks: default_snake_shield_ticks(),
            poison_ticks: default_snake_poison_ticks(),
            min_length: default_snake_min_length(),
            kill_bonus: default_snake_kill_bonus(),
            max_name_length: default_snake_max_name_length(),
        }
    }
}

fn default_snake_start_length() -> f32 {
    50.0
}
fn default_snake_base_speed() -> f32 {
    3.0
}
fn default_snake_boost_speed() -> f32 {
    6.0
}
fn default_snake_max_turn() -> f32 {
    0.1
}
fn default_snake_base_thickness() -> f32 {
    12.0
}
fn default_snake_thickness_per_length() -> f32 {
    0.02
}
fn default_snake_max_thickness() -> f32 {
    35.0
}
fn default_snake_boost_min_length() -> f32 {
    20.0
}
fn default_snake_mass_drop_ticks() -> u32 {
    10
}
fn default_snake_mass_drop_score() -> u32 {
    10
}
fn default_snake_boost_pickup_ticks() -> u32 {
    300
}
fn default_snake_shield_ticks() -> u32 {
    300
}
fn default_snake_poison_ticks() -> u32 {
    300
}
fn default_snake_min_length() -> f32 {
    10.0
}
fn default_snake_kill_bonus() -> u32 {
    100
}
fn default_snake_max_name_length() -> usize {
    24
}

/// Food spawning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Food spawned at session start.
    #[serde(default = "default_food_initial_amount")]
    pub initial_amount: usize,
    #[serde(default = "default_food_normal_radius")]
    pub normal_radius: f32,
    #[serde(default = "default_food_special_radius")]
    pub special_radius: f32,
    #[serde(default = "default_food_special_chance")]
    pub boost_chance: f64,
    #[serde(default = "default_food_special_chance")]
    pub shield_chance: f64,
    #[serde(default = "default_food_special_chance")]
    pub mine_chance: f64,
    /// Length gained per normal food.
    #[serde(default = "default_food_growth")]
    pub growth: f32,
    /// Score gained per normal food.
    #[serde(default = "default_food_score")]
    pub score: u32,
    /// Jitter range for scattered corpse food.
    #[serde(default = "default_food_scatter_range")]
    pub scatter_range: f32,
    /// A corpse scatters food at every nth trail point.
    #[serde(default = "default_food_scatter_stride")]
    pub scatter_stride: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            initial_amount: default_food_initial_amount(),
            normal_radius: default_food_normal_radius(),
            special_radius: default_food_special_radius(),
            boost_chance: default_food_special_chance(),
            shield_chance: default_food_special_chance(),
            mine_chance: default_food_special_chance(),
            growth: default_food_growth(),
            score: default_food_score(),
            scatter_range: default_food_scatter_range(),
            scatter_stride: default_food_scatter_stride(),
        }
    }
}

fn default_food_initial_amount() -> usize {
    420
}
fn default_food_normal_radius() -> f32 {
    6.0
}
fn default_food_special_radius() -> f32 {
    10.0
}
fn default_food_special_chance() -> f64 {
    0.05
}
fn default_food_growth() -> f32 {
    5.0
}
fn default_food_score() -> u32 {
    10
}
fn default_food_scatter_range() -> f32 {
    40.0
}
fn default_food_scatter_stride() -> usize {
    2
}

/// Cast-net ability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetConfig {
    #[serde(default = "default_net_cooldown_ticks")]
    pub cooldown_ticks: u32,
    /// Distance in front of the head where the net lands.
    #[serde(default = "default_net_cast_offset")]
    pub cast_offset: f32,
    #[serde(default = "default_net_radius")]
    pub radius: f32,
    #[serde(default = "default_net_lifetime_ticks")]
    pub lifetime_ticks: u32,
    /// Length drained per tick per net.
    #[serde(default = "default_net_drain")]
    pub drain: f32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            cooldown_ticks: default_net_cooldown_ticks(),
            cast_offset: default_net_cast_offset(),
            radius: default_net_radius(),
            lifetime_ticks: default_net_lifetime_ticks(),
            drain: default_net_drain(),
        }
    }
}

fn default_net_cooldown_ticks() -> u32 {
    1800
}
fn default_net_cast_offset() -> f32 {
    150.0
}
fn default_net_radius() -> f32 {
    100.0
}
fn default_net_lifetime_ticks() -> u32 {
    120
}
fn default_net_drain() -> f32 {
    1.0
}

/// Mine hazard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MineConfig {
    #[serde(default = "default_mine_blast_radius")]
    pub blast_radius: f32,
    #[serde(default = "default_mine_fuse_ticks")]
    pub fuse_ticks: u32,
    /// Blast checks every nth trail point.
    #[serde(default = "default_mine_trail_stride")]
    pub trail_stride: usize,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            blast_radius: default_mine_blast_radius(),
            fuse_ticks: default_mine_fuse_ticks(),
            trail_stride: default_mine_trail_stride(),
        }
    }
}

fn default_mine_blast_radius() -> f32 {
    150.0
}
fn default_mine_fuse_ticks() -> u32 {
    180
}
fn default_mine_trail_stride() -> usize {
    5
}
