//! Typing Shooter - type falling words to destroy enemy ships
//!
//! Core modules:
//! - `sim`: Simulation engine, input resolver, level/life state machine, virtual clock
//! - `settings`: Game tuning and input policy configuration
//! - `rewards`: Level reward claims (boundary to the rewards service)
//! - `wallet`: Wallet provider boundary

pub mod rewards;
pub mod settings;
pub mod sim;
pub mod wallet;

pub use settings::{GameConfig, InputPolicy, Settings, SettingsError};
pub use sim::{Enemy, GamePhase, GameState, Key, Session, SessionEvent, Simulation, Snapshot};

/// Game configuration constants
pub mod consts {
    /// Play field dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Enemy speed in field units per motion tick
    pub const BASE_ENEMY_SPEED: f32 = 2.1;
    pub const SPEED_INCREASE_PER_LEVEL: f32 = 0.5;

    /// Roster sizing: level 1 wave size and base concurrent cap
    pub const ENEMIES_PER_LEVEL: u32 = 5;

    /// Horizontal spawn margin on each side of the field
    pub const SPAWN_MARGIN: f32 = 50.0;
    /// Y at which trickle-spawned enemies appear (above the field)
    pub const SPAWN_Y: f32 = -50.0;
    /// Bulk roster enemies are staggered over (-ROSTER_STAGGER, 0]
    pub const ROSTER_STAGGER: f32 = 300.0;

    pub const STARTING_LIVES: u32 = 3;

    /// Motion tick period (20 Hz)
    pub const MOTION_TICK_MS: u64 = 50;
    /// Spawn tick period: max(SPAWN_MIN_MS, SPAWN_BASE_MS - level * SPAWN_STEP_MS)
    pub const SPAWN_BASE_MS: u64 = 3000;
    pub const SPAWN_STEP_MS: u64 = 200;
    pub const SPAWN_MIN_MS: u64 = 1000;

    /// Longest word the dictionary may hand out
    pub const MAX_WORD_LENGTH: usize = 7;
}
