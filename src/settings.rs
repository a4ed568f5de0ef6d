//! Game settings and tuning
//!
//! Persisted in LocalStorage on the web; native builds use defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Play field geometry, difficulty curve and timer cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub field_width: f32,
    pub field_height: f32,
    /// Enemy speed at level 1 (field units per motion tick)
    pub base_enemy_speed: f32,
    pub speed_increase_per_level: f32,
    /// Level 1 wave size and base of the concurrent cap
    pub enemies_per_level: u32,
    pub spawn_margin: f32,
    pub spawn_y: f32,
    pub roster_stagger: f32,
    pub starting_lives: u32,
    pub motion_tick_ms: u64,
    pub spawn_base_ms: u64,
    pub spawn_step_ms: u64,
    pub spawn_min_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            base_enemy_speed: BASE_ENEMY_SPEED,
            speed_increase_per_level: SPEED_INCREASE_PER_LEVEL,
            enemies_per_level: ENEMIES_PER_LEVEL,
            spawn_margin: SPAWN_MARGIN,
            spawn_y: SPAWN_Y,
            roster_stagger: ROSTER_STAGGER,
            starting_lives: STARTING_LIVES,
            motion_tick_ms: MOTION_TICK_MS,
            spawn_base_ms: SPAWN_BASE_MS,
            spawn_step_ms: SPAWN_STEP_MS,
            spawn_min_ms: SPAWN_MIN_MS,
        }
    }
}

impl GameConfig {
    /// Enemy speed for a level
    pub fn enemy_speed(&self, level: u32) -> f32 {
        self.base_enemy_speed + level.saturating_sub(1) as f32 * self.speed_increase_per_level
    }

    /// Maximum concurrent enemies the spawn tick will fill up to
    pub fn spawn_cap(&self, level: u32) -> usize {
        (self.enemies_per_level + level) as usize
    }

    /// Size of the bulk wave at the start of a level
    pub fn roster_size(&self, level: u32) -> usize {
        (self.enemies_per_level + level.saturating_sub(1) * 2) as usize
    }

    /// Spawn tick period, shrinking with level down to a floor
    pub fn spawn_period_ms(&self, level: u32) -> u64 {
        self.spawn_base_ms
            .saturating_sub(level as u64 * self.spawn_step_ms)
            .max(self.spawn_min_ms)
    }
}

/// How the input resolver treats lock release and wrong keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPolicy {
    /// Backspacing to an empty buffer releases the lock so another enemy can
    /// be targeted. Off: the lock holds until the word is completed.
    pub release_lock_on_empty: bool,
    /// Drop keystrokes that diverge from the locked word. Off: wrong keys are
    /// stored as typed progress and only backspace can fix them.
    pub reject_mismatch: bool,
}

/// Game settings/preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameConfig,
    pub input: InputPolicy,
}

impl Settings {
    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let g = &self.game;
        if g.field_width <= 0.0 || g.field_height <= 0.0 {
            return Err(SettingsError::Invalid("field dimensions must be positive".into()));
        }
        if g.spawn_margin < 0.0 || g.spawn_margin * 2.0 >= g.field_width {
            return Err(SettingsError::Invalid(format!(
                "spawn margin {} does not fit field width {}",
                g.spawn_margin, g.field_width
            )));
        }
        if g.motion_tick_ms == 0 || g.spawn_min_ms == 0 {
            return Err(SettingsError::Invalid("tick periods must be non-zero".into()));
        }
        if g.spawn_min_ms > g.spawn_base_ms {
            return Err(SettingsError::Invalid(format!(
                "spawn floor {}ms exceeds base period {}ms",
                g.spawn_min_ms, g.spawn_base_ms
            )));
        }
        if g.starting_lives == 0 {
            return Err(SettingsError::Invalid("starting lives must be at least 1".into()));
        }
        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "typing_shooter_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
