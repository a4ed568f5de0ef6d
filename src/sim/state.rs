//! Game state and core simulation types
//!
//! `GameState` is owned by [`super::Simulation`]; everything here is plain
//! data plus derived views. The renderer only ever sees a [`Snapshot`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::STARTING_LIVES;
use crate::rewards;

/// State machine view derived from the game flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not playing, no enemies
    Idle,
    /// Active gameplay (timers running, keys accepted)
    Playing,
    /// Game is paused
    Paused,
    /// Roster emptied by typing
    LevelComplete,
    /// Lives ran out
    GameOver,
}

/// A falling target bound to a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub word: String,
    /// Play-field position, y grows downward
    pub pos: Vec2,
    /// Added to `pos.y` every motion tick
    pub speed: f32,
    /// Characters typed so far while this enemy is locked (never longer than `word`)
    pub typed: String,
}

impl Enemy {
    pub fn new(id: u32, word: impl Into<String>, pos: Vec2, speed: f32) -> Self {
        Self {
            id,
            word: word.into(),
            pos,
            speed,
            typed: String::new(),
        }
    }

    /// Number of leading typed characters that agree with the word
    pub fn matched_len(&self) -> usize {
        self.typed
            .bytes()
            .zip(self.word.bytes())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    pub lives: u32,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    /// Buffer accumulated against the locked enemy
    pub current_input: String,
    /// Enemy currently locked by input (weak reference by id)
    pub active_enemy_id: Option<u32>,
    pub is_playing: bool,
    pub is_paused: bool,
    pub game_over: bool,
    pub level_complete: bool,
    /// Best score this session, survives resets
    pub high_score: u64,
    /// Next entity ID
    next_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            lives: STARTING_LIVES,
            enemies: Vec::new(),
            current_input: String::new(),
            active_enemy_id: None,
            is_playing: false,
            is_paused: false,
            game_over: false,
            level_complete: false,
            high_score: 0,
            next_id: 1,
        }
    }
}

impl GameState {
    /// Idle state with the given lives, carrying a session high score
    pub fn new(lives: u32, high_score: u64) -> Self {
        Self {
            lives,
            high_score,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current state machine phase
    pub fn phase(&self) -> GamePhase {
        if self.game_over {
            GamePhase::GameOver
        } else if self.level_complete {
            GamePhase::LevelComplete
        } else if self.is_playing && self.is_paused {
            GamePhase::Paused
        } else if self.is_playing {
            GamePhase::Playing
        } else {
            GamePhase::Idle
        }
    }

    /// True while timers should run and keys should reach the resolver
    pub fn is_running(&self) -> bool {
        self.is_playing && !self.is_paused
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    /// Raise the session high score if the current score beats it
    pub(crate) fn record_high_score(&mut self) {
        self.high_score = self.high_score.max(self.score);
    }
}

/// Immutable view of the game handed to the renderer once per motion tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub level: u32,
    pub score: u64,
    pub lives: u32,
    pub high_score: u64,
    pub enemies: Vec<Enemy>,
    pub current_input: String,
    pub active_enemy_id: Option<u32>,
    pub is_playing: bool,
    pub is_paused: bool,
    pub game_over: bool,
    pub level_complete: bool,
    /// HUD: tokens earned so far (10 per 100 points)
    pub earned_tokens: u64,
    /// HUD: percent progress through the current 1000-point band
    pub progress_percent: f32,
    /// HUD: one streak step per 50 points while playing
    pub streak: u64,
    /// HUD: whether the score meets the reward claim threshold
    pub can_claim_reward: bool,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let score = state.score;
        Self {
            phase: state.phase(),
            level: state.level,
            score,
            lives: state.lives,
            high_score: state.high_score,
            enemies: state.enemies.clone(),
            current_input: state.current_input.clone(),
            active_enemy_id: state.active_enemy_id,
            is_playing: state.is_playing,
            is_paused: state.is_paused,
            game_over: state.game_over,
            level_complete: state.level_complete,
            earned_tokens: (score / 100) * 10,
            progress_percent: ((score % 1000) as f32 / 1000.0 * 100.0).min(100.0),
            streak: if state.is_playing { score / 50 } else { 0 },
            can_claim_reward: rewards::score_qualifies(score),
        }
    }

    /// JSON form for a JavaScript renderer
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
