//! Simulation engine
//!
//! Owns the [`GameState`] and is the only thing that mutates it. Every
//! operation is synchronous and runs to completion, so a motion tick's
//! removal, life loss and game-over check are observed together.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{Enemy, GameState, Snapshot};
use super::words::{max_word_length, random_word};
use crate::consts::MAX_WORD_LENGTH;
use crate::settings::GameConfig;

/// The game simulation, one per play session
#[derive(Debug, Clone)]
pub struct Simulation {
    state: GameState,
    config: GameConfig,
    rng: Pcg32,
    /// Bumped whenever a fresh play period begins (start or next level)
    epoch: u64,
}

impl Simulation {
    /// Create an idle simulation seeded from OS entropy
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, Pcg32::from_os_rng())
    }

    /// Create an idle simulation with a fixed seed (tests, demos)
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: Pcg32) -> Self {
        Self {
            state: GameState::new(config.starting_lives, 0),
            config,
            rng,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Play-period counter; a change means timers must restart fresh
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Fresh initial state carrying over the session high score
    fn initial_state(&self) -> GameState {
        GameState::new(self.config.starting_lives, self.state.high_score)
    }

    /// Start a new game at level 1 with a full roster
    pub fn start_game(&mut self) {
        self.state = self.initial_state();
        self.state.enemies = self.generate_roster(1);
        self.state.is_playing = true;
        self.epoch += 1;
        log::info!(
            "Game started: level 1, {} enemies, high score {}",
            self.state.enemies.len(),
            self.state.high_score
        );
    }

    /// Set the paused flag. Returns false if already paused.
    pub fn pause_game(&mut self) -> bool {
        if self.state.is_paused {
            return false;
        }
        self.state.is_paused = true;
        log::debug!("Paused at level {}", self.state.level);
        true
    }

    /// Clear the paused flag. Returns false if not paused.
    pub fn resume_game(&mut self) -> bool {
        if !self.state.is_paused {
            return false;
        }
        self.state.is_paused = false;
        log::debug!("Resumed at level {}", self.state.level);
        true
    }

    /// Back to the idle state, keeping the high score
    pub fn reset_game(&mut self) {
        self.state = self.initial_state();
        log::info!("Game reset (high score {})", self.state.high_score);
    }

    /// One motion tick: move every enemy down, drop the ones past the bottom
    /// edge and charge a life for each. Returns the removed enemy ids.
    pub fn advance_enemies(&mut self) -> Vec<u32> {
        if !self.state.is_running() {
            log::debug!("advance_enemies ignored: not running");
            return Vec::new();
        }

        let field_height = self.config.field_height;
        for enemy in &mut self.state.enemies {
            enemy.pos.y += enemy.speed;
        }

        let mut removed = Vec::new();
        self.state.enemies.retain(|e| {
            if e.pos.y > field_height {
                removed.push(e.id);
                false
            } else {
                true
            }
        });

        if removed.is_empty() {
            return removed;
        }

        // The lock is a weak reference; drop it along with its enemy
        if let Some(active) = self.state.active_enemy_id {
            if removed.contains(&active) {
                self.state.active_enemy_id = None;
                self.state.current_input.clear();
                log::debug!("Lock on enemy {} released: reached bottom", active);
            }
        }

        self.state.lives = self.state.lives.saturating_sub(removed.len() as u32);
        log::debug!(
            "{} enemies reached the bottom, {} lives left",
            removed.len(),
            self.state.lives
        );

        if self.state.lives == 0 {
            self.state.game_over = true;
            self.state.is_playing = false;
            self.state.record_high_score();
            log::info!(
                "Game over at level {} with score {}",
                self.state.level,
                self.state.score
            );
        }

        removed
    }

    /// Trickle-spawn one enemy if the roster is below the level cap.
    /// Returns the new enemy id.
    pub fn spawn_enemy(&mut self) -> Option<u32> {
        if !self.state.is_running() {
            log::debug!("spawn_enemy ignored: not running");
            return None;
        }
        let level = self.state.level;
        if self.state.enemies.len() >= self.config.spawn_cap(level) {
            return None;
        }

        let word = random_word(&mut self.rng, max_word_length(level));
        let x = self.random_x();
        let speed = self.config.enemy_speed(level);
        let id = self.state.next_entity_id();
        self.state
            .enemies
            .push(Enemy::new(id, word, Vec2::new(x, self.config.spawn_y), speed));
        log::debug!("Spawned enemy {} '{}' at x={:.0}", id, word, x);
        Some(id)
    }

    /// Remove an enemy and award points: `points` if given and non-zero,
    /// else the word length. Emptying the roster completes the level.
    /// Returns the points awarded.
    pub fn destroy_enemy(&mut self, enemy_id: u32, points: Option<u64>) -> Option<u64> {
        if !self.state.is_playing {
            log::debug!("destroy_enemy({}) ignored: not playing", enemy_id);
            return None;
        }
        let Some(idx) = self.state.enemies.iter().position(|e| e.id == enemy_id) else {
            log::debug!("destroy_enemy({}) ignored: no such enemy", enemy_id);
            return None;
        };

        let enemy = self.state.enemies.remove(idx);
        let points = points
            .filter(|&p| p > 0)
            .unwrap_or(enemy.word.len() as u64);
        self.state.score += points;
        self.state.record_high_score();

        if self.state.active_enemy_id == Some(enemy_id) {
            self.state.active_enemy_id = None;
            self.state.current_input.clear();
        }
        log::debug!(
            "Destroyed enemy {} '{}' (+{}), score {}",
            enemy_id,
            enemy.word,
            points,
            self.state.score
        );

        if self.state.enemies.is_empty() {
            self.state.level_complete = true;
            self.state.is_playing = false;
            log::info!(
                "Level {} complete with score {}",
                self.state.level,
                self.state.score
            );
        }

        Some(points)
    }

    /// Advance from a completed level to the next one with a fresh wave and
    /// full lives. No-op unless the level is complete.
    pub fn next_level(&mut self) -> bool {
        if !self.state.level_complete {
            log::debug!("next_level ignored: level not complete");
            return false;
        }

        let level = self.state.level + 1;
        self.state.level = level;
        self.state.lives = self.config.starting_lives;
        self.state.current_input.clear();
        self.state.active_enemy_id = None;
        self.state.level_complete = false;
        self.state.is_paused = false;
        self.state.is_playing = true;
        self.state.enemies = self.generate_roster(level);
        self.epoch += 1;
        log::info!(
            "Level {} started with {} enemies",
            level,
            self.state.enemies.len()
        );
        true
    }

    /// Bulk wave for the start of a level, staggered above the field.
    /// Count is fixed by level; words and positions are random.
    pub fn generate_roster(&mut self, level: u32) -> Vec<Enemy> {
        let count = self.config.roster_size(level);
        let speed = self.config.enemy_speed(level);
        let mut enemies = Vec::with_capacity(count);
        for _ in 0..count {
            let word = random_word(&mut self.rng, MAX_WORD_LENGTH);
            let x = self.random_x();
            let y = -self.rng.random::<f32>() * self.config.roster_stagger;
            let id = self.state.next_entity_id();
            enemies.push(Enemy::new(id, word, Vec2::new(x, y), speed));
        }
        enemies
    }

    fn random_x(&mut self) -> f32 {
        let margin = self.config.spawn_margin;
        margin + self.rng.random::<f32>() * (self.config.field_width - 2.0 * margin)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn playing_sim(seed: u64) -> Simulation {
        let mut sim = Simulation::with_seed(GameConfig::default(), seed);
        sim.start_game();
        sim
    }

    /// Replace the roster with known words, all at the top of the field
    pub(crate) fn set_roster(sim: &mut Simulation, words: &[&str]) -> Vec<u32> {
        let state = sim.state_mut();
        state.enemies.clear();
        words
            .iter()
            .map(|w| {
                let id = state.next_entity_id();
                state
                    .enemies
                    .push(Enemy::new(id, *w, Vec2::new(100.0, 0.0), 2.1));
                id
            })
            .collect()
    }

    #[test]
    fn test_start_game() {
        let mut sim = Simulation::with_seed(GameConfig::default(), 1);
        sim.state_mut().high_score = 99;
        sim.start_game();
        let state = sim.state();
        assert_eq!(state.level, 1);
        assert_eq!(state.lives, 3);
        assert_eq!(state.score, 0);
        assert_eq!(state.enemies.len(), 5);
        assert!(state.is_playing);
        assert!(!state.is_paused);
        assert!(state.current_input.is_empty());
        assert_eq!(state.active_enemy_id, None);
        assert_eq!(state.high_score, 99);
        assert_eq!(sim.epoch(), 1);
    }

    #[test]
    fn test_roster_layout() {
        let sim = playing_sim(3);
        let config = sim.config();
        for enemy in &sim.state().enemies {
            assert!(enemy.pos.y <= 0.0 && enemy.pos.y > -config.roster_stagger);
            assert!(enemy.pos.x >= config.spawn_margin);
            assert!(enemy.pos.x < config.field_width - config.spawn_margin);
            assert!(enemy.word.len() <= MAX_WORD_LENGTH);
            assert!((enemy.speed - 2.1).abs() < 1e-6);
            assert!(enemy.typed.is_empty());
        }
    }

    #[test]
    fn test_roster_words_vary_between_runs() {
        let a = playing_sim(1);
        let b = playing_sim(2);
        let words = |s: &Simulation| -> Vec<String> {
            s.state().enemies.iter().map(|e| e.word.clone()).collect()
        };
        assert_eq!(a.state().enemies.len(), b.state().enemies.len());
        assert_ne!(words(&a), words(&b));
    }

    #[test]
    fn test_pause_resume_idempotent() {
        let mut sim = playing_sim(1);
        assert!(sim.pause_game());
        assert!(!sim.pause_game());
        assert!(sim.state().is_paused);
        assert!(sim.resume_game());
        assert!(!sim.resume_game());
        assert!(!sim.state().is_paused);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        sim.destroy_enemy(ids[0], None);
        sim.reset_game();
        let state = sim.state();
        assert_eq!(state.high_score, 3);
        assert_eq!(state.score, 0);
        assert!(!state.is_playing);
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_advance_moves_enemies() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat"]);
        let removed = sim.advance_enemies();
        assert!(removed.is_empty());
        assert!((sim.state().enemies[0].pos.y - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_advance_noop_when_not_running() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat"]);
        sim.pause_game();
        sim.advance_enemies();
        assert_eq!(sim.state().enemies[0].pos.y, 0.0);

        let mut idle = Simulation::with_seed(GameConfig::default(), 1);
        assert!(idle.advance_enemies().is_empty());
    }

    #[test]
    fn test_enemy_at_bottom_costs_a_life() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        sim.state_mut().enemies[0].pos.y = 599.0;
        let removed = sim.advance_enemies();
        assert_eq!(removed, vec![ids[0]]);
        assert_eq!(sim.state().lives, 2);
        assert!(sim.state().is_playing);
        assert!(!sim.state().game_over);
    }

    #[test]
    fn test_three_at_bottom_ends_game_in_one_tick() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat", "dog", "run", "jump"]);
        for enemy in sim.state_mut().enemies.iter_mut().take(3) {
            enemy.pos.y = 600.0;
        }
        let removed = sim.advance_enemies();
        assert_eq!(removed.len(), 3);
        let state = sim.state();
        assert_eq!(state.lives, 0);
        assert!(state.game_over);
        assert!(!state.is_playing);
        assert!(!state.level_complete);
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_lives_saturate_at_zero() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat", "dog", "run", "jump", "play"]);
        for enemy in sim.state_mut().enemies.iter_mut() {
            enemy.pos.y = 650.0;
        }
        sim.advance_enemies();
        assert_eq!(sim.state().lives, 0);
        assert!(sim.state().game_over);
    }

    #[test]
    fn test_locked_enemy_falling_off_releases_lock() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        {
            let state = sim.state_mut();
            state.active_enemy_id = Some(ids[0]);
            state.current_input = "ca".into();
            state.enemies[0].pos.y = 599.0;
        }
        sim.advance_enemies();
        assert_eq!(sim.state().active_enemy_id, None);
        assert!(sim.state().current_input.is_empty());
    }

    #[test]
    fn test_spawn_enemy() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &[]);
        let id = sim.spawn_enemy().unwrap();
        let enemy = sim.state().enemy(id).unwrap();
        assert_eq!(enemy.pos.y, -50.0);
        assert!(enemy.word.len() <= 3);
        assert!((enemy.speed - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut sim = playing_sim(1);
        for _ in 0..20 {
            sim.spawn_enemy();
        }
        assert_eq!(sim.state().enemies.len(), 6);
        assert_eq!(sim.spawn_enemy(), None);
    }

    #[test]
    fn test_spawn_noop_when_paused() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &[]);
        sim.pause_game();
        assert_eq!(sim.spawn_enemy(), None);
    }

    #[test]
    fn test_destroy_scores_word_length() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["rocket", "cat"]);
        assert_eq!(sim.destroy_enemy(ids[0], None), Some(6));
        assert_eq!(sim.state().score, 6);
        assert_eq!(sim.state().high_score, 6);
        assert!(!sim.state().level_complete);
        assert_eq!(sim.destroy_enemy(ids[0], None), None);
    }

    #[test]
    fn test_destroy_zero_override_falls_back_to_length() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["rocket", "cat"]);
        assert_eq!(sim.destroy_enemy(ids[1], Some(0)), Some(3));
        assert_eq!(sim.destroy_enemy(ids[0], Some(10)), Some(10));
    }

    #[test]
    fn test_destroy_last_enemy_completes_level() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat"]);
        sim.destroy_enemy(ids[0], None);
        let state = sim.state();
        assert!(state.level_complete);
        assert!(!state.is_playing);
        assert!(!state.game_over);
    }

    #[test]
    fn test_destroy_ignored_after_game_over() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        sim.state_mut().lives = 1;
        sim.state_mut().enemies[0].pos.y = 600.0;
        sim.advance_enemies();
        assert!(sim.state().game_over);
        assert_eq!(sim.destroy_enemy(ids[1], None), None);
        assert_eq!(sim.state().enemies.len(), 1);
        assert!(!sim.state().level_complete);
    }

    #[test]
    fn test_next_level_resets_lives_and_grows_roster() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        sim.state_mut().lives = 1;
        sim.destroy_enemy(ids[0], None);
        sim.destroy_enemy(ids[1], None);
        sim.pause_game();
        assert!(sim.next_level());

        let state = sim.state();
        assert_eq!(state.level, 2);
        assert_eq!(state.lives, 3);
        assert_eq!(state.enemies.len(), 7);
        assert!(state.is_playing);
        assert!(!state.is_paused);
        assert!(!state.level_complete);
        assert_eq!(state.score, 6);
        assert_eq!(sim.epoch(), 2);
        for enemy in &state.enemies {
            assert!((enemy.speed - 2.6).abs() < 1e-6);
        }
    }

    #[test]
    fn test_next_level_requires_level_complete() {
        let mut sim = playing_sim(1);
        assert!(!sim.next_level());
        assert_eq!(sim.state().level, 1);
    }

    proptest! {
        #[test]
        fn prop_spawn_never_exceeds_cap(level in 1u32..30, attempts in 0usize..60) {
            let mut sim = playing_sim(level as u64);
            sim.state_mut().level = level;
            for _ in 0..attempts {
                sim.spawn_enemy();
                let cap = sim.config().spawn_cap(level);
                prop_assert!(sim.state().enemies.len() <= cap);
            }
        }

        #[test]
        fn prop_lives_never_increase(
            seed in any::<u64>(),
            steps in proptest::collection::vec(0u8..3, 0..400),
        ) {
            let mut sim = playing_sim(seed);
            let mut last = sim.state().lives;
            for step in steps {
                match step {
                    0 => { sim.advance_enemies(); }
                    1 => { sim.spawn_enemy(); }
                    _ => {
                        // Push everything halfway down the field
                        for e in sim.state_mut().enemies.iter_mut() {
                            e.pos.y += 150.0;
                        }
                    }
                }
                let lives = sim.state().lives;
                prop_assert!(lives <= last);
                last = lives;
            }
        }
    }
}
