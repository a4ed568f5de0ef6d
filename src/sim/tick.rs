//! Session event loop
//!
//! A single consumer for key events and elapsed time. Every event is
//! resolved to completion before the next one, and the timers are re-synced
//! with the game after each step so nothing fires outside active play.

use super::clock::{Scheduler, TimerKind};
use super::engine::Simulation;
use super::input::{InputResolver, Key, Resolution};
use super::state::{GamePhase, GameState, Snapshot};
use crate::rewards::{ClaimReceipt, ClaimRequest, RewardsError, RewardsService};
use crate::settings::Settings;

/// Input to the session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Key(Key),
    /// Milliseconds of (virtual or wall) time passed
    Elapsed(u64),
}

/// Observable things that happened while handling an event
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Spawned { enemy_id: u32 },
    EnemyDestroyed { enemy_id: u32, word: String, points: u64 },
    LivesLost { count: u32, remaining: u32 },
    LevelComplete { level: u32, score: u64 },
    GameOver { level: u32, score: u64 },
    Paused,
    Resumed,
    /// Render state after a motion tick
    Snapshot(Snapshot),
}

/// One play session: simulation, input resolver and timers
#[derive(Debug, Clone)]
pub struct Session {
    sim: Simulation,
    resolver: InputResolver,
    scheduler: Scheduler,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self::from_parts(Simulation::new(settings.game.clone()), settings)
    }

    /// Session with a seeded simulation (tests, demos)
    pub fn with_seed(settings: &Settings, seed: u64) -> Self {
        Self::from_parts(Simulation::with_seed(settings.game.clone(), seed), settings)
    }

    fn from_parts(sim: Simulation, settings: &Settings) -> Self {
        Self {
            sim,
            resolver: InputResolver::new(settings.input),
            scheduler: Scheduler::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        self.sim.state()
    }

    pub fn phase(&self) -> GamePhase {
        self.sim.state().phase()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sim.snapshot()
    }

    pub fn start_game(&mut self) {
        self.sim.start_game();
        self.sync_timers();
    }

    pub fn reset_game(&mut self) {
        self.sim.reset_game();
        self.sync_timers();
    }

    /// Reset then start, as the game-over screen's restart does
    pub fn restart(&mut self) {
        self.sim.reset_game();
        self.sim.start_game();
        self.sync_timers();
    }

    pub fn next_level(&mut self) -> bool {
        let advanced = self.sim.next_level();
        self.sync_timers();
        advanced
    }

    /// Toggle pause while a game is in progress
    pub fn toggle_pause(&mut self) -> Option<Notice> {
        let state = self.sim.state();
        if !state.is_playing {
            return None;
        }
        let notice = if state.is_paused {
            self.sim.resume_game();
            Notice::Resumed
        } else {
            self.sim.pause_game();
            Notice::Paused
        };
        self.sync_timers();
        Some(notice)
    }

    /// Pause if currently running (host focus loss)
    pub fn pause(&mut self) -> Option<Notice> {
        if self.sim.state().is_running() {
            self.toggle_pause()
        } else {
            None
        }
    }

    /// Handle one event to completion
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Notice> {
        let mut notices = Vec::new();
        match event {
            SessionEvent::Key(key) => self.handle_key(key, &mut notices),
            SessionEvent::Elapsed(ms) => self.advance(ms, &mut notices),
        }
        notices
    }

    fn handle_key(&mut self, key: Key, notices: &mut Vec<Notice>) {
        if key == Key::Escape {
            notices.extend(self.toggle_pause());
            return;
        }
        if !self.sim.state().is_running() {
            return;
        }

        if let Some(Resolution::Destroyed {
            enemy_id,
            word,
            points,
        }) = self.resolver.apply_key(&mut self.sim, key)
        {
            notices.push(Notice::EnemyDestroyed {
                enemy_id,
                word,
                points,
            });
            let state = self.sim.state();
            if state.level_complete {
                notices.push(Notice::LevelComplete {
                    level: state.level,
                    score: state.score,
                });
            }
        }
        self.sync_timers();
    }

    fn advance(&mut self, ms: u64, notices: &mut Vec<Notice>) {
        let until = self.scheduler.now_ms() + ms;
        while let Some(kind) = self.scheduler.pop_due(until) {
            match kind {
                TimerKind::Motion => {
                    let lives_before = self.sim.state().lives;
                    let removed = self.sim.advance_enemies();
                    let state = self.sim.state();
                    if !removed.is_empty() {
                        notices.push(Notice::LivesLost {
                            count: lives_before - state.lives,
                            remaining: state.lives,
                        });
                    }
                    if state.game_over {
                        notices.push(Notice::GameOver {
                            level: state.level,
                            score: state.score,
                        });
                    }
                    notices.push(Notice::Snapshot(Snapshot::capture(state)));
                }
                TimerKind::Spawn => {
                    if let Some(enemy_id) = self.sim.spawn_enemy() {
                        notices.push(Notice::Spawned { enemy_id });
                    }
                }
            }
            self.sync_timers();
        }
        self.scheduler.settle(until);
    }

    fn sync_timers(&mut self) {
        let state = self.sim.state();
        self.scheduler.sync(
            state.is_running(),
            self.sim.epoch(),
            state.level,
            self.sim.config(),
        );
    }

    /// Claim the reward for the level just completed. The game state is
    /// final at this point and the outcome never feeds back into it.
    pub fn claim_reward(
        &self,
        service: &mut dyn RewardsService,
        address: Option<&str>,
    ) -> Result<ClaimReceipt, RewardsError> {
        let state = self.sim.state();
        if !state.level_complete {
            return Err(RewardsError::LevelNotComplete);
        }
        let request = ClaimRequest::new(address, state.level, state.score)?;
        match service.claim_level_reward(&request) {
            Ok(receipt) => {
                log::info!("Reward claimed for level {}: {}", request.level, receipt.tx_hash);
                Ok(receipt)
            }
            Err(e) => {
                log::warn!("Reward claim for level {} failed: {}", request.level, e);
                Err(e)
            }
        }
    }
}
