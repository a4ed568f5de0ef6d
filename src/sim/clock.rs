//! Virtual timer scheduler
//!
//! Two periodic timers drive the simulation: motion (fixed cadence) and
//! spawn (period shrinks with level). They only exist while the game is
//! running; leaving the running state cancels both, and every re-entry
//! restarts them from scratch. Time is a plain millisecond counter so hosts
//! and tests decide how fast it moves.

use crate::settings::GameConfig;

/// Which periodic callback fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Motion,
    Spawn,
}

/// A periodic timer on the virtual clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub period_ms: u64,
    pub next_due_ms: u64,
}

impl Timer {
    fn starting_at(now_ms: u64, period_ms: u64) -> Self {
        Self {
            period_ms,
            next_due_ms: now_ms + period_ms,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    motion: Option<Timer>,
    spawn: Option<Timer>,
    /// Play epoch the running timers were started for
    started_epoch: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn motion(&self) -> Option<Timer> {
        self.motion
    }

    pub fn spawn(&self) -> Option<Timer> {
        self.spawn
    }

    pub fn is_active(&self) -> bool {
        self.motion.is_some() || self.spawn.is_some()
    }

    /// Match timers to the game: cancel when not running, start fresh when
    /// running without timers or in a new play epoch.
    pub fn sync(&mut self, running: bool, epoch: u64, level: u32, config: &GameConfig) {
        if !running {
            if self.is_active() {
                log::debug!("Timers cancelled at {}ms", self.now_ms);
            }
            self.cancel();
            return;
        }
        if self.is_active() && self.started_epoch == Some(epoch) {
            return;
        }

        let spawn_period = config.spawn_period_ms(level);
        self.motion = Some(Timer::starting_at(self.now_ms, config.motion_tick_ms));
        self.spawn = Some(Timer::starting_at(self.now_ms, spawn_period));
        self.started_epoch = Some(epoch);
        log::debug!(
            "Timers started at {}ms (motion {}ms, spawn {}ms)",
            self.now_ms,
            config.motion_tick_ms,
            spawn_period
        );
    }

    pub fn cancel(&mut self) {
        self.motion = None;
        self.spawn = None;
        self.started_epoch = None;
    }

    /// Pop the earliest timer due at or before `until_ms`, moving the clock to
    /// its due time and rescheduling it. Motion wins ties.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerKind> {
        let motion_due = self.motion.map(|t| t.next_due_ms).filter(|&d| d <= until_ms);
        let spawn_due = self.spawn.map(|t| t.next_due_ms).filter(|&d| d <= until_ms);

        let kind = match (motion_due, spawn_due) {
            (Some(m), Some(s)) if s < m => TimerKind::Spawn,
            (Some(_), _) => TimerKind::Motion,
            (None, Some(_)) => TimerKind::Spawn,
            (None, None) => return None,
        };

        let timer = match kind {
            TimerKind::Motion => self.motion.as_mut(),
            TimerKind::Spawn => self.spawn.as_mut(),
        }?;
        self.now_ms = timer.next_due_ms;
        timer.next_due_ms += timer.period_ms;
        Some(kind)
    }

    /// Move the clock forward without firing anything
    pub fn settle(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
