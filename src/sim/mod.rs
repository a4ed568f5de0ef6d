//! Game simulation module
//!
//! All gameplay logic lives here, free of rendering and platform code:
//! - `engine`: owns the game state; spawning, motion, destruction, levels
//! - `input`: keystroke buffer to target lock/progress/destroy
//! - `clock`: motion and spawn timers on a virtual millisecond clock
//! - `tick`: single-consumer session loop tying the three together

pub mod clock;
pub mod engine;
pub mod input;
pub mod state;
pub mod tick;
pub mod words;

pub use clock::{Scheduler, Timer, TimerKind};
pub use engine::Simulation;
pub use input::{InputResolver, Key, Resolution};
pub use state::{Enemy, GamePhase, GameState, Snapshot};
pub use tick::{Notice, Session, SessionEvent};
pub use words::{WORDS, max_word_length, random_word};
