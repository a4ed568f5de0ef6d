//! Target word dictionary
//!
//! Words are lowercase ASCII. Difficulty is controlled only by the maximum
//! word length offered at a given level.

use rand::Rng;

use crate::consts::MAX_WORD_LENGTH;

/// Fixed dictionary enemies draw their words from
pub const WORDS: &[&str] = &[
    "cat", "dog", "run", "jump", "play", "game", "type", "fast", "slow", "code", "react", "block",
    "chain", "token", "mint", "send", "sign", "hash", "node", "peer", "smart", "contract",
    "deploy", "verify", "compile", "execute", "function", "variable", "constant", "import",
    "export", "default", "return", "async", "await", "promise", "callback", "listener",
    "emitter", "provider",
];

/// Shortest word in the dictionary; every length cap is clamped to at least this
const MIN_WORD_LENGTH: usize = 3;

/// Maximum word length for trickle spawns at a level: min(3 + level/2, 7)
pub fn max_word_length(level: u32) -> usize {
    (3 + (level / 2) as usize).min(MAX_WORD_LENGTH)
}

/// Pick a random word no longer than `max_len`
pub fn random_word<R: Rng + ?Sized>(rng: &mut R, max_len: usize) -> &'static str {
    let max_len = max_len.max(MIN_WORD_LENGTH);
    let candidates: Vec<&'static str> = WORDS.iter().copied().filter(|w| w.len() <= max_len).collect();
    candidates[rng.random_range(0..candidates.len())]
}
