//! Keystroke input resolution
//!
//! The key source only ever appends one character or removes the last one.
//! The resolver treats the whole buffer as the candidate typed progress for
//! a single locked enemy and destroys it on an exact word match.

use super::engine::Simulation;
use crate::settings::InputPolicy;

/// Keys that affect the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character (lowercased)
    Char(char),
    Backspace,
    /// Pause/resume toggle, handled before the resolver
    Escape,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name; anything else is not a game key
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Escape" => Some(Key::Escape),
            "Backspace" => Some(Key::Backspace),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => {
                        Some(Key::Char(c.to_lowercase().next().unwrap_or(c)))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// What a buffer update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No enemy starts with the first character; buffer discarded
    NoTarget,
    /// Locked enemy's progress updated
    Progress { enemy_id: u32, typed: String },
    /// Keystroke diverged from the locked word and was dropped
    Rejected { enemy_id: u32 },
    /// Buffer emptied and the lock let go
    Released { enemy_id: u32 },
    /// Word completed
    Destroyed {
        enemy_id: u32,
        word: String,
        points: u64,
    },
}

/// Single-target-lock input resolver
#[derive(Debug, Clone, Default)]
pub struct InputResolver {
    policy: InputPolicy,
}

impl InputResolver {
    pub fn new(policy: InputPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &InputPolicy {
        &self.policy
    }

    /// Apply one key to the current buffer. Escape is not a buffer edit and
    /// returns `None`.
    pub fn apply_key(&self, sim: &mut Simulation, key: Key) -> Option<Resolution> {
        let mut buffer = sim.state().current_input.clone();
        match key {
            Key::Char(c) => buffer.push(c),
            Key::Backspace => {
                buffer.pop();
            }
            Key::Escape => return None,
        }
        Some(self.update_input(sim, &buffer))
    }

    /// Resolve a full input buffer against the roster
    pub fn update_input(&self, sim: &mut Simulation, buffer: &str) -> Resolution {
        let state = sim.state_mut();

        // A stale lock (enemy already gone) is treated as no lock
        let locked = state
            .active_enemy_id
            .filter(|&id| state.enemy(id).is_some());
        if locked.is_none() && state.active_enemy_id.is_some() {
            state.active_enemy_id = None;
        }

        let target_id = match locked {
            Some(id) => id,
            None => {
                let first = buffer.chars().next();
                let found = first.and_then(|c| {
                    state
                        .enemies
                        .iter()
                        .find(|e| e.word.starts_with(c))
                        .map(|e| e.id)
                });
                match found {
                    Some(id) => {
                        state.active_enemy_id = Some(id);
                        log::debug!("Locked enemy {}", id);
                        id
                    }
                    None => {
                        state.current_input.clear();
                        return Resolution::NoTarget;
                    }
                }
            }
        };

        let policy = self.policy;
        let Some(enemy) = state.enemy_mut(target_id) else {
            state.current_input.clear();
            return Resolution::NoTarget;
        };

        // Excess characters beyond the word are ignored
        let clipped: String = buffer.chars().take(enemy.word.chars().count()).collect();

        if clipped.is_empty() && policy.release_lock_on_empty {
            enemy.typed.clear();
            state.active_enemy_id = None;
            state.current_input.clear();
            log::debug!("Released lock on enemy {}", target_id);
            return Resolution::Released {
                enemy_id: target_id,
            };
        }

        if policy.reject_mismatch && !enemy.word.starts_with(clipped.as_str()) {
            return Resolution::Rejected {
                enemy_id: target_id,
            };
        }

        enemy.typed.clone_from(&clipped);

        if clipped == enemy.word {
            let word = enemy.word.clone();
            let points = word.len() as u64;
            state.active_enemy_id = None;
            state.current_input.clear();
            let points = sim.destroy_enemy(target_id, Some(points)).unwrap_or(points);
            return Resolution::Destroyed {
                enemy_id: target_id,
                word,
                points,
            };
        }

        state.current_input = clipped.clone();
        Resolution::Progress {
            enemy_id: target_id,
            typed: clipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::engine::tests::{playing_sim, set_roster};
    use proptest::prelude::*;

    fn type_str(resolver: &InputResolver, sim: &mut Simulation, text: &str) -> Vec<Resolution> {
        text.chars()
            .filter_map(|c| resolver.apply_key(sim, Key::Char(c)))
            .collect()
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_key_name("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_key_name("Backspace"), Some(Key::Backspace));
        assert_eq!(Key::from_key_name("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_key_name("R"), Some(Key::Char('r')));
        assert_eq!(Key::from_key_name("Shift"), None);
        assert_eq!(Key::from_key_name("ArrowLeft"), None);
        assert_eq!(Key::from_key_name(""), None);
    }

    #[test]
    fn test_full_word_destroys_enemy() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "rocket", "dog"]);
        let resolver = InputResolver::default();

        let results = type_str(&resolver, &mut sim, "rocket");
        assert_eq!(
            results.last(),
            Some(&Resolution::Destroyed {
                enemy_id: ids[1],
                word: "rocket".into(),
                points: 6,
            })
        );
        let state = sim.state();
        assert_eq!(state.score, 6);
        assert_eq!(state.enemies.len(), 2);
        assert!(state.enemy(ids[1]).is_none());
        assert!(state.current_input.is_empty());
        assert_eq!(state.active_enemy_id, None);
    }

    #[test]
    fn test_stray_first_char_is_discarded() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::default();

        assert_eq!(
            resolver.apply_key(&mut sim, Key::Char('z')),
            Some(Resolution::NoTarget)
        );
        assert_eq!(sim.state().active_enemy_id, None);
        assert!(sim.state().current_input.is_empty());
    }

    #[test]
    fn test_first_match_in_spawn_order_wins() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["dog", "code", "cat"]);
        let resolver = InputResolver::default();
        resolver.apply_key(&mut sim, Key::Char('c'));
        assert_eq!(sim.state().active_enemy_id, Some(ids[1]));
        assert_eq!(sim.state().enemy(ids[1]).unwrap().typed, "c");
    }

    #[test]
    fn test_lock_sticks_to_target() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::default();
        type_str(&resolver, &mut sim, "cd");
        // "d" goes to the locked cat, not the dog
        assert_eq!(sim.state().active_enemy_id, Some(ids[0]));
        assert_eq!(sim.state().enemy(ids[0]).unwrap().typed, "cd");
        assert!(sim.state().enemy(ids[1]).unwrap().typed.is_empty());
    }

    #[test]
    fn test_mismatch_stored_until_backspaced() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::default();
        type_str(&resolver, &mut sim, "cx");
        assert_eq!(sim.state().current_input, "cx");
        assert_eq!(sim.state().enemy(ids[0]).unwrap().matched_len(), 1);

        resolver.apply_key(&mut sim, Key::Backspace);
        assert_eq!(sim.state().enemy(ids[0]).unwrap().typed, "c");
        let results = type_str(&resolver, &mut sim, "at");
        assert!(matches!(
            results.last(),
            Some(Resolution::Destroyed { points: 3, .. })
        ));
    }

    #[test]
    fn test_excess_chars_clipped() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::default();
        type_str(&resolver, &mut sim, "caxyz");
        assert_eq!(sim.state().current_input, "cax");
        assert_eq!(sim.state().enemy(ids[0]).unwrap().typed, "cax");
    }

    #[test]
    fn test_backspace_to_empty_keeps_lock_by_default() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::default();
        resolver.apply_key(&mut sim, Key::Char('c'));
        let res = resolver.apply_key(&mut sim, Key::Backspace);
        assert_eq!(
            res,
            Some(Resolution::Progress {
                enemy_id: ids[0],
                typed: String::new(),
            })
        );
        assert_eq!(sim.state().active_enemy_id, Some(ids[0]));

        // Typing the dog's letter still feeds the cat
        resolver.apply_key(&mut sim, Key::Char('d'));
        assert_eq!(sim.state().active_enemy_id, Some(ids[0]));
        assert_eq!(sim.state().enemy(ids[0]).unwrap().typed, "d");
    }

    #[test]
    fn test_backspace_to_empty_releases_when_configured() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::new(InputPolicy {
            release_lock_on_empty: true,
            ..Default::default()
        });
        resolver.apply_key(&mut sim, Key::Char('c'));
        assert_eq!(
            resolver.apply_key(&mut sim, Key::Backspace),
            Some(Resolution::Released { enemy_id: ids[0] })
        );
        assert_eq!(sim.state().active_enemy_id, None);

        resolver.apply_key(&mut sim, Key::Char('d'));
        assert_eq!(sim.state().active_enemy_id, Some(ids[1]));
    }

    #[test]
    fn test_backspace_with_no_lock_does_nothing() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat"]);
        let resolver = InputResolver::default();
        assert_eq!(
            resolver.apply_key(&mut sim, Key::Backspace),
            Some(Resolution::NoTarget)
        );
        assert_eq!(sim.state().active_enemy_id, None);
    }

    #[test]
    fn test_reject_mismatch_policy() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        let resolver = InputResolver::new(InputPolicy {
            reject_mismatch: true,
            ..Default::default()
        });
        type_str(&resolver, &mut sim, "c");
        assert_eq!(
            resolver.apply_key(&mut sim, Key::Char('x')),
            Some(Resolution::Rejected { enemy_id: ids[0] })
        );
        assert_eq!(sim.state().current_input, "c");
        assert_eq!(sim.state().enemy(ids[0]).unwrap().typed, "c");
        let results = type_str(&resolver, &mut sim, "at");
        assert!(matches!(results.last(), Some(Resolution::Destroyed { .. })));
    }

    #[test]
    fn test_escape_is_not_a_buffer_edit() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat"]);
        let resolver = InputResolver::default();
        resolver.apply_key(&mut sim, Key::Char('c'));
        assert_eq!(resolver.apply_key(&mut sim, Key::Escape), None);
        assert_eq!(sim.state().current_input, "c");
    }

    #[test]
    fn test_stale_lock_retargets() {
        let mut sim = playing_sim(1);
        let ids = set_roster(&mut sim, &["cat", "dog"]);
        sim.state_mut().active_enemy_id = Some(9999);
        let resolver = InputResolver::default();
        resolver.apply_key(&mut sim, Key::Char('d'));
        assert_eq!(sim.state().active_enemy_id, Some(ids[1]));
    }

    #[test]
    fn test_clearing_roster_by_typing_completes_level() {
        let mut sim = playing_sim(1);
        set_roster(&mut sim, &["cat", "dog", "run", "jump", "play"]);
        let resolver = InputResolver::default();
        for word in ["play", "cat", "jump", "run", "dog"] {
            type_str(&resolver, &mut sim, word);
        }
        let state = sim.state();
        assert!(state.level_complete);
        assert!(!state.is_playing);
        assert_eq!(state.score, 17);

        assert!(sim.next_level());
        assert_eq!(sim.state().level, 2);
        assert_eq!(sim.state().lives, 3);
        assert_eq!(sim.state().enemies.len(), 7);
    }

    proptest! {
        #[test]
        fn prop_progress_never_longer_than_word(
            keys in proptest::collection::vec(
                prop_oneof![
                    proptest::char::range('a', 'z').prop_map(Key::Char),
                    Just(Key::Backspace),
                ],
                0..80,
            ),
            release in any::<bool>(),
            reject in any::<bool>(),
        ) {
            let mut sim = playing_sim(11);
            set_roster(&mut sim, &["cat", "code", "dog", "rocket", "react"]);
            let resolver = InputResolver::new(InputPolicy {
                release_lock_on_empty: release,
                reject_mismatch: reject,
            });
            for key in keys {
                resolver.apply_key(&mut sim, key);
                let state = sim.state();
                for enemy in &state.enemies {
                    prop_assert!(enemy.typed.len() <= enemy.word.len());
                }
                if let Some(id) = state.active_enemy_id {
                    let enemy = state.enemy(id);
                    prop_assert!(enemy.is_some());
                    prop_assert!(state.current_input.len() <= enemy.map(|e| e.word.len()).unwrap_or(0));
                } else {
                    prop_assert!(state.current_input.is_empty());
                }
            }
        }
    }
}
