//! Typing Shooter entry point
//!
//! The browser build wires DOM key events and requestAnimationFrame into a
//! [`Session`]; the native build runs a headless autotyper on virtual time.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use typing_shooter::Settings;
    use typing_shooter::sim::{GamePhase, Key, Notice, Session, SessionEvent};

    /// Longest frame delta fed to the session (tab throttling, debugger stops)
    const MAX_FRAME_MS: f64 = 250.0;

    /// Game instance holding all state
    struct Game {
        session: Session,
        last_time: f64,
        /// Sub-millisecond remainder carried between frames
        carry_ms: f64,
    }

    impl Game {
        fn new(settings: &Settings) -> Self {
            Self {
                session: Session::new(settings),
                last_time: 0.0,
                carry_ms: 0.0,
            }
        }

        /// Feed elapsed frame time into the session
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).min(MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            let total = dt + self.carry_ms;
            let whole = total.floor();
            self.carry_ms = total - whole;
            let notices = self.session.handle(SessionEvent::Elapsed(whole as u64));
            self.report(&notices);
        }

        fn report(&self, notices: &[Notice]) {
            for notice in notices {
                match notice {
                    Notice::LevelComplete { level, score } => {
                        log::info!("Level {} cleared, score {}", level, score);
                        show("level-complete", true);
                    }
                    Notice::GameOver { level, score } => {
                        log::info!("Game over at level {}, score {}", level, score);
                        show("game-over", true);
                    }
                    Notice::Paused => show("pause-menu", true),
                    Notice::Resumed => show("pause-menu", false),
                    _ => {}
                }
            }
        }

        /// Hand the current snapshot to the JS renderer and update HUD text
        fn publish(&self) {
            let snapshot = self.session.snapshot();
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Ok(json) = snapshot.to_json() {
                let _ = js_sys::Reflect::set(
                    &window,
                    &JsValue::from_str("typingShooterSnapshot"),
                    &JsValue::from_str(&json),
                );
            }

            let Some(document) = window.document() else {
                return;
            };
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            set_text("#hud-score .hud-value", &snapshot.score.to_string());
            set_text("#hud-lives .hud-value", &snapshot.lives.to_string());
            set_text("#hud-level .hud-value", &snapshot.level.to_string());
            set_text("#hud-enemies .hud-value", &snapshot.enemies.len().to_string());
            set_text("#hud-input .hud-value", &snapshot.current_input);
        }
    }

    fn show(id: &str, visible: bool) {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id));
        if let Some(el) = element {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Typing Shooter starting...");

        let settings = Settings::load();
        let game = Rc::new(RefCell::new(Game::new(&settings)));

        setup_keyboard(game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Typing Shooter running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let Some(key) = Key::from_key_name(&event.key()) else {
                return;
            };
            if key == Key::Backspace {
                event.prevent_default();
            }
            let mut g = game.borrow_mut();
            let notices = g.session.handle(SessionEvent::Key(key));
            g.report(&notices);
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let bind = |id: &str, action: fn(&mut Session)| {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    action(&mut game.borrow_mut().session);
                    show("level-complete", false);
                    show("game-over", false);
                    show("pause-menu", false);
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        };

        bind("start-btn", |s| s.restart());
        bind("restart-btn", |s| s.restart());
        bind("next-level-btn", |s| {
            s.next_level();
        });
        bind("resume-btn", |s| {
            s.toggle_pause();
        });
        bind("menu-btn", |s| s.reset_game());
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            if g.session.phase() == GamePhase::Playing {
                if let Some(notice) = g.session.pause() {
                    log::info!("Auto-paused (window blur)");
                    g.report(&[notice]);
                }
            }
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.publish();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use typing_shooter::Settings;
    use typing_shooter::rewards::{MockRewards, RewardsService, reward_for_level};
    use typing_shooter::sim::{GamePhase, Key, Notice, Session, SessionEvent};
    use typing_shooter::wallet::{MockWallet, NetworkConfig, WalletProvider};

    /// Milliseconds between autotyper keystrokes
    const KEY_INTERVAL_MS: u64 = 120;
    /// Stop after this many cleared levels
    const TARGET_LEVELS: u32 = 3;
    /// Give up after this much virtual time
    const MAX_VIRTUAL_MS: u64 = 10 * 60 * 1000;

    /// Next key the autotyper presses: continue the locked word, otherwise
    /// start on the enemy closest to the bottom.
    fn next_key(session: &Session) -> Option<Key> {
        let state = session.state();
        if let Some(enemy) = state.active_enemy_id.and_then(|id| state.enemy(id)) {
            let typed = state.current_input.len();
            return enemy.word.chars().nth(typed).map(Key::Char);
        }
        state
            .enemies
            .iter()
            .filter(|e| e.pos.y >= 0.0)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .and_then(|e| e.word.chars().next())
            .map(Key::Char)
    }

    fn claim(session: &Session, rewards: &mut dyn RewardsService, wallet: &MockWallet) {
        let level = session.state().level;
        match session.claim_reward(rewards, wallet.state().address.as_deref()) {
            Ok(receipt) => log::info!(
                "Claimed {} tokens for level {} (tx {})",
                receipt.reward_amount,
                level,
                receipt.tx_hash
            ),
            Err(e) => log::info!(
                "Level {} reward ({} tokens) not claimed: {}",
                level,
                reward_for_level(level),
                e
            ),
        }
    }

    pub fn run() {
        let settings = Settings::load();
        let mut session = Session::new(&settings);
        let mut rewards = MockRewards::default();
        let mut wallet = MockWallet::new(
            NetworkConfig {
                chain_id: "0x279f".into(),
                chain_name: "Local Testnet".into(),
                rpc_urls: vec!["http://127.0.0.1:8545".into()],
                currency_symbol: "MON".into(),
                decimals: 18,
            },
            Some("0x52908400098527886E0F7030069857D2E4169EE7".into()),
        );
        if let Err(e) = wallet.connect() {
            log::warn!("Wallet unavailable: {}", e);
        }

        session.start_game();
        let mut elapsed = 0;
        let mut cleared = 0;
        while elapsed < MAX_VIRTUAL_MS {
            match session.phase() {
                GamePhase::LevelComplete => {
                    cleared += 1;
                    claim(&session, &mut rewards, &wallet);
                    if cleared >= TARGET_LEVELS {
                        break;
                    }
                    session.next_level();
                }
                GamePhase::GameOver => break,
                _ => {}
            }

            if let Some(key) = next_key(&session) {
                for notice in session.handle(SessionEvent::Key(key)) {
                    if let Notice::EnemyDestroyed { word, points, .. } = notice {
                        log::debug!("Typed '{}' (+{})", word, points);
                    }
                }
            }
            for notice in session.handle(SessionEvent::Elapsed(KEY_INTERVAL_MS)) {
                if let Notice::LivesLost { count, remaining } = notice {
                    log::info!("Lost {} lives, {} left", count, remaining);
                }
            }
            elapsed += KEY_INTERVAL_MS;
        }

        let state = session.state();
        println!(
            "{:?} after {:.1}s: level {}, score {}, high score {}, lives {}",
            state.phase(),
            elapsed as f64 / 1000.0,
            state.level,
            state.score,
            state.high_score,
            state.lives
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Typing Shooter (native) starting...");
    log::info!("Running headless autotyper - build for wasm32 to play in the browser");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
