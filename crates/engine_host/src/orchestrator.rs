//! Drives the engine side of a human-vs-engine game.
//!
//! The orchestrator owns the shared [`GameSession`] and an optional adapter.
//! Every game state change bumps a generation counter and schedules a
//! debounced check; when the check fires and it is the engine's turn, the
//! adapter is asked for a move. The generation is re-checked after the
//! debounce and again after the (possibly slow) engine reply, so moves
//! computed for a position that no longer exists are dropped instead of
//! corrupting the game.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess_core::{EngineOptions, GameSession};
use log::{debug, info, warn};
use shakmaty::{Color, Move};
use tokio::task::JoinHandle;

use crate::adapter::{EngineAdapter, EngineKind};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(120);

struct Inner {
    adapter: Option<Box<dyn EngineAdapter>>,
    side: Option<Color>,
    options: EngineOptions,
}

/// Cheaply cloneable handle; clones share one game and one engine slot.
#[derive(Clone)]
pub struct Orchestrator {
    game: Arc<Mutex<GameSession>>,
    inner: Arc<tokio::sync::Mutex<Inner>>,
    generation: Arc<AtomicU64>,
    debounce: Duration,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_debounce(DEFAULT_DEBOUNCE)
    }

    /// Mainly for tests that cannot afford the production debounce.
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            game: Arc::new(Mutex::new(GameSession::new())),
            inner: Arc::new(tokio::sync::Mutex::new(Inner {
                adapter: None,
                side: None,
                options: EngineOptions::default(),
            })),
            generation: Arc::new(AtomicU64::new(0)),
            debounce,
        }
    }

    /// The shared game. Lock it briefly; never across an engine request.
    pub fn game(&self) -> Arc<Mutex<GameSession>> {
        Arc::clone(&self.game)
    }

    fn lock_game(&self) -> std::sync::MutexGuard<'_, GameSession> {
        self.game.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Installs a new engine, disposing the old one first. Returns false
    /// (and leaves no engine installed) if the new engine fails to start.
    pub async fn set_engine(&self, mut adapter: Box<dyn EngineAdapter>) -> bool {
        let mut inner = self.inner.lock().await;
        if let Some(mut old) = inner.adapter.take() {
            old.dispose().await;
        }
        match adapter.init().await {
            Ok(()) => {
                adapter.set_options(inner.options).await;
                inner.adapter = Some(adapter);
                true
            }
            Err(e) => {
                warn!("engine failed to initialize: {:#}", e);
                false
            }
        }
    }

    /// Removes and disposes the current engine, if any.
    pub async fn clear_engine(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(mut old) = inner.adapter.take() {
            old.dispose().await;
        }
    }

    pub async fn engine_kind(&self) -> Option<EngineKind> {
        self.inner.lock().await.adapter.as_ref().map(|a| a.kind())
    }

    /// Which color the engine plays. `None` disables engine replies.
    pub async fn set_engine_side(&self, side: Option<Color>) {
        self.inner.lock().await.side = side;
        self.on_game_state_changed();
    }

    pub async fn set_options(&self, options: EngineOptions) {
        let mut inner = self.inner.lock().await;
        inner.options = options;
        if let Some(adapter) = inner.adapter.as_mut() {
            adapter.set_options(options).await;
        }
    }

    /// Applies a human move and nudges the engine. `None` if the text was
    /// malformed or the move is illegal in the current position.
    ///
    /// Must be called from within a tokio runtime (the engine nudge is
    /// spawned onto it), like every other state-changing entry point here.
    pub fn submit_move(&self, uci: &str) -> Option<Move> {
        let applied = self.lock_game().apply_uci(uci);
        if applied.is_some() {
            self.on_game_state_changed();
        }
        applied
    }

    /// Starts a fresh game. Any in-flight engine reply is invalidated.
    pub fn reset(&self) {
        self.lock_game().reset();
        self.on_game_state_changed();
    }

    /// Takes back the last move and invalidates any in-flight reply.
    pub fn undo(&self) -> Option<Move> {
        let undone = self.lock_game().undo();
        if undone.is_some() {
            self.on_game_state_changed();
        }
        undone
    }

    /// Signals that the game state changed. Rapid successive calls collapse
    /// into one engine request; the returned handle is mainly for tests.
    ///
    /// Panics if called outside a tokio runtime, as `tokio::spawn` does.
    pub fn on_game_state_changed(&self) -> JoinHandle<()> {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.debounce).await;
            if this.generation.load(Ordering::SeqCst) != gen {
                return; // superseded by a newer change
            }
            this.drive_engine_turn(gen).await;
        })
    }

    async fn drive_engine_turn(&self, gen: u64) {
        // The inner lock is the single in-flight request slot.
        let mut inner = self.inner.lock().await;
        if self.generation.load(Ordering::SeqCst) != gen {
            return;
        }
        let Some(side) = inner.side else { return };
        let Some(adapter) = inner.adapter.as_mut() else {
            return;
        };

        let fen = {
            let game = self.lock_game();
            if game.is_game_over() || game.turn() != side {
                return;
            }
            game.fen()
        };

        let rec = adapter.request_move(&fen).await;

        // The position may have moved on while the engine was thinking.
        if self.generation.load(Ordering::SeqCst) != gen {
            debug!("discarding stale engine reply for a superseded position");
            return;
        }
        let Some(uci) = rec.best_move_uci else {
            debug!("engine had no move to offer");
            return;
        };

        let mut game = self.lock_game();
        if game.is_game_over() || game.turn() != side {
            debug!("discarding engine reply, no longer the engine's turn");
            return;
        }
        match game.apply_uci(&uci) {
            Some(_) => info!(
                "engine played {} ({} ms, depth {:?})",
                uci, rec.elapsed_ms, rec.depth
            ),
            None => warn!("engine recommended illegal move {}, ignoring it", uci),
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
