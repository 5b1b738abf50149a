//! The adapter trait and the wire-agnostic pieces both adapters share.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::EngineOptions;
use serde::Serialize;

/// Extra time past the movetime budget before an adapter gives up on a
/// search and cancels it.
pub(crate) const WATCHDOG_GRACE: Duration = Duration::from_millis(250);

/// Which backend produced a recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Local,
    Remote,
    #[default]
    Null,
}

/// One engine reply, ready for the UI.
///
/// `best_move_uci` is `None` when the position was terminal or the engine
/// failed to answer in time; the caller treats both the same way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendation {
    pub best_move_uci: Option<String>,
    pub score_cp: Option<i32>,
    pub mate_in: Option<i32>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub pv: Vec<String>,
    pub engine: EngineKind,
    pub elapsed_ms: u64,
}

/// A move-search backend the orchestrator can drive.
///
/// `request_move` never fails: transport trouble degrades to a
/// recommendation with no move, so one flaky engine cannot take the game
/// loop down with it.
#[async_trait]
pub trait EngineAdapter: Send {
    fn kind(&self) -> EngineKind;

    /// Brings the backend to a ready state (handshake, new game).
    async fn init(&mut self) -> anyhow::Result<()>;

    /// Pushes difficulty settings to the backend.
    async fn set_options(&mut self, options: EngineOptions);

    /// Asks for a move in the position given as FEN.
    async fn request_move(&mut self, fen: &str) -> Recommendation;

    /// Shuts the backend down. Idempotent.
    async fn dispose(&mut self);
}

/// Accumulates `info ...` lines during one search.
#[derive(Debug, Default)]
pub(crate) struct SearchInfo {
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub score_cp: Option<i32>,
    pub mate_in: Option<i32>,
    pub pv: Vec<String>,
}

impl SearchInfo {
    /// Folds one `info` line in. Later lines win, matching how engines
    /// report progressively deeper results.
    pub fn absorb(&mut self, line: &str) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let mut i = 1; // skip "info"
        while i < tokens.len() {
            match tokens[i] {
                "depth" => {
                    if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                        self.depth = Some(v);
                    }
                    i += 2;
                }
                "nodes" => {
                    if let Some(v) = tokens.get(i + 1).and_then(|t| t.parse().ok()) {
                        self.nodes = Some(v);
                    }
                    i += 2;
                }
                "score" => match tokens.get(i + 1) {
                    Some(&"cp") => {
                        if let Some(v) = tokens.get(i + 2).and_then(|t| t.parse().ok()) {
                            self.score_cp = Some(v);
                            self.mate_in = None;
                        }
                        i += 3;
                    }
                    Some(&"mate") => {
                        if let Some(v) = tokens.get(i + 2).and_then(|t| t.parse().ok()) {
                            self.mate_in = Some(v);
                            self.score_cp = None;
                        }
                        i += 3;
                    }
                    _ => i += 2,
                },
                "pv" => {
                    self.pv = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
                    break;
                }
                _ => i += 1,
            }
        }
    }

    pub fn into_recommendation(
        self,
        best_move_uci: Option<String>,
        engine: EngineKind,
        elapsed: Duration,
    ) -> Recommendation {
        Recommendation {
            best_move_uci,
            score_cp: self.score_cp,
            mate_in: self.mate_in,
            depth: self.depth,
            nodes: self.nodes,
            pv: self.pv,
            engine,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Extracts the move from a `bestmove` line. Outer `None` means the line is
/// not a bestmove line; inner `None` means the engine had no move to give
/// (`(none)` and the null move `0000` both mean that).
pub(crate) fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    match tokens.next() {
        None | Some("(none)") | Some("0000") => Some(None),
        Some(mv) => Some(Some(mv.to_string())),
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod adapter_tests;
