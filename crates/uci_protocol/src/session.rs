//! The protocol session state machine.

use std::time::Duration;

use chess_core::{move_to_uci, parse_uci_move, skill_to_depth, Engine, SearchLimits, StopFlag};
use log::{debug, warn};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

/// Movetime used when `go` carries none, matching the engine's historical
/// default.
pub const DEFAULT_MOVETIME: Duration = Duration::from_millis(800);
/// Skill level before any `setoption` arrives.
pub const DEFAULT_SKILL: u8 = 5;
/// Floor for movetime values from the wire.
const MIN_MOVETIME: Duration = Duration::from_millis(50);

/// Session lifecycle. A handshake (`uci`) moves the session to `Ready`;
/// `Searching` spans a single `go`; `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Searching,
    Disposed,
}

/// Drives one engine through the line protocol.
///
/// Exactly one search can be active per session; `go` is synchronous here,
/// so the host that wants cancellation keeps a [`StopFlag`] clone from
/// [`UciSession::stop_flag`] and raises it from another thread.
pub struct UciSession {
    engine: Box<dyn Engine>,
    position: Chess,
    state: SessionState,
    skill: u8,
    stop: StopFlag,
}

impl UciSession {
    pub fn new(engine: Box<dyn Engine>) -> Self {
        Self {
            engine,
            position: Chess::default(),
            state: SessionState::Uninitialized,
            skill: DEFAULT_SKILL,
            stop: StopFlag::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Cancel handle for the search that a `go` runs. Raising it makes the
    /// engine return its best-so-far early.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Internal position, as set by `position`/`ucinewgame`.
    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn is_disposed(&self) -> bool {
        self.state == SessionState::Disposed
    }

    /// Processes one command line and returns the lines to emit.
    ///
    /// Unknown commands and commands whose precondition does not hold are
    /// ignored; nothing here is fatal.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        if self.state == SessionState::Disposed {
            return Vec::new();
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, rest)) = tokens.split_first() else {
            return Vec::new();
        };

        match head {
            "uci" => {
                self.state = SessionState::Ready;
                vec![
                    format!("id name {}", self.engine.name()),
                    format!("id author {}", self.engine.author()),
                    format!(
                        "option name Skill Level type spin default {} min 0 max 20",
                        DEFAULT_SKILL
                    ),
                    "uciok".to_string(),
                ]
            }
            "isready" => vec!["readyok".to_string()],
            "ucinewgame" if self.ready() => {
                self.engine.new_game();
                self.position = Chess::default();
                Vec::new()
            }
            "setoption" if self.ready() => {
                self.handle_setoption(rest);
                Vec::new()
            }
            "position" if self.ready() => {
                self.handle_position(rest);
                Vec::new()
            }
            "go" if self.ready() => self.handle_go(rest),
            "stop" => {
                if self.state == SessionState::Searching {
                    self.stop.raise();
                }
                Vec::new()
            }
            "quit" => {
                self.stop.raise();
                self.state = SessionState::Disposed;
                Vec::new()
            }
            _ => {
                debug!("ignoring command: {}", line.trim());
                Vec::new()
            }
        }
    }

    fn ready(&self) -> bool {
        if self.state == SessionState::Ready {
            true
        } else {
            debug!("command requires Ready state, currently {:?}", self.state);
            false
        }
    }

    /// `setoption name <K...> value <V>`. Only `Skill Level` is understood
    /// here; everything else is offered to the engine.
    fn handle_setoption(&mut self, tokens: &[&str]) {
        let name_idx = tokens.iter().position(|t| t.eq_ignore_ascii_case("name"));
        let value_idx = tokens.iter().position(|t| t.eq_ignore_ascii_case("value"));
        let (Some(ni), Some(vi)) = (name_idx, value_idx) else {
            return;
        };
        if ni + 1 > vi {
            return;
        }
        let name = tokens[ni + 1..vi].join(" ");
        let value = tokens[vi + 1..].join(" ");

        if name.eq_ignore_ascii_case("skill level") {
            match value.parse::<i32>() {
                Ok(n) => self.skill = n.clamp(0, 20) as u8,
                Err(_) => warn!("unparseable Skill Level value: {}", value),
            }
        } else if !self.engine.set_option(&name, &value) {
            debug!("ignoring unknown option: {}", name);
        }
    }

    /// `position startpos [moves ...]` or `position fen <fen> [moves ...]`.
    fn handle_position(&mut self, tokens: &[&str]) {
        let moves_idx = tokens.iter().position(|&t| t == "moves");
        let base = &tokens[..moves_idx.unwrap_or(tokens.len())];

        match base.first() {
            Some(&"startpos") | None => self.position = Chess::default(),
            Some(&"fen") => {
                let fen = base[1..].join(" ");
                match fen
                    .parse::<Fen>()
                    .ok()
                    .and_then(|f| f.into_position::<Chess>(CastlingMode::Standard).ok())
                {
                    Some(pos) => self.position = pos,
                    None => {
                        warn!("ignoring position with bad FEN: {}", fen);
                        return;
                    }
                }
            }
            Some(other) => {
                warn!("ignoring position with unknown base: {}", other);
                return;
            }
        }

        if let Some(mi) = moves_idx {
            for text in &tokens[mi + 1..] {
                match parse_uci_move(&self.position, text) {
                    Some(mv) => self.position.play_unchecked(&mv),
                    None => {
                        // Keep everything applied so far; drop the rest.
                        warn!("illegal move '{}' in move list, stopping replay", text);
                        break;
                    }
                }
            }
        }
    }

    /// `go [movetime <ms>]`: one time-bounded search, one `bestmove` line.
    fn handle_go(&mut self, tokens: &[&str]) -> Vec<String> {
        let movetime = tokens
            .iter()
            .position(|&t| t == "movetime")
            .and_then(|i| tokens.get(i + 1))
            .and_then(|v| v.parse::<u64>().ok())
            .map(|ms| Duration::from_millis(ms).max(MIN_MOVETIME))
            .unwrap_or(DEFAULT_MOVETIME);

        self.state = SessionState::Searching;
        let limits = SearchLimits::timed(skill_to_depth(self.skill), movetime, self.stop.clone());
        let result = self.engine.search(&self.position, limits);
        self.state = SessionState::Ready;

        let mut out = vec![format!(
            "info depth {} nodes {} score cp {}",
            result.depth, result.nodes, result.score
        )];
        match result.best_move {
            Some(mv) => out.push(format!("bestmove {}", move_to_uci(&mv))),
            None => out.push("bestmove (none)".to_string()),
        }
        out
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
