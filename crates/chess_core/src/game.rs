//! Game session: the rules-oracle facade the UI and orchestrator share.
//!
//! All legality questions and position mutation go through `shakmaty`; this
//! type adds the move history, undo, and FEN surface the rest of the system
//! needs. Engines never touch a session directly; they receive a clone of
//! the underlying position.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Outcome, Position, Square};
use thiserror::Error;

use crate::uci::{move_to_uci, parse_uci_move};

#[derive(Debug, Error)]
pub enum FenError {
    #[error("malformed FEN: {0}")]
    Parse(#[from] shakmaty::fen::ParseFenError),
    #[error("illegal position: {0}")]
    Position(String),
}

/// One game in progress: a root position plus the moves played from it.
///
/// Undo replays from the root because `shakmaty` positions are copy-make;
/// game histories are short enough that this is never noticeable.
#[derive(Debug, Clone)]
pub struct GameSession {
    root: Chess,
    position: Chess,
    history: Vec<Move>,
}

impl GameSession {
    /// A fresh game from the standard starting position.
    pub fn new() -> Self {
        Self {
            root: Chess::default(),
            position: Chess::default(),
            history: Vec::new(),
        }
    }

    /// A game rooted at an arbitrary position.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let pos = parse_fen(fen)?;
        Ok(Self {
            root: pos.clone(),
            position: pos,
            history: Vec::new(),
        })
    }

    /// Replaces the whole game with a new root position, dropping history.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let pos = parse_fen(fen)?;
        self.root = pos.clone();
        self.position = pos;
        self.history.clear();
        Ok(())
    }

    /// Back to the standard starting position, dropping history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.position.is_game_over()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.position.outcome()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.position.legal_moves()
    }

    /// Legal moves starting from one square (for move-target highlighting).
    pub fn legal_moves_from(&self, sq: Square) -> Vec<Move> {
        self.position
            .legal_moves()
            .into_iter()
            .filter(|m| m.from() == Some(sq))
            .collect()
    }

    /// Applies a move if it is legal in the current position.
    /// Returns false (position unchanged) otherwise.
    pub fn apply_move(&mut self, mv: &Move) -> bool {
        if !self.position.is_legal(mv) {
            return false;
        }
        self.position.play_unchecked(mv);
        self.history.push(mv.clone());
        true
    }

    /// Applies a move given in UCI notation. None (position unchanged) if
    /// the text is malformed or the move is illegal here.
    pub fn apply_uci(&mut self, uci: &str) -> Option<Move> {
        let mv = parse_uci_move(&self.position, uci)?;
        self.position.play_unchecked(&mv);
        self.history.push(mv.clone());
        Some(mv)
    }

    /// Takes back the last move. Returns the move that was undone.
    pub fn undo(&mut self) -> Option<Move> {
        let undone = self.history.pop()?;
        let mut pos = self.root.clone();
        for mv in &self.history {
            pos.play_unchecked(mv);
        }
        self.position = pos;
        Some(undone)
    }

    /// Serializes the current position as FEN.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// The moves played so far, in UCI notation (for `position ... moves`).
    pub fn history_uci(&self) -> Vec<String> {
        self.history.iter().map(move_to_uci).collect()
    }

    pub fn ply(&self) -> usize {
        self.history.len()
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_fen(fen: &str) -> Result<Chess, FenError> {
    let setup: Fen = fen.trim().parse()?;
    setup
        .into_position(CastlingMode::Standard)
        .map_err(|e| FenError::Position(e.to_string()))
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
