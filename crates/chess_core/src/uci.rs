//! UCI move codec: the 4-5 character from/to/promotion encoding.

use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move};

/// Encodes a move in UCI notation (`e2e4`, `e7e8q`, castling as `e1g1`).
pub fn move_to_uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// Parses a UCI move and matches it against the position's legal moves, so
/// the returned move carries correct castle/en-passant/capture flags.
/// Returns None for malformed input or a move that is not legal here.
pub fn parse_uci_move(pos: &Chess, text: &str) -> Option<Move> {
    let uci: UciMove = text.parse().ok()?;
    uci.to_move(pos).ok()
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
