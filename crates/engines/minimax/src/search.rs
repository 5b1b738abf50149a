//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! Each depth is searched to completion or abandoned wholesale: a depth that
//! the clock interrupts contributes nothing, so the reported move always
//! comes from a fully explored ply.

use chess_core::{move_to_uci, SearchClock, SearchLimits};
use log::trace;
use shakmaty::{Chess, Move, MoveList, Position};

use crate::eval::evaluate;

const INF: i32 = 1_000_000;
pub(crate) const MATE: i32 = 100_000;

pub(crate) struct SearchOutcome {
    /// Best move and score from the deepest completed depth
    pub best: Option<(Move, i32)>,
    /// Deepest completed depth (0 if the clock won before depth 1)
    pub depth: u8,
    /// Whether the clock cut the deepening loop short
    pub stopped: bool,
}

/// Runs depths 1..=limits.depth, keeping the result of the deepest depth
/// that completed before the clock interrupted.
pub(crate) fn iterative_search(
    pos: &Chess,
    limits: &SearchLimits,
    nodes: &mut u64,
) -> SearchOutcome {
    let mut best = None;
    let mut completed = 0u8;
    let mut stopped = false;

    for depth in 1..=limits.depth.max(1) {
        if limits.clock.time_up() {
            stopped = true;
            break;
        }
        match search_root(pos, depth, &limits.clock, nodes) {
            Some((mv, score)) => {
                trace!(
                    "depth {} best {} score cp {} nodes {}",
                    depth,
                    move_to_uci(&mv),
                    score,
                    nodes
                );
                best = Some((mv, score));
                completed = depth;
            }
            None => {
                stopped = true;
                break;
            }
        }
    }

    SearchOutcome {
        best,
        depth: completed,
        stopped,
    }
}

/// Full-width search of the root moves. Returns None if the clock
/// interrupted before every root move was explored.
fn search_root(
    pos: &Chess,
    depth: u8,
    clock: &SearchClock,
    nodes: &mut u64,
) -> Option<(Move, i32)> {
    let mut alpha = -INF;
    let mut best_move: Option<Move> = None;

    for mv in ordered_moves(pos) {
        let mut child = pos.clone();
        child.play_unchecked(&mv);
        let score = -negamax(&child, depth - 1, 1, -INF, -alpha, clock, nodes)?;
        // Strict improvement only: ties keep the earliest move, which makes
        // the result reproducible for a fixed position and depth.
        if score > alpha {
            alpha = score;
            best_move = Some(mv);
        }
    }

    best_move.map(|mv| (mv, alpha))
}

fn negamax(
    pos: &Chess,
    depth: u8,
    ply: u8,
    mut alpha: i32,
    beta: i32,
    clock: &SearchClock,
    nodes: &mut u64,
) -> Option<i32> {
    *nodes += 1;
    if clock.should_check(*nodes) && clock.time_up() {
        return None;
    }

    if pos.is_game_over() {
        return Some(terminal_score(pos, ply));
    }
    if depth == 0 {
        return Some(evaluate(pos));
    }

    let mut best = -INF;
    for mv in ordered_moves(pos) {
        let mut child = pos.clone();
        child.play_unchecked(&mv);
        let score = -negamax(&child, depth - 1, ply + 1, -beta, -alpha, clock, nodes)?;
        if score > best {
            best = score;
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }
    Some(best)
}

/// Mate is scored by distance from the root so nearer mates win out.
fn terminal_score(pos: &Chess, ply: u8) -> i32 {
    if pos.is_checkmate() {
        -(MATE - i32::from(ply))
    } else {
        // Stalemate and material/rule draws.
        0
    }
}

/// Captures first, otherwise untouched generation order. The stable sort is
/// part of the determinism contract.
fn ordered_moves(pos: &Chess) -> MoveList {
    let mut moves = pos.legal_moves();
    moves.sort_by_key(|mv| !mv.is_capture());
    moves
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
