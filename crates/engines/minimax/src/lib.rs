//! Minimax engine: the in-process opponent.
//!
//! Iterative-deepening negamax with alpha-beta pruning over the shared
//! material + piece-square evaluation.

mod eval;
mod search;

use chess_core::{Engine, SearchLimits, SearchResult};
use rand::seq::SliceRandom;
use shakmaty::{Chess, Position};

pub use eval::evaluate;

/// In-process search engine implementing the shared [`Engine`] seam.
#[derive(Debug, Default)]
pub struct MinimaxEngine {
    /// Node counter for diagnostics, reset on every search
    nodes: u64,
}

impl MinimaxEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for MinimaxEngine {
    fn search(&mut self, pos: &Chess, limits: SearchLimits) -> SearchResult {
        self.nodes = 0;

        let legal = pos.legal_moves();
        if legal.is_empty() {
            // Terminal position: the only case with no move at all.
            return SearchResult {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
                stopped: false,
            };
        }

        let outcome = search::iterative_search(pos, &limits, &mut self.nodes);
        match outcome.best {
            Some((mv, score)) => SearchResult {
                best_move: Some(mv),
                score,
                depth: outcome.depth,
                nodes: self.nodes,
                stopped: outcome.stopped,
            },
            None => {
                // The clock won before depth 1 completed. Play any legal
                // move instead of stalling the game.
                let mv = legal.choose(&mut rand::thread_rng()).cloned();
                SearchResult {
                    best_move: mv,
                    score: 0,
                    depth: 0,
                    nodes: self.nodes,
                    stopped: true,
                }
            }
        }
    }

    fn name(&self) -> &str {
        "MiniNegamax 0.1"
    }

    fn author(&self) -> &str {
        "chessmate"
    }

    fn new_game(&mut self) {
        self.nodes = 0;
    }
}
