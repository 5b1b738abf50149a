pub mod game;
pub mod time_control;
pub mod uci;

pub use game::{FenError, GameSession};
pub use time_control::{SearchClock, SearchLimits, StopFlag};
pub use uci::{move_to_uci, parse_uci_move};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Move};

// =============================================================================
// Engine trait — implemented by all move-search backends
// =============================================================================

/// Result of a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found (None only when the position is terminal)
    pub best_move: Option<Move>,
    /// Evaluation in centipawns from the side to move's perspective
    pub score: i32,
    /// Deepest fully completed search depth (0 if none completed)
    pub depth: u8,
    /// Nodes visited during this call (diagnostic only)
    pub nodes: u64,
    /// Whether the search was cut short by the clock or a stop request
    pub stopped: bool,
}

/// Trait implemented by every in-process search backend.
///
/// The position is borrowed; implementations search a private clone, so the
/// caller's position is untouched when `search` returns.
pub trait Engine: Send {
    /// Search the position within the given limits.
    fn search(&mut self, pos: &Chess, limits: SearchLimits) -> SearchResult;

    /// Engine name for UCI identification
    fn name(&self) -> &str;

    /// Engine author for UCI identification
    fn author(&self) -> &str {
        "anonymous"
    }

    /// Reset internal state for a new game
    fn new_game(&mut self) {}

    /// Set a named tunable. Returns true if the option was recognized.
    fn set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }
}

// =============================================================================
// Difficulty and engine options
// =============================================================================

/// Opponent strength presets shown in the UI.
///
/// Every preset maps to one (skill, movetime) pair, and the same pair is used
/// for every engine kind so switching backends does not change the advertised
/// strength.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Hard,
}

impl Difficulty {
    /// UCI `Skill Level` value (0..=20) for this preset.
    pub fn skill_level(self) -> u8 {
        match self {
            Difficulty::Beginner => 3,
            Difficulty::Intermediate => 10,
            Difficulty::Hard => 18,
        }
    }

    /// Default time budget per move for this preset.
    pub fn move_time(self) -> Duration {
        match self {
            Difficulty::Beginner => Duration::from_millis(300),
            Difficulty::Intermediate => Duration::from_millis(800),
            Difficulty::Hard => Duration::from_millis(1500),
        }
    }

    /// Search depth budget derived from the skill level.
    pub fn depth_budget(self) -> u8 {
        skill_to_depth(self.skill_level())
    }
}

/// Maps a UCI skill level (0..=20) to a depth budget in plies (1..=5).
pub fn skill_to_depth(skill: u8) -> u8 {
    1 + skill.min(20) / 5
}

/// Engine configuration as selected in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub difficulty: Difficulty,
    /// Explicit movetime override in milliseconds; wins over the preset.
    pub move_time_ms: Option<u64>,
}

impl EngineOptions {
    /// Effective time budget per move: the explicit override (clamped to a
    /// 50ms floor) when present, otherwise the difficulty default.
    pub fn effective_move_time(&self) -> Duration {
        match self.move_time_ms {
            Some(ms) => Duration::from_millis(ms.max(50)),
            None => self.difficulty.move_time(),
        }
    }
}
