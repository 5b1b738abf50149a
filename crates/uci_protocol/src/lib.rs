//! UCI-style control protocol for driving a search engine.
//!
//! One command per line in, zero or more reply lines out. The same session
//! type backs the in-process engine host and the standalone stdio binary.

mod session;

pub use session::{SessionState, UciSession, DEFAULT_MOVETIME, DEFAULT_SKILL};
