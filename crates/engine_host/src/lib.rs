//! Hosting layer between a game in progress and a move-search backend.
//!
//! An [`EngineAdapter`] hides where the engine runs (a worker thread in this
//! process, an external child process, or nowhere at all); the
//! [`Orchestrator`] watches the game and asks the adapter for a move whenever
//! it is the engine's turn.

mod adapter;
mod local;
mod null;
mod orchestrator;
mod remote;

pub use adapter::{EngineAdapter, EngineKind, Recommendation};
pub use local::LocalAdapter;
pub use null::NullAdapter;
pub use orchestrator::Orchestrator;
pub use remote::RemoteAdapter;
