//! Stand-in adapter for when no engine is selected.

use async_trait::async_trait;
use chess_core::EngineOptions;

use crate::adapter::{EngineAdapter, EngineKind, Recommendation};

/// Answers every request immediately with no move. Lets the orchestrator
/// keep one code path whether or not an engine opponent is configured.
#[derive(Debug, Default)]
pub struct NullAdapter;

#[async_trait]
impl EngineAdapter for NullAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Null
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn set_options(&mut self, _options: EngineOptions) {}

    async fn request_move(&mut self, _fen: &str) -> Recommendation {
        Recommendation::default()
    }

    async fn dispose(&mut self) {}
}
