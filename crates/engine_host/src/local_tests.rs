use super::*;
use chess_core::{parse_uci_move, Difficulty, GameSession, SearchLimits, SearchResult};
use shakmaty::{Chess, Position};

const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";

/// Ignores the stop flag and sleeps through its first search, long past any
/// budget. Later searches answer immediately.
struct StallingEngine {
    stall: Duration,
    calls: u32,
}

impl StallingEngine {
    fn new(stall: Duration) -> Self {
        Self { stall, calls: 0 }
    }
}

impl Engine for StallingEngine {
    fn search(&mut self, pos: &Chess, _limits: SearchLimits) -> SearchResult {
        self.calls += 1;
        if self.calls == 1 {
            thread::sleep(self.stall);
        }
        SearchResult {
            best_move: pos.legal_moves().first().cloned(),
            score: 0,
            depth: 1,
            nodes: 1,
            stopped: false,
        }
    }

    fn name(&self) -> &str {
        "Staller"
    }
}

async fn ready_adapter() -> LocalAdapter {
    let mut adapter = LocalAdapter::new();
    adapter.init().await.expect("handshake");
    adapter
}

#[tokio::test]
async fn init_and_dispose_complete() {
    let mut adapter = ready_adapter().await;
    assert_eq!(adapter.kind(), EngineKind::Local);
    adapter.dispose().await;
    adapter.dispose().await; // second dispose is a no-op
}

#[tokio::test]
async fn recommends_a_legal_move_from_the_start_position() {
    let mut adapter = ready_adapter().await;
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Beginner,
            move_time_ms: Some(200),
        })
        .await;

    let game = GameSession::new();
    let rec = adapter.request_move(&game.fen()).await;

    let uci = rec.best_move_uci.expect("startpos has moves");
    assert!(parse_uci_move(game.position(), &uci).is_some());
    assert_eq!(rec.engine, EngineKind::Local);
    assert!(rec.depth.unwrap_or(0) >= 1);
    adapter.dispose().await;
}

#[tokio::test]
async fn finds_mate_with_time_to_think() {
    let mut adapter = ready_adapter().await;
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Intermediate,
            move_time_ms: Some(500),
        })
        .await;

    let rec = adapter.request_move(MATE_IN_ONE).await;
    assert_eq!(rec.best_move_uci.as_deref(), Some("a1a8"));
    adapter.dispose().await;
}

#[tokio::test]
async fn terminal_position_yields_no_move() {
    let mut adapter = ready_adapter().await;
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Beginner,
            move_time_ms: Some(100),
        })
        .await;

    let rec = adapter.request_move(STALEMATE).await;
    assert!(rec.best_move_uci.is_none());
    adapter.dispose().await;
}

#[tokio::test]
async fn watchdog_gives_up_on_an_engine_that_never_answers() {
    let engine = StallingEngine::new(Duration::from_secs(3));
    let mut adapter = LocalAdapter::with_engine(Box::new(engine));
    adapter.init().await.expect("handshake");
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Beginner,
            move_time_ms: Some(100),
        })
        .await;

    let started = Instant::now();
    let rec = adapter.request_move(MATE_IN_ONE).await;

    assert!(rec.best_move_uci.is_none());
    // Budget plus grace, one more grace after the ignored cancel, plus
    // generous slack. Well short of the engine's 3s stall either way.
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn late_answer_from_an_abandoned_search_is_not_reused() {
    let engine = StallingEngine::new(Duration::from_millis(1000));
    let mut adapter = LocalAdapter::with_engine(Box::new(engine));
    adapter.init().await.expect("handshake");
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Beginner,
            move_time_ms: Some(100),
        })
        .await;

    let first = adapter.request_move(MATE_IN_ONE).await;
    assert!(first.best_move_uci.is_none());

    // Let the abandoned search finish and emit its late bestmove.
    tokio::time::sleep(Duration::from_millis(600)).await;

    // A stalemate has no answer, so any move here is the stale one.
    let second = adapter.request_move(STALEMATE).await;
    assert!(
        second.best_move_uci.is_none(),
        "stale bestmove taken as the new answer: {:?}",
        second.best_move_uci
    );
    adapter.dispose().await;
}

#[tokio::test]
async fn back_to_back_requests_do_not_cross_wires() {
    let mut adapter = ready_adapter().await;
    adapter
        .set_options(EngineOptions {
            difficulty: Difficulty::Beginner,
            move_time_ms: Some(100),
        })
        .await;

    let first = adapter.request_move(MATE_IN_ONE).await;
    let second = adapter.request_move(STALEMATE).await;
    assert_eq!(first.best_move_uci.as_deref(), Some("a1a8"));
    assert!(second.best_move_uci.is_none());
    adapter.dispose().await;
}
