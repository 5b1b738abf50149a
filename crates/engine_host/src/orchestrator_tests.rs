use super::*;
use crate::adapter::Recommendation;
use async_trait::async_trait;
use std::sync::atomic::AtomicBool;

const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
const TICK: Duration = Duration::from_millis(20);

/// Records every request and answers from a fixed script.
struct ScriptedAdapter {
    calls: Arc<Mutex<Vec<String>>>,
    reply: Option<String>,
    delay: Duration,
}

impl ScriptedAdapter {
    fn new(reply: Option<&str>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: Arc::clone(&calls),
                reply: reply.map(str::to_string),
                delay: Duration::ZERO,
            },
            calls,
        )
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl EngineAdapter for ScriptedAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Null
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn set_options(&mut self, _options: EngineOptions) {}

    async fn request_move(&mut self, fen: &str) -> Recommendation {
        self.calls.lock().unwrap().push(fen.to_string());
        tokio::time::sleep(self.delay).await;
        Recommendation {
            best_move_uci: self.reply.clone(),
            ..Default::default()
        }
    }

    async fn dispose(&mut self) {}
}

struct FailingAdapter;

#[async_trait]
impl EngineAdapter for FailingAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("refusing to start")
    }

    async fn set_options(&mut self, _options: EngineOptions) {}

    async fn request_move(&mut self, _fen: &str) -> Recommendation {
        Recommendation::default()
    }

    async fn dispose(&mut self) {}
}

struct DisposeProbe(Arc<AtomicBool>);

#[async_trait]
impl EngineAdapter for DisposeProbe {
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

    async fn dispose(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn calls_len(calls: &Arc<Mutex<Vec<String>>>) -> usize {
    calls.lock().unwrap().len()
}

#[tokio::test]
async fn engine_answers_the_human_move() {
    let orch = Orchestrator::with_debounce(TICK);
    let (adapter, calls) = ScriptedAdapter::new(Some("e7e5"));
    assert!(orch.set_engine(Box::new(adapter)).await);
    orch.set_engine_side(Some(Color::Black)).await;

    let handle = {
        orch.submit_move("e2e4").expect("legal");
        orch.on_game_state_changed()
    };
    handle.await.unwrap();
    tokio::time::sleep(TICK * 4).await;

    assert_eq!(calls_len(&calls), 1);
    assert_eq!(orch.game().lock().unwrap().ply(), 2);
    assert_eq!(
        orch.game().lock().unwrap().history_uci(),
        vec!["e2e4", "e7e5"]
    );
}

#[tokio::test]
async fn rapid_changes_collapse_into_one_request() {
    let orch = Orchestrator::with_debounce(TICK * 3);
    let (adapter, calls) = ScriptedAdapter::new(None);
    assert!(orch.set_engine(Box::new(adapter)).await);

    {
        let mut inner = orch.inner.lock().await;
        inner.side = Some(Color::White);
    }
    let h1 = orch.on_game_state_changed();
    let h2 = orch.on_game_state_changed();
    let h3 = orch.on_game_state_changed();
    let _ = tokio::join!(h1, h2, h3);
    tokio::time::sleep(TICK).await;

    assert_eq!(calls_len(&calls), 1);
}

#[tokio::test]
async fn no_request_when_it_is_the_humans_turn() {
    let orch = Orchestrator::with_debounce(TICK);
    let (adapter, calls) = ScriptedAdapter::new(Some("e7e5"));
    assert!(orch.set_engine(Box::new(adapter)).await);
    orch.set_engine_side(Some(Color::Black)).await;

    // Startpos: white to move, engine plays black.
    orch.on_game_state_changed().await.unwrap();
    assert_eq!(calls_len(&calls), 0);
}

#[tokio::test]
async fn no_request_when_the_game_is_over() {
    let orch = Orchestrator::with_debounce(TICK);
    let (adapter, calls) = ScriptedAdapter::new(Some("h8h7"));
    assert!(orch.set_engine(Box::new(adapter)).await);
    orch.set_engine_side(Some(Color::Black)).await;

    orch.game().lock().unwrap().load_fen(STALEMATE).unwrap();
    orch.on_game_state_changed().await.unwrap();
    assert_eq!(calls_len(&calls), 0);
}

#[tokio::test]
async fn no_request_without_an_engine_side() {
    let orch = Orchestrator::with_debounce(TICK);
    let (adapter, calls) = ScriptedAdapter::new(Some("e2e4"));
    assert!(orch.set_engine(Box::new(adapter)).await);

    orch.on_game_state_changed().await.unwrap();
    assert_eq!(calls_len(&calls), 0);
}

#[tokio::test]
async fn illegal_recommendation_is_discarded() {
    let orch = Orchestrator::with_debounce(TICK);
    // e2e4 is a white move; the engine plays black, so this can never apply.
    let (adapter, _calls) = ScriptedAdapter::new(Some("e2e4"));
    assert!(orch.set_engine(Box::new(adapter)).await);
    orch.set_engine_side(Some(Color::Black)).await;

    orch.submit_move("e2e4").expect("legal");
    orch.on_game_state_changed().await.unwrap();
    tokio::time::sleep(TICK * 4).await;

    assert_eq!(orch.game().lock().unwrap().ply(), 1);
}

#[tokio::test]
async fn reply_for_a_superseded_position_is_dropped() {
    let orch = Orchestrator::with_debounce(TICK);
    let (adapter, calls) = ScriptedAdapter::new(Some("e7e5"));
    let adapter = adapter.with_delay(TICK * 5);
    assert!(orch.set_engine(Box::new(adapter)).await);
    orch.set_engine_side(Some(Color::Black)).await;

    orch.submit_move("e2e4").expect("legal");
    let slow = orch.on_game_state_changed();
    // Let the request start, then yank the game out from under it.
    tokio::time::sleep(TICK * 2).await;
    orch.reset();
    slow.await.unwrap();
    tokio::time::sleep(TICK * 8).await;

    assert_eq!(calls_len(&calls), 1);
    assert_eq!(orch.game().lock().unwrap().ply(), 0);
}

#[tokio::test]
async fn failed_engine_leaves_the_slot_empty() {
    let orch = Orchestrator::with_debounce(TICK);
    assert!(!orch.set_engine(Box::new(FailingAdapter)).await);
    assert_eq!(orch.engine_kind().await, None);
}

#[tokio::test]
async fn replacing_an_engine_disposes_the_old_one() {
    let orch = Orchestrator::with_debounce(TICK);
    let disposed = Arc::new(AtomicBool::new(false));
    assert!(orch
        .set_engine(Box::new(DisposeProbe(Arc::clone(&disposed))))
        .await);
    assert!(!disposed.load(Ordering::SeqCst));

    let (adapter, _calls) = ScriptedAdapter::new(None);
    assert!(orch.set_engine(Box::new(adapter)).await);
    assert!(disposed.load(Ordering::SeqCst));

    orch.clear_engine().await;
    assert_eq!(orch.engine_kind().await, None);
}
