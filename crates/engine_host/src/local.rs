//! In-process engine on a worker thread.
//!
//! The search itself is synchronous, so it runs on a dedicated thread and
//! talks to the async side over channels: commands in on a std channel the
//! worker blocks on, protocol lines out on a tokio channel the adapter
//! awaits. Cancellation bypasses the command channel entirely (the worker is
//! busy searching when we need it) and goes through the session's stop flag.

use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chess_core::{Engine, EngineOptions, StopFlag};
use log::{debug, warn};
use minimax_engine::MinimaxEngine;
use tokio::sync::mpsc;
use uci_protocol::UciSession;

use crate::adapter::{
    parse_bestmove, EngineAdapter, EngineKind, Recommendation, SearchInfo, WATCHDOG_GRACE,
};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LocalAdapter {
    cmd_tx: std_mpsc::Sender<String>,
    line_rx: mpsc::UnboundedReceiver<String>,
    stop: StopFlag,
    options: EngineOptions,
    worker: Option<thread::JoinHandle<()>>,
    disposed: bool,
    awaiting_bestmove: bool,
}

impl LocalAdapter {
    pub fn new() -> Self {
        Self::with_engine(Box::new(MinimaxEngine::new()))
    }

    /// Hosts an arbitrary engine on the worker thread.
    pub fn with_engine(engine: Box<dyn Engine>) -> Self {
        let (cmd_tx, cmd_rx) = std_mpsc::channel::<String>();
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        let mut session = UciSession::new(engine);
        let stop = session.stop_flag();

        let worker = thread::spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                for out in session.handle_line(&cmd) {
                    if line_tx.send(out).is_err() {
                        return;
                    }
                }
                if session.is_disposed() {
                    return;
                }
            }
        });

        Self {
            cmd_tx,
            line_rx,
            stop,
            options: EngineOptions::default(),
            worker: Some(worker),
            disposed: false,
            awaiting_bestmove: false,
        }
    }

    fn send(&self, cmd: &str) -> Result<()> {
        self.cmd_tx
            .send(cmd.to_string())
            .map_err(|_| anyhow!("engine worker is gone"))
    }

    /// A previous request gave up on the engine mid-search. Its `bestmove`
    /// is still owed and must not be taken as the next request's answer.
    async fn drain_pending(&mut self) {
        let deadline = tokio::time::Instant::now() + WATCHDOG_GRACE;
        loop {
            match tokio::time::timeout_at(deadline, self.line_rx.recv()).await {
                Ok(Some(line)) => {
                    debug!("draining pending engine line: {}", line);
                    if parse_bestmove(&line).is_some() {
                        self.awaiting_bestmove = false;
                        return;
                    }
                }
                Ok(None) | Err(_) => return,
            }
        }
    }

    /// Reads lines until `want` shows up, or errors out at the deadline.
    async fn expect_line(&mut self, want: &str, budget: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            let line = tokio::time::timeout_at(deadline, self.line_rx.recv())
                .await
                .map_err(|_| anyhow!("engine did not send '{}' in time", want))?
                .ok_or_else(|| anyhow!("engine worker is gone"))?;
            if line == want {
                return Ok(());
            }
        }
    }
}

impl Default for LocalAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineAdapter for LocalAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    async fn init(&mut self) -> Result<()> {
        self.send("uci")?;
        self.expect_line("uciok", HANDSHAKE_TIMEOUT).await?;
        self.send("isready")?;
        self.expect_line("readyok", HANDSHAKE_TIMEOUT).await?;
        self.send("ucinewgame")?;
        Ok(())
    }

    async fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
        let skill = options.difficulty.skill_level();
        if self
            .send(&format!("setoption name Skill Level value {}", skill))
            .is_err()
        {
            warn!("could not push options, engine worker is gone");
        }
    }

    async fn request_move(&mut self, fen: &str) -> Recommendation {
        let started = Instant::now();
        let movetime = self.options.effective_move_time();

        if self.awaiting_bestmove {
            self.drain_pending().await;
        }

        if self.send(&format!("position fen {}", fen)).is_err()
            || self
                .send(&format!("go movetime {}", movetime.as_millis()))
                .is_err()
        {
            warn!("local engine worker is gone");
            return SearchInfo::default().into_recommendation(
                None,
                EngineKind::Local,
                started.elapsed(),
            );
        }

        let mut info = SearchInfo::default();
        let mut deadline = tokio::time::Instant::now() + movetime + WATCHDOG_GRACE;
        let mut cancelled = false;
        loop {
            let line = match tokio::time::timeout_at(deadline, self.line_rx.recv()).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    warn!("local engine worker is gone");
                    break;
                }
                Err(_) if !cancelled => {
                    warn!("local search overran its budget, cancelling");
                    self.stop.raise();
                    cancelled = true;
                    deadline = tokio::time::Instant::now() + WATCHDOG_GRACE;
                    continue;
                }
                Err(_) => {
                    warn!("local engine ignored the cancel request, leaving its bestmove pending");
                    self.awaiting_bestmove = true;
                    break;
                }
            };
            if line.starts_with("info") {
                info.absorb(&line);
            } else if let Some(best) = parse_bestmove(&line) {
                return info.into_recommendation(best, EngineKind::Local, started.elapsed());
            }
        }
        info.into_recommendation(None, EngineKind::Local, started.elapsed())
    }

    async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stop.raise();
        let _ = self.send("quit");
        if let Some(worker) = self.worker.take() {
            let _ = tokio::task::spawn_blocking(move || worker.join()).await;
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod local_tests;
