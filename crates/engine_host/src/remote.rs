//! External engine process speaking the line protocol over stdio.
//!
//! Works with any UCI-style binary, including our own `uci_engine`. The
//! child is spawned on `init`; a request that overruns its budget gets a
//! `stop`, and if the engine still does not answer, its eventual `bestmove`
//! is remembered as pending and drained before the next request so answers
//! never pair up with the wrong position.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chess_core::EngineOptions;
use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::adapter::{
    parse_bestmove, EngineAdapter, EngineKind, Recommendation, SearchInfo, WATCHDOG_GRACE,
};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RemoteAdapter {
    command: String,
    args: Vec<String>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    lines: Option<Lines<BufReader<ChildStdout>>>,
    options: EngineOptions,
    awaiting_bestmove: bool,
}

impl RemoteAdapter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            child: None,
            stdin: None,
            lines: None,
            options: EngineOptions::default(),
            awaiting_bestmove: false,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    async fn send(&mut self, cmd: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("engine process not running"))?;
        stdin.write_all(cmd.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| anyhow!("engine process not running"))?;
        lines
            .next_line()
            .await?
            .ok_or_else(|| anyhow!("engine closed its output"))
    }

    async fn expect_line(&mut self, want: &str, budget: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            let line = tokio::time::timeout_at(deadline, self.next_line())
                .await
                .map_err(|_| anyhow!("engine did not send '{}' in time", want))??;
            if line.trim() == want {
                return Ok(());
            }
        }
    }

    /// A previous request gave up on this engine mid-search. Its `bestmove`
    /// is still owed and must not be taken as the next request's answer.
    async fn drain_pending(&mut self) {
        let deadline = tokio::time::Instant::now() + WATCHDOG_GRACE;
        loop {
            match tokio::time::timeout_at(deadline, self.next_line()).await {
                Ok(Ok(line)) => {
                    debug!("draining pending engine line: {}", line);
                    if parse_bestmove(&line).is_some() {
                        self.awaiting_bestmove = false;
                        return;
                    }
                }
                Ok(Err(_)) | Err(_) => return,
            }
        }
    }
}

#[async_trait]
impl EngineAdapter for RemoteAdapter {
    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    async fn init(&mut self) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning engine '{}'", self.command))?;

        self.stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("engine stdout not captured"))?;
        self.lines = Some(BufReader::new(stdout).lines());
        self.child = Some(child);

        self.send("uci").await?;
        self.expect_line("uciok", HANDSHAKE_TIMEOUT).await?;
        self.send("isready").await?;
        self.expect_line("readyok", HANDSHAKE_TIMEOUT).await?;
        self.send("ucinewgame").await?;
        Ok(())
    }

    async fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
        let skill = options.difficulty.skill_level();
        if let Err(e) = self
            .send(&format!("setoption name Skill Level value {}", skill))
            .await
        {
            warn!("could not push options to engine: {:#}", e);
        }
    }

    async fn request_move(&mut self, fen: &str) -> Recommendation {
        let started = Instant::now();
        let movetime = self.options.effective_move_time();

        if self.awaiting_bestmove {
            self.drain_pending().await;
        }

        for cmd in [
            format!("position fen {}", fen),
            format!("go movetime {}", movetime.as_millis()),
        ] {
            if let Err(e) = self.send(&cmd).await {
                warn!("engine transport failed: {:#}", e);
                return SearchInfo::default().into_recommendation(
                    None,
                    EngineKind::Remote,
                    started.elapsed(),
                );
            }
        }

        let mut info = SearchInfo::default();
        let mut deadline = tokio::time::Instant::now() + movetime + WATCHDOG_GRACE;
        let mut stopped = false;
        loop {
            match tokio::time::timeout_at(deadline, self.next_line()).await {
                Ok(Ok(line)) => {
                    if line.starts_with("info") {
                        info.absorb(&line);
                    } else if let Some(best) = parse_bestmove(&line) {
                        return info.into_recommendation(
                            best,
                            EngineKind::Remote,
                            started.elapsed(),
                        );
                    }
                }
                Ok(Err(e)) => {
                    warn!("engine transport failed: {:#}", e);
                    break;
                }
                Err(_) if !stopped => {
                    warn!("remote search overran its budget, sending stop");
                    if self.send("stop").await.is_err() {
                        break;
                    }
                    stopped = true;
                    deadline = tokio::time::Instant::now() + WATCHDOG_GRACE;
                }
                Err(_) => {
                    warn!("engine ignored stop; leaving its bestmove pending");
                    self.awaiting_bestmove = true;
                    break;
                }
            }
        }
        info.into_recommendation(None, EngineKind::Remote, started.elapsed())
    }

    async fn dispose(&mut self) {
        if self.child.is_none() {
            return;
        }
        let _ = self.send("quit").await;
        self.stdin = None;
        self.lines = None;
        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(Duration::from_secs(1), child.wait()).await {
                Ok(_) => {}
                Err(_) => {
                    warn!("engine did not exit on quit, killing it");
                    let _ = child.kill().await;
                }
            }
        }
    }
}
