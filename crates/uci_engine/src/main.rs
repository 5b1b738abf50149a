//! Standalone engine speaking the line protocol over stdin/stdout.
//!
//! All protocol handling lives in `uci_protocol`; this binary is just the
//! stdio plumbing around a session. Log output goes to stderr so it never
//! mixes with protocol lines.

use std::io::{self, BufRead, Write};

use log::error;
use minimax_engine::MinimaxEngine;
use uci_protocol::UciSession;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session = UciSession::new(Box::new(MinimaxEngine::new()));

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read failed: {}", e);
                break;
            }
        };
        for out in session.handle_line(&line) {
            if writeln!(stdout, "{}", out).is_err() {
                return;
            }
        }
        if stdout.flush().is_err() {
            return;
        }
        if session.is_disposed() {
            break;
        }
    }
}
