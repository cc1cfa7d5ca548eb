//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::WorkerError;
use crate::evaluator::{Evaluation, Evaluator};

/// Extra time allowed on top of the search budget before a query is abandoned.
const RESPONSE_GRACE: Duration = Duration::from_secs(2);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Stockfish engine instance
pub struct StockfishEngine {
    path: String,
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = BufReader::new(
            process
                .stdout
                .take()
                .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?,
        );

        let mut engine = Self {
            path: path.to_string(),
            process,
            stdin,
            stdout,
        };

        timeout(HANDSHAKE_TIMEOUT, engine.handshake())
            .await
            .map_err(|_| WorkerError::EngineTimeout(HANDSHAKE_TIMEOUT))??;

        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), WorkerError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send("setoption name Threads value 1").await?;
        self.send("setoption name Hash value 64").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        debug!(line = line.trim(), "SF >");
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Read search output until `bestmove`, keeping the deepest score seen.
    async fn read_score(&mut self) -> Result<Evaluation, WorkerError> {
        let mut score = None;
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") {
                if let Some(eval) = parse_score(trimmed) {
                    score = Some(eval);
                }
            } else if trimmed.starts_with("bestmove") {
                return score
                    .ok_or_else(|| WorkerError::Stockfish("Search ended without a score".into()));
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

#[async_trait]
impl Evaluator for StockfishEngine {
    async fn evaluate(&mut self, fen: &str, budget: Duration) -> Result<Evaluation, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1))).await?;

        let limit = budget + RESPONSE_GRACE;
        timeout(limit, self.read_score())
            .await
            .map_err(|_| WorkerError::EngineTimeout(limit))?
    }

    /// Stop any running search and resynchronise; respawn if the process
    /// no longer answers.
    async fn recover(&mut self) -> Result<(), WorkerError> {
        let resync = async {
            self.send("stop").await?;
            self.send("isready").await?;
            self.wait_for("readyok").await
        };
        let outcome = timeout(HANDSHAKE_TIMEOUT, resync).await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            _ => {
                warn!(path = %self.path, "Stockfish unresponsive, respawning");
                let _ = self.process.start_kill();
                *self = StockfishEngine::new(&self.path.clone()).await?;
                Ok(())
            }
        }
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse the `score cp N` / `score mate N` part of an info line.
fn parse_score(line: &str) -> Option<Evaluation> {
    if let Some(cp) = parse_cp(line) {
        return Some(Evaluation::Centipawns(cp));
    }
    parse_mate(line).map(Evaluation::Mate)
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}
