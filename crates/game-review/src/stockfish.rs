//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chess::Board;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ReviewConfig;
use crate::error::EngineError;
use crate::evaluator::PositionEvaluator;
use crate::score::{RawScore, ScoreValue};

/// How long a single search may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBudget {
    Depth(u32),
    MoveTime(Duration),
    Nodes(u64),
}

impl SearchBudget {
    fn go_command(&self) -> String {
        match self {
            SearchBudget::Depth(d) => format!("go depth {d}"),
            SearchBudget::MoveTime(t) => format!("go movetime {}", t.as_millis()),
            SearchBudget::Nodes(n) => format!("go nodes {n}"),
        }
    }
}

/// Result of a single position evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEval {
    /// Score reported for the side to move
    pub score: RawScore,
    /// Best move in UCI notation; absent when the side to move has none
    pub best_move: Option<String>,
}

/// A single PV line from multi-PV analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvLine {
    /// 1-based multipv index
    pub rank: u32,
    pub score: RawScore,
    /// Principal variation moves
    pub pv: Vec<String>,
}

/// Fields of interest from one `info` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<ScoreValue>,
    pub pv: Vec<String>,
}

impl InfoLine {
    /// Parse an `info` line; anything else (including `info string`) is None.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("info") {
            return None;
        }

        let mut info = InfoLine::default();
        while let Some(token) = tokens.next() {
            match token {
                "string" => return None,
                "depth" => info.depth = tokens.next().and_then(|v| v.parse().ok()),
                "multipv" => info.multipv = tokens.next().and_then(|v| v.parse().ok()),
                "score" => {
                    info.score = match (tokens.next(), tokens.next()) {
                        (Some("cp"), Some(v)) => v.parse().ok().map(ScoreValue::Centipawns),
                        (Some("mate"), Some(v)) => v.parse().ok().map(ScoreValue::Mate),
                        _ => None,
                    };
                }
                // PV runs to the end of the line
                "pv" => {
                    info.pv = tokens.by_ref().map(str::to_string).collect();
                }
                _ => {}
            }
        }
        Some(info)
    }
}

/// Parse a `bestmove` line. `Some(None)` means the engine had no move.
fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    Some(
        tokens
            .next()
            .filter(|m| *m != "(none)" && *m != "0000")
            .map(str::to_string),
    )
}

/// Option name from an `option name <Name> type ...` line
fn parse_option_name(line: &str) -> Option<String> {
    let rest = line.strip_prefix("option name ")?;
    let name = match rest.find(" type ") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    Some(name.trim().to_string())
}

/// Options the engine must have advertised before we set them
fn check_options(
    advertised: &HashSet<String>,
    options: &[(&str, String)],
) -> Result<(), EngineError> {
    match options.iter().find(|(n, _)| !advertised.contains(*n)) {
        Some((name, _)) => Err(EngineError::UnsupportedOption(name.to_string())),
        None => Ok(()),
    }
}

/// Retry the option set, one rejected option fewer each time, until it is accepted.
fn supported_options<'a>(
    advertised: &HashSet<String>,
    mut options: Vec<(&'a str, String)>,
) -> Vec<(&'a str, String)> {
    while let Err(EngineError::UnsupportedOption(name)) = check_options(advertised, &options) {
        warn!(option = %name, "Engine does not support option, configuring without it");
        options.retain(|(n, _)| *n != name);
    }
    options
}

/// Options requested for a review session
fn requested_options(config: &ReviewConfig) -> Vec<(&'static str, String)> {
    let mut options = vec![
        ("Threads", config.threads.to_string()),
        ("Hash", config.hash_mb.to_string()),
    ];
    if config.show_wdl {
        options.push(("UCI_ShowWDL", "true".to_string()));
    }
    options
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Options the engine advertised during the handshake
    options: HashSet<String>,
    read_timeout: Duration,
}

impl StockfishEngine {
    /// Spawn the engine, run the UCI handshake and apply the configured options.
    pub async fn new(config: &ReviewConfig) -> Result<Self, EngineError> {
        let mut engine = Self::spawn(&config.stockfish_path, config.query_timeout).await?;

        engine.configure(requested_options(config)).await?;

        engine.send("ucinewgame").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        info!(path = %config.stockfish_path.display(), "Stockfish engine ready");
        Ok(engine)
    }

    async fn spawn(path: &Path, read_timeout: Duration) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::NotFound(PathBuf::from(path)),
                _ => EngineError::Spawn(e),
            })?;

        let stdin = process.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = BufReader::new(process.stdout.take().ok_or(EngineError::Closed)?);

        let mut engine = Self {
            process,
            stdin,
            stdout,
            options: HashSet::new(),
            read_timeout,
        };

        engine.send("uci").await?;
        loop {
            let line = engine.read_line().await?;
            if line == "uciok" {
                break;
            }
            if let Some(name) = parse_option_name(&line) {
                engine.options.insert(name);
            }
        }
        debug!(count = engine.options.len(), "Engine options advertised");

        Ok(engine)
    }

    /// Apply options, dropping any the engine does not support.
    async fn configure(&mut self, options: Vec<(&str, String)>) -> Result<(), EngineError> {
        let options = supported_options(&self.options, options);
        self.set_options(&options).await
    }

    async fn set_options(&mut self, options: &[(&str, String)]) -> Result<(), EngineError> {
        check_options(&self.options, options)?;
        for (name, value) in options {
            self.send(&format!("setoption name {name} value {value}")).await?;
        }
        Ok(())
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read one trimmed line, bounded by the query timeout
    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = timeout(self.read_timeout, self.stdout.read_line(&mut line))
            .await
            .map_err(|_| EngineError::Timeout(self.read_timeout))??;
        if read == 0 {
            return Err(EngineError::Closed);
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Start a search and collect its output up to `bestmove`.
    /// A search that times out is stopped and drained before the error is returned.
    async fn search(
        &mut self,
        board: &Board,
        budget: SearchBudget,
    ) -> Result<(Vec<InfoLine>, Option<String>), EngineError> {
        self.send(&format!("position fen {board}")).await?;
        self.send(&budget.go_command()).await?;

        let mut infos = Vec::new();
        loop {
            let line = match self.read_line().await {
                Ok(line) => line,
                Err(EngineError::Timeout(t)) => {
                    self.stop_and_drain().await;
                    return Err(EngineError::Timeout(t));
                }
                Err(e) => return Err(e),
            };
            if let Some(best) = parse_bestmove(&line) {
                return Ok((infos, best));
            }
            if let Some(info) = InfoLine::parse(&line) {
                infos.push(info);
            }
        }
    }

    async fn stop_and_drain(&mut self) {
        if self.send("stop").await.is_err() {
            return;
        }
        loop {
            match self.read_line().await {
                Ok(line) if line.starts_with("bestmove") => return,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "Engine did not finish after stop");
                    return;
                }
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if timeout(Duration::from_secs(2), self.process.wait()).await.is_err() {
            let _ = self.process.start_kill();
        }
    }
}

impl PositionEvaluator for StockfishEngine {
    async fn evaluate(
        &mut self,
        board: &Board,
        budget: SearchBudget,
    ) -> Result<EngineEval, EngineError> {
        let (infos, best_move) = self.search(board, budget).await?;
        let value = infos
            .iter()
            .rev()
            .filter(|i| i.multipv.unwrap_or(1) == 1)
            .find_map(|i| i.score)
            .ok_or(EngineError::NoScore)?;

        Ok(EngineEval {
            score: RawScore::new(board.side_to_move(), value),
            best_move,
        })
    }

    async fn top_lines(
        &mut self,
        board: &Board,
        count: u32,
        budget: SearchBudget,
    ) -> Result<Vec<PvLine>, EngineError> {
        self.send(&format!("setoption name MultiPV value {count}")).await?;
        let searched = self.search(board, budget).await;
        // Reset MultiPV to 1
        self.send("setoption name MultiPV value 1").await?;
        let (infos, _) = searched?;

        // Later lines supersede earlier ones for the same index
        let mut lines: BTreeMap<u32, PvLine> = BTreeMap::new();
        for info in infos {
            let (Some(value), Some(_)) = (info.score, info.pv.first()) else {
                continue;
            };
            let rank = info.multipv.unwrap_or(1);
            if rank > count {
                continue;
            }
            lines.insert(
                rank,
                PvLine {
                    rank,
                    score: RawScore::new(board.side_to_move(), value),
                    pv: info.pv,
                },
            );
        }

        if lines.is_empty() {
            return Err(EngineError::NoScore);
        }
        Ok(lines.into_values().collect())
    }

    async fn shutdown(&mut self) {
        self.quit().await;
    }
}
