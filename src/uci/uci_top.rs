//! UCI protocol front-end and command loop.
//!
//! Parses UCI commands, maintains the current game line, runs `go` requests
//! on a background search and emits protocol-compliant output. The best move
//! is written by the search completion callback, so `stop` and `quit` can
//! interrupt a running search.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use crate::chess_errors::ChessError;
use crate::game_state::board::Board;
use crate::game_state::chess_types::Color;
use crate::search::board_scoring::is_mate_score;
use crate::search::searcher::{SearchConfig, SearchReport};
use crate::search::threading::SearchHandle;
use crate::utils::long_algebraic::uci_to_move;
use crate::utils::render_game_state::render_board;

const UCI_ENGINE_NAME: &str = "Coda Chess";
const UCI_ENGINE_AUTHOR: &str = "the Coda Chess developers";
const MAX_HASH_MB: usize = 4096;

pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut uci = UciState::new(io::stdout());

    for line in stdin.lock().lines() {
        let line = line?;
        if uci.handle_command(&line)? {
            break;
        }
    }
    uci.stop_search();

    Ok(())
}

/// Parameters of a `go` command. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u16>,
    pub infinite: bool,
}

impl GoParams {
    /// Wall-clock budget for the side to move: an explicit `movetime`, or a
    /// twentieth of the remaining clock plus three quarters of the increment.
    /// `None` means search until depth exhaustion or `stop`.
    pub fn time_budget(&self, side_to_move: Color) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(ms) = self.movetime_ms {
            return Some(Duration::from_millis(ms.max(1)));
        }

        let (remaining, increment) = match side_to_move {
            Color::Light => (self.wtime_ms, self.winc_ms),
            Color::Dark => (self.btime_ms, self.binc_ms),
        };
        let remaining = remaining?;
        let budget = remaining / 20 + increment.unwrap_or(0).saturating_mul(3) / 4;
        let ceiling = (remaining / 2).max(1);
        Some(Duration::from_millis(budget.clamp(1, ceiling)))
    }
}

type SharedOutput<W> = Arc<Mutex<W>>;

struct UciState<W: Write + Send + 'static> {
    board: Board,
    config: SearchConfig,
    search: Option<SearchHandle>,
    output: SharedOutput<W>,
}

impl<W: Write + Send + 'static> UciState<W> {
    fn new(output: W) -> Self {
        Self {
            board: Board::new_game(),
            config: SearchConfig::default(),
            search: None,
            output: Arc::new(Mutex::new(output)),
        }
    }

    fn write_lines(&self, lines: &[String]) -> io::Result<()> {
        let mut out = self
            .output
            .lock()
            .map_err(|_| io::Error::other("uci output lock poisoned"))?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }

    fn handle_command(&mut self, line: &str) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        debug!(command = trimmed, "uci command");

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();

        match cmd {
            "uci" => {
                let default_hash = SearchConfig::default().tt_size_mb;
                let default_depth = SearchConfig::default().max_depth;
                self.write_lines(&[
                    format!("id name {UCI_ENGINE_NAME}"),
                    format!("id author {UCI_ENGINE_AUTHOR}"),
                    format!("option name Hash type spin default {default_hash} min 1 max {MAX_HASH_MB}"),
                    format!("option name MaxDepth type spin default {default_depth} min 1 max 255"),
                    "uciok".to_owned(),
                ])?;
            }
            "isready" => {
                self.write_lines(&["readyok".to_owned()])?;
            }
            "setoption" => {
                if let Err(err) = self.handle_setoption(trimmed) {
                    self.write_lines(&[format!("info string setoption error: {err}")])?;
                }
            }
            "ucinewgame" => {
                self.stop_search();
                self.board = Board::new_game();
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    warn!(%err, "rejected position command");
                    self.write_lines(&[format!("info string position error: {err}")])?;
                }
            }
            "go" => {
                self.stop_search();
                if let Err(err) = self.handle_go(trimmed) {
                    self.write_lines(&[format!("info string go error: {err}"), "bestmove 0000".to_owned()])?;
                }
            }
            "stop" => {
                self.stop_search();
            }
            "d" => {
                let mut lines: Vec<String> = render_board(&self.board).lines().map(str::to_owned).collect();
                lines.push(format!("Fen: {}", self.board.to_fen()));
                lines.push(format!("Key: {:016X}", self.board.zobrist_key()));
                self.write_lines(&lines)?;
            }
            "quit" => {
                self.stop_search();
                return Ok(true);
            }
            _ => {
                // Unknown commands are ignored for UCI compatibility.
            }
        }

        Ok(false)
    }

    fn handle_setoption(&mut self, line: &str) -> Result<(), String> {
        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for tok in line.split_whitespace().skip(1) {
            match tok {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(tok),
                _ if mode == "value" => value_tokens.push(tok),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");

        if name.eq_ignore_ascii_case("Hash") {
            let parsed = value
                .parse::<usize>()
                .map_err(|_| format!("invalid Hash value '{value}'"))?;
            self.config.tt_size_mb = parsed.clamp(1, MAX_HASH_MB);
        } else if name.eq_ignore_ascii_case("MaxDepth") {
            let parsed = value
                .parse::<u8>()
                .map_err(|_| format!("invalid MaxDepth value '{value}'"))?;
            self.config.max_depth = parsed.max(1);
        } else {
            return Err(format!("unknown option '{name}'"));
        }

        Ok(())
    }

    /// Load the position and its moves into a fresh board, replacing the
    /// current one only if everything parses.
    fn handle_position(&mut self, line: &str) -> Result<(), ChessError> {
        let mut tokens = line.split_whitespace().skip(1).peekable();

        let mut board = match tokens.next() {
            Some("startpos") => Board::new_game(),
            Some("fen") => {
                let mut fen_parts = Vec::<&str>::new();
                while let Some(&next) = tokens.peek() {
                    if next == "moves" {
                        break;
                    }
                    fen_parts.push(next);
                    tokens.next();
                }
                Board::from_fen(&fen_parts.join(" "))?
            }
            _ => return Err(ChessError::MalformedUciCommand(line.to_owned())),
        };

        if tokens.next() == Some("moves") {
            for lan in tokens {
                let mv = uci_to_move(&board, lan)?;
                board.make_move(mv, false);
            }
        }

        self.board = board;
        Ok(())
    }

    fn handle_go(&mut self, line: &str) -> Result<(), ChessError> {
        let params = parse_go_params(line);
        let mut config = self.config;
        if let Some(depth) = params.depth {
            config.max_depth = depth.max(1);
        }
        let time_budget = params.time_budget(self.board.side_to_move);
        debug!(?params, ?time_budget, max_depth = config.max_depth, "starting search");

        let output = Arc::clone(&self.output);
        let handle = SearchHandle::spawn(&self.board, config, time_budget, move |report| {
            if let Ok(mut out) = output.lock() {
                let _ = write_search_report(&mut *out, &report);
            }
        })?;
        self.search = Some(handle);
        Ok(())
    }

    /// Cancel any running search and wait for its `bestmove` line.
    fn stop_search(&mut self) {
        if let Some(handle) = self.search.take() {
            handle.cancel();
            if let Err(err) = handle.wait() {
                warn!(%err, "search ended without a report");
            }
        }
    }

    #[cfg(test)]
    fn wait_for_search(&mut self) -> Option<SearchReport> {
        self.search.take().and_then(|handle| handle.wait().ok())
    }
}

fn write_search_report(out: &mut impl Write, report: &SearchReport) -> io::Result<()> {
    let score = if is_mate_score(report.score) {
        let plies = report.mate_in_plies.unwrap_or(0) as i32;
        let moves = (plies + 1) / 2;
        format!("mate {}", if report.score > 0 { moves } else { -moves })
    } else {
        format!("cp {}", report.score)
    };

    match report.best_move {
        Some(best_move) => {
            writeln!(
                out,
                "info depth {} score {} nodes {} time {} pv {}",
                report.depth, score, report.nodes, report.elapsed_ms, best_move
            )?;
            writeln!(out, "bestmove {best_move}")?;
        }
        None => {
            writeln!(out, "info depth 0 score {score}")?;
            writeln!(out, "bestmove 0000")?;
        }
    }
    out.flush()
}

fn parse_go_params(line: &str) -> GoParams {
    let mut params = GoParams::default();
    let mut tokens = line.split_whitespace().skip(1);
    while let Some(token) = tokens.next() {
        match token {
            "depth" => params.depth = tokens.next().and_then(|x| x.parse().ok()),
            "movetime" => params.movetime_ms = tokens.next().and_then(|x| x.parse().ok()),
            "wtime" => params.wtime_ms = tokens.next().and_then(|x| x.parse().ok()),
            "btime" => params.btime_ms = tokens.next().and_then(|x| x.parse().ok()),
            "winc" => params.winc_ms = tokens.next().and_then(|x| x.parse().ok()),
            "binc" => params.binc_ms = tokens.next().and_then(|x| x.parse().ok()),
            "movestogo" => params.movestogo = tokens.next().and_then(|x| x.parse().ok()),
            "infinite" => params.infinite = true,
            _ => {}
        }
    }
    params
}
