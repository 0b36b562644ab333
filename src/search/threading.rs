//! Background search execution.
//!
//! A search runs on its own worker thread against a board rebuilt from the
//! caller's move list, so the caller's board is never shared. Cancellation is
//! a shared `AtomicBool` polled by the searcher. An optional timer thread only
//! ever sets that flag. The finished `SearchReport` is delivered once to the
//! completion callback and once to `SearchHandle::wait`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, RecvTimeoutError},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::chess_errors::{ChessError, ChessResult};
use crate::game_state::board::Board;
use crate::search::board_scoring::BoardScorer;
use crate::search::searcher::{SearchConfig, SearchReport, Searcher};

#[derive(Debug)]
pub struct SearchHandle {
    stop: Arc<AtomicBool>,
    result_rx: Receiver<SearchReport>,
    worker: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
}

impl SearchHandle {
    /// Search a replayed copy of `board` on a worker thread. With a
    /// `time_budget` the search is cancelled once the budget elapses.
    pub fn spawn<F>(
        board: &Board,
        config: SearchConfig,
        time_budget: Option<Duration>,
        on_complete: F,
    ) -> ChessResult<Self>
    where
        F: FnOnce(SearchReport) + Send + 'static,
    {
        let board = board.replay_copy()?;
        Ok(Self::spawn_searcher(Searcher::new(board, config), time_budget, on_complete))
    }

    /// Run an already configured searcher on a worker thread. Its stop flag
    /// becomes the handle's cancellation flag.
    pub fn spawn_searcher<S, F>(mut searcher: Searcher<S>, time_budget: Option<Duration>, on_complete: F) -> Self
    where
        S: BoardScorer + 'static,
        F: FnOnce(SearchReport) + Send + 'static,
    {
        let stop = searcher.stop_flag();
        let (result_tx, result_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let timer = time_budget.map(|budget| {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(budget) {
                    trace!(budget_ms = budget.as_millis() as u64, "search time budget elapsed");
                    stop.store(true, Ordering::Relaxed);
                }
            })
        });

        let worker = thread::spawn(move || {
            let report = searcher.start_search();
            on_complete(report);
            let _ = result_tx.send(report);
            // Wakes the timer so it exits without touching the flag.
            drop(done_tx);
        });

        Self {
            stop,
            result_rx,
            worker: Some(worker),
            timer,
        }
    }

    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the worker delivers its report.
    pub fn wait(mut self) -> ChessResult<SearchReport> {
        let report = self.result_rx.recv().map_err(|_| ChessError::SearchWorkerLost);
        self.join_threads();
        report
    }

    fn join_threads(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        // An abandoned search is stopped rather than left running.
        if self.worker.is_some() {
            self.cancel();
        }
    }
}
