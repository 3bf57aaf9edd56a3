// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parallel dispatch of files to edit workers.
//!
//! A dispatcher thread feeds (input, output) pairs into a bounded queue and
//! N worker threads pull from it and run [`McapEditor::edit_file`]. The
//! first failure is kept in a single-slot error channel and cancels the
//! run: the dispatcher stops queueing, idle workers exit, and busy workers
//! finish their current file. Each run gets a fresh token, so a failed run
//! does not poison the next one.
//!
//! ```text
//! dispatcher ──► [bounded queue] ──► edit-worker-0..N ──► done channel ──► caller
//!      ▲                                   │
//!      └──────── CancellationToken ◄───────┘ (first error)
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::{debug, error};

use crate::core::{EditError, Result};
use crate::io::discovery::plan_outputs;
use crate::rewriter::engine::{EditStats, McapEditor};

/// Run-wide cancellation signal.
///
/// Cancelling drops the internal sender, so every [`receiver`](Self::receiver)
/// becomes ready at once inside a `select!`.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    signal: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl CancellationToken {
    /// New, uncancelled token.
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                signal: Mutex::new(Some(tx)),
                receiver: rx,
            }),
        }
    }

    /// Cancel. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let mut signal = match self.inner.signal.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        signal.take();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Receiver that disconnects on cancellation.
    pub fn receiver(&self) -> Receiver<()> {
        self.inner.receiver.clone()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Files handed to the pipeline
    pub total_files: usize,
    /// Files edited successfully, in completion order
    pub completed: Vec<EditStats>,
    /// Worker threads used
    pub workers: usize,
}

impl PipelineReport {
    /// Messages written across all completed files.
    pub fn messages_written(&self) -> u64 {
        self.completed.iter().map(|s| s.messages_written).sum()
    }

    /// Messages read across all completed files.
    pub fn messages_read(&self) -> u64 {
        self.completed.iter().map(|s| s.messages_read).sum()
    }

    /// Bytes written across all completed files.
    pub fn bytes_written(&self) -> u64 {
        self.completed.iter().map(|s| s.bytes_written).sum()
    }
}

/// Fans files out to a pool of edit workers.
pub struct DispatchPipeline {
    editor: McapEditor,
    workers: Option<usize>,
    stop: CancellationToken,
}

impl DispatchPipeline {
    /// Pipeline using the editor's configured job count, or the default.
    pub fn new(editor: McapEditor) -> Self {
        let workers = editor.config().jobs;
        Self {
            editor,
            workers,
            stop: CancellationToken::new(),
        }
    }

    /// Override the worker count (0 is treated as 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Default worker count: `2 * CPUs + 1`.
    pub fn default_workers() -> usize {
        2 * num_cpus::get() + 1
    }

    /// Token that stops this pipeline's runs from outside.
    ///
    /// Once cancelled, every later run fails with [`EditError::Cancelled`].
    /// A failing file only cancels its own run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Workers used for `file_count` files.
    pub fn worker_count(&self, file_count: usize) -> usize {
        self.workers
            .unwrap_or_else(Self::default_workers)
            .min(file_count)
            .max(1)
    }

    /// Edit every path, returning the first error if any file fails.
    pub fn run(&self, paths: &[PathBuf]) -> Result<PipelineReport> {
        self.run_with(paths, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_done` on the caller's thread
    /// as each file completes.
    ///
    /// Output paths are checked before any file is touched: two inputs
    /// with the same file name, or an input that is its own output, fail
    /// the run up front.
    pub fn run_with<F>(&self, paths: &[PathBuf], mut on_done: F) -> Result<PipelineReport>
    where
        F: FnMut(&EditStats),
    {
        let mut report = PipelineReport {
            total_files: paths.len(),
            ..PipelineReport::default()
        };
        if paths.is_empty() {
            return Ok(report);
        }
        let outputs = plan_outputs(paths, self.editor.output_dir())?;

        let workers = self.worker_count(paths.len());
        report.workers = workers;

        let signals = RunSignals {
            run: CancellationToken::new(),
            stop: self.stop.clone(),
        };
        let signals = &signals;
        let (job_tx, job_rx) = bounded::<(PathBuf, PathBuf)>(workers);
        let (done_tx, done_rx) = unbounded::<EditStats>();
        let (err_tx, err_rx) = bounded::<EditError>(1);

        debug!(files = paths.len(), workers, "Starting edit pipeline");

        thread::scope(|scope| -> Result<()> {
            let run_rx = signals.run.receiver();
            let stop_rx = signals.stop.receiver();
            thread::Builder::new()
                .name("edit-dispatch".to_string())
                .spawn_scoped(scope, move || {
                    for job in paths.iter().cloned().zip(outputs) {
                        select! {
                            send(job_tx, job) -> sent => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                            recv(run_rx) -> _ => break,
                            recv(stop_rx) -> _ => break,
                        }
                    }
                })
                .map_err(|e| EditError::Other(format!("failed to spawn dispatcher: {e}")))?;

            for i in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                let err_tx = err_tx.clone();
                let editor = &self.editor;
                let spawned = thread::Builder::new()
                    .name(format!("edit-worker-{i}"))
                    .spawn_scoped(scope, move || {
                        worker_loop(editor, signals, &job_rx, &done_tx, &err_tx)
                    });
                if let Err(e) = spawned {
                    signals.run.cancel();
                    return Err(EditError::Other(format!(
                        "failed to spawn edit worker {i}: {e}"
                    )));
                }
            }
            drop(job_rx);
            drop(done_tx);
            drop(err_tx);

            for stats in done_rx.iter() {
                on_done(&stats);
                report.completed.push(stats);
            }
            Ok(())
        })?;

        if let Ok(err) = err_rx.try_recv() {
            return Err(err);
        }
        if report.completed.len() < report.total_files {
            return Err(EditError::Cancelled {
                completed: report.completed.len(),
                total: report.total_files,
            });
        }
        Ok(report)
    }
}

/// Cancellation seen by one run: its own first-error token and the
/// pipeline's external stop token.
struct RunSignals {
    run: CancellationToken,
    stop: CancellationToken,
}

impl RunSignals {
    fn is_cancelled(&self) -> bool {
        self.run.is_cancelled() || self.stop.is_cancelled()
    }
}

fn worker_loop(
    editor: &McapEditor,
    signals: &RunSignals,
    jobs: &Receiver<(PathBuf, PathBuf)>,
    done: &Sender<EditStats>,
    errors: &Sender<EditError>,
) {
    let run_rx = signals.run.receiver();
    let stop_rx = signals.stop.receiver();
    loop {
        let (input, output) = select! {
            recv(jobs) -> job => match job {
                Ok(job) => job,
                Err(_) => return,
            },
            recv(run_rx) -> _ => return,
            recv(stop_rx) -> _ => return,
        };
        if signals.is_cancelled() {
            return;
        }

        match editor.edit_file(&input, &output) {
            Ok(stats) => {
                let _ = done.send(stats);
            }
            Err(e) => {
                let e = e.in_file(&input);
                error!(path = %input.display(), error = %e, "Edit failed");
                // only the first error is kept
                let _ = errors.try_send(e);
                signals.run.cancel();
                return;
            }
        }
    }
}
