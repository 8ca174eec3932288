//! Chunked pipeline driver
//!
//! A run moves through `Idle -> Detecting -> Scanning(i of N) -> Sorting -> Done`.
//! Each call to [`Pipeline::step`] performs one transition, and a scanning step
//! processes exactly one chunk, so a host can interleave other work between
//! chunks. [`Pipeline::run`] drives the steps and hands control to a
//! [`Scheduler`] at every chunk boundary.
//!
//! Lines are scanned strictly in file order; first-seen-wins de-duplication
//! depends on it.

use crate::compare::sort_records;
use crate::config::RosterConfig;
use crate::dedup::Deduplicator;
use crate::error::{RosterError, RosterResult};
use crate::extract::{detect_format, extract_fields, LineFormat};
use crate::record::Record;
use crate::serialize::is_separator_line;
use crate::validate::{Validator, Verdict};
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

const UTF8_BOM: &str = "\u{feff}";

/// Per-run counters. Only the driver mutates them, and only while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Non-blank, non-separator lines scanned
    pub total_records: usize,
    pub valid_records: usize,
    pub duplicate_records: usize,
    pub invalid_records: usize,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lines, {} valid, {} duplicates, {} invalid",
            self.total_records, self.valid_records, self.duplicate_records, self.invalid_records
        )
    }
}

/// Observational progress message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// 0..=100
    pub percent: u8,
    pub message: String,
    pub valid_records: usize,
}

/// Receiver of progress updates. Delivery is best effort.
pub trait ProgressSink {
    fn report(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate),
{
    fn report(&self, update: ProgressUpdate) {
        self(update)
    }
}

/// Discards every update
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Forwards updates over a channel without ever blocking the run
pub struct ChannelProgress(pub Sender<ProgressUpdate>);

impl ProgressSink for ChannelProgress {
    fn report(&self, update: ProgressUpdate) {
        // a full or disconnected channel just loses the update
        let _ = self.0.try_send(update);
    }
}

/// Where the driver gives up control between chunks
pub trait Scheduler {
    fn yield_now(&mut self);
}

/// Yields the current OS thread
pub struct ThreadYield;

impl Scheduler for ThreadYield {
    fn yield_now(&mut self) {
        std::thread::yield_now();
    }
}

/// Never yields; for tests and batch use
pub struct Immediate;

impl Scheduler for Immediate {
    fn yield_now(&mut self) {}
}

/// Shared cancellation flag, checked at every chunk boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a run needs from its caller: settings, progress, cancellation
pub struct RunContext {
    config: RosterConfig,
    progress: Box<dyn ProgressSink>,
    cancel: CancelFlag,
}

impl RunContext {
    /// Validates the configuration; it is then fixed for the run
    pub fn new(config: RosterConfig) -> RosterResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress: Box::new(NoProgress),
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    fn report(&self, percent: u8, message: String, valid_records: usize) {
        self.progress.report(ProgressUpdate {
            percent,
            message,
            valid_records,
        });
    }
}

/// Driver state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Detecting,
    Scanning { chunk: usize, total: usize },
    Sorting,
    Done,
    Cancelled,
    Error(String),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Cancelled | RunState::Error(_))
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<Record>,
    pub statistics: RunStatistics,
    pub format: LineFormat,
}

/// One run over one input blob
pub struct Pipeline<'a> {
    ctx: &'a RunContext,
    input: &'a [u8],
    lines: Vec<&'a str>,
    format: LineFormat,
    validator: Validator,
    dedup: Deduplicator,
    records: Vec<Record>,
    stats: RunStatistics,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    /// A fresh run with empty key set and counters
    pub fn new(ctx: &'a RunContext, input: &'a [u8]) -> Self {
        let config = ctx.config();
        Self {
            ctx,
            input,
            lines: Vec::new(),
            format: LineFormat::Tab,
            validator: Validator::new(config.min_year, config.max_year),
            dedup: Deduplicator::new(config.dedup_policy),
            records: Vec::new(),
            stats: RunStatistics::default(),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Counters so far; final once scanning has finished
    pub fn statistics(&self) -> RunStatistics {
        self.stats
    }

    /// Advance by one transition and return the new state
    pub fn step(&mut self) -> RosterResult<RunState> {
        match self.state.clone() {
            RunState::Idle => {
                info!(bytes = self.input.len(), "starting run");
                self.state = RunState::Detecting;
            }
            RunState::Detecting => self.detect()?,
            RunState::Scanning { chunk, total } => self.scan_chunk(chunk, total)?,
            RunState::Sorting => self.sort()?,
            RunState::Done => {}
            RunState::Cancelled => {
                return Err(RosterError::incomplete("run was cancelled"));
            }
            RunState::Error(message) => {
                return Err(RosterError::Incomplete { message });
            }
        }
        Ok(self.state.clone())
    }

    /// Drive the run to completion, yielding after every chunk
    pub fn run<S: Scheduler>(mut self, scheduler: &mut S) -> RosterResult<RunOutcome> {
        loop {
            let was_scanning = matches!(self.state, RunState::Scanning { .. });
            match self.step()? {
                RunState::Done => break,
                _ if was_scanning => scheduler.yield_now(),
                _ => {}
            }
        }
        self.finish()
    }

    /// Records and final counters; only available once the run is `Done`
    pub fn finish(self) -> RosterResult<RunOutcome> {
        match self.state {
            RunState::Done => Ok(RunOutcome {
                records: self.records,
                statistics: self.stats,
                format: self.format,
            }),
            other => Err(RosterError::incomplete(&format!(
                "run finished in state {other:?}"
            ))),
        }
    }

    fn detect(&mut self) -> RosterResult<()> {
        let text = match std::str::from_utf8(self.input) {
            Ok(text) => text,
            Err(e) => {
                let err = RosterError::Decode {
                    offset: e.valid_up_to(),
                };
                warn!(error = %err, "input rejected");
                self.state = RunState::Error(err.to_string());
                return Err(err);
            }
        };
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        self.lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').collect()
        };

        let config = self.ctx.config();
        self.format = detect_format(config.delimiter, self.lines.iter().copied());

        let total = chunk_count(self.lines.len(), config.chunk_size);
        info!(
            lines = self.lines.len(),
            chunks = total,
            format = ?self.format,
            "input decoded"
        );

        self.state = if total == 0 {
            RunState::Sorting
        } else {
            RunState::Scanning { chunk: 0, total }
        };
        Ok(())
    }

    fn scan_chunk(&mut self, chunk: usize, total: usize) -> RosterResult<()> {
        if self.ctx.cancel.is_cancelled() {
            warn!(chunk, total, "run cancelled");
            self.state = RunState::Cancelled;
            return Err(RosterError::Cancelled {
                chunks_done: chunk,
                chunks_total: total,
            });
        }

        let chunk_size = self.ctx.config().chunk_size;
        let start = chunk * chunk_size;
        let end = (start + chunk_size).min(self.lines.len());

        for index in start..end {
            let line = self.lines[index];
            self.process_line(index + 1, line);
        }

        let done = chunk + 1;
        debug!(chunk = done, total, stats = %self.stats, "chunk scanned");

        if done % self.ctx.config().progress_interval == 0 || done == total {
            let percent = (done * 100 / total) as u8;
            self.ctx.report(
                percent,
                format!(
                    "Processed chunk {done}/{total}: {} valid records",
                    self.stats.valid_records
                ),
                self.stats.valid_records,
            );
        }

        self.state = if done == total {
            RunState::Sorting
        } else {
            RunState::Scanning { chunk: done, total }
        };
        Ok(())
    }

    fn process_line(&mut self, line_number: usize, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || is_separator_line(line) {
            return;
        }
        self.stats.total_records += 1;

        let triple = extract_fields(line, self.format);
        match self.validator.check(triple) {
            Verdict::Invalid(reasons) => {
                self.stats.invalid_records += 1;
                trace!(line_number, reason = %reasons[0], "line rejected");
            }
            Verdict::Valid(fields) => {
                let record = Record::new(fields.name, fields.dob, fields.ssn, fields.year);
                if self.dedup.admit(&record) {
                    self.stats.valid_records += 1;
                    self.records.push(record);
                } else {
                    self.stats.duplicate_records += 1;
                    trace!(line_number, "duplicate dropped");
                }
            }
        }
    }

    fn sort(&mut self) -> RosterResult<()> {
        let config = self.ctx.config();
        info!(
            records = self.records.len(),
            policy = %config.sort_policy,
            "sorting records"
        );

        if let Err(err) = sort_records(
            &mut self.records,
            config.sort_policy,
            config.parallel_threads,
        ) {
            self.state = RunState::Error(err.to_string());
            return Err(err);
        }

        info!(stats = %self.stats, "run complete");
        self.ctx
            .report(100, "Done".to_string(), self.stats.valid_records);
        self.state = RunState::Done;
        Ok(())
    }
}

/// Number of chunks needed to cover `lines`; `chunk_size` may be as large as `usize::MAX`
fn chunk_count(lines: usize, chunk_size: usize) -> usize {
    lines / chunk_size + usize::from(lines % chunk_size != 0)
}
