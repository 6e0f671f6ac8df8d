// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progress reporting for tree traversals.
//!
//! The interpreter emits a balanced stream of start/end events at every
//! control-flow boundary, nested like the tree itself. Listeners are shared
//! across baseline threads, so all methods take `&self`; stateful listeners
//! synchronise internally.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error};

use super::{ActionKind, StrategyError};

pub trait ProgressListener: Send + Sync {
    fn on_start_task(
        &self,
        kind: ActionKind,
        task_index: usize,
        task_count: usize,
        description: &str,
        weight: usize,
    );

    /// Ends the innermost task. Every `on_start_task` gets exactly one
    /// matching `on_end_task`.
    fn on_end_task(&self, kind: ActionKind);

    fn on_progress(&self, kind: ActionKind, progress: usize, max_progress: usize);

    /// An action failed; the per-baseline driver reports the error here and
    /// carries on with the next baseline.
    fn on_exception(&self, kind: ActionKind, error: &StrategyError);
}

/// The nested progress bookkeeping: one (index, count, weight) frame per
/// open task; the weighted product over the stack gives the total fraction.
#[derive(Debug, Default)]
pub struct TaskProgress {
    totals: Vec<usize>,
    progresses: Vec<usize>,
    weights: Vec<usize>,
    task_progress: f64,
}

impl TaskProgress {
    pub fn push(&mut self, task_index: usize, task_count: usize, weight: usize) {
        self.totals.push(task_count.max(1));
        self.progresses.push(task_index);
        self.weights.push(weight.max(1));
        self.task_progress = 0.0;
    }

    pub fn pop(&mut self) {
        self.totals.pop();
        self.progresses.pop();
        self.weights.pop();
        self.task_progress = 1.0;
    }

    pub fn set_task_progress(&mut self, progress: usize, max_progress: usize) {
        self.task_progress = progress as f64 / max_progress.max(1) as f64;
    }

    pub fn depth(&self) -> usize {
        self.totals.len()
    }

    /// The overall progress in `[0, 1]`.
    pub fn total_progress(&self) -> f64 {
        let mut part = 1.0;
        let mut total = 0.0;
        for i in 0..self.totals.len() {
            total += part * self.weights[i] as f64 * self.progresses[i] as f64
                / self.totals[i] as f64;
            part *= self.weights[i] as f64 / self.totals[i] as f64;
        }
        total += part * self.task_progress;
        total.clamp(0.0, 1.0)
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct DummyProgressListener;

impl ProgressListener for DummyProgressListener {
    fn on_start_task(&self, _: ActionKind, _: usize, _: usize, _: &str, _: usize) {}
    fn on_end_task(&self, _: ActionKind) {}
    fn on_progress(&self, _: ActionKind, _: usize, _: usize) {}
    fn on_exception(&self, kind: ActionKind, error: &StrategyError) {
        error!("Action {kind} failed: {error}");
    }
}

/// Logs task boundaries at debug level and failures at error level.
#[derive(Debug, Default)]
pub struct LogProgressListener {
    state: Mutex<TaskProgress>,
}

impl ProgressListener for LogProgressListener {
    fn on_start_task(
        &self,
        _kind: ActionKind,
        task_index: usize,
        task_count: usize,
        description: &str,
        weight: usize,
    ) {
        let mut state = self.state.lock().expect("progress state is never poisoned");
        state.push(task_index, task_count, weight);
        let percent = state.total_progress() * 100.0;
        let indent = "  ".repeat(state.depth() - 1);
        debug!("{percent:5.1}% {indent}{description}");
    }

    fn on_end_task(&self, _kind: ActionKind) {
        self.state
            .lock()
            .expect("progress state is never poisoned")
            .pop();
    }

    fn on_progress(&self, _kind: ActionKind, progress: usize, max_progress: usize) {
        self.state
            .lock()
            .expect("progress state is never poisoned")
            .set_task_progress(progress, max_progress);
    }

    fn on_exception(&self, kind: ActionKind, error: &StrategyError) {
        error!("Action {kind} failed: {error}");
    }
}

lazy_static::lazy_static! {
    static ref BAR_STYLE: ProgressStyle = ProgressStyle::default_bar()
        .template("{msg:16}: [{wide_bar:.blue}] {percent:3}% ({elapsed_precise}<{eta_precise})")
        .unwrap()
        .progress_chars("=> ");
}

/// Drives an `indicatif` progress bar from the nested events.
pub struct ProgressBarListener {
    bar: ProgressBar,
    state: Mutex<TaskProgress>,
}

impl ProgressBarListener {
    const RESOLUTION: u64 = 1000;

    pub fn new(message: &str) -> ProgressBarListener {
        let bar = ProgressBar::new(Self::RESOLUTION)
            .with_style(BAR_STYLE.clone())
            .with_message(message.to_string());
        ProgressBarListener {
            bar,
            state: Mutex::new(TaskProgress::default()),
        }
    }

    pub fn finish(&self) {
        self.bar.abandon_with_message("Finished");
    }

    fn update(&self, state: &TaskProgress) {
        self.bar
            .set_position((state.total_progress() * Self::RESOLUTION as f64) as u64);
    }
}

impl ProgressListener for ProgressBarListener {
    fn on_start_task(
        &self,
        _kind: ActionKind,
        task_index: usize,
        task_count: usize,
        _description: &str,
        weight: usize,
    ) {
        let mut state = self.state.lock().expect("progress state is never poisoned");
        state.push(task_index, task_count, weight);
        self.update(&state);
    }

    fn on_end_task(&self, _kind: ActionKind) {
        let mut state = self.state.lock().expect("progress state is never poisoned");
        state.pop();
        self.update(&state);
    }

    fn on_progress(&self, _kind: ActionKind, progress: usize, max_progress: usize) {
        let mut state = self.state.lock().expect("progress state is never poisoned");
        state.set_task_progress(progress, max_progress);
        self.update(&state);
    }

    fn on_exception(&self, kind: ActionKind, error: &StrategyError) {
        self.bar.println(format!("Action {kind} failed: {error}"));
    }
}
