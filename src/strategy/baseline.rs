// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parallel per-baseline driver.
//!
//! Baselines are independent: a pool of worker threads pulls baseline
//! indices off a queue, and each worker runs the child block against its
//! own clone of the artifact set. Grids are shared immutably between
//! clones; the image set is the only shared mutable resource and all access
//! goes through its mutex. A failing baseline is reported through
//! `on_exception` and skipped; one bad baseline must not abort the run.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam_utils::atomic::AtomicCell;
use log::{debug, info};
use scopeguard::defer_on_unwind;

use super::{ActionBlock, ActionKind, ArtifactSet, ProgressListener, StrategyError};

/// Which baselines of the image set to iterate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineSelection {
    All,
    #[default]
    CrossCorrelations,
    AutoCorrelations,
    /// Do not iterate; run the children once on the current artifact set.
    Current,
}

pub struct ForEachBaselineAction {
    pub selection: BaselineSelection,
    pub thread_count: usize,
    pub children: ActionBlock,
}

impl Default for ForEachBaselineAction {
    fn default() -> ForEachBaselineAction {
        ForEachBaselineAction {
            selection: BaselineSelection::default(),
            thread_count: 4,
            children: ActionBlock::new(),
        }
    }
}

impl ForEachBaselineAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if self.selection == BaselineSelection::Current {
            return self.children.perform(artifacts, listener);
        }
        let image_set = artifacts
            .image_set()
            .ok_or(StrategyError::NoImageSet)?
            .clone();

        let indices: Vec<usize> = {
            let set = image_set.lock().map_err(|_| StrategyError::PoisonedLock)?;
            let mut indices = vec![];
            for index in 0..set.baseline_count() {
                let (a1, a2) = set.antennas_of(index)?;
                let selected = match self.selection {
                    BaselineSelection::All => true,
                    BaselineSelection::CrossCorrelations => a1 != a2,
                    BaselineSelection::AutoCorrelations => a1 == a2,
                    BaselineSelection::Current => unreachable!(),
                };
                if selected {
                    indices.push(index);
                }
            }
            indices
        };
        let total = indices.len();
        let thread_count = self.thread_count.max(1).min(total.max(1));
        info!("Flagging {total} baselines on {thread_count} threads");

        let (tx, rx) = crossbeam_channel::unbounded();
        for index in indices {
            tx.send(index).expect("channel is open");
        }
        drop(tx);

        let finished = AtomicUsize::new(0);
        let aborted = AtomicCell::new(false);

        thread::scope(|scope| {
            for t in 0..thread_count {
                let rx = rx.clone();
                let image_set = &image_set;
                let finished = &finished;
                let aborted = &aborted;
                let template = &*artifacts;
                thread::Builder::new()
                    .name(format!("baseline {t}"))
                    .spawn_scoped(scope, move || {
                        // A panicking worker must not leave its siblings
                        // waiting forever.
                        defer_on_unwind! { aborted.store(true); }
                        while let Ok(index) = rx.recv() {
                            if aborted.load() {
                                return;
                            }
                            self.perform_baseline(index, image_set, template, listener);
                            let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                            listener.on_progress(ActionKind::ForEachBaseline, done, total);
                        }
                    })
                    .expect("OS can create threads");
            }
        });

        debug!("Finished iterating over baselines");
        Ok(())
    }

    fn perform_baseline(
        &self,
        index: usize,
        image_set: &crate::imagesets::ImageSetHandle,
        template: &ArtifactSet,
        listener: &dyn ProgressListener,
    ) {
        let loaded = {
            match image_set.lock() {
                Ok(mut set) => set.load(index),
                Err(_) => {
                    listener
                        .on_exception(ActionKind::ForEachBaseline, &StrategyError::PoisonedLock);
                    return;
                }
            }
        };
        let baseline = match loaded {
            Ok(baseline) => baseline,
            Err(error) => {
                listener.on_exception(ActionKind::ForEachBaseline, &error.into());
                return;
            }
        };

        let mut artifacts = template.clone();
        artifacts.set_baseline_index(baseline.index);
        artifacts.set_metadata(baseline.metadata);
        artifacts.set_original(baseline.data.clone());
        let mut revised = baseline.data.clone();
        revised.set_images_to_zero();
        artifacts.set_revised(revised);
        artifacts.set_contaminated(baseline.data);

        if let Err(error) = self.children.perform(&mut artifacts, listener) {
            listener.on_exception(ActionKind::ForEachBaseline, &error);
        }
    }
}
