// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::{Arc, Mutex};

use vec1::Vec1;

use crate::strategy::{ArtifactSet, ProgressListener, StrategyError};
use crate::write::{FlagBufferItem, FlagBufferWriter};

/// Hands the contaminated data's masks to the buffered flag writer, keyed
/// by the baseline index. The writer (and its consumer thread) starts
/// lazily on the first push and is guarded by a mutex owned by this action;
/// [`WriteFlagsAction::finish`] drains it and allows a later restart.
pub struct WriteFlagsAction {
    pub max_buffer_items: usize,
    pub min_buffer_items_for_writing: usize,
    writer: Mutex<Option<FlagBufferWriter>>,
}

impl Default for WriteFlagsAction {
    fn default() -> WriteFlagsAction {
        WriteFlagsAction {
            max_buffer_items: 18,
            min_buffer_items_for_writing: 12,
            writer: Mutex::new(None),
        }
    }
}

impl WriteFlagsAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        let image_set = Arc::clone(artifacts.image_set().ok_or(StrategyError::NoImageSet)?);
        let baseline = artifacts
            .baseline_index()
            .ok_or(StrategyError::NoBaselineLoaded)?;

        let contaminated = artifacts.contaminated();
        let mut masks = vec![];
        if contaminated.mask_count() == 0 {
            masks.push(contaminated.single_mask());
        } else {
            for i in 0..contaminated.mask_count() {
                masks.push(contaminated.mask(i)?);
            }
        }
        let masks = Vec1::try_from_vec(masks).expect("at least the combined mask is present");

        let mut guard = self
            .writer
            .lock()
            .map_err(|_| StrategyError::PoisonedLock)?;
        if guard.is_none() {
            *guard = Some(FlagBufferWriter::start(
                image_set,
                self.max_buffer_items,
                self.min_buffer_items_for_writing,
            )?);
        }
        guard
            .as_ref()
            .expect("writer was just initialised")
            .push(FlagBufferItem { masks, baseline })
    }

    /// Drains the buffer and stops the consumer thread; all queued flags
    /// are persisted (or their write error reported) when this returns. A
    /// later `perform` starts a fresh writer.
    pub fn finish(&self) -> Result<(), StrategyError> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StrategyError::PoisonedLock)?
            .take();
        match writer {
            Some(writer) => writer.finish(),
            None => Ok(()),
        }
    }
}
