// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The buffered flag writer.
//!
//! Flag production is fast and runs on many baseline threads; persistence is
//! slow and must be serialised. Producers push `(masks, baseline)` items
//! into a bounded queue and block once `max_buffer_items` are waiting. A
//! single consumer thread only starts draining once
//! `min_buffer_items_for_writing` items are queued, so small writes batch
//! up, and it writes strictly in push order. [`FlagBufferWriter::finish`]
//! drains the queue to empty before returning, and surfaces the first write
//! error instead of swallowing it; queued items are still attempted.


use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use log::{debug, trace};
use vec1::Vec1;

use crate::grid::Mask2D;
use crate::imagesets::{ImageSetError, ImageSetHandle};
use crate::strategy::StrategyError;

/// One baseline's worth of flags awaiting persistence.
pub struct FlagBufferItem {
    pub masks: Vec1<Mask2D>,
    pub baseline: usize,
}

struct BufferState {
    queue: VecDeque<FlagBufferItem>,
    finishing: bool,
    error: Option<ImageSetError>,
}

struct Shared {
    state: Mutex<BufferState>,
    change: Condvar,
    max_buffer_items: usize,
    min_buffer_items_for_writing: usize,
}

pub struct FlagBufferWriter {
    shared: Arc<Shared>,
    image_set: ImageSetHandle,
    consumer: Option<JoinHandle<()>>,
}

impl FlagBufferWriter {
    /// Starts the consumer thread writing through `image_set`.
    pub fn start(
        image_set: ImageSetHandle,
        max_buffer_items: usize,
        min_buffer_items_for_writing: usize,
    ) -> Result<FlagBufferWriter, StrategyError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(BufferState {
                queue: VecDeque::new(),
                finishing: false,
                error: None,
            }),
            change: Condvar::new(),
            max_buffer_items: max_buffer_items.max(1),
            min_buffer_items_for_writing,
        });
        let consumer_shared = Arc::clone(&shared);
        let consumer_set = Arc::clone(&image_set);
        let consumer = std::thread::Builder::new()
            .name("flag writer".to_string())
            .spawn(move || consume(consumer_shared, consumer_set))
            .expect("OS can create threads");
        Ok(FlagBufferWriter {
            shared,
            image_set,
            consumer: Some(consumer),
        })
    }

    /// Enqueues an item, blocking while the buffer is full. A write error
    /// already recorded by the consumer is returned immediately.
    pub fn push(&self, item: FlagBufferItem) -> Result<(), StrategyError> {
        let mut state = self
            .shared
            .state
            .lock()
            .map_err(|_| StrategyError::PoisonedLock)?;
        loop {
            if let Some(error) = state.error.take() {
                return Err(error.into());
            }
            if state.queue.len() < self.shared.max_buffer_items {
                break;
            }
            state = self
                .shared
                .change
                .wait(state)
                .map_err(|_| StrategyError::PoisonedLock)?;
        }
        trace!("Buffering flags for baseline {}", item.baseline);
        state.queue.push_back(item);
        self.shared.change.notify_all();
        Ok(())
    }

    /// Drains the queue to empty, stops the consumer and reports any write
    /// error. All previously pushed flags are persisted (or attempted) when
    /// this returns.
    pub fn finish(mut self) -> Result<(), StrategyError> {
        debug!("Waiting for flag buffer to empty");
        {
            let mut state = self
                .shared
                .state
                .lock()
                .map_err(|_| StrategyError::PoisonedLock)?;
            state.finishing = true;
            self.shared.change.notify_all();
        }
        if let Some(consumer) = self.consumer.take() {
            consumer
                .join()
                .map_err(|_| StrategyError::PoisonedLock)?;
        }
        let mut state = self
            .shared
            .state
            .lock()
            .map_err(|_| StrategyError::PoisonedLock)?;
        // A producer may have slipped a final item in while the consumer was
        // exiting; write any leftovers here.
        while let Some(item) = state.queue.pop_front() {
            let result = match self.image_set.lock() {
                Ok(mut set) => set.store_flags(item.baseline, item.masks),
                Err(_) => Err(ImageSetError::WriteFailed(
                    "the image set lock was poisoned".to_string(),
                )),
            };
            if let Err(error) = result {
                if state.error.is_none() {
                    state.error = Some(error);
                }
            }
        }
        match state.error.take() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

fn consume(shared: Arc<Shared>, image_set: ImageSetHandle) {
    // Once the minimum batch size wakes the consumer, it drains the queue to
    // empty before going back to sleep.
    let mut draining = false;
    loop {
        let item = {
            let mut state = match shared.state.lock() {
                Ok(state) => state,
                Err(_) => return,
            };
            loop {
                if state.queue.is_empty() {
                    draining = false;
                    if state.finishing {
                        return;
                    }
                } else if draining
                    || state.finishing
                    || state.queue.len() >= shared.min_buffer_items_for_writing
                {
                    draining = true;
                    break;
                }
                state = match shared.change.wait(state) {
                    Ok(state) => state,
                    Err(_) => return,
                };
            }
            let item = state.queue.pop_front().expect("queue is non-empty");
            shared.change.notify_all();
            item
        };

        trace!("Writing flags for baseline {}", item.baseline);
        let result = match image_set.lock() {
            Ok(mut set) => set.store_flags(item.baseline, item.masks),
            Err(_) => Err(ImageSetError::WriteFailed(
                "the image set lock was poisoned".to_string(),
            )),
        };
        if let Err(error) = result {
            let mut state = match shared.state.lock() {
                Ok(state) => state,
                Err(_) => return,
            };
            // Keep only the first error; later items are still attempted.
            if state.error.is_none() {
                state.error = Some(error);
            }
            shared.change.notify_all();
        }
    }
}
