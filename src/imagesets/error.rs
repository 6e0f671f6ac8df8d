// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageSetError {
    #[error("Baseline index {index} is out of bounds; the set has {count} baselines")]
    NoSuchBaseline { index: usize, count: usize },

    #[error("The number of flag masks ({got}) does not match the stored data ({expected})")]
    WrongMaskCount { expected: usize, got: usize },

    #[error("Writing flags failed: {0}")]
    WriteFailed(String),

    #[error("{0}")]
    Tfd(#[from] crate::tfdata::TfdError),
}
