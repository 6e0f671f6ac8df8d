// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all hyperflag-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HyperflagError {
    #[error("{0}")]
    Tfd(#[from] crate::tfdata::TfdError),

    #[error("{0}")]
    Strategy(#[from] crate::strategy::StrategyError),

    #[error("{0}")]
    ImageSet(#[from] crate::imagesets::ImageSetError),
}
