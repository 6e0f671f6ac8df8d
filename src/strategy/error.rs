// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Contaminated and original data do not have equal polarisations in a for-each-polarisation block")]
    IncompatiblePolarisations,

    #[error("No baseline is loaded; a for-each-baseline action (or a manually prepared artifact set) must come first")]
    NoBaselineLoaded,

    #[error("This action needs an image set, but the artifact set carries none")]
    NoImageSet,

    #[error("A shared lock was poisoned by a panicking thread")]
    PoisonedLock,

    #[error("{0}")]
    Tfd(#[from] crate::tfdata::TfdError),

    #[error("{0}")]
    ImageSet(#[from] crate::imagesets::ImageSetError),
}
