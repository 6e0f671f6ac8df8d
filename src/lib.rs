// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
RFI detection and flagging for the Murchison Widefield Array (MWA) radio
telescope.

The core is a strategy engine: a composable tree of actions interpreted over
a mutable per-baseline context, driving the SumThreshold, scale-invariant
rank and morphological kernels over multi-polarisation time-frequency data,
with parallel baseline iteration and buffered flag write-back.
 */

pub mod algorithms;
pub mod error;
pub mod grid;
pub mod imagesets;
pub mod rng;
pub mod strategy;
pub mod tfdata;
pub mod write;

// Re-exports.
pub use error::HyperflagError;
pub use grid::{Image2D, Mask2D};
pub use imagesets::{BaselineData, BaselineMetadata, ImageSet, ImageSetHandle};
pub use strategy::{
    Action, ActionBlock, ActionKind, ArtifactSet, BaselineSelection, DefaultStrategySetup,
    ProgressListener, Strategy, StrategyError,
};
pub use tfdata::{ComplexRepresentation, Polarisation, TimeFrequencyData};
