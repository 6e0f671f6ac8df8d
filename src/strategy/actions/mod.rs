// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The individual action kinds. Control-flow actions own a child block and
//! slice, repeat or restore the artifact set around it; leaf actions drive
//! the numeric kernels.

mod complex;
mod fit;
mod flag_ops;
mod iteration;
mod polarisation;
mod resolution;
mod selection;
mod threshold;
mod write_flags;

pub use complex::ForEachComplexComponentAction;
pub use fit::SlidingWindowFitAction;
pub use flag_ops::{CombineFlagResults, NewFlagging, SetFlaggingAction, StatisticalFlagAction};
pub use iteration::IterationBlock;
pub use polarisation::ForEachPolarisationBlock;
pub use resolution::ChangeResolutionAction;
pub use selection::{FrequencySelectionAction, TimeSelectionAction};
pub use threshold::SumThresholdAction;
pub use write_flags::WriteFlagsAction;
