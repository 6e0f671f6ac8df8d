// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::algorithms::{morphology, sir};
use crate::grid::{invert_mask, join_masks};
use crate::strategy::{ActionBlock, ArtifactSet, ProgressListener, StrategyError};
use crate::tfdata::TfdError;

/// How a set-flagging action (re-)initialises the flags in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewFlagging {
    /// Clear all flags.
    #[default]
    None,
    /// Flag every sample.
    Everything,
    /// Restore the contaminated flags from the original data.
    FromOriginal,
    /// Store the contaminated flags into the original data.
    ToOriginal,
    /// Invert the contaminated flags.
    Invert,
    /// Broadcast the combined mask to every polarisation entry.
    PolarisationsEqual,
    /// Flag exactly the zero-valued samples.
    FlagZeros,
    /// OR the contaminated flags with the original flags.
    OrOriginal,
}

/// Initialises or rewrites the flags in memory; part of the algorithm
/// plumbing rather than a detector.
#[derive(Debug, Default)]
pub struct SetFlaggingAction {
    pub new_flagging: NewFlagging,
}

impl SetFlaggingAction {
    pub fn description(&self) -> String {
        match self.new_flagging {
            NewFlagging::None => "Set no flags",
            NewFlagging::Everything => "Set everything flagged",
            NewFlagging::FromOriginal => "Restore original flags",
            NewFlagging::ToOriginal => "Change original flags",
            NewFlagging::Invert => "Set inverted flags",
            NewFlagging::PolarisationsEqual => "Apply flags to all polarisations",
            NewFlagging::FlagZeros => "Flag zeros",
            NewFlagging::OrOriginal => "Or flags with original",
        }
        .to_string()
    }

    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        match self.new_flagging {
            NewFlagging::None => artifacts.contaminated_mut().set_masks_to(false),
            NewFlagging::Everything => artifacts.contaminated_mut().set_masks_to(true),
            NewFlagging::FromOriginal => {
                let mask = artifacts.original().single_mask();
                artifacts.contaminated_mut().set_global_mask(mask);
            }
            NewFlagging::ToOriginal => {
                let contaminated = artifacts.contaminated().clone();
                let original = artifacts.original_mut();
                if original.mask_count() == 1 || contaminated.mask_count() == 1 {
                    original.set_global_mask(contaminated.single_mask());
                } else if contaminated.mask_count() != original.mask_count() {
                    return Err(TfdError::IncompatibleFlagging {
                        lhs: original.mask_count(),
                        rhs: contaminated.mask_count(),
                    }
                    .into());
                } else {
                    for i in 0..original.mask_count() {
                        original.set_mask(i, contaminated.mask(i)?)?;
                    }
                }
            }
            NewFlagging::Invert => {
                let mut mask = artifacts.contaminated().single_mask();
                invert_mask(&mut mask);
                artifacts.contaminated_mut().set_global_mask(mask);
            }
            // Broadcasts the combined mask; for data already sharing one
            // mask this is a no-op. See DESIGN.md.
            NewFlagging::PolarisationsEqual => {
                let mask = artifacts.contaminated().single_mask();
                artifacts.contaminated_mut().set_global_mask(mask);
            }
            NewFlagging::FlagZeros => {
                let image = artifacts.contaminated().single_image()?;
                let mut mask = artifacts.contaminated().single_mask();
                mask.zip_mut_with(&image, |m, &v| *m |= v == 0.0);
                artifacts.contaminated_mut().set_global_mask(mask);
            }
            NewFlagging::OrOriginal => {
                let mut mask = artifacts.contaminated().single_mask();
                join_masks(&mut mask, &artifacts.original().single_mask().view());
                artifacts.contaminated_mut().set_global_mask(mask);
            }
        }
        Ok(())
    }
}

/// The cascading morphological cleanup: dilation, scale-invariant rank
/// extension in both directions, depleted row/column flagging, and the
/// whole-grid give-up ceiling for pathological baselines.
pub struct StatisticalFlagAction {
    pub enlarge_time_size: usize,
    pub enlarge_frequency_size: usize,
    /// Eta for the time-direction SIR pass.
    pub minimum_good_time_ratio: f64,
    /// Eta for the frequency-direction SIR pass.
    pub minimum_good_frequency_ratio: f64,
    pub min_available_times_ratio: f64,
    pub min_available_frequencies_ratio: f64,
    pub min_available_tf_ratio: f64,
}

impl Default for StatisticalFlagAction {
    fn default() -> StatisticalFlagAction {
        StatisticalFlagAction {
            enlarge_time_size: 0,
            enlarge_frequency_size: 0,
            minimum_good_time_ratio: 0.2,
            minimum_good_frequency_ratio: 0.2,
            min_available_times_ratio: 0.0,
            min_available_frequencies_ratio: 0.0,
            min_available_tf_ratio: 0.0,
        }
    }
}

impl StatisticalFlagAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        let mut mask = artifacts.contaminated().single_mask().to_owned();

        morphology::dilate(&mut mask, self.enlarge_time_size, self.enlarge_frequency_size);
        sir::operate_horizontally(&mut mask, self.minimum_good_time_ratio);
        sir::operate_vertically(&mut mask, self.minimum_good_frequency_ratio);

        morphology::flag_depleted_rows(&mut mask, self.min_available_times_ratio);
        morphology::flag_depleted_columns(&mut mask, self.min_available_frequencies_ratio);
        morphology::flag_depleted_grid(&mut mask, self.min_available_tf_ratio);

        artifacts
            .contaminated_mut()
            .set_global_mask(mask.into_shared());
        Ok(())
    }
}

/// Runs each child against the same input flags and ORs all the resulting
/// masks together.
#[derive(Default)]
pub struct CombineFlagResults {
    pub children: ActionBlock,
}

impl CombineFlagResults {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if self.children.children().len() <= 1 {
            return self.children.perform(artifacts, listener);
        }

        let input = artifacts.contaminated().clone();
        let mut joint = input.single_mask();
        let count = self.children.children().len();
        for (i, child) in self.children.children().iter().enumerate() {
            artifacts.set_contaminated(input.clone());
            listener.on_start_task(child.kind(), i, count, &child.description(), child.weight());
            let result = child.perform(artifacts, listener);
            listener.on_end_task(child.kind());
            result?;
            join_masks(&mut joint, &artifacts.contaminated().single_mask().view());
        }

        let mut combined = input;
        combined.set_global_mask(joint);
        artifacts.set_contaminated(combined);
        Ok(())
    }
}
