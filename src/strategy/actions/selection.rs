// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::algorithms::stats::{
    masked_column_rms, masked_row_rms, median_ignoring_nan, stddev_ignoring_nan,
};
use crate::strategy::{ArtifactSet, ProgressListener, StrategyError};

/// Flags whole frequency channels whose RMS stands out from the other
/// channels: iterative clipping against median ± threshold·stddev, scaled by
/// the artifact sensitivity, until no channel moves.
pub struct FrequencySelectionAction {
    pub threshold: f64,
    /// Also clip channels that are unusually quiet.
    pub clip_down: bool,
}

impl Default for FrequencySelectionAction {
    fn default() -> FrequencySelectionAction {
        FrequencySelectionAction {
            threshold: 8.0,
            clip_down: true,
        }
    }
}

impl FrequencySelectionAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        let image = artifacts.contaminated().single_image()?;
        let mut mask = artifacts.contaminated().single_mask().to_owned();
        let height = mask.nrows();
        let width = mask.ncols();

        let mut channels: Vec<f32> = (0..height)
            .map(|y| masked_row_rms(&image.view(), &mask.view(), y))
            .collect();

        loop {
            let median = median_ignoring_nan(&channels);
            let stddev = stddev_ignoring_nan(&channels, median);
            if median.is_nan() || stddev.is_nan() {
                break;
            }
            let effective = self.threshold * f64::from(stddev) * artifacts.sensitivity();
            let mut change = false;
            for (y, channel) in channels.iter_mut().enumerate() {
                if channel.is_nan() {
                    continue;
                }
                let excess = f64::from(*channel - median);
                if excess > effective || (self.clip_down && -excess > effective) {
                    for x in 0..width {
                        mask[(y, x)] = true;
                    }
                    *channel = f32::NAN;
                    change = true;
                }
            }
            if !change {
                break;
            }
        }

        artifacts
            .contaminated_mut()
            .set_global_mask(mask.into_shared());
        Ok(())
    }
}

/// The time-direction mirror of [`FrequencySelectionAction`]: flags whole
/// time steps whose RMS stands out.
pub struct TimeSelectionAction {
    pub threshold: f64,
}

impl Default for TimeSelectionAction {
    fn default() -> TimeSelectionAction {
        TimeSelectionAction { threshold: 3.5 }
    }
}

impl TimeSelectionAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        let image = artifacts.contaminated().single_image()?;
        let mut mask = artifacts.contaminated().single_mask().to_owned();
        let height = mask.nrows();
        let width = mask.ncols();

        let mut steps: Vec<f32> = (0..width)
            .map(|x| masked_column_rms(&image.view(), &mask.view(), x))
            .collect();

        loop {
            let median = median_ignoring_nan(&steps);
            let stddev = stddev_ignoring_nan(&steps, median);
            if median.is_nan() || stddev.is_nan() {
                break;
            }
            let effective = self.threshold * f64::from(stddev) * artifacts.sensitivity();
            let mut change = false;
            for (x, step) in steps.iter_mut().enumerate() {
                if step.is_nan() {
                    continue;
                }
                if f64::from(*step - median) > effective {
                    for y in 0..height {
                        mask[(y, x)] = true;
                    }
                    *step = f32::NAN;
                    change = true;
                }
            }
            if !change {
                break;
            }
        }

        artifacts
            .contaminated_mut()
            .set_global_mask(mask.into_shared());
        Ok(())
    }
}
