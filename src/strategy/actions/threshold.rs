// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::OnceLock;

use crate::algorithms::threshold::{rayleigh_mode, ThresholdSchedule};
use crate::strategy::{ArtifactSet, ProgressListener, StrategyError};

/// The first threshold of the combinatorial schedule, in units of the noise
/// mode. The per-length falloff derives every other threshold from it.
const FIRST_THRESHOLD: f32 = 6.0;

/// Runs the SumThreshold method over the contaminated data, in the time
/// and/or frequency direction, adding detections to the existing flags. The
/// effective thresholds scale with the artifact set's sensitivity, so a
/// surrounding iteration block sweeps this action from insensitive to
/// nominal.
pub struct SumThresholdAction {
    /// Extra threshold scale on top of the artifact sensitivity; above 1
    /// flags less, below 1 flags more.
    pub base_sensitivity: f64,
    pub time_direction_flagging: bool,
    pub frequency_direction_flagging: bool,
    pub(crate) schedule: OnceLock<ThresholdSchedule>,
}

impl Default for SumThresholdAction {
    fn default() -> SumThresholdAction {
        SumThresholdAction {
            base_sensitivity: 1.0,
            time_direction_flagging: true,
            frequency_direction_flagging: true,
            schedule: OnceLock::new(),
        }
    }
}

impl SumThresholdAction {
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

        let schedule = self.schedule.get_or_init(|| {
            ThresholdSchedule::new(
                FIRST_THRESHOLD,
                self.time_direction_flagging,
                self.frequency_direction_flagging,
            )
        });
        let mode = rayleigh_mode(&image.view(), &mask.view());
        let factor = mode * (artifacts.sensitivity() * self.base_sensitivity) as f32;
        schedule.execute(&image.view(), &mut mask, factor);

        let mut contaminated = artifacts.contaminated().clone();
        contaminated.set_global_mask(mask.into_shared());
        artifacts.set_contaminated(contaminated);
        Ok(())
    }
}
