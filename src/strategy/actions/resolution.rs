// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::grid::{
    enlarge_image_horizontally, enlarge_image_vertically, enlarge_mask_horizontally,
    enlarge_mask_vertically, shrink_image_horizontally, shrink_image_horizontally_masked,
    shrink_image_vertically, shrink_image_vertically_masked, shrink_mask_horizontally,
    shrink_mask_horizontally_for_averaging, shrink_mask_vertically,
    shrink_mask_vertically_for_averaging,
};
use crate::strategy::{ActionBlock, ArtifactSet, ProgressListener, StrategyError};
use crate::tfdata::{TfdError, TimeFrequencyData};

/// Runs its children against a downsampled scratch copy of the artifact
/// set, then restores the configured slots to full resolution by
/// nearest-neighbour replication.
///
/// With `restore_revised` set (and `restore_contaminated` not), the
/// upsampled revised data is subtracted from the pre-existing contaminated
/// data, so a background fitted at low resolution turns the full-resolution
/// contaminated slot into a residual.
pub struct ChangeResolutionAction {
    pub time_decrease_factor: usize,
    pub frequency_decrease_factor: usize,
    pub restore_revised: bool,
    pub restore_contaminated: bool,
    pub restore_masks: bool,
    /// Average only unflagged samples when downsampling.
    pub use_mask_in_averaging: bool,
    pub children: ActionBlock,
}

impl Default for ChangeResolutionAction {
    fn default() -> ChangeResolutionAction {
        ChangeResolutionAction {
            time_decrease_factor: 3,
            frequency_decrease_factor: 1,
            restore_revised: true,
            restore_contaminated: false,
            restore_masks: false,
            use_mask_in_averaging: false,
            children: ActionBlock::new(),
        }
    }
}

impl ChangeResolutionAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let old_contaminated = artifacts.contaminated().clone();

        if self.time_decrease_factor > 1 {
            let mut scratch = artifacts.clone();
            scratch.set_no_image_set();
            scratch.set_original(self.decrease_time(scratch.original()));
            scratch.set_contaminated(self.decrease_time(scratch.contaminated()));
            scratch.set_revised(self.decrease_time(scratch.revised()));

            self.perform_frequency_change(&mut scratch, listener)?;

            self.increase_time(artifacts.contaminated_mut(), scratch.contaminated(),
                self.restore_contaminated, self.restore_masks)?;
            self.increase_time(
                artifacts.revised_mut(),
                scratch.revised(),
                self.restore_revised,
                self.restore_masks,
            )?;
        } else {
            self.perform_frequency_change(artifacts, listener)?;
        }

        if self.restore_revised && !self.restore_contaminated {
            let mut residual = old_contaminated;
            residual.subtract(artifacts.revised())?;
            if self.restore_masks {
                residual.set_mask_from(artifacts.contaminated())?;
            }
            artifacts.set_contaminated(residual);
        }
        Ok(())
    }

    fn perform_frequency_change(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let old_contaminated = artifacts.contaminated().clone();

        if self.frequency_decrease_factor > 1 {
            let mut scratch = artifacts.clone();
            scratch.set_no_image_set();
            scratch.set_original(self.decrease_frequency(scratch.original()));
            scratch.set_contaminated(self.decrease_frequency(scratch.contaminated()));
            scratch.set_revised(self.decrease_frequency(scratch.revised()));

            self.children.perform(&mut scratch, listener)?;

            self.increase_frequency(artifacts.contaminated_mut(), scratch.contaminated(),
                self.restore_contaminated, self.restore_masks)?;
            self.increase_frequency(
                artifacts.revised_mut(),
                scratch.revised(),
                self.restore_revised,
                self.restore_masks,
            )?;
        } else {
            self.children.perform(artifacts, listener)?;
        }

        if self.restore_revised && !self.restore_contaminated {
            let mut residual = old_contaminated;
            residual.subtract(artifacts.revised())?;
            if self.restore_masks {
                residual.set_mask_from(artifacts.contaminated())?;
            }
            artifacts.set_contaminated(residual);
        }
        Ok(())
    }

    fn decrease_time(&self, data: &TimeFrequencyData) -> TimeFrequencyData {
        let factor = self.time_decrease_factor;
        if self.use_mask_in_averaging {
            data.transform_grids(
                |image, mask| shrink_image_horizontally_masked(&image.view(), &mask.view(), factor),
                |mask| shrink_mask_horizontally_for_averaging(&mask.view(), factor),
            )
        } else {
            data.transform_grids(
                |image, _| shrink_image_horizontally(&image.view(), factor),
                |mask| shrink_mask_horizontally(&mask.view(), factor),
            )
        }
    }

    fn decrease_frequency(&self, data: &TimeFrequencyData) -> TimeFrequencyData {
        let factor = self.frequency_decrease_factor;
        if self.use_mask_in_averaging {
            data.transform_grids(
                |image, mask| shrink_image_vertically_masked(&image.view(), &mask.view(), factor),
                |mask| shrink_mask_vertically_for_averaging(&mask.view(), factor),
            )
        } else {
            data.transform_grids(
                |image, _| shrink_image_vertically(&image.view(), factor),
                |mask| shrink_mask_vertically(&mask.view(), factor),
            )
        }
    }

    fn increase_time(
        &self,
        full: &mut TimeFrequencyData,
        changed: &TimeFrequencyData,
        restore_image: bool,
        restore_mask: bool,
    ) -> Result<(), StrategyError> {
        let factor = self.time_decrease_factor;
        let width = full.width();
        if restore_image {
            if full.image_count() != changed.image_count() {
                return Err(TfdError::IncompatibleOperands {
                    lhs: full.image_count(),
                    rhs: changed.image_count(),
                }
                .into());
            }
            for i in 0..full.image_count() {
                let enlarged =
                    enlarge_image_horizontally(&changed.image(i)?.view(), factor, width);
                full.set_image(i, enlarged)?;
            }
        }
        if restore_mask {
            if changed.mask_count() == full.mask_count() {
                for i in 0..full.mask_count() {
                    let enlarged =
                        enlarge_mask_horizontally(&changed.mask(i)?.view(), factor, width);
                    full.set_mask(i, enlarged)?;
                }
            } else {
                let enlarged =
                    enlarge_mask_horizontally(&changed.single_mask().view(), factor, width);
                full.set_global_mask(enlarged);
            }
        }
        Ok(())
    }

    fn increase_frequency(
        &self,
        full: &mut TimeFrequencyData,
        changed: &TimeFrequencyData,
        restore_image: bool,
        restore_mask: bool,
    ) -> Result<(), StrategyError> {
        let factor = self.frequency_decrease_factor;
        let height = full.height();
        if restore_image {
            if full.image_count() != changed.image_count() {
                return Err(TfdError::IncompatibleOperands {
                    lhs: full.image_count(),
                    rhs: changed.image_count(),
                }
                .into());
            }
            for i in 0..full.image_count() {
                let enlarged = enlarge_image_vertically(&changed.image(i)?.view(), factor, height);
                full.set_image(i, enlarged)?;
            }
        }
        if restore_mask {
            if changed.mask_count() == full.mask_count() {
                for i in 0..full.mask_count() {
                    let enlarged =
                        enlarge_mask_vertically(&changed.mask(i)?.view(), factor, height);
                    full.set_mask(i, enlarged)?;
                }
            } else {
                let enlarged =
                    enlarge_mask_vertically(&changed.single_mask().view(), factor, height);
                full.set_global_mask(enlarged);
            }
        }
        Ok(())
    }
}
