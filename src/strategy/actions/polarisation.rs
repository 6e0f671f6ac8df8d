// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::grid::{filled_mask, join_masks, Mask2D};
use crate::strategy::{ActionBlock, ActionKind, ArtifactSet, ProgressListener, StrategyError};
use crate::tfdata::{Polarisation, TimeFrequencyData};

/// Runs its children once per selected polarisation, slicing all three data
/// slots down to that polarisation and writing the (possibly mutated)
/// result back afterwards.
///
/// Selecting dipole polarisations iterates over the entries actually stored.
/// Selecting Stokes parameters derives each parameter as a view over the
/// dipoles, and ORs the masks produced for the selected parameters into one
/// combined mask over the restored multi-polarisation data.
pub struct ForEachPolarisationBlock {
    pub on_xx: bool,
    pub on_xy: bool,
    pub on_yx: bool,
    pub on_yy: bool,
    pub on_stokes_i: bool,
    pub on_stokes_q: bool,
    pub on_stokes_u: bool,
    pub on_stokes_v: bool,
    /// Also write the per-polarisation revised data back.
    pub restore_revised: bool,
    pub children: ActionBlock,
}

impl Default for ForEachPolarisationBlock {
    fn default() -> ForEachPolarisationBlock {
        ForEachPolarisationBlock {
            on_xx: true,
            on_xy: true,
            on_yx: true,
            on_yy: true,
            on_stokes_i: false,
            on_stokes_q: false,
            on_stokes_u: false,
            on_stokes_v: false,
            restore_revised: false,
            children: ActionBlock::new(),
        }
    }
}

impl ForEachPolarisationBlock {
    /// Convenience for strategies working on Stokes parameters only.
    pub fn stokes_only(i: bool, q: bool, u: bool, v: bool) -> ForEachPolarisationBlock {
        ForEachPolarisationBlock {
            on_xx: false,
            on_xy: false,
            on_yx: false,
            on_yy: false,
            on_stokes_i: i,
            on_stokes_q: q,
            on_stokes_u: u,
            on_stokes_v: v,
            ..ForEachPolarisationBlock::default()
        }
    }

    pub fn description(&self) -> String {
        if self.selected_count() == 1 {
            for (selected, name) in [
                (self.on_xx, "On XX"),
                (self.on_xy, "On XY"),
                (self.on_yx, "On YX"),
                (self.on_yy, "On YY"),
                (self.on_stokes_i, "On Stokes I"),
                (self.on_stokes_q, "On Stokes Q"),
                (self.on_stokes_u, "On Stokes U"),
                (self.on_stokes_v, "On Stokes V"),
            ] {
                if selected {
                    return name.to_string();
                }
            }
        }
        "For each polarisation".to_string()
    }

    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let old_contaminated = artifacts.contaminated().clone();
        let old_original = artifacts.original().clone();

        if old_contaminated.polarisations() != old_original.polarisations() {
            return Err(StrategyError::IncompatiblePolarisations);
        }

        if old_contaminated.polarisation_count() == 1 {
            // Already sliced; just run the children.
            self.children.perform(artifacts, listener)
        } else if self.stokes_selected() {
            self.perform_stokes_iteration(artifacts, listener)
        } else {
            self.perform_dipole_iteration(artifacts, listener)
        }
    }

    fn perform_dipole_iteration(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let mut old_contaminated = artifacts.contaminated().clone();
        let mut old_original = artifacts.original().clone();
        let mut old_revised = artifacts.revised().clone();

        let change_revised = old_revised.polarisations() == old_contaminated.polarisations();
        let count = old_contaminated.polarisation_count();

        for index in 0..count {
            if !self.is_selected(old_contaminated.polarisation(index)) {
                continue;
            }
            let sliced = old_contaminated.make_polarisation_index(index);
            listener.on_start_task(
                ActionKind::ForEachPolarisation,
                index,
                count,
                &sliced.description(),
                self.children.weight(),
            );
            artifacts.set_contaminated(sliced);
            artifacts.set_original(old_original.make_polarisation_index(index));
            if change_revised {
                artifacts.set_revised(old_revised.make_polarisation_index(index));
            }

            let result = self.children.perform(artifacts, listener);
            listener.on_end_task(ActionKind::ForEachPolarisation);
            result?;

            old_contaminated.set_polarisation_data(index, artifacts.contaminated())?;
            old_original.set_polarisation_data(index, artifacts.original())?;
            if change_revised && self.restore_revised {
                old_revised.set_polarisation_data(index, artifacts.revised())?;
            }
        }

        artifacts.set_contaminated(old_contaminated);
        artifacts.set_original(old_original);
        artifacts.set_revised(old_revised);
        Ok(())
    }

    fn perform_stokes_iteration(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let old_contaminated = artifacts.contaminated().clone();
        let old_original = artifacts.original().clone();
        let old_revised = artifacts.revised().clone();

        let change_revised = old_revised.polarisations() == old_contaminated.polarisations();
        let mut mask = filled_mask(old_contaminated.width(), old_contaminated.height(), false);

        let stokes = [
            (self.on_stokes_i, Polarisation::StokesI),
            (self.on_stokes_q, Polarisation::StokesQ),
            (self.on_stokes_u, Polarisation::StokesU),
            (self.on_stokes_v, Polarisation::StokesV),
        ];
        for (task, (selected, polarisation)) in stokes.into_iter().enumerate() {
            if !selected {
                continue;
            }
            self.perform_one_stokes(
                artifacts,
                listener,
                polarisation,
                &old_contaminated,
                &old_original,
                &old_revised,
                change_revised,
                task,
                &mut mask,
            )?;
        }

        let mut restored = old_contaminated;
        restored.set_global_mask(mask);
        artifacts.set_contaminated(restored);
        artifacts.set_original(old_original);
        artifacts.set_revised(old_revised);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn perform_one_stokes(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
        polarisation: Polarisation,
        old_contaminated: &TimeFrequencyData,
        old_original: &TimeFrequencyData,
        old_revised: &TimeFrequencyData,
        change_revised: bool,
        task: usize,
        mask: &mut Mask2D,
    ) -> Result<(), StrategyError> {
        let sliced = old_contaminated.make(polarisation)?;
        listener.on_start_task(
            ActionKind::ForEachPolarisation,
            task,
            4,
            &sliced.description(),
            self.children.weight(),
        );
        artifacts.set_contaminated(sliced);
        artifacts.set_original(old_original.make(polarisation)?);
        if change_revised {
            artifacts.set_revised(old_revised.make(polarisation)?);
        }

        let result = self.children.perform(artifacts, listener);
        listener.on_end_task(ActionKind::ForEachPolarisation);
        result?;

        join_masks(mask, &artifacts.contaminated().single_mask().view());
        Ok(())
    }

    fn is_selected(&self, polarisation: Polarisation) -> bool {
        match polarisation {
            Polarisation::Xx => self.on_xx,
            Polarisation::Xy => self.on_xy,
            Polarisation::Yx => self.on_yx,
            Polarisation::Yy => self.on_yy,
            Polarisation::StokesI => self.on_stokes_i,
            Polarisation::StokesQ => self.on_stokes_q,
            Polarisation::StokesU => self.on_stokes_u,
            Polarisation::StokesV => self.on_stokes_v,
        }
    }

    fn stokes_selected(&self) -> bool {
        self.on_stokes_i || self.on_stokes_q || self.on_stokes_u || self.on_stokes_v
    }

    fn selected_count(&self) -> usize {
        [
            self.on_xx,
            self.on_xy,
            self.on_yx,
            self.on_yy,
            self.on_stokes_i,
            self.on_stokes_q,
            self.on_stokes_u,
            self.on_stokes_v,
        ]
        .iter()
        .filter(|&&s| s)
        .count()
    }
}
