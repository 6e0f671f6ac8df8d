// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::strategy::{ActionBlock, ActionKind, ArtifactSet, ProgressListener, StrategyError};
use crate::tfdata::{ComplexRepresentation, TimeFrequencyData};

/// Runs its children on one or more derived complex parts of the data.
///
/// Slots in complex representation are converted to the selected part
/// before the children run, and reconstructed afterwards: real/imaginary
/// runs keep the untouched orthogonal part from a snapshot, an amplitude
/// run duplicates the amplitude into both parts (optionally scaled by 1/√2
/// so the reconstructed amplitude matches the processed one).
pub struct ForEachComplexComponentAction {
    pub on_amplitude: bool,
    pub on_phase: bool,
    pub on_real: bool,
    pub on_imaginary: bool,
    pub restore_from_amplitude: bool,
    pub children: ActionBlock,
}

impl Default for ForEachComplexComponentAction {
    fn default() -> ForEachComplexComponentAction {
        ForEachComplexComponentAction {
            on_amplitude: false,
            on_phase: false,
            on_real: true,
            on_imaginary: true,
            restore_from_amplitude: false,
            children: ActionBlock::new(),
        }
    }
}

impl ForEachComplexComponentAction {
    /// An amplitude-only pass that writes the processed amplitude back into
    /// the complex data.
    pub fn amplitude_restoring() -> ForEachComplexComponentAction {
        ForEachComplexComponentAction {
            on_amplitude: true,
            on_phase: false,
            on_real: false,
            on_imaginary: false,
            restore_from_amplitude: true,
            children: ActionBlock::new(),
        }
    }

    pub fn description(&self) -> String {
        if self.iteration_count() == 1 {
            if self.on_amplitude {
                return if self.restore_from_amplitude {
                    "On amplitude (restore)".to_string()
                } else {
                    "On amplitude".to_string()
                };
            }
            if self.on_phase {
                return "On phase".to_string();
            }
            if self.on_real {
                return "On real".to_string();
            }
            if self.on_imaginary {
                return "On imaginary".to_string();
            }
        }
        "For each complex component".to_string()
    }

    fn iteration_count(&self) -> usize {
        [
            self.on_amplitude,
            self.on_phase,
            self.on_real,
            self.on_imaginary,
        ]
        .iter()
        .filter(|&&s| s)
        .count()
    }

    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let task_count = self.iteration_count();
        let mut task = 0;
        let parts = [
            (self.on_amplitude, ComplexRepresentation::Amplitude),
            (self.on_phase, ComplexRepresentation::Phase),
            (self.on_real, ComplexRepresentation::Real),
            (self.on_imaginary, ComplexRepresentation::Imaginary),
        ];
        for (selected, part) in parts {
            if !selected {
                continue;
            }
            let description = format!("On {part}");
            listener.on_start_task(
                ActionKind::ForEachComplexComponent,
                task,
                task_count,
                &description,
                self.children.weight(),
            );
            let result = if part == ComplexRepresentation::Amplitude {
                self.perform_on_amplitude(artifacts, listener)
            } else {
                self.perform_on_part(artifacts, listener, part)
            };
            listener.on_end_task(ActionKind::ForEachComplexComponent);
            result?;
            task += 1;
        }
        Ok(())
    }

    fn perform_on_amplitude(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let complex = ComplexRepresentation::Complex;
        let was_complex = [
            artifacts.contaminated().representation() == Some(complex),
            artifacts.revised().representation() == Some(complex),
            artifacts.original().representation() == Some(complex),
        ];

        if was_complex[0] {
            let amplitude = artifacts
                .contaminated()
                .make_part(ComplexRepresentation::Amplitude)?;
            artifacts.set_contaminated(amplitude);
        }
        if was_complex[1] {
            let amplitude = artifacts
                .revised()
                .make_part(ComplexRepresentation::Amplitude)?;
            artifacts.set_revised(amplitude);
        }
        if was_complex[2] {
            let amplitude = artifacts
                .original()
                .make_part(ComplexRepresentation::Amplitude)?;
            artifacts.set_original(amplitude);
        }

        self.children.perform(artifacts, listener)?;

        if was_complex[0] {
            let rebuilt = self.rebuild_from_amplitude(artifacts.contaminated())?;
            artifacts.set_contaminated(rebuilt);
        }
        if was_complex[1] {
            let rebuilt = self.rebuild_from_amplitude(artifacts.revised())?;
            artifacts.set_revised(rebuilt);
        }
        if was_complex[2] {
            let rebuilt = self.rebuild_from_amplitude(artifacts.original())?;
            artifacts.set_original(rebuilt);
        }
        Ok(())
    }

    fn rebuild_from_amplitude(
        &self,
        amplitude: &TimeFrequencyData,
    ) -> Result<TimeFrequencyData, StrategyError> {
        let mut rebuilt = TimeFrequencyData::from_complex_combination(amplitude, amplitude)?;
        if self.restore_from_amplitude {
            rebuilt.multiply_images(FRAC_1_SQRT_2);
        }
        rebuilt.set_mask_from(amplitude)?;
        Ok(rebuilt)
    }

    fn perform_on_part(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
        part: ComplexRepresentation,
    ) -> Result<(), StrategyError> {
        let complex = ComplexRepresentation::Complex;
        let prev_contaminated = artifacts.contaminated().clone();
        let prev_revised = artifacts.revised().clone();
        let prev_original = artifacts.original().clone();

        let mut available = false;
        let convert = |data: &TimeFrequencyData| -> Result<Option<TimeFrequencyData>, StrategyError> {
            match data.representation() {
                Some(r) if r == complex || r == part => Ok(Some(data.make_part(part)?)),
                _ => Ok(None),
            }
        };
        if let Some(converted) = convert(artifacts.contaminated())? {
            artifacts.set_contaminated(converted);
            available = true;
        }
        if let Some(converted) = convert(artifacts.revised())? {
            artifacts.set_revised(converted);
            available = true;
        }
        if let Some(converted) = convert(artifacts.original())? {
            artifacts.set_original(converted);
            available = true;
        }
        if !available {
            return Ok(());
        }

        self.children.perform(artifacts, listener)?;

        // Phase runs leave the converted data in place; a real or imaginary
        // run is recombined with the orthogonal part from the snapshot.
        if part != ComplexRepresentation::Phase {
            if prev_contaminated.representation() == Some(complex) {
                let rebuilt = set_part(artifacts.contaminated(), &prev_contaminated, part)?;
                artifacts.set_contaminated(rebuilt);
            }
            if prev_revised.representation() == Some(complex) {
                let rebuilt = set_part(artifacts.revised(), &prev_revised, part)?;
                artifacts.set_revised(rebuilt);
            }
            if prev_original.representation() == Some(complex) {
                let rebuilt = set_part(artifacts.original(), &prev_original, part)?;
                artifacts.set_original(rebuilt);
            }
        }
        Ok(())
    }
}

fn set_part(
    changed: &TimeFrequencyData,
    prev: &TimeFrequencyData,
    part: ComplexRepresentation,
) -> Result<TimeFrequencyData, StrategyError> {
    let mut rebuilt = match part {
        ComplexRepresentation::Imaginary => {
            let other = prev.make_part(ComplexRepresentation::Real)?;
            TimeFrequencyData::from_complex_combination(&other, changed)?
        }
        _ => {
            let other = prev.make_part(ComplexRepresentation::Imaginary)?;
            TimeFrequencyData::from_complex_combination(changed, &other)?
        }
    };
    rebuilt.set_mask_from(prev)?;
    Ok(rebuilt)
}
