// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::strategy::{ActionBlock, ActionKind, ArtifactSet, ProgressListener, StrategyError};

/// Repeats its children with a geometrically decreasing sensitivity: the
/// first pass multiplies thresholds by `sensitivity_start`, every following
/// pass divides by `sensitivity_start^(1/n)`, so detection tightens towards
/// nominal. The surrounding sensitivity is restored afterwards, which lets
/// iteration blocks nest.
pub struct IterationBlock {
    pub iteration_count: usize,
    pub sensitivity_start: f64,
    pub children: ActionBlock,
}

impl Default for IterationBlock {
    fn default() -> IterationBlock {
        IterationBlock {
            iteration_count: 4,
            sensitivity_start: 10.0,
            children: ActionBlock::new(),
        }
    }
}

impl IterationBlock {
    /// The sensitivity sweep: `start / step^i` with
    /// `step = start^(1/n)`, so the last pass runs at `start^(1/n)` and the
    /// series approaches 1 as the count grows.
    pub fn sensitivities(&self) -> Vec<f64> {
        let count = self.iteration_count.max(1);
        let step = self.sensitivity_start.powf(1.0 / count as f64);
        let mut sensitivity = self.sensitivity_start;
        (0..self.iteration_count)
            .map(|_| {
                let current = sensitivity;
                sensitivity /= step;
                current
            })
            .collect()
    }

    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let old_sensitivity = artifacts.sensitivity();
        for (i, sensitivity) in self.sensitivities().into_iter().enumerate() {
            artifacts.set_sensitivity(sensitivity * old_sensitivity);
            listener.on_start_task(
                ActionKind::Iteration,
                i,
                self.iteration_count,
                "Iteration",
                self.children.weight(),
            );
            let result = self.children.perform(artifacts, listener);
            listener.on_end_task(ActionKind::Iteration);
            result?;
        }
        artifacts.set_sensitivity(old_sensitivity);
        Ok(())
    }
}
