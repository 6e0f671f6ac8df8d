// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The default flagging strategy.
//!
//! The single-baseline pipeline: clear flags, then per polarisation and on
//! the visibility amplitudes, iterate SumThreshold with decreasing
//! sensitivity while refining a low-resolution background fit whose
//! residual feeds the next pass; finish with a full-sensitivity
//! SumThreshold, morphological cleanup, outlier time-step removal, and an
//! OR with the input flags.

use super::actions::{
    ChangeResolutionAction, CombineFlagResults, ForEachComplexComponentAction,
    ForEachPolarisationBlock, FrequencySelectionAction, IterationBlock, NewFlagging,
    SetFlaggingAction, SlidingWindowFitAction, StatisticalFlagAction, SumThresholdAction,
    TimeSelectionAction, WriteFlagsAction,
};
use super::{Action, ActionBlock, BaselineSelection, ForEachBaselineAction, Strategy};

#[derive(Debug, Clone)]
pub struct DefaultStrategySetup {
    pub iteration_count: usize,
    pub sensitivity_start: f64,
    pub sum_threshold_sensitivity: f64,
    /// Iterate over Stokes I and Q instead of the stored dipoles.
    pub on_stokes_iq: bool,
    pub time_resolution_factor: usize,
    pub frequency_selection_threshold: f64,
    pub time_selection_threshold: f64,
}

impl Default for DefaultStrategySetup {
    fn default() -> DefaultStrategySetup {
        DefaultStrategySetup {
            iteration_count: 2,
            sensitivity_start: 4.0,
            sum_threshold_sensitivity: 1.0,
            on_stokes_iq: false,
            time_resolution_factor: 3,
            frequency_selection_threshold: 3.0,
            time_selection_threshold: 3.5,
        }
    }
}

impl DefaultStrategySetup {
    /// The pipeline for one already-loaded baseline.
    pub fn single_strategy(&self) -> Strategy {
        let mut strategy = Strategy::new();
        strategy.add(Action::SetFlagging(SetFlaggingAction {
            new_flagging: NewFlagging::None,
        }));

        let mut per_polarisation = if self.on_stokes_iq {
            ForEachPolarisationBlock::stokes_only(true, true, false, false)
        } else {
            ForEachPolarisationBlock::default()
        };

        let mut on_amplitude = ForEachComplexComponentAction::amplitude_restoring();

        let mut iteration = IterationBlock {
            iteration_count: self.iteration_count,
            sensitivity_start: self.sensitivity_start,
            children: ActionBlock::new(),
        };
        iteration
            .children
            .add(Action::SumThreshold(SumThresholdAction {
                base_sensitivity: self.sum_threshold_sensitivity,
                ..SumThresholdAction::default()
            }));
        let mut combine = CombineFlagResults::default();
        combine
            .children
            .add(Action::FrequencySelection(FrequencySelectionAction {
                threshold: self.frequency_selection_threshold,
                ..FrequencySelectionAction::default()
            }));
        iteration.children.add(Action::CombineFlagResults(combine));
        let mut background = ChangeResolutionAction {
            time_decrease_factor: self.time_resolution_factor,
            restore_revised: true,
            use_mask_in_averaging: true,
            ..ChangeResolutionAction::default()
        };
        background
            .children
            .add(Action::SlidingWindowFit(SlidingWindowFitAction::default()));
        iteration.children.add(Action::ChangeResolution(background));

        on_amplitude.children.add(Action::Iteration(iteration));
        on_amplitude
            .children
            .add(Action::SumThreshold(SumThresholdAction {
                base_sensitivity: self.sum_threshold_sensitivity,
                ..SumThresholdAction::default()
            }));

        per_polarisation
            .children
            .add(Action::ForEachComplexComponent(on_amplitude));
        strategy.add(Action::ForEachPolarisation(per_polarisation));

        strategy.add(Action::StatisticalFlag(StatisticalFlagAction::default()));
        strategy.add(Action::TimeSelection(TimeSelectionAction {
            threshold: self.time_selection_threshold,
        }));
        strategy.add(Action::SetFlagging(SetFlaggingAction {
            new_flagging: NewFlagging::OrOriginal,
        }));
        strategy
    }

    /// The single-baseline pipeline wrapped in a parallel baseline iterator
    /// with buffered flag write-back.
    pub fn full_strategy(
        &self,
        selection: BaselineSelection,
        thread_count: usize,
    ) -> Strategy {
        let single = self.single_strategy();
        let mut for_each_baseline = ForEachBaselineAction {
            selection,
            thread_count,
            children: single.children,
        };
        for_each_baseline
            .children
            .add(Action::WriteFlags(WriteFlagsAction::default()));

        let mut strategy = Strategy::new();
        strategy.add(Action::ForEachBaseline(for_each_baseline));
        set_thread_count(&mut strategy, thread_count);
        strategy
    }
}

/// Applies a thread count across the tree: baseline iterators use it
/// directly and flag writers size their buffers from it, so the queue can
/// hold a few items per producer thread.
pub fn set_thread_count(strategy: &mut Strategy, thread_count: usize) {
    fn walk(block: &mut ActionBlock, thread_count: usize) {
        for action in block.children_mut() {
            match action {
                Action::ForEachBaseline(a) => a.thread_count = thread_count,
                Action::WriteFlags(a) => {
                    a.max_buffer_items = thread_count * 5;
                    a.min_buffer_items_for_writing = thread_count * 4;
                }
                _ => {}
            }
            if let Some(children) = action.child_block_mut() {
                walk(children, thread_count);
            }
        }
    }
    walk(&mut strategy.children, thread_count.max(1));
}
