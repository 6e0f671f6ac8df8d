// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The strategy engine: a composable action tree interpreted over a mutable
//! per-baseline [`ArtifactSet`].
//!
//! Actions form a closed set (one enum variant per kind, dispatched through
//! a single [`Action::perform`]) rather than an open inheritance hierarchy.
//! Container actions own an ordered [`ActionBlock`] of children and run them
//! sequentially against the same artifact set; in-place mutation of the set
//! is how siblings communicate. Control-flow actions slice, repeat or
//! restore the set around their children. The tree itself is immutable
//! during a run; scalar parameters are set before execution.

pub mod actions;
mod artifacts;
mod baseline;
mod default;
mod error;
mod progress;
#[cfg(test)]
mod tests;

pub use artifacts::ArtifactSet;
pub use baseline::{BaselineSelection, ForEachBaselineAction};
pub use default::{set_thread_count, DefaultStrategySetup};
pub use error::StrategyError;
pub use progress::{
    DummyProgressListener, LogProgressListener, ProgressBarListener, ProgressListener,
    TaskProgress,
};

use strum_macros::{Display, EnumIter, EnumString};

use actions::{
    ChangeResolutionAction, CombineFlagResults, ForEachComplexComponentAction,
    ForEachPolarisationBlock, FrequencySelectionAction, IterationBlock, SetFlaggingAction,
    SlidingWindowFitAction, StatisticalFlagAction, SumThresholdAction, TimeSelectionAction,
    WriteFlagsAction,
};

/// The closed set of action kinds; the string forms are the names a
/// strategy loader uses.
#[derive(Debug, Display, EnumString, EnumIter, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    #[strum(serialize = "Change resolution")]
    ChangeResolution,
    #[strum(serialize = "Combine flag results")]
    CombineFlagResults,
    #[strum(serialize = "For each baseline")]
    ForEachBaseline,
    #[strum(serialize = "For each complex component")]
    ForEachComplexComponent,
    #[strum(serialize = "For each polarisation")]
    ForEachPolarisation,
    #[strum(serialize = "Frequency selection")]
    FrequencySelection,
    #[strum(serialize = "Iteration")]
    Iteration,
    #[strum(serialize = "Set flagging")]
    SetFlagging,
    #[strum(serialize = "Sliding window fit")]
    SlidingWindowFit,
    #[strum(serialize = "Statistical flagging")]
    StatisticalFlag,
    #[strum(serialize = "SumThreshold")]
    SumThreshold,
    #[strum(serialize = "Time selection")]
    TimeSelection,
    #[strum(serialize = "Write flags")]
    WriteFlags,
}

/// One node of the strategy tree.
pub enum Action {
    ChangeResolution(ChangeResolutionAction),
    CombineFlagResults(CombineFlagResults),
    ForEachBaseline(ForEachBaselineAction),
    ForEachComplexComponent(ForEachComplexComponentAction),
    ForEachPolarisation(ForEachPolarisationBlock),
    FrequencySelection(FrequencySelectionAction),
    Iteration(IterationBlock),
    SetFlagging(SetFlaggingAction),
    SlidingWindowFit(SlidingWindowFitAction),
    StatisticalFlag(StatisticalFlagAction),
    SumThreshold(SumThresholdAction),
    TimeSelection(TimeSelectionAction),
    WriteFlags(WriteFlagsAction),
}

impl Action {
    /// Transforms the artifact set. Containers run their children in order;
    /// errors abort the subtree and propagate to the caller.
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        match self {
            Action::ChangeResolution(a) => a.perform(artifacts, listener),
            Action::CombineFlagResults(a) => a.perform(artifacts, listener),
            Action::ForEachBaseline(a) => a.perform(artifacts, listener),
            Action::ForEachComplexComponent(a) => a.perform(artifacts, listener),
            Action::ForEachPolarisation(a) => a.perform(artifacts, listener),
            Action::FrequencySelection(a) => a.perform(artifacts, listener),
            Action::Iteration(a) => a.perform(artifacts, listener),
            Action::SetFlagging(a) => a.perform(artifacts, listener),
            Action::SlidingWindowFit(a) => a.perform(artifacts, listener),
            Action::StatisticalFlag(a) => a.perform(artifacts, listener),
            Action::SumThreshold(a) => a.perform(artifacts, listener),
            Action::TimeSelection(a) => a.perform(artifacts, listener),
            Action::WriteFlags(a) => a.perform(artifacts, listener),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ChangeResolution(_) => ActionKind::ChangeResolution,
            Action::CombineFlagResults(_) => ActionKind::CombineFlagResults,
            Action::ForEachBaseline(_) => ActionKind::ForEachBaseline,
            Action::ForEachComplexComponent(_) => ActionKind::ForEachComplexComponent,
            Action::ForEachPolarisation(_) => ActionKind::ForEachPolarisation,
            Action::FrequencySelection(_) => ActionKind::FrequencySelection,
            Action::Iteration(_) => ActionKind::Iteration,
            Action::SetFlagging(_) => ActionKind::SetFlagging,
            Action::SlidingWindowFit(_) => ActionKind::SlidingWindowFit,
            Action::StatisticalFlag(_) => ActionKind::StatisticalFlag,
            Action::SumThreshold(_) => ActionKind::SumThreshold,
            Action::TimeSelection(_) => ActionKind::TimeSelection,
            Action::WriteFlags(_) => ActionKind::WriteFlags,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Action::ForEachPolarisation(a) => a.description(),
            Action::ForEachComplexComponent(a) => a.description(),
            Action::SetFlagging(a) => a.description(),
            other => other.kind().to_string(),
        }
    }

    /// The relative amount of work this node represents, for progress
    /// accounting.
    pub fn weight(&self) -> usize {
        match self {
            Action::ChangeResolution(a) => a.children.weight(),
            Action::CombineFlagResults(a) => a.children.weight(),
            Action::ForEachBaseline(a) => a.children.weight(),
            Action::ForEachComplexComponent(a) => a.children.weight(),
            Action::ForEachPolarisation(a) => a.children.weight(),
            Action::Iteration(a) => a.iteration_count.max(1) * a.children.weight(),
            _ => 1,
        }
    }

    /// The child block of a container action.
    pub fn child_block(&self) -> Option<&ActionBlock> {
        match self {
            Action::ChangeResolution(a) => Some(&a.children),
            Action::CombineFlagResults(a) => Some(&a.children),
            Action::ForEachBaseline(a) => Some(&a.children),
            Action::ForEachComplexComponent(a) => Some(&a.children),
            Action::ForEachPolarisation(a) => Some(&a.children),
            Action::Iteration(a) => Some(&a.children),
            _ => None,
        }
    }

    pub fn child_block_mut(&mut self) -> Option<&mut ActionBlock> {
        match self {
            Action::ChangeResolution(a) => Some(&mut a.children),
            Action::CombineFlagResults(a) => Some(&mut a.children),
            Action::ForEachBaseline(a) => Some(&mut a.children),
            Action::ForEachComplexComponent(a) => Some(&mut a.children),
            Action::ForEachPolarisation(a) => Some(&mut a.children),
            Action::Iteration(a) => Some(&mut a.children),
            _ => None,
        }
    }

    /// Drains any buffered output this node (or its children) holds, e.g.
    /// queued flags awaiting write-back.
    pub fn sync(&self) -> Result<(), StrategyError> {
        if let Action::WriteFlags(a) = self {
            a.finish()?;
        }
        if let Some(block) = self.child_block() {
            for child in block.children() {
                child.sync()?;
            }
        }
        Ok(())
    }
}

/// An ordered sequence of owned child actions, executed sequentially against
/// the same artifact set.
#[derive(Default)]
pub struct ActionBlock {
    children: Vec<Action>,
}

impl ActionBlock {
    pub fn new() -> ActionBlock {
        ActionBlock::default()
    }

    pub fn add(&mut self, action: Action) {
        self.children.push(action);
    }

    pub fn children(&self) -> &[Action] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Action] {
        &mut self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn weight(&self) -> usize {
        let weight: usize = self.children.iter().map(Action::weight).sum();
        weight.max(1)
    }

    /// Runs every child in order, wrapping each in a balanced pair of
    /// progress events.
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            listener.on_start_task(child.kind(), i, count, &child.description(), child.weight());
            let result = child.perform(artifacts, listener);
            listener.on_end_task(child.kind());
            result?;
        }
        Ok(())
    }
}

impl FromIterator<Action> for ActionBlock {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> ActionBlock {
        ActionBlock {
            children: iter.into_iter().collect(),
        }
    }
}

/// The root of an action tree. Performing a strategy runs its children and
/// then drains every buffered flag writer in the tree, so all flags are
/// persisted when it returns.
#[derive(Default)]
pub struct Strategy {
    pub children: ActionBlock,
}

impl Strategy {
    pub fn new() -> Strategy {
        Strategy::default()
    }

    pub fn add(&mut self, action: Action) {
        self.children.add(action);
    }

    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        let result = self.children.perform(artifacts, listener);
        // Even a failed run must not leave flags stuck in a write buffer.
        let sync_result = self.sync_all();
        result.and(sync_result)
    }

    /// Drains every buffered writer in the tree.
    pub fn sync_all(&self) -> Result<(), StrategyError> {
        for child in self.children.children() {
            child.sync()?;
        }
        Ok(())
    }
}
