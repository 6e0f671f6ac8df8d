// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use super::actions::*;
use super::*;
use crate::grid::{count_flagged, filled_mask, zero_image, Image2D};
use crate::imagesets::{ImageSet, ImageSetHandle, SyntheticImageSet};
use crate::rng::Rng;
use crate::tfdata::{ComplexRepresentation, Polarisation, TimeFrequencyData};

/// Counts start/end pairs and exceptions; fails nothing by itself.
#[derive(Default)]
struct RecordingListener {
    starts: AtomicUsize,
    ends: AtomicUsize,
    exceptions: AtomicUsize,
    descriptions: Mutex<Vec<String>>,
}

impl ProgressListener for RecordingListener {
    fn on_start_task(&self, _: ActionKind, _: usize, _: usize, description: &str, _: usize) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.descriptions
            .lock()
            .unwrap()
            .push(description.to_string());
    }

    fn on_end_task(&self, _: ActionKind) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn on_progress(&self, _: ActionKind, _: usize, _: usize) {}

    fn on_exception(&self, _: ActionKind, _: &StrategyError) {
        self.exceptions.fetch_add(1, Ordering::SeqCst);
    }
}

fn noise_image(width: usize, height: usize, seed: u64) -> Image2D {
    let mut rng = Rng::new(seed);
    Array2::from_shape_fn((height, width), |_| rng.gaussian() as f32).into_shared()
}

fn complex_dipole_artifacts(width: usize, height: usize) -> ArtifactSet {
    let mut data = TimeFrequencyData::complex_dipole([
        (noise_image(width, height, 1), noise_image(width, height, 2)),
        (noise_image(width, height, 3), noise_image(width, height, 4)),
        (noise_image(width, height, 5), noise_image(width, height, 6)),
        (noise_image(width, height, 7), noise_image(width, height, 8)),
    ])
    .unwrap();
    data.set_masks_to(false);
    artifacts_from(data)
}

fn artifacts_from(data: TimeFrequencyData) -> ArtifactSet {
    let mut artifacts = ArtifactSet::new();
    artifacts.set_original(data.clone());
    let mut revised = data.clone();
    revised.set_images_to_zero();
    artifacts.set_revised(revised);
    artifacts.set_contaminated(data);
    artifacts
}

#[test]
fn test_action_kind_name_table() {
    assert_eq!(ActionKind::SumThreshold.to_string(), "SumThreshold");
    assert_eq!(
        ActionKind::from_str("For each polarisation").unwrap(),
        ActionKind::ForEachPolarisation
    );
    assert_eq!(
        ActionKind::from_str("Change resolution").unwrap(),
        ActionKind::ChangeResolution
    );
    assert!(ActionKind::from_str("No such action").is_err());

    // Every kind's name maps back to the kind.
    use strum::IntoEnumIterator;
    for kind in ActionKind::iter() {
        assert_eq!(ActionKind::from_str(&kind.to_string()).unwrap(), kind);
    }
}

#[test]
fn test_baseline_selection_current_runs_children_once() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    let mut action = ForEachBaselineAction {
        selection: BaselineSelection::Current,
        ..ForEachBaselineAction::default()
    };
    action.children.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    }));
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        32
    );
}

#[test]
fn test_block_runs_children_in_order_with_balanced_events() {
    let mut artifacts = complex_dipole_artifacts(16, 8);
    let mut block = ActionBlock::new();
    block.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    }));
    block.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::None,
    }));

    let listener = RecordingListener::default();
    block.perform(&mut artifacts, &listener).unwrap();

    // Last action wins: flags cleared again.
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        0
    );
    assert_eq!(listener.starts.load(Ordering::SeqCst), 2);
    assert_eq!(listener.ends.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_flagging_modes() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    let listener = DummyProgressListener;

    let everything = SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    };
    everything.perform(&mut artifacts, &listener).unwrap();
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        32
    );

    let invert = SetFlaggingAction {
        new_flagging: NewFlagging::Invert,
    };
    invert.perform(&mut artifacts, &listener).unwrap();
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        0
    );

    // Flag the original, then restore from it.
    artifacts.original_mut().set_masks_to(true);
    let from_original = SetFlaggingAction {
        new_flagging: NewFlagging::FromOriginal,
    };
    from_original.perform(&mut artifacts, &listener).unwrap();
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        32
    );
}

#[test]
fn test_set_flagging_flag_zeros() {
    let mut image = noise_image(8, 4, 9).to_owned();
    image[(1, 3)] = 0.0;
    image[(2, 7)] = 0.0;
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        image.into_shared(),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    let flag_zeros = SetFlaggingAction {
        new_flagging: NewFlagging::FlagZeros,
    };
    flag_zeros
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();
    let mask = artifacts.contaminated().single_mask();
    assert_eq!(count_flagged(&mask.view()), 2);
    assert_eq!(mask[(1, 3)], true);
    assert_eq!(mask[(2, 7)], true);
}

#[test]
fn test_set_flagging_needs_a_baseline() {
    let mut artifacts = ArtifactSet::new();
    let action = SetFlaggingAction::default();
    assert!(matches!(
        action.perform(&mut artifacts, &DummyProgressListener),
        Err(StrategyError::NoBaselineLoaded)
    ));
}

#[test]
fn test_for_each_polarisation_slices_and_restores() {
    let mut artifacts = complex_dipole_artifacts(16, 8);
    let mut block = ForEachPolarisationBlock::default();
    block.children.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    }));

    let listener = RecordingListener::default();
    block.perform(&mut artifacts, &listener).unwrap();

    // Restored to the full four-polarisation view, with every
    // polarisation's mask updated by the per-polarisation run.
    assert_eq!(artifacts.contaminated().polarisation_count(), 4);
    for i in 0..4 {
        assert_eq!(
            count_flagged(&artifacts.contaminated().mask(i).unwrap().view()),
            16 * 8
        );
    }
    // One event pair per polarisation plus one per executed child.
    assert_eq!(listener.starts.load(Ordering::SeqCst), 8);
    assert_eq!(listener.ends.load(Ordering::SeqCst), 8);
    let descriptions = listener.descriptions.lock().unwrap();
    assert!(descriptions.iter().any(|d| d.contains("XX")));
    assert!(descriptions.iter().any(|d| d.contains("YY")));
}

#[test]
fn test_for_each_polarisation_selects_a_subset() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    let mut block = ForEachPolarisationBlock {
        on_xy: false,
        on_yx: false,
        ..ForEachPolarisationBlock::default()
    };
    block.children.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    }));
    block
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    // XX and YY were flagged; the cross hands stayed clean.
    assert_eq!(
        count_flagged(&artifacts.contaminated().mask(0).unwrap().view()),
        32
    );
    assert_eq!(
        count_flagged(&artifacts.contaminated().mask(1).unwrap().view()),
        0
    );
    assert_eq!(
        count_flagged(&artifacts.contaminated().mask(2).unwrap().view()),
        0
    );
    assert_eq!(
        count_flagged(&artifacts.contaminated().mask(3).unwrap().view()),
        32
    );
}

#[test]
fn test_for_each_polarisation_stokes_iteration_ors_masks() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    let mut block = ForEachPolarisationBlock::stokes_only(true, true, true, true);
    block.children.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::Everything,
    }));
    block
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    assert_eq!(artifacts.contaminated().polarisation_count(), 4);
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        32
    );
}

#[test]
fn test_for_each_polarisation_rejects_mismatched_slots() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    let single = artifacts.contaminated().make_polarisation_index(0);
    artifacts.set_original(single);
    let block = ForEachPolarisationBlock::default();
    assert!(matches!(
        block.perform(&mut artifacts, &DummyProgressListener),
        Err(StrategyError::IncompatiblePolarisations)
    ));
}

#[test]
fn test_for_each_complex_component_on_real_preserves_imaginary() {
    let mut artifacts = complex_dipole_artifacts(16, 8);
    let original_imag = artifacts.contaminated().image(1).unwrap();
    let original_real = artifacts.contaminated().image(0).unwrap();

    let mut action = ForEachComplexComponentAction {
        on_amplitude: false,
        on_phase: false,
        on_real: true,
        on_imaginary: false,
        ..ForEachComplexComponentAction::default()
    };
    // The child blurs the contaminated images, so the real part changes.
    action
        .children
        .add(Action::ChangeResolution(ChangeResolutionAction {
            time_decrease_factor: 2,
            restore_contaminated: true,
            restore_revised: false,
            ..ChangeResolutionAction::default()
        }));
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    assert_eq!(
        artifacts.contaminated().representation(),
        Some(ComplexRepresentation::Complex)
    );
    // Imaginary part untouched, bit for bit; real part modified.
    assert_eq!(artifacts.contaminated().image(1).unwrap(), original_imag);
    assert_ne!(artifacts.contaminated().image(0).unwrap(), original_real);
}

#[test]
fn test_for_each_complex_component_amplitude_restore_round_trip() {
    let width = 8;
    let height = 4;
    // re = im means the amplitude is |re|·√2; the 1/√2 restore brings the
    // duplicated amplitude back to the same magnitude.
    let base = noise_image(width, height, 11);
    let mut data = TimeFrequencyData::complex_single(
        Polarisation::StokesI,
        base.clone(),
        base.clone(),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    let action = ForEachComplexComponentAction::amplitude_restoring();
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    let rebuilt = artifacts.contaminated();
    assert_eq!(
        rebuilt.representation(),
        Some(ComplexRepresentation::Complex)
    );
    for (restored, original) in rebuilt.image(0).unwrap().iter().zip(base.iter()) {
        assert_abs_diff_eq!(*restored, original.abs(), epsilon = 1e-5);
    }
}

#[test]
fn test_iteration_sensitivity_series() {
    let block = IterationBlock {
        iteration_count: 4,
        sensitivity_start: 16.0,
        children: ActionBlock::new(),
    };
    let series = block.sensitivities();
    assert_eq!(series.len(), 4);
    assert_abs_diff_eq!(series[0], 16.0);
    assert_abs_diff_eq!(series[1], 8.0, epsilon = 1e-12);
    assert_abs_diff_eq!(series[2], 4.0, epsilon = 1e-12);
    // The last pass lands on start^(1/n).
    assert_abs_diff_eq!(series[3], 2.0, epsilon = 1e-12);
}

#[test]
fn test_iteration_restores_the_surrounding_sensitivity() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    artifacts.set_sensitivity(2.5);
    let mut block = IterationBlock {
        iteration_count: 3,
        sensitivity_start: 9.0,
        children: ActionBlock::new(),
    };
    block.children.add(Action::SetFlagging(SetFlaggingAction {
        new_flagging: NewFlagging::None,
    }));
    block
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();
    assert_abs_diff_eq!(artifacts.sensitivity(), 2.5);
}

#[test]
fn test_change_resolution_restores_masks_by_replication() {
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        zero_image(12, 6),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    // The child flags one coarse time step.
    struct_flag_coarse_column(&mut artifacts);

    let mask = artifacts.contaminated().single_mask();
    // Columns 3..6 at full resolution come from coarse column 1.
    for x in 0..12 {
        let expected = (3..6).contains(&x);
        for y in 0..6 {
            assert_eq!(mask[(y, x)], expected, "x={x} y={y}");
        }
    }
}

/// Runs a change-resolution action (factor 3, masks restored) whose child
/// flags coarse time step 1 via a frequency-selection-like direct edit.
fn struct_flag_coarse_column(artifacts: &mut ArtifactSet) {
    // Put an enormous value into coarse column 1 and let time selection
    // flag that time step at the coarse level.
    let mut image = artifacts.contaminated().image(0).unwrap().to_owned();
    for y in 0..image.nrows() {
        for x in 3..6 {
            image[(y, x)] = 1000.0;
        }
    }
    let mut data = artifacts.contaminated().clone();
    data.set_image(0, image.into_shared()).unwrap();
    artifacts.set_contaminated(data.clone());
    artifacts.set_original(data);

    let mut action = ChangeResolutionAction {
        time_decrease_factor: 3,
        restore_revised: false,
        restore_contaminated: false,
        restore_masks: true,
        ..ChangeResolutionAction::default()
    };
    action
        .children
        .add(Action::TimeSelection(TimeSelectionAction { threshold: 1.5 }));
    action
        .perform(artifacts, &DummyProgressListener)
        .unwrap();
}

#[test]
fn test_change_resolution_turns_contaminated_into_a_residual() {
    // A smooth background: the fitted revised data subtracts away and the
    // contaminated slot ends up near zero.
    let image = Array2::from_elem((12, 24), 5.0_f32).into_shared();
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        image,
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    let mut action = ChangeResolutionAction {
        time_decrease_factor: 3,
        restore_revised: true,
        use_mask_in_averaging: true,
        ..ChangeResolutionAction::default()
    };
    action
        .children
        .add(Action::SlidingWindowFit(SlidingWindowFitAction::default()));
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    for v in artifacts.contaminated().image(0).unwrap().iter() {
        assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-4);
    }
    for v in artifacts.revised().image(0).unwrap().iter() {
        assert_abs_diff_eq!(*v, 5.0, epsilon = 1e-4);
    }
}

#[test]
fn test_frequency_selection_flags_a_hot_channel() {
    let mut image = noise_image(64, 32, 5).to_owned();
    for x in 0..64 {
        image[(10, x)] += 50.0;
    }
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        image.into_shared(),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    let action = FrequencySelectionAction {
        threshold: 3.0,
        ..FrequencySelectionAction::default()
    };
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    let mask = artifacts.contaminated().single_mask();
    for x in 0..64 {
        assert_eq!(mask[(10, x)], true);
    }
    // The clean channels must mostly survive.
    let occupancy = count_flagged(&mask.view()) as f64 / mask.len() as f64;
    assert!(occupancy < 0.3, "{occupancy:.2} of all samples flagged");
}

#[test]
fn test_time_selection_flags_a_bad_time_step() {
    let mut image = noise_image(64, 16, 6).to_owned();
    for y in 0..16 {
        image[(y, 20)] += 50.0;
    }
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        image.into_shared(),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    TimeSelectionAction::default()
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    let mask = artifacts.contaminated().single_mask();
    for y in 0..16 {
        assert_eq!(mask[(y, 20)], true);
    }
    let occupancy = count_flagged(&mask.view()) as f64 / mask.len() as f64;
    assert!(occupancy < 0.3, "{occupancy:.2} of all samples flagged");
}

#[test]
fn test_statistical_flag_extends_and_gives_up() {
    // A mostly flagged grid trips the give-up ceiling.
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        zero_image(10, 10),
    )
    .unwrap();
    let mut mask = filled_mask(10, 10, false);
    for y in 0..10 {
        for x in 0..8 {
            mask[(y, x)] = true;
        }
    }
    data.set_global_mask(mask);
    let mut artifacts = artifacts_from(data);

    let action = StatisticalFlagAction {
        min_available_tf_ratio: 0.5,
        ..StatisticalFlagAction::default()
    };
    action
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();
    assert_eq!(
        count_flagged(&artifacts.contaminated().single_mask().view()),
        100
    );
}

#[test]
fn test_combine_flag_results_ors_child_masks() {
    let mut image = noise_image(64, 32, 7).to_owned();
    for x in 0..64 {
        image[(3, x)] += 50.0;
    }
    for y in 0..32 {
        image[(y, 40)] += 50.0;
    }
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        image.into_shared(),
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    let mut combine = CombineFlagResults::default();
    combine
        .children
        .add(Action::FrequencySelection(FrequencySelectionAction {
            threshold: 4.0,
            ..FrequencySelectionAction::default()
        }));
    combine
        .children
        .add(Action::TimeSelection(TimeSelectionAction { threshold: 4.0 }));
    combine
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    let mask = artifacts.contaminated().single_mask();
    assert_eq!(mask[(3, 0)], true, "hot channel from the first child");
    assert_eq!(mask[(0, 40)], true, "bad time step from the second child");
}

#[test]
fn test_set_thread_count_walks_the_tree() {
    let setup = DefaultStrategySetup::default();
    let mut strategy = setup.full_strategy(BaselineSelection::CrossCorrelations, 1);
    set_thread_count(&mut strategy, 7);

    fn find(block: &ActionBlock, found: &mut (Option<usize>, Option<usize>, Option<usize>)) {
        for action in block.children() {
            match action {
                Action::ForEachBaseline(a) => found.0 = Some(a.thread_count),
                Action::WriteFlags(a) => {
                    found.1 = Some(a.max_buffer_items);
                    found.2 = Some(a.min_buffer_items_for_writing);
                }
                _ => {}
            }
            if let Some(children) = action.child_block() {
                find(children, found);
            }
        }
    }
    let mut found = (None, None, None);
    find(&strategy.children, &mut found);
    assert_eq!(found.0, Some(7));
    assert_eq!(found.1, Some(35));
    assert_eq!(found.2, Some(28));
}

#[test]
fn test_full_strategy_flags_synthetic_rfi_and_writes_back() {
    let set = SyntheticImageSet::new(3, 60, 32, 99);
    let rfi_channel = set.rfi_channel();
    let cross_baselines: Vec<usize> = (0..set.baseline_count())
        .filter(|&i| {
            let (a1, a2) = set.antennas_of(i).unwrap();
            a1 != a2
        })
        .collect();
    let concrete = Arc::new(Mutex::new(set));
    let handle: ImageSetHandle = concrete.clone();

    let strategy =
        DefaultStrategySetup::default().full_strategy(BaselineSelection::CrossCorrelations, 2);
    let mut artifacts = ArtifactSet::with_image_set(handle);
    let listener = RecordingListener::default();
    strategy.perform(&mut artifacts, &listener).unwrap();

    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 0);
    assert_eq!(
        listener.starts.load(Ordering::SeqCst),
        listener.ends.load(Ordering::SeqCst),
        "start/end events must balance"
    );

    let set = concrete.lock().unwrap();
    for &baseline in &cross_baselines {
        let description = format!("baseline {baseline}");
        let masks = set
            .stored_flags(baseline)
            .unwrap_or_else(|| panic!("flags were not written for {description}"));
        let mask = &masks[0];
        let width = mask.ncols();
        // The persistent transmitter channel must be fully flagged.
        let flagged_in_channel = (0..width).filter(|&x| mask[(rfi_channel, x)]).count();
        assert!(
            flagged_in_channel == width,
            "{description}: only {flagged_in_channel}/{width} transmitter samples flagged"
        );
        // Sanity ceiling: the strategy must not flag most of the data.
        let occupancy = count_flagged(&mask.view()) as f64 / mask.len() as f64;
        assert!(
            occupancy < 0.5,
            "{description}: {occupancy:.2} of all samples flagged"
        );
    }
}

#[test]
fn test_failing_baseline_is_skipped_not_fatal() {
    /// Wraps the synthetic set but refuses to load one baseline.
    struct OneBadBaseline {
        inner: SyntheticImageSet,
        bad: usize,
    }
    impl crate::imagesets::ImageSet for OneBadBaseline {
        fn description(&self) -> String {
            self.inner.description()
        }
        fn baseline_count(&self) -> usize {
            self.inner.baseline_count()
        }
        fn antennas_of(&self, index: usize) -> Result<(usize, usize), crate::imagesets::ImageSetError> {
            self.inner.antennas_of(index)
        }
        fn load(
            &mut self,
            index: usize,
        ) -> Result<crate::imagesets::BaselineData, crate::imagesets::ImageSetError> {
            if index == self.bad {
                Err(crate::imagesets::ImageSetError::NoSuchBaseline {
                    index,
                    count: self.baseline_count(),
                })
            } else {
                self.inner.load(index)
            }
        }
        fn store_flags(
            &mut self,
            index: usize,
            masks: vec1::Vec1<crate::grid::Mask2D>,
        ) -> Result<(), crate::imagesets::ImageSetError> {
            self.inner.store_flags(index, masks)
        }
    }

    let inner = SyntheticImageSet::new(3, 24, 16, 5);
    let bad = 1;
    let concrete = Arc::new(Mutex::new(OneBadBaseline { inner, bad }));
    let handle: ImageSetHandle = concrete.clone();

    let strategy =
        DefaultStrategySetup::default().full_strategy(BaselineSelection::CrossCorrelations, 2);
    let mut artifacts = ArtifactSet::with_image_set(handle);
    let listener = RecordingListener::default();
    strategy.perform(&mut artifacts, &listener).unwrap();

    assert_eq!(listener.exceptions.load(Ordering::SeqCst), 1);
    let set = concrete.lock().unwrap();
    // The other cross-correlations still went through.
    let written = (0..set.baseline_count())
        .filter(|&i| {
            let (a1, a2) = set.antennas_of(i).unwrap();
            a1 != a2 && i != bad
        })
        .all(|i| set.inner.stored_flags(i).is_some());
    assert!(written);
}

#[test]
fn test_write_flags_needs_an_image_set() {
    let mut artifacts = complex_dipole_artifacts(8, 4);
    artifacts.set_baseline_index(0);
    let action = WriteFlagsAction::default();
    assert!(matches!(
        action.perform(&mut artifacts, &DummyProgressListener),
        Err(StrategyError::NoImageSet)
    ));
}

#[test]
fn test_sum_threshold_action_flags_transmitter_in_amplitude_data() {
    let width = 64;
    let height = 32;
    let mut re = noise_image(width, height, 21).to_owned();
    let im = noise_image(width, height, 22);
    for x in 0..width {
        re[(12, x)] += 30.0;
    }
    let mut data = TimeFrequencyData::complex_single(
        Polarisation::StokesI,
        re.into_shared(),
        im,
    )
    .unwrap();
    data.set_masks_to(false);
    let mut artifacts = artifacts_from(data);

    // Work on the amplitude like the default strategy does.
    let mut on_amplitude = ForEachComplexComponentAction::amplitude_restoring();
    on_amplitude
        .children
        .add(Action::SumThreshold(SumThresholdAction::default()));
    on_amplitude
        .perform(&mut artifacts, &DummyProgressListener)
        .unwrap();

    let mask = artifacts.contaminated().single_mask();
    let flagged_in_channel = (0..width).filter(|&x| mask[(12, x)]).count();
    assert!(
        flagged_in_channel > width / 2,
        "only {flagged_in_channel}/{width} transmitter samples flagged"
    );
}
