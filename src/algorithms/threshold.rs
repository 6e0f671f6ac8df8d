// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The combinatorial thresholding schedule: a geometric sequence of window
//! lengths with a per-length base threshold derived from a single
//! first-threshold value, scaled per image by a Rayleigh-distribution mode
//! estimate of the noise.

use ndarray::{Array2, ArrayView2};

use super::sumthreshold;

/// The default window lengths swept per direction.
pub const DEFAULT_LENGTHS: [usize; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];

/// Per-length threshold falloff; longer windows get proportionally lower
/// thresholds so extended weak interference is still caught.
const LENGTH_FALLOFF: f32 = 1.5;

/// The base threshold for a window of `length` samples, before noise and
/// sensitivity scaling.
pub fn base_threshold(first_threshold: f32, length: usize) -> f32 {
    first_threshold * LENGTH_FALLOFF.powf((length as f32).log2()) / length as f32
}

/// The mode of a Rayleigh-distributed sample set: `sqrt(Σv²/2n)` over
/// unflagged finite samples. Returns zero for a fully flagged image.
pub fn rayleigh_mode(image: &ArrayView2<f32>, mask: &ArrayView2<bool>) -> f32 {
    let mut sum_sq = 0.0_f64;
    let mut n = 0_u64;
    for (&value, &flagged) in image.iter().zip(mask.iter()) {
        if !flagged && value.is_finite() {
            sum_sq += f64::from(value) * f64::from(value);
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        (sum_sq / (2.0 * n as f64)).sqrt() as f32
    }
}

/// One direction-and-length pass of the schedule.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdOperation {
    pub length: usize,
    pub threshold: f32,
}

/// A fully resolved schedule: the horizontal passes, then the vertical
/// passes, each with its precomputed base threshold.
#[derive(Debug, Clone, Default)]
pub struct ThresholdSchedule {
    pub horizontal_operations: Vec<ThresholdOperation>,
    pub vertical_operations: Vec<ThresholdOperation>,
}

impl ThresholdSchedule {
    /// The default schedule seeded from a first-threshold value, in the
    /// requested directions.
    pub fn new(first_threshold: f32, horizontal: bool, vertical: bool) -> ThresholdSchedule {
        let operations: Vec<ThresholdOperation> = DEFAULT_LENGTHS
            .iter()
            .map(|&length| ThresholdOperation {
                length,
                threshold: base_threshold(first_threshold, length),
            })
            .collect();
        ThresholdSchedule {
            horizontal_operations: if horizontal {
                operations.clone()
            } else {
                vec![]
            },
            vertical_operations: if vertical { operations } else { vec![] },
        }
    }

    /// Runs every pass of the schedule against `mask`, with each base
    /// threshold multiplied by `factor` (noise mode × sensitivity). Flags
    /// accumulate into the given mask.
    pub fn execute(&self, image: &ArrayView2<f32>, mask: &mut Array2<bool>, factor: f32) {
        let mut scratch = mask.clone();
        for op in &self.horizontal_operations {
            sumthreshold::horizontal(
                image.view(),
                mask,
                &mut scratch,
                op.length,
                op.threshold * factor,
            );
        }
        for op in &self.vertical_operations {
            sumthreshold::vertical(
                image.view(),
                mask,
                &mut scratch,
                op.length,
                op.threshold * factor,
            );
        }
    }
}
