// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::Array2;

use crate::strategy::{ArtifactSet, ProgressListener, StrategyError};

/// Estimates the smooth background of the contaminated data with a
/// flag-aware sliding-window average and stores it in the revised slot. A
/// surrounding change-resolution action subtracts the (upsampled) revised
/// data from the contaminated data, leaving the residual for the threshold
/// actions.
pub struct SlidingWindowFitAction {
    /// Full window extent in time steps.
    pub window_width: usize,
    /// Full window extent in frequency channels.
    pub window_height: usize,
}

impl Default for SlidingWindowFitAction {
    fn default() -> SlidingWindowFitAction {
        SlidingWindowFitAction {
            window_width: 10,
            window_height: 15,
        }
    }
}

impl SlidingWindowFitAction {
    pub fn perform(
        &self,
        artifacts: &mut ArtifactSet,
        _listener: &dyn ProgressListener,
    ) -> Result<(), StrategyError> {
        if artifacts.contaminated().is_empty() {
            return Err(StrategyError::NoBaselineLoaded);
        }
        let image = artifacts.contaminated().single_image()?;
        let mask = artifacts.contaminated().single_mask();
        let fit = sliding_window_average(
            &image.to_owned(),
            &mask.to_owned(),
            self.window_width.max(1),
            self.window_height.max(1),
        )
        .into_shared();

        // The fit is shared by every image plane of the revised data, so
        // that subtracting revised from contaminated is structurally valid.
        let mut revised = artifacts.contaminated().clone();
        for i in 0..revised.image_count() {
            revised.set_image(i, fit.clone())?;
        }
        artifacts.set_revised(revised);
        Ok(())
    }
}

/// The masked boxcar average around each sample. Windows without any
/// unflagged sample fall back to the plain average, keeping the background
/// finite.
fn sliding_window_average(
    image: &Array2<f32>,
    mask: &Array2<bool>,
    window_width: usize,
    window_height: usize,
) -> Array2<f32> {
    let (height, width) = image.dim();

    // Summed-area tables over unflagged values, unflagged counts and all
    // values; one prefix row/column of zeros.
    let mut sum = Array2::<f64>::zeros((height + 1, width + 1));
    let mut count = Array2::<f64>::zeros((height + 1, width + 1));
    let mut sum_all = Array2::<f64>::zeros((height + 1, width + 1));
    for y in 0..height {
        for x in 0..width {
            let value = f64::from(image[(y, x)]);
            let (v, c) = if mask[(y, x)] { (0.0, 0.0) } else { (value, 1.0) };
            sum[(y + 1, x + 1)] = v + sum[(y, x + 1)] + sum[(y + 1, x)] - sum[(y, x)];
            count[(y + 1, x + 1)] = c + count[(y, x + 1)] + count[(y + 1, x)] - count[(y, x)];
            sum_all[(y + 1, x + 1)] =
                value + sum_all[(y, x + 1)] + sum_all[(y + 1, x)] - sum_all[(y, x)];
        }
    }
    let window = |table: &Array2<f64>, y0: usize, y1: usize, x0: usize, x1: usize| {
        table[(y1, x1)] - table[(y0, x1)] - table[(y1, x0)] + table[(y0, x0)]
    };

    let half_w = window_width / 2;
    let half_h = window_height / 2;
    Array2::from_shape_fn((height, width), |(y, x)| {
        let y0 = y.saturating_sub(half_h);
        let y1 = (y + half_h + 1).min(height);
        let x0 = x.saturating_sub(half_w);
        let x1 = (x + half_w + 1).min(width);
        let c = window(&count, y0, y1, x0, x1);
        if c > 0.0 {
            (window(&sum, y0, y1, x0, x1) / c) as f32
        } else {
            let n = ((y1 - y0) * (x1 - x0)) as f64;
            (window(&sum_all, y0, y1, x0, x1) / n) as f32
        }
    })
}
