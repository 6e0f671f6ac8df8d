// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Small masked statistics used by the channel/time-step selection actions.
//! "Missing" samples are carried as NaN and ignored.

use ndarray::ArrayView2;

/// The RMS of a row's unflagged samples; NaN when every sample is flagged.
pub fn masked_row_rms(image: &ArrayView2<f32>, mask: &ArrayView2<bool>, y: usize) -> f32 {
    masked_rms(
        (0..image.ncols()).map(|x| (image[(y, x)], mask[(y, x)])),
    )
}

/// The RMS of a column's unflagged samples; NaN when every sample is
/// flagged.
pub fn masked_column_rms(image: &ArrayView2<f32>, mask: &ArrayView2<bool>, x: usize) -> f32 {
    masked_rms(
        (0..image.nrows()).map(|y| (image[(y, x)], mask[(y, x)])),
    )
}

fn masked_rms(samples: impl Iterator<Item = (f32, bool)>) -> f32 {
    let mut sum_sq = 0.0_f64;
    let mut n = 0_u64;
    for (value, flagged) in samples {
        if !flagged {
            sum_sq += f64::from(value) * f64::from(value);
            n += 1;
        }
    }
    if n == 0 {
        f32::NAN
    } else {
        ((sum_sq / n as f64).sqrt()) as f32
    }
}

/// The median of the non-NaN values; NaN when there are none.
pub fn median_ignoring_nan(values: &[f32]) -> f32 {
    let mut present: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return f32::NAN;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 1 {
        present[mid]
    } else {
        0.5 * (present[mid - 1] + present[mid])
    }
}

/// The standard deviation of the non-NaN values around `centre`; NaN when
/// there are none.
pub fn stddev_ignoring_nan(values: &[f32], centre: f32) -> f32 {
    let mut sum_sq = 0.0_f64;
    let mut n = 0_u64;
    for &value in values.iter().filter(|v| !v.is_nan()) {
        let d = f64::from(value - centre);
        sum_sq += d * d;
        n += 1;
    }
    if n == 0 {
        f32::NAN
    } else {
        ((sum_sq / n as f64).sqrt()) as f32
    }
}
