// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Morphological mask cleanup: fixed-radius dilation and density-based
//! line/grid flagging.

use ndarray::Array2;

/// Dilates flags along the time axis: a sample becomes flagged when any
/// sample within `size` steps of it is flagged. `size == 0` is the identity.
pub fn dilate_horizontally(mask: &mut Array2<bool>, size: usize) {
    if size == 0 {
        return;
    }
    let (height, width) = mask.dim();
    for y in 0..height {
        // Distance to the nearest flag, capped just beyond the radius.
        let far = size + 1;
        let mut distance = vec![far; width];
        let mut d = far;
        for x in 0..width {
            d = if mask[(y, x)] { 0 } else { (d + 1).min(far) };
            distance[x] = d;
        }
        d = far;
        for x in (0..width).rev() {
            d = if mask[(y, x)] { 0 } else { (d + 1).min(far) };
            distance[x] = distance[x].min(d);
        }
        for x in 0..width {
            mask[(y, x)] = distance[x] <= size;
        }
    }
}

/// Dilates flags along the frequency axis; see [`dilate_horizontally`].
pub fn dilate_vertically(mask: &mut Array2<bool>, size: usize) {
    if size == 0 {
        return;
    }
    let (height, width) = mask.dim();
    for x in 0..width {
        let far = size + 1;
        let mut distance = vec![far; height];
        let mut d = far;
        for y in 0..height {
            d = if mask[(y, x)] { 0 } else { (d + 1).min(far) };
            distance[y] = d;
        }
        d = far;
        for y in (0..height).rev() {
            d = if mask[(y, x)] { 0 } else { (d + 1).min(far) };
            distance[y] = distance[y].min(d);
        }
        for y in 0..height {
            mask[(y, x)] = distance[y] <= size;
        }
    }
}

/// Dilates in both directions.
pub fn dilate(mask: &mut Array2<bool>, time_size: usize, frequency_size: usize) {
    dilate_horizontally(mask, time_size);
    dilate_vertically(mask, frequency_size);
}

/// Flags every whole row (frequency channel) in which fewer than
/// `minimum_good_ratio` of the samples are still unflagged.
pub fn flag_depleted_rows(mask: &mut Array2<bool>, minimum_good_ratio: f64) {
    let (height, width) = mask.dim();
    for y in 0..height {
        let count = (0..width).filter(|&x| mask[(y, x)]).count();
        if count as f64 > width as f64 * (1.0 - minimum_good_ratio) {
            for x in 0..width {
                mask[(y, x)] = true;
            }
        }
    }
}

/// Flags every whole column (time step) in which fewer than
/// `minimum_good_ratio` of the samples are still unflagged.
pub fn flag_depleted_columns(mask: &mut Array2<bool>, minimum_good_ratio: f64) {
    let (height, width) = mask.dim();
    for x in 0..width {
        let count = (0..height).filter(|&y| mask[(y, x)]).count();
        if count as f64 > height as f64 * (1.0 - minimum_good_ratio) {
            for y in 0..height {
                mask[(y, x)] = true;
            }
        }
    }
}

/// Flags the entire grid once its overall flagged fraction leaves less than
/// `minimum_good_ratio` of the data usable, the give-up valve for
/// pathological baselines.
pub fn flag_depleted_grid(mask: &mut Array2<bool>, minimum_good_ratio: f64) {
    let total = mask.len();
    let count = mask.iter().filter(|&&f| f).count();
    if count as f64 > total as f64 * (1.0 - minimum_good_ratio) {
        mask.fill(true);
    }
}
