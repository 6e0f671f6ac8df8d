// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The SumThreshold kernel.
//!
//! For one direction and one window length L, a running sum and a running
//! count of unflagged samples slide over each row (or column) one sample at
//! a time. A window whose unflagged average exceeds the threshold in
//! absolute value is marked entirely in a scratch mask; already-flagged
//! samples do not contribute to the average but are still re-marked. The
//! scratch mask swaps into the working mask after each length, so later
//! window lengths see the cumulative result of earlier ones.
//!
//! [`horizontal`] and [`vertical`] process four rows/columns per step with
//! per-lane accumulators, the layout the SIMD units want. Each lane runs the
//! same arithmetic in the same order as the plain per-line kernel, so the
//! lane and scalar variants produce bit-identical masks; a test asserts this
//! on randomised data.

use ndarray::{Array2, ArrayView2};

const LANES: usize = 4;

/// The time-direction kernel, lane variant.
pub fn horizontal(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > width {
        return;
    }
    scratch.assign(mask);

    let mut y = 0;
    while y + LANES <= height {
        let mut sum = [0.0_f32; LANES];
        let mut count = [0_u32; LANES];
        for x in 0..length - 1 {
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y + l, x)] {
                    *sum += input[(y + l, x)];
                    *count += 1;
                }
            }
        }
        let mut x_left = 0;
        for x_right in (length - 1)..width {
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y + l, x_right)] {
                    *sum += input[(y + l, x_right)];
                    *count += 1;
                }
            }
            for l in 0..LANES {
                if count[l] > 0 && (sum[l] / count[l] as f32).abs() > threshold {
                    for x in x_left..x_left + length {
                        scratch[(y + l, x)] = true;
                    }
                }
            }
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y + l, x_left)] {
                    *sum -= input[(y + l, x_left)];
                    *count -= 1;
                }
            }
            x_left += 1;
        }
        y += LANES;
    }
    // Remaining rows take the per-line path; each line's arithmetic is
    // identical either way.
    for y in y..height {
        horizontal_line(&input, mask, scratch, y, length, threshold);
    }

    std::mem::swap(mask, scratch);
}

/// The time-direction kernel, plain reference variant.
pub fn horizontal_scalar(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > width {
        return;
    }
    scratch.assign(mask);
    for y in 0..height {
        horizontal_line(&input, mask, scratch, y, length, threshold);
    }
    std::mem::swap(mask, scratch);
}

fn horizontal_line(
    input: &ArrayView2<f32>,
    mask: &Array2<bool>,
    scratch: &mut Array2<bool>,
    y: usize,
    length: usize,
    threshold: f32,
) {
    let width = mask.ncols();
    let mut sum = 0.0_f32;
    let mut count = 0_u32;
    for x in 0..length - 1 {
        if !mask[(y, x)] {
            sum += input[(y, x)];
            count += 1;
        }
    }
    let mut x_left = 0;
    for x_right in (length - 1)..width {
        if !mask[(y, x_right)] {
            sum += input[(y, x_right)];
            count += 1;
        }
        if count > 0 && (sum / count as f32).abs() > threshold {
            for x in x_left..x_left + length {
                scratch[(y, x)] = true;
            }
        }
        if !mask[(y, x_left)] {
            sum -= input[(y, x_left)];
            count -= 1;
        }
        x_left += 1;
    }
}

/// The frequency-direction kernel, lane variant.
pub fn vertical(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > height {
        return;
    }
    scratch.assign(mask);

    let mut x = 0;
    while x + LANES <= width {
        let mut sum = [0.0_f32; LANES];
        let mut count = [0_u32; LANES];
        for y in 0..length - 1 {
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y, x + l)] {
                    *sum += input[(y, x + l)];
                    *count += 1;
                }
            }
        }
        let mut y_top = 0;
        for y_bottom in (length - 1)..height {
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y_bottom, x + l)] {
                    *sum += input[(y_bottom, x + l)];
                    *count += 1;
                }
            }
            for l in 0..LANES {
                if count[l] > 0 && (sum[l] / count[l] as f32).abs() > threshold {
                    for y in y_top..y_top + length {
                        scratch[(y, x + l)] = true;
                    }
                }
            }
            for (l, (sum, count)) in sum.iter_mut().zip(count.iter_mut()).enumerate() {
                if !mask[(y_top, x + l)] {
                    *sum -= input[(y_top, x + l)];
                    *count -= 1;
                }
            }
            y_top += 1;
        }
        x += LANES;
    }
    for x in x..width {
        vertical_line(&input, mask, scratch, x, length, threshold);
    }

    std::mem::swap(mask, scratch);
}

/// The frequency-direction kernel, plain reference variant.
pub fn vertical_scalar(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > height {
        return;
    }
    scratch.assign(mask);
    for x in 0..width {
        vertical_line(&input, mask, scratch, x, length, threshold);
    }
    std::mem::swap(mask, scratch);
}

fn vertical_line(
    input: &ArrayView2<f32>,
    mask: &Array2<bool>,
    scratch: &mut Array2<bool>,
    x: usize,
    length: usize,
    threshold: f32,
) {
    let height = mask.nrows();
    let mut sum = 0.0_f32;
    let mut count = 0_u32;
    for y in 0..length - 1 {
        if !mask[(y, x)] {
            sum += input[(y, x)];
            count += 1;
        }
    }
    let mut y_top = 0;
    for y_bottom in (length - 1)..height {
        if !mask[(y_bottom, x)] {
            sum += input[(y_bottom, x)];
            count += 1;
        }
        if count > 0 && (sum / count as f32).abs() > threshold {
            for y in y_top..y_top + length {
                scratch[(y, x)] = true;
            }
        }
        if !mask[(y_top, x)] {
            sum -= input[(y_top, x)];
            count -= 1;
        }
        y_top += 1;
    }
}

/// The time-direction kernel for data with structurally absent samples. A
/// window spans `length` *measured* samples; missing positions are skipped
/// at the window boundaries and do not contribute to the average, but
/// positions between the window's ends are all (re-)marked when the window
/// triggers.
pub fn horizontal_missing(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    missing: ArrayView2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > width {
        return;
    }
    scratch.assign(mask);
    for y in 0..height {
        let mut x_left = 0;
        while x_left < width && missing[(y, x_left)] {
            x_left += 1;
        }
        if x_left == width {
            continue;
        }

        let mut sum = 0.0_f32;
        let mut count_added = 0_u32;
        let mut count_total = 0_usize;
        let mut x_right = x_left;
        while count_total + 1 < length && x_right < width {
            if !missing[(y, x_right)] {
                if !mask[(y, x_right)] {
                    sum += input[(y, x_right)];
                    count_added += 1;
                }
                count_total += 1;
            }
            x_right += 1;
        }
        while x_right < width && missing[(y, x_right)] {
            x_right += 1;
        }

        while x_right < width {
            if !mask[(y, x_right)] {
                sum += input[(y, x_right)];
                count_added += 1;
            }
            if count_added > 0 && (sum / count_added as f32).abs() > threshold {
                for x in x_left..=x_right {
                    scratch[(y, x)] = true;
                }
            }
            if !mask[(y, x_left)] {
                sum -= input[(y, x_left)];
                count_added -= 1;
            }
            x_right += 1;
            while x_right < width && missing[(y, x_right)] {
                x_right += 1;
            }
            x_left += 1;
            while x_left < width && missing[(y, x_left)] {
                x_left += 1;
            }
        }
    }
    std::mem::swap(mask, scratch);
}

/// The frequency-direction mirror of [`horizontal_missing`].
pub fn vertical_missing(
    input: ArrayView2<f32>,
    mask: &mut Array2<bool>,
    missing: ArrayView2<bool>,
    scratch: &mut Array2<bool>,
    length: usize,
    threshold: f32,
) {
    let (height, width) = mask.dim();
    if length == 0 || length > height {
        return;
    }
    scratch.assign(mask);
    for x in 0..width {
        let mut y_top = 0;
        while y_top < height && missing[(y_top, x)] {
            y_top += 1;
        }
        if y_top == height {
            continue;
        }

        let mut sum = 0.0_f32;
        let mut count_added = 0_u32;
        let mut count_total = 0_usize;
        let mut y_bottom = y_top;
        while count_total + 1 < length && y_bottom < height {
            if !missing[(y_bottom, x)] {
                if !mask[(y_bottom, x)] {
                    sum += input[(y_bottom, x)];
                    count_added += 1;
                }
                count_total += 1;
            }
            y_bottom += 1;
        }
        while y_bottom < height && missing[(y_bottom, x)] {
            y_bottom += 1;
        }

        while y_bottom < height {
            if !mask[(y_bottom, x)] {
                sum += input[(y_bottom, x)];
                count_added += 1;
            }
            if count_added > 0 && (sum / count_added as f32).abs() > threshold {
                for y in y_top..=y_bottom {
                    scratch[(y, x)] = true;
                }
            }
            if !mask[(y_top, x)] {
                sum -= input[(y_top, x)];
                count_added -= 1;
            }
            y_bottom += 1;
            while y_bottom < height && missing[(y_bottom, x)] {
                y_bottom += 1;
            }
            y_top += 1;
            while y_top < height && missing[(y_top, x)] {
                y_top += 1;
            }
        }
    }
    std::mem::swap(mask, scratch);
}
