// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scale-invariant rank (SIR) operator.
//!
//! Every run of samples whose flagged fraction reaches `1 - eta` becomes
//! fully flagged, independent of the run's length. Flagged samples weigh
//! `eta`, unflagged samples `eta - 1`; a sample ends up flagged iff it lies
//! in some interval with a non-negative weight sum. Three O(n) passes
//! (prefix sums, running prefix minima, suffix maxima) give the same answer
//! as trying every interval.
//!
//! `eta = 0` is the identity; `eta = 1` flags the entire sequence.

use ndarray::{Array2, ArrayView2};

/// Applies the operator to a single flag sequence.
pub fn operate(flags: &mut [bool], eta: f64) {
    let n = flags.len();
    if n == 0 {
        return;
    }

    // m[x] = sum of the first x sample weights.
    let mut m = vec![0.0_f64; n + 1];
    let mut acc = 0.0_f64;
    for (i, &flagged) in flags.iter().enumerate() {
        acc += if flagged { eta } else { eta - 1.0 };
        m[i + 1] = acc;
    }

    // suffix_max[x] = max of m[x..=n].
    let mut suffix_max = vec![0.0_f64; n + 1];
    let mut best = f64::NEG_INFINITY;
    for x in (0..=n).rev() {
        best = best.max(m[x]);
        suffix_max[x] = best;
    }

    // flags[x] iff some interval [z, y) with z <= x < y has a non-negative
    // weight sum, i.e. max m[y] (y > x) >= min m[z] (z <= x).
    let mut prefix_min = f64::INFINITY;
    for x in 0..n {
        prefix_min = prefix_min.min(m[x]);
        flags[x] = suffix_max[x + 1] >= prefix_min;
    }
}

/// Applies the operator to a flag sequence with structurally absent
/// positions: missing samples do not count as flagged or unflagged, never
/// become flagged themselves, and do not break a run.
pub fn operate_missing(flags: &mut [bool], missing: &[bool], eta: f64) {
    let present: Vec<usize> = (0..flags.len()).filter(|&i| !missing[i]).collect();
    let mut compact: Vec<bool> = present.iter().map(|&i| flags[i]).collect();
    operate(&mut compact, eta);
    for (&i, &flagged) in present.iter().zip(compact.iter()) {
        flags[i] = flagged;
    }
}

/// Applies the operator to every row (the time direction).
pub fn operate_horizontally(mask: &mut Array2<bool>, eta: f64) {
    let (height, width) = mask.dim();
    let mut row = vec![false; width];
    for y in 0..height {
        for x in 0..width {
            row[x] = mask[(y, x)];
        }
        operate(&mut row, eta);
        for x in 0..width {
            mask[(y, x)] = row[x];
        }
    }
}

/// Applies the operator to every column (the frequency direction).
pub fn operate_vertically(mask: &mut Array2<bool>, eta: f64) {
    let (height, width) = mask.dim();
    let mut column = vec![false; height];
    for x in 0..width {
        for y in 0..height {
            column[y] = mask[(y, x)];
        }
        operate(&mut column, eta);
        for y in 0..height {
            mask[(y, x)] = column[y];
        }
    }
}

/// Row-wise application with missing samples.
pub fn operate_horizontally_missing(mask: &mut Array2<bool>, missing: ArrayView2<bool>, eta: f64) {
    let (height, width) = mask.dim();
    let mut row = vec![false; width];
    let mut row_missing = vec![false; width];
    for y in 0..height {
        for x in 0..width {
            row[x] = mask[(y, x)];
            row_missing[x] = missing[(y, x)];
        }
        operate_missing(&mut row, &row_missing, eta);
        for x in 0..width {
            mask[(y, x)] = row[x];
        }
    }
}

/// Column-wise application with missing samples.
pub fn operate_vertically_missing(mask: &mut Array2<bool>, missing: ArrayView2<bool>, eta: f64) {
    let (height, width) = mask.dim();
    let mut column = vec![false; height];
    let mut column_missing = vec![false; height];
    for x in 0..width {
        for y in 0..height {
            column[y] = mask[(y, x)];
            column_missing[y] = missing[(y, x)];
        }
        operate_missing(&mut column, &column_missing, eta);
        for y in 0..height {
            mask[(y, x)] = column[y];
        }
    }
}
