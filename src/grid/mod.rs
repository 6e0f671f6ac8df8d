// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Grid primitives for time-frequency data.
//!
//! An image is a dense 2D grid of `f32` samples, a mask is a grid of `bool`s
//! of identical dimensions where a set bit means "flagged". Both are stored
//! row-major with the frequency channel as the row index and the time step as
//! the column index, so "horizontal" operations run along the time axis and
//! "vertical" operations along the frequency axis.
//!
//! Grids are shared between the three per-baseline data slots as
//! [`ArcArray2`] handles; mutation goes through clone-on-write, so slicing
//! and restoring data in control-flow actions is an O(1) handle copy.

#[cfg(test)]
mod tests;

use ndarray::{ArcArray2, Array2, ArrayView2};

/// A reference-counted, clone-on-write image of `f32` samples,
/// shape `(height, width)` = `(channels, timesteps)`.
pub type Image2D = ArcArray2<f32>;

/// A reference-counted, clone-on-write boolean flag grid, dimensioned
/// identically to the image(s) it belongs to.
pub type Mask2D = ArcArray2<bool>;

/// Makes a new all-zero image.
pub fn zero_image(width: usize, height: usize) -> Image2D {
    Array2::zeros((height, width)).into_shared()
}

/// Makes a new mask with every sample set to `value`.
pub fn filled_mask(width: usize, height: usize, value: bool) -> Mask2D {
    Array2::from_elem((height, width), value).into_shared()
}

pub fn width_of<T>(grid: &ArcArray2<T>) -> usize {
    grid.ncols()
}

pub fn height_of<T>(grid: &ArcArray2<T>) -> usize {
    grid.nrows()
}

/// The number of flagged samples in a mask.
pub fn count_flagged(mask: &ArrayView2<bool>) -> usize {
    mask.iter().filter(|&&f| f).count()
}

/// ORs `other` into `mask` in place.
pub fn join_masks(mask: &mut Mask2D, other: &ArrayView2<bool>) {
    mask.zip_mut_with(&other.view(), |m, &o| *m |= o);
}

/// Inverts every sample of `mask` in place.
pub fn invert_mask(mask: &mut Mask2D) {
    mask.mapv_inplace(|f| !f);
}

fn shrunk_size(size: usize, factor: usize) -> usize {
    (size + factor - 1) / factor
}

/// Averages `factor` adjacent time steps together. The last output column
/// averages however many input columns remain.
pub fn shrink_image_horizontally(image: &ArrayView2<f32>, factor: usize) -> Image2D {
    let (height, width) = image.dim();
    let new_width = shrunk_size(width, factor);
    let mut out = Array2::zeros((height, new_width));
    for y in 0..height {
        for bin in 0..new_width {
            let x_end = ((bin + 1) * factor).min(width);
            let mut sum = 0.0;
            for x in bin * factor..x_end {
                sum += image[(y, x)];
            }
            out[(y, bin)] = sum / (x_end - bin * factor) as f32;
        }
    }
    out.into_shared()
}

/// Averages `factor` adjacent frequency channels together.
pub fn shrink_image_vertically(image: &ArrayView2<f32>, factor: usize) -> Image2D {
    let (height, width) = image.dim();
    let new_height = shrunk_size(height, factor);
    let mut out = Array2::zeros((new_height, width));
    for bin in 0..new_height {
        let y_end = ((bin + 1) * factor).min(height);
        for x in 0..width {
            let mut sum = 0.0;
            for y in bin * factor..y_end {
                sum += image[(y, x)];
            }
            out[(bin, x)] = sum / (y_end - bin * factor) as f32;
        }
    }
    out.into_shared()
}

/// Averages `factor` adjacent time steps together, excluding flagged samples
/// from the average. A bin whose samples are all flagged falls back to the
/// plain average so the output stays finite.
pub fn shrink_image_horizontally_masked(
    image: &ArrayView2<f32>,
    mask: &ArrayView2<bool>,
    factor: usize,
) -> Image2D {
    let (height, width) = image.dim();
    let new_width = shrunk_size(width, factor);
    let mut out = Array2::zeros((height, new_width));
    for y in 0..height {
        for bin in 0..new_width {
            let x_start = bin * factor;
            let x_end = ((bin + 1) * factor).min(width);
            let mut sum = 0.0;
            let mut count = 0usize;
            for x in x_start..x_end {
                if !mask[(y, x)] {
                    sum += image[(y, x)];
                    count += 1;
                }
            }
            out[(y, bin)] = if count > 0 {
                sum / count as f32
            } else {
                let mut all = 0.0;
                for x in x_start..x_end {
                    all += image[(y, x)];
                }
                all / (x_end - x_start) as f32
            };
        }
    }
    out.into_shared()
}

/// Averages `factor` adjacent frequency channels together, excluding flagged
/// samples from the average; see [`shrink_image_horizontally_masked`].
pub fn shrink_image_vertically_masked(
    image: &ArrayView2<f32>,
    mask: &ArrayView2<bool>,
    factor: usize,
) -> Image2D {
    let (height, width) = image.dim();
    let new_height = shrunk_size(height, factor);
    let mut out = Array2::zeros((new_height, width));
    for bin in 0..new_height {
        let y_start = bin * factor;
        let y_end = ((bin + 1) * factor).min(height);
        for x in 0..width {
            let mut sum = 0.0;
            let mut count = 0usize;
            for y in y_start..y_end {
                if !mask[(y, x)] {
                    sum += image[(y, x)];
                    count += 1;
                }
            }
            out[(bin, x)] = if count > 0 {
                sum / count as f32
            } else {
                let mut all = 0.0;
                for y in y_start..y_end {
                    all += image[(y, x)];
                }
                all / (y_end - y_start) as f32
            };
        }
    }
    out.into_shared()
}

/// Shrinks a mask along the time axis: a bin is flagged when *any* of its
/// samples is flagged. Used when images are shrunk with the plain average,
/// where a flagged sample contaminates the whole bin.
pub fn shrink_mask_horizontally(mask: &ArrayView2<bool>, factor: usize) -> Mask2D {
    shrink_mask(mask, factor, true, |acc, v| acc | v, false)
}

/// Shrinks a mask along the frequency axis with "any" semantics; see
/// [`shrink_mask_horizontally`].
pub fn shrink_mask_vertically(mask: &ArrayView2<bool>, factor: usize) -> Mask2D {
    shrink_mask(mask, factor, false, |acc, v| acc | v, false)
}

/// Shrinks a mask along the time axis: a bin is flagged only when *all* of
/// its samples are flagged. Used with mask-aware averaging, where a bin with
/// at least one unflagged sample holds a valid average.
pub fn shrink_mask_horizontally_for_averaging(mask: &ArrayView2<bool>, factor: usize) -> Mask2D {
    shrink_mask(mask, factor, true, |acc, v| acc & v, true)
}

/// Shrinks a mask along the frequency axis with "all" semantics; see
/// [`shrink_mask_horizontally_for_averaging`].
pub fn shrink_mask_vertically_for_averaging(mask: &ArrayView2<bool>, factor: usize) -> Mask2D {
    shrink_mask(mask, factor, false, |acc, v| acc & v, true)
}

fn shrink_mask(
    mask: &ArrayView2<bool>,
    factor: usize,
    horizontal: bool,
    fold: impl Fn(bool, bool) -> bool,
    init: bool,
) -> Mask2D {
    let (height, width) = mask.dim();
    let (new_height, new_width) = if horizontal {
        (height, shrunk_size(width, factor))
    } else {
        (shrunk_size(height, factor), width)
    };
    let mut out = Array2::from_elem((new_height, new_width), false);
    for y in 0..new_height {
        for x in 0..new_width {
            let (y_range, x_range) = if horizontal {
                (y..y + 1, x * factor..((x + 1) * factor).min(width))
            } else {
                (y * factor..((y + 1) * factor).min(height), x..x + 1)
            };
            let mut acc = init;
            for yy in y_range.clone() {
                for xx in x_range.clone() {
                    acc = fold(acc, mask[(yy, xx)]);
                }
            }
            out[(y, x)] = acc;
        }
    }
    out.into_shared()
}

/// Enlarges an image along the time axis by nearest-neighbour replication,
/// producing `new_width` columns.
pub fn enlarge_image_horizontally(
    image: &ArrayView2<f32>,
    factor: usize,
    new_width: usize,
) -> Image2D {
    let height = image.nrows();
    Array2::from_shape_fn((height, new_width), |(y, x)| {
        image[(y, (x / factor).min(image.ncols() - 1))]
    })
    .into_shared()
}

/// Enlarges an image along the frequency axis by nearest-neighbour
/// replication, producing `new_height` rows.
pub fn enlarge_image_vertically(
    image: &ArrayView2<f32>,
    factor: usize,
    new_height: usize,
) -> Image2D {
    let width = image.ncols();
    Array2::from_shape_fn((new_height, width), |(y, x)| {
        image[((y / factor).min(image.nrows() - 1), x)]
    })
    .into_shared()
}

/// Enlarges a mask along the time axis; a fine sample is flagged when its
/// coarse bin is flagged.
pub fn enlarge_mask_horizontally(
    mask: &ArrayView2<bool>,
    factor: usize,
    new_width: usize,
) -> Mask2D {
    let height = mask.nrows();
    Array2::from_shape_fn((height, new_width), |(y, x)| {
        mask[(y, (x / factor).min(mask.ncols() - 1))]
    })
    .into_shared()
}

/// Enlarges a mask along the frequency axis; see
/// [`enlarge_mask_horizontally`].
pub fn enlarge_mask_vertically(
    mask: &ArrayView2<bool>,
    factor: usize,
    new_height: usize,
) -> Mask2D {
    let width = mask.ncols();
    Array2::from_shape_fn((new_height, width), |(y, x)| {
        mask[((y / factor).min(mask.nrows() - 1), x)]
    })
    .into_shared()
}
