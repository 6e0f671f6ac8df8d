// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::*;

#[test]
fn test_shrink_image_horizontally() {
    let image = array![[1.0_f32, 3.0, 5.0, 7.0, 9.0]].into_shared();
    let out = shrink_image_horizontally(&image.view(), 2);
    assert_eq!(out.dim(), (1, 3));
    assert_abs_diff_eq!(out[(0, 0)], 2.0);
    assert_abs_diff_eq!(out[(0, 1)], 6.0);
    // Partial last bin.
    assert_abs_diff_eq!(out[(0, 2)], 9.0);
}

#[test]
fn test_shrink_image_horizontally_masked() {
    let image = array![[1.0_f32, 3.0, 10.0, 10.0]].into_shared();
    let mask = array![[false, true, true, true]].into_shared();
    let out = shrink_image_horizontally_masked(&image.view(), &mask.view(), 2);
    // First bin averages the single unflagged sample.
    assert_abs_diff_eq!(out[(0, 0)], 1.0);
    // Second bin is entirely flagged: falls back to the plain average.
    assert_abs_diff_eq!(out[(0, 1)], 10.0);
}

#[test]
fn test_shrink_image_vertically() {
    let image = array![[2.0_f32], [4.0], [12.0]].into_shared();
    let out = shrink_image_vertically(&image.view(), 2);
    assert_eq!(out.dim(), (2, 1));
    assert_abs_diff_eq!(out[(0, 0)], 3.0);
    assert_abs_diff_eq!(out[(1, 0)], 12.0);
}

#[test]
fn test_shrink_mask_semantics() {
    let mask = array![[true, false, false, false]].into_shared();
    // "Any" semantics: one flagged sample contaminates the bin.
    let any = shrink_mask_horizontally(&mask.view(), 2);
    assert_eq!(any[(0, 0)], true);
    assert_eq!(any[(0, 1)], false);
    // "All" semantics: a bin with an unflagged sample holds a valid average.
    let all = shrink_mask_horizontally_for_averaging(&mask.view(), 2);
    assert_eq!(all[(0, 0)], false);
    assert_eq!(all[(0, 1)], false);

    let full = array![[true, true, false, true]].into_shared();
    let all = shrink_mask_horizontally_for_averaging(&full.view(), 2);
    assert_eq!(all[(0, 0)], true);
    assert_eq!(all[(0, 1)], false);
}

#[test]
fn test_enlarge_round_trip() {
    let coarse = array![[1.0_f32, 2.0, 3.0]].into_shared();
    let fine = enlarge_image_horizontally(&coarse.view(), 3, 8);
    assert_eq!(fine.dim(), (1, 8));
    assert_abs_diff_eq!(fine[(0, 0)], 1.0);
    assert_abs_diff_eq!(fine[(0, 2)], 1.0);
    assert_abs_diff_eq!(fine[(0, 3)], 2.0);
    assert_abs_diff_eq!(fine[(0, 7)], 3.0);

    let coarse_mask = array![[false, true, false]].into_shared();
    let fine_mask = enlarge_mask_horizontally(&coarse_mask.view(), 3, 8);
    assert_eq!(fine_mask[(0, 2)], false);
    assert_eq!(fine_mask[(0, 3)], true);
    assert_eq!(fine_mask[(0, 5)], true);
    assert_eq!(fine_mask[(0, 6)], false);
}

#[test]
fn test_join_and_invert() {
    let mut mask = array![[true, false, false]].into_shared();
    let other = array![[false, true, false]].into_shared();
    join_masks(&mut mask, &other.view());
    assert_eq!(mask, array![[true, true, false]].into_shared());
    invert_mask(&mut mask);
    assert_eq!(mask, array![[false, false, true]].into_shared());
    assert_eq!(count_flagged(&mask.view()), 1);
}

#[test]
fn test_copy_on_write_leaves_shared_handle_untouched() {
    let mut mask = filled_mask(4, 4, false);
    let shared = mask.clone();
    mask[(0, 0)] = true;
    assert_eq!(shared[(0, 0)], false);
    assert_eq!(mask[(0, 0)], true);
}
