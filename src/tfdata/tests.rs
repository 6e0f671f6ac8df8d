// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use super::*;
use crate::grid::{filled_mask, zero_image};

fn ramp_image(width: usize, height: usize, offset: f32) -> Image2D {
    Array2::from_shape_fn((height, width), |(y, x)| offset + (y * width + x) as f32).into_shared()
}

#[test]
fn test_dimension_invariant() {
    let a = zero_image(8, 4);
    let b = zero_image(8, 5);
    let result = TimeFrequencyData::complex_single(Polarisation::Xx, a, b);
    assert!(matches!(result, Err(TfdError::DimensionMismatch { .. })));

    let result = TimeFrequencyData::dipole(
        ComplexRepresentation::Amplitude,
        zero_image(8, 4),
        zero_image(8, 4),
        zero_image(4, 8),
        zero_image(8, 4),
    );
    assert!(matches!(result, Err(TfdError::DimensionMismatch { .. })));
}

#[test]
fn test_single_image_rejects_complex_representation() {
    let result = TimeFrequencyData::single(
        ComplexRepresentation::Complex,
        Polarisation::StokesI,
        zero_image(4, 4),
    );
    assert!(matches!(result, Err(TfdError::ComplexFromSingleImage)));
}

#[test]
fn test_set_image_rejects_wrong_dimensions() {
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        zero_image(8, 4),
    )
    .unwrap();
    assert!(data.set_image(0, zero_image(4, 8)).is_err());
    assert!(data.set_image(0, zero_image(8, 4)).is_ok());
}

#[test]
fn test_complex_part_round_trip() {
    let re = ramp_image(6, 3, 1.0);
    let im = ramp_image(6, 3, -20.0);
    let data = TimeFrequencyData::complex_single(Polarisation::Xx, re.clone(), im.clone()).unwrap();

    let real_part = data.make_part(ComplexRepresentation::Real).unwrap();
    let imag_part = data.make_part(ComplexRepresentation::Imaginary).unwrap();
    let rebuilt = TimeFrequencyData::from_complex_combination(&real_part, &imag_part).unwrap();

    assert_eq!(
        rebuilt.representation(),
        Some(ComplexRepresentation::Complex)
    );
    assert_eq!(rebuilt.image(0).unwrap(), re);
    assert_eq!(rebuilt.image(1).unwrap(), im);
}

#[test]
fn test_amplitude_and_phase() {
    let re = Array2::from_elem((1, 1), 3.0_f32).into_shared();
    let im = Array2::from_elem((1, 1), 4.0_f32).into_shared();
    let data = TimeFrequencyData::complex_single(Polarisation::Xx, re, im).unwrap();

    let amplitude = data.make_part(ComplexRepresentation::Amplitude).unwrap();
    assert_abs_diff_eq!(amplitude.image(0).unwrap()[(0, 0)], 5.0);

    let phase = data.make_part(ComplexRepresentation::Phase).unwrap();
    assert_abs_diff_eq!(phase.image(0).unwrap()[(0, 0)], (4.0_f32 / 3.0).atan());
}

#[test]
fn test_part_of_wrong_representation_fails() {
    let data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        zero_image(4, 4),
    )
    .unwrap();
    assert!(data.make_part(ComplexRepresentation::Amplitude).is_ok());
    assert!(matches!(
        data.make_part(ComplexRepresentation::Real),
        Err(TfdError::WrongRepresentation { .. })
    ));
}

fn complex_dipole_fixture() -> TimeFrequencyData {
    TimeFrequencyData::complex_dipole([
        (ramp_image(4, 2, 0.0), ramp_image(4, 2, 100.0)),
        (ramp_image(4, 2, 10.0), ramp_image(4, 2, 110.0)),
        (ramp_image(4, 2, 20.0), ramp_image(4, 2, 120.0)),
        (ramp_image(4, 2, 30.0), ramp_image(4, 2, 130.0)),
    ])
    .unwrap()
}

#[test]
fn test_stokes_derivation() {
    let data = complex_dipole_fixture();

    let i = data.make(Polarisation::StokesI).unwrap();
    // I = XX + YY in both parts.
    assert_abs_diff_eq!(i.image(0).unwrap()[(0, 0)], 30.0);
    assert_abs_diff_eq!(i.image(1).unwrap()[(0, 0)], 230.0);

    let q = data.make(Polarisation::StokesQ).unwrap();
    assert_abs_diff_eq!(q.image(0).unwrap()[(0, 0)], -30.0);

    let u = data.make(Polarisation::StokesU).unwrap();
    assert_abs_diff_eq!(u.image(0).unwrap()[(0, 0)], 30.0);

    let v = data.make(Polarisation::StokesV).unwrap();
    // V real part = im(XY) - im(YX).
    assert_abs_diff_eq!(v.image(0).unwrap()[(0, 0)], -10.0);
    // V imaginary part = re(YX) - re(XY).
    assert_abs_diff_eq!(v.image(1).unwrap()[(0, 0)], 10.0);
}

#[test]
fn test_stokes_unavailable_from_single_pol() {
    let data = TimeFrequencyData::complex_single(
        Polarisation::StokesI,
        zero_image(4, 4),
        zero_image(4, 4),
    )
    .unwrap();
    assert!(matches!(
        data.make(Polarisation::StokesV),
        Err(TfdError::PolarisationNotAvailable(Polarisation::StokesV))
    ));
}

#[test]
fn test_polarisation_slice_and_restore() {
    let mut data = complex_dipole_fixture();
    data.set_masks_to(false);

    let mut sliced = data.make_polarisation_index(2);
    assert_eq!(sliced.polarisations(), vec![Polarisation::Yx]);
    assert_eq!(sliced.polarisation_count(), 1);

    // Mutate the slice and write it back.
    let mut mask = filled_mask(4, 2, false);
    mask[(1, 3)] = true;
    sliced.set_global_mask(mask);
    data.set_polarisation_data(2, &sliced).unwrap();

    assert_eq!(data.mask(2).unwrap()[(1, 3)], true);
    assert_eq!(data.mask(1).unwrap()[(1, 3)], false);
    assert_eq!(data.polarisation_count(), 4);
}

#[test]
fn test_single_mask_combines() {
    let mut data = complex_dipole_fixture();
    data.set_masks_to(false);
    let mut mask_a = filled_mask(4, 2, false);
    mask_a[(0, 0)] = true;
    let mut mask_b = filled_mask(4, 2, false);
    mask_b[(1, 1)] = true;
    data.set_mask(0, mask_a).unwrap();
    data.set_mask(3, mask_b).unwrap();

    let combined = data.single_mask();
    assert_eq!(combined[(0, 0)], true);
    assert_eq!(combined[(1, 1)], true);
    assert_eq!(crate::grid::count_flagged(&combined.view()), 2);
}

#[test]
fn test_subtract() {
    let a = ramp_image(4, 2, 10.0);
    let b = ramp_image(4, 2, 0.0);
    let mut lhs = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        a,
    )
    .unwrap();
    let rhs = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        b,
    )
    .unwrap();
    lhs.subtract(&rhs).unwrap();
    for v in lhs.image(0).unwrap().iter() {
        assert_abs_diff_eq!(*v, 10.0);
    }

    let incompatible = complex_dipole_fixture();
    assert!(lhs.subtract(&incompatible).is_err());
}

#[test]
fn test_subtract_as_rhs() {
    let mut rhs = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        ramp_image(4, 2, 0.0),
    )
    .unwrap();
    let lhs = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        ramp_image(4, 2, 3.0),
    )
    .unwrap();
    rhs.subtract_as_rhs(&lhs).unwrap();
    for v in rhs.image(0).unwrap().iter() {
        assert_abs_diff_eq!(*v, 3.0);
    }
}

#[test]
fn test_pair_constructor() {
    let data = TimeFrequencyData::pair(
        ComplexRepresentation::Amplitude,
        Polarisation::Xx,
        zero_image(4, 4),
        Polarisation::Yy,
        zero_image(4, 4),
    )
    .unwrap();
    assert_eq!(data.polarisation_count(), 2);
    assert_eq!(
        data.polarisations(),
        vec![Polarisation::Xx, Polarisation::Yy]
    );
    // A derived Stokes I from an XX/YY pair.
    let i = data.make(Polarisation::StokesI).unwrap();
    assert_eq!(i.polarisation_count(), 1);

    assert!(TimeFrequencyData::pair(
        ComplexRepresentation::Complex,
        Polarisation::Xx,
        zero_image(4, 4),
        Polarisation::Yy,
        zero_image(4, 4),
    )
    .is_err());
}

#[test]
fn test_join_mask() {
    let mut data = TimeFrequencyData::single(
        ComplexRepresentation::Amplitude,
        Polarisation::StokesI,
        zero_image(3, 1),
    )
    .unwrap();
    data.set_masks_to(false);

    let mut other = data.clone();
    let mut mask = filled_mask(3, 1, false);
    mask[(0, 2)] = true;
    other.set_global_mask(mask);

    data.join_mask(&other).unwrap();
    assert_eq!(data.mask(0).unwrap()[(0, 2)], true);
    assert_eq!(data.mask(0).unwrap()[(0, 0)], false);
}

#[test]
fn test_description() {
    let data = complex_dipole_fixture();
    assert_eq!(data.description(), "(XX,XY,YX,YY)");
    let amp = data.make_part(ComplexRepresentation::Amplitude).unwrap();
    assert_eq!(amp.description(), "amplitude of (XX,XY,YX,YY)");
    assert_eq!(TimeFrequencyData::empty().description(), "empty");
}
