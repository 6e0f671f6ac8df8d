// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The multi-polarisation time-frequency data model.
//!
//! A [`TimeFrequencyData`] holds 1, 2 or 4 polarisation entries, each with
//! one real-valued image or a real/imaginary pair, plus an optional flag
//! mask. All grids in one instance share the same dimensions; constructors
//! enforce this. Conversions between complex parts and between the dipole
//! and Stokes bases are derived views built from the stored grids.

mod error;
#[cfg(test)]
mod tests;

pub use error::TfdError;

use itertools::Itertools;
use ndarray::Zip;
use num_complex::Complex32;
use strum_macros::Display;

use crate::grid::{filled_mask, height_of, width_of, Image2D, Mask2D};

/// A measurement channel: a linear dipole correlation or a derived Stokes
/// parameter.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Polarisation {
    #[strum(serialize = "XX")]
    Xx,
    #[strum(serialize = "XY")]
    Xy,
    #[strum(serialize = "YX")]
    Yx,
    #[strum(serialize = "YY")]
    Yy,
    #[strum(serialize = "Stokes I")]
    StokesI,
    #[strum(serialize = "Stokes Q")]
    StokesQ,
    #[strum(serialize = "Stokes U")]
    StokesU,
    #[strum(serialize = "Stokes V")]
    StokesV,
}

/// Which aspect of the complex visibilities an instance stores: one derived
/// real-valued part, or the full real/imaginary pair.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ComplexRepresentation {
    #[strum(serialize = "real part")]
    Real,
    #[strum(serialize = "imaginary part")]
    Imaginary,
    #[strum(serialize = "amplitude")]
    Amplitude,
    #[strum(serialize = "phase")]
    Phase,
    #[strum(serialize = "complex")]
    Complex,
}

#[derive(Debug, Clone)]
struct PolarisedData {
    polarisation: Polarisation,
    /// The real part for complex data, otherwise the single derived image.
    first: Image2D,
    /// The imaginary part; only present for complex data.
    second: Option<Image2D>,
    flagging: Option<Mask2D>,
}

#[derive(Debug, Clone, Default)]
pub struct TimeFrequencyData {
    representation: Option<ComplexRepresentation>,
    data: Vec<PolarisedData>,
}

fn sum_images(a: &Image2D, b: &Image2D) -> Image2D {
    (a + b).into_shared()
}

fn diff_images(a: &Image2D, b: &Image2D) -> Image2D {
    (a - b).into_shared()
}

fn check_dims(images: &[&Image2D]) -> Result<(), TfdError> {
    if let Some((head, tail)) = images.split_first() {
        for image in tail {
            if image.dim() != head.dim() {
                return Err(TfdError::DimensionMismatch {
                    width1: width_of(head),
                    height1: height_of(head),
                    width2: width_of(image),
                    height2: height_of(image),
                });
            }
        }
    }
    Ok(())
}

impl TimeFrequencyData {
    /// Data with no polarisation entries at all, used as the pre-load state
    /// of an artifact set.
    pub fn empty() -> TimeFrequencyData {
        TimeFrequencyData::default()
    }

    /// Single-polarisation data holding one derived part.
    pub fn single(
        representation: ComplexRepresentation,
        polarisation: Polarisation,
        image: Image2D,
    ) -> Result<TimeFrequencyData, TfdError> {
        if representation == ComplexRepresentation::Complex {
            return Err(TfdError::ComplexFromSingleImage);
        }
        Ok(TimeFrequencyData {
            representation: Some(representation),
            data: vec![PolarisedData {
                polarisation,
                first: image,
                second: None,
                flagging: None,
            }],
        })
    }

    /// Single-polarisation complex data.
    pub fn complex_single(
        polarisation: Polarisation,
        real: Image2D,
        imaginary: Image2D,
    ) -> Result<TimeFrequencyData, TfdError> {
        check_dims(&[&real, &imaginary])?;
        Ok(TimeFrequencyData {
            representation: Some(ComplexRepresentation::Complex),
            data: vec![PolarisedData {
                polarisation,
                first: real,
                second: Some(imaginary),
                flagging: None,
            }],
        })
    }

    /// Two-polarisation data holding one derived part per polarisation.
    pub fn pair(
        representation: ComplexRepresentation,
        polarisation_a: Polarisation,
        image_a: Image2D,
        polarisation_b: Polarisation,
        image_b: Image2D,
    ) -> Result<TimeFrequencyData, TfdError> {
        if representation == ComplexRepresentation::Complex {
            return Err(TfdError::ComplexFromSingleImage);
        }
        check_dims(&[&image_a, &image_b])?;
        Ok(TimeFrequencyData {
            representation: Some(representation),
            data: vec![
                PolarisedData {
                    polarisation: polarisation_a,
                    first: image_a,
                    second: None,
                    flagging: None,
                },
                PolarisedData {
                    polarisation: polarisation_b,
                    first: image_b,
                    second: None,
                    flagging: None,
                },
            ],
        })
    }

    /// Two-polarisation complex data.
    #[allow(clippy::too_many_arguments)]
    pub fn complex_pair(
        polarisation_a: Polarisation,
        real_a: Image2D,
        imaginary_a: Image2D,
        polarisation_b: Polarisation,
        real_b: Image2D,
        imaginary_b: Image2D,
    ) -> Result<TimeFrequencyData, TfdError> {
        check_dims(&[&real_a, &imaginary_a, &real_b, &imaginary_b])?;
        Ok(TimeFrequencyData {
            representation: Some(ComplexRepresentation::Complex),
            data: vec![
                PolarisedData {
                    polarisation: polarisation_a,
                    first: real_a,
                    second: Some(imaginary_a),
                    flagging: None,
                },
                PolarisedData {
                    polarisation: polarisation_b,
                    first: real_b,
                    second: Some(imaginary_b),
                    flagging: None,
                },
            ],
        })
    }

    /// Four-polarisation dipole data holding one derived part per
    /// polarisation.
    pub fn dipole(
        representation: ComplexRepresentation,
        xx: Image2D,
        xy: Image2D,
        yx: Image2D,
        yy: Image2D,
    ) -> Result<TimeFrequencyData, TfdError> {
        if representation == ComplexRepresentation::Complex {
            return Err(TfdError::ComplexFromSingleImage);
        }
        check_dims(&[&xx, &xy, &yx, &yy])?;
        let pols = [
            (Polarisation::Xx, xx),
            (Polarisation::Xy, xy),
            (Polarisation::Yx, yx),
            (Polarisation::Yy, yy),
        ];
        Ok(TimeFrequencyData {
            representation: Some(representation),
            data: pols
                .into_iter()
                .map(|(polarisation, first)| PolarisedData {
                    polarisation,
                    first,
                    second: None,
                    flagging: None,
                })
                .collect(),
        })
    }

    /// Four-polarisation complex dipole data from real/imaginary pairs in
    /// XX, XY, YX, YY order.
    pub fn complex_dipole(pairs: [(Image2D, Image2D); 4]) -> Result<TimeFrequencyData, TfdError> {
        {
            let all: Vec<&Image2D> = pairs.iter().flat_map(|(re, im)| [re, im]).collect();
            check_dims(&all)?;
        }
        let pols = [
            Polarisation::Xx,
            Polarisation::Xy,
            Polarisation::Yx,
            Polarisation::Yy,
        ];
        Ok(TimeFrequencyData {
            representation: Some(ComplexRepresentation::Complex),
            data: pols
                .into_iter()
                .zip(pairs)
                .map(|(polarisation, (first, second))| PolarisedData {
                    polarisation,
                    first,
                    second: Some(second),
                    flagging: None,
                })
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The stored representation; `None` for empty data.
    pub fn representation(&self) -> Option<ComplexRepresentation> {
        self.representation
    }

    pub fn width(&self) -> usize {
        self.data.first().map(|d| width_of(&d.first)).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.data.first().map(|d| height_of(&d.first)).unwrap_or(0)
    }

    pub fn polarisation_count(&self) -> usize {
        self.data.len()
    }

    pub fn polarisations(&self) -> Vec<Polarisation> {
        self.data.iter().map(|d| d.polarisation).collect()
    }

    pub fn polarisation(&self, index: usize) -> Polarisation {
        self.data[index].polarisation
    }

    pub fn has_polarisation(&self, polarisation: Polarisation) -> bool {
        self.data.iter().any(|d| d.polarisation == polarisation)
    }

    pub fn image_count(&self) -> usize {
        self.data
            .iter()
            .map(|d| 1 + usize::from(d.second.is_some()))
            .sum()
    }

    pub fn mask_count(&self) -> usize {
        self.data.iter().filter(|d| d.flagging.is_some()).count()
    }

    pub fn image(&self, index: usize) -> Result<Image2D, TfdError> {
        self.data
            .iter()
            .flat_map(|d| std::iter::once(&d.first).chain(d.second.as_ref()))
            .nth(index)
            .cloned()
            .ok_or(TfdError::BadImageIndex {
                index,
                count: self.image_count(),
            })
    }

    pub fn set_image(&mut self, index: usize, image: Image2D) -> Result<(), TfdError> {
        if (width_of(&image), height_of(&image)) != (self.width(), self.height()) {
            return Err(TfdError::DimensionMismatch {
                width1: self.width(),
                height1: self.height(),
                width2: width_of(&image),
                height2: height_of(&image),
            });
        }
        let count = self.image_count();
        let slot = self
            .data
            .iter_mut()
            .flat_map(|d| std::iter::once(&mut d.first).chain(d.second.as_mut()))
            .nth(index)
            .ok_or(TfdError::BadImageIndex { index, count })?;
        *slot = image;
        Ok(())
    }

    pub fn mask(&self, index: usize) -> Result<Mask2D, TfdError> {
        self.data
            .iter()
            .filter_map(|d| d.flagging.as_ref())
            .nth(index)
            .cloned()
            .ok_or(TfdError::BadMaskIndex {
                index,
                count: self.mask_count(),
            })
    }

    pub fn set_mask(&mut self, index: usize, mask: Mask2D) -> Result<(), TfdError> {
        if (width_of(&mask), height_of(&mask)) != (self.width(), self.height()) {
            return Err(TfdError::DimensionMismatch {
                width1: self.width(),
                height1: self.height(),
                width2: width_of(&mask),
                height2: height_of(&mask),
            });
        }
        let count = self.mask_count();
        let slot = self
            .data
            .iter_mut()
            .filter_map(|d| d.flagging.as_mut())
            .nth(index)
            .ok_or(TfdError::BadMaskIndex { index, count })?;
        *slot = mask;
        Ok(())
    }

    /// The combined mask: the OR of every stored mask, or an all-clear mask
    /// when none is stored.
    pub fn single_mask(&self) -> Mask2D {
        let mut masks = self.data.iter().filter_map(|d| d.flagging.as_ref());
        match masks.next() {
            None => filled_mask(self.width(), self.height(), false),
            Some(first) => {
                let mut combined = first.clone();
                for mask in masks {
                    combined.zip_mut_with(mask, |c, &m| *c |= m);
                }
                combined
            }
        }
    }

    /// An image suitable for thresholding: the amplitude for complex data,
    /// the stored part otherwise; entries are averaged when more than one
    /// polarisation is present.
    pub fn single_image(&self) -> Result<Image2D, TfdError> {
        let singles: Vec<Image2D> = self.data.iter().map(entry_single_image).collect();
        match singles.len() {
            0 => Err(TfdError::BadImageIndex { index: 0, count: 0 }),
            1 => Ok(singles.into_iter().next().expect("len is 1")),
            n => {
                let mut sum = singles[0].to_owned();
                for image in &singles[1..] {
                    sum.zip_mut_with(image, |s, &v| *s += v);
                }
                sum.mapv_inplace(|v| v / n as f32);
                Ok(sum.into_shared())
            }
        }
    }

    /// Replaces every entry's mask with the one given handle.
    pub fn set_global_mask(&mut self, mask: Mask2D) {
        for entry in &mut self.data {
            entry.flagging = Some(mask.clone());
        }
    }

    pub fn set_no_mask(&mut self) {
        for entry in &mut self.data {
            entry.flagging = None;
        }
    }

    /// Replaces every entry's mask with a fresh mask filled with `value`.
    pub fn set_masks_to(&mut self, value: bool) {
        if !self.is_empty() {
            let mask = filled_mask(self.width(), self.height(), value);
            self.set_global_mask(mask);
        }
    }

    /// Copies the flagging structure of `source` onto this data: entry by
    /// entry when the polarisation counts match, otherwise the combined mask
    /// of `source` is applied globally.
    pub fn set_mask_from(&mut self, source: &TimeFrequencyData) -> Result<(), TfdError> {
        if source.data.len() == self.data.len() {
            for (dest, src) in self.data.iter_mut().zip(source.data.iter()) {
                dest.flagging = src.flagging.clone();
            }
            Ok(())
        } else if source.mask_count() > 0 {
            self.set_global_mask(source.single_mask());
            Ok(())
        } else {
            self.set_no_mask();
            Ok(())
        }
    }

    /// ORs the flagging of `other` into this data.
    pub fn join_mask(&mut self, other: &TimeFrequencyData) -> Result<(), TfdError> {
        let own_count = self.mask_count();
        let other_count = other.mask_count();
        if other_count == 0 {
            Ok(())
        } else if own_count == other_count || other_count == 1 || own_count == 1 {
            let sources: Vec<Mask2D> = if own_count == other_count {
                (0..other_count)
                    .map(|i| other.mask(i))
                    .collect::<Result<_, _>>()?
            } else {
                vec![other.single_mask(); own_count]
            };
            for (mask, src) in self
                .data
                .iter_mut()
                .filter_map(|d| d.flagging.as_mut())
                .zip(sources)
            {
                mask.zip_mut_with(&src, |m, &o| *m |= o);
            }
            Ok(())
        } else if own_count == 0 && self.data.len() == other.data.len() {
            for (dest, src) in self.data.iter_mut().zip(other.data.iter()) {
                dest.flagging = src.flagging.clone();
            }
            Ok(())
        } else {
            Err(TfdError::IncompatibleFlagging {
                lhs: own_count,
                rhs: other_count,
            })
        }
    }

    /// Subtracts `rhs` image-wise: `self = self - rhs`.
    pub fn subtract(&mut self, rhs: &TimeFrequencyData) -> Result<(), TfdError> {
        self.check_same_structure(rhs)?;
        for (entry, other) in self.data.iter_mut().zip(rhs.data.iter()) {
            entry.first = diff_images(&entry.first, &other.first);
            if let (Some(second), Some(other_second)) = (entry.second.as_mut(), &other.second) {
                *second = diff_images(second, other_second);
            }
        }
        Ok(())
    }

    /// Subtracts image-wise with this data as the right-hand side:
    /// `self = lhs - self`.
    pub fn subtract_as_rhs(&mut self, lhs: &TimeFrequencyData) -> Result<(), TfdError> {
        self.check_same_structure(lhs)?;
        for (entry, other) in self.data.iter_mut().zip(lhs.data.iter()) {
            entry.first = diff_images(&other.first, &entry.first);
            if let (Some(second), Some(other_second)) = (entry.second.as_mut(), &other.second) {
                *second = diff_images(other_second, second);
            }
        }
        Ok(())
    }

    pub fn multiply_images(&mut self, factor: f32) {
        for entry in &mut self.data {
            entry.first = entry.first.mapv(|v| v * factor).into_shared();
            if let Some(second) = &entry.second {
                entry.second = Some(second.mapv(|v| v * factor).into_shared());
            }
        }
    }

    pub fn set_images_to_zero(&mut self) {
        if !self.is_empty() {
            let zero = crate::grid::zero_image(self.width(), self.height());
            let mask = filled_mask(self.width(), self.height(), false);
            for entry in &mut self.data {
                entry.first = zero.clone();
                if entry.second.is_some() {
                    entry.second = Some(zero.clone());
                }
                entry.flagging = Some(mask.clone());
            }
        }
    }

    /// Derives the given part from this data. Complex data can derive any
    /// part; non-complex data can only reproduce its own part.
    pub fn make_part(&self, part: ComplexRepresentation) -> Result<TimeFrequencyData, TfdError> {
        match self.representation {
            Some(ComplexRepresentation::Complex) if part != ComplexRepresentation::Complex => {
                let data = self
                    .data
                    .iter()
                    .map(|entry| {
                        let first = match part {
                            ComplexRepresentation::Real => entry.first.clone(),
                            ComplexRepresentation::Imaginary => entry
                                .second
                                .clone()
                                .expect("complex entries have an imaginary part"),
                            ComplexRepresentation::Amplitude => complex_map(entry, |c| c.norm()),
                            ComplexRepresentation::Phase => complex_map(entry, |c| c.arg()),
                            ComplexRepresentation::Complex => unreachable!(),
                        };
                        PolarisedData {
                            polarisation: entry.polarisation,
                            first,
                            second: None,
                            flagging: entry.flagging.clone(),
                        }
                    })
                    .collect();
                Ok(TimeFrequencyData {
                    representation: Some(part),
                    data,
                })
            }
            Some(representation) if representation == part => Ok(self.clone()),
            Some(actual) => Err(TfdError::WrongRepresentation {
                requested: part,
                actual,
            }),
            None => Ok(self.clone()),
        }
    }

    /// Builds complex data by pairing the first image of each `real` entry
    /// with the first image of the corresponding `imaginary` entry. The
    /// flagging of `real` is carried over. This is the exact inverse of
    /// deriving the real and imaginary parts separately.
    pub fn from_complex_combination(
        real: &TimeFrequencyData,
        imaginary: &TimeFrequencyData,
    ) -> Result<TimeFrequencyData, TfdError> {
        if real.representation == Some(ComplexRepresentation::Complex)
            || imaginary.representation == Some(ComplexRepresentation::Complex)
        {
            return Err(TfdError::CombinationOfComplex);
        }
        if real.polarisations() != imaginary.polarisations() {
            return Err(TfdError::IncompatibleOperands {
                lhs: real.data.len(),
                rhs: imaginary.data.len(),
            });
        }
        let data = real
            .data
            .iter()
            .zip(imaginary.data.iter())
            .map(|(re, im)| PolarisedData {
                polarisation: re.polarisation,
                first: re.first.clone(),
                second: Some(im.first.clone()),
                flagging: re.flagging.clone(),
            })
            .collect();
        Ok(TimeFrequencyData {
            representation: Some(ComplexRepresentation::Complex),
            data,
        })
    }

    /// Slices out the polarisation entry at `index` as single-polarisation
    /// data sharing the same grids.
    pub fn make_polarisation_index(&self, index: usize) -> TimeFrequencyData {
        TimeFrequencyData {
            representation: self.representation,
            data: vec![self.data[index].clone()],
        }
    }

    /// Slices out the given polarisation, deriving a Stokes parameter from
    /// the dipole entries when it is not stored directly.
    pub fn make(&self, polarisation: Polarisation) -> Result<TimeFrequencyData, TfdError> {
        if let Some(index) = self
            .data
            .iter()
            .position(|d| d.polarisation == polarisation)
        {
            return Ok(self.make_polarisation_index(index));
        }

        let xx = self.entry(Polarisation::Xx);
        let xy = self.entry(Polarisation::Xy);
        let yx = self.entry(Polarisation::Yx);
        let yy = self.entry(Polarisation::Yy);
        let complex = self.representation == Some(ComplexRepresentation::Complex);

        let derived = match polarisation {
            Polarisation::StokesI => stokes_sum(xx, yy, complex),
            Polarisation::StokesQ => stokes_diff(xx, yy, complex),
            Polarisation::StokesU => stokes_sum(xy, yx, complex),
            Polarisation::StokesV => stokes_v(xy, yx, complex),
            _ => None,
        };
        let (first, second) = derived.ok_or(TfdError::PolarisationNotAvailable(polarisation))?;

        let mut data = PolarisedData {
            polarisation,
            first,
            second,
            flagging: None,
        };
        if self.mask_count() > 0 {
            data.flagging = Some(self.single_mask());
        }
        Ok(TimeFrequencyData {
            representation: self.representation,
            data: vec![data],
        })
    }

    /// Writes single-polarisation `source` back into the entry at `index`,
    /// the inverse of [`TimeFrequencyData::make_polarisation_index`].
    pub fn set_polarisation_data(
        &mut self,
        index: usize,
        source: &TimeFrequencyData,
    ) -> Result<(), TfdError> {
        if source.data.len() != 1 {
            return Err(TfdError::NotSinglePolarisation(source.data.len()));
        }
        if (source.width(), source.height()) != (self.width(), self.height()) {
            return Err(TfdError::DimensionMismatch {
                width1: self.width(),
                height1: self.height(),
                width2: source.width(),
                height2: source.height(),
            });
        }
        let entry = &source.data[0];
        self.data[index].first = entry.first.clone();
        self.data[index].second = entry.second.clone();
        self.data[index].flagging = entry.flagging.clone();
        Ok(())
    }

    /// Rebuilds this data with every image and mask passed through a
    /// transformation, e.g. for resampling. Each image comes with its
    /// entry's mask (an all-clear mask when the entry has none), so
    /// mask-aware transformations can exclude flagged samples.
    pub fn transform_grids(
        &self,
        mut image_fn: impl FnMut(&Image2D, &Mask2D) -> Image2D,
        mut mask_fn: impl FnMut(&Mask2D) -> Mask2D,
    ) -> TimeFrequencyData {
        let clear = filled_mask(self.width(), self.height(), false);
        let data = self
            .data
            .iter()
            .map(|entry| {
                let mask = entry.flagging.as_ref().unwrap_or(&clear);
                PolarisedData {
                    polarisation: entry.polarisation,
                    first: image_fn(&entry.first, mask),
                    second: entry.second.as_ref().map(|s| image_fn(s, mask)),
                    flagging: entry.flagging.as_ref().map(&mut mask_fn),
                }
            })
            .collect();
        TimeFrequencyData {
            representation: self.representation,
            data,
        }
    }

    /// A short human-readable description, e.g. "amplitude of (XX,YY)".
    pub fn description(&self) -> String {
        if self.data.is_empty() {
            return "empty".to_string();
        }
        let pols = self.data.iter().map(|d| d.polarisation).join(",");
        match self.representation {
            Some(ComplexRepresentation::Complex) | None => format!("({pols})"),
            Some(part) => format!("{part} of ({pols})"),
        }
    }

    fn entry(&self, polarisation: Polarisation) -> Option<&PolarisedData> {
        self.data.iter().find(|d| d.polarisation == polarisation)
    }

    fn check_same_structure(&self, other: &TimeFrequencyData) -> Result<(), TfdError> {
        if self.data.len() != other.data.len() || self.representation != other.representation {
            return Err(TfdError::IncompatibleOperands {
                lhs: self.data.len(),
                rhs: other.data.len(),
            });
        }
        Ok(())
    }
}

fn entry_single_image(entry: &PolarisedData) -> Image2D {
    match &entry.second {
        None => entry.first.clone(),
        Some(_) => complex_map(entry, |c| c.norm()),
    }
}

fn complex_map(entry: &PolarisedData, f: impl Fn(Complex32) -> f32) -> Image2D {
    let second = entry
        .second
        .as_ref()
        .expect("complex entries have an imaginary part");
    Zip::from(&entry.first)
        .and(second)
        .map_collect(|&re, &im| f(Complex32::new(re, im)))
        .into_shared()
}

fn stokes_sum(
    a: Option<&PolarisedData>,
    b: Option<&PolarisedData>,
    complex: bool,
) -> Option<(Image2D, Option<Image2D>)> {
    let (a, b) = (a?, b?);
    let first = sum_images(&a.first, &b.first);
    let second = if complex {
        Some(sum_images(a.second.as_ref()?, b.second.as_ref()?))
    } else {
        None
    };
    Some((first, second))
}

fn stokes_diff(
    a: Option<&PolarisedData>,
    b: Option<&PolarisedData>,
    complex: bool,
) -> Option<(Image2D, Option<Image2D>)> {
    let (a, b) = (a?, b?);
    let first = diff_images(&a.first, &b.first);
    let second = if complex {
        Some(diff_images(a.second.as_ref()?, b.second.as_ref()?))
    } else {
        None
    };
    Some((first, second))
}

/// Stokes V from the cross hands: V = -i (XY - YX), so the real part comes
/// from the imaginary difference and vice versa.
fn stokes_v(
    xy: Option<&PolarisedData>,
    yx: Option<&PolarisedData>,
    complex: bool,
) -> Option<(Image2D, Option<Image2D>)> {
    if !complex {
        return None;
    }
    let (xy, yx) = (xy?, yx?);
    let first = diff_images(xy.second.as_ref()?, yx.second.as_ref()?);
    let second = diff_images(&yx.first, &xy.first);
    Some((first, Some(second)))
}
