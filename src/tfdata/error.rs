// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use super::{ComplexRepresentation, Polarisation};

#[derive(Error, Debug)]
pub enum TfdError {
    #[error("All images and masks in one time-frequency data instance must have the same dimensions; got {width1}x{height1} and {width2}x{height2}")]
    DimensionMismatch {
        width1: usize,
        height1: usize,
        width2: usize,
        height2: usize,
    },

    #[error("A complex representation needs an image pair; a single image was given")]
    ComplexFromSingleImage,

    #[error("Polarisation {0} is not available and can not be derived from this data")]
    PolarisationNotAvailable(Polarisation),

    #[error("Requested the {requested} part of data in {actual} representation")]
    WrongRepresentation {
        requested: ComplexRepresentation,
        actual: ComplexRepresentation,
    },

    #[error("Expected data with exactly one polarisation, got {0}")]
    NotSinglePolarisation(usize),

    #[error("Data with {count} polarisations can not be combined: expected 1, 2 or 4")]
    BadPolarisationCount { count: usize },

    #[error("Operands have a different structure ({lhs} vs {rhs} polarisations) or representation")]
    IncompatibleOperands { lhs: usize, rhs: usize },

    #[error("Can not combine complex-representation operands into a new complex pair")]
    CombinationOfComplex,

    #[error("Image index {index} is out of bounds ({count} images)")]
    BadImageIndex { index: usize, count: usize },

    #[error("Mask index {index} is out of bounds ({count} masks)")]
    BadMaskIndex { index: usize, count: usize },

    #[error("Flagging structures are incompatible ({lhs} vs {rhs} masks)")]
    IncompatibleFlagging { lhs: usize, rhs: usize },
}
