// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The baseline source/sink contract.
//!
//! An [`ImageSet`] provides, per baseline index, a populated
//! [`TimeFrequencyData`] with its metadata, and accepts flag masks for
//! write-back. The strategy engine only ever talks to this trait; reading
//! and writing actual measurement-set columns lives elsewhere. Access is
//! serialised through [`ImageSetHandle`], the I/O mutex of the run.

mod error;

pub use error::ImageSetError;

use std::sync::{Arc, Mutex};

use hifitime::Epoch;
use ndarray::Array2;
use vec1::Vec1;

use crate::grid::Mask2D;
use crate::rng::Rng;
use crate::tfdata::TimeFrequencyData;

#[derive(Debug, Clone)]
pub struct Antenna {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Band {
    pub id: usize,
    /// Centre frequency per channel \[Hz\].
    pub channel_frequencies_hz: Vec<f64>,
}

/// Baseline coordinates \[m\] per time step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uvw {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

/// Immutable per-baseline observation metadata.
#[derive(Debug, Clone)]
pub struct BaselineMetadata {
    pub antenna1: Antenna,
    pub antenna2: Antenna,
    pub band: Band,
    pub uvw: Vec<Uvw>,
    pub timestamps: Vec<Epoch>,
}

/// One loaded baseline: the visibility data plus its metadata.
#[derive(Debug, Clone)]
pub struct BaselineData {
    pub index: usize,
    pub data: TimeFrequencyData,
    pub metadata: Arc<BaselineMetadata>,
}

pub trait ImageSet: Send {
    fn description(&self) -> String;

    /// The number of baselines this set can serve.
    fn baseline_count(&self) -> usize;

    /// The antenna pair of a baseline, available without loading its data.
    fn antennas_of(&self, index: usize) -> Result<(usize, usize), ImageSetError>;

    /// Loads one baseline's visibilities and metadata.
    fn load(&mut self, index: usize) -> Result<BaselineData, ImageSetError>;

    /// Accepts the final flag masks of a baseline, keyed by its index.
    fn store_flags(&mut self, index: usize, masks: Vec1<Mask2D>) -> Result<(), ImageSetError>;
}

/// The shared, serialised handle to an image set: exactly one thread reads
/// or writes through it at a time.
pub type ImageSetHandle = Arc<Mutex<dyn ImageSet>>;

/// A deterministic in-memory image set: complex dipole visibilities made of
/// Gaussian noise with injected broadband (transient) and narrow-band
/// (transmitter) interference. Each baseline is seeded by its index, so runs
/// are reproducible.
pub struct SyntheticImageSet {
    antenna_count: usize,
    width: usize,
    height: usize,
    seed: u64,
    baselines: Vec<(usize, usize)>,
    stored_flags: Vec<Option<Vec1<Mask2D>>>,
}

impl SyntheticImageSet {
    pub fn new(antenna_count: usize, width: usize, height: usize, seed: u64) -> SyntheticImageSet {
        let mut baselines = vec![];
        for a1 in 0..antenna_count {
            for a2 in a1..antenna_count {
                baselines.push((a1, a2));
            }
        }
        let count = baselines.len();
        SyntheticImageSet {
            antenna_count,
            width,
            height,
            seed,
            baselines,
            stored_flags: vec![None; count],
        }
    }

    /// The flags stored for a baseline, if any were written back.
    pub fn stored_flags(&self, index: usize) -> Option<&Vec1<Mask2D>> {
        self.stored_flags.get(index).and_then(|f| f.as_ref())
    }

    /// The time steps of the narrow-band transmitter channel injected into
    /// every baseline.
    pub fn rfi_channel(&self) -> usize {
        self.height / 3
    }

    /// The time step of the injected broadband transient.
    pub fn rfi_timestep(&self) -> usize {
        self.width / 2
    }

    fn check_index(&self, index: usize) -> Result<(), ImageSetError> {
        if index >= self.baselines.len() {
            Err(ImageSetError::NoSuchBaseline {
                index,
                count: self.baselines.len(),
            })
        } else {
            Ok(())
        }
    }
}

impl ImageSet for SyntheticImageSet {
    fn description(&self) -> String {
        format!(
            "synthetic {} antennas, {}x{}",
            self.antenna_count, self.width, self.height
        )
    }

    fn baseline_count(&self) -> usize {
        self.baselines.len()
    }

    fn antennas_of(&self, index: usize) -> Result<(usize, usize), ImageSetError> {
        self.check_index(index)?;
        Ok(self.baselines[index])
    }

    fn load(&mut self, index: usize) -> Result<BaselineData, ImageSetError> {
        self.check_index(index)?;
        let (a1, a2) = self.baselines[index];
        let mut rng = Rng::new(self.seed ^ ((index as u64 + 1) << 20));

        let rfi_channel = self.rfi_channel();
        let rfi_timestep = self.rfi_timestep();
        let mut make_plane = |gain: f32| {
            Array2::from_shape_fn((self.height, self.width), |(y, x)| {
                let mut value = rng.gaussian() as f32 * gain;
                if y == rfi_channel {
                    value += 8.0 * gain;
                }
                if x == rfi_timestep {
                    value += 6.0 * gain;
                }
                value
            })
            .into_shared()
        };
        let pairs = [
            (make_plane(1.0), make_plane(1.0)),
            (make_plane(0.3), make_plane(0.3)),
            (make_plane(0.3), make_plane(0.3)),
            (make_plane(1.0), make_plane(1.0)),
        ];
        let mut data = TimeFrequencyData::complex_dipole(pairs)?;
        data.set_masks_to(false);

        let time_res = 2.0;
        let metadata = BaselineMetadata {
            antenna1: Antenna {
                id: a1,
                name: format!("Tile{a1:03}"),
            },
            antenna2: Antenna {
                id: a2,
                name: format!("Tile{a2:03}"),
            },
            band: Band {
                id: 0,
                channel_frequencies_hz: (0..self.height)
                    .map(|c| 150e6 + c as f64 * 40e3)
                    .collect(),
            },
            uvw: (0..self.width)
                .map(|t| Uvw {
                    u: (a2 - a1) as f64 * 10.0 + t as f64 * 1e-3,
                    v: (a2 as f64 - a1 as f64) * 5.0,
                    w: 0.0,
                })
                .collect(),
            timestamps: (0..self.width)
                .map(|t| Epoch::from_gpst_seconds(1090008640.0 + t as f64 * time_res))
                .collect(),
        };

        Ok(BaselineData {
            index,
            data,
            metadata: Arc::new(metadata),
        })
    }

    fn store_flags(&mut self, index: usize, masks: Vec1<Mask2D>) -> Result<(), ImageSetError> {
        self.check_index(index)?;
        self.stored_flags[index] = Some(masks);
        Ok(())
    }
}
