// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The mutable per-baseline execution context.
//!
//! An [`ArtifactSet`] carries the three data slots every action reads and
//! writes: original (ground truth), contaminated (the live working copy)
//! and revised (the background estimate), together with the baseline's
//! metadata, the shared image-set handle and the sensitivity scalar that
//! iterative control flow varies. Cloning is cheap: the grids inside the
//! slots are shared copy-on-write handles.

use std::sync::Arc;

use crate::imagesets::{BaselineMetadata, ImageSetHandle};
use crate::tfdata::TimeFrequencyData;

#[derive(Clone)]
pub struct ArtifactSet {
    original: TimeFrequencyData,
    contaminated: TimeFrequencyData,
    revised: TimeFrequencyData,
    metadata: Option<Arc<BaselineMetadata>>,
    image_set: Option<ImageSetHandle>,
    baseline_index: Option<usize>,
    sensitivity: f64,
}

impl Default for ArtifactSet {
    fn default() -> ArtifactSet {
        ArtifactSet::new()
    }
}

impl ArtifactSet {
    pub fn new() -> ArtifactSet {
        ArtifactSet {
            original: TimeFrequencyData::empty(),
            contaminated: TimeFrequencyData::empty(),
            revised: TimeFrequencyData::empty(),
            metadata: None,
            image_set: None,
            baseline_index: None,
            sensitivity: 1.0,
        }
    }

    /// An artifact set attached to an image set; the for-each-baseline
    /// action fills the data slots per baseline.
    pub fn with_image_set(image_set: ImageSetHandle) -> ArtifactSet {
        ArtifactSet {
            image_set: Some(image_set),
            ..ArtifactSet::new()
        }
    }

    pub fn original(&self) -> &TimeFrequencyData {
        &self.original
    }

    pub fn contaminated(&self) -> &TimeFrequencyData {
        &self.contaminated
    }

    pub fn revised(&self) -> &TimeFrequencyData {
        &self.revised
    }

    pub fn contaminated_mut(&mut self) -> &mut TimeFrequencyData {
        &mut self.contaminated
    }

    pub fn original_mut(&mut self) -> &mut TimeFrequencyData {
        &mut self.original
    }

    pub fn revised_mut(&mut self) -> &mut TimeFrequencyData {
        &mut self.revised
    }

    pub fn set_original(&mut self, data: TimeFrequencyData) {
        self.original = data;
    }

    pub fn set_contaminated(&mut self, data: TimeFrequencyData) {
        self.contaminated = data;
    }

    pub fn set_revised(&mut self, data: TimeFrequencyData) {
        self.revised = data;
    }

    pub fn metadata(&self) -> Option<&Arc<BaselineMetadata>> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: Arc<BaselineMetadata>) {
        self.metadata = Some(metadata);
    }

    pub fn image_set(&self) -> Option<&ImageSetHandle> {
        self.image_set.as_ref()
    }

    /// Detaches the image set, e.g. for the scratch copies made by the
    /// change-resolution action.
    pub fn set_no_image_set(&mut self) {
        self.image_set = None;
    }

    pub fn baseline_index(&self) -> Option<usize> {
        self.baseline_index
    }

    pub fn set_baseline_index(&mut self, index: usize) {
        self.baseline_index = Some(index);
    }

    /// The scalar multiplier that threshold actions apply to their
    /// thresholds; iteration blocks sweep it towards 1.
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: f64) {
        self.sensitivity = sensitivity;
    }
}
