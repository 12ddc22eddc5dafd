//! This module defines the in-memory volume data model.
//!
//! A [`VolumeDataset`] is the terminal product of every loader: a 3D grid of
//! voxels, possibly repeated over several frames (time steps or channels),
//! together with its value range and spatial placement. The voxel data is
//! never mutated after construction.
//!
//! An integration with `ndarray` is available through the `ndarray_volumes`
//! feature.

pub mod buffer;
pub mod element;
#[cfg(feature = "ndarray_volumes")]
pub mod ndarray;

pub use self::buffer::{FrameView, VolumeBuffer};
pub use self::element::DataElement;
#[cfg(feature = "ndarray_volumes")]
pub use self::ndarray::IntoNdArray;

use crate::affine::{display_scale, SpatialTransform};
use crate::error::{Result, VolumeError};
use crate::typedef::ElementType;
use nalgebra::{Point3, Vector3};

/// A fully decoded, immutable volume.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDataset {
    dimensions: [usize; 3],
    frame_count: usize,
    source_type: ElementType,
    data: VolumeBuffer,
    value_range: (f64, f64),
    spatial: SpatialTransform,
    scale: Vector3<f32>,
}

impl VolumeDataset {
    /// Assemble a dataset from decoded voxel values.
    ///
    /// `source_type` is the element type declared by the file, which may
    /// differ from the storage type of `data` (`Float64` is stored as
    /// `Float32`). The display scale is derived from the dimensions and the
    /// voxel spacing of `spatial`.
    ///
    /// # Errors
    ///
    /// - `EmptyVolume` if a dimension or the frame count is zero
    /// - `SizeMismatch` if `data` does not hold exactly one value per voxel
    ///   of every frame
    pub fn new(
        dimensions: [usize; 3],
        frame_count: usize,
        source_type: ElementType,
        data: VolumeBuffer,
        spatial: SpatialTransform,
    ) -> Result<Self> {
        let value_range = data.value_range().unwrap_or((0., 0.));
        Self::from_parts(dimensions, frame_count, source_type, data, value_range, spatial)
    }

    /// Like [`new`](#method.new), with a value range already known to the
    /// caller.
    pub(crate) fn from_parts(
        dimensions: [usize; 3],
        frame_count: usize,
        source_type: ElementType,
        data: VolumeBuffer,
        value_range: (f64, f64),
        spatial: SpatialTransform,
    ) -> Result<Self> {
        if dimensions.iter().any(|d| *d == 0) || frame_count == 0 {
            return Err(VolumeError::EmptyVolume);
        }
        let expected = dimensions.iter().product::<usize>() * frame_count;
        if data.len() != expected {
            return Err(VolumeError::SizeMismatch(expected, data.len()));
        }
        let scale = display_scale(dimensions, &spatial.spacing());
        Ok(VolumeDataset {
            dimensions,
            frame_count,
            source_type,
            data,
            value_range,
            spatial,
            scale,
        })
    }

    /// Override the normalized display scale.
    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Voxel grid size `(x, y, z)` of a single frame.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Number of frames, at least 1.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of voxels in one frame.
    pub fn frame_size(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Element type declared by the source file.
    pub fn source_type(&self) -> ElementType {
        self.source_type
    }

    /// Element type of the stored values.
    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// The voxel values of all frames.
    pub fn data(&self) -> &VolumeBuffer {
        &self.data
    }

    /// Minimum and maximum over all stored values.
    pub fn value_range(&self) -> (f64, f64) {
        self.value_range
    }

    /// The range mapped to `[0, 1]` before transfer function lookup.
    ///
    /// Integer source types use the full range of the type, floating point
    /// types use the observed value range.
    pub fn density_range(&self) -> (f64, f64) {
        self.source_type.type_range().unwrap_or(self.value_range)
    }

    /// The voxel to physical mapping.
    pub fn spatial(&self) -> &SpatialTransform {
        &self.spatial
    }

    /// Normalized extent for display; the longest axis is 1.
    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// Map voxel indices to physical (RAS) coordinates.
    pub fn voxel_to_physical(&self, ijk: &Point3<f32>) -> Point3<f32> {
        self.spatial.to_physical(ijk)
    }

    /// Map physical (RAS) coordinates to fractional voxel indices.
    pub fn physical_to_voxel(&self, ras: &Point3<f32>) -> Point3<f32> {
        self.spatial.to_voxel(ras)
    }

    /// Borrow the voxel values of frame `index`.
    ///
    /// # Errors
    ///
    /// - `FrameOutOfBounds` if `index >= frame_count()`.
    pub fn frame(&self, index: usize) -> Result<FrameView<'_>> {
        let size = self.frame_size();
        if index >= self.frame_count {
            return Err(VolumeError::FrameOutOfBounds(index, self.frame_count));
        }
        self.data
            .slice(index * size, size)
            .ok_or(VolumeError::FrameOutOfBounds(index, self.frame_count))
    }

    /// Fetch a single voxel value as `f32`.
    ///
    /// Returns `None` if the coordinates or the frame are out of bounds.
    pub fn voxel(&self, x: usize, y: usize, z: usize, frame: usize) -> Option<f32> {
        let [dx, dy, dz] = self.dimensions;
        if x >= dx || y >= dy || z >= dz || frame >= self.frame_count {
            return None;
        }
        let index = frame * self.frame_size() + (z * dy + y) * dx + x;
        self.data.view().get_f32(index)
    }
}
