//! Interfaces specific to integration with `ndarray`.
//!
//! Frames are exposed as 3D arrays of shape `(z, y, x)`, so that the last
//! axis is the fastest varying one and the standard (row major) layout of
//! the array matches the storage order of the frame.
//!
//! [`IntoNdArray::to_ndarray`] copies and converts the voxels to `f32`,
//! while [`frame_array_view`] borrows them with their stored type.
use super::{DataElement, FrameView, VolumeDataset};
use crate::error::Result;
use ::ndarray::{Array3, ArrayView3};

/// Conversion of volume frames into `ndarray` arrays.
pub trait IntoNdArray {
    /// Copy frame `index` into an array of shape `(z, y, x)`.
    fn to_ndarray(&self, index: usize) -> Result<Array3<f32>>;
}

impl IntoNdArray for VolumeDataset {
    fn to_ndarray(&self, index: usize) -> Result<Array3<f32>> {
        let frame = self.frame(index)?;
        Ok(frame_to_array(&frame, self.dimensions()))
    }
}

/// Copy a frame of the given `(x, y, z)` dimensions into an `f32` array of
/// shape `(z, y, x)`.
pub fn frame_to_array(frame: &FrameView<'_>, dimensions: [usize; 3]) -> Array3<f32> {
    let [dx, dy, dz] = dimensions;
    Array3::from_shape_fn((dz, dy, dx), |(z, y, x)| {
        frame.get_f32((z * dy + y) * dx + x).unwrap_or(0.)
    })
}

/// Borrow a frame as an array view of shape `(z, y, x)` without copying.
///
/// Returns `None` if the stored element type is not `T` or the frame length
/// does not match the dimensions.
pub fn frame_array_view<'a, T: DataElement>(
    frame: &FrameView<'a>,
    dimensions: [usize; 3],
) -> Option<ArrayView3<'a, T>> {
    let values = frame.as_slice::<T>()?;
    let [dx, dy, dz] = dimensions;
    ArrayView3::from_shape((dz, dy, dx), values).ok()
}
