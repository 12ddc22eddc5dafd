//! Stacking of parsed DICOM slices into a volume.
use super::slice::DicomSlice;
use crate::affine::SpatialTransform;
use crate::error::{Result, VolumeError};
use crate::progress::{NoProgress, ProgressSink, SliceProgress};
use crate::typedef::ElementType;
use crate::volume::{VolumeBuffer, VolumeDataset};
use nalgebra::Vector3;
use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Options of a DICOM series load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DicomOptions {
    /// Parse slices concurrently on the rayon thread pool.
    pub parallel: bool,
    /// Use the slice thickness of the first slice declaring one as the
    /// voxel spacing along z.
    pub apply_slice_thickness: bool,
}

impl Default for DicomOptions {
    fn default() -> Self {
        DicomOptions {
            parallel: true,
            apply_slice_thickness: true,
        }
    }
}

impl DicomOptions {
    /// Enable or disable concurrent slice parsing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable z scaling by the slice thickness.
    pub fn with_slice_thickness(mut self, apply: bool) -> Self {
        self.apply_slice_thickness = apply;
        self
    }
}

/// Shared state of a series load, updated once per parsed slice.
#[derive(Debug)]
struct SeriesState {
    expected: Option<(u16, u16)>,
    min: f32,
    max: f32,
    completed: usize,
}

fn lock(state: &Mutex<SeriesState>) -> MutexGuard<'_, SeriesState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn process_slice<P: ProgressSink + ?Sized>(
    index: usize,
    bytes: &[u8],
    total: usize,
    state: &Mutex<SeriesState>,
    progress: &P,
) -> Result<DicomSlice> {
    let slice = DicomSlice::parse(bytes)?;
    let dims = slice.dimensions();
    debug!(index, rows = dims.0, cols = dims.1, "parsed DICOM slice");
    let range = slice.value_range();

    let mut s = lock(state);
    match s.expected {
        None => s.expected = Some(dims),
        Some(expected) if expected != dims => {
            return Err(VolumeError::InconsistentSlices(index, expected, dims));
        }
        Some(_) => {}
    }
    if let Some((lo, hi)) = range {
        s.min = s.min.min(lo);
        s.max = s.max.max(hi);
    }
    s.completed += 1;
    // notify under the lock so that observers see a monotonic count
    progress.on_progress(SliceProgress {
        completed: s.completed,
        total,
    });
    Ok(slice)
}

/// Assemble a series of DICOM files into a volume with default options.
///
/// See [`assemble_with`].
pub fn assemble<B>(files: &[B]) -> Result<VolumeDataset>
where
    B: AsRef<[u8]> + Sync,
{
    assemble_with(files, &DicomOptions::default(), &NoProgress)
}

/// Assemble a series of DICOM files into a volume.
///
/// Each element of `files` is one complete DICOM file holding one slice;
/// the order of `files` is the z order of the volume. The resulting dataset
/// stores samples as `Float32` and is only returned once every slice parsed
/// successfully.
///
/// # Errors
///
/// - `NoSlices` if `files` is empty
/// - `InconsistentSlices` if two slices differ in rows or columns
/// - any error of [`DicomSlice::parse`]; the first failure aborts the load
pub fn assemble_with<B, P>(files: &[B], options: &DicomOptions, progress: &P) -> Result<VolumeDataset>
where
    B: AsRef<[u8]> + Sync,
    P: ProgressSink + ?Sized,
{
    if files.is_empty() {
        return Err(VolumeError::NoSlices);
    }
    let total = files.len();
    let state = Mutex::new(SeriesState {
        expected: None,
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
        completed: 0,
    });

    let slices: Vec<DicomSlice> = if options.parallel {
        files
            .par_iter()
            .enumerate()
            .map(|(i, f)| process_slice(i, f.as_ref(), total, &state, progress))
            .collect::<Result<_>>()?
    } else {
        files
            .iter()
            .enumerate()
            .map(|(i, f)| process_slice(i, f.as_ref(), total, &state, progress))
            .collect::<Result<_>>()?
    };

    let state = match state.into_inner() {
        Ok(s) => s,
        Err(poisoned) => poisoned.into_inner(),
    };
    let (rows, columns) = slices[0].dimensions();
    let frame_size = usize::from(rows) * usize::from(columns);
    let mut data = Vec::with_capacity(frame_size * slices.len());
    for slice in &slices {
        data.extend_from_slice(&slice.pixels);
    }

    let thickness = if options.apply_slice_thickness {
        slices
            .iter()
            .filter_map(|s| s.slice_thickness)
            .find(|t| *t > 0. && t.is_finite())
    } else {
        None
    };
    let spacing = Vector3::new(1., 1., thickness.unwrap_or(1.));
    let value_range = if state.min <= state.max {
        (f64::from(state.min), f64::from(state.max))
    } else {
        (0., 0.)
    };
    debug!(
        slices = slices.len(),
        rows,
        columns,
        ?thickness,
        "assembled DICOM series"
    );

    VolumeDataset::from_parts(
        [usize::from(columns), usize::from(rows), slices.len()],
        1,
        ElementType::Float32,
        VolumeBuffer::Float32(data),
        value_range,
        SpatialTransform::from_spacing(spacing)?,
    )
}
