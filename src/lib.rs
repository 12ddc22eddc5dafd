//! Volumetric image loading and transfer function compositing.
//!
//! This crate turns NRRD files and DICOM slice series into in-memory volume
//! datasets, and renders them by front-to-back ray marching through a
//! user-edited color and opacity transfer function.
//!
//! # Example
//!
//! ```
//! use volren::{parse_nrrd, ViewerSession};
//! use nalgebra::{Point3, Vector3};
//! # use volren::error::Result;
//!
//! # fn run() -> Result<()> {
//! let mut bytes = b"NRRD0004\ntype: unsigned char\ndimension: 3\nsizes: 2 2 1\nencoding: raw\n\n".to_vec();
//! bytes.extend_from_slice(&[10, 20, 30, 40]);
//!
//! let volume = parse_nrrd(&bytes)?;
//! assert_eq!(volume.frame_count(), 1);
//!
//! let mut session = ViewerSession::default();
//! session.load_nrrd(&bytes)?;
//! let sample = session
//!     .composite_world_ray(&Point3::new(0., 0., -2.), &Vector3::z())
//!     .unwrap();
//! assert!(sample.alpha >= 0.);
//! # Ok(())
//! # }
//! # run().unwrap()
//! ```
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;

pub mod affine;
pub mod color;
pub mod compositor;
pub mod decoder;
pub mod dicom;
pub mod error;
pub mod header;
pub mod object;
pub mod progress;
pub mod session;
pub mod transfer;
pub mod typedef;
mod util;
pub mod volume;

pub use affine::{SpatialTransform, VolumeTransform};
pub use compositor::{Compositor, CompositorOptions, Ray, RaySample, SliceWindow};
pub use self::dicom::{DicomOptions, DicomSlice};
pub use error::{ErrorKind, VolumeError};
pub use header::NrrdHeader;
pub use object::{parse_nrrd, NrrdObject};
pub use progress::{ProgressSink, SliceProgress};
pub use session::ViewerSession;
pub use transfer::{Gradient, TransferFunctionTable};
pub use typedef::{ElementType, Encoding, Space};
pub use util::Endianness;
pub use volume::{DataElement, FrameView, VolumeBuffer, VolumeDataset};
#[cfg(feature = "ndarray_volumes")]
pub use volume::IntoNdArray;
