//! Loading of DICOM slice series.
//!
//! Files are read with the `dicom` crate. Only single-frame grayscale slices
//! in one of the three uncompressed transfer syntaxes, with 16 bits
//! allocated per sample, can be stacked into a volume.
//!
//! A series is given as an ordered list of in-memory files, one per slice.
//! The order of the list is the slice order of the volume.

mod assembler;
mod slice;

pub use self::assembler::{assemble, assemble_with, DicomOptions};
pub use self::slice::DicomSlice;
