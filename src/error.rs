//! Types for error handling go here.
use std::io::Error as IOError;

/// Broad classification of a [`VolumeError`].
///
/// Every load failure is fatal to the load attempt that produced it, so the
/// classification is only meant for reporting.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorKind {
    /// Malformed or inconsistent input data.
    Format,
    /// Out of range access to an existing dataset.
    Index,
    /// Valid input using a feature this crate does not implement.
    UnsupportedFeature,
}

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum VolumeError {
        /// No line of the header carried the `NRRD000X` magic token.
        MissingMagic {
            display("Not an NRRD file: magic line is missing")
        }
        /// The NRRD header is not terminated by a blank line.
        MissingHeaderTerminator {
            display("NRRD header is not terminated by a blank line")
        }
        /// A field required to interpret the data block is absent.
        MissingField(field: &'static str) {
            display("Missing required NRRD field `{}`", field)
        }
        /// A field value could not be interpreted.
        InvalidField(field: String, value: String) {
            display("Invalid value for NRRD field `{}`: {:?}", field, value)
        }
        /// Unrecognized element type name.
        UnknownElementType(name: String) {
            display("Unsupported NRRD data type: {}", name)
        }
        /// Unrecognized data encoding name.
        UnknownEncoding(name: String) {
            display("Unknown NRRD encoding: {}", name)
        }
        /// `dimension` does not agree with the number of `sizes`.
        InconsistentDimension(dimension: usize, sizes: usize) {
            display("Dimension is {} but {} sizes were declared", dimension, sizes)
        }
        /// Number of decoded elements does not match the declared shape.
        SizeMismatch(expected: usize, got: usize) {
            display("Number of datapoints ({}) does not match dimensions ({})", got, expected)
        }
        /// A token of a text encoded data block is not a number.
        InvalidDataToken(token: String) {
            display("Invalid number in text data block: {:?}", token)
        }
        /// A volume dimension or frame count is zero.
        EmptyVolume {
            display("Volume dimensions must be positive")
        }
        /// The slices of a DICOM series do not share the same rows/columns.
        InconsistentSlices(index: usize, expected: (u16, u16), got: (u16, u16)) {
            display("Slice {} has dimensions {:?} (rows, cols), expected {:?}", index, got, expected)
        }
        /// A DICOM slice is structurally broken.
        InvalidDicom(reason: String) {
            display("Failed to parse DICOM file: {}", reason)
        }
        /// A DICOM slice lacks an attribute needed to build the volume.
        MissingDicomAttribute(name: &'static str) {
            display("DICOM attribute {} is missing", name)
        }
        /// The series holds no slices at all.
        NoSlices {
            display("No DICOM slices were given")
        }
        /// The voxel to physical matrix cannot be inverted.
        NonInvertibleTransform {
            display("Spatial transform is not invertible")
        }
        /// Attempted to read a frame past the end of the dataset.
        FrameOutOfBounds(index: usize, count: usize) {
            display("Frame {} is out of bounds (frame count is {})", index, count)
        }
        /// The encoding is known but not supported.
        UnsupportedEncoding(name: String) {
            display("Unsupported NRRD encoding: {}", name)
        }
        /// The element type is known but not supported.
        UnsupportedElementType(name: String) {
            display("Unsupported element type: {}", name)
        }
        /// Compressed, deflated or otherwise unsupported DICOM transfer syntax.
        UnsupportedTransferSyntax(uid: String) {
            display("Unsupported DICOM transfer syntax {}", uid)
        }
        /// Only 16 bit DICOM samples are supported.
        UnsupportedBitsAllocated(bits: u16) {
            display("Unsupported DICOM bits allocated: {}", bits)
        }
        /// Volumes with more than 4 axes are not supported.
        UnsupportedDimension(dimension: usize) {
            display("Unsupported dimension: {}", dimension)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

impl VolumeError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use VolumeError::*;
        match self {
            FrameOutOfBounds(..) => ErrorKind::Index,
            UnsupportedEncoding(_)
            | UnsupportedElementType(_)
            | UnsupportedTransferSyntax(_)
            | UnsupportedBitsAllocated(_)
            | UnsupportedDimension(_) => ErrorKind::UnsupportedFeature,
            _ => ErrorKind::Format,
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, VolumeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(VolumeError::MissingMagic.kind(), ErrorKind::Format);
        assert_eq!(VolumeError::SizeMismatch(4, 3).kind(), ErrorKind::Format);
        assert_eq!(VolumeError::FrameOutOfBounds(4, 4).kind(), ErrorKind::Index);
        assert_eq!(
            VolumeError::UnsupportedEncoding("bzip2".into()).kind(),
            ErrorKind::UnsupportedFeature
        );
        let eof = IOError::from(std::io::ErrorKind::UnexpectedEof);
        assert_eq!(VolumeError::from(eof).kind(), ErrorKind::Format);
    }
}
