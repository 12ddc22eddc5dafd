//! This module contains the closed sets of values understood by the
//! loaders: voxel element types, NRRD data encodings and NRRD coordinate
//! spaces. Each one can be obtained from its textual NRRD name.

use crate::error::{Result, VolumeError};
use std::str::FromStr;

/// Data type of a volume element.
///
/// `Float64` is accepted on input but stored as `Float32`, since volume
/// textures downstream only handle 32-bit floats or smaller. The conversion
/// is lossy.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ElementType {
    /// signed char.
    Int8,
    /// unsigned char.
    UInt8,
    /// signed short.
    Int16,
    /// unsigned short.
    UInt16,
    /// signed int.
    Int32,
    /// unsigned int.
    UInt32,
    /// 32 bit float.
    Float32,
    /// 64 bit float = double.
    Float64,
}

impl ElementType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(&self) -> usize {
        use ElementType::*;
        match *self {
            Int8 | UInt8 => 1,
            Int16 | UInt16 => 2,
            Int32 | UInt32 | Float32 => 4,
            Float64 => 8,
        }
    }

    /// Whether this is one of the fixed width integer types.
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Whether this is a floating point type.
    pub fn is_float(&self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }

    /// Whether values of this type can be negative.
    pub fn is_signed(&self) -> bool {
        use ElementType::*;
        matches!(self, Int8 | Int16 | Int32 | Float32 | Float64)
    }

    /// The element type used to store decoded values of this type.
    pub fn storage_type(&self) -> ElementType {
        match *self {
            ElementType::Float64 => ElementType::Float32,
            t => t,
        }
    }

    /// The fixed normalization range of an integer type, as `(min, max)`.
    ///
    /// Returns `None` for floating point types, which are normalized by the
    /// observed range of the data instead.
    pub fn type_range(&self) -> Option<(f64, f64)> {
        use ElementType::*;
        match *self {
            Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            UInt8 => Some((0., u8::MAX as f64)),
            Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            UInt16 => Some((0., u16::MAX as f64)),
            Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            UInt32 => Some((0., u32::MAX as f64)),
            Float32 | Float64 => None,
        }
    }

    /// Map an NRRD `type` field value to an element type.
    ///
    /// # Errors
    ///
    /// - `UnsupportedElementType` for the 64-bit integer names
    /// - `UnknownElementType` for anything else that is not recognized
    pub fn from_nrrd_name(name: &str) -> Result<Self> {
        use ElementType::*;
        let t = match name {
            "signed char" | "int8" | "int8_t" => Int8,
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => UInt8,
            "short" | "short int" | "signed short" | "signed short int" | "int16" | "int16_t" => {
                Int16
            }
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => UInt16,
            "int" | "signed int" | "int32" | "int32_t" => Int32,
            "uint" | "unsigned int" | "uint32" | "uint32_t" => UInt32,
            "float" => Float32,
            "double" => Float64,
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" | "ulonglong"
            | "unsigned long long" | "unsigned long long int" | "uint64" | "uint64_t" => {
                return Err(VolumeError::UnsupportedElementType(name.to_string()))
            }
            _ => return Err(VolumeError::UnknownElementType(name.to_string())),
        };
        Ok(t)
    }
}

/// Encoding of an NRRD data block.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Encoding {
    /// Verbatim bytes.
    Raw,
    /// Gzip compressed raw bytes.
    Gzip,
    /// Whitespace separated decimal numbers (`ascii`, `text` or `txt`).
    Ascii,
    /// Whitespace separated hexadecimal integers.
    Hex,
}

impl Encoding {
    /// The radix used by text encodings to parse integer tokens.
    pub fn radix(&self) -> u32 {
        match *self {
            Encoding::Hex => 16,
            _ => 10,
        }
    }

    /// Whether the data block is a sequence of text tokens.
    pub fn is_text(&self) -> bool {
        matches!(self, Encoding::Ascii | Encoding::Hex)
    }
}

impl FromStr for Encoding {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Encoding::Raw),
            "ascii" | "text" | "txt" => Ok(Encoding::Ascii),
            "hex" => Ok(Encoding::Hex),
            "bz2" | "bzip2" => Err(VolumeError::UnsupportedEncoding(s.to_string())),
            _ if s.starts_with("gz") => Ok(Encoding::Gzip),
            _ => Err(VolumeError::UnknownEncoding(s.to_string())),
        }
    }
}

/// An NRRD world coordinate space.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Space {
    /// right-anterior-superior (RAS)
    RightAnteriorSuperior,
    /// left-anterior-superior (LAS)
    LeftAnteriorSuperior,
    /// left-posterior-superior (LPS)
    LeftPosteriorSuperior,
    /// scanner-xyz
    ScannerXyz,
    /// 3D-right-handed
    RightHanded3D,
    /// 3D-left-handed
    LeftHanded3D,
}

impl Space {
    /// Signs that map a position in this space to RAS.
    ///
    /// Spaces without an anatomical convention are taken as-is.
    pub fn ras_signs(&self) -> [f32; 3] {
        match *self {
            Space::LeftAnteriorSuperior => [-1., 1., 1.],
            Space::LeftPosteriorSuperior => [-1., -1., 1.],
            _ => [1., 1., 1.],
        }
    }
}

impl FromStr for Space {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        let name = lower.strip_suffix("-time").unwrap_or(&lower);
        match name {
            "right-anterior-superior" | "ras" => Ok(Space::RightAnteriorSuperior),
            "left-anterior-superior" | "las" => Ok(Space::LeftAnteriorSuperior),
            "left-posterior-superior" | "lps" => Ok(Space::LeftPosteriorSuperior),
            "scanner-xyz" => Ok(Space::ScannerXyz),
            "3d-right-handed" => Ok(Space::RightHanded3D),
            "3d-left-handed" => Ok(Space::LeftHanded3D),
            _ => Err(VolumeError::InvalidField("space".to_string(), s.to_string())),
        }
    }
}
