//! Decoding of NRRD data blocks into typed voxel buffers.
use crate::error::{Result, VolumeError};
use crate::header::NrrdHeader;
use crate::typedef::{ElementType, Encoding};
use crate::util::DATA_ENDIANNESS;
use crate::volume::{DataElement, VolumeBuffer};
use flate2::bufread::GzDecoder;
use std::io::Read;
use tracing::{debug, warn};

/// Decode the data block following an NRRD header.
///
/// The output holds exactly `header.element_count()` values, with
/// `Float64` input narrowed to `Float32`.
///
/// # Errors
///
/// - `SizeMismatch` if the block does not hold exactly one value per voxel
/// - `InvalidDataToken` if a text encoded token is not a number of the
///   declared element type
/// - `Io` if gzip decompression fails
pub fn decode_data(header: &NrrdHeader, data: &[u8]) -> Result<VolumeBuffer> {
    if header.declares_big_endian() {
        warn!("NRRD header declares big endian data, reading as little endian");
    }
    let expected = header.element_count();
    let buffer = match header.encoding {
        Encoding::Raw => decode_raw(header.element_type, data, expected)?,
        Encoding::Gzip => {
            let mut inflated = Vec::new();
            let _ = GzDecoder::new(data).read_to_end(&mut inflated)?;
            decode_raw(header.element_type, &inflated, expected)?
        }
        Encoding::Ascii | Encoding::Hex => {
            decode_text(header.element_type, data, header.encoding.radix())?
        }
    };
    if buffer.len() != expected {
        return Err(VolumeError::SizeMismatch(expected, buffer.len()));
    }
    debug!(len = buffer.len(), encoding = ?header.encoding, "decoded NRRD data block");
    Ok(buffer)
}

fn raw_values<T: DataElement>(data: &[u8], expected: usize) -> Result<Vec<T>> {
    let size = std::mem::size_of::<T>();
    if data.len() % size != 0 || data.len() / size != expected {
        return Err(VolumeError::SizeMismatch(expected, data.len() / size));
    }
    Ok(T::from_raw_vec(data, DATA_ENDIANNESS))
}

/// Reinterpret raw little endian bytes as `expected` values of type `ty`.
pub fn decode_raw(ty: ElementType, data: &[u8], expected: usize) -> Result<VolumeBuffer> {
    use ElementType::*;
    let buffer = match ty {
        Int8 => raw_values::<i8>(data, expected)?.into(),
        UInt8 => raw_values::<u8>(data, expected)?.into(),
        Int16 => raw_values::<i16>(data, expected)?.into(),
        UInt16 => raw_values::<u16>(data, expected)?.into(),
        Int32 => raw_values::<i32>(data, expected)?.into(),
        UInt32 => raw_values::<u32>(data, expected)?.into(),
        Float32 => raw_values::<f32>(data, expected)?.into(),
        Float64 => VolumeBuffer::from_f64(raw_values::<f64>(data, expected)?),
    };
    Ok(buffer)
}

/// Whether `b` separates two tokens of a text data block.
#[inline]
fn is_separator(b: u8) -> bool {
    (9..=13).contains(&b) || b == b' '
}

fn text_values<T: DataElement>(data: &[u8], radix: u32) -> Result<Vec<T>> {
    data.split(|b| is_separator(*b))
        .filter(|t| !t.is_empty())
        .map(|token| {
            let token = String::from_utf8_lossy(token);
            T::from_token(&token, radix).ok_or_else(|| VolumeError::InvalidDataToken(token.into_owned()))
        })
        .collect()
}

/// Parse a text data block of whitespace separated numbers.
pub fn decode_text(ty: ElementType, data: &[u8], radix: u32) -> Result<VolumeBuffer> {
    use ElementType::*;
    let buffer = match ty {
        Int8 => text_values::<i8>(data, radix)?.into(),
        UInt8 => text_values::<u8>(data, radix)?.into(),
        Int16 => text_values::<i16>(data, radix)?.into(),
        UInt16 => text_values::<u16>(data, radix)?.into(),
        Int32 => text_values::<i32>(data, radix)?.into(),
        UInt32 => text_values::<u32>(data, radix)?.into(),
        Float32 => text_values::<f32>(data, radix)?.into(),
        Float64 => VolumeBuffer::from_f64(text_values::<f64>(data, radix)?),
    };
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn raw_uint16() {
        let data = [0x01, 0x00, 0xff, 0xff, 0x34, 0x12];
        let buffer = decode_raw(ElementType::UInt16, &data, 3).unwrap();
        assert_eq!(buffer, VolumeBuffer::UInt16(vec![1, 0xffff, 0x1234]));
    }

    #[test]
    fn raw_length_is_checked() {
        let err = decode_raw(ElementType::UInt16, &[0, 1, 2], 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = decode_raw(ElementType::UInt8, &[0, 1, 2], 4).unwrap_err();
        assert!(matches!(err, VolumeError::SizeMismatch(4, 3)));
    }

    #[test]
    fn raw_float64_is_narrowed() {
        let mut data = Vec::new();
        data.extend_from_slice(&0.25f64.to_le_bytes());
        data.extend_from_slice(&(-8f64).to_le_bytes());
        let buffer = decode_raw(ElementType::Float64, &data, 2).unwrap();
        assert_eq!(buffer, VolumeBuffer::Float32(vec![0.25, -8.]));
    }

    #[test]
    fn text_separators() {
        let data = b"1 2\t3\n4\r\n5\x0b6\x0c7";
        let buffer = decode_text(ElementType::Int32, data, 10).unwrap();
        assert_eq!(buffer, VolumeBuffer::Int32(vec![1, 2, 3, 4, 5, 6, 7]));
    }

    #[test]
    fn text_hex_and_float() {
        let buffer = decode_text(ElementType::UInt8, b"ff 10 0a", 16).unwrap();
        assert_eq!(buffer, VolumeBuffer::UInt8(vec![255, 16, 10]));
        let buffer = decode_text(ElementType::Float32, b" 1.5  -2e1 \n", 10).unwrap();
        assert_eq!(buffer, VolumeBuffer::Float32(vec![1.5, -20.]));
    }

    #[test]
    fn text_bad_token() {
        let err = decode_text(ElementType::UInt8, b"1 2 x3", 10).unwrap_err();
        assert!(matches!(err, VolumeError::InvalidDataToken(ref t) if t == "x3"));
        assert!(decode_text(ElementType::UInt8, b"300", 10).is_err());
    }
}
