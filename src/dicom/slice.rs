//! Parsing of a single DICOM file into a grayscale slice.
use crate::error::{Result, VolumeError};
use crate::util::Endianness;
use crate::volume::DataElement;
use ::dicom::core::{PrimitiveValue, Tag};
use ::dicom::core::value::DicomValueType;
use ::dicom::encoding::transfer_syntax::TransferSyntaxIndex;
use ::dicom::object::{FileMetaTable, InMemDicomObject};
use ::dicom::transfer_syntax::TransferSyntaxRegistry;
use dicom_dictionary_std::{tags, uids};
use tracing::trace;

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8] = b"DICM";

fn invalid(reason: impl Into<String>) -> VolumeError {
    VolumeError::InvalidDicom(reason.into())
}

fn byte_order(uid: &str) -> Result<Endianness> {
    match uid {
        uids::IMPLICIT_VR_LITTLE_ENDIAN | uids::EXPLICIT_VR_LITTLE_ENDIAN => {
            Ok(Endianness::Little)
        }
        uids::EXPLICIT_VR_BIG_ENDIAN => Ok(Endianness::Big),
        _ => Err(VolumeError::UnsupportedTransferSyntax(uid.to_string())),
    }
}

/// Guess the encoding of a data set without file meta information by
/// looking for a VR after the first tag.
fn detect_syntax(bytes: &[u8]) -> &'static str {
    let explicit = bytes
        .get(4..6)
        .map(|vr| vr.iter().all(u8::is_ascii_uppercase))
        .unwrap_or(false);
    if explicit {
        uids::EXPLICIT_VR_LITTLE_ENDIAN
    } else {
        uids::IMPLICIT_VR_LITTLE_ENDIAN
    }
}

/// Read the data set of a file, with or without the preamble and file
/// meta group. The transfer syntax is checked before the data set is read.
fn read_object(bytes: &[u8]) -> Result<(InMemDicomObject, Endianness)> {
    let file = if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) == Some(MAGIC) {
        Some(&bytes[PREAMBLE_LEN..])
    } else if bytes.starts_with(MAGIC) {
        Some(bytes)
    } else {
        None
    };

    let (uid, mut src) = match file {
        Some(mut src) => {
            let meta = FileMetaTable::from_reader(&mut src).map_err(|e| invalid(e.to_string()))?;
            let uid = meta
                .transfer_syntax()
                .trim_end_matches(|c: char| c == '\0' || c == ' ')
                .to_string();
            (uid, src)
        }
        None => (detect_syntax(bytes).to_string(), bytes),
    };
    let endianness = byte_order(&uid)?;
    let ts = TransferSyntaxRegistry
        .get(&uid)
        .ok_or_else(|| VolumeError::UnsupportedTransferSyntax(uid.clone()))?;
    trace!(transfer_syntax = %uid, "reading DICOM data set");

    let obj = InMemDicomObject::read_dataset_with_ts(&mut src, ts)
        .map_err(|e| invalid(e.to_string()))?;
    Ok((obj, endianness))
}

fn read_us(obj: &InMemDicomObject, tag: Tag) -> Result<Option<u16>> {
    obj.get(tag)
        .map(|e| {
            e.to_int::<u16>()
                .map_err(|err| invalid(format!("{}: {}", tag, err)))
        })
        .transpose()
}

fn read_pixels(value: &PrimitiveValue, count: usize, e: Endianness) -> Result<Vec<f32>> {
    let pixels: Vec<f32> = match value {
        PrimitiveValue::U16(v) => v.iter().take(count).map(|x| f32::from(*x)).collect(),
        PrimitiveValue::I16(v) => v.iter().take(count).map(|x| f32::from(*x)).collect(),
        // implicit VR data may leave the pixel data as plain bytes
        PrimitiveValue::U8(b) => {
            let n = (b.len() / 2).min(count);
            u16::from_raw_vec(&b[..n * 2], e)
                .into_iter()
                .map(f32::from)
                .collect()
        }
        other => {
            return Err(invalid(format!(
                "pixel data of type {:?} is not a 16 bit sample array",
                other.value_type()
            )))
        }
    };
    if pixels.len() < count {
        return Err(invalid(format!(
            "pixel data holds {} samples, {} needed",
            pixels.len(),
            count
        )));
    }
    Ok(pixels)
}

/// One decoded grayscale DICOM slice.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomSlice {
    /// Number of pixel rows.
    pub rows: u16,
    /// Number of pixel columns.
    pub columns: u16,
    /// Bits allocated per sample. Always 16.
    pub bits_allocated: u16,
    /// Bits stored per sample.
    pub bits_stored: Option<u16>,
    /// Most significant bit of a sample.
    pub high_bit: Option<u16>,
    /// Slice thickness in millimetres.
    pub slice_thickness: Option<f32>,
    /// `rows * columns` samples in row major order.
    pub pixels: Vec<f32>,
}

impl DicomSlice {
    /// Parse a complete DICOM file.
    ///
    /// # Errors
    ///
    /// - `UnsupportedTransferSyntax` for compressed or deflated data sets,
    ///   and for encapsulated pixel data
    /// - `UnsupportedBitsAllocated` for samples other than 16 bits
    /// - `MissingDicomAttribute` if rows, columns, bits allocated or pixel
    ///   data are absent
    /// - `InvalidDicom` for malformed or truncated files
    pub fn parse(bytes: &[u8]) -> Result<DicomSlice> {
        let (obj, endianness) = read_object(bytes)?;

        let rows = read_us(&obj, tags::ROWS)?.ok_or(VolumeError::MissingDicomAttribute("Rows"))?;
        let columns =
            read_us(&obj, tags::COLUMNS)?.ok_or(VolumeError::MissingDicomAttribute("Columns"))?;
        let bits_allocated = read_us(&obj, tags::BITS_ALLOCATED)?
            .ok_or(VolumeError::MissingDicomAttribute("BitsAllocated"))?;
        if bits_allocated != 16 {
            return Err(VolumeError::UnsupportedBitsAllocated(bits_allocated));
        }
        let bits_stored = read_us(&obj, tags::BITS_STORED)?;
        let high_bit = read_us(&obj, tags::HIGH_BIT)?;
        let slice_thickness = obj
            .get(tags::SLICE_THICKNESS)
            .and_then(|e| e.to_float32().ok());

        let pixel_data = obj
            .get(tags::PIXEL_DATA)
            .ok_or(VolumeError::MissingDicomAttribute("PixelData"))?;
        let value = pixel_data.value().primitive().ok_or_else(|| {
            VolumeError::UnsupportedTransferSyntax("encapsulated pixel data".to_string())
        })?;
        let count = usize::from(rows) * usize::from(columns);
        let pixels = read_pixels(value, count, endianness)?;

        Ok(DicomSlice {
            rows,
            columns,
            bits_allocated,
            bits_stored,
            high_bit,
            slice_thickness,
            pixels,
        })
    }

    /// `(rows, columns)`
    pub fn dimensions(&self) -> (u16, u16) {
        (self.rows, self.columns)
    }

    /// Minimum and maximum sample, or `None` for an empty slice.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let mut it = self.pixels.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
