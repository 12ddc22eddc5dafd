//! This module defines the `NrrdHeader` struct, which describes the layout
//! of an NRRD volume: element type, data encoding, shape and orientation.
//!
//! An NRRD header is a block of text lines, terminated by a blank line.
//! The first meaningful line carries the magic token (`NRRD0004` and
//! alike), lines starting with `#` are comments, and every other line is a
//! `field: value` pair. Fields which are not needed to decode and place the
//! volume are retained verbatim in [`NrrdHeader::metadata`].

use crate::error::{Result, VolumeError};
use crate::typedef::{ElementType, Encoding, Space};
use crate::util::find_header_end;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// A parsed NRRD header.
#[derive(Debug, Clone, PartialEq)]
pub struct NrrdHeader {
    /// Element type of the data block.
    pub element_type: ElementType,
    /// Encoding of the data block.
    pub encoding: Encoding,
    /// Number of axes, equal to `sizes.len()`.
    pub dimension: usize,
    /// Number of samples along each axis, fastest axis first.
    pub sizes: Vec<usize>,
    /// Declared byte order. Parsed, but the loader always reads little endian.
    pub endian: Option<String>,
    /// World coordinate space, if declared and recognized.
    pub space: Option<Space>,
    /// Position of the first voxel in world space.
    pub space_origin: Option<Vector3<f32>>,
    /// One direction vector per axis. Non-spatial axes (`none`) are zero.
    pub space_directions: Vec<Vector3<f32>>,
    /// Sample spacing along each axis.
    pub spacings: Option<Vec<f32>>,
    /// Fields not interpreted by the loader, including `key:=value` pairs.
    pub metadata: BTreeMap<String, String>,
}

impl NrrdHeader {
    /// Parse the header text block (everything before the blank line).
    pub fn parse(text: &str) -> Result<NrrdHeader> {
        parse_header(text)
    }

    /// Parse the header at the start of a complete NRRD byte buffer.
    ///
    /// Returns the header and the offset of the first data byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<(NrrdHeader, usize)> {
        let (header_len, data_start) =
            find_header_end(bytes).ok_or(VolumeError::MissingHeaderTerminator)?;
        let text = String::from_utf8_lossy(&bytes[..header_len]);
        let header = parse_header(&text)?;
        Ok((header, data_start))
    }

    /// Total number of elements in the data block, saturating at
    /// `usize::MAX`.
    pub fn element_count(&self) -> usize {
        self.sizes
            .iter()
            .try_fold(1usize, |acc, s| acc.checked_mul(*s))
            .unwrap_or(usize::MAX)
    }

    /// The spatial shape `(x, y, z)`, with missing axes set to 1.
    pub fn spatial_sizes(&self) -> [usize; 3] {
        let mut out = [1; 3];
        for (o, s) in out.iter_mut().zip(&self.sizes) {
            *o = *s;
        }
        out
    }

    /// Number of frames: the size of the 4th axis, or 1 for 3D data.
    pub fn frame_count(&self) -> usize {
        self.sizes.get(3).copied().unwrap_or(1)
    }

    /// Whether the header declares big endian data.
    pub fn declares_big_endian(&self) -> bool {
        self.endian.as_deref() == Some("big")
    }
}

fn is_magic(line: &str) -> bool {
    match line.trim().strip_prefix("NRRD") {
        Some(version) => !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn invalid(field: &str, value: &str) -> VolumeError {
    VolumeError::InvalidField(field.to_string(), value.to_string())
}

fn parse_usize_list(field: &str, value: &str) -> Result<Vec<usize>> {
    value
        .split_whitespace()
        .map(|t| t.parse::<usize>().map_err(|_| invalid(field, value)))
        .collect()
}

fn parse_float_list(field: &str, value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|t| t.parse::<f32>().map_err(|_| invalid(field, value)))
        .collect()
}

/// Parse a parenthesized vector such as `(1.5,0,-2)`.
fn parse_vector(field: &str, token: &str) -> Result<Vector3<f32>> {
    let inner = token
        .trim()
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| invalid(field, token))?;
    let components = inner
        .split(',')
        .map(|c| c.trim().parse::<f32>().map_err(|_| invalid(field, token)))
        .collect::<Result<Vec<_>>>()?;
    if components.is_empty() || components.len() > 3 {
        return Err(invalid(field, token));
    }
    let mut v = Vector3::zeros();
    for (i, c) in components.into_iter().enumerate() {
        v[i] = c;
    }
    Ok(v)
}

/// Parse the `space directions` value: one vector or `none` per axis.
fn parse_directions(value: &str) -> Result<Vec<Vector3<f32>>> {
    const FIELD: &str = "space directions";
    let mut out = Vec::new();
    let mut rest = value.trim_start();
    while !rest.is_empty() {
        if rest.starts_with('(') {
            let end = rest.find(')').ok_or_else(|| invalid(FIELD, value))?;
            out.push(parse_vector(FIELD, &rest[..=end])?);
            rest = rest[end + 1..].trim_start();
        } else if let Some(tail) = rest.strip_prefix("none") {
            out.push(Vector3::zeros());
            rest = tail.trim_start();
        } else {
            return Err(invalid(FIELD, value));
        }
    }
    Ok(out)
}

/// Identity basis scaled by the spacings, one vector per axis.
fn default_directions(dimension: usize, spacings: Option<&[f32]>) -> Vec<Vector3<f32>> {
    (0..dimension)
        .map(|axis| {
            if axis >= 3 {
                return Vector3::zeros();
            }
            let mut v = Vector3::zeros();
            v[axis] = 1.;
            match spacings.and_then(|s| s.get(axis)) {
                Some(s) if s.is_finite() => v * *s,
                _ => v,
            }
        })
        .collect()
}

fn parse_header(text: &str) -> Result<NrrdHeader> {
    let mut is_nrrd = false;
    let mut element_type = None;
    let mut encoding = None;
    let mut dimension = None;
    let mut sizes = None;
    let mut endian = None;
    let mut space = None;
    let mut space_origin = None;
    let mut space_directions = None;
    let mut spacings = None;
    let mut metadata = BTreeMap::new();

    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') {
            continue;
        }
        if is_magic(line) {
            is_nrrd = true;
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f.trim(), v.trim()),
            None => continue,
        };
        if let Some(kv) = value.strip_prefix('=') {
            // `key:=value` pairs carry free form metadata
            let _ = metadata.insert(field.to_string(), kv.to_string());
            continue;
        }
        match field {
            "type" => element_type = Some(ElementType::from_nrrd_name(value)?),
            "encoding" => encoding = Some(value.parse::<Encoding>()?),
            "dimension" => {
                dimension = Some(value.parse::<usize>().map_err(|_| invalid(field, value))?)
            }
            "sizes" => sizes = Some(parse_usize_list(field, value)?),
            "endian" => endian = Some(value.to_string()),
            "space" => match value.parse::<Space>() {
                Ok(s) => space = Some(s),
                Err(_) => {
                    trace!(space = value, "retaining unrecognized space");
                    let _ = metadata.insert(field.to_string(), value.to_string());
                }
            },
            "space origin" => space_origin = Some(parse_vector(field, value)?),
            "space directions" => {
                space_directions = Some((parse_directions(value)?, value.to_string()))
            }
            "spacings" => spacings = Some(parse_float_list(field, value)?),
            _ => {
                trace!(field, "retaining unknown NRRD field");
                let _ = metadata.insert(field.to_string(), value.to_string());
            }
        }
    }

    if !is_nrrd {
        return Err(VolumeError::MissingMagic);
    }
    let element_type = element_type.ok_or(VolumeError::MissingField("type"))?;
    let encoding = encoding.ok_or(VolumeError::MissingField("encoding"))?;
    let sizes: Vec<usize> = sizes.ok_or(VolumeError::MissingField("sizes"))?;
    let dimension = dimension.unwrap_or_else(|| sizes.len());
    if dimension != sizes.len() {
        return Err(VolumeError::InconsistentDimension(dimension, sizes.len()));
    }
    if dimension == 0 {
        return Err(VolumeError::EmptyVolume);
    }
    if dimension > 4 {
        return Err(VolumeError::UnsupportedDimension(dimension));
    }
    // the data block size in bytes must be addressable
    let byte_count = sizes
        .iter()
        .try_fold(element_type.size_of(), |acc, s| acc.checked_mul(*s));
    if byte_count.is_none() {
        let text: Vec<String> = sizes.iter().map(ToString::to_string).collect();
        return Err(invalid("sizes", &text.join(" ")));
    }
    let space_directions = match space_directions {
        Some((d, _)) if d.len() == dimension => d,
        Some((_, text)) => return Err(invalid("space directions", &text)),
        None => default_directions(dimension, spacings.as_deref()),
    };

    debug!(?element_type, ?encoding, ?sizes, "parsed NRRD header");

    Ok(NrrdHeader {
        element_type,
        encoding,
        dimension,
        sizes,
        endian,
        space,
        space_origin,
        space_directions,
        spacings,
        metadata,
    })
}
