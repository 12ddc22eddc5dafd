//! Synthetic NRRD and DICOM files for the integration tests.

/// The header of the smallest meaningful NRRD file, a 2x2x1 `uchar` volume.
pub const MINIMAL_NRRD_HEADER: &str =
    "NRRD0004\ntype: unsigned char\ndimension: 3\nsizes: 2 2 1\nencoding: raw\n\n";

/// A complete NRRD file made of `header` (including the blank line) and
/// the data block `data`.
pub fn nrrd_file(header: &str, data: &[u8]) -> Vec<u8> {
    let mut out = header.as_bytes().to_vec();
    out.extend_from_slice(data);
    out
}

/// A header for a raw volume of the given NRRD type and sizes.
pub fn nrrd_header(type_name: &str, encoding: &str, sizes: &[usize]) -> String {
    let sizes: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
    format!(
        "NRRD0004\n# generated\ntype: {}\ndimension: {}\nsizes: {}\nencoding: {}\n\n",
        type_name,
        sizes.len(),
        sizes.join(" "),
        encoding
    )
}

/// Little endian bytes of a `u16` buffer.
#[allow(dead_code)]
pub fn u16_le_bytes(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect()
}

const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";
const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

fn element(group: u16, element: u16, vr: &[u8; 2], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(vr);
    if vr == b"OB" || vr == b"OW" || vr == b"SQ" || vr == b"UN" || vr == b"UT" {
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    }
    out.extend_from_slice(value);
    out
}

fn padded(text: &str, pad: u8) -> Vec<u8> {
    let mut value = text.as_bytes().to_vec();
    if value.len() % 2 == 1 {
        value.push(pad);
    }
    value
}

/// A DICOM slice description used to build a file.
#[derive(Debug, Clone)]
pub struct SliceSpec {
    pub rows: u16,
    pub columns: u16,
    pub bits_allocated: u16,
    pub slice_thickness: Option<&'static str>,
    pub pixels: Vec<u16>,
}

impl SliceSpec {
    /// A 16-bit slice whose samples count up from `start`.
    pub fn ramp(rows: u16, columns: u16, start: u16) -> Self {
        let n = usize::from(rows) * usize::from(columns);
        SliceSpec {
            rows,
            columns,
            bits_allocated: 16,
            slice_thickness: None,
            pixels: (0..n).map(|i| start + i as u16).collect(),
        }
    }

    #[allow(dead_code)]
    pub fn with_thickness(mut self, thickness: &'static str) -> Self {
        self.slice_thickness = Some(thickness);
        self
    }

    /// Encode as a Part 10 file in explicit VR little endian.
    pub fn to_file(&self) -> Vec<u8> {
        let mut meta = Vec::new();
        meta.extend(element(0x0002, 0x0001, b"OB", &[0, 1]));
        meta.extend(element(0x0002, 0x0002, b"UI", &padded(CT_IMAGE_STORAGE, 0)));
        meta.extend(element(0x0002, 0x0003, b"UI", &padded("2.25.1", 0)));
        meta.extend(element(0x0002, 0x0010, b"UI", &padded(EXPLICIT_VR_LE, 0)));
        meta.extend(element(0x0002, 0x0012, b"UI", &padded("2.25.2", 0)));

        let mut out = vec![0; 128];
        out.extend_from_slice(b"DICM");
        out.extend(element(0x0002, 0x0000, b"UL", &(meta.len() as u32).to_le_bytes()));
        out.extend(meta);
        out.extend(element(0x0008, 0x0060, b"CS", &padded("CT", b' ')));
        if let Some(t) = self.slice_thickness {
            out.extend(element(0x0018, 0x0050, b"DS", &padded(t, b' ')));
        }
        out.extend(element(0x0028, 0x0010, b"US", &self.rows.to_le_bytes()));
        out.extend(element(0x0028, 0x0011, b"US", &self.columns.to_le_bytes()));
        out.extend(element(0x0028, 0x0100, b"US", &self.bits_allocated.to_le_bytes()));
        out.extend(element(0x0028, 0x0101, b"US", &12u16.to_le_bytes()));
        out.extend(element(0x0028, 0x0102, b"US", &11u16.to_le_bytes()));
        let pixels: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|v| v.to_le_bytes().to_vec())
            .collect();
        out.extend(element(0x7FE0, 0x0010, b"OW", &pixels));
        out
    }
}
