//! Module for retrieving complete NRRD objects from memory.

use crate::affine::SpatialTransform;
use crate::decoder::decode_data;
use crate::error::Result;
use crate::header::NrrdHeader;
use crate::volume::VolumeDataset;
use tracing::debug;

/// An NRRD file fully decoded in memory: its header and its volume.
#[derive(Debug, PartialEq, Clone)]
pub struct NrrdObject {
    header: NrrdHeader,
    volume: VolumeDataset,
}

impl NrrdObject {
    /// Parse a complete NRRD file (header, blank line and data block).
    ///
    /// # Example
    ///
    /// ```
    /// use volren::NrrdObject;
    /// # use volren::error::Result;
    ///
    /// # fn run() -> Result<()> {
    /// let mut bytes = b"NRRD0004\ntype: unsigned char\ndimension: 3\nsizes: 2 2 1\nencoding: raw\n\n".to_vec();
    /// bytes.extend_from_slice(&[10, 20, 30, 40]);
    /// let obj = NrrdObject::from_bytes(&bytes)?;
    /// assert_eq!(obj.volume().dimensions(), [2, 2, 1]);
    /// assert_eq!(obj.volume().value_range(), (10., 40.));
    /// # Ok(())
    /// # }
    /// # run().unwrap()
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<NrrdObject> {
        let (header, data_start) = NrrdHeader::from_bytes(bytes)?;
        let volume = Self::build_volume(&header, &bytes[data_start..])?;
        Ok(NrrdObject { header, volume })
    }

    /// Decode a data block described by an already parsed header.
    pub fn from_header_and_data(header: NrrdHeader, data: &[u8]) -> Result<NrrdObject> {
        let volume = Self::build_volume(&header, data)?;
        Ok(NrrdObject { header, volume })
    }

    fn build_volume(header: &NrrdHeader, data: &[u8]) -> Result<VolumeDataset> {
        let buffer = decode_data(header, data)?;
        let spatial = SpatialTransform::from_nrrd_header(header)?;
        let volume = VolumeDataset::new(
            header.spatial_sizes(),
            header.frame_count(),
            header.element_type,
            buffer,
            spatial,
        )?;
        debug!(
            dimensions = ?volume.dimensions(),
            frames = volume.frame_count(),
            "built NRRD volume"
        );
        Ok(volume)
    }

    /// Obtain a reference to the NRRD header.
    pub fn header(&self) -> &NrrdHeader {
        &self.header
    }

    /// Obtain a reference to the decoded volume.
    pub fn volume(&self) -> &VolumeDataset {
        &self.volume
    }

    /// Move the volume out of the object, discarding the header.
    pub fn into_volume(self) -> VolumeDataset {
        self.volume
    }
}

/// Parse a complete NRRD file into a volume.
pub fn parse_nrrd(bytes: &[u8]) -> Result<VolumeDataset> {
    NrrdObject::from_bytes(bytes).map(NrrdObject::into_volume)
}
