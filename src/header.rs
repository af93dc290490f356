use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ConvertError, Result};
use crate::index::Index;
use crate::vk_format::VkFormat;

pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Geometry of the source texture, as far as KTX1 cares about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    OneD,
    TwoD,
    ThreeD,
    CubeMap,
}

/// Fixed KTX2 header, including the block index that follows the geometry fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub identifier: [u8; 12],
    pub vk_format: u32,
    pub type_size: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub layer_count: u32,
    pub face_count: u32,
    pub level_count: u32,
    pub supercompression_scheme: u32,
    pub index: Index,
}

impl Header {
    /// Identifier, nine u32 fields and the block index.
    pub const LENGTH: usize = 12 + 9 * 4 + Index::LENGTH;

    /// Parses the header at the start of `buffer` and checks the identifier.
    pub fn parse(buffer: &[u8]) -> Result<Header> {
        if buffer.len() < Header::LENGTH {
            return Err(ConvertError::TruncatedHeader {
                expected: Header::LENGTH,
                actual: buffer.len(),
            });
        }

        let mut identifier = [0u8; 12];
        identifier.copy_from_slice(&buffer[..12]);
        if identifier != KTX2_IDENTIFIER {
            return Err(ConvertError::InvalidSignature { found: identifier });
        }

        let mut fields = [0u32; 9];
        LittleEndian::read_u32_into(&buffer[12..48], &mut fields);

        let mut index_bytes = [0u8; Index::LENGTH];
        index_bytes.copy_from_slice(&buffer[48..Header::LENGTH]);

        let [
            vk_format,
            type_size,
            pixel_width,
            pixel_height,
            pixel_depth,
            layer_count,
            face_count,
            level_count,
            supercompression_scheme,
        ] = fields;

        Ok(Header {
            identifier,
            vk_format,
            type_size,
            pixel_width,
            pixel_height,
            pixel_depth,
            layer_count,
            face_count,
            level_count,
            supercompression_scheme,
            index: Index::from_bytes(&index_bytes),
        })
    }

    /// Rejects inputs KTX1 has no way to represent.
    pub fn validate_convertible(&self) -> Result<()> {
        if self.supercompression_scheme != 0 {
            return Err(ConvertError::UnsupportedSupercompression {
                scheme: self.supercompression_scheme,
            });
        }
        if self.layer_count > 1 {
            return Err(ConvertError::UnsupportedArrayTexture {
                layer_count: self.layer_count,
            });
        }
        if !matches!(self.face_count, 0 | 1 | 6) {
            return Err(ConvertError::InvalidFaceCount {
                face_count: self.face_count,
            });
        }
        if VkFormat::from_raw(self.vk_format).is_none() {
            return Err(ConvertError::UnsupportedPixelFormat {
                vk_format: self.vk_format,
            });
        }
        Ok(())
    }

    /// Face count with the "0 means 1" rule applied.
    pub fn faces(&self) -> u32 {
        self.face_count.max(1)
    }

    /// Number of level index records. A level count of 0 still stores the base level.
    pub fn stored_levels(&self) -> u32 {
        self.level_count.max(1)
    }

    pub fn is_cube_map(&self) -> bool {
        self.face_count == 6
    }

    pub fn kind(&self) -> TextureKind {
        if self.is_cube_map() {
            TextureKind::CubeMap
        } else if self.pixel_depth > 0 {
            TextureKind::ThreeD
        } else if self.pixel_height > 0 {
            TextureKind::TwoD
        } else {
            TextureKind::OneD
        }
    }
}
