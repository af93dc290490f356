use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::header::Header;
use crate::kvd::{KeyValueMap, parse_ktx1_key_value_data};
use crate::level::MipLevel;
use crate::reader::{slice_at, u32_at};
use crate::vk_format::VkFormat;

pub const KTX1_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Written as a native u32, reads back as this value on a matching-endian machine.
pub const ENDIANNESS: u32 = 0x0403_0201;

/// Fixed KTX1 header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ktx1Header {
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub number_of_array_elements: u32,
    pub number_of_faces: u32,
    pub number_of_mipmap_levels: u32,
    pub bytes_of_key_value_data: u32,
}

impl Ktx1Header {
    /// Identifier, endianness marker and twelve u32 fields.
    pub const LENGTH: usize = 12 + 4 + 12 * 4;

    /// Derives the KTX1 header for a KTX2 source once its levels and key/value block
    /// are known.
    pub fn from_source(
        source: &Header,
        number_of_mipmap_levels: u32,
        bytes_of_key_value_data: u32,
    ) -> Result<Ktx1Header> {
        let format =
            VkFormat::from_raw(source.vk_format).ok_or(ConvertError::UnsupportedPixelFormat {
                vk_format: source.vk_format,
            })?;
        let gl = format.gl();

        // KTX1 cube maps are square and have no depth.
        let (pixel_height, pixel_depth) = if source.is_cube_map() {
            (source.pixel_width, 0)
        } else {
            (source.pixel_height.max(1), source.pixel_depth.max(1))
        };

        Ok(Ktx1Header {
            gl_type: gl.gl_type,
            gl_type_size: gl.gl_type_size,
            gl_format: gl.gl_format,
            gl_internal_format: gl.gl_internal_format,
            gl_base_internal_format: gl.gl_base_internal_format,
            pixel_width: source.pixel_width,
            pixel_height,
            pixel_depth,
            number_of_array_elements: 0,
            number_of_faces: source.faces(),
            number_of_mipmap_levels,
            bytes_of_key_value_data,
        })
    }

    fn fields(&self) -> [u32; 12] {
        [
            self.gl_type,
            self.gl_type_size,
            self.gl_format,
            self.gl_internal_format,
            self.gl_base_internal_format,
            self.pixel_width,
            self.pixel_height,
            self.pixel_depth,
            self.number_of_array_elements,
            self.number_of_faces,
            self.number_of_mipmap_levels,
            self.bytes_of_key_value_data,
        ]
    }

    pub fn to_bytes(&self) -> [u8; Ktx1Header::LENGTH] {
        let mut bytes = [0u8; Ktx1Header::LENGTH];
        bytes[..12].copy_from_slice(&KTX1_IDENTIFIER);
        LittleEndian::write_u32(&mut bytes[12..16], ENDIANNESS);
        LittleEndian::write_u32_into(&self.fields(), &mut bytes[16..]);
        bytes
    }

    /// Parses a little-endian KTX1 header.
    pub fn parse(buffer: &[u8]) -> Result<Ktx1Header> {
        if buffer.len() < Ktx1Header::LENGTH {
            return Err(ConvertError::TruncatedHeader {
                expected: Ktx1Header::LENGTH,
                actual: buffer.len(),
            });
        }
        let mut identifier = [0u8; 12];
        identifier.copy_from_slice(&buffer[..12]);
        if identifier != KTX1_IDENTIFIER || LittleEndian::read_u32(&buffer[12..16]) != ENDIANNESS {
            return Err(ConvertError::InvalidSignature { found: identifier });
        }

        let mut f = [0u32; 12];
        LittleEndian::read_u32_into(&buffer[16..Ktx1Header::LENGTH], &mut f);
        Ok(Ktx1Header {
            gl_type: f[0],
            gl_type_size: f[1],
            gl_format: f[2],
            gl_internal_format: f[3],
            gl_base_internal_format: f[4],
            pixel_width: f[5],
            pixel_height: f[6],
            pixel_depth: f[7],
            number_of_array_elements: f[8],
            number_of_faces: f[9],
            number_of_mipmap_levels: f[10],
            bytes_of_key_value_data: f[11],
        })
    }
}

/// A KTX1 texture: header, encoded key/value block and per-level face data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureKtx1 {
    pub header: Ktx1Header,
    pub key_value_data: Vec<u8>,
    pub levels: Vec<MipLevel>,
}

impl TextureKtx1 {
    /// Writes header, key/value block, then for each level the per-face image size
    /// followed by every face back to back.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.header.to_bytes())?;
        writer.write_all(&self.key_value_data)?;
        for level in &self.levels {
            writer.write_u32::<LittleEndian>(level.size_per_face)?;
            for face in &level.faces {
                writer.write_all(face)?;
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let body: u64 = self.levels.iter().map(|l| 4 + l.byte_length()).sum();
        let mut bytes =
            Vec::with_capacity(Ktx1Header::LENGTH + self.key_value_data.len() + body as usize);
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.key_value_data);
        for level in &self.levels {
            bytes.extend_from_slice(&level.size_per_face.to_le_bytes());
            for face in &level.faces {
                bytes.extend_from_slice(face);
            }
        }
        bytes
    }

    pub fn write_to_ktx1(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |source| ConvertError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
        tracing::debug!(path = %path.display(), "wrote KTX1");
        Ok(())
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<TextureKtx1> {
        let header = Ktx1Header::parse(buffer)?;

        let kvd_offset = Ktx1Header::LENGTH as u64;
        let kvd_length = header.bytes_of_key_value_data as u64;
        let key_value_data = slice_at(buffer, kvd_offset, kvd_length)
            .ok_or(ConvertError::TruncatedHeader {
                expected: (kvd_offset + kvd_length) as usize,
                actual: buffer.len(),
            })?
            .to_vec();

        if !matches!(header.number_of_faces, 0 | 1 | 6) {
            return Err(ConvertError::InvalidFaceCount {
                face_count: header.number_of_faces,
            });
        }
        let face_count = header.number_of_faces.max(1);
        let mut cursor = kvd_offset + kvd_length;
        // Counts come from the file; every level needs at least its 4-byte size field.
        let room = (buffer.len() as u64).saturating_sub(cursor) / 4;
        let capacity = (header.number_of_mipmap_levels as u64).min(room);
        let mut levels = Vec::with_capacity(capacity as usize);

        for level in 0..header.number_of_mipmap_levels {
            let truncated = |offset: u64, expected: u64| ConvertError::TruncatedImageData {
                level,
                offset,
                expected,
                available: (buffer.len() as u64).saturating_sub(offset),
            };

            let size_per_face =
                u32_at(buffer, cursor as usize).ok_or_else(|| truncated(cursor, 4))?;
            cursor += 4;

            let mut faces = vec![];
            for _ in 0..face_count {
                let face = slice_at(buffer, cursor, size_per_face as u64)
                    .ok_or_else(|| truncated(cursor, size_per_face as u64))?;
                faces.push(face.to_vec());
                cursor += size_per_face as u64;
            }

            let shift = level.min(31);
            levels.push(MipLevel {
                width: (header.pixel_width >> shift).max(1),
                height: (header.pixel_height >> shift).max(1),
                depth: (header.pixel_depth >> shift).max(1),
                size_per_face,
                faces,
            });
        }

        Ok(TextureKtx1 {
            header,
            key_value_data,
            levels,
        })
    }

    pub fn read_from_ktx1(path: impl AsRef<Path>) -> Result<TextureKtx1> {
        let buffer = crate::reader::read_file(path)?;
        TextureKtx1::from_bytes(&buffer)
    }

    pub fn key_value_map(&self) -> Result<KeyValueMap> {
        parse_ktx1_key_value_data(&self.key_value_data, Ktx1Header::LENGTH as u64)
    }

    pub fn vk_format(&self) -> Option<VkFormat> {
        VkFormat::from_gl_internal_format(self.header.gl_internal_format)
    }

    pub fn is_cube_map(&self) -> bool {
        self.header.number_of_faces == 6
    }
}
