//! KTX2 fixtures built byte by byte.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::header::{Header, KTX2_IDENTIFIER};
use crate::level::Level;
use crate::vk_format::VkFormat;

pub(crate) struct Ktx2Builder {
    vk_format: u32,
    pixel_width: u32,
    pixel_height: u32,
    pixel_depth: u32,
    layer_count: u32,
    face_count: u32,
    level_count: Option<u32>,
    supercompression_scheme: u32,
    key_values: Vec<(String, Vec<u8>)>,
    raw_kvd: Option<Vec<u8>>,
    levels: Vec<Vec<u8>>,
}

impl Ktx2Builder {
    pub(crate) fn new(pixel_width: u32, pixel_height: u32, vk_format: u32) -> Self {
        Ktx2Builder {
            vk_format,
            pixel_width,
            pixel_height,
            pixel_depth: 0,
            layer_count: 0,
            face_count: 1,
            level_count: None,
            supercompression_scheme: 0,
            key_values: vec![],
            raw_kvd: None,
            levels: vec![],
        }
    }

    pub(crate) fn faces(mut self, face_count: u32) -> Self {
        self.face_count = face_count;
        self
    }

    pub(crate) fn layers(mut self, layer_count: u32) -> Self {
        self.layer_count = layer_count;
        self
    }

    pub(crate) fn depth(mut self, pixel_depth: u32) -> Self {
        self.pixel_depth = pixel_depth;
        self
    }

    pub(crate) fn supercompression(mut self, scheme: u32) -> Self {
        self.supercompression_scheme = scheme;
        self
    }

    /// Overrides the declared level count without changing the stored levels.
    pub(crate) fn level_count(mut self, level_count: u32) -> Self {
        self.level_count = Some(level_count);
        self
    }

    /// Appends the next mip level: every face of it, concatenated.
    pub(crate) fn level(mut self, bytes: Vec<u8>) -> Self {
        self.levels.push(bytes);
        self
    }

    pub(crate) fn key_value(mut self, key: &str, value: &[u8]) -> Self {
        self.key_values.push((key.to_string(), value.to_vec()));
        self
    }

    /// Uses `bytes` verbatim as the key/value block.
    pub(crate) fn raw_key_value_data(mut self, bytes: Vec<u8>) -> Self {
        self.raw_kvd = Some(bytes);
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let type_size = VkFormat::from_raw(self.vk_format)
            .map(|format| format.gl().gl_type_size)
            .unwrap_or(1);

        let kvd = match &self.raw_kvd {
            Some(bytes) => bytes.clone(),
            None => encode_records(&self.key_values),
        };

        let index_length = self.levels.len() * Level::LENGTH;
        let dfd_offset = Header::LENGTH + index_length;
        let dfd_length = 44usize;
        let kvd_offset = dfd_offset + dfd_length;
        let mut data_offset = kvd_offset + kvd.len();
        data_offset += (8 - data_offset % 8) % 8;

        // Smallest level first in the file, as KTX2 writers do.
        let mut offsets = vec![0usize; self.levels.len()];
        let mut cursor = data_offset;
        for (i, level) in self.levels.iter().enumerate().rev() {
            offsets[i] = cursor;
            cursor += level.len();
        }

        let mut out = vec![];
        out.extend_from_slice(&KTX2_IDENTIFIER);
        for field in [
            self.vk_format,
            type_size,
            self.pixel_width,
            self.pixel_height,
            self.pixel_depth,
            self.layer_count,
            self.face_count,
            self.level_count.unwrap_or(self.levels.len() as u32),
            self.supercompression_scheme,
            dfd_offset as u32,
            dfd_length as u32,
            if kvd.is_empty() { 0 } else { kvd_offset as u32 },
            kvd.len() as u32,
        ] {
            out.write_u32::<LittleEndian>(field).unwrap();
        }
        out.write_u64::<LittleEndian>(0).unwrap();
        out.write_u64::<LittleEndian>(0).unwrap();

        for (level, offset) in self.levels.iter().zip(&offsets) {
            out.write_u64::<LittleEndian>(*offset as u64).unwrap();
            out.write_u64::<LittleEndian>(level.len() as u64).unwrap();
            out.write_u64::<LittleEndian>(level.len() as u64).unwrap();
        }

        out.write_u32::<LittleEndian>(dfd_length as u32).unwrap();
        out.resize(kvd_offset, 0);
        out.extend_from_slice(&kvd);
        out.resize(data_offset, 0);
        for level in self.levels.iter().rev() {
            out.extend_from_slice(level);
        }
        out
    }
}

/// Key/value records as `u32 keyAndValueByteLength`, `u32 keyByteLength`,
/// key with its terminator, value, padding.
pub(crate) fn encode_records(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![];
    for (key, value) in entries {
        let key_length = key.len() as u32 + 1;
        out.write_u32::<LittleEndian>(key_length + value.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(key_length).unwrap();
        out.extend_from_slice(key.as_bytes());
        out.push(0);
        out.extend_from_slice(value);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    out
}

/// `len` bytes counting up from `seed`, so slices from different faces differ.
pub(crate) fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_add(seed)).collect()
}
