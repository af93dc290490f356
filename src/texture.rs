use std::path::Path;

use crate::config::{ConvertOptions, Strictness};
use crate::convert::{Progress, Stage};
use crate::error::{ConvertError, Result, Warning};
use crate::header::Header;
use crate::ktx1::{Ktx1Header, TextureKtx1};
use crate::kvd::{KeyValueData, KeyValueMap, encode_ktx1_key_value_data, parse_key_value_data};
use crate::level::{Level, MipLevel, extract_levels, read_level_index};

/// A parsed KTX2 texture: everything the KTX1 output is built from.
#[derive(Clone, Debug)]
pub struct TextureKtx2 {
    pub header: Header,
    pub level_index: Vec<Level>,
    pub key_value_data: KeyValueMap,
    pub levels: Vec<MipLevel>,
    pub warnings: Vec<Warning>,
}

impl TextureKtx2 {
    pub fn read_from_ktx2(path: impl AsRef<Path>, strictness: Strictness) -> Result<TextureKtx2> {
        let buffer = crate::reader::read_file(path)?;
        TextureKtx2::from_bytes(&buffer, strictness)
    }

    pub fn from_bytes(buffer: &[u8], strictness: Strictness) -> Result<TextureKtx2> {
        let mut progress = Progress::default();
        TextureKtx2::parse(buffer, strictness, &mut progress)
            .inspect_err(|error| progress.fail(error))
    }

    pub(crate) fn parse(
        buffer: &[u8],
        strictness: Strictness,
        progress: &mut Progress,
    ) -> Result<TextureKtx2> {
        let header = Header::parse(buffer)?;
        header.validate_convertible()?;
        tracing::info!(
            vk_format = header.vk_format,
            width = header.pixel_width,
            height = header.pixel_height,
            depth = header.pixel_depth,
            faces = header.face_count,
            levels = header.level_count,
            kind = ?header.kind(),
            "KTX2 header"
        );
        progress.advance(Stage::HeaderParsed);

        let level_index = read_level_index(buffer, &header)?;
        progress.advance(Stage::LevelIndexParsed);

        let kvd = if header.index.has_key_value_data() {
            parse_key_value_data(
                buffer,
                header.index.kvd_byte_offset,
                header.index.kvd_byte_length,
                strictness,
            )?
        } else {
            KeyValueData::default()
        };
        progress.advance(Stage::KeyValueParsed);

        let extraction = extract_levels(&header, &level_index, buffer, strictness)?;
        progress.advance(Stage::LevelsExtracted);

        let mut warnings = kvd.warnings;
        warnings.extend(extraction.warnings);

        Ok(TextureKtx2 {
            header,
            level_index,
            key_value_data: kvd.entries,
            levels: extraction.levels,
            warnings,
        })
    }

    fn ktx1_header(&self, options: &ConvertOptions) -> Result<(Ktx1Header, Vec<u8>)> {
        let key_value_data = encode_ktx1_key_value_data(&self.key_value_data, options)?;
        let bytes_of_key_value_data = u32::try_from(key_value_data.len()).map_err(|_| {
            ConvertError::KeyValueTooLarge {
                size: key_value_data.len(),
            }
        })?;
        let header =
            Ktx1Header::from_source(&self.header, self.levels.len() as u32, bytes_of_key_value_data)?;
        Ok((header, key_value_data))
    }

    /// Builds the KTX1 equivalent, keeping only the allow-listed key/value entries.
    pub fn to_ktx1(&self, options: &ConvertOptions) -> Result<TextureKtx1> {
        let (header, key_value_data) = self.ktx1_header(options)?;
        Ok(TextureKtx1 {
            header,
            key_value_data,
            levels: self.levels.clone(),
        })
    }

    /// Like [`TextureKtx2::to_ktx1`], but moves the level data instead of copying it.
    pub fn into_ktx1(self, options: &ConvertOptions) -> Result<TextureKtx1> {
        let (header, key_value_data) = self.ktx1_header(options)?;
        Ok(TextureKtx1 {
            header,
            key_value_data,
            levels: self.levels,
        })
    }

    pub fn retained_keys(&self, options: &ConvertOptions) -> Vec<String> {
        self.key_value_data
            .keys()
            .filter(|key| options.is_retained(key))
            .cloned()
            .collect()
    }

    /// Keys present in the source that the given options drop.
    pub fn dropped_keys(&self, options: &ConvertOptions) -> Vec<String> {
        self.key_value_data
            .keys()
            .filter(|key| !options.is_retained(key))
            .cloned()
            .collect()
    }
}
