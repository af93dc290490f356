use crate::config::Strictness;
use crate::error::{ConvertError, FaceTruncation, LayoutIssue, Result, Warning};
use crate::header::Header;
use crate::reader::{slice_at, u64_at};

/// One record of the KTX2 level index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    pub byte_offset: u64,
    pub byte_length: u64,
    pub uncompressed_byte_length: u64,
}

impl Level {
    pub const LENGTH: usize = 24;
}

/// Reads the level index that directly follows the header, level 0 first.
pub fn read_level_index(buffer: &[u8], header: &Header) -> Result<Vec<Level>> {
    let count = header.stored_levels() as usize;
    let offset = Header::LENGTH;
    let size = count as u64 * Level::LENGTH as u64;

    if offset as u64 + size > buffer.len() as u64 {
        return Err(ConvertError::TruncatedLevelIndex {
            offset,
            expected: size,
            actual: buffer.len(),
        });
    }

    let mut levels = Vec::with_capacity(count);
    for l in 0..count {
        let record = offset + l * Level::LENGTH;
        let (Some(byte_offset), Some(byte_length), Some(uncompressed_byte_length)) = (
            u64_at(buffer, record),
            u64_at(buffer, record + 8),
            u64_at(buffer, record + 16),
        ) else {
            return Err(ConvertError::TruncatedLevelIndex {
                offset,
                expected: size,
                actual: buffer.len(),
            });
        };

        tracing::debug!(level = l, byte_offset, byte_length, "level index entry");
        levels.push(Level {
            byte_offset,
            byte_length,
            uncompressed_byte_length,
        });
    }
    Ok(levels)
}

/// Pixel data of one mip level, split into faces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub size_per_face: u32,
    pub faces: Vec<Vec<u8>>,
}

impl MipLevel {
    pub fn byte_length(&self) -> u64 {
        self.faces.iter().map(|face| face.len() as u64).sum()
    }
}

/// Mip levels plus whatever recoverable problems were met while slicing them.
#[derive(Debug, Default)]
pub struct Extraction {
    pub levels: Vec<MipLevel>,
    pub warnings: Vec<Warning>,
}

/// Slices every face of every level out of `buffer`.
///
/// A face that runs past the end of the buffer keeps the bytes that are there and is
/// zero-filled up to its declared size; in [`Strictness::Strict`] mode that is an error.
/// The fill size comes from the level index alone, so a short file that declares huge
/// levels can make lenient extraction allocate up to `u32::MAX` bytes per face.
pub fn extract_levels(
    header: &Header,
    index: &[Level],
    buffer: &[u8],
    strictness: Strictness,
) -> Result<Extraction> {
    let face_count = header.faces();
    let mut extraction = Extraction::default();

    for (i, entry) in index.iter().enumerate() {
        let level = i as u32;
        let layout_error = |issue| ConvertError::MalformedLevelLayout {
            level,
            byte_offset: entry.byte_offset,
            byte_length: entry.byte_length,
            face_count,
            issue,
        };

        if entry.byte_length % face_count as u64 != 0 {
            return Err(layout_error(LayoutIssue::UnevenFaces));
        }
        let size_per_face = u32::try_from(entry.byte_length / face_count as u64)
            .map_err(|_| layout_error(LayoutIssue::FaceTooLarge))?;

        let mut faces = Vec::with_capacity(face_count as usize);
        for face in 0..face_count {
            let offset = (face as u64)
                .checked_mul(size_per_face as u64)
                .and_then(|delta| entry.byte_offset.checked_add(delta))
                .ok_or_else(|| layout_error(LayoutIssue::OffsetOverflow))?;

            match slice_at(buffer, offset, size_per_face as u64) {
                Some(bytes) => faces.push(bytes.to_vec()),
                None => {
                    let available = (buffer.len() as u64).saturating_sub(offset);
                    let warning = Warning::TruncatedFaceData(FaceTruncation {
                        level,
                        face,
                        offset,
                        expected: size_per_face as u64,
                        available,
                    });
                    if strictness == Strictness::Strict {
                        return Err(warning.into());
                    }
                    tracing::warn!("{warning}");

                    let mut bytes = vec![0u8; size_per_face as usize];
                    // available < size_per_face here, and offset < buffer.len() when it is non-zero
                    if available > 0 {
                        let start = offset as usize;
                        bytes[..available as usize].copy_from_slice(&buffer[start..]);
                    }
                    faces.push(bytes);
                    extraction.warnings.push(warning);
                }
            }
        }

        let mip = MipLevel {
            width: (header.pixel_width >> level.min(31)).max(1),
            height: if header.pixel_height > 0 {
                (header.pixel_height >> level.min(31)).max(1)
            } else {
                1
            },
            depth: if header.pixel_depth > 0 {
                (header.pixel_depth >> level.min(31)).max(1)
            } else {
                1
            },
            size_per_face,
            faces,
        };
        tracing::debug!(
            level,
            width = mip.width,
            height = mip.height,
            size_per_face,
            "extracted level"
        );
        extraction.levels.push(mip);
    }

    Ok(extraction)
}
