use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a level's declared byte range can not be split into faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutIssue {
    /// `byteLength` is not a multiple of the face count.
    UnevenFaces,
    /// A single face is larger than the u32 image size field allows.
    FaceTooLarge,
    /// `byteOffset + face * sizePerFace` overflows.
    OffsetOverflow,
}

impl std::fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            LayoutIssue::UnevenFaces => "byte length is not a multiple of the face count",
            LayoutIssue::FaceTooLarge => "face size does not fit in 32 bits",
            LayoutIssue::OffsetOverflow => "face offset overflows",
        };
        f.write_str(text)
    }
}

/// The key/value block ended in the middle of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValueTruncation {
    /// Absolute file offset of the record that could not be read.
    pub offset: u64,
    /// Bytes the record needed from `offset`.
    pub needed: u64,
    /// Bytes actually left in the block (or file) from `offset`.
    pub available: u64,
    /// Entries parsed before parsing stopped.
    pub parsed: usize,
}

/// A face extends beyond the end of the input buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceTruncation {
    pub level: u32,
    pub face: u32,
    pub offset: u64,
    pub expected: u64,
    pub available: u64,
}

/// Recoverable conditions reported alongside a successful conversion.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Warning {
    #[error(
        "key/value data truncated at offset {}: record needs {} bytes, {} available ({} entries kept)",
        .0.offset, .0.needed, .0.available, .0.parsed
    )]
    TruncatedKeyValueData(KeyValueTruncation),

    #[error(
        "level {} face {} truncated at offset {}: expected {} bytes, {} available (zero-filled)",
        .0.level, .0.face, .0.offset, .0.expected, .0.available
    )]
    TruncatedFaceData(FaceTruncation),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file too small for a KTX2 header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("invalid file identifier {found:02X?}")]
    InvalidSignature { found: [u8; 12] },

    #[error("level index at offset {offset} needs {expected} bytes, file has {actual}")]
    TruncatedLevelIndex {
        offset: usize,
        expected: u64,
        actual: usize,
    },

    #[error(
        "level {level} (offset {byte_offset}, length {byte_length}, {face_count} faces): {issue}"
    )]
    MalformedLevelLayout {
        level: u32,
        byte_offset: u64,
        byte_length: u64,
        face_count: u32,
        issue: LayoutIssue,
    },

    #[error("unsupported face count {face_count}, expected 1 or 6")]
    InvalidFaceCount { face_count: u32 },

    #[error("unsupported vkFormat {vk_format}")]
    UnsupportedPixelFormat { vk_format: u32 },

    #[error("array textures are not supported (layerCount {layer_count})")]
    UnsupportedArrayTexture { layer_count: u32 },

    #[error("supercompression scheme {scheme} is not supported")]
    UnsupportedSupercompression { scheme: u32 },

    #[error("{0}")]
    TruncatedKeyValueData(KeyValueTruncation),

    #[error("level {} face {} truncated at offset {}: expected {} bytes, {} available", .0.level, .0.face, .0.offset, .0.expected, .0.available)]
    TruncatedFaceData(FaceTruncation),

    #[error("level {level} image at offset {offset} needs {expected} bytes, {available} available")]
    TruncatedImageData {
        level: u32,
        offset: u64,
        expected: u64,
        available: u64,
    },

    #[error("encoded key/value data is {size} bytes, more than a KTX1 header can describe")]
    KeyValueTooLarge { size: usize },

    #[error("could not write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl std::fmt::Display for KeyValueTruncation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key/value data truncated at offset {}: record needs {} bytes, {} available",
            self.offset, self.needed, self.available
        )
    }
}

impl From<Warning> for ConvertError {
    fn from(warning: Warning) -> Self {
        match warning {
            Warning::TruncatedKeyValueData(t) => ConvertError::TruncatedKeyValueData(t),
            Warning::TruncatedFaceData(t) => ConvertError::TruncatedFaceData(t),
        }
    }
}

impl ConvertError {
    /// Process exit status for this error kind. Zero is reserved for success.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Io { .. } => 2,
            ConvertError::TruncatedHeader { .. } => 3,
            ConvertError::InvalidSignature { .. } => 4,
            ConvertError::TruncatedLevelIndex { .. } => 5,
            ConvertError::MalformedLevelLayout { .. } => 6,
            ConvertError::InvalidFaceCount { .. } => 7,
            ConvertError::UnsupportedPixelFormat { .. } => 8,
            ConvertError::UnsupportedArrayTexture { .. } => 9,
            ConvertError::UnsupportedSupercompression { .. } => 10,
            ConvertError::TruncatedKeyValueData(_) => 11,
            ConvertError::TruncatedFaceData(_) => 12,
            ConvertError::TruncatedImageData { .. } => 13,
            ConvertError::KeyValueTooLarge { .. } => 14,
            ConvertError::OutputWrite { .. } => 15,
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
