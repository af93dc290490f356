use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Loads the whole file into memory. This is the only read the conversion performs.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let io_error = |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let mut buffer: Vec<u8> = vec![];
    file.read_to_end(&mut buffer).map_err(io_error)?;
    tracing::debug!(path = %path.display(), bytes = buffer.len(), "read input");
    Ok(buffer)
}

/// Returns `buffer[offset..offset + len]`, or `None` when any part is out of range.
pub(crate) fn slice_at(buffer: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    buffer.get(start..end)
}

pub(crate) fn u32_at(buffer: &[u8], offset: usize) -> Option<u32> {
    slice_at(buffer, offset as u64, 4).map(LittleEndian::read_u32)
}

pub(crate) fn u64_at(buffer: &[u8], offset: usize) -> Option<u64> {
    slice_at(buffer, offset as u64, 8).map(LittleEndian::read_u64)
}

/// Bytes needed after `len` to reach the next multiple of four.
pub(crate) fn padding_to_4(len: u64) -> u64 {
    (4 - (len & 3)) & 3
}
