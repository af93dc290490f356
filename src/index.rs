/// Locations of the data format descriptor, key/value data and supercompression
/// global data blocks, as stored at bytes 48..80 of a KTX2 header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Index {
    pub dfd_byte_offset: u32,
    pub dfd_byte_length: u32,
    pub kvd_byte_offset: u32,
    pub kvd_byte_length: u32,
    pub sgd_byte_offset: u64,
    pub sgd_byte_length: u64,
}

impl Index {
    pub const LENGTH: usize = 32;

    /// Decodes the index from exactly [`Index::LENGTH`] bytes.
    pub(crate) fn from_bytes(bytes: &[u8; Index::LENGTH]) -> Self {
        use byteorder::{ByteOrder, LittleEndian};

        Index {
            dfd_byte_offset: LittleEndian::read_u32(&bytes[0..4]),
            dfd_byte_length: LittleEndian::read_u32(&bytes[4..8]),
            kvd_byte_offset: LittleEndian::read_u32(&bytes[8..12]),
            kvd_byte_length: LittleEndian::read_u32(&bytes[12..16]),
            sgd_byte_offset: LittleEndian::read_u64(&bytes[16..24]),
            sgd_byte_length: LittleEndian::read_u64(&bytes[24..32]),
        }
    }

    pub fn has_key_value_data(&self) -> bool {
        self.kvd_byte_length > 0
    }
}
