use std::collections::BTreeMap;

use crate::config::{ConvertOptions, Strictness};
use crate::error::{ConvertError, KeyValueTruncation, Result, Warning};
use crate::reader::{padding_to_4, slice_at, u32_at};

/// Key/value pairs keyed by their text key. A key that appears twice keeps its last value.
pub type KeyValueMap = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Default)]
pub struct KeyValueData {
    pub entries: KeyValueMap,
    pub warnings: Vec<Warning>,
}

/// Key text up to its first NUL.
fn key_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Parses the KTX2 key/value block at `kvd_offset`.
///
/// Records are `u32 keyAndValueByteLength`, `u32 keyByteLength`, the NUL terminated key,
/// the value and padding to a 4-byte boundary. A record that does not fit stops parsing;
/// the entries read so far are kept and a warning is returned.
pub fn parse_key_value_data(
    buffer: &[u8],
    kvd_offset: u32,
    kvd_length: u32,
    strictness: Strictness,
) -> Result<KeyValueData> {
    let mut data = KeyValueData::default();
    if kvd_length == 0 {
        return Ok(data);
    }

    let end = kvd_offset as u64 + kvd_length as u64;
    let limit = end.min(buffer.len() as u64);
    let mut cursor = kvd_offset as u64;

    while cursor < end {
        let available = limit.saturating_sub(cursor);
        let parsed = data.entries.len();
        let offset = cursor;
        let truncated = |needed: u64| KeyValueTruncation {
            offset,
            needed,
            available,
            parsed,
        };

        if available < 8 {
            data.stop(truncated(8), strictness)?;
            break;
        }
        // Eight bytes from `cursor` are in range.
        let record = cursor as usize;
        let key_and_value_length = u32_at(buffer, record).unwrap_or_default() as u64;
        let key_length = u32_at(buffer, record + 4).unwrap_or_default() as u64;

        if key_length > key_and_value_length {
            data.stop(truncated(8 + key_length), strictness)?;
            break;
        }
        let body = match slice_at(buffer, cursor + 8, key_and_value_length) {
            Some(body) if 8 + key_and_value_length <= available => body,
            _ => {
                data.stop(truncated(8 + key_and_value_length), strictness)?;
                break;
            }
        };

        let (key, value) = body.split_at(key_length as usize);
        let key = key_text(key);
        tracing::debug!(key = %key, value_bytes = value.len(), "key/value entry");
        data.entries.insert(key, value.to_vec());

        cursor += 8 + key_and_value_length + padding_to_4(key_and_value_length);
    }

    Ok(data)
}

impl KeyValueData {
    fn stop(&mut self, truncation: KeyValueTruncation, strictness: Strictness) -> Result<()> {
        let warning = Warning::TruncatedKeyValueData(truncation);
        if strictness == Strictness::Strict {
            return Err(warning.into());
        }
        tracing::warn!("{warning}");
        self.warnings.push(warning);
        Ok(())
    }
}

/// Encodes one KTX1 key/value entry: `u32 keyAndValueByteSize`, key, NUL, value, padding.
pub fn encode_entry(key: &str, value: &[u8]) -> Result<Vec<u8>> {
    let total = key.len() + 1 + value.len();
    let total_size =
        u32::try_from(total).map_err(|_| ConvertError::KeyValueTooLarge { size: total })?;
    let padding = padding_to_4(total_size as u64) as usize;

    let mut entry = Vec::with_capacity(4 + total + padding);
    entry.extend_from_slice(&total_size.to_le_bytes());
    entry.extend_from_slice(key.as_bytes());
    entry.push(0);
    entry.extend_from_slice(value);
    entry.resize(4 + total + padding, 0);
    Ok(entry)
}

/// Encodes the entries whose keys are on the allow-list, in key order.
pub fn encode_ktx1_key_value_data(
    entries: &KeyValueMap,
    options: &ConvertOptions,
) -> Result<Vec<u8>> {
    let mut block = vec![];
    for (key, value) in entries.iter().filter(|(key, _)| options.is_retained(key)) {
        tracing::debug!(key = %key, value_bytes = value.len(), "keeping key/value entry");
        block.extend_from_slice(&encode_entry(key, value)?);
    }
    if u32::try_from(block.len()).is_err() {
        return Err(ConvertError::KeyValueTooLarge { size: block.len() });
    }
    Ok(block)
}

/// Parses a KTX1 key/value block (no separate key length field).
pub fn parse_ktx1_key_value_data(block: &[u8], block_offset: u64) -> Result<KeyValueMap> {
    let mut entries = KeyValueMap::new();
    let mut cursor = 0u64;
    let end = block.len() as u64;

    while cursor < end {
        let (offset, parsed) = (cursor, entries.len());
        let truncated = |needed: u64| {
            ConvertError::TruncatedKeyValueData(KeyValueTruncation {
                offset: block_offset + offset,
                needed,
                available: end - offset,
                parsed,
            })
        };
        let size = u32_at(block, cursor as usize).ok_or_else(|| truncated(4))? as u64;
        let body = slice_at(block, cursor + 4, size).ok_or_else(|| truncated(4 + size))?;

        let key_end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        let value = body.get(key_end + 1..).unwrap_or_default();
        entries.insert(key_text(&body[..key_end]), value.to_vec());

        cursor += 4 + size + padding_to_4(size);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::encode_records;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn records(entries: Vec<(&str, Vec<u8>)>) -> Vec<u8> {
        let owned: Vec<(String, Vec<u8>)> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        encode_records(&owned)
    }

    /// Puts `block` at offset 16 of a buffer, like it would sit inside a file.
    fn embedded(block: &[u8]) -> Vec<u8> {
        let mut buffer = vec![0xEE; 16];
        buffer.extend_from_slice(block);
        buffer
    }

    #[test]
    fn empty_block_yields_nothing() {
        let data = parse_key_value_data(&[], 0, 0, Strictness::Strict).unwrap();
        assert!(data.entries.is_empty());
        assert!(data.warnings.is_empty());
    }

    #[test]
    fn parses_padded_records() {
        let sh: Vec<u8> = (0..108).collect();
        let block = records(vec![
            ("KTXorientation", b"rd\0".to_vec()),
            ("sh", sh.clone()),
            ("x", vec![]),
        ]);
        let buffer = embedded(&block);

        let data =
            parse_key_value_data(&buffer, 16, block.len() as u32, Strictness::Strict).unwrap();
        assert!(data.warnings.is_empty());
        assert_eq!(data.entries.len(), 3);
        assert_eq!(data.entries["KTXorientation"], b"rd\0");
        assert_eq!(data.entries["sh"], sh);
        assert_eq!(data.entries["x"], b"");
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let block = records(vec![("sh", b"first".to_vec()), ("sh", b"second".to_vec())]);
        let buffer = embedded(&block);
        let data =
            parse_key_value_data(&buffer, 16, block.len() as u32, Strictness::Lenient).unwrap();
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.entries["sh"], b"second");
    }

    #[test]
    fn record_past_block_end_keeps_earlier_entries() {
        let block = records(vec![("a", b"1234".to_vec()), ("sh", b"coefficients".to_vec())]);
        let buffer = embedded(&block);
        // Block length cuts the second record short.
        let length = block.len() as u32 - 4;

        let data = parse_key_value_data(&buffer, 16, length, Strictness::Lenient).unwrap();
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.entries["a"], b"1234");
        let [Warning::TruncatedKeyValueData(t)] = data.warnings.as_slice() else {
            panic!("expected one truncation warning, got {:?}", data.warnings);
        };
        assert_eq!(t.offset, 16 + 16);
        assert_eq!(t.parsed, 1);
        assert_eq!(t.needed, 8 + 3 + 12);
        assert!(t.available < t.needed);
    }

    #[test]
    fn short_record_header_stops_parsing() {
        let mut block = records(vec![("a", b"1".to_vec())]);
        block.extend_from_slice(&[5, 0, 0, 0]);
        let buffer = embedded(&block);

        let data =
            parse_key_value_data(&buffer, 16, block.len() as u32, Strictness::Lenient).unwrap();
        assert_eq!(data.entries.len(), 1);
        assert!(matches!(
            data.warnings.as_slice(),
            [Warning::TruncatedKeyValueData(KeyValueTruncation { needed: 8, available: 4, .. })]
        ));
    }

    #[test]
    fn key_longer_than_record_stops_parsing() {
        let mut block = vec![];
        block.write_u32::<LittleEndian>(4).unwrap();
        block.write_u32::<LittleEndian>(9).unwrap();
        block.extend_from_slice(b"abcd");
        let buffer = embedded(&block);

        let data =
            parse_key_value_data(&buffer, 16, block.len() as u32, Strictness::Lenient).unwrap();
        assert!(data.entries.is_empty());
        assert_eq!(data.warnings.len(), 1);
    }

    #[test]
    fn block_past_end_of_file_is_truncation() {
        let block = records(vec![("sh", b"abcdefgh".to_vec())]);
        let mut buffer = embedded(&block);
        buffer.truncate(buffer.len() - 6);

        let error = parse_key_value_data(&buffer, 16, block.len() as u32, Strictness::Strict)
            .unwrap_err();
        assert!(matches!(error, ConvertError::TruncatedKeyValueData(ref t) if t.parsed == 0));
    }

    #[test]
    fn entries_follow_the_padding_law() {
        for value_len in 0..9 {
            let value = vec![0x5A; value_len];
            let entry = encode_entry("sh", &value).unwrap();
            let total_size = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
            assert_eq!(total_size as usize, 3 + value_len);

            let padding = entry.len() - 4 - total_size as usize;
            assert!(padding <= 3);
            assert_eq!((4 + total_size as usize + padding) % 4, 0);
            assert_eq!(&entry[4..7], b"sh\0");
            assert_eq!(&entry[7..7 + value_len], value.as_slice());
            assert!(entry[7 + value_len..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn only_allowed_keys_are_encoded() {
        let mut entries = KeyValueMap::new();
        entries.insert("KTXwriter".to_string(), b"tool\0".to_vec());
        entries.insert("sh".to_string(), vec![1, 2, 3, 4, 5]);

        let block = encode_ktx1_key_value_data(&entries, &ConvertOptions::default()).unwrap();
        let decoded = parse_ktx1_key_value_data(&block, 0).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded["sh"], vec![1, 2, 3, 4, 5]);

        let none = ConvertOptions {
            retained_keys: vec![],
            ..ConvertOptions::default()
        };
        assert!(encode_ktx1_key_value_data(&entries, &none).unwrap().is_empty());
    }

    #[test]
    fn ktx1_block_must_be_complete() {
        let block = encode_entry("sh", b"abcdef").unwrap();
        let error = parse_ktx1_key_value_data(&block[..8], 64).unwrap_err();
        assert!(matches!(error, ConvertError::TruncatedKeyValueData(ref t) if t.offset == 64));
    }
}
