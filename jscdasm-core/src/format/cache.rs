use std::{fs, ops::Range, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Byte range of the validated header fields inside a code cache blob.
///
/// Known layout for the targeted engine builds (little-endian, see V8's
/// `src/snapshot/code-serializer.h`):
/// - 0x00: u32 magic number
/// - 0x04: u32 version hash
/// - 0x08: u32 source hash
/// - 0x0C: u32 flag hash
/// - 0x10..: payload (length fields, checksum, serialized bytecode)
///
/// The version/source/flag triple is the only gate the deserializer checks
/// before trusting the payload, and its position shifts between engine
/// versions, so the range is carried as a value rather than a constant.
/// Field boundaries inside the range do not matter to the patcher; it
/// copies the whole range byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSchema {
    /// First validated byte.
    pub offset: usize,
    /// Length of the validated range.
    pub len: usize,
}

impl Default for HeaderSchema {
    fn default() -> Self {
        // bytes 4..16: version hash, source hash, flag hash
        Self { offset: 4, len: 12 }
    }
}

impl HeaderSchema {
    /// Smallest blob that can hold the validated range.
    #[inline]
    pub fn min_blob_len(&self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// One serialized code cache blob: a fixed-format header prefix followed by
/// an opaque payload.
///
/// Everything outside the schema's header range passes through unmodified;
/// this type never inspects the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheBlob {
    bytes: Vec<u8>,
}

impl CacheBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Read a whole file as one blob. No framing beyond what the engine's
    /// own layout defines: the file *is* the blob.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The validated header range under `schema`.
    pub fn header(&self, schema: &HeaderSchema) -> Result<&[u8]> {
        self.check_len(schema)?;
        Ok(&self.bytes[schema.range()])
    }

    /// Overwrite the validated header range with `reference`, byte for
    /// byte. No other byte moves and the length never changes, so applying
    /// the same reference twice equals applying it once.
    pub fn patch_header(&mut self, reference: &[u8], schema: &HeaderSchema) -> Result<()> {
        self.check_len(schema)?;
        if reference.len() != schema.len {
            return Err(Error::HeaderLength {
                got: reference.len(),
                want: schema.len,
            });
        }
        self.bytes[schema.range()].copy_from_slice(reference);
        Ok(())
    }

    fn check_len(&self, schema: &HeaderSchema) -> Result<()> {
        if self.bytes.len() < schema.min_blob_len() {
            return Err(Error::TruncatedBlob {
                len: self.bytes.len(),
                min: schema.min_blob_len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // [B0..B3][H4..H15][P16..P19]
    fn sample_blob() -> CacheBlob {
        CacheBlob::new((0u8..20).collect())
    }

    const REFERENCE: [u8; 12] = [
        0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB,
    ];

    #[test]
    fn patch_replaces_exactly_the_header_range() {
        let schema = HeaderSchema::default();
        let mut blob = sample_blob();
        blob.patch_header(&REFERENCE, &schema).unwrap();

        let expected: Vec<u8> = [0u8, 1, 2, 3]
            .into_iter()
            .chain(REFERENCE)
            .chain([16, 17, 18, 19])
            .collect();
        assert_eq!(blob.as_bytes(), &expected[..]);
    }

    #[test]
    fn payload_outside_the_range_is_preserved() {
        let schema = HeaderSchema::default();
        let mut blob = sample_blob();
        blob.patch_header(&REFERENCE, &schema).unwrap();

        assert_eq!(&blob.as_bytes()[..4], &[0, 1, 2, 3]);
        assert_eq!(&blob.as_bytes()[16..], &[16, 17, 18, 19]);
    }

    #[test]
    fn patch_is_idempotent() {
        let schema = HeaderSchema::default();
        let mut once = sample_blob();
        once.patch_header(&REFERENCE, &schema).unwrap();

        let mut twice = sample_blob();
        twice.patch_header(&REFERENCE, &schema).unwrap();
        twice.patch_header(&REFERENCE, &schema).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn patch_never_changes_the_length() {
        let schema = HeaderSchema::default();
        let mut blob = sample_blob();
        let before = blob.len();
        blob.patch_header(&REFERENCE, &schema).unwrap();
        assert_eq!(blob.len(), before);
    }

    #[test]
    fn short_blob_is_rejected_before_any_engine_use() {
        let schema = HeaderSchema::default();
        let mut blob = CacheBlob::new(vec![0; 10]);
        match blob.patch_header(&REFERENCE, &schema) {
            Err(Error::TruncatedBlob { len: 10, min: 16 }) => {}
            other => panic!("expected TruncatedBlob, got {:?}", other),
        }
    }

    #[test]
    fn reference_length_must_match_the_schema() {
        let schema = HeaderSchema::default();
        let mut blob = sample_blob();
        match blob.patch_header(&[0xFF; 4], &schema) {
            Err(Error::HeaderLength { got: 4, want: 12 }) => {}
            other => panic!("expected HeaderLength, got {:?}", other),
        }
    }

    #[test]
    fn custom_schema_moves_the_range() {
        let schema = HeaderSchema { offset: 8, len: 4 };
        let mut blob = sample_blob();
        blob.patch_header(&[0xFF; 4], &schema).unwrap();

        let expected: Vec<u8> = [0u8, 1, 2, 3, 4, 5, 6, 7]
            .into_iter()
            .chain([0xFF; 4])
            .chain([12, 13, 14, 15, 16, 17, 18, 19])
            .collect();
        assert_eq!(blob.as_bytes(), &expected[..]);
    }

    #[test]
    fn header_accessor_returns_the_validated_range() {
        let schema = HeaderSchema::default();
        let blob = sample_blob();
        assert_eq!(
            blob.header(&schema).unwrap(),
            &[4u8, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15][..]
        );
    }
}
