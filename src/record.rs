//! Record framing — self-delimiting `(term, posting list)` records.
//!
//! # On-disk layout (all fixed-width fields big-endian)
//!
//! ```text
//! Offset            Size          Field
//!    0              KEY_LEN_LEN   key_len    UTF-8 byte length of the term
//!    1              key_len       key        raw UTF-8 term bytes
//!    1+key_len      LIST_LEN_LEN  list_len   byte length of list_bytes
//!    5+key_len      list_len      list_bytes codec-specific posting bytes
//! ```
//!
//! A file is a flat sequence of these records in ascending term order.
//! There is no file header, no footer, and no index-of-indexes; `list_len`
//! makes every record skippable without decoding, which is what the
//! keys-only scan relies on.
//!
//! # EOF discipline
//! EOF exactly on a record boundary is the normal end of file and surfaces
//! as `Ok(None)`.  EOF anywhere inside a record is corruption and surfaces
//! as [`CodecError::Truncated`].  Validation happens before any list bytes
//! are read, so a caller that only wants the term pays nothing for the
//! postings.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt};

use crate::codec::{
    encode_number, Codec, CodecError, Posting, KEY_LEN_LEN, LIST_LEN_LEN,
};

// ── Record head ──────────────────────────────────────────────────────────────

/// The self-describing prefix of one record: the term plus the byte length
/// of the posting bytes that follow.
#[derive(Debug, Clone)]
pub struct RecordHead {
    pub term:     String,
    pub list_len: u64,
}

impl RecordHead {
    /// Total on-disk size of the record this head belongs to.
    #[inline]
    pub fn on_disk_len(&self) -> u64 {
        (KEY_LEN_LEN + self.term.len() + LIST_LEN_LEN) as u64 + self.list_len
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encode one full record into a fresh buffer.
///
/// Fails with `OutOfRange` when the term exceeds 255 UTF-8 bytes or the
/// encoded posting bytes exceed the `LIST_LEN_LEN` budget.
pub fn encode_record(
    term:     &str,
    postings: &[Posting],
    codec:    &dyn Codec,
) -> Result<Vec<u8>, CodecError> {
    let key = term.as_bytes();

    let mut list = Vec::new();
    codec.encode_list(postings, &mut list)?;

    let mut out = Vec::with_capacity(KEY_LEN_LEN + key.len() + LIST_LEN_LEN + list.len());
    encode_number(key.len() as u64, KEY_LEN_LEN, &mut out)?;
    out.extend_from_slice(key);
    encode_number(list.len() as u64, LIST_LEN_LEN, &mut out)?;
    out.extend_from_slice(&list);
    Ok(out)
}

/// Encode one record and write it to `w`.
pub fn write_record<W: Write>(
    w:        &mut W,
    term:     &str,
    postings: &[Posting],
    codec:    &dyn Codec,
) -> Result<(), CodecError> {
    w.write_all(&encode_record(term, postings, codec)?)?;
    Ok(())
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Read the next record head, or `Ok(None)` on a clean end of file.
///
/// The reader is left positioned at the first byte of the record's posting
/// bytes; the caller must consume or skip exactly `list_len` bytes before
/// calling again.
pub fn read_record_head<R: Read>(r: &mut R) -> Result<Option<RecordHead>, CodecError> {
    // The first byte decides between clean EOF and a truncated record.
    let mut len_buf = [0u8; KEY_LEN_LEN];
    let mut filled = 0;
    while filled < KEY_LEN_LEN {
        let n = r.read(&mut len_buf[filled..])?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(CodecError::Truncated)
            };
        }
        filled += n;
    }
    let key_len = crate::codec::decode_number(&len_buf) as usize;

    let mut key = vec![0u8; key_len];
    r.read_exact(&mut key).map_err(eof_is_truncation)?;
    let term = String::from_utf8(key)?;

    let list_len = r
        .read_uint::<BigEndian>(LIST_LEN_LEN)
        .map_err(eof_is_truncation)?;

    Ok(Some(RecordHead { term, list_len }))
}

/// Read exactly `list_len` posting bytes following a record head.
pub fn read_list_bytes<R: Read>(r: &mut R, list_len: u64) -> Result<Vec<u8>, CodecError> {
    let mut bytes = vec![0u8; list_len as usize];
    r.read_exact(&mut bytes).map_err(eof_is_truncation)?;
    Ok(bytes)
}

fn eof_is_truncation(e: io::Error) -> CodecError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::Truncated
    } else {
        CodecError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, NaiveCodec, get_codec};
    use std::io::Cursor;

    #[test]
    fn single_posting_record_layout() {
        let postings = [Posting { doc_id: 1, score: 1 }];
        let bytes = encode_record("cat", &postings, &NaiveCodec).unwrap();
        let expected: Vec<u8> = vec![
            0x03,                               // key_len
            b'c', b'a', b't',                   // key
            0x00, 0x00, 0x00, 0x0A,             // list_len = ID_LEN + SCORE_LEN
            0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // doc_id 1
            0x00, 0x00, 0x00, 0x01,             // score 1
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn head_roundtrip_and_clean_eof() {
        let postings = [
            Posting { doc_id: 4, score: 2 },
            Posting { doc_id: 9, score: 5 },
        ];
        let bytes = encode_record("dog", &postings, &NaiveCodec).unwrap();
        let mut cursor = Cursor::new(bytes.clone());

        let head = read_record_head(&mut cursor).unwrap().unwrap();
        assert_eq!(head.term, "dog");
        assert_eq!(head.on_disk_len(), bytes.len() as u64);

        let list = read_list_bytes(&mut cursor, head.list_len).unwrap();
        let decoded = get_codec(CodecKind::Naive).decode_list(&list).unwrap();
        assert_eq!(decoded, postings);

        assert!(read_record_head(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn eof_inside_record_is_truncation() {
        let postings = [Posting { doc_id: 1, score: 1 }];
        let bytes = encode_record("cat", &postings, &NaiveCodec).unwrap();

        // Cut inside the key.
        let mut cursor = Cursor::new(&bytes[..2]);
        assert!(matches!(
            read_record_head(&mut cursor),
            Err(CodecError::Truncated)
        ));

        // Cut inside the list length prefix.
        let mut cursor = Cursor::new(&bytes[..6]);
        assert!(matches!(
            read_record_head(&mut cursor),
            Err(CodecError::Truncated)
        ));

        // Cut inside the posting bytes.
        let mut cursor = Cursor::new(&bytes[..bytes.len() - 1]);
        let head = read_record_head(&mut cursor).unwrap().unwrap();
        assert!(matches!(
            read_list_bytes(&mut cursor, head.list_len),
            Err(CodecError::Truncated)
        ));
    }

    #[test]
    fn oversized_term_is_rejected() {
        let term = "x".repeat(256);
        let err = encode_record(&term, &[], &NaiveCodec).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { width: 1, .. }));
        assert!(encode_record(&"x".repeat(255), &[], &NaiveCodec).is_ok());
    }

    #[test]
    fn non_utf8_key_is_rejected() {
        let mut bytes = encode_record("abc", &[], &NaiveCodec).unwrap();
        bytes[1] = 0xFF; // clobber a key byte
        let mut cursor = Cursor::new(bytes);
        assert!(matches!(
            read_record_head(&mut cursor),
            Err(CodecError::InvalidUtf8(_))
        ));
    }
}
