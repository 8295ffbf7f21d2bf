//! Posting-list codecs: frozen wire widths + naive and delta encodings.
//!
//! # Identity rules
//! Every index file is written by exactly one codec, chosen at index
//! creation.  The legacy stream carries no codec tag and no magic number,
//! so the identity travels with the caller: readers, the merger, and the
//! query engine are handed the same [`CodecKind`] the writer used.  Feeding
//! a file to the wrong codec produces garbage postings, not a crash.
//!
//! # Wire widths
//! All width constants below are format-defining and frozen.  Changing any
//! of them produces a new, incompatible format; there is no runtime
//! negotiation.  All fixed-width integers are big-endian.
//!
//! # Encodings
//! Both codecs share the record framing (`record.rs`) and differ only in
//! the posting bytes:
//!
//! ```text
//! naive:  ( doc_id(ID_LEN)  score(SCORE_LEN) )*
//! delta:  VarInt(doc_id_0)                 score(SCORE_LEN)
//!         VarInt(doc_id_i − doc_id_{i−1})  score(SCORE_LEN)  ...
//! ```
//!
//! The VarInt splits the integer into 7-bit groups, most-significant group
//! first; every byte except the last has its high bit set.  `127 → 7F`,
//! `128 → 81 00`, `16384 → 81 80 00`.  The delta decoder keeps its running
//! doc id as a local, reset to 0 at the start of every posting list.

use std::io;
use thiserror::Error;

// ── Frozen wire widths ───────────────────────────────────────────────────────

/// Bytes for the term length prefix (terms are at most 255 UTF-8 bytes).
pub const KEY_LEN_LEN: usize = 1;
/// Bytes for the posting-list byte-length prefix.
pub const LIST_LEN_LEN: usize = 4;
/// Bytes per doc id in the naive encoding.
pub const ID_LEN: usize = 6;
/// Bytes per score in both encodings.
pub const SCORE_LEN: usize = 4;

/// Longest VarInt this build accepts: ceil(64 / 7) bytes.
/// Anything longer is corruption, not a bigger number.
pub const MAX_VARINT_BYTES: usize = 10;

// ── Core types ───────────────────────────────────────────────────────────────

/// Unsigned document identifier.  Must fit `ID_LEN` bytes in the naive
/// encoding; the delta encoding has no width ceiling.
pub type DocId = u64;

/// Unsigned per-(term, document) score.  Must fit `SCORE_LEN` bytes.
pub type Score = u64;

/// One `(doc_id, score)` entry of a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Posting {
    pub doc_id: DocId,
    pub score:  Score,
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    /// A width-limited field overflowed its byte budget.  Fatal to the
    /// current save or merge.
    #[error("Value {value} does not fit in {width} byte(s)")]
    OutOfRange { value: u64, width: usize },
    /// EOF hit in the middle of a record.  EOF *between* records is a clean
    /// end of file, never an error.
    #[error("Unexpected end of file inside a record")]
    Truncated,
    #[error("Term bytes are not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Fixed-width numbers ──────────────────────────────────────────────────────

/// Append `value` as `width` big-endian bytes, most-significant first.
///
/// Fails with `OutOfRange` if `value ≥ 2^(8·width)`.
pub fn encode_number(value: u64, width: usize, out: &mut Vec<u8>) -> Result<(), CodecError> {
    debug_assert!((1..=8).contains(&width));
    if width < 8 && value >> (8 * width) != 0 {
        return Err(CodecError::OutOfRange { value, width });
    }
    for i in (0..width).rev() {
        out.push((value >> (8 * i)) as u8);
    }
    Ok(())
}

/// Decode a big-endian unsigned integer of any width up to 8 bytes.
pub fn decode_number(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

// ── VarInt ───────────────────────────────────────────────────────────────────

/// Append `value` as a most-significant-first VarInt.
pub fn encode_varint(value: u64, out: &mut Vec<u8>) {
    let mut groups = [0u8; MAX_VARINT_BYTES];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    // Groups were collected least-significant first; emit them reversed,
    // continuation bit on every byte but the final one.
    for i in (0..n).rev() {
        if i == 0 {
            out.push(groups[i]);
        } else {
            out.push(groups[i] | 0x80);
        }
    }
}

/// Decode a VarInt from the front of `bytes`, returning `(value, consumed)`.
///
/// Fails with `Truncated` when the buffer ends before the terminal byte,
/// and with `OutOfRange` on a continuation run longer than
/// `MAX_VARINT_BYTES`.
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if i >= MAX_VARINT_BYTES {
            return Err(CodecError::OutOfRange {
                value,
                width: MAX_VARINT_BYTES,
            });
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::Truncated)
}

// ── CodecKind ────────────────────────────────────────────────────────────────

/// Runtime codec discriminant.  Selected once at index creation and passed
/// unchanged to every reader of the resulting files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    /// Fixed-width doc ids — simplest possible layout.
    Naive,
    /// VarInt gap-compressed doc ids — smaller files for dense terms.
    Delta,
}

impl CodecKind {
    /// Human-readable name (for diagnostics only — never parsed off disk).
    pub fn name(self) -> &'static str {
        match self {
            CodecKind::Naive => "naive",
            CodecKind::Delta => "delta",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "naive" => Some(CodecKind::Naive),
            "delta" => Some(CodecKind::Delta),
            _       => None,
        }
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn kind(&self) -> CodecKind;
    /// Append the posting bytes for `postings` to `out`.
    /// `postings` must be ascending by doc id.
    fn encode_list(&self, postings: &[Posting], out: &mut Vec<u8>) -> Result<(), CodecError>;
    /// Decode one complete posting list from `bytes`.
    fn decode_list(&self, bytes: &[u8]) -> Result<Vec<Posting>, CodecError>;
}

// ── Built-in codec implementations ──────────────────────────────────────────

pub struct NaiveCodec;

impl Codec for NaiveCodec {
    fn kind(&self) -> CodecKind { CodecKind::Naive }

    fn encode_list(&self, postings: &[Posting], out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.reserve(postings.len() * (ID_LEN + SCORE_LEN));
        for p in postings {
            encode_number(p.doc_id, ID_LEN, out)?;
            encode_number(p.score, SCORE_LEN, out)?;
        }
        Ok(())
    }

    fn decode_list(&self, bytes: &[u8]) -> Result<Vec<Posting>, CodecError> {
        let entry = ID_LEN + SCORE_LEN;
        if bytes.len() % entry != 0 {
            return Err(CodecError::Truncated);
        }
        Ok(bytes
            .chunks_exact(entry)
            .map(|chunk| Posting {
                doc_id: decode_number(&chunk[..ID_LEN]),
                score:  decode_number(&chunk[ID_LEN..]),
            })
            .collect())
    }
}

pub struct DeltaCodec;

impl Codec for DeltaCodec {
    fn kind(&self) -> CodecKind { CodecKind::Delta }

    fn encode_list(&self, postings: &[Posting], out: &mut Vec<u8>) -> Result<(), CodecError> {
        let mut last_id: DocId = 0;
        for p in postings {
            debug_assert!(
                p.doc_id >= last_id,
                "posting list must be ascending by doc id",
            );
            encode_varint(p.doc_id - last_id, out);
            last_id = p.doc_id;
            encode_number(p.score, SCORE_LEN, out)?;
        }
        Ok(())
    }

    fn decode_list(&self, bytes: &[u8]) -> Result<Vec<Posting>, CodecError> {
        let mut out = Vec::new();
        let mut pos = 0usize;
        // Running doc id is local to this call and starts at 0 for every
        // posting list.
        let mut last_id: DocId = 0;
        while pos < bytes.len() {
            let (gap, consumed) = decode_varint(&bytes[pos..])?;
            pos += consumed;
            last_id += gap;
            if pos + SCORE_LEN > bytes.len() {
                return Err(CodecError::Truncated);
            }
            let score = decode_number(&bytes[pos..pos + SCORE_LEN]);
            pos += SCORE_LEN;
            out.push(Posting { doc_id: last_id, score });
        }
        Ok(out)
    }
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Resolve a discriminant to its codec implementation.
pub fn get_codec(kind: CodecKind) -> &'static dyn Codec {
    match kind {
        CodecKind::Naive => &NaiveCodec,
        CodecKind::Delta => &DeltaCodec,
    }
}
