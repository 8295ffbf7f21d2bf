//! On-disk index readers — keys-only scan, selective load, record cursor.
//!
//! All three readers make exactly one forward pass over the file.  Nothing
//! is cached across calls, the file is never mutated, and seeks only ever
//! move forward (past posting bytes the caller does not want).
//!
//! # Truncation
//! The keys-only scan and the selective load check every skip against the
//! file length, so a file cut inside a record's posting bytes is reported
//! as [`CodecError::Truncated`] instead of silently ending the scan.  EOF
//! on a record boundary is the normal end of the file.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::codec::{get_codec, Codec, CodecError, CodecKind, Posting};
use crate::index::PostingMap;
use crate::record::{read_list_bytes, read_record_head};

// ── Keys-only scan ───────────────────────────────────────────────────────────

/// Scan every record, returning `(term, record_offset)` pairs in file
/// order (which is ascending term order for a well-formed file).  Posting
/// bytes are skipped, never decoded, so the cost is proportional to the
/// number of terms, not the number of postings.
pub fn read_only_keys<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u64)>, CodecError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);

    let mut keys = Vec::new();
    let mut pos: u64 = 0;
    while let Some(head) = read_record_head(&mut r)? {
        keys.push((head.term.clone(), pos));
        pos += head.on_disk_len();
        if pos > file_len {
            return Err(CodecError::Truncated);
        }
        r.seek_relative(head.list_len as i64)?;
    }
    Ok(keys)
}

// ── Selective load ───────────────────────────────────────────────────────────

/// Walk the file once, decoding only the records whose term is in `terms`
/// and skipping every other posting list.
pub fn read_posting_lists<P: AsRef<Path>>(
    terms: &[String],
    path:  P,
    codec: CodecKind,
) -> Result<PostingMap, CodecError> {
    let wanted: HashSet<&str> = terms.iter().map(String::as_str).collect();
    load_filtered(path, codec, |term| wanted.contains(term))
}

/// Decode every record in the file.
pub fn read_all_posting_lists<P: AsRef<Path>>(
    path:  P,
    codec: CodecKind,
) -> Result<PostingMap, CodecError> {
    load_filtered(path, codec, |_| true)
}

fn load_filtered<P, Pred>(path: P, codec: CodecKind, wanted: Pred) -> Result<PostingMap, CodecError>
where
    P: AsRef<Path>,
    Pred: Fn(&str) -> bool,
{
    let codec = get_codec(codec);
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);

    let mut map = PostingMap::new();
    let mut pos: u64 = 0;
    while let Some(head) = read_record_head(&mut r)? {
        pos += head.on_disk_len();
        if wanted(&head.term) {
            let bytes = read_list_bytes(&mut r, head.list_len)?;
            map.insert(head.term, codec.decode_list(&bytes)?);
        } else {
            if pos > file_len {
                return Err(CodecError::Truncated);
            }
            r.seek_relative(head.list_len as i64)?;
        }
    }
    Ok(map)
}

// ── Record cursor ────────────────────────────────────────────────────────────

/// Streaming record iterator over one index file, decoding every posting
/// list.  One record is held in memory at a time; this is what the merger
/// drains on both of its inputs.
pub struct RecordCursor {
    reader: BufReader<File>,
    codec:  &'static dyn Codec,
}

impl RecordCursor {
    pub fn open<P: AsRef<Path>>(path: P, codec: CodecKind) -> Result<Self, CodecError> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
            codec:  get_codec(codec),
        })
    }

    /// The next `(term, postings)` record, or `Ok(None)` at clean EOF.
    pub fn next_record(&mut self) -> Result<Option<(String, Vec<Posting>)>, CodecError> {
        match read_record_head(&mut self.reader)? {
            None => Ok(None),
            Some(head) => {
                let bytes = read_list_bytes(&mut self.reader, head.list_len)?;
                Ok(Some((head.term, self.codec.decode_list(&bytes)?)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecKind, DocId};
    use crate::document::{term_frequency, Document};
    use crate::index::InMemoryIndex;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn doc(id: DocId, tokens: &[&str]) -> Document {
        Document {
            id,
            title: Vec::new(),
            text: vec![tokens.iter().map(|s| s.to_string()).collect()],
            date: None,
            length: None,
        }
    }

    fn three_term_index(codec: CodecKind) -> (NamedTempFile, InMemoryIndex<fn(&str, &Document) -> u64>) {
        let mut index: InMemoryIndex<fn(&str, &Document) -> u64> =
            InMemoryIndex::new(term_frequency, codec);
        index.add_document(&doc(1, &["ant", "bee"]));
        index.add_document(&doc(2, &["bee", "cow"]));
        let file = NamedTempFile::new().unwrap();
        index.save(file.path()).unwrap();
        (file, index)
    }

    #[test]
    fn keys_only_scan_returns_terms_and_offsets() {
        for codec in [CodecKind::Naive, CodecKind::Delta] {
            let (file, _) = three_term_index(codec);
            let keys = read_only_keys(file.path()).unwrap();
            let terms: Vec<&str> = keys.iter().map(|(t, _)| t.as_str()).collect();
            assert_eq!(terms, vec!["ant", "bee", "cow"]);
            assert_eq!(keys[0].1, 0);
            assert!(keys[0].1 < keys[1].1 && keys[1].1 < keys[2].1);
        }
    }

    #[test]
    fn offsets_point_at_their_records() {
        use std::io::{Read, Seek, SeekFrom};
        let (file, _) = three_term_index(CodecKind::Naive);
        let keys = read_only_keys(file.path()).unwrap();
        let mut f = File::open(file.path()).unwrap();
        for (term, offset) in keys {
            f.seek(SeekFrom::Start(offset)).unwrap();
            let mut len = [0u8; 1];
            f.read_exact(&mut len).unwrap();
            let mut key = vec![0u8; len[0] as usize];
            f.read_exact(&mut key).unwrap();
            assert_eq!(String::from_utf8(key).unwrap(), term);
        }
    }

    #[test]
    fn selective_load_skips_unwanted_terms() {
        let (file, index) = three_term_index(CodecKind::Delta);
        let map =
            read_posting_lists(&["bee".to_string(), "yak".to_string()], file.path(), CodecKind::Delta)
                .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["bee"], index.posting_list("bee").unwrap());
    }

    #[test]
    fn full_load_reconstructs_the_builder_map() {
        for codec in [CodecKind::Naive, CodecKind::Delta] {
            let (file, index) = three_term_index(codec);
            let map = read_all_posting_lists(file.path(), codec).unwrap();
            assert_eq!(map.len(), index.term_count());
            for (term, list) in &map {
                assert_eq!(list.as_slice(), index.posting_list(term).unwrap());
            }
        }
    }

    #[test]
    fn empty_file_yields_no_keys() {
        let file = NamedTempFile::new().unwrap();
        assert!(read_only_keys(file.path()).unwrap().is_empty());
        assert!(read_all_posting_lists(file.path(), CodecKind::Naive)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn truncated_posting_bytes_are_detected() {
        let (file, _) = three_term_index(CodecKind::Naive);
        let bytes = std::fs::read(file.path()).unwrap();
        let mut cut = NamedTempFile::new().unwrap();
        cut.write_all(&bytes[..bytes.len() - 3]).unwrap();
        cut.flush().unwrap();

        assert!(matches!(
            read_only_keys(cut.path()),
            Err(CodecError::Truncated)
        ));
        assert!(matches!(
            read_posting_lists(&[], cut.path(), CodecKind::Naive),
            Err(CodecError::Truncated)
        ));
    }

    #[test]
    fn concatenated_files_read_as_one_sequence() {
        // Records are self-delimiting, so two files glued at a record
        // boundary read back as one sequence (well-formed iff the boundary
        // preserves term order, as it does here).
        let mut left: InMemoryIndex<fn(&str, &Document) -> u64> =
            InMemoryIndex::new(term_frequency, CodecKind::Naive);
        left.add_document(&doc(1, &["ant"]));
        let mut right: InMemoryIndex<fn(&str, &Document) -> u64> =
            InMemoryIndex::new(term_frequency, CodecKind::Naive);
        right.add_document(&doc(2, &["bee"]));

        let mut glued = NamedTempFile::new().unwrap();
        glued.write_all(&left.to_bytes().unwrap()).unwrap();
        glued.write_all(&right.to_bytes().unwrap()).unwrap();
        glued.flush().unwrap();

        let keys = read_only_keys(glued.path()).unwrap();
        let terms: Vec<&str> = keys.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(terms, vec!["ant", "bee"]);
    }

    #[test]
    fn cursor_streams_records_in_order() {
        let (file, index) = three_term_index(CodecKind::Naive);
        let mut cursor = RecordCursor::open(file.path(), CodecKind::Naive).unwrap();
        let mut seen = Vec::new();
        while let Some((term, list)) = cursor.next_record().unwrap() {
            assert_eq!(list.as_slice(), index.posting_list(&term).unwrap());
            seen.push(term);
        }
        assert_eq!(seen, vec!["ant", "bee", "cow"]);
    }
}
