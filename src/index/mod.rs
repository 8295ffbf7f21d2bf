//! In-memory index builder — ordered term map, streamed out on save.
//!
//! # Invariants
//!
//! 1. Terms iterate in ascending lexicographic byte order (BTreeMap).
//! 2. Each posting list is ascending by doc id.  Ingest order is the cheap
//!    way to get this; `save` re-sorts a copy of any list a caller managed
//!    to build out of order, so the file invariant holds regardless.
//! 3. No doc id appears twice in one posting list — guaranteed by the
//!    caller presenting each document id at most once per builder.
//! 4. The score function runs exactly once per distinct (term, document)
//!    pair, however often the token repeats inside the document.
//!
//! The builder owns its map exclusively until `save`; the written file is
//! never touched again by this type.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::codec::{get_codec, CodecError, CodecKind, DocId, Posting, Score};
use crate::document::Document;
use crate::record::write_record;

pub struct InMemoryIndex<F>
where
    F: Fn(&str, &Document) -> Score,
{
    map:      BTreeMap<String, Vec<Posting>>,
    score_fn: F,
    codec:    CodecKind,
}

impl<F> InMemoryIndex<F>
where
    F: Fn(&str, &Document) -> Score,
{
    pub fn new(score_fn: F, codec: CodecKind) -> Self {
        Self {
            map: BTreeMap::new(),
            score_fn,
            codec,
        }
    }

    /// Ingest one document: score every *distinct* token of the title and
    /// text once, and append `(doc.id, score)` to that token's list.
    ///
    /// Callers must not present the same `doc.id` to one builder twice, and
    /// should ingest in ascending `doc.id` order.
    pub fn add_document(&mut self, document: &Document) {
        let mut seen: HashSet<&str> = HashSet::new();
        for group in document.token_groups() {
            for token in group {
                if seen.insert(token.as_str()) {
                    let score = (self.score_fn)(token, document);
                    let list = self.map.entry(token.clone()).or_default();
                    debug_assert!(
                        list.last().map_or(true, |p| p.doc_id < document.id),
                        "documents must be ingested in ascending doc id order",
                    );
                    list.push(Posting {
                        doc_id: document.id,
                        score,
                    });
                }
            }
        }
    }

    /// Write every record in ascending term order, truncating any prior
    /// file at `path`.  After `save` the index is conceptually read-only.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CodecError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.encode_into(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Encode the full index to a buffer without touching the disk.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    fn encode_into<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        let codec = get_codec(self.codec);
        for (term, list) in &self.map {
            if is_ascending(list) {
                write_record(w, term, list, codec)?;
            } else {
                // Out-of-order ingest: the file invariant still has to hold.
                let mut sorted = list.clone();
                sorted.sort_by_key(|p| p.doc_id);
                write_record(w, term, &sorted, codec)?;
            }
        }
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn codec(&self) -> CodecKind {
        self.codec
    }

    pub fn term_count(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Terms in ascending byte order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn posting_list(&self, term: &str) -> Option<&[Posting]> {
        self.map.get(term).map(Vec::as_slice)
    }

    /// Total number of postings across all terms.
    pub fn posting_count(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}

fn is_ascending(list: &[Posting]) -> bool {
    list.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
}

/// Ingest a whole slice of documents in order.
pub fn build_index<F>(documents: &[Document], score_fn: F, codec: CodecKind) -> InMemoryIndex<F>
where
    F: Fn(&str, &Document) -> Score,
{
    let mut index = InMemoryIndex::new(score_fn, codec);
    for doc in documents {
        index.add_document(doc);
    }
    index
}

/// The shape shared by the builder's map and the reader's selective loads.
pub type PostingMap = BTreeMap<String, Vec<Posting>>;
