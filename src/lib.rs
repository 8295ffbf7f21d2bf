//! # invfile — disk-resident inverted index with top-k conjunctive queries
//!
//! Format guarantees (frozen):
//! - All fixed-width integers are big-endian; widths are compile-time
//!   constants (`key_len` 1 B, `list_len` 4 B, `doc_id` 6 B, `score` 4 B)
//! - Every record is self-delimiting: `key_len key list_len list_bytes`;
//!   there is no file header, footer, or index-of-indexes
//! - Records appear in ascending lexicographic term order; posting lists
//!   are ascending by doc id with no duplicates
//! - Two posting encodings share the framing: `naive` (fixed-width doc
//!   ids) and `delta` (MSB-first VarInt gaps); the codec is chosen at
//!   index creation and is not written into the file — readers must be
//!   handed the same [`CodecKind`] the writer used
//! - Files are write-once: `save` and `merge` truncate their output, and
//!   an aborted write leaves a corrupt file the caller must delete
//!
//! Build flow: documents stream into an [`InMemoryIndex`], `save` writes
//! one sorted file, and [`merge`] folds per-batch files pairwise into one
//! cumulative index.  Query flow: [`Query`] loads only the posting lists
//! of its terms and answers conjunctive top-k with either the naive
//! sort-merge engine or Fagin's Threshold Algorithm.

pub mod codec;
pub mod record;
pub mod document;
pub mod index;
pub mod index_file;
pub mod merge;
pub mod query;

// Flat re-exports for the most common types.
pub use codec::{Codec, CodecError, CodecKind, DocId, Posting, Score,
                DeltaCodec, NaiveCodec, get_codec};
pub use document::{term_frequency, Corpus, Document, SimpleTokenizer, Tokenizer};
pub use index::{build_index, InMemoryIndex, PostingMap};
pub use index_file::{read_all_posting_lists, read_only_keys, read_posting_lists, RecordCursor};
pub use merge::merge;
pub use query::{Algorithm, Query, QueryError, QueryMode};
