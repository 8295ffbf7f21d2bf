//! Conjunctive top-k query engine.
//!
//! A query is parsed once (tokenize, deduplicate) and can then be executed
//! against an index file with either algorithm:
//!
//! - **naive** — load all query posting lists, intersect them with a
//!   two-pointer merge, sort by score, keep the top k.
//! - **threshold** — Fagin's Threshold Algorithm: interleave sorted access
//!   (descending score) with random access (binary search by doc id) and
//!   stop as soon as no unseen document can beat the current top k.
//!
//! Both return the same result set for the same query (ties may order
//! differently only when scores are equal, and even then both engines
//! break ties by ascending doc id).
//!
//! A query term that is absent from the index makes the conjunction
//! unsatisfiable: the result is empty, never an error.

mod naive;
mod threshold;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{CodecError, CodecKind, DocId, Score};
use crate::document::Tokenizer;
use crate::index_file::read_posting_lists;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum QueryError {
    /// The query tokenized to nothing.
    #[error("A query must contain at least one token")]
    EmptyQuery,
    /// Anything other than a conjunctive (AND) query.
    #[error("Only conjunctive queries are supported")]
    Unsupported,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ── Query ────────────────────────────────────────────────────────────────────

/// How the query terms combine.  Only `Conjunctive` executes; the variant
/// exists so callers state their intent and get a clean error otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Conjunctive,
    Disjunctive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Naive,
    Threshold,
}

/// A parsed conjunctive query bound to one index file.
pub struct Query {
    terms:      Vec<String>,
    index_path: PathBuf,
    codec:      CodecKind,
    algorithm:  Algorithm,
}

impl Query {
    /// Parse a query for the naive sort-merge engine.
    pub fn new_naive<T: Tokenizer + ?Sized>(
        query:      &str,
        tokenizer:  &T,
        index_path: impl AsRef<Path>,
        codec:      CodecKind,
        mode:       QueryMode,
    ) -> Result<Self, QueryError> {
        Self::new(query, tokenizer, index_path, codec, mode, Algorithm::Naive)
    }

    /// Parse a query for the threshold-algorithm engine.
    pub fn new_threshold<T: Tokenizer + ?Sized>(
        query:      &str,
        tokenizer:  &T,
        index_path: impl AsRef<Path>,
        codec:      CodecKind,
        mode:       QueryMode,
    ) -> Result<Self, QueryError> {
        Self::new(query, tokenizer, index_path, codec, mode, Algorithm::Threshold)
    }

    fn new<T: Tokenizer + ?Sized>(
        query:      &str,
        tokenizer:  &T,
        index_path: impl AsRef<Path>,
        codec:      CodecKind,
        mode:       QueryMode,
        algorithm:  Algorithm,
    ) -> Result<Self, QueryError> {
        if mode != QueryMode::Conjunctive {
            return Err(QueryError::Unsupported);
        }
        let terms = dedup_first_occurrence(tokenizer.word_tokenize(query));
        if terms.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(Self {
            terms,
            index_path: index_path.as_ref().to_owned(),
            codec,
            algorithm,
        })
    }

    /// Distinct query terms in first-occurrence order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Run the query, returning at most `top_k` `(doc_id, combined_score)`
    /// pairs sorted by score descending (ties by ascending doc id).
    pub fn execute(&self, top_k: usize) -> Result<Vec<(DocId, Score)>, QueryError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let map = read_posting_lists(&self.terms, &self.index_path, self.codec)?;

        // Conjunctive: one absent term empties the result.
        let mut lists = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match map.get(term) {
                Some(list) => lists.push(list.as_slice()),
                None => return Ok(Vec::new()),
            }
        }

        Ok(match self.algorithm {
            Algorithm::Naive => naive::top_k(&lists, top_k),
            Algorithm::Threshold => threshold::top_k(&lists, top_k),
        })
    }
}

fn dedup_first_occurrence(tokens: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Order results by combined score descending, ties by ascending doc id.
pub(crate) fn rank_order(a: &(DocId, i64), b: &(DocId, i64)) -> std::cmp::Ordering {
    b.1.cmp(&a.1).then(a.0.cmp(&b.0))
}
