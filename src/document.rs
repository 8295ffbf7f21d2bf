//! Corpus collaborators: documents, the tokenizer seam, and the reference
//! score function.
//!
//! The index core never tokenizes raw text itself.  It consumes
//! [`Document`] values whose title and paragraphs are already token lists,
//! and a score function that maps one `(token, document)` pair to an
//! unsigned score.  The [`Tokenizer`] trait is the seam for query strings
//! and for whatever front end turns raw articles into documents; the
//! bundled [`SimpleTokenizer`] is deliberately plain (no stemming).

use serde::{Deserialize, Serialize};

use crate::codec::{DocId, Score};

// ── Document ─────────────────────────────────────────────────────────────────

/// One tokenized article.
///
/// `text` is a list of paragraphs, each paragraph a list of tokens; `title`
/// is one more token list.  `date` and `length` ride along untouched — the
/// index core only looks at `id`, `title`, and `text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub text: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

impl Document {
    /// Every token group of the document: each text paragraph, then the
    /// title as one more group.
    pub fn token_groups(&self) -> impl Iterator<Item = &[String]> {
        self.text
            .iter()
            .map(Vec::as_slice)
            .chain(std::iter::once(self.title.as_slice()))
    }
}

// ── Corpus ───────────────────────────────────────────────────────────────────

/// A set of tokenized documents, serializable as the JSON interchange
/// format consumed by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Concatenate two corpora into one.
    pub fn concat(mut left: Corpus, mut right: Corpus) -> Corpus {
        left.documents.append(&mut right.documents);
        left
    }
}

// ── Tokenizer seam ───────────────────────────────────────────────────────────

pub trait Tokenizer {
    /// Split raw text into tokens.  May normalize, may drop punctuation.
    fn word_tokenize(&self, text: &str) -> Vec<String>;
}

/// Whitespace-and-punctuation tokenizer: tokens are maximal alphanumeric
/// runs, lowercased by default.  Punctuation never survives as a token.
#[derive(Debug, Clone)]
pub struct SimpleTokenizer {
    pub lowercase: bool,
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self { lowercase: true }
    }
}

impl Tokenizer for SimpleTokenizer {
    fn word_tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| {
                if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_owned()
                }
            })
            .collect()
    }
}

// ── Reference score function ─────────────────────────────────────────────────

/// Raw term frequency of `token` across the title and every paragraph.
///
/// Deterministic, as every score function must be: calling it twice for the
/// same `(token, document)` pair yields the same score.
pub fn term_frequency(token: &str, document: &Document) -> Score {
    document
        .token_groups()
        .map(|group| group.iter().filter(|word| word.as_str() == token).count() as Score)
        .sum()
}
