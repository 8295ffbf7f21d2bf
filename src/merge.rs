//! Streaming two-way merge of sorted index files.
//!
//! Both inputs are drained through a [`RecordCursor`]; at any moment the
//! merger holds at most one record per input plus the record being written,
//! so memory stays flat no matter how large the inputs are.
//!
//! # Shared terms
//! When both inputs carry the same term, the output posting list is the
//! left list followed by the right list.  The inputs are expected to be
//! doc-id-disjoint (a partitioned corpus — each document indexed into
//! exactly one input); the merger does not deduplicate or re-sort.  Callers
//! that cannot guarantee disjointness must pre-partition their corpus.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::codec::{get_codec, CodecError, CodecKind};
use crate::index_file::RecordCursor;
use crate::record::write_record;

/// Merge the sorted index files at `left_path` and `right_path` into a new
/// file at `out_path`, truncating any prior contents.  All three files use
/// the same codec.
pub fn merge(
    out_path:   impl AsRef<Path>,
    left_path:  impl AsRef<Path>,
    right_path: impl AsRef<Path>,
    codec:      CodecKind,
) -> Result<(), CodecError> {
    let mut left = RecordCursor::open(left_path, codec)?;
    let mut right = RecordCursor::open(right_path, codec)?;
    let codec = get_codec(codec);

    let mut w = BufWriter::new(File::create(out_path)?);

    let mut l = left.next_record()?;
    let mut r = right.next_record()?;

    loop {
        match (l, r) {
            (None, None) => break,
            (Some((term, postings)), None) => {
                write_record(&mut w, &term, &postings, codec)?;
                l = left.next_record()?;
                r = None;
            }
            (None, Some((term, postings))) => {
                write_record(&mut w, &term, &postings, codec)?;
                l = None;
                r = right.next_record()?;
            }
            (Some((l_term, l_postings)), Some((r_term, r_postings))) => {
                use std::cmp::Ordering;
                match l_term.cmp(&r_term) {
                    Ordering::Less => {
                        write_record(&mut w, &l_term, &l_postings, codec)?;
                        l = left.next_record()?;
                        r = Some((r_term, r_postings));
                    }
                    Ordering::Greater => {
                        write_record(&mut w, &r_term, &r_postings, codec)?;
                        l = Some((l_term, l_postings));
                        r = right.next_record()?;
                    }
                    Ordering::Equal => {
                        let mut postings = l_postings;
                        postings.extend(r_postings);
                        write_record(&mut w, &l_term, &postings, codec)?;
                        l = left.next_record()?;
                        r = right.next_record()?;
                    }
                }
            }
        }
    }

    w.flush()?;
    Ok(())
}
