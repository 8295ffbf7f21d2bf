//! Baseline conjunctive top-k: pairwise sort-merge intersection.

use crate::codec::{DocId, Posting, Score};

/// Intersect all lists, sum scores, and keep the `k` best.
///
/// Every input list is ascending by doc id, so the running intersection
/// stays ascending and each pairwise pass is a single two-pointer sweep.
pub(crate) fn top_k(lists: &[&[Posting]], k: usize) -> Vec<(DocId, Score)> {
    let mut result: Vec<Posting> = lists[0].to_vec();
    for list in &lists[1..] {
        result = intersect(&result, list);
        if result.is_empty() {
            break;
        }
    }

    let mut ranked: Vec<(DocId, i64)> = result
        .into_iter()
        .map(|p| (p.doc_id, p.score as i64))
        .collect();
    ranked.sort_by(super::rank_order);
    ranked.truncate(k);
    ranked.into_iter().map(|(d, s)| (d, s as Score)).collect()
}

/// Two-pointer merge: emit a doc only when both lists carry it, with the
/// combined score; otherwise advance the pointer behind.
fn intersect(left: &[Posting], right: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::new();
    let mut i = 0;
    let mut j = 0;
    while i < left.len() && j < right.len() {
        let (a, b) = (left[i], right[j]);
        if a.doc_id == b.doc_id {
            out.push(Posting {
                doc_id: a.doc_id,
                score:  a.score + b.score,
            });
            i += 1;
            j += 1;
        } else if a.doc_id < b.doc_id {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}
