//! Fagin's Threshold Algorithm — conjunctive top-k with early termination.
//!
//! Each query term's posting list is visible in two orders:
//!
//! - **sorted access**: a score-descending view, materialized once per
//!   query, consumed front to back through a per-list cursor;
//! - **random access**: the on-disk doc-id order, probed by binary search.
//!
//! The loop round-robins one sorted access per list, completes each fresh
//! candidate's score by random access into every other list, and maintains
//! the best `k` candidates.  The threshold `τ` — the sum of the score last
//! seen in every sorted view — upper-bounds the combined score of any
//! document not yet seen, because sum is monotone in its per-list inputs.
//! Once the worst kept score reaches `τ`, nothing unseen can displace the
//! kept set and the loop stops without draining the lists.
//!
//! A document missing from any list contributes a large negative sentinel,
//! which drags the combined score below zero and drops the candidate: that
//! is the conjunctive filter.

use std::collections::HashSet;

use crate::codec::{DocId, Posting, Score};

/// Score contributed by a list that does not contain the candidate.
/// Negative enough that no realistic sum of present scores recovers it.
const MISSING_SCORE: i64 = -1_000_000;

/// Counters exposed for termination tests and bench reporting.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct AccessStats {
    /// Fresh documents pulled through sorted access.
    pub sorted_accesses: usize,
    /// Distinct documents scored (equals `sorted_accesses`).
    pub seen:            usize,
}

pub(crate) fn top_k(lists: &[&[Posting]], k: usize) -> Vec<(DocId, Score)> {
    run(lists, k).0
}

pub(crate) fn run(lists_by_id: &[&[Posting]], k: usize) -> (Vec<(DocId, Score)>, AccessStats) {
    let m = lists_by_id.len();
    debug_assert!(m > 0 && k > 0);

    // Score-descending views; ties by ascending doc id keep runs
    // reproducible.
    let by_score: Vec<Vec<Posting>> = lists_by_id
        .iter()
        .map(|list| {
            let mut v = list.to_vec();
            v.sort_by(|a, b| b.score.cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
            v
        })
        .collect();

    let mut cursor = vec![0usize; m];
    let mut best: Vec<(DocId, i64)> = Vec::with_capacity(k);
    let mut score_min = i64::MAX; // meaningful only once `best` is full
    let mut tau = i64::MAX;       // meaningful only after m sorted accesses
    let mut sorted_access_count = 0usize;
    let mut seen: HashSet<DocId> = HashSet::new();

    'round: while best.len() < k || score_min < tau {
        for j in 0..m {
            // 1. Next unseen document from list j's score-descending view.
            //    An exhausted list means every candidate it contains has
            //    been scored: the kept set is final.
            let (doc, own_score) = loop {
                let Some(p) = by_score[j].get(cursor[j]) else {
                    break 'round;
                };
                cursor[j] += 1;
                if seen.insert(p.doc_id) {
                    sorted_access_count += 1;
                    break (p.doc_id, p.score as i64);
                }
            };

            // 2. Complete the score by random access into the other lists.
            let mut combined = own_score;
            for (other_j, other) in lists_by_id.iter().enumerate() {
                if other_j != j {
                    combined += find_score(other, doc).unwrap_or(MISSING_SCORE);
                }
            }

            // 3. Conjunctive filter, then fold into the kept set.
            if combined >= 0 {
                if best.len() < k {
                    insert_descending(&mut best, (doc, combined));
                    score_min = best.last().expect("kept set is non-empty").1;
                } else if combined > score_min {
                    best.pop();
                    insert_descending(&mut best, (doc, combined));
                    score_min = best.last().expect("kept set is non-empty").1;
                }
            }

            // 4. Threshold: sum of the score last yielded by every list's
            //    sorted view.  Defined only once every list has yielded.
            if sorted_access_count >= m {
                tau = (0..m)
                    .map(|j2| by_score[j2][cursor[j2] - 1].score as i64)
                    .sum();
            }
        }
    }

    let stats = AccessStats {
        sorted_accesses: sorted_access_count,
        seen:            seen.len(),
    };

    // Candidates passed the conjunctive filter, so every kept score is
    // non-negative; `best` is already score-descending.
    best.sort_by(super::rank_order);
    (
        best.into_iter().map(|(d, s)| (d, s as Score)).collect(),
        stats,
    )
}

/// Binary search the doc-id-sorted list for `doc_id`.
fn find_score(list: &[Posting], doc_id: DocId) -> Option<i64> {
    list.binary_search_by_key(&doc_id, |p| p.doc_id)
        .ok()
        .map(|i| list[i].score as i64)
}

/// Insert into a score-descending vector, after any equal scores.
fn insert_descending(best: &mut Vec<(DocId, i64)>, item: (DocId, i64)) {
    let pos = best.partition_point(|e| e.1 >= item.1);
    best.insert(pos, item);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[(DocId, Score)]) -> Vec<Posting> {
        entries
            .iter()
            .map(|&(doc_id, score)| Posting { doc_id, score })
            .collect()
    }

    #[test]
    fn find_score_hits_and_misses() {
        let l = list(&[(2, 10), (5, 20), (9, 30)]);
        assert_eq!(find_score(&l, 5), Some(20));
        assert_eq!(find_score(&l, 9), Some(30));
        assert_eq!(find_score(&l, 4), None);
        assert_eq!(find_score(&[], 4), None);
    }

    #[test]
    fn insert_keeps_descending_order() {
        let mut best = Vec::new();
        for item in [(1, 5i64), (2, 9), (3, 5), (4, 1), (5, 7)] {
            insert_descending(&mut best, item);
        }
        let scores: Vec<i64> = best.iter().map(|e| e.1).collect();
        assert_eq!(scores, vec![9, 7, 5, 5, 1]);
    }

    #[test]
    fn two_lists_basic_conjunction() {
        let a = list(&[(1, 1), (2, 1)]);
        let b = list(&[(1, 1)]);
        let (hits, _) = run(&[&a, &b], 5);
        assert_eq!(hits, vec![(1, 2)]);
    }

    #[test]
    fn top_k_bounds_the_result() {
        let a = list(&[(1, 10), (2, 20), (3, 30), (4, 40)]);
        let b = list(&[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let (hits, _) = run(&[&a, &b], 2);
        assert_eq!(hits, vec![(4, 44), (3, 33)]);
    }

    #[test]
    fn terminates_early_on_selective_conjunction() {
        // 1000 documents carry "a"; only docs 1-3 also carry "b", with the
        // highest scores in both lists.  The threshold collapses after the
        // shared documents are drained, long before 1000 candidates.
        let a: Vec<Posting> = (1..=1000)
            .map(|id| Posting {
                doc_id: id,
                score:  if id <= 3 { 1000 + id } else { 1004 - id },
            })
            .collect();
        let b = list(&[(1, 900), (2, 901), (3, 902)]);

        let (hits, stats) = run(&[&a, &b], 3);
        assert_eq!(hits.len(), 3);
        let ids: Vec<DocId> = hits.iter().map(|h| h.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(
            stats.seen <= 4 * 3,
            "scored {} candidates for top 3",
            stats.seen
        );
    }

    #[test]
    fn disjoint_lists_drain_and_return_empty() {
        let a = list(&[(1, 9), (3, 8)]);
        let b = list(&[(2, 9), (4, 8)]);
        let (hits, _) = run(&[&a, &b], 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn sentinel_drops_partial_matches_only() {
        let a = list(&[(1, 5), (2, 7)]);
        let b = list(&[(2, 2), (3, 9)]);
        let c = list(&[(2, 4), (3, 1)]);
        let (hits, _) = run(&[&a, &b, &c], 10);
        assert_eq!(hits, vec![(2, 13)]);
    }
}
