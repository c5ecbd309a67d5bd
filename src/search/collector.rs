use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::core::types::DocId;

/// Sink for scored documents. Implementations must tolerate out-of-order
/// delivery; doc ids arrive already rebased to the composite reader.
pub trait Collector {
    fn collect(&mut self, doc: DocId, score: f32);
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f32,
}

// Heap ordering: lowest score (then highest doc id) at the top so the
// weakest hit is evicted first.
impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.doc_id == other.doc_id
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .partial_cmp(&self.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Search results container
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub hits: Vec<ScoredDocument>,
    pub total_hits: usize,
    pub max_score: f32,
    pub took_ms: u64,
}

/// Top-K collector for efficient result collection
pub struct TopKCollector {
    pub heap: BinaryHeap<ScoredDocument>,
    pub k: usize,
    pub min_score: f32,
    pub total_collected: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            min_score: 0.0,
            total_collected: 0,
        }
    }

    pub fn into_results(self, took_ms: u64) -> SearchResults {
        let total_hits = self.total_collected;
        let mut hits: Vec<_> = self.heap.into_iter().collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        let max_score = hits.first().map(|d| d.score).unwrap_or(0.0);
        SearchResults {
            hits,
            total_hits,
            max_score,
            took_ms,
        }
    }
}

impl Collector for TopKCollector {
    fn collect(&mut self, doc: DocId, score: f32) {
        self.total_collected += 1;

        if score > self.min_score || self.heap.len() < self.k {
            self.heap.push(ScoredDocument { doc_id: doc, score });

            if self.heap.len() > self.k {
                self.heap.pop();
                if let Some(min_doc) = self.heap.peek() {
                    self.min_score = min_doc.score;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_k_best_hits() {
        let mut collector = TopKCollector::new(2);
        collector.collect(0, 1.0);
        collector.collect(1, 3.0);
        collector.collect(2, 2.0);
        let results = collector.into_results(0);
        assert_eq!(results.total_hits, 3);
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].doc_id, 1);
        assert_eq!(results.hits[1].doc_id, 2);
        assert_eq!(results.max_score, 3.0);
    }

    #[test]
    fn out_of_order_delivery_is_fine() {
        let mut a = TopKCollector::new(3);
        let mut b = TopKCollector::new(3);
        for (doc, score) in [(5, 1.0f32), (1, 2.0), (3, 0.5)] {
            a.collect(doc, score);
        }
        for (doc, score) in [(1, 2.0f32), (3, 0.5), (5, 1.0)] {
            b.collect(doc, score);
        }
        let ra = a.into_results(0);
        let rb = b.into_results(0);
        let docs_a: Vec<_> = ra.hits.iter().map(|h| h.doc_id).collect();
        let docs_b: Vec<_> = rb.hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(docs_a, docs_b);
    }
}
