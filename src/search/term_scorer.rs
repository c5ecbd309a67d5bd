use std::sync::Arc;

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::postings::PostingsIter;
use crate::scoring::similarity::Similarity;
use crate::search::scorer::{DocIdIterator, Scorer};

/// Scores one term's postings with the weight's normalized value.
pub struct TermScorer<'a> {
    postings: PostingsIter<'a>,
    similarity: Arc<dyn Similarity>,
    value: f32,
}

impl<'a> TermScorer<'a> {
    pub fn new(postings: PostingsIter<'a>, similarity: Arc<dyn Similarity>, value: f32) -> Self {
        TermScorer {
            postings,
            similarity,
            value,
        }
    }

    /// Number of docs left in the underlying posting list, used to pick the
    /// rarest term as conjunction lead.
    pub fn cost(&self) -> usize {
        self.postings.cost()
    }
}

impl DocIdIterator for TermScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.postings.doc_id()
    }

    fn next_doc(&mut self) -> Result<DocId> {
        self.postings.next_doc()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.postings.advance(target)
    }
}

impl Scorer for TermScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        Ok(self
            .similarity
            .score(self.postings.freq() as f32, self.value, self.postings.norm()))
    }

    fn freq(&self) -> u32 {
        self.postings.freq()
    }
}
