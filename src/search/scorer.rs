use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::search::collector::Collector;

/// Forward cursor over an increasing stream of document ids.
///
/// Contract: `doc_id` is -1 before the first `next_doc`, `NO_MORE_DOCS` after
/// exhaustion, otherwise the current match. `advance(target)` lands on the
/// first doc at or after `target`; a target at or below the current doc is a
/// no-op. Cursors never move backward.
pub trait DocIdIterator {
    fn doc_id(&self) -> DocId;
    fn next_doc(&mut self) -> Result<DocId>;
    fn advance(&mut self, target: DocId) -> Result<DocId>;
}

/// A positioned doc-id cursor that can also score the current document.
/// Single-use and bound to one segment.
pub trait Scorer: DocIdIterator {
    fn score(&mut self) -> Result<f32>;

    /// Raw within-document frequency behind the current score.
    fn freq(&self) -> u32 {
        1
    }

    /// Drive the whole stream into a collector. Out-of-order scorers
    /// override this; everyone else just walks `next_doc`.
    fn score_all(&mut self, collector: &mut dyn Collector, doc_base: DocId) -> Result<()> {
        while self.next_doc()? != NO_MORE_DOCS {
            let score = self.score()?;
            collector.collect(doc_base + self.doc_id(), score);
        }
        Ok(())
    }
}

/// Cursor over a materialized doc-id set (filters, cached bitmaps).
pub struct BitSetIterator {
    docs: Vec<u32>,
    idx: usize,
    doc: DocId,
}

impl BitSetIterator {
    pub fn new(bits: &RoaringBitmap) -> Self {
        BitSetIterator {
            docs: bits.iter().collect(),
            idx: 0,
            doc: -1,
        }
    }
}

impl DocIdIterator for BitSetIterator {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.idx < self.docs.len() {
            self.doc = self.docs[self.idx] as DocId;
            self.idx += 1;
        } else {
            self.doc = NO_MORE_DOCS;
        }
        Ok(self.doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let off = self.docs[self.idx..].partition_point(|&d| (d as DocId) < target);
        self.idx += off;
        self.next_doc()
    }
}

/// Iteration source for a constant-score query: either a wrapped scorer
/// (scores ignored) or a filter's doc-id set.
pub enum ConstantSource<'a> {
    Scorer(Box<dyn Scorer + 'a>),
    Bits(BitSetIterator),
}

/// Emits the same normalized score for every matching document.
pub struct ConstantScorer<'a> {
    source: ConstantSource<'a>,
    score: f32,
}

impl<'a> ConstantScorer<'a> {
    pub fn new(source: ConstantSource<'a>, score: f32) -> Self {
        ConstantScorer { source, score }
    }
}

impl DocIdIterator for ConstantScorer<'_> {
    fn doc_id(&self) -> DocId {
        match &self.source {
            ConstantSource::Scorer(s) => s.doc_id(),
            ConstantSource::Bits(b) => b.doc_id(),
        }
    }

    fn next_doc(&mut self) -> Result<DocId> {
        match &mut self.source {
            ConstantSource::Scorer(s) => s.next_doc(),
            ConstantSource::Bits(b) => b.next_doc(),
        }
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        match &mut self.source {
            ConstantSource::Scorer(s) => s.advance(target),
            ConstantSource::Bits(b) => b.advance(target),
        }
    }
}

impl Scorer for ConstantScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        Ok(self.score)
    }
}

/// Leapfrog intersection of a scorer with a filter's doc-id set. Scores come
/// from the inner scorer alone.
pub struct FilteredScorer<'a> {
    scorer: Box<dyn Scorer + 'a>,
    filter: BitSetIterator,
    doc: DocId,
}

impl<'a> FilteredScorer<'a> {
    pub fn new(scorer: Box<dyn Scorer + 'a>, filter: BitSetIterator) -> Self {
        FilteredScorer {
            scorer,
            filter,
            doc: -1,
        }
    }

    fn align(&mut self, mut doc: DocId) -> Result<DocId> {
        loop {
            if doc == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            let f = self.filter.advance(doc)?;
            if f == doc {
                self.doc = doc;
                return Ok(doc);
            }
            doc = self.scorer.advance(f)?;
        }
    }
}

impl DocIdIterator for FilteredScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let doc = self.scorer.next_doc()?;
        self.align(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let doc = self.scorer.advance(target)?;
        self.align(doc)
    }
}

impl Scorer for FilteredScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        self.scorer.score()
    }

    fn freq(&self) -> u32 {
        self.scorer.freq()
    }
}

/// Every live document of the segment, at a constant score.
pub struct MatchAllScorer<'a> {
    max_doc: DocId,
    accept_docs: Option<&'a RoaringBitmap>,
    doc: DocId,
    score: f32,
}

impl<'a> MatchAllScorer<'a> {
    pub fn new(max_doc: DocId, accept_docs: Option<&'a RoaringBitmap>, score: f32) -> Self {
        MatchAllScorer {
            max_doc,
            accept_docs,
            doc: -1,
            score,
        }
    }

    fn seek_from(&mut self, mut doc: DocId) -> DocId {
        while doc < self.max_doc {
            let live = match self.accept_docs {
                Some(bits) => bits.contains(doc as u32),
                None => true,
            };
            if live {
                self.doc = doc;
                return doc;
            }
            doc += 1;
        }
        self.doc = NO_MORE_DOCS;
        NO_MORE_DOCS
    }
}

impl DocIdIterator for MatchAllScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        Ok(self.seek_from(self.doc + 1))
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        Ok(self.seek_from(target))
    }
}

impl Scorer for MatchAllScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        Ok(self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitset_iterator_advances() {
        let mut bits = RoaringBitmap::new();
        for d in [2u32, 5, 9] {
            bits.insert(d);
        }
        let mut it = BitSetIterator::new(&bits);
        assert_eq!(it.next_doc().unwrap(), 2);
        assert_eq!(it.advance(6).unwrap(), 9);
        assert_eq!(it.next_doc().unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn match_all_skips_deleted() {
        let mut live = RoaringBitmap::new();
        live.insert(0);
        live.insert(2);
        let mut s = MatchAllScorer::new(3, Some(&live), 1.5);
        assert_eq!(s.next_doc().unwrap(), 0);
        assert_eq!(s.next_doc().unwrap(), 2);
        assert_eq!(s.score().unwrap(), 1.5);
        assert_eq!(s.next_doc().unwrap(), NO_MORE_DOCS);
    }
}
