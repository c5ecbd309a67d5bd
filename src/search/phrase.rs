use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::index::postings::PostingsIter;
use crate::search::scorer::DocIdIterator;

/// Postings cursor for one phrase position. Plain phrases have a single
/// term cursor; multi-phrases union several alternatives, merging their
/// position lists per document.
pub struct PhrasePostings<'a> {
    cursors: Vec<PostingsIter<'a>>,
    /// Query-time position of this slot within the phrase.
    pub offset: u32,
    /// Slot index in query order, the final queue tie-breaker.
    pub ord: usize,
    /// Dictionary ordinals of the terms behind this slot, for repeat
    /// detection across slots.
    pub terms: RoaringBitmap,
    pub positions: Vec<u32>,
    doc: DocId,
    cost: usize,
}

impl<'a> PhrasePostings<'a> {
    pub fn new(
        cursors: Vec<PostingsIter<'a>>,
        offset: u32,
        ord: usize,
        terms: RoaringBitmap,
    ) -> Self {
        let cost = cursors.iter().map(PostingsIter::cost).sum();
        PhrasePostings {
            cursors,
            offset,
            ord,
            terms,
            positions: Vec::new(),
            doc: -1,
            cost,
        }
    }

    pub fn doc_id(&self) -> DocId {
        self.doc
    }

    /// Summed doc freq of the alternatives; proxy for how common the slot is.
    pub fn cost(&self) -> usize {
        self.cost
    }

    pub fn next_doc(&mut self) -> Result<DocId> {
        let current = self.doc;
        let mut min = NO_MORE_DOCS;
        for c in &mut self.cursors {
            if c.doc_id() == current {
                c.next_doc()?;
            }
            min = min.min(c.doc_id());
        }
        self.doc = min;
        Ok(min)
    }

    pub fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let mut min = NO_MORE_DOCS;
        for c in &mut self.cursors {
            if c.doc_id() < target {
                c.advance(target)?;
            }
            min = min.min(c.doc_id());
        }
        self.doc = min;
        Ok(min)
    }

    /// Field norm of the current doc, from any aligned cursor.
    pub fn norm(&self) -> f32 {
        for c in &self.cursors {
            if c.doc_id() == self.doc {
                return c.norm();
            }
        }
        1.0
    }

    /// Merge the aligned cursors' position lists for the current doc.
    /// Alternatives may hit the same position; duplicates are kept.
    pub fn load_positions(&mut self) {
        self.positions.clear();
        for c in &self.cursors {
            if c.doc_id() == self.doc {
                self.positions.extend_from_slice(c.positions());
            }
        }
        self.positions.sort_unstable();
    }

    pub fn freq(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// Leapfrog all slots onto one common doc, lead slot first. Returns
/// NO_MORE_DOCS when any slot runs out.
pub fn advance_to_aligned(pps: &mut [PhrasePostings<'_>], mut doc: DocId) -> Result<DocId> {
    'aligning: loop {
        if doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        for i in 1..pps.len() {
            if pps[i].doc_id() < doc {
                let other = pps[i].advance(doc)?;
                if other > doc {
                    doc = pps[0].advance(other)?;
                    continue 'aligning;
                }
            }
        }
        return Ok(doc);
    }
}
