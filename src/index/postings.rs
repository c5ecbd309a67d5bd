use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::search::scorer::DocIdIterator;

#[derive(Debug, Clone)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
    pub positions: Vec<u32>, // Token positions for phrase queries
    pub field_norm: f32,     // Length normalization factor
}

/// Posting list for a term.
/// Note: Sorted by doc_id for efficient merging
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>, // Sorted by doc_id
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        // Keep sorted by doc_id for efficient merging
        match self
            .postings
            .binary_search_by_key(&posting.doc_id, |p| p.doc_id)
        {
            Ok(pos) => {
                self.postings[pos] = posting;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }

    pub fn iter<'a>(&'a self, accept_docs: Option<&'a RoaringBitmap>) -> PostingsIter<'a> {
        PostingsIter::new(&self.postings, accept_docs)
    }
}

/// Cursor over one posting list. Starts unpositioned at doc -1 and only moves
/// forward; deleted documents are skipped through `accept_docs`.
pub struct PostingsIter<'a> {
    postings: &'a [Posting],
    accept_docs: Option<&'a RoaringBitmap>,
    cur: usize,  // index of the current posting, valid when doc >= 0
    next: usize, // next candidate index
    doc: DocId,
}

impl<'a> PostingsIter<'a> {
    pub fn new(postings: &'a [Posting], accept_docs: Option<&'a RoaringBitmap>) -> Self {
        PostingsIter {
            postings,
            accept_docs,
            cur: 0,
            next: 0,
            doc: -1,
        }
    }

    pub fn freq(&self) -> u32 {
        self.postings[self.cur].term_freq
    }

    pub fn norm(&self) -> f32 {
        self.postings[self.cur].field_norm
    }

    pub fn positions(&self) -> &'a [u32] {
        &self.postings[self.cur].positions
    }

    /// Upper bound on the number of docs this cursor can produce.
    pub fn cost(&self) -> usize {
        self.postings.len()
    }

    fn accepted(&self, doc: DocId) -> bool {
        match self.accept_docs {
            Some(bits) => bits.contains(doc as u32),
            None => true,
        }
    }
}

impl DocIdIterator for PostingsIter<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        while self.next < self.postings.len() {
            let idx = self.next;
            self.next += 1;
            let doc = self.postings[idx].doc_id;
            if self.accepted(doc) {
                self.cur = idx;
                self.doc = doc;
                return Ok(doc);
            }
        }
        self.doc = NO_MORE_DOCS;
        Ok(NO_MORE_DOCS)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        // Skip ahead with a binary search over the remaining postings.
        let off = self.postings[self.next..].partition_point(|p| p.doc_id < target);
        self.next += off;
        self.next_doc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc: DocId) -> Posting {
        Posting {
            doc_id: doc,
            term_freq: 1,
            positions: vec![0],
            field_norm: 1.0,
        }
    }

    fn list(docs: &[DocId]) -> PostingList {
        let mut pl = PostingList::new();
        for &d in docs {
            pl.add_posting(posting(d));
        }
        pl
    }

    #[test]
    fn iterates_in_doc_order() {
        let pl = list(&[5, 1, 9, 3]);
        let mut it = pl.iter(None);
        let mut seen = Vec::new();
        while it.next_doc().unwrap() != NO_MORE_DOCS {
            seen.push(it.doc_id());
        }
        assert_eq!(seen, vec![1, 3, 5, 9]);
        // Exhausted cursors stay exhausted.
        assert_eq!(it.next_doc().unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn advance_lands_on_first_doc_at_or_after_target() {
        let pl = list(&[2, 4, 8, 16]);
        let mut it = pl.iter(None);
        assert_eq!(it.advance(5).unwrap(), 8);
        // target at or before the current doc does not move the cursor
        assert_eq!(it.advance(8).unwrap(), 8);
        assert_eq!(it.advance(3).unwrap(), 8);
        assert_eq!(it.advance(17).unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn accept_docs_filters_deleted() {
        let pl = list(&[1, 2, 3]);
        let mut live = RoaringBitmap::new();
        live.insert(1);
        live.insert(3);
        let mut it = pl.iter(Some(&live));
        assert_eq!(it.next_doc().unwrap(), 1);
        assert_eq!(it.next_doc().unwrap(), 3);
        assert_eq!(it.next_doc().unwrap(), NO_MORE_DOCS);
    }
}
