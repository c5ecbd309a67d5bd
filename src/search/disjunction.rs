use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::search::scorer::{DocIdIterator, Scorer};

// Binary min-heap over the sub-scorers' current doc ids, kept directly in
// the vec (children of i at 2i+1 and 2i+2). Exhausted scorers are removed,
// so every entry is positioned on a real doc.

fn heap_adjust(sub: &mut [Box<dyn Scorer + '_>], mut root: usize) {
    loop {
        let left = 2 * root + 1;
        let right = left + 1;
        let mut smallest = root;
        if left < sub.len() && sub[left].doc_id() < sub[smallest].doc_id() {
            smallest = left;
        }
        if right < sub.len() && sub[right].doc_id() < sub[smallest].doc_id() {
            smallest = right;
        }
        if smallest == root {
            return;
        }
        sub.swap(root, smallest);
        root = smallest;
    }
}

fn heapify(sub: &mut [Box<dyn Scorer + '_>]) {
    for i in (0..sub.len() / 2).rev() {
        heap_adjust(sub, i);
    }
}

fn heap_remove_root(sub: &mut Vec<Box<dyn Scorer + '_>>) {
    sub.swap_remove(0);
    if !sub.is_empty() {
        heap_adjust(sub, 0);
    }
}

/// Union of sub-scorers requiring at least `min_matchers` of them on the
/// current doc. Score and matcher count are recomputed on every call by
/// walking the heap subtree whose roots share the current doc.
pub struct DisjunctionSumScorer<'a> {
    sub: Vec<Box<dyn Scorer + 'a>>,
    min_matchers: usize,
    doc: DocId,
}

impl<'a> DisjunctionSumScorer<'a> {
    pub fn new(mut sub: Vec<Box<dyn Scorer + 'a>>, min_matchers: usize) -> Self {
        // All cursors start unpositioned at -1, which is a valid heap.
        heapify(&mut sub);
        DisjunctionSumScorer {
            sub,
            min_matchers: min_matchers.max(1),
            doc: -1,
        }
    }

    /// How many sub-scorers sit on the current doc.
    pub fn nr_matchers(&self) -> u32 {
        self.count_matching(0)
    }

    fn count_matching(&self, root: usize) -> u32 {
        if root >= self.sub.len() || self.sub[root].doc_id() != self.doc {
            return 0;
        }
        1 + self.count_matching(2 * root + 1) + self.count_matching(2 * root + 2)
    }

    fn sum_matching(&mut self, root: usize) -> Result<f32> {
        if root >= self.sub.len() || self.sub[root].doc_id() != self.doc {
            return Ok(0.0);
        }
        let mut sum = self.sub[root].score()?;
        sum += self.sum_matching(2 * root + 1)?;
        sum += self.sum_matching(2 * root + 2)?;
        Ok(sum)
    }

    fn advance_all_on(&mut self, doc: DocId) -> Result<()> {
        while !self.sub.is_empty() && self.sub[0].doc_id() == doc {
            if self.sub[0].next_doc()? == NO_MORE_DOCS {
                heap_remove_root(&mut self.sub);
            } else {
                heap_adjust(&mut self.sub, 0);
            }
        }
        Ok(())
    }

    fn find_match(&mut self) -> Result<DocId> {
        loop {
            if self.sub.is_empty() {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            self.doc = self.sub[0].doc_id();
            if self.count_matching(0) as usize >= self.min_matchers {
                return Ok(self.doc);
            }
            self.advance_all_on(self.doc)?;
        }
    }
}

impl DocIdIterator for DisjunctionSumScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        self.advance_all_on(self.doc)?;
        self.find_match()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        while !self.sub.is_empty() && self.sub[0].doc_id() < target {
            if self.sub[0].advance(target)? == NO_MORE_DOCS {
                heap_remove_root(&mut self.sub);
            } else {
                heap_adjust(&mut self.sub, 0);
            }
        }
        self.find_match()
    }
}

impl Scorer for DisjunctionSumScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        self.sum_matching(0)
    }

    fn freq(&self) -> u32 {
        self.nr_matchers()
    }
}

/// Takes the maximum sub-score per doc, with `tie_breaker` times the sum of
/// the remaining matching sub-scores added on top.
pub struct DisjunctionMaxScorer<'a> {
    sub: Vec<Box<dyn Scorer + 'a>>,
    tie_breaker: f32,
    doc: DocId,
}

impl<'a> DisjunctionMaxScorer<'a> {
    pub fn new(mut sub: Vec<Box<dyn Scorer + 'a>>, tie_breaker: f32) -> Self {
        heapify(&mut sub);
        DisjunctionMaxScorer {
            sub,
            tie_breaker,
            doc: -1,
        }
    }

    fn max_and_sum(&mut self, root: usize) -> Result<(f32, f32)> {
        if root >= self.sub.len() || self.sub[root].doc_id() != self.doc {
            return Ok((0.0, 0.0));
        }
        let score = self.sub[root].score()?;
        let (lmax, lsum) = self.max_and_sum(2 * root + 1)?;
        let (rmax, rsum) = self.max_and_sum(2 * root + 2)?;
        Ok((score.max(lmax).max(rmax), score + lsum + rsum))
    }

    fn count_matching(&self, root: usize) -> u32 {
        if root >= self.sub.len() || self.sub[root].doc_id() != self.doc {
            return 0;
        }
        1 + self.count_matching(2 * root + 1) + self.count_matching(2 * root + 2)
    }
}

impl DocIdIterator for DisjunctionMaxScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        while !self.sub.is_empty() && self.sub[0].doc_id() == self.doc {
            if self.sub[0].next_doc()? == NO_MORE_DOCS {
                heap_remove_root(&mut self.sub);
            } else {
                heap_adjust(&mut self.sub, 0);
            }
        }
        self.doc = match self.sub.first() {
            Some(s) => s.doc_id(),
            None => NO_MORE_DOCS,
        };
        Ok(self.doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        while !self.sub.is_empty() && self.sub[0].doc_id() < target {
            if self.sub[0].advance(target)? == NO_MORE_DOCS {
                heap_remove_root(&mut self.sub);
            } else {
                heap_adjust(&mut self.sub, 0);
            }
        }
        self.doc = match self.sub.first() {
            Some(s) => s.doc_id(),
            None => NO_MORE_DOCS,
        };
        Ok(self.doc)
    }
}

impl Scorer for DisjunctionMaxScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        let (max, sum) = self.max_and_sum(0)?;
        Ok(max + self.tie_breaker * (sum - max))
    }

    fn freq(&self) -> u32 {
        self.count_matching(0)
    }
}
