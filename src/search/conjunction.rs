use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::search::scorer::{DocIdIterator, Scorer};
use crate::search::term_scorer::TermScorer;

/// Intersection of arbitrary sub-scorers. Advances every cursor to the
/// current maximum doc id, round after round, until all agree.
pub struct ConjunctionScorer<'a> {
    scorers: Vec<Box<dyn Scorer + 'a>>,
    coord: f32,
    doc: DocId,
}

impl<'a> ConjunctionScorer<'a> {
    pub fn new(mut scorers: Vec<Box<dyn Scorer + 'a>>, coord: f32) -> Result<Self> {
        // Position everyone on their first doc up front so alignment only
        // ever uses advance.
        for s in &mut scorers {
            s.next_doc()?;
        }
        Ok(ConjunctionScorer {
            scorers,
            coord,
            doc: -1,
        })
    }

    fn align(&mut self) -> Result<DocId> {
        loop {
            let mut max = -1;
            for s in &self.scorers {
                max = max.max(s.doc_id());
            }
            if max == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            let mut agreed = true;
            for s in &mut self.scorers {
                if s.doc_id() < max {
                    s.advance(max)?;
                    agreed = false;
                }
            }
            if agreed {
                self.doc = max;
                return Ok(max);
            }
        }
    }
}

impl DocIdIterator for ConjunctionScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        if self.doc >= 0 {
            self.scorers[0].next_doc()?;
        }
        self.align()
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        self.scorers[0].advance(target)?;
        self.align()
    }
}

impl Scorer for ConjunctionScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        let mut sum = 0.0;
        for s in &mut self.scorers {
            sum += s.score()?;
        }
        Ok(sum * self.coord)
    }

    fn freq(&self) -> u32 {
        self.scorers.len() as u32
    }
}

/// Fast path for booleans whose clauses are all required terms: leapfrog
/// intersection led by the rarest term.
pub struct ConjunctionTermScorer<'a> {
    terms: Vec<TermScorer<'a>>, // sorted by cost ascending, lead first
    coord: f32,
    doc: DocId,
}

impl<'a> ConjunctionTermScorer<'a> {
    pub fn new(mut terms: Vec<TermScorer<'a>>, coord: f32) -> Self {
        terms.sort_by_key(TermScorer::cost);
        ConjunctionTermScorer {
            terms,
            coord,
            doc: -1,
        }
    }

    fn do_next(&mut self, mut doc: DocId) -> Result<DocId> {
        'aligning: loop {
            if doc == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            for i in 1..self.terms.len() {
                if self.terms[i].doc_id() < doc {
                    let other = self.terms[i].advance(doc)?;
                    if other > doc {
                        doc = self.terms[0].advance(other)?;
                        continue 'aligning;
                    }
                }
            }
            self.doc = doc;
            return Ok(doc);
        }
    }
}

impl DocIdIterator for ConjunctionTermScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        let doc = self.terms[0].next_doc()?;
        self.do_next(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let doc = self.terms[0].advance(target)?;
        self.do_next(doc)
    }
}

impl Scorer for ConjunctionTermScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        let mut sum = 0.0;
        for t in &mut self.terms {
            sum += t.score()?;
        }
        Ok(sum * self.coord)
    }

    fn freq(&self) -> u32 {
        self.terms.len() as u32
    }
}
