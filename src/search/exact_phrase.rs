use std::sync::Arc;

use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::scoring::similarity::Similarity;
use crate::search::phrase::PhrasePostings;
use crate::search::scorer::{DocIdIterator, Scorer};

const CHUNK: i64 = 4096;

/// Matches documents where the phrase terms appear at exactly their query
/// offsets. Slots are ordered rarest first; position counting runs in 4096
/// wide chunks over a counter array reset by generation stamps.
pub struct ExactPhraseScorer<'a> {
    pps: Vec<PhrasePostings<'a>>,
    // Slots much more common than the lead are cheaper to advance() than to
    // step doc by doc.
    use_advance: Vec<bool>,
    counts: Vec<u32>,
    gens: Vec<u32>,
    generation: u32,
    doc: DocId,
    freq: u32,
    similarity: Arc<dyn Similarity>,
    value: f32,
}

impl<'a> ExactPhraseScorer<'a> {
    pub fn new(
        mut pps: Vec<PhrasePostings<'a>>,
        similarity: Arc<dyn Similarity>,
        value: f32,
    ) -> Self {
        pps.sort_by_key(PhrasePostings::cost);
        let lead_cost = pps.first().map(PhrasePostings::cost).unwrap_or(0);
        let use_advance = pps.iter().map(|pp| pp.cost() > 5 * lead_cost).collect();
        ExactPhraseScorer {
            pps,
            use_advance,
            counts: vec![0; CHUNK as usize],
            gens: vec![0; CHUNK as usize],
            generation: 0,
            doc: -1,
            freq: 0,
            similarity,
            value,
        }
    }

    fn align(&mut self, mut doc: DocId) -> Result<DocId> {
        'aligning: loop {
            if doc == NO_MORE_DOCS {
                return Ok(NO_MORE_DOCS);
            }
            for i in 1..self.pps.len() {
                if self.pps[i].doc_id() < doc {
                    let other = if self.use_advance[i] {
                        self.pps[i].advance(doc)?
                    } else {
                        let mut d = self.pps[i].doc_id();
                        while d < doc {
                            d = self.pps[i].next_doc()?;
                        }
                        d
                    };
                    if other > doc {
                        doc = self.pps[0].advance(other)?;
                        continue 'aligning;
                    }
                }
            }
            return Ok(doc);
        }
    }

    fn next_match(&mut self, mut doc: DocId) -> Result<DocId> {
        loop {
            doc = self.align(doc)?;
            if doc == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            let freq = self.phrase_freq();
            if freq > 0 {
                self.doc = doc;
                self.freq = freq;
                return Ok(doc);
            }
            doc = self.pps[0].next_doc()?;
        }
    }

    /// Count positions where every slot lines up at the same phrase start
    /// (token position minus slot offset).
    fn phrase_freq(&mut self) -> u32 {
        for pp in &mut self.pps {
            pp.load_positions();
        }
        let n = self.pps.len();
        if n == 1 {
            return self.pps[0].positions.len() as u32;
        }
        let mut idxs = vec![0usize; n];
        let mut freq = 0u32;

        while idxs[0] < self.pps[0].positions.len() {
            // Chunk containing the lead's next phrase start; starts can be
            // negative when a token position is below the slot offset.
            let lead = &self.pps[0];
            let lead_start = lead.positions[idxs[0]] as i64 - lead.offset as i64;
            let base = lead_start.div_euclid(CHUNK) * CHUNK;
            let end = base + CHUNK;
            self.generation += 1;
            let generation = self.generation;

            {
                let lead = &self.pps[0];
                while idxs[0] < lead.positions.len() {
                    let p = lead.positions[idxs[0]] as i64 - lead.offset as i64;
                    if p >= end {
                        break;
                    }
                    let slot = (p - base) as usize;
                    self.gens[slot] = generation;
                    self.counts[slot] = 1;
                    idxs[0] += 1;
                }
            }

            for t in 1..n {
                let pp = &self.pps[t];
                while idxs[t] < pp.positions.len() {
                    let p = pp.positions[idxs[t]] as i64 - pp.offset as i64;
                    if p >= end {
                        break;
                    }
                    if p >= base {
                        let slot = (p - base) as usize;
                        if self.gens[slot] == generation && self.counts[slot] == t as u32 {
                            self.counts[slot] += 1;
                            if t == n - 1 {
                                freq += 1;
                            }
                        }
                    }
                    idxs[t] += 1;
                }
            }
        }
        freq
    }
}

impl DocIdIterator for ExactPhraseScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        let doc = self.pps[0].next_doc()?;
        self.next_match(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let doc = self.pps[0].advance(target)?;
        self.next_match(doc)
    }
}

impl Scorer for ExactPhraseScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        let norm = self.pps[0].norm();
        Ok(self.similarity.score(self.freq as f32, self.value, norm))
    }

    fn freq(&self) -> u32 {
        self.freq
    }
}
