use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::search::collector::Collector;
use crate::search::disjunction::DisjunctionSumScorer;
use crate::search::scorer::{DocIdIterator, Scorer};

/// General boolean combination: a required conjunction drives iteration,
/// prohibited docs are skipped, optional clauses add score (and must reach
/// `min_should_match` when set). Coordination is applied here, never in the
/// sub-scorers.
pub struct BooleanScorer2<'a> {
    required: Option<Box<dyn Scorer + 'a>>,
    required_count: u32,
    optional: Option<DisjunctionSumScorer<'a>>,
    min_should_match: u32,
    excluded: Option<Box<dyn Scorer + 'a>>,
    coords: Vec<f32>, // indexed by total matched clause count
    doc: DocId,
}

impl<'a> BooleanScorer2<'a> {
    pub fn new(
        required: Option<Box<dyn Scorer + 'a>>,
        required_count: u32,
        optional: Vec<Box<dyn Scorer + 'a>>,
        min_should_match: u32,
        excluded: Option<Box<dyn Scorer + 'a>>,
        coords: Vec<f32>,
    ) -> Self {
        let optional = if optional.is_empty() {
            None
        } else {
            // Without required clauses at least one optional must match.
            Some(DisjunctionSumScorer::new(
                optional,
                min_should_match.max(1) as usize,
            ))
        };
        BooleanScorer2 {
            required,
            required_count,
            optional,
            min_should_match,
            excluded,
            coords,
            doc: -1,
        }
    }

    fn excluded_matches(&mut self, doc: DocId) -> Result<bool> {
        match &mut self.excluded {
            Some(exc) => Ok(exc.advance(doc)? == doc),
            None => Ok(false),
        }
    }

    /// With required clauses present, optional matching is demanded only
    /// when min_should_match asks for it.
    fn accept_with_required(&mut self, doc: DocId) -> Result<bool> {
        if self.excluded_matches(doc)? {
            return Ok(false);
        }
        if self.min_should_match > 0 {
            match &mut self.optional {
                Some(opt) => {
                    if opt.advance(doc)? != doc {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn next_from(&mut self, mut doc: DocId) -> Result<DocId> {
        if self.required.is_some() {
            loop {
                if doc == NO_MORE_DOCS {
                    self.doc = NO_MORE_DOCS;
                    return Ok(NO_MORE_DOCS);
                }
                if self.accept_with_required(doc)? {
                    self.doc = doc;
                    return Ok(doc);
                }
                doc = self
                    .required
                    .as_mut()
                    .map(|r| r.next_doc())
                    .transpose()?
                    .unwrap_or(NO_MORE_DOCS);
            }
        }
        // Optional-only mode: the disjunction already enforces the matcher
        // minimum, only prohibited docs need filtering.
        loop {
            if doc == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            if !self.excluded_matches(doc)? {
                self.doc = doc;
                return Ok(doc);
            }
            doc = match &mut self.optional {
                Some(opt) => opt.next_doc()?,
                None => NO_MORE_DOCS,
            };
        }
    }
}

impl DocIdIterator for BooleanScorer2<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        let doc = if let Some(req) = &mut self.required {
            req.next_doc()?
        } else {
            match &mut self.optional {
                Some(opt) => opt.next_doc()?,
                None => NO_MORE_DOCS,
            }
        };
        self.next_from(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let doc = if let Some(req) = &mut self.required {
            req.advance(target)?
        } else {
            match &mut self.optional {
                Some(opt) => opt.advance(target)?,
                None => NO_MORE_DOCS,
            }
        };
        self.next_from(doc)
    }
}

impl Scorer for BooleanScorer2<'_> {
    fn score(&mut self) -> Result<f32> {
        let doc = self.doc;
        let mut matched = if self.required.is_some() {
            self.required_count
        } else {
            0
        };
        let mut score = 0.0;
        if let Some(req) = &mut self.required {
            score += req.score()?;
        }
        if let Some(opt) = &mut self.optional {
            // Pull the optionals up to the current doc lazily; they only
            // contribute when aligned.
            if opt.advance(doc)? == doc {
                score += opt.score()?;
                matched += opt.nr_matchers();
            }
        }
        Ok(score * self.coords[matched as usize])
    }

    fn freq(&self) -> u32 {
        let mut matched = if self.required.is_some() {
            self.required_count
        } else {
            0
        };
        if let Some(opt) = &self.optional {
            if opt.doc_id() == self.doc {
                matched += opt.nr_matchers();
            }
        }
        matched
    }
}

const BUCKET_SIZE: usize = 2048;

/// Bucket-table disjunction used as the top-level scorer when a boolean has
/// no required clauses: sub-scorer hits are accumulated into 2048-doc
/// buckets and flushed straight into the collector. Cannot be stepped
/// doc-by-doc, so `next_doc`/`advance`/`score` refuse.
pub struct BooleanScorer<'a> {
    optional: Vec<Box<dyn Scorer + 'a>>,
    prohibited: Vec<Box<dyn Scorer + 'a>>,
    min_should_match: u32,
    coords: Vec<f32>,
}

impl<'a> BooleanScorer<'a> {
    pub fn new(
        optional: Vec<Box<dyn Scorer + 'a>>,
        prohibited: Vec<Box<dyn Scorer + 'a>>,
        min_should_match: u32,
        coords: Vec<f32>,
    ) -> Self {
        BooleanScorer {
            optional,
            prohibited,
            min_should_match,
            coords,
        }
    }

    fn unsupported<T>() -> Result<T> {
        Err(Error::new(
            ErrorKind::UnsupportedOperation,
            "bucketed boolean scorer only supports collector-driven scoring".to_string(),
        ))
    }
}

impl DocIdIterator for BooleanScorer<'_> {
    fn doc_id(&self) -> DocId {
        -1
    }

    fn next_doc(&mut self) -> Result<DocId> {
        Self::unsupported()
    }

    fn advance(&mut self, _target: DocId) -> Result<DocId> {
        Self::unsupported()
    }
}

impl Scorer for BooleanScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        Self::unsupported()
    }

    fn score_all(&mut self, collector: &mut dyn Collector, doc_base: DocId) -> Result<()> {
        let mut scores = vec![0f32; BUCKET_SIZE];
        let mut counts = vec![0u32; BUCKET_SIZE];
        let mut valid_gen = vec![0u32; BUCKET_SIZE];
        let mut prohibited_gen = vec![0u32; BUCKET_SIZE];
        let mut generation: u32 = 0;

        for s in &mut self.optional {
            s.next_doc()?;
        }
        self.optional.retain(|s| s.doc_id() != NO_MORE_DOCS);
        let needed = self.min_should_match.max(1);

        loop {
            let mut min_doc = NO_MORE_DOCS;
            for s in &self.optional {
                min_doc = min_doc.min(s.doc_id());
            }
            if min_doc == NO_MORE_DOCS {
                return Ok(());
            }
            generation += 1;
            let bucket_start = min_doc - (min_doc % BUCKET_SIZE as DocId);
            let bucket_end = bucket_start + BUCKET_SIZE as DocId;

            for s in &mut self.optional {
                while s.doc_id() < bucket_end {
                    let idx = (s.doc_id() - bucket_start) as usize;
                    let contribution = s.score()?;
                    if valid_gen[idx] != generation {
                        valid_gen[idx] = generation;
                        scores[idx] = contribution;
                        counts[idx] = 1;
                    } else {
                        scores[idx] += contribution;
                        counts[idx] += 1;
                    }
                    if s.next_doc()? == NO_MORE_DOCS {
                        break;
                    }
                }
            }
            self.optional.retain(|s| s.doc_id() != NO_MORE_DOCS);

            for p in &mut self.prohibited {
                let mut d = p.doc_id();
                if d < bucket_start {
                    d = p.advance(bucket_start)?;
                }
                while d < bucket_end {
                    prohibited_gen[(d - bucket_start) as usize] = generation;
                    d = p.next_doc()?;
                }
            }

            for idx in 0..BUCKET_SIZE {
                if valid_gen[idx] == generation
                    && prohibited_gen[idx] != generation
                    && counts[idx] >= needed
                {
                    let doc = bucket_start + idx as DocId;
                    collector.collect(
                        doc_base + doc,
                        scores[idx] * self.coords[counts[idx] as usize],
                    );
                }
            }
        }
    }
}
