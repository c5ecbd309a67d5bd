use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::segment::{IndexReader, SegmentContext};
use crate::query::{Query, Weight};
use crate::scoring::explanation::Explanation;
use crate::scoring::similarity::Similarity;
use crate::search::boolean_scorer::{BooleanScorer, BooleanScorer2};
use crate::search::conjunction::{ConjunctionScorer, ConjunctionTermScorer};
use crate::search::disjunction::DisjunctionSumScorer;
use crate::search::scorer::Scorer;
use crate::search::searcher::IndexSearcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// Clause must match and contributes to the score.
    Must,
    /// Clause may match; matching raises the score.
    Should,
    /// Clause must not match and never contributes to the score.
    MustNot,
}

#[derive(Debug, Clone)]
pub struct BooleanClause {
    pub query: Query,
    pub occur: Occur,
}

/// Combination of sub-queries under MUST / SHOULD / MUST_NOT semantics with
/// an optional minimum count of matching SHOULD clauses.
#[derive(Debug, Clone)]
pub struct BooleanQuery {
    pub clauses: Vec<BooleanClause>,
    pub disable_coord: bool,
    pub min_should_match: u32,
    pub boost: f32,
    max_clause_count: usize,
}

impl BooleanQuery {
    pub fn new(config: &SearchConfig) -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            disable_coord: false,
            min_should_match: 0,
            boost: 1.0,
            max_clause_count: config.max_clause_count,
        }
    }

    pub fn add(&mut self, query: Query, occur: Occur) -> Result<()> {
        if self.clauses.len() >= self.max_clause_count {
            return Err(Error::new(
                ErrorKind::TooManyClauses,
                format!("boolean query exceeds {} clauses", self.max_clause_count),
            ));
        }
        self.clauses.push(BooleanClause { query, occur });
        Ok(())
    }

    pub fn set_min_should_match(&mut self, min: u32) {
        self.min_should_match = min;
    }

    pub(crate) fn rewrite(
        &self,
        reader: &IndexReader,
        config: &SearchConfig,
    ) -> Result<Option<Query>> {
        // One non-prohibited clause carrying no matcher minimum collapses
        // into the clause itself, boosts multiplied through.
        if self.min_should_match == 0
            && self.clauses.len() == 1
            && self.clauses[0].occur != Occur::MustNot
        {
            let mut inner = self.clauses[0].query.clone();
            if self.boost != 1.0 {
                let b = inner.boost();
                inner.set_boost(b * self.boost);
            }
            return Ok(Some(inner));
        }

        let mut changed = false;
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            match clause.query.rewrite(reader, config)? {
                Some(rewritten) => {
                    changed = true;
                    clauses.push(BooleanClause {
                        query: rewritten,
                        occur: clause.occur,
                    });
                }
                None => clauses.push(clause.clone()),
            }
        }
        if changed {
            Ok(Some(Query::Boolean(BooleanQuery {
                clauses,
                disable_coord: self.disable_coord,
                min_should_match: self.min_should_match,
                boost: self.boost,
                max_clause_count: self.max_clause_count,
            })))
        } else {
            Ok(None)
        }
    }
}

pub struct BooleanWeight {
    weights: Vec<(Occur, Weight)>,
    similarity: Arc<dyn Similarity>,
    boost: f32,
    disable_coord: bool,
    min_should_match: u32,
    max_coord: u32,
}

impl BooleanWeight {
    pub(crate) fn new(searcher: &IndexSearcher, query: &BooleanQuery) -> Result<Self> {
        let mut weights = Vec::with_capacity(query.clauses.len());
        let mut max_coord = 0u32;
        for clause in &query.clauses {
            if clause.occur != Occur::MustNot {
                max_coord += 1;
            }
            weights.push((clause.occur, clause.query.create_weight(searcher)?));
        }
        Ok(BooleanWeight {
            weights,
            similarity: searcher.similarity(),
            boost: query.boost,
            disable_coord: query.disable_coord,
            min_should_match: query.min_should_match,
            max_coord,
        })
    }

    fn coord(&self, overlap: u32, max_overlap: u32) -> f32 {
        if self.disable_coord {
            1.0
        } else {
            self.similarity.coord(overlap, max_overlap)
        }
    }

    /// Coordination factor per matched clause count, precomputed so scorers
    /// index instead of calling back.
    fn coords(&self) -> Vec<f32> {
        (0..=self.max_coord)
            .map(|i| self.coord(i, self.max_coord))
            .collect()
    }

    pub fn value_for_normalization(&self) -> f32 {
        let mut sum = 0.0;
        for (occur, w) in &self.weights {
            if *occur != Occur::MustNot {
                sum += w.value_for_normalization();
            }
        }
        sum * self.boost * self.boost
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        let top = top_boost * self.boost;
        for (_, w) in &mut self.weights {
            w.normalize(norm, top);
        }
    }

    /// Out-of-order bucket scoring is valid only without required clauses
    /// and without a matcher minimum above one.
    pub fn scores_out_of_order(&self) -> bool {
        if self.min_should_match > 1 {
            return false;
        }
        !self.weights.iter().any(|(o, _)| *o == Occur::Must)
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        in_order: bool,
        top_scorer: bool,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        // Conjunction of plain terms gets the dedicated leapfrog scorer.
        let all_must_terms = !self.weights.is_empty()
            && self
                .weights
                .iter()
                .all(|(o, w)| *o == Occur::Must && matches!(w, Weight::Term(_)));
        if all_must_terms && self.min_should_match == 0 {
            let mut terms = Vec::with_capacity(self.weights.len());
            for (_, w) in &self.weights {
                let Weight::Term(tw) = w else { continue };
                match tw.term_scorer(ctx, accept_docs)? {
                    Some(ts) => terms.push(ts),
                    None => return Ok(None),
                }
            }
            let coord = self.coord(terms.len() as u32, self.max_coord);
            return Ok(Some(Box::new(ConjunctionTermScorer::new(terms, coord))));
        }

        let mut required: Vec<Box<dyn Scorer + 'a>> = Vec::new();
        let mut optional: Vec<Box<dyn Scorer + 'a>> = Vec::new();
        let mut prohibited: Vec<Box<dyn Scorer + 'a>> = Vec::new();
        for (occur, w) in &self.weights {
            let sub = w.scorer(ctx, true, false, accept_docs)?;
            match (occur, sub) {
                (Occur::Must, Some(s)) => required.push(s),
                (Occur::Must, None) => return Ok(None),
                (Occur::Should, Some(s)) => optional.push(s),
                (Occur::MustNot, Some(s)) => prohibited.push(s),
                (_, None) => {}
            }
        }
        if required.is_empty() && optional.is_empty() {
            return Ok(None);
        }
        if (optional.len() as u32) < self.min_should_match {
            return Ok(None);
        }

        let coords = self.coords();
        if !in_order && top_scorer && required.is_empty() {
            return Ok(Some(Box::new(BooleanScorer::new(
                optional,
                prohibited,
                self.min_should_match,
                coords,
            ))));
        }

        let required_count = required.len() as u32;
        let required_scorer = match required.len() {
            0 => None,
            1 => required.pop(),
            _ => Some(Box::new(ConjunctionScorer::new(required, 1.0)?) as Box<dyn Scorer + 'a>),
        };
        let excluded = match prohibited.len() {
            0 => None,
            1 => prohibited.pop(),
            _ => Some(Box::new(DisjunctionSumScorer::new(prohibited, 1)) as Box<dyn Scorer + 'a>),
        };
        Ok(Some(Box::new(BooleanScorer2::new(
            required_scorer,
            required_count,
            optional,
            self.min_should_match,
            excluded,
            coords,
        ))))
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let mut sum = 0.0;
        let mut overlap = 0u32;
        let mut should_matched = 0u32;
        let mut details = Vec::new();
        for (occur, w) in &self.weights {
            let e = w.explain(ctx, doc)?;
            match occur {
                Occur::MustNot => {
                    if e.matched {
                        return Ok(Explanation::no_match(format!(
                            "doc {doc} matches a prohibited clause"
                        )));
                    }
                }
                Occur::Must => {
                    if !e.matched {
                        return Ok(Explanation::no_match(format!(
                            "doc {doc} misses a required clause"
                        )));
                    }
                    sum += e.value;
                    overlap += 1;
                    details.push(e);
                }
                Occur::Should => {
                    if e.matched {
                        sum += e.value;
                        overlap += 1;
                        should_matched += 1;
                        details.push(e);
                    }
                }
            }
        }
        if overlap == 0 {
            return Ok(Explanation::no_match(format!("no clause matches doc {doc}")));
        }
        if should_matched < self.min_should_match {
            return Ok(Explanation::no_match(format!(
                "only {should_matched} of the required {} optional clauses match",
                self.min_should_match
            )));
        }
        let coord = self.coord(overlap, self.max_coord);
        let mut e = Explanation::matched(
            sum * coord,
            format!("sum of clause scores, coord({overlap}/{})", self.max_coord),
        );
        for d in details {
            e = e.with_detail(d);
        }
        Ok(e)
    }
}
