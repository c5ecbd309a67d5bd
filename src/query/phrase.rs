use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::segment::{SegmentContext, TermContext};
use crate::index::term::Term;
use crate::query::boolean::{BooleanQuery, Occur};
use crate::query::term_query::TermQuery;
use crate::query::Query;
use crate::scoring::explanation::Explanation;
use crate::scoring::similarity::Similarity;
use crate::search::exact_phrase::ExactPhraseScorer;
use crate::search::phrase::PhrasePostings;
use crate::search::scorer::Scorer;
use crate::search::searcher::IndexSearcher;
use crate::search::sloppy_phrase::SloppyPhraseScorer;

/// Terms that must appear near their relative positions in one field.
/// Slop 0 demands exact adjacency at the given offsets.
#[derive(Debug, Clone)]
pub struct PhraseQuery {
    pub field: String,
    terms: Vec<Term>,
    positions: Vec<u32>,
    pub slop: u32,
    pub boost: f32,
}

impl PhraseQuery {
    pub fn new(field: &str) -> Self {
        PhraseQuery {
            field: field.to_string(),
            terms: Vec::new(),
            positions: Vec::new(),
            slop: 0,
            boost: 1.0,
        }
    }

    /// Append a term at the next consecutive position.
    pub fn add_term(&mut self, text: &str) {
        let position = self.positions.last().map(|p| p + 1).unwrap_or(0);
        self.terms.push(Term::new(&self.field, text));
        self.positions.push(position);
    }

    /// Append a term at an explicit position, allowing gaps and stacking.
    pub fn add_term_at(&mut self, text: &str, position: u32) -> Result<()> {
        if let Some(&last) = self.positions.last() {
            if position < last {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("phrase positions must not decrease: {position} after {last}"),
                ));
            }
        }
        self.terms.push(Term::new(&self.field, text));
        self.positions.push(position);
        Ok(())
    }

    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn slots(&self) -> Vec<(u32, Vec<Term>)> {
        self.positions
            .iter()
            .zip(&self.terms)
            .map(|(&p, t)| (p, vec![t.clone()]))
            .collect()
    }

    pub(crate) fn rewrite(&self) -> Option<Query> {
        if self.terms.len() == 1 {
            let tq = TermQuery::new(self.terms[0].clone()).with_boost(self.boost);
            Some(Query::Term(tq))
        } else {
            None
        }
    }
}

/// Phrase where each position accepts any of several alternative terms.
#[derive(Debug, Clone)]
pub struct MultiPhraseQuery {
    pub field: String,
    alternatives: Vec<Vec<Term>>,
    positions: Vec<u32>,
    pub slop: u32,
    pub boost: f32,
}

impl MultiPhraseQuery {
    pub fn new(field: &str) -> Self {
        MultiPhraseQuery {
            field: field.to_string(),
            alternatives: Vec::new(),
            positions: Vec::new(),
            slop: 0,
            boost: 1.0,
        }
    }

    pub fn add(&mut self, texts: &[&str]) -> Result<()> {
        let position = self.positions.last().map(|p| p + 1).unwrap_or(0);
        self.add_at(texts, position)
    }

    pub fn add_at(&mut self, texts: &[&str], position: u32) -> Result<()> {
        if texts.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "a phrase position needs at least one alternative".to_string(),
            ));
        }
        if let Some(&last) = self.positions.last() {
            if position < last {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("phrase positions must not decrease: {position} after {last}"),
                ));
            }
        }
        self.alternatives
            .push(texts.iter().map(|t| Term::new(&self.field, t)).collect());
        self.positions.push(position);
        Ok(())
    }

    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub(crate) fn slots(&self) -> Vec<(u32, Vec<Term>)> {
        self.positions
            .iter()
            .zip(&self.alternatives)
            .map(|(&p, ts)| (p, ts.clone()))
            .collect()
    }

    /// A one-position multi-phrase is a plain term or a disjunction of terms.
    pub(crate) fn rewrite(&self, config: &SearchConfig) -> Result<Option<Query>> {
        if self.alternatives.len() != 1 {
            return Ok(None);
        }
        if self.alternatives[0].len() == 1 {
            let tq = TermQuery::new(self.alternatives[0][0].clone()).with_boost(self.boost);
            return Ok(Some(Query::Term(tq)));
        }
        let mut bq = BooleanQuery::new(config);
        bq.disable_coord = true;
        bq.boost = self.boost;
        for term in &self.alternatives[0] {
            bq.add(Query::Term(TermQuery::new(term.clone())), Occur::Should)?;
        }
        Ok(Some(Query::Boolean(bq)))
    }
}

/// Shared executable form of both phrase flavors: one slot per position,
/// each slot holding one or more alternative terms.
pub struct PhraseWeight {
    field: String,
    slots: Vec<(u32, Vec<Term>)>,
    contexts: Vec<Vec<TermContext>>,
    slop: u32,
    similarity: Arc<dyn Similarity>,
    idf: f32,
    boost: f32,
    query_weight: f32,
    value: f32,
}

impl PhraseWeight {
    pub(crate) fn new(
        searcher: &IndexSearcher,
        field: String,
        slots: Vec<(u32, Vec<Term>)>,
        slop: u32,
        boost: f32,
    ) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "phrase query needs at least one term".to_string(),
            ));
        }
        let similarity = searcher.similarity();
        let max_doc = searcher.reader().max_doc() as u64;
        let mut contexts = Vec::with_capacity(slots.len());
        let mut idf = 0.0;
        for (_, terms) in &slots {
            let mut slot_contexts = Vec::with_capacity(terms.len());
            for term in terms {
                if term.field != field {
                    return Err(Error::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "phrase terms must share one field, found '{}' and '{}'",
                            field, term.field
                        ),
                    ));
                }
                let ctx = TermContext::build(searcher.reader(), term)?;
                idf += similarity.idf(ctx.doc_freq, max_doc);
                slot_contexts.push(ctx);
            }
            contexts.push(slot_contexts);
        }
        let query_weight = idf * boost;
        Ok(PhraseWeight {
            field,
            slots,
            contexts,
            slop,
            similarity,
            idf,
            boost,
            query_weight,
            value: query_weight * idf,
        })
    }

    pub fn value_for_normalization(&self) -> f32 {
        self.query_weight * self.query_weight
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        self.query_weight = self.idf * self.boost * norm * top_boost;
        self.value = self.query_weight * self.idf;
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let Some(field) = ctx.reader.field(&self.field) else {
            return Ok(None);
        };
        if !field.has_positions {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("field '{}' was indexed without positions", self.field),
            ));
        }
        let mut pps = Vec::with_capacity(self.slots.len());
        for (ord, ((position, _), slot_contexts)) in
            self.slots.iter().zip(&self.contexts).enumerate()
        {
            let mut cursors = Vec::new();
            let mut term_ords = RoaringBitmap::new();
            for tc in slot_contexts {
                if let Some(state) = tc.state(ctx.ord) {
                    cursors.push(field.postings_by_ord(state.ord).iter(accept_docs));
                    term_ords.insert(state.ord as u32);
                }
            }
            if cursors.is_empty() {
                // a slot with no alternative in this segment kills the phrase
                return Ok(None);
            }
            pps.push(PhrasePostings::new(cursors, *position, ord, term_ords));
        }
        if self.slop == 0 {
            Ok(Some(Box::new(ExactPhraseScorer::new(
                pps,
                self.similarity.clone(),
                self.value,
            ))))
        } else {
            Ok(Some(Box::new(SloppyPhraseScorer::new(
                pps,
                self.slop,
                self.similarity.clone(),
                self.value,
            ))))
        }
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let Some(mut scorer) = self.scorer(ctx, ctx.reader.live_docs())? else {
            return Ok(Explanation::no_match(format!(
                "phrase absent from segment for doc {doc}"
            )));
        };
        if scorer.advance(doc)? != doc {
            return Ok(Explanation::no_match(format!(
                "phrase does not occur in doc {doc}"
            )));
        }
        let freq = scorer.freq();
        let score = scorer.score()?;
        Ok(Explanation::matched(
            score,
            format!("phrase(field={}, slop={}) in {doc}", self.field, self.slop),
        )
        .with_detail(Explanation::matched(freq as f32, "phrase frequency".to_string()))
        .with_detail(Explanation::matched(self.idf, "summed idf".to_string())))
    }
}
