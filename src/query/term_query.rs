use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::segment::{SegmentContext, TermContext};
use crate::index::term::Term;
use crate::scoring::explanation::Explanation;
use crate::scoring::similarity::Similarity;
use crate::search::scorer::{DocIdIterator, Scorer};
use crate::search::searcher::IndexSearcher;
use crate::search::term_scorer::TermScorer;

/// Matches documents containing a single term.
#[derive(Debug, Clone)]
pub struct TermQuery {
    pub term: Term,
    pub boost: f32,
}

impl TermQuery {
    pub fn new(term: Term) -> Self {
        TermQuery { term, boost: 1.0 }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// Executable form of a term query: term statistics resolved once against
/// the whole reader, idf and normalization folded into a single per-hit
/// multiplier.
pub struct TermWeight {
    term: Term,
    similarity: Arc<dyn Similarity>,
    context: TermContext,
    idf: f32,
    boost: f32,
    query_weight: f32,
    value: f32,
}

impl TermWeight {
    pub(crate) fn new(searcher: &IndexSearcher, query: &TermQuery) -> Result<Self> {
        let context = TermContext::build(searcher.reader(), &query.term)?;
        let similarity = searcher.similarity();
        let idf = similarity.idf(context.doc_freq, searcher.reader().max_doc() as u64);
        let query_weight = idf * query.boost;
        Ok(TermWeight {
            term: query.term.clone(),
            similarity,
            context,
            idf,
            boost: query.boost,
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

    /// Concrete scorer, exposed so boolean conjunctions of terms can skip
    /// dynamic dispatch.
    pub(crate) fn term_scorer<'a>(
        &self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<TermScorer<'a>>> {
        let Some(state) = self.context.state(ctx.ord) else {
            return Ok(None);
        };
        let Some(field) = ctx.reader.field(&self.term.field) else {
            return Ok(None);
        };
        let postings = field.postings_by_ord(state.ord).iter(accept_docs);
        Ok(Some(TermScorer::new(
            postings,
            self.similarity.clone(),
            self.value,
        )))
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        Ok(self
            .term_scorer(ctx, accept_docs)?
            .map(|s| Box::new(s) as Box<dyn Scorer + 'a>))
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let label = format!(
            "{}:{}",
            self.term.field,
            String::from_utf8_lossy(&self.term.bytes)
        );
        let Some(mut scorer) = self.term_scorer(ctx, ctx.reader.live_docs())? else {
            return Ok(Explanation::no_match(format!("no term {label} in segment")));
        };
        if scorer.advance(doc)? != doc {
            return Ok(Explanation::no_match(format!(
                "term {label} absent from doc {doc}"
            )));
        }
        let freq = scorer.freq();
        let score = scorer.score()?;
        Ok(
            Explanation::matched(score, format!("weight({label} in {doc}), product of:"))
                .with_detail(Explanation::matched(
                    self.similarity.tf(freq as f32),
                    format!("tf(freq={freq})"),
                ))
                .with_detail(Explanation::matched(
                    self.idf,
                    format!("idf(doc_freq={})", self.context.doc_freq),
                ))
                .with_detail(Explanation::matched(
                    self.query_weight,
                    "query weight".to_string(),
                )),
        )
    }
}
