pub mod boolean;
pub mod constant;
pub mod dismax;
pub mod filtered;
pub mod fuzzy;
pub mod more_like_this;
pub mod multi_term;
pub mod numeric;
pub mod phrase;
pub mod prefix;
pub mod term_query;

use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::segment::{IndexReader, SegmentContext};
use crate::query::boolean::{BooleanQuery, BooleanWeight};
use crate::query::constant::{ConstantScoreQuery, ConstantWeight};
use crate::query::dismax::{DisMaxWeight, DisjunctionMaxQuery};
use crate::query::filtered::{FilteredQuery, FilteredWeight};
use crate::query::fuzzy::FuzzyQuery;
use crate::query::more_like_this::MoreLikeThisQuery;
use crate::query::multi_term::{MultiTermVariant, rewrite_multi_term};
use crate::query::numeric::NumericRangeQuery;
use crate::query::phrase::{MultiPhraseQuery, PhraseQuery, PhraseWeight};
use crate::query::prefix::PrefixQuery;
use crate::query::term_query::{TermQuery, TermWeight};
use crate::scoring::explanation::Explanation;
use crate::search::scorer::{MatchAllScorer, Scorer};
use crate::search::searcher::IndexSearcher;

/// Matches every live document at the query boost.
#[derive(Debug, Clone)]
pub struct MatchAllQuery {
    pub boost: f32,
}

impl MatchAllQuery {
    pub fn new() -> Self {
        MatchAllQuery { boost: 1.0 }
    }
}

impl Default for MatchAllQuery {
    fn default() -> Self {
        MatchAllQuery::new()
    }
}

/// A search request. Term-expanding variants (fuzzy, prefix, numeric range,
/// more-like-this) only describe a term set; `rewrite` resolves them into
/// primitive queries before a weight can exist.
#[derive(Debug, Clone)]
pub enum Query {
    Term(TermQuery),
    Boolean(BooleanQuery),
    Phrase(PhraseQuery),
    MultiPhrase(MultiPhraseQuery),
    Fuzzy(FuzzyQuery),
    NumericRange(NumericRangeQuery),
    Prefix(PrefixQuery),
    ConstantScore(ConstantScoreQuery),
    Filtered(Box<FilteredQuery>),
    DisjunctionMax(DisjunctionMaxQuery),
    MoreLikeThis(MoreLikeThisQuery),
    MatchAll(MatchAllQuery),
}

impl Query {
    pub fn boost(&self) -> f32 {
        match self {
            Query::Term(q) => q.boost,
            Query::Boolean(q) => q.boost,
            Query::Phrase(q) => q.boost,
            Query::MultiPhrase(q) => q.boost,
            Query::Fuzzy(q) => q.boost,
            Query::NumericRange(q) => q.boost,
            Query::Prefix(q) => q.boost,
            Query::ConstantScore(q) => q.boost,
            Query::Filtered(q) => q.boost,
            Query::DisjunctionMax(q) => q.boost,
            Query::MoreLikeThis(q) => q.boost,
            Query::MatchAll(q) => q.boost,
        }
    }

    pub fn set_boost(&mut self, boost: f32) {
        match self {
            Query::Term(q) => q.boost = boost,
            Query::Boolean(q) => q.boost = boost,
            Query::Phrase(q) => q.boost = boost,
            Query::MultiPhrase(q) => q.boost = boost,
            Query::Fuzzy(q) => q.boost = boost,
            Query::NumericRange(q) => q.boost = boost,
            Query::Prefix(q) => q.boost = boost,
            Query::ConstantScore(q) => q.boost = boost,
            Query::Filtered(q) => q.boost = boost,
            Query::DisjunctionMax(q) => q.boost = boost,
            Query::MoreLikeThis(q) => q.boost = boost,
            Query::MatchAll(q) => q.boost = boost,
        }
    }

    /// One rewrite step. None means already primitive; the searcher loops
    /// until a fixpoint.
    pub fn rewrite(&self, reader: &IndexReader, config: &SearchConfig) -> Result<Option<Query>> {
        match self {
            Query::Term(_) | Query::MatchAll(_) => Ok(None),
            Query::Boolean(q) => q.rewrite(reader, config),
            Query::Phrase(q) => Ok(q.rewrite()),
            Query::MultiPhrase(q) => q.rewrite(config),
            Query::Fuzzy(q) => {
                rewrite_multi_term(&MultiTermVariant::Fuzzy(q.clone()), reader, config).map(Some)
            }
            Query::NumericRange(q) => {
                rewrite_multi_term(&MultiTermVariant::NumericRange(q.clone()), reader, config)
                    .map(Some)
            }
            Query::Prefix(q) => {
                rewrite_multi_term(&MultiTermVariant::Prefix(q.clone()), reader, config).map(Some)
            }
            Query::ConstantScore(q) => q.rewrite(reader, config),
            Query::Filtered(q) => q.rewrite(reader, config),
            Query::DisjunctionMax(q) => q.rewrite(reader, config),
            Query::MoreLikeThis(q) => q.rewrite(reader, config).map(Some),
        }
    }

    pub(crate) fn create_weight(&self, searcher: &IndexSearcher) -> Result<Weight> {
        match self {
            Query::Term(q) => Ok(Weight::Term(TermWeight::new(searcher, q)?)),
            Query::Boolean(q) => Ok(Weight::Boolean(BooleanWeight::new(searcher, q)?)),
            Query::Phrase(q) => Ok(Weight::Phrase(PhraseWeight::new(
                searcher,
                q.field.clone(),
                q.slots(),
                q.slop,
                q.boost,
            )?)),
            Query::MultiPhrase(q) => Ok(Weight::Phrase(PhraseWeight::new(
                searcher,
                q.field.clone(),
                q.slots(),
                q.slop,
                q.boost,
            )?)),
            Query::ConstantScore(q) => {
                Ok(Weight::ConstantScore(ConstantWeight::new(searcher, q)?))
            }
            Query::Filtered(q) => Ok(Weight::Filtered(FilteredWeight::new(searcher, q)?)),
            Query::DisjunctionMax(q) => {
                Ok(Weight::DisjunctionMax(DisMaxWeight::new(searcher, q)?))
            }
            Query::MatchAll(q) => Ok(Weight::MatchAll(MatchAllWeight::new(q.boost))),
            Query::Fuzzy(_)
            | Query::NumericRange(_)
            | Query::Prefix(_)
            | Query::MoreLikeThis(_) => Err(Error::new(
                ErrorKind::InvalidState,
                "term-expanding queries must be rewritten before weight creation".to_string(),
            )),
        }
    }
}

/// Executable, normalized form of a rewritten query. One variant per query
/// layer; the boolean weight inspects variants directly to pick its
/// conjunction fast path.
pub enum Weight {
    Term(TermWeight),
    Boolean(BooleanWeight),
    Phrase(PhraseWeight),
    ConstantScore(ConstantWeight),
    Filtered(FilteredWeight),
    DisjunctionMax(DisMaxWeight),
    MatchAll(MatchAllWeight),
}

impl Weight {
    /// Sum of squared clause weights, fed to the similarity's query norm.
    pub fn value_for_normalization(&self) -> f32 {
        match self {
            Weight::Term(w) => w.value_for_normalization(),
            Weight::Boolean(w) => w.value_for_normalization(),
            Weight::Phrase(w) => w.value_for_normalization(),
            Weight::ConstantScore(w) => w.value_for_normalization(),
            Weight::Filtered(w) => w.value_for_normalization(),
            Weight::DisjunctionMax(w) => w.value_for_normalization(),
            Weight::MatchAll(w) => w.value_for_normalization(),
        }
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        match self {
            Weight::Term(w) => w.normalize(norm, top_boost),
            Weight::Boolean(w) => w.normalize(norm, top_boost),
            Weight::Phrase(w) => w.normalize(norm, top_boost),
            Weight::ConstantScore(w) => w.normalize(norm, top_boost),
            Weight::Filtered(w) => w.normalize(norm, top_boost),
            Weight::DisjunctionMax(w) => w.normalize(norm, top_boost),
            Weight::MatchAll(w) => w.normalize(norm, top_boost),
        }
    }

    /// Per-segment scorer. `in_order` false plus `top_scorer` true permits
    /// the bucketed out-of-order boolean scorer; everyone else ignores both.
    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        in_order: bool,
        top_scorer: bool,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        match self {
            Weight::Term(w) => w.scorer(ctx, accept_docs),
            Weight::Boolean(w) => w.scorer(ctx, in_order, top_scorer, accept_docs),
            Weight::Phrase(w) => w.scorer(ctx, accept_docs),
            Weight::ConstantScore(w) => w.scorer(ctx, accept_docs),
            Weight::Filtered(w) => w.scorer(ctx, accept_docs),
            Weight::DisjunctionMax(w) => w.scorer(ctx, accept_docs),
            Weight::MatchAll(w) => w.scorer(ctx, accept_docs),
        }
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        match self {
            Weight::Term(w) => w.explain(ctx, doc),
            Weight::Boolean(w) => w.explain(ctx, doc),
            Weight::Phrase(w) => w.explain(ctx, doc),
            Weight::ConstantScore(w) => w.explain(ctx, doc),
            Weight::Filtered(w) => w.explain(ctx, doc),
            Weight::DisjunctionMax(w) => w.explain(ctx, doc),
            Weight::MatchAll(w) => w.explain(ctx, doc),
        }
    }

    pub fn scores_out_of_order(&self) -> bool {
        match self {
            Weight::Boolean(w) => w.scores_out_of_order(),
            _ => false,
        }
    }
}

pub struct MatchAllWeight {
    boost: f32,
    query_weight: f32,
}

impl MatchAllWeight {
    pub(crate) fn new(boost: f32) -> Self {
        MatchAllWeight {
            boost,
            query_weight: boost,
        }
    }

    pub fn value_for_normalization(&self) -> f32 {
        self.query_weight * self.query_weight
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        self.query_weight = self.boost * norm * top_boost;
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        Ok(Some(Box::new(MatchAllScorer::new(
            ctx.reader.max_doc,
            accept_docs,
            self.query_weight,
        ))))
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let live = doc >= 0
            && doc < ctx.reader.max_doc
            && ctx
                .reader
                .live_docs()
                .map(|bits| bits.contains(doc as u32))
                .unwrap_or(true);
        if live {
            Ok(Explanation::matched(
                self.query_weight,
                format!("match all docs, doc {doc}"),
            ))
        } else {
            Ok(Explanation::no_match(format!("doc {doc} is not live")))
        }
    }
}
