use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::segment::{IndexReader, SegmentContext};
use crate::query::filtered::Filter;
use crate::query::{Query, Weight};
use crate::scoring::explanation::Explanation;
use crate::search::scorer::{BitSetIterator, ConstantScorer, ConstantSource, Scorer};
use crate::search::searcher::IndexSearcher;

/// What a constant-score query iterates over: a wrapped query whose scores
/// are discarded, or a filter's doc set.
#[derive(Debug, Clone)]
pub enum ConstantInner {
    Query(Box<Query>),
    Filter(Arc<dyn Filter>),
}

/// Every matching document gets the same score, the query's normalized boost.
#[derive(Debug, Clone)]
pub struct ConstantScoreQuery {
    pub inner: ConstantInner,
    pub boost: f32,
}

impl ConstantScoreQuery {
    pub fn from_query(query: Query) -> Self {
        ConstantScoreQuery {
            inner: ConstantInner::Query(Box::new(query)),
            boost: 1.0,
        }
    }

    pub fn from_filter(filter: Arc<dyn Filter>) -> Self {
        ConstantScoreQuery {
            inner: ConstantInner::Filter(filter),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub(crate) fn rewrite(
        &self,
        reader: &IndexReader,
        config: &SearchConfig,
    ) -> Result<Option<Query>> {
        if let ConstantInner::Query(q) = &self.inner {
            if let Some(rewritten) = q.rewrite(reader, config)? {
                return Ok(Some(Query::ConstantScore(ConstantScoreQuery {
                    inner: ConstantInner::Query(Box::new(rewritten)),
                    boost: self.boost,
                })));
            }
        }
        Ok(None)
    }
}

pub struct ConstantWeight {
    inner: Option<Box<Weight>>,
    filter: Option<Arc<dyn Filter>>,
    boost: f32,
    query_weight: f32,
}

impl ConstantWeight {
    pub(crate) fn new(searcher: &IndexSearcher, query: &ConstantScoreQuery) -> Result<Self> {
        let (inner, filter) = match &query.inner {
            ConstantInner::Query(q) => (Some(Box::new(q.create_weight(searcher)?)), None),
            ConstantInner::Filter(f) => (None, Some(f.clone())),
        };
        Ok(ConstantWeight {
            inner,
            filter,
            boost: query.boost,
            query_weight: query.boost,
        })
    }

    pub fn value_for_normalization(&self) -> f32 {
        // The wrapped query never contributes to normalization; only the
        // constant boost does.
        self.boost * self.boost
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        self.query_weight = self.boost * norm * top_boost;
        if let Some(inner) = &mut self.inner {
            inner.normalize(norm, top_boost);
        }
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let source = if let Some(filter) = &self.filter {
            let Some(mut bits) = filter.doc_id_set(ctx.reader)? else {
                return Ok(None);
            };
            if let Some(accept) = accept_docs {
                bits &= accept;
            }
            if bits.is_empty() {
                return Ok(None);
            }
            ConstantSource::Bits(BitSetIterator::new(&bits))
        } else if let Some(inner) = &self.inner {
            let Some(scorer) = inner.scorer(ctx, true, false, accept_docs)? else {
                return Ok(None);
            };
            ConstantSource::Scorer(scorer)
        } else {
            return Ok(None);
        };
        Ok(Some(Box::new(ConstantScorer::new(source, self.query_weight))))
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let matched = match self.scorer(ctx, ctx.reader.live_docs())? {
            Some(mut s) => s.advance(doc)? == doc,
            None => false,
        };
        if matched {
            Ok(Explanation::matched(
                self.query_weight,
                format!("constant score {} on doc {}", self.query_weight, doc),
            ))
        } else {
            Ok(Explanation::no_match(format!("no match on doc {doc}")))
        }
    }
}
