use std::fmt::Debug;
use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::segment::{SegmentContext, SegmentReader};
use crate::query::{Query, Weight};
use crate::scoring::explanation::Explanation;
use crate::search::scorer::{BitSetIterator, FilteredScorer, Scorer};
use crate::search::searcher::IndexSearcher;

/// Produces the set of documents a segment-level restriction allows. Built
/// once per segment and intersected with the wrapped query's matches.
pub trait Filter: Debug + Send + Sync {
    /// None means no document can pass in this segment.
    fn doc_id_set(&self, segment: &SegmentReader) -> Result<Option<RoaringBitmap>>;
}

/// Scoring query whose matches are restricted to a filter's doc set. The
/// filter contributes no score.
#[derive(Debug, Clone)]
pub struct FilteredQuery {
    pub query: Query,
    pub filter: Arc<dyn Filter>,
    pub boost: f32,
}

impl FilteredQuery {
    pub fn new(query: Query, filter: Arc<dyn Filter>) -> Self {
        FilteredQuery {
            query,
            filter,
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub(crate) fn rewrite(
        &self,
        reader: &crate::index::segment::IndexReader,
        config: &crate::core::config::SearchConfig,
    ) -> Result<Option<Query>> {
        match self.query.rewrite(reader, config)? {
            Some(inner) => Ok(Some(Query::Filtered(Box::new(FilteredQuery {
                query: inner,
                filter: self.filter.clone(),
                boost: self.boost,
            })))),
            None => Ok(None),
        }
    }
}

pub struct FilteredWeight {
    inner: Box<Weight>,
    filter: Arc<dyn Filter>,
    boost: f32,
}

impl FilteredWeight {
    pub(crate) fn new(searcher: &IndexSearcher, query: &FilteredQuery) -> Result<Self> {
        Ok(FilteredWeight {
            inner: Box::new(query.query.create_weight(searcher)?),
            filter: query.filter.clone(),
            boost: query.boost,
        })
    }

    pub fn value_for_normalization(&self) -> f32 {
        self.inner.value_for_normalization() * self.boost * self.boost
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        self.inner.normalize(norm, top_boost * self.boost);
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let Some(mut bits) = self.filter.doc_id_set(ctx.reader)? else {
            return Ok(None);
        };
        if let Some(accept) = accept_docs {
            bits &= accept;
        }
        if bits.is_empty() {
            return Ok(None);
        }
        let Some(inner) = self.inner.scorer(ctx, true, false, accept_docs)? else {
            return Ok(None);
        };
        Ok(Some(Box::new(FilteredScorer::new(
            inner,
            BitSetIterator::new(&bits),
        ))))
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let allowed = match self.filter.doc_id_set(ctx.reader)? {
            Some(bits) => bits.contains(doc as u32),
            None => false,
        };
        if !allowed {
            return Ok(Explanation::no_match(format!(
                "doc {doc} removed by filter"
            )));
        }
        let inner = self.inner.explain(ctx, doc)?;
        if !inner.matched {
            return Ok(inner);
        }
        Ok(
            Explanation::matched(inner.value, "filtered query, score from wrapped query".to_string())
                .with_detail(inner),
        )
    }
}
