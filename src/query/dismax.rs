use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::segment::{IndexReader, SegmentContext};
use crate::query::{Query, Weight};
use crate::scoring::explanation::Explanation;
use crate::search::disjunction::DisjunctionMaxScorer;
use crate::search::scorer::Scorer;
use crate::search::searcher::IndexSearcher;

/// Takes each document's best disjunct score instead of the sum, plus
/// `tie_breaker` times the rest. Suits queries spanning fields of very
/// different weight, where summing would double-count.
#[derive(Debug, Clone)]
pub struct DisjunctionMaxQuery {
    pub disjuncts: Vec<Query>,
    pub tie_breaker: f32,
    pub boost: f32,
}

impl DisjunctionMaxQuery {
    pub fn new(tie_breaker: f32) -> Self {
        DisjunctionMaxQuery {
            disjuncts: Vec::new(),
            tie_breaker,
            boost: 1.0,
        }
    }

    pub fn add(&mut self, query: Query) {
        self.disjuncts.push(query);
    }

    pub(crate) fn rewrite(
        &self,
        reader: &IndexReader,
        config: &SearchConfig,
    ) -> Result<Option<Query>> {
        if self.disjuncts.len() == 1 {
            let mut inner = self.disjuncts[0].clone();
            if self.boost != 1.0 {
                let b = inner.boost();
                inner.set_boost(b * self.boost);
            }
            return Ok(Some(inner));
        }
        let mut changed = false;
        let mut disjuncts = Vec::with_capacity(self.disjuncts.len());
        for d in &self.disjuncts {
            match d.rewrite(reader, config)? {
                Some(rewritten) => {
                    changed = true;
                    disjuncts.push(rewritten);
                }
                None => disjuncts.push(d.clone()),
            }
        }
        if changed {
            Ok(Some(Query::DisjunctionMax(DisjunctionMaxQuery {
                disjuncts,
                tie_breaker: self.tie_breaker,
                boost: self.boost,
            })))
        } else {
            Ok(None)
        }
    }
}

pub struct DisMaxWeight {
    weights: Vec<Weight>,
    tie_breaker: f32,
    boost: f32,
}

impl DisMaxWeight {
    pub(crate) fn new(searcher: &IndexSearcher, query: &DisjunctionMaxQuery) -> Result<Self> {
        let mut weights = Vec::with_capacity(query.disjuncts.len());
        for d in &query.disjuncts {
            weights.push(d.create_weight(searcher)?);
        }
        Ok(DisMaxWeight {
            weights,
            tie_breaker: query.tie_breaker,
            boost: query.boost,
        })
    }

    pub fn value_for_normalization(&self) -> f32 {
        let mut max = 0.0f32;
        let mut sum = 0.0f32;
        for w in &self.weights {
            let v = w.value_for_normalization();
            sum += v;
            max = max.max(v);
        }
        ((sum - max) * self.tie_breaker * self.tie_breaker + max) * self.boost * self.boost
    }

    pub fn normalize(&mut self, norm: f32, top_boost: f32) {
        let top = top_boost * self.boost;
        for w in &mut self.weights {
            w.normalize(norm, top);
        }
    }

    pub fn scorer<'a>(
        &'a self,
        ctx: SegmentContext<'a>,
        accept_docs: Option<&'a RoaringBitmap>,
    ) -> Result<Option<Box<dyn Scorer + 'a>>> {
        let mut subs = Vec::with_capacity(self.weights.len());
        for w in &self.weights {
            if let Some(s) = w.scorer(ctx, true, false, accept_docs)? {
                subs.push(s);
            }
        }
        match subs.len() {
            0 => Ok(None),
            1 => Ok(subs.pop()),
            _ => Ok(Some(Box::new(DisjunctionMaxScorer::new(
                subs,
                self.tie_breaker,
            )))),
        }
    }

    pub fn explain(&self, ctx: SegmentContext<'_>, doc: DocId) -> Result<Explanation> {
        let mut max = 0.0f32;
        let mut sum = 0.0f32;
        let mut details = Vec::new();
        for w in &self.weights {
            let e = w.explain(ctx, doc)?;
            if e.matched {
                sum += e.value;
                max = max.max(e.value);
                details.push(e);
            }
        }
        if details.is_empty() {
            return Ok(Explanation::no_match(format!(
                "no disjunct matches doc {doc}"
            )));
        }
        let value = max + self.tie_breaker * (sum - max);
        let mut e = Explanation::matched(
            value,
            format!("max plus {} times others of:", self.tie_breaker),
        );
        for d in details {
            e = e.with_detail(d);
        }
        Ok(e)
    }
}
