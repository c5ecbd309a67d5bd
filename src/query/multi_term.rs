use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt::Debug;
use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::config::SearchConfig;
use crate::core::error::Result;
use crate::index::segment::{IndexReader, SegmentReader};
use crate::index::term::Term;
use crate::index::terms::TermsEnum;
use crate::query::boolean::{BooleanQuery, Occur};
use crate::query::constant::ConstantScoreQuery;
use crate::query::filtered::Filter;
use crate::query::fuzzy::FuzzyQuery;
use crate::query::numeric::NumericRangeQuery;
use crate::query::prefix::PrefixQuery;
use crate::query::term_query::TermQuery;
use crate::query::Query;

/// How a term-expanding query turns its matching terms into something the
/// searcher can execute.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteMethod {
    /// Constant-score filter over the union of matching docs. Never expands
    /// into clauses, so it cannot hit the clause limit.
    ConstantScoreFilter,
    /// One scoring SHOULD clause per matching term, coord disabled.
    ScoringBooleanQuery,
    /// Boolean expansion executed for iteration only, scores flattened.
    ConstantScoreBooleanQuery,
    /// Keep only the `size` highest-boosted terms, competitively pruned.
    TopTerms { size: usize },
    /// Boolean expansion while small, filter once either cutoff is crossed.
    ConstantScoreAuto { term_cutoff: usize, doc_fraction: f64 },
}

impl RewriteMethod {
    pub fn constant_score_auto_default() -> Self {
        RewriteMethod::ConstantScoreAuto {
            term_cutoff: 350,
            doc_fraction: 0.001,
        }
    }
}

/// A query that matches a set of terms in one field: prefix, fuzzy, numeric
/// range. The rewrite turns it into primitive queries before weights exist.
pub trait MultiTermQuery: Debug {
    fn field(&self) -> &str;
    fn boost(&self) -> f32;
    fn rewrite_method(&self) -> RewriteMethod;
    fn terms_enum<'a>(&self, segment: &'a SegmentReader)
    -> Result<Option<Box<dyn TermsEnum + 'a>>>;
}

#[derive(Debug, Clone)]
pub enum MultiTermVariant {
    Fuzzy(FuzzyQuery),
    NumericRange(NumericRangeQuery),
    Prefix(PrefixQuery),
}

impl MultiTermVariant {
    pub fn as_multi_term(&self) -> &dyn MultiTermQuery {
        match self {
            MultiTermVariant::Fuzzy(q) => q,
            MultiTermVariant::NumericRange(q) => q,
            MultiTermVariant::Prefix(q) => q,
        }
    }
}

/// Union of all documents containing any term the wrapped query matches.
#[derive(Debug, Clone)]
pub struct MultiTermFilter {
    pub query: MultiTermVariant,
}

impl Filter for MultiTermFilter {
    fn doc_id_set(&self, segment: &SegmentReader) -> Result<Option<RoaringBitmap>> {
        let q = self.query.as_multi_term();
        let Some(field) = segment.field(q.field()) else {
            return Ok(None);
        };
        let Some(mut te) = q.terms_enum(segment)? else {
            return Ok(None);
        };
        let mut bits = RoaringBitmap::new();
        let mut any = false;
        while te.next()? {
            let Some(ord) = te.ord() else { continue };
            any = true;
            for p in &field.postings_by_ord(ord).postings {
                bits.insert(p.doc_id as u32);
            }
        }
        Ok(if any { Some(bits) } else { None })
    }
}

pub(crate) fn rewrite_multi_term(
    variant: &MultiTermVariant,
    reader: &IndexReader,
    config: &SearchConfig,
) -> Result<Query> {
    let q = variant.as_multi_term();
    match q.rewrite_method() {
        RewriteMethod::ConstantScoreFilter => Ok(constant_filter_query(variant)),
        RewriteMethod::ScoringBooleanQuery => {
            let terms = collect_terms(variant, reader)?;
            let mut bq = boolean_of(q.field(), terms, true, config)?;
            bq.boost = q.boost();
            Ok(Query::Boolean(bq))
        }
        RewriteMethod::ConstantScoreBooleanQuery => {
            let terms = collect_terms(variant, reader)?;
            let bq = boolean_of(q.field(), terms, true, config)?;
            Ok(Query::ConstantScore(
                ConstantScoreQuery::from_query(Query::Boolean(bq)).with_boost(q.boost()),
            ))
        }
        RewriteMethod::TopTerms { size } => top_terms(variant, reader, config, size),
        RewriteMethod::ConstantScoreAuto {
            term_cutoff,
            doc_fraction,
        } => auto_rewrite(variant, reader, config, term_cutoff, doc_fraction),
    }
}

fn constant_filter_query(variant: &MultiTermVariant) -> Query {
    let boost = variant.as_multi_term().boost();
    Query::ConstantScore(
        ConstantScoreQuery::from_filter(Arc::new(MultiTermFilter {
            query: variant.clone(),
        }))
        .with_boost(boost),
    )
}

/// Every matching term across all segments, with the boost the enum assigned
/// on first sight. Term boosts do not vary by segment.
fn collect_terms(
    variant: &MultiTermVariant,
    reader: &IndexReader,
) -> Result<BTreeMap<Vec<u8>, f32>> {
    let q = variant.as_multi_term();
    let mut collected = BTreeMap::new();
    for ctx in reader.leaves() {
        let Some(mut te) = q.terms_enum(ctx.reader)? else {
            continue;
        };
        while te.next()? {
            let Some(term) = te.term() else { break };
            let term = term.to_vec();
            let boost = te.boost();
            collected.entry(term).or_insert(boost);
        }
    }
    Ok(collected)
}

fn boolean_of(
    field: &str,
    terms: BTreeMap<Vec<u8>, f32>,
    with_boosts: bool,
    config: &SearchConfig,
) -> Result<BooleanQuery> {
    let mut bq = BooleanQuery::new(config);
    bq.disable_coord = true;
    for (bytes, boost) in terms {
        let mut tq = TermQuery::new(Term::from_bytes(field, bytes));
        if with_boosts {
            tq.boost = boost;
        }
        bq.add(Query::Term(tq), Occur::Should)?;
    }
    Ok(bq)
}

/// Queue entry for the top-terms rewrite. Ordered so the weakest candidate
/// is the minimum: lowest boost first, then the larger term.
struct ScoreTerm {
    boost: f32,
    term: Vec<u8>,
}

impl PartialEq for ScoreTerm {
    fn eq(&self, other: &Self) -> bool {
        self.boost == other.boost && self.term == other.term
    }
}

impl Eq for ScoreTerm {}

impl PartialOrd for ScoreTerm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreTerm {
    fn cmp(&self, other: &Self) -> Ordering {
        self.boost
            .total_cmp(&other.boost)
            .then_with(|| other.term.cmp(&self.term))
    }
}

fn top_terms(
    variant: &MultiTermVariant,
    reader: &IndexReader,
    config: &SearchConfig,
    size: usize,
) -> Result<Query> {
    let q = variant.as_multi_term();
    let size = size.min(config.max_clause_count).max(1);
    let mut members: BTreeMap<Vec<u8>, f32> = BTreeMap::new();
    let mut queue: BinaryHeap<Reverse<ScoreTerm>> = BinaryHeap::with_capacity(size + 1);

    for ctx in reader.leaves() {
        let Some(mut te) = q.terms_enum(ctx.reader)? else {
            continue;
        };
        if queue.len() == size {
            if let Some(Reverse(weakest)) = queue.peek() {
                te.set_max_non_competitive_boost(weakest.boost);
            }
        }
        while te.next()? {
            let Some(term) = te.term() else { break };
            let term = term.to_vec();
            let boost = te.boost();
            if members.contains_key(&term) {
                continue;
            }
            if queue.len() == size {
                let candidate = ScoreTerm { boost, term };
                let competitive = match queue.peek() {
                    Some(Reverse(weakest)) => candidate.cmp(weakest) == Ordering::Greater,
                    None => true,
                };
                if !competitive {
                    continue;
                }
                if let Some(Reverse(evicted)) = queue.pop() {
                    members.remove(&evicted.term);
                }
                members.insert(candidate.term.clone(), candidate.boost);
                queue.push(Reverse(candidate));
                if let Some(Reverse(weakest)) = queue.peek() {
                    te.set_max_non_competitive_boost(weakest.boost);
                }
            } else {
                members.insert(term.clone(), boost);
                queue.push(Reverse(ScoreTerm { boost, term }));
                if queue.len() == size {
                    if let Some(Reverse(weakest)) = queue.peek() {
                        te.set_max_non_competitive_boost(weakest.boost);
                    }
                }
            }
        }
    }

    let mut bq = boolean_of(q.field(), members, true, config)?;
    bq.boost = q.boost();
    Ok(Query::Boolean(bq))
}

fn auto_rewrite(
    variant: &MultiTermVariant,
    reader: &IndexReader,
    config: &SearchConfig,
    term_cutoff: usize,
    doc_fraction: f64,
) -> Result<Query> {
    let q = variant.as_multi_term();
    let doc_cutoff = (doc_fraction * reader.max_doc() as f64) as u64;
    let mut collected: BTreeMap<Vec<u8>, f32> = BTreeMap::new();
    let mut visited_docs = 0u64;

    for ctx in reader.leaves() {
        let Some(mut te) = q.terms_enum(ctx.reader)? else {
            continue;
        };
        while te.next()? {
            let Some(term) = te.term() else { break };
            let term = term.to_vec();
            let doc_freq = te.doc_freq() as u64;
            if collected.insert(term, 1.0).is_none() {
                visited_docs += doc_freq;
            }
            if collected.len() > term_cutoff || visited_docs > doc_cutoff {
                tracing::debug!(
                    terms = collected.len(),
                    visited_docs,
                    "auto rewrite cutoff crossed, falling back to a filter"
                );
                return Ok(constant_filter_query(variant));
            }
        }
    }

    let bq = boolean_of(q.field(), collected, false, config)?;
    Ok(Query::ConstantScore(
        ConstantScoreQuery::from_query(Query::Boolean(bq)).with_boost(q.boost()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_term_ordering_breaks_ties_toward_smaller_terms() {
        let low = ScoreTerm {
            boost: 0.5,
            term: b"aa".to_vec(),
        };
        let high = ScoreTerm {
            boost: 0.9,
            term: b"zz".to_vec(),
        };
        assert!(low < high, "lower boost is weaker");

        let small = ScoreTerm {
            boost: 0.5,
            term: b"aa".to_vec(),
        };
        let large = ScoreTerm {
            boost: 0.5,
            term: b"bb".to_vec(),
        };
        assert!(large < small, "on equal boost the larger term is weaker");
    }
}
