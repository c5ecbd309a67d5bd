use std::collections::HashMap;

use crate::core::config::SearchConfig;
use crate::core::error::Result;
use crate::index::segment::IndexReader;
use crate::index::term::Term;
use crate::query::boolean::{BooleanQuery, Occur};
use crate::query::term_query::TermQuery;
use crate::query::Query;
use crate::scoring::similarity::{Similarity, TfIdfSimilarity};

/// Finds documents resembling a piece of text: its most distinctive terms
/// by tf-idf become a capped SHOULD boolean, boosted relative to the best
/// term. Always resolved at rewrite time.
#[derive(Debug, Clone)]
pub struct MoreLikeThisQuery {
    pub field: String,
    pub like_text: String,
    pub max_query_terms: usize,
    pub min_term_freq: u32,
    pub min_doc_freq: u32,
    pub boost: f32,
}

impl MoreLikeThisQuery {
    pub fn new(field: &str, like_text: &str) -> Self {
        MoreLikeThisQuery {
            field: field.to_string(),
            like_text: like_text.to_string(),
            max_query_terms: 25,
            min_term_freq: 2,
            min_doc_freq: 5,
            boost: 1.0,
        }
    }

    pub fn with_max_query_terms(mut self, max: usize) -> Self {
        self.max_query_terms = max.max(1);
        self
    }

    pub fn with_min_term_freq(mut self, min: u32) -> Self {
        self.min_term_freq = min;
        self
    }

    pub fn with_min_doc_freq(mut self, min: u32) -> Self {
        self.min_doc_freq = min;
        self
    }

    pub(crate) fn rewrite(&self, reader: &IndexReader, config: &SearchConfig) -> Result<Query> {
        // Same tokenization the index builder applies to text fields.
        let mut term_freqs: HashMap<&str, u32> = HashMap::new();
        for token in self.like_text.split_whitespace() {
            *term_freqs.entry(token).or_insert(0) += 1;
        }

        let sim = TfIdfSimilarity;
        let max_doc = reader.max_doc() as u64;
        let mut scored: Vec<(f32, Term)> = Vec::new();
        for (text, tf) in term_freqs {
            if tf < self.min_term_freq {
                continue;
            }
            let term = Term::new(&self.field, text);
            let ctx = crate::index::segment::TermContext::build(reader, &term)?;
            if ctx.doc_freq == 0 || (ctx.doc_freq as u32) < self.min_doc_freq {
                continue;
            }
            let score = tf as f32 * sim.idf(ctx.doc_freq, max_doc);
            scored.push((score, term));
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let cap = self.max_query_terms.min(config.max_clause_count);
        scored.truncate(cap);

        let mut bq = BooleanQuery::new(config);
        bq.boost = self.boost;
        let best = scored.first().map(|(s, _)| *s).unwrap_or(1.0);
        for (score, term) in scored {
            let tq = TermQuery::new(term).with_boost(score / best);
            bq.add(Query::Term(tq), Occur::Should)?;
        }
        Ok(Query::Boolean(bq))
    }
}
