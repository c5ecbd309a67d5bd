use std::sync::Arc;
use std::time::Instant;

use crate::core::config::SearchConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::segment::{CollectionStatistics, IndexReader, TermStatistics, TermContext};
use crate::index::term::Term;
use crate::query::{Query, Weight};
use crate::scoring::explanation::Explanation;
use crate::scoring::similarity::{Similarity, TfIdfSimilarity};
use crate::search::collector::{SearchResults, TopKCollector};

/// Entry point for running queries against a reader: rewrites to a fixpoint,
/// builds and normalizes the weight, then drives one scorer per segment into
/// a collector.
pub struct IndexSearcher {
    reader: IndexReader,
    similarity: Arc<dyn Similarity>,
    config: SearchConfig,
}

impl IndexSearcher {
    pub fn new(reader: IndexReader) -> Self {
        IndexSearcher {
            reader,
            similarity: Arc::new(TfIdfSimilarity),
            config: SearchConfig::default(),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    pub fn similarity(&self) -> Arc<dyn Similarity> {
        self.similarity.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rewrite until the query stops changing.
    pub fn rewrite(&self, query: &Query) -> Result<Query> {
        let mut current = query.clone();
        loop {
            match current.rewrite(&self.reader, &self.config)? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
    }

    /// Rewritten, weighted and normalized form of a query, ready to produce
    /// scorers.
    pub fn create_weight(&self, query: &Query) -> Result<Weight> {
        let rewritten = self.rewrite(query)?;
        let mut weight = rewritten.create_weight(self)?;
        let sum_of_squares = weight.value_for_normalization();
        let mut norm = self.similarity.query_norm(sum_of_squares);
        if norm.is_infinite() || norm.is_nan() {
            norm = 1.0;
        }
        weight.normalize(norm, 1.0);
        Ok(weight)
    }

    pub fn search(&self, query: &Query, limit: usize) -> Result<SearchResults> {
        let start = Instant::now();
        let weight = self.create_weight(query)?;
        let out_of_order = weight.scores_out_of_order();
        let mut collector = TopKCollector::new(limit);
        for ctx in self.reader.leaves() {
            let scorer = weight.scorer(ctx, !out_of_order, true, ctx.reader.live_docs())?;
            if let Some(mut s) = scorer {
                s.score_all(&mut collector, ctx.doc_base)?;
            }
        }
        let took_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            took_ms,
            total_hits = collector.total_collected,
            limit,
            "search complete"
        );
        Ok(collector.into_results(took_ms))
    }

    /// Score breakdown for one composite doc id under this query.
    pub fn explain(&self, query: &Query, doc: DocId) -> Result<Explanation> {
        let weight = self.create_weight(query)?;
        let Some(ctx) = self.reader.leaf_for_doc(doc) else {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("doc {doc} is out of range"),
            ));
        };
        weight.explain(ctx, doc - ctx.doc_base)
    }

    pub fn term_statistics(&self, term: &Term) -> Result<TermStatistics> {
        let ctx = TermContext::build(&self.reader, term)?;
        Ok(TermStatistics {
            doc_freq: ctx.doc_freq,
            total_term_freq: ctx.total_term_freq,
        })
    }

    pub fn collection_statistics(&self, field: &str) -> CollectionStatistics {
        self.reader.collection_statistics(field)
    }
}
