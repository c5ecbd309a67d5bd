use std::fmt::Debug;

/// Pluggable scoring policy. Weights call `idf`/`query_norm` at construction
/// time, scorers call `score`/`coord`/`slop_factor` per document.
pub trait Similarity: Debug + Send + Sync {
    /// Inverse document frequency for a term seen in `doc_freq` of
    /// `doc_count` documents.
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32;

    /// Term-frequency saturation.
    fn tf(&self, freq: f32) -> f32;

    /// Reward for matching `overlap` of `max_overlap` optional clauses.
    fn coord(&self, overlap: u32, max_overlap: u32) -> f32;

    /// Normalization factor derived from the sum of squared clause weights,
    /// making scores comparable across queries.
    fn query_norm(&self, sum_of_squared_weights: f32) -> f32;

    /// Contribution of a sloppy phrase match `distance` edits away from
    /// exact. Must not increase with distance.
    fn slop_factor(&self, distance: i64) -> f32;

    /// Final per-document score from a raw frequency, the normalized weight
    /// value and the document's stored field norm.
    fn score(&self, freq: f32, weight_value: f32, norm: f32) -> f32 {
        self.tf(freq) * weight_value * norm
    }
}

/// Classic tf-idf with vector-space normalization.
#[derive(Debug, Clone, Default)]
pub struct TfIdfSimilarity;

impl Similarity for TfIdfSimilarity {
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        1.0 + ((doc_count as f32 + 1.0) / (doc_freq as f32 + 1.0)).ln()
    }

    fn tf(&self, freq: f32) -> f32 {
        freq.sqrt()
    }

    fn coord(&self, overlap: u32, max_overlap: u32) -> f32 {
        if max_overlap == 0 {
            1.0
        } else {
            overlap as f32 / max_overlap as f32
        }
    }

    fn query_norm(&self, sum_of_squared_weights: f32) -> f32 {
        if sum_of_squared_weights <= 0.0 {
            1.0
        } else {
            1.0 / sum_of_squared_weights.sqrt()
        }
    }

    fn slop_factor(&self, distance: i64) -> f32 {
        1.0 / (distance as f32 + 1.0)
    }
}

/// BM25 term saturation. The stored norm is 1/sqrt(len), so the document
/// length is recovered as 1/norm^2.
#[derive(Debug, Clone)]
pub struct Bm25Similarity {
    pub k1: f32, // Term frequency saturation (default: 1.2)
    pub b: f32,  // Length normalization strength (default: 0.75)
    pub avg_doc_length: f32,
}

impl Default for Bm25Similarity {
    fn default() -> Self {
        Bm25Similarity {
            k1: 1.2,
            b: 0.75,
            avg_doc_length: 1.0,
        }
    }
}

impl Bm25Similarity {
    pub fn new(k1: f32, b: f32, avg_doc_length: f32) -> Self {
        Bm25Similarity {
            k1,
            b,
            avg_doc_length: avg_doc_length.max(1.0),
        }
    }
}

impl Similarity for Bm25Similarity {
    fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        let n = doc_count as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn tf(&self, freq: f32) -> f32 {
        freq
    }

    fn coord(&self, _overlap: u32, _max_overlap: u32) -> f32 {
        1.0
    }

    fn query_norm(&self, _sum_of_squared_weights: f32) -> f32 {
        1.0
    }

    fn slop_factor(&self, distance: i64) -> f32 {
        1.0 / (distance as f32 + 1.0)
    }

    fn score(&self, freq: f32, weight_value: f32, norm: f32) -> f32 {
        let doc_len = if norm > 0.0 { 1.0 / (norm * norm) } else { self.avg_doc_length };
        let saturated = freq * (self.k1 + 1.0)
            / (freq + self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_doc_length));
        weight_value * saturated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_decreases_with_doc_freq() {
        let sim = TfIdfSimilarity;
        assert!(sim.idf(1, 100) > sim.idf(50, 100));
    }

    #[test]
    fn slop_factor_decreases_with_distance() {
        let sim = TfIdfSimilarity;
        assert!(sim.slop_factor(0) > sim.slop_factor(1));
        assert!(sim.slop_factor(1) > sim.slop_factor(5));
        assert_eq!(sim.slop_factor(0), 1.0);
    }

    #[test]
    fn query_norm_guards_zero() {
        let sim = TfIdfSimilarity;
        assert_eq!(sim.query_norm(0.0), 1.0);
    }

    #[test]
    fn bm25_saturates_term_frequency() {
        let sim = Bm25Similarity::default();
        let s1 = sim.score(1.0, 1.0, 1.0);
        let s10 = sim.score(10.0, 1.0, 1.0);
        let s100 = sim.score(100.0, 1.0, 1.0);
        assert!(s10 - s1 > s100 - s10, "gains must diminish");
    }
}
