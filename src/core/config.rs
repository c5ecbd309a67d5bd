/// Limits applied while building and rewriting queries.
///
/// The clause cap is carried here instead of a process-wide static so two
/// searchers with different limits can coexist.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_clause_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_clause_count: 1024,
        }
    }
}
