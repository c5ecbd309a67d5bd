use std::fmt;

use levenshtein_automata::{DFA, Distance, LevenshteinAutomatonBuilder};

use crate::core::error::{Error, ErrorKind, Result};
use crate::index::segment::{FieldReader, SegmentReader};
use crate::index::term::Term;
use crate::index::terms::{SeekStatus, SegmentTermsEnum, TermsEnum};
use crate::query::multi_term::{MultiTermQuery, RewriteMethod};

pub const DEFAULT_MAX_EXPANSIONS: usize = 50;

/// Matches terms within `max_edits` Levenshtein edits of the query term.
/// The first `prefix_length` characters must match exactly; only the best
/// `max_expansions` terms survive the rewrite.
#[derive(Debug, Clone)]
pub struct FuzzyQuery {
    pub term: Term,
    pub max_edits: u32,
    pub prefix_length: usize,
    pub max_expansions: usize,
    pub transpositions: bool,
    pub boost: f32,
}

impl FuzzyQuery {
    pub fn new(term: Term, max_edits: u32, prefix_length: usize) -> Result<Self> {
        if max_edits > 2 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("max edits must be at most 2, got {max_edits}"),
            ));
        }
        let term_chars = term.text()?.chars().count();
        if prefix_length > term_chars {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!(
                    "prefix length {prefix_length} exceeds term length {term_chars}"
                ),
            ));
        }
        Ok(FuzzyQuery {
            term,
            max_edits,
            prefix_length,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            transpositions: true,
            boost: 1.0,
        })
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions.max(1);
        self
    }

    pub fn with_transpositions(mut self, transpositions: bool) -> Self {
        self.transpositions = transpositions;
        self
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl MultiTermQuery for FuzzyQuery {
    fn field(&self) -> &str {
        &self.term.field
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn rewrite_method(&self) -> RewriteMethod {
        RewriteMethod::TopTerms {
            size: self.max_expansions,
        }
    }

    fn terms_enum<'a>(
        &self,
        segment: &'a SegmentReader,
    ) -> Result<Option<Box<dyn TermsEnum + 'a>>> {
        let Some(field) = segment.field(&self.term.field) else {
            return Ok(None);
        };
        let text = self.term.text()?;
        Ok(Some(Box::new(FuzzyTermsEnum::new(
            field,
            text,
            self.max_edits,
            self.prefix_length,
            self.transpositions,
        ))))
    }
}

/// Dictionary walk restricted to terms within edit distance of the query.
///
/// The prefix is split off character-wise and matched byte-exact; a
/// Levenshtein DFA per edit level evaluates the remainder. When the rewrite
/// queue reports a non-competitive boost the effective edit limit drops,
/// switching to a cheaper DFA mid-walk.
pub struct FuzzyTermsEnum<'a> {
    inner: SegmentTermsEnum<'a>,
    prefix: Vec<u8>,
    dfas: Vec<DFA>, // index = edit distance limit
    effective_max_edits: u32,
    query_chars: usize, // full query term length in characters
    current_boost: f32,
    started: bool,
    exhausted: bool,
}

impl<'a> FuzzyTermsEnum<'a> {
    pub fn new(
        field: &'a FieldReader,
        text: &str,
        max_edits: u32,
        prefix_length: usize,
        transpositions: bool,
    ) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let split = prefix_length.min(chars.len());
        let prefix: String = chars[..split].iter().collect();
        let suffix: String = chars[split..].iter().collect();
        let mut dfas = Vec::with_capacity(max_edits as usize + 1);
        for d in 0..=max_edits {
            dfas.push(LevenshteinAutomatonBuilder::new(d as u8, transpositions).build_dfa(&suffix));
        }
        FuzzyTermsEnum {
            inner: field.iter(),
            prefix: prefix.into_bytes(),
            dfas,
            effective_max_edits: max_edits,
            query_chars: chars.len(),
            current_boost: 1.0,
            started: false,
            exhausted: false,
        }
    }

    /// Edit distance of the candidate's suffix, None when beyond the
    /// effective limit or the prefix does not match.
    fn distance(&self, term: &[u8]) -> Option<u32> {
        if !term.starts_with(&self.prefix) {
            return None;
        }
        let dfa = &self.dfas[self.effective_max_edits as usize];
        match dfa.eval(&term[self.prefix.len()..]) {
            Distance::Exact(d) => Some(d as u32),
            Distance::AtLeast(_) => None,
        }
    }

    fn boost_of(&self, term: &[u8], distance: u32) -> f32 {
        let term_chars = String::from_utf8_lossy(term).chars().count();
        let min_len = term_chars.min(self.query_chars);
        if min_len == 0 {
            if distance == 0 { 1.0 } else { 0.0 }
        } else {
            1.0 - distance as f32 / min_len as f32
        }
    }
}

impl fmt::Debug for FuzzyTermsEnum<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "FuzzyTermsEnum(max_edits={}, prefix_len={})",
            self.effective_max_edits,
            self.prefix.len()
        )
    }
}

impl TermsEnum for FuzzyTermsEnum<'_> {
    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        loop {
            let positioned = if !self.started {
                self.started = true;
                if self.prefix.is_empty() {
                    self.inner.next()?
                } else {
                    // jump straight to the mandatory prefix block
                    self.inner.seek_ceil(&self.prefix)? != SeekStatus::End
                }
            } else {
                self.inner.next()?
            };
            if !positioned {
                self.exhausted = true;
                return Ok(false);
            }
            let Some(term) = self.inner.term() else {
                self.exhausted = true;
                return Ok(false);
            };
            if !self.prefix.is_empty() && !term.starts_with(&self.prefix) {
                if term > self.prefix.as_slice() {
                    // sorted terms have left the prefix block for good
                    self.exhausted = true;
                    return Ok(false);
                }
                continue;
            }
            if let Some(d) = self.distance(term) {
                let boost = self.boost_of(term, d);
                self.current_boost = boost;
                return Ok(true);
            }
        }
    }

    fn seek_ceil(&mut self, _target: &[u8]) -> Result<SeekStatus> {
        Err(Error::new(
            ErrorKind::UnsupportedOperation,
            "fuzzy terms enum does not support seeking".to_string(),
        ))
    }

    fn seek_exact(&mut self, _target: &[u8]) -> Result<bool> {
        Err(Error::new(
            ErrorKind::UnsupportedOperation,
            "fuzzy terms enum does not support seeking".to_string(),
        ))
    }

    fn term(&self) -> Option<&[u8]> {
        self.inner.term()
    }

    fn ord(&self) -> Option<usize> {
        self.inner.ord()
    }

    fn doc_freq(&self) -> u32 {
        self.inner.doc_freq()
    }

    fn total_term_freq(&self) -> u64 {
        self.inner.total_term_freq()
    }

    fn boost(&self) -> f32 {
        self.current_boost
    }

    fn set_max_non_competitive_boost(&mut self, boost: f32) {
        // The best boost any term at distance d can reach is 1 - d/query_len
        // (when the candidate is at least as long as the query). Edit levels
        // whose ceiling falls below the bar can be dropped entirely.
        if self.query_chars == 0 {
            return;
        }
        while self.effective_max_edits > 0 {
            let ceiling = 1.0 - self.effective_max_edits as f32 / self.query_chars as f32;
            if ceiling < boost {
                self.effective_max_edits -= 1;
            } else {
                break;
            }
        }
    }
}
