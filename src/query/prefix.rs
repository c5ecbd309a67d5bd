use crate::core::error::Result;
use crate::index::segment::SegmentReader;
use crate::index::terms::{AcceptStatus, FilteredTermsEnum, TermsEnum, TermsFilter};
use crate::query::multi_term::{MultiTermQuery, RewriteMethod};

/// Matches every term starting with a byte prefix.
#[derive(Debug, Clone)]
pub struct PrefixQuery {
    pub field: String,
    pub prefix: Vec<u8>,
    pub boost: f32,
    rewrite_method: RewriteMethod,
}

impl PrefixQuery {
    pub fn new(field: &str, prefix: &str) -> Self {
        PrefixQuery {
            field: field.to_string(),
            prefix: prefix.as_bytes().to_vec(),
            boost: 1.0,
            rewrite_method: RewriteMethod::constant_score_auto_default(),
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_rewrite_method(mut self, method: RewriteMethod) -> Self {
        self.rewrite_method = method;
        self
    }
}

impl MultiTermQuery for PrefixQuery {
    fn field(&self) -> &str {
        &self.field
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn rewrite_method(&self) -> RewriteMethod {
        self.rewrite_method.clone()
    }

    fn terms_enum<'a>(
        &self,
        segment: &'a SegmentReader,
    ) -> Result<Option<Box<dyn TermsEnum + 'a>>> {
        let Some(field) = segment.field(&self.field) else {
            return Ok(None);
        };
        Ok(Some(Box::new(FilteredTermsEnum::new(
            field.iter(),
            Box::new(PrefixFilter {
                prefix: self.prefix.clone(),
                seeded: false,
            }),
        ))))
    }
}

/// One seek to the prefix, then accept until the sorted terms leave the
/// prefix block.
struct PrefixFilter {
    prefix: Vec<u8>,
    seeded: bool,
}

impl TermsFilter for PrefixFilter {
    fn accept(&mut self, term: &[u8]) -> AcceptStatus {
        if term.starts_with(&self.prefix) {
            AcceptStatus::Yes
        } else {
            AcceptStatus::End
        }
    }

    fn next_seek_term(&mut self, _current: Option<&[u8]>) -> Option<Vec<u8>> {
        if self.seeded {
            None
        } else {
            self.seeded = true;
            Some(self.prefix.clone())
        }
    }
}
