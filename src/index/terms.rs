use crate::core::error::{Error, ErrorKind, Result};
use crate::index::segment::FieldReader;

/// Outcome of `TermsEnum::seek_ceil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
    Found,
    NotFound,
    End,
}

/// Forward iterator over a field's sorted term dictionary.
///
/// `next` positions the enum and reports whether a term is available; `term`
/// and the statistics accessors read the current position. `boost` and
/// `set_max_non_competitive_boost` are the explicit channel between scoring
/// enums (fuzzy) and the top-terms rewrite; plain enums leave the defaults.
pub trait TermsEnum {
    fn next(&mut self) -> Result<bool>;
    fn seek_ceil(&mut self, target: &[u8]) -> Result<SeekStatus>;
    fn seek_exact(&mut self, target: &[u8]) -> Result<bool>;
    fn term(&self) -> Option<&[u8]>;
    fn ord(&self) -> Option<usize>;
    fn doc_freq(&self) -> u32;
    fn total_term_freq(&self) -> u64;

    /// Score the current term contributes when a rewrite turns it into a
    /// clause. 1.0 unless the enum ranks terms (fuzzy).
    fn boost(&self) -> f32 {
        1.0
    }

    /// Hint from a bounded rewrite queue: terms that cannot beat `boost`
    /// are no longer competitive. Values only ever decrease.
    fn set_max_non_competitive_boost(&mut self, _boost: f32) {}
}

/// TermsEnum over one field of a segment, backed by the sorted term array.
pub struct SegmentTermsEnum<'a> {
    field: &'a FieldReader,
    pos: isize, // -1 unpositioned, len() exhausted
}

impl<'a> SegmentTermsEnum<'a> {
    pub fn new(field: &'a FieldReader) -> Self {
        SegmentTermsEnum { field, pos: -1 }
    }

    pub fn field(&self) -> &'a FieldReader {
        self.field
    }
}

impl TermsEnum for SegmentTermsEnum<'_> {
    fn next(&mut self) -> Result<bool> {
        let len = self.field.terms.len() as isize;
        if self.pos < len {
            self.pos += 1;
        }
        Ok(self.pos < len)
    }

    fn seek_ceil(&mut self, target: &[u8]) -> Result<SeekStatus> {
        let pos = self
            .field
            .terms
            .partition_point(|t| t.as_slice() < target);
        self.pos = pos as isize;
        if pos == self.field.terms.len() {
            Ok(SeekStatus::End)
        } else if self.field.terms[pos] == target {
            Ok(SeekStatus::Found)
        } else {
            Ok(SeekStatus::NotFound)
        }
    }

    fn seek_exact(&mut self, target: &[u8]) -> Result<bool> {
        // fst lookup avoids the comparison walk for exact hits
        match self.field.map.get(target) {
            Some(ord) => {
                self.pos = ord as isize;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn term(&self) -> Option<&[u8]> {
        if self.pos >= 0 && (self.pos as usize) < self.field.terms.len() {
            Some(&self.field.terms[self.pos as usize])
        } else {
            None
        }
    }

    fn ord(&self) -> Option<usize> {
        if self.pos >= 0 && (self.pos as usize) < self.field.terms.len() {
            Some(self.pos as usize)
        } else {
            None
        }
    }

    fn doc_freq(&self) -> u32 {
        self.field.entries[self.pos as usize].doc_freq
    }

    fn total_term_freq(&self) -> u64 {
        self.field.entries[self.pos as usize].total_term_freq
    }
}

/// Verdicts a term filter hands back for each enumerated term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptStatus {
    Yes,
    YesAndSeek,
    No,
    NoAndSeek,
    End,
}

/// The accept/seek half of a filtered enumeration. `next_seek_term` is asked
/// for the first target before any term is visited (with `current` = None)
/// and again whenever `accept` returns an `*AndSeek` verdict.
pub trait TermsFilter {
    fn accept(&mut self, term: &[u8]) -> AcceptStatus;
    fn next_seek_term(&mut self, current: Option<&[u8]>) -> Option<Vec<u8>>;
}

/// Forward-only subset view of a segment's terms, driven by a `TermsFilter`.
///
/// Callers may only pull with `next`; random access would let a filter see
/// terms out of order, so `seek_ceil`/`seek_exact` refuse. Seek targets the
/// filter produces must be strictly increasing.
pub struct FilteredTermsEnum<'a> {
    inner: SegmentTermsEnum<'a>,
    filter: Box<dyn TermsFilter>,
    do_seek: bool,
    exhausted: bool,
    last_seek: Option<Vec<u8>>,
}

impl<'a> FilteredTermsEnum<'a> {
    pub fn new(inner: SegmentTermsEnum<'a>, filter: Box<dyn TermsFilter>) -> Self {
        FilteredTermsEnum {
            inner,
            filter,
            do_seek: true,
            exhausted: false,
            last_seek: None,
        }
    }
}

impl TermsEnum for FilteredTermsEnum<'_> {
    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        loop {
            if self.do_seek {
                self.do_seek = false;
                let current = self.inner.term().map(<[u8]>::to_vec);
                match self.filter.next_seek_term(current.as_deref()) {
                    Some(target) => {
                        if let Some(prev) = &self.last_seek {
                            if target <= *prev {
                                return Err(Error::new(
                                    ErrorKind::Internal,
                                    "filtered enum seek targets must be strictly increasing"
                                        .to_string(),
                                ));
                            }
                        }
                        self.last_seek = Some(target.clone());
                        if self.inner.seek_ceil(&target)? == SeekStatus::End {
                            self.exhausted = true;
                            return Ok(false);
                        }
                    }
                    None => {
                        self.exhausted = true;
                        return Ok(false);
                    }
                }
            } else if !self.inner.next()? {
                self.exhausted = true;
                return Ok(false);
            }

            let verdict = match self.inner.term() {
                Some(term) => self.filter.accept(term),
                None => AcceptStatus::End,
            };
            match verdict {
                AcceptStatus::Yes => return Ok(true),
                AcceptStatus::YesAndSeek => {
                    self.do_seek = true;
                    return Ok(true);
                }
                AcceptStatus::No => {}
                AcceptStatus::NoAndSeek => {
                    self.do_seek = true;
                }
                AcceptStatus::End => {
                    self.exhausted = true;
                    return Ok(false);
                }
            }
        }
    }

    fn seek_ceil(&mut self, _target: &[u8]) -> Result<SeekStatus> {
        Err(Error::new(
            ErrorKind::UnsupportedOperation,
            "filtered terms enum does not support seeking".to_string(),
        ))
    }

    fn seek_exact(&mut self, _target: &[u8]) -> Result<bool> {
        Err(Error::new(
            ErrorKind::UnsupportedOperation,
            "filtered terms enum does not support seeking".to_string(),
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
}
