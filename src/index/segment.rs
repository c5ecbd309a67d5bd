use std::collections::HashMap;

use fst::Map;
use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::postings::PostingList;
use crate::index::term::Term;
use crate::index::terms::SegmentTermsEnum;

/// Per-term dictionary statistics, parallel to the sorted term array.
#[derive(Debug, Clone)]
pub struct TermEntry {
    pub doc_freq: u32,
    pub total_term_freq: u64,
}

/// One field's term dictionary: sorted terms, stats, posting lists, and an
/// fst map from term bytes to ordinal for exact lookups.
pub struct FieldReader {
    pub terms: Vec<Vec<u8>>,
    pub entries: Vec<TermEntry>,
    pub postings: Vec<PostingList>,
    pub map: Map<Vec<u8>>,
    pub has_positions: bool,
    pub sum_doc_freq: u64,
    pub sum_total_term_freq: u64,
    pub doc_count: u32, // docs that have this field
}

impl FieldReader {
    pub fn iter(&self) -> SegmentTermsEnum<'_> {
        SegmentTermsEnum::new(self)
    }

    pub fn term_ord(&self, term: &[u8]) -> Option<usize> {
        self.map.get(term).map(|v| v as usize)
    }

    pub fn postings_by_ord(&self, ord: usize) -> &PostingList {
        &self.postings[ord]
    }
}

/// A sealed batch of documents with dense ids starting at 0.
pub struct SegmentReader {
    pub fields: HashMap<String, FieldReader>,
    pub max_doc: DocId,
    pub live_docs: Option<RoaringBitmap>, // None when nothing is deleted
}

impl SegmentReader {
    pub fn field(&self, name: &str) -> Option<&FieldReader> {
        self.fields.get(name)
    }

    pub fn terms(&self, field: &str) -> Option<SegmentTermsEnum<'_>> {
        self.fields.get(field).map(FieldReader::iter)
    }

    pub fn live_docs(&self) -> Option<&RoaringBitmap> {
        self.live_docs.as_ref()
    }

    pub fn num_docs(&self) -> u32 {
        match &self.live_docs {
            Some(live) => live.len() as u32,
            None => self.max_doc as u32,
        }
    }
}

/// A segment plus its position inside the composite reader.
#[derive(Clone, Copy)]
pub struct SegmentContext<'a> {
    pub reader: &'a SegmentReader,
    pub ord: usize,
    pub doc_base: DocId,
}

/// Composite view over an ordered list of segments.
pub struct IndexReader {
    segments: Vec<SegmentReader>,
    doc_bases: Vec<DocId>,
    max_doc: DocId,
}

impl IndexReader {
    pub fn new(segments: Vec<SegmentReader>) -> Self {
        let mut doc_bases = Vec::with_capacity(segments.len());
        let mut base: DocId = 0;
        for seg in &segments {
            doc_bases.push(base);
            base += seg.max_doc;
        }
        IndexReader {
            segments,
            doc_bases,
            max_doc: base,
        }
    }

    pub fn max_doc(&self) -> DocId {
        self.max_doc
    }

    pub fn num_docs(&self) -> u32 {
        self.segments.iter().map(SegmentReader::num_docs).sum()
    }

    pub fn leaves(&self) -> Vec<SegmentContext<'_>> {
        self.segments
            .iter()
            .enumerate()
            .map(|(ord, reader)| SegmentContext {
                reader,
                ord,
                doc_base: self.doc_bases[ord],
            })
            .collect()
    }

    /// Segment containing the composite doc id, with its base.
    pub fn leaf_for_doc(&self, doc: DocId) -> Option<SegmentContext<'_>> {
        self.leaves()
            .into_iter()
            .rev()
            .find(|ctx| ctx.doc_base <= doc && doc < ctx.doc_base + ctx.reader.max_doc)
    }

    pub fn collection_statistics(&self, field: &str) -> CollectionStatistics {
        let mut stats = CollectionStatistics {
            field: field.to_string(),
            max_doc: self.max_doc as u64,
            doc_count: 0,
            sum_doc_freq: 0,
            sum_total_term_freq: 0,
        };
        for seg in &self.segments {
            if let Some(fr) = seg.field(field) {
                stats.doc_count += fr.doc_count as u64;
                stats.sum_doc_freq += fr.sum_doc_freq;
                stats.sum_total_term_freq += fr.sum_total_term_freq;
            }
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct CollectionStatistics {
    pub field: String,
    pub max_doc: u64,
    pub doc_count: u64,
    pub sum_doc_freq: u64,
    pub sum_total_term_freq: u64,
}

#[derive(Debug, Clone)]
pub struct TermStatistics {
    pub doc_freq: u64,
    pub total_term_freq: u64,
}

/// Where one term lives inside one segment.
#[derive(Debug, Clone, Copy)]
pub struct TermState {
    pub ord: usize,
    pub doc_freq: u32,
    pub total_term_freq: u64,
}

/// Per-reader resolution of a term: one optional state per segment plus
/// aggregated frequencies. Built once per weight and reused by every scorer.
#[derive(Debug, Clone)]
pub struct TermContext {
    pub states: Vec<Option<TermState>>,
    pub doc_freq: u64,
    pub total_term_freq: u64,
}

impl TermContext {
    pub fn build(reader: &IndexReader, term: &Term) -> Result<TermContext> {
        let mut states = Vec::with_capacity(reader.segments.len());
        let mut doc_freq = 0u64;
        let mut total_term_freq = 0u64;
        for seg in &reader.segments {
            let state = seg.field(&term.field).and_then(|fr| {
                fr.term_ord(&term.bytes).map(|ord| TermState {
                    ord,
                    doc_freq: fr.entries[ord].doc_freq,
                    total_term_freq: fr.entries[ord].total_term_freq,
                })
            });
            if let Some(s) = &state {
                doc_freq += s.doc_freq as u64;
                total_term_freq += s.total_term_freq;
            }
            states.push(state);
        }
        Ok(TermContext {
            states,
            doc_freq,
            total_term_freq,
        })
    }

    pub fn state(&self, segment_ord: usize) -> Option<&TermState> {
        self.states.get(segment_ord).and_then(Option::as_ref)
    }
}
