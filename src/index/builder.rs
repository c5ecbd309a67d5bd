use std::collections::{BTreeMap, HashMap};

use fst::MapBuilder;
use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::postings::{Posting, PostingList};
use crate::index::segment::{FieldReader, SegmentReader, TermEntry};
use crate::query::numeric::{f32_to_sortable, f64_to_sortable, prefix_coded_i32, prefix_coded_i64};

pub const DEFAULT_PRECISION_STEP: u32 = 4;

#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

/// One document to ingest. Field order does not matter.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub fields: Vec<(String, FieldValue)>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Vec::new() }
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.fields
            .push((field.to_string(), FieldValue::Text(value.to_string())));
        self
    }

    pub fn i32(mut self, field: &str, value: i32) -> Self {
        self.fields.push((field.to_string(), FieldValue::I32(value)));
        self
    }

    pub fn i64(mut self, field: &str, value: i64) -> Self {
        self.fields.push((field.to_string(), FieldValue::I64(value)));
        self
    }

    pub fn f32(mut self, field: &str, value: f32) -> Self {
        self.fields.push((field.to_string(), FieldValue::F32(value)));
        self
    }

    pub fn f64(mut self, field: &str, value: f64) -> Self {
        self.fields.push((field.to_string(), FieldValue::F64(value)));
        self
    }
}

struct FieldBuilder {
    terms: BTreeMap<Vec<u8>, PostingList>,
    has_positions: bool,
    doc_count: u32,
    last_counted: DocId,
}

impl FieldBuilder {
    fn new(has_positions: bool) -> Self {
        FieldBuilder {
            terms: BTreeMap::new(),
            has_positions,
            doc_count: 0,
            last_counted: -1,
        }
    }

    fn count_doc(&mut self, doc: DocId) {
        if self.last_counted != doc {
            self.last_counted = doc;
            self.doc_count += 1;
        }
    }
}

/// In-memory segment construction: whitespace-tokenized text fields with
/// positions and 1/sqrt(len) norms, numeric fields indexed as a trie of
/// prefix-coded terms at every precision shift.
pub struct SegmentBuilder {
    fields: HashMap<String, FieldBuilder>,
    precision_steps: HashMap<String, u32>,
    next_doc: DocId,
    deleted: RoaringBitmap,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuilder {
    pub fn new() -> Self {
        SegmentBuilder {
            fields: HashMap::new(),
            precision_steps: HashMap::new(),
            next_doc: 0,
            deleted: RoaringBitmap::new(),
        }
    }

    /// Must match the step used by numeric range queries on the same field.
    pub fn set_precision_step(&mut self, field: &str, step: u32) {
        self.precision_steps.insert(field.to_string(), step.max(1));
    }

    fn precision_step(&self, field: &str) -> u32 {
        self.precision_steps
            .get(field)
            .copied()
            .unwrap_or(DEFAULT_PRECISION_STEP)
    }

    pub fn add(&mut self, doc: Document) -> DocId {
        let doc_id = self.next_doc;
        self.next_doc += 1;
        for (field, value) in doc.fields {
            match value {
                FieldValue::Text(text) => self.add_text(doc_id, &field, &text),
                FieldValue::I32(v) => self.add_trie_terms(doc_id, &field, v as i64, 32),
                FieldValue::I64(v) => self.add_trie_terms(doc_id, &field, v, 64),
                FieldValue::F32(v) => {
                    self.add_trie_terms(doc_id, &field, f32_to_sortable(v) as i64, 32)
                }
                FieldValue::F64(v) => self.add_trie_terms(doc_id, &field, f64_to_sortable(v), 64),
            }
        }
        doc_id
    }

    fn add_text(&mut self, doc_id: DocId, field: &str, text: &str) {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }
        let norm = 1.0 / (tokens.len() as f32).sqrt();

        // Group positions by term
        let mut term_positions: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for (pos, token) in tokens.iter().enumerate() {
            term_positions.entry(token).or_default().push(pos as u32);
        }

        let fb = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldBuilder::new(true));
        fb.has_positions = true;
        fb.count_doc(doc_id);
        for (term, positions) in term_positions {
            let posting = Posting {
                doc_id,
                term_freq: positions.len() as u32,
                positions,
                field_norm: norm,
            };
            fb.terms
                .entry(term.as_bytes().to_vec())
                .or_default()
                .add_posting(posting);
        }
    }

    fn add_trie_terms(&mut self, doc_id: DocId, field: &str, sortable: i64, bits: u32) {
        let step = self.precision_step(field);
        let fb = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldBuilder::new(false));
        fb.count_doc(doc_id);
        let mut shift = 0;
        while shift < bits {
            let bytes = if bits == 64 {
                prefix_coded_i64(sortable, shift)
            } else {
                prefix_coded_i32(sortable as i32, shift)
            };
            let posting = Posting {
                doc_id,
                term_freq: 1,
                positions: Vec::new(),
                field_norm: 1.0,
            };
            fb.terms.entry(bytes).or_default().add_posting(posting);
            shift += step;
        }
    }

    pub fn delete_doc(&mut self, doc: DocId) {
        if doc >= 0 && doc < self.next_doc {
            self.deleted.insert(doc as u32);
        }
    }

    pub fn build(self) -> Result<SegmentReader> {
        let mut fields = HashMap::with_capacity(self.fields.len());
        for (name, fb) in self.fields {
            let mut terms = Vec::with_capacity(fb.terms.len());
            let mut entries = Vec::with_capacity(fb.terms.len());
            let mut postings = Vec::with_capacity(fb.terms.len());
            let mut sum_doc_freq = 0u64;
            let mut sum_total_term_freq = 0u64;
            let mut map_builder = MapBuilder::memory();
            for (ord, (term, list)) in fb.terms.into_iter().enumerate() {
                let doc_freq = list.doc_freq();
                let total_term_freq = list.total_freq();
                sum_doc_freq += doc_freq as u64;
                sum_total_term_freq += total_term_freq;
                map_builder.insert(&term, ord as u64)?;
                terms.push(term);
                entries.push(TermEntry {
                    doc_freq,
                    total_term_freq,
                });
                postings.push(list);
            }
            let map = fst::Map::new(map_builder.into_inner()?)?;
            fields.insert(
                name,
                FieldReader {
                    terms,
                    entries,
                    postings,
                    map,
                    has_positions: fb.has_positions,
                    sum_doc_freq,
                    sum_total_term_freq,
                    doc_count: fb.doc_count,
                },
            );
        }
        let live_docs = if self.deleted.is_empty() {
            None
        } else {
            let mut live = RoaringBitmap::new();
            live.insert_range(0..self.next_doc as u32);
            live -= &self.deleted;
            Some(live)
        };
        Ok(SegmentReader {
            fields,
            max_doc: self.next_doc,
            live_docs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::terms::TermsEnum;

    #[test]
    fn text_field_records_positions_and_norm() {
        let mut builder = SegmentBuilder::new();
        builder.add(Document::new().text("body", "to be or not to be"));
        let segment = builder.build().unwrap();
        let field = segment.field("body").unwrap();
        assert!(field.has_positions);

        let ord = field.term_ord(b"to").unwrap();
        let posting = &field.postings_by_ord(ord).postings[0];
        assert_eq!(posting.term_freq, 2);
        assert_eq!(posting.positions, vec![0, 4]);
        let expected_norm = 1.0 / 6f32.sqrt();
        assert!((posting.field_norm - expected_norm).abs() < 1e-6);
    }

    #[test]
    fn terms_come_back_sorted() {
        let mut builder = SegmentBuilder::new();
        builder.add(Document::new().text("body", "cherry apple banana"));
        let segment = builder.build().unwrap();
        let field = segment.field("body").unwrap();
        let mut iter = field.iter();
        let mut seen = Vec::new();
        while iter.next().unwrap() {
            seen.push(iter.term().unwrap().to_vec());
        }
        assert_eq!(seen, vec![b"apple".to_vec(), b"banana".to_vec(), b"cherry".to_vec()]);
    }

    #[test]
    fn deleted_docs_become_live_bitmap() {
        let mut builder = SegmentBuilder::new();
        builder.add(Document::new().text("body", "a"));
        builder.add(Document::new().text("body", "a"));
        builder.delete_doc(0);
        let segment = builder.build().unwrap();
        assert_eq!(segment.max_doc, 2);
        assert_eq!(segment.num_docs(), 1);
        assert!(segment.live_docs().unwrap().contains(1));
        assert!(!segment.live_docs().unwrap().contains(0));
    }

    #[test]
    fn numeric_field_indexes_every_shift() {
        let mut builder = SegmentBuilder::new();
        builder.set_precision_step("price", 8);
        builder.add(Document::new().i64("price", 42));
        let segment = builder.build().unwrap();
        let field = segment.field("price").unwrap();
        assert!(!field.has_positions);
        // 64 bits at step 8 -> 8 trie terms
        assert_eq!(field.terms.len(), 8);
    }
}
