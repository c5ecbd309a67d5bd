use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::{DocId, NO_MORE_DOCS};
use crate::scoring::similarity::Similarity;
use crate::search::phrase::{advance_to_aligned, PhrasePostings};
use crate::search::scorer::{DocIdIterator, Scorer};

// Queue key: (phrase-start position, slot offset, slot ord), payload = slot
// index into the arena. Keys are snapshots; a slot advanced while queued is
// popped by its stale key and re-added fresh.
struct PhraseQueue {
    heap: BinaryHeap<Reverse<(i64, u32, usize, usize)>>,
}

impl PhraseQueue {
    fn new() -> Self {
        PhraseQueue {
            heap: BinaryHeap::new(),
        }
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn push(&mut self, position: i64, offset: u32, ord: usize, slot: usize) {
        self.heap.push(Reverse((position, offset, ord, slot)));
    }

    fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|Reverse((_, _, _, slot))| slot)
    }

    fn top_position(&self) -> i64 {
        self.heap
            .peek()
            .map(|Reverse((pos, _, _, _))| *pos)
            .unwrap_or(i64::MAX)
    }
}

/// Phrase matcher tolerating up to `slop` transpositions. Slots live in an
/// arena of parallel arrays and a priority queue repeatedly tightens the
/// span between the earliest and latest phrase starts. Slots sharing a term
/// form repeat groups; colliding group members are pushed apart by always
/// advancing the lesser one so no valid permutation is skipped.
pub struct SloppyPhraseScorer<'a> {
    pps: Vec<PhrasePostings<'a>>,
    slop: i64,
    // per-slot match state, parallel to pps
    position: Vec<i64>,
    count: Vec<u32>,
    idx: Vec<usize>,
    rpt_group: Vec<i32>,
    rpt_ind: Vec<usize>,
    rpt_groups: Vec<Vec<usize>>,
    rpt_stack: Vec<usize>,
    checked_rpts: bool,
    has_rpts: bool,
    has_multi_term_rpts: bool,
    pq: PhraseQueue,
    end: i64,
    doc: DocId,
    sloppy_freq: f32,
    num_matches: u32,
    similarity: Arc<dyn Similarity>,
    value: f32,
}

impl<'a> SloppyPhraseScorer<'a> {
    pub fn new(
        mut pps: Vec<PhrasePostings<'a>>,
        slop: u32,
        similarity: Arc<dyn Similarity>,
        value: f32,
    ) -> Self {
        pps.sort_by_key(PhrasePostings::cost);
        let n = pps.len();
        SloppyPhraseScorer {
            pps,
            slop: slop as i64,
            position: vec![0; n],
            count: vec![0; n],
            idx: vec![0; n],
            rpt_group: vec![-1; n],
            rpt_ind: vec![0; n],
            rpt_groups: Vec::new(),
            rpt_stack: vec![0; n],
            checked_rpts: false,
            has_rpts: false,
            has_multi_term_rpts: false,
            pq: PhraseQueue::new(),
            end: i64::MIN,
            doc: -1,
            sloppy_freq: 0.0,
            num_matches: 0,
            similarity,
            value,
        }
    }

    fn tp_pos(&self, slot: usize) -> i64 {
        self.position[slot] + self.pps[slot].offset as i64
    }

    fn next_position(&mut self, slot: usize) -> bool {
        if self.count[slot] == 0 {
            return false;
        }
        self.count[slot] -= 1;
        self.position[slot] =
            self.pps[slot].positions[self.idx[slot]] as i64 - self.pps[slot].offset as i64;
        self.idx[slot] += 1;
        true
    }

    fn first_position(&mut self, slot: usize) {
        self.count[slot] = self.pps[slot].positions.len() as u32;
        self.idx[slot] = 0;
        self.next_position(slot);
    }

    fn advance_slot(&mut self, slot: usize) -> bool {
        if !self.next_position(slot) {
            return false;
        }
        if self.position[slot] > self.end {
            self.end = self.position[slot];
        }
        true
    }

    fn place_first_positions(&mut self) {
        for slot in 0..self.pps.len() {
            self.first_position(slot);
        }
    }

    fn fill_queue(&mut self) {
        self.pq.clear();
        for slot in 0..self.pps.len() {
            if self.position[slot] > self.end {
                self.end = self.position[slot];
            }
            self.pq.push(
                self.position[slot],
                self.pps[slot].offset,
                self.pps[slot].ord,
                slot,
            );
        }
    }

    /// Index of another slot in the same repeat group holding the same
    /// token position, if any.
    fn collide(&self, slot: usize) -> Option<usize> {
        let tp = self.tp_pos(slot);
        let group = &self.rpt_groups[self.rpt_group[slot] as usize];
        group
            .iter()
            .copied()
            .find(|&other| other != slot && self.tp_pos(other) == tp)
    }

    fn lesser(&self, a: usize, b: usize) -> usize {
        if self.position[a] < self.position[b]
            || (self.position[a] == self.position[b]
                && self.pps[a].offset < self.pps[b].offset)
        {
            a
        } else {
            b
        }
    }

    /// Resolve collisions for the slot just advanced, re-queuing every group
    /// member moved while it sat in the queue. Returns false once a slot
    /// runs out of positions.
    fn advance_rpts(&mut self, slot: usize) -> bool {
        if self.rpt_group[slot] < 0 {
            return true; // not a repeater
        }
        let group_idx = self.rpt_group[slot] as usize;
        let group_len = self.rpt_groups[group_idx].len();
        let mut requeue = vec![false; group_len];
        let k0 = self.rpt_ind[slot];
        let mut cur = slot;
        while let Some(other) = self.collide(cur) {
            let other_ind = self.rpt_ind[other];
            cur = self.lesser(cur, other);
            if !self.advance_slot(cur) {
                return false;
            }
            if other_ind != k0 {
                requeue[other_ind] = true;
            }
        }
        // drain the queue until every moved member was seen, then re-add
        // everything popped with fresh positions
        let mut n = 0;
        let mut remaining = requeue.iter().filter(|&&b| b).count();
        while remaining > 0 {
            match self.pq.pop() {
                Some(popped) => {
                    self.rpt_stack[n] = popped;
                    n += 1;
                    if self.rpt_group[popped] as usize == group_idx
                        && requeue[self.rpt_ind[popped]]
                    {
                        requeue[self.rpt_ind[popped]] = false;
                        remaining -= 1;
                    }
                }
                None => break,
            }
        }
        for i in (0..n).rev() {
            let s = self.rpt_stack[i];
            self.pq
                .push(self.position[s], self.pps[s].offset, self.pps[s].ord, s);
        }
        true
    }

    /// Repeating term ordinals, in first-seen order.
    fn repeating_terms(&mut self) -> Vec<u32> {
        let mut counts: HashMap<u32, u32> = HashMap::new();
        let mut order: Vec<u32> = Vec::new();
        for pp in &self.pps {
            for t in pp.terms.iter() {
                let c = counts.entry(t).or_insert(0);
                *c += 1;
                if *c == 1 {
                    order.push(t);
                }
            }
        }
        order.retain(|t| counts[t] > 1);
        order
    }

    fn repeating_slots(&mut self, rpt_terms: &[u32]) -> Vec<usize> {
        let mut out = Vec::new();
        for (slot, pp) in self.pps.iter().enumerate() {
            if rpt_terms.iter().any(|&t| pp.terms.contains(t)) {
                self.has_multi_term_rpts |= pp.terms.len() > 1;
                out.push(slot);
            }
        }
        out
    }

    fn gather_rpt_groups(&mut self, rpt_terms: &[u32]) -> Vec<Vec<usize>> {
        let rpp = self.repeating_slots(rpt_terms);
        let mut groups: Vec<Vec<usize>> = Vec::new();
        if !self.has_multi_term_rpts {
            // single terms per slot: group by equal token position in this doc
            for i in 0..rpp.len() {
                let a = rpp[i];
                if self.rpt_group[a] >= 0 {
                    continue;
                }
                let tp = self.tp_pos(a);
                for &b in &rpp[i + 1..] {
                    if self.rpt_group[b] >= 0 || self.tp_pos(b) != tp {
                        continue;
                    }
                    let g = if self.rpt_group[a] < 0 {
                        let g = groups.len();
                        self.rpt_group[a] = g as i32;
                        groups.push(vec![a]);
                        g
                    } else {
                        self.rpt_group[a] as usize
                    };
                    self.rpt_group[b] = g as i32;
                    groups[g].push(b);
                }
            }
        } else {
            // multi-term slots: union slots transitively by shared repeating terms
            let rpt_set: RoaringBitmap = rpt_terms.iter().copied().collect();
            let mut bitsets: Vec<RoaringBitmap> = rpp
                .iter()
                .map(|&slot| &self.pps[slot].terms & &rpt_set)
                .collect();
            // merge overlapping term sets
            let mut i = 0;
            while i + 1 < bitsets.len() {
                let mut merged = false;
                let mut j = i + 1;
                while j < bitsets.len() {
                    if bitsets[i].is_disjoint(&bitsets[j]) {
                        j += 1;
                    } else {
                        let other = bitsets.remove(j);
                        bitsets[i] |= other;
                        merged = true;
                    }
                }
                if !merged {
                    i += 1;
                }
            }
            groups = vec![Vec::new(); bitsets.len()];
            for &slot in &rpp {
                let slot_terms = &self.pps[slot].terms & &rpt_set;
                for (g, bits) in bitsets.iter().enumerate() {
                    if !bits.is_disjoint(&slot_terms) {
                        self.rpt_group[slot] = g as i32;
                        groups[g].push(slot);
                        break;
                    }
                }
            }
        }
        groups
    }

    fn sort_rpt_groups(&mut self, mut groups: Vec<Vec<usize>>) {
        for group in &mut groups {
            group.sort_by_key(|&slot| self.pps[slot].offset);
            for (ind, &slot) in group.iter().enumerate() {
                self.rpt_ind[slot] = ind;
            }
        }
        self.rpt_groups = groups;
    }

    fn advance_repeat_groups(&mut self) -> bool {
        for g in 0..self.rpt_groups.len() {
            if self.has_multi_term_rpts {
                let mut i = 0;
                while i < self.rpt_groups[g].len() {
                    let mut step = 1;
                    let mut cur = self.rpt_groups[g][i];
                    while let Some(other) = self.collide(cur) {
                        let other_ind = self.rpt_ind[other];
                        cur = self.lesser(cur, other);
                        if !self.advance_slot(cur) {
                            return false;
                        }
                        if other_ind < i {
                            // moved a slot settled earlier, rescan
                            step = 0;
                            break;
                        }
                    }
                    i += step;
                    if step == 0 {
                        i = 0;
                    }
                }
            } else {
                // all slots in the group carry the same term: stagger them
                // over successive occurrences
                for j in 1..self.rpt_groups[g].len() {
                    let slot = self.rpt_groups[g][j];
                    for _ in 0..j {
                        if !self.next_position(slot) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn init_first_time(&mut self) -> bool {
        self.checked_rpts = true;
        self.place_first_positions();
        let rpt_terms = self.repeating_terms();
        self.has_rpts = !rpt_terms.is_empty();
        if self.has_rpts {
            let groups = self.gather_rpt_groups(&rpt_terms);
            self.sort_rpt_groups(groups);
            if !self.advance_repeat_groups() {
                return false;
            }
        }
        self.fill_queue();
        true
    }

    fn init_simple(&mut self) {
        self.pq.clear();
        self.place_first_positions();
        self.fill_queue();
    }

    fn init_complex(&mut self) -> bool {
        self.place_first_positions();
        if !self.advance_repeat_groups() {
            return false;
        }
        self.fill_queue();
        true
    }

    fn init_phrase_positions(&mut self) -> bool {
        self.end = i64::MIN;
        if !self.checked_rpts {
            return self.init_first_time();
        }
        if !self.has_rpts {
            self.init_simple();
            return true;
        }
        self.init_complex()
    }

    fn phrase_freq(&mut self) -> f32 {
        for pp in &mut self.pps {
            pp.load_positions();
        }
        if !self.init_phrase_positions() {
            return 0.0;
        }
        let mut freq = 0.0f32;
        self.num_matches = 0;
        let Some(mut pp) = self.pq.pop() else {
            return 0.0;
        };
        let mut match_length = self.end - self.position[pp];
        let mut next = self.pq.top_position();
        while self.advance_slot(pp) {
            if self.has_rpts && !self.advance_rpts(pp) {
                break; // slot exhausted while resolving collisions
            }
            if self.position[pp] > next {
                // current span cannot tighten further
                if match_length <= self.slop {
                    freq += self.similarity.slop_factor(match_length);
                    self.num_matches += 1;
                }
                self.pq
                    .push(self.position[pp], self.pps[pp].offset, self.pps[pp].ord, pp);
                let Some(popped) = self.pq.pop() else {
                    break;
                };
                pp = popped;
                next = self.pq.top_position();
                match_length = self.end - self.position[pp];
            } else {
                let len = self.end - self.position[pp];
                if len < match_length {
                    match_length = len;
                }
            }
        }
        if match_length <= self.slop {
            freq += self.similarity.slop_factor(match_length);
            self.num_matches += 1;
        }
        freq
    }

    fn next_match(&mut self, mut doc: DocId) -> Result<DocId> {
        loop {
            doc = advance_to_aligned(&mut self.pps, doc)?;
            if doc == NO_MORE_DOCS {
                self.doc = NO_MORE_DOCS;
                return Ok(NO_MORE_DOCS);
            }
            let freq = self.phrase_freq();
            if freq > 0.0 {
                self.doc = doc;
                self.sloppy_freq = freq;
                return Ok(doc);
            }
            doc = self.pps[0].next_doc()?;
        }
    }
}

impl DocIdIterator for SloppyPhraseScorer<'_> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next_doc(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        let doc = self.pps[0].next_doc()?;
        self.next_match(doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        if target <= self.doc {
            return Ok(self.doc);
        }
        let doc = self.pps[0].advance(target)?;
        self.next_match(doc)
    }
}

impl Scorer for SloppyPhraseScorer<'_> {
    fn score(&mut self) -> Result<f32> {
        let norm = self.pps[0].norm();
        Ok(self.similarity.score(self.sloppy_freq, self.value, norm))
    }

    fn freq(&self) -> u32 {
        self.num_matches
    }
}
