use std::collections::VecDeque;
use std::fmt;

use crate::core::error::{Error, ErrorKind, Result};
use crate::index::segment::SegmentReader;
use crate::index::terms::{AcceptStatus, FilteredTermsEnum, TermsEnum, TermsFilter};
use crate::query::multi_term::{MultiTermQuery, RewriteMethod};

// Shift-marker bytes keep the 64-bit and 32-bit trie namespaces disjoint
// inside one field.
pub const SHIFT_START_I64: u8 = 0x20;
pub const SHIFT_START_I32: u8 = 0x60;

/// Map double bits to a signed value whose integer order matches float order.
pub fn f64_to_sortable(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    if bits < 0 { bits ^ 0x7fff_ffff_ffff_ffff } else { bits }
}

pub fn f32_to_sortable(value: f32) -> i32 {
    let bits = value.to_bits() as i32;
    if bits < 0 { bits ^ 0x7fff_ffff } else { bits }
}

/// Trie term for `value` with the lowest `shift` bits dropped: one marker
/// byte, then the remaining bits big-endian with the sign bit flipped so
/// byte order equals numeric order.
pub fn prefix_coded_i64(value: i64, shift: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    out.push(SHIFT_START_I64 + shift as u8);
    let sortable = ((value >> shift) as u64) ^ (1u64 << 63);
    out.extend_from_slice(&sortable.to_be_bytes());
    out
}

pub fn prefix_coded_i32(value: i32, shift: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    out.push(SHIFT_START_I32 + shift as u8);
    let sortable = ((value >> shift) as u32) ^ (1u32 << 31);
    out.extend_from_slice(&sortable.to_be_bytes());
    out
}

fn push_range(
    bounds: &mut Vec<(Vec<u8>, Vec<u8>)>,
    bits: u32,
    min: i128,
    max: i128,
    shift: u32,
) {
    let pair = if bits == 64 {
        (
            prefix_coded_i64(min as i64, shift),
            prefix_coded_i64(max as i64, shift),
        )
    } else {
        (
            prefix_coded_i32(min as i32, shift),
            prefix_coded_i32(max as i32, shift),
        )
    };
    bounds.push(pair);
}

/// Decompose `[min, max]` into the minimal set of trie ranges, each covering
/// its values at exactly one shift level. Pairs come out in increasing term
/// order: both bounds of a level before any bound of the next.
pub fn split_range(min: i64, max: i64, bits: u32, precision_step: u32) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut bounds = Vec::new();
    if min > max {
        return bounds;
    }
    let (lo, hi): (i128, i128) = if bits == 64 {
        (i64::MIN as i128, i64::MAX as i128)
    } else {
        (i32::MIN as i128, i32::MAX as i128)
    };
    // i128 arithmetic so stepping past the value domain is detectable
    // instead of wrapping.
    let mut min = min as i128;
    let mut max = max as i128;
    let mut shift = 0u32;
    loop {
        let diff: i128 = 1i128 << (shift + precision_step);
        let mask: i128 = ((1i128 << precision_step) - 1) << shift;
        let has_lower = (min & mask) != 0;
        let has_upper = (max & mask) != mask;
        let next_min = if has_lower { (min + diff) & !mask } else { min & !mask };
        let next_max = if has_upper { (max - diff) | mask } else { max | mask };
        if shift + precision_step >= bits
            || next_min > next_max
            || next_min > hi
            || next_max < lo
        {
            // remaining values fit one range at this level
            push_range(&mut bounds, bits, min, max, shift);
            break;
        }
        if has_lower {
            push_range(&mut bounds, bits, min, min | mask, shift);
        }
        if has_upper {
            push_range(&mut bounds, bits, max & !mask, max, shift);
        }
        min = next_min;
        max = next_max;
        shift += precision_step;
    }
    bounds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericType {
    I32,
    I64,
    F32,
    F64,
}

impl NumericType {
    fn bits(self) -> u32 {
        match self {
            NumericType::I32 | NumericType::F32 => 32,
            NumericType::I64 | NumericType::F64 => 64,
        }
    }
}

/// Range query over a trie-indexed numeric field. Bounds are held in the
/// sortable integer domain; constructors convert from the user-facing type.
#[derive(Clone)]
pub struct NumericRangeQuery {
    pub field: String,
    pub precision_step: u32,
    value_type: NumericType,
    min: Option<i64>, // sortable, None = open
    max: Option<i64>,
    min_inclusive: bool,
    max_inclusive: bool,
    pub boost: f32,
    rewrite_method: RewriteMethod,
}

impl fmt::Debug for NumericRangeQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "NumericRange({}:{:?}..{:?} step {})",
            self.field, self.min, self.max, self.precision_step
        )
    }
}

impl NumericRangeQuery {
    fn new(
        field: &str,
        precision_step: u32,
        value_type: NumericType,
        min: Option<i64>,
        max: Option<i64>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self> {
        if precision_step < 1 {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "precision step must be at least 1".to_string(),
            ));
        }
        Ok(NumericRangeQuery {
            field: field.to_string(),
            precision_step,
            value_type,
            min,
            max,
            min_inclusive,
            max_inclusive,
            boost: 1.0,
            rewrite_method: RewriteMethod::constant_score_auto_default(),
        })
    }

    pub fn new_i64(
        field: &str,
        precision_step: u32,
        min: Option<i64>,
        max: Option<i64>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self> {
        Self::new(field, precision_step, NumericType::I64, min, max, min_inclusive, max_inclusive)
    }

    pub fn new_i32(
        field: &str,
        precision_step: u32,
        min: Option<i32>,
        max: Option<i32>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self> {
        Self::new(
            field,
            precision_step,
            NumericType::I32,
            min.map(|v| v as i64),
            max.map(|v| v as i64),
            min_inclusive,
            max_inclusive,
        )
    }

    pub fn new_f64(
        field: &str,
        precision_step: u32,
        min: Option<f64>,
        max: Option<f64>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self> {
        Self::new(
            field,
            precision_step,
            NumericType::F64,
            min.map(f64_to_sortable),
            max.map(f64_to_sortable),
            min_inclusive,
            max_inclusive,
        )
    }

    pub fn new_f32(
        field: &str,
        precision_step: u32,
        min: Option<f32>,
        max: Option<f32>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Result<Self> {
        Self::new(
            field,
            precision_step,
            NumericType::F32,
            min.map(|v| f32_to_sortable(v) as i64),
            max.map(|v| f32_to_sortable(v) as i64),
            min_inclusive,
            max_inclusive,
        )
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_rewrite_method(mut self, method: RewriteMethod) -> Self {
        self.rewrite_method = method;
        self
    }

    /// Effective closed bounds in the sortable domain, None when empty.
    fn effective_bounds(&self) -> Option<(i64, i64)> {
        let bits = self.value_type.bits();
        let (domain_min, domain_max) = if bits == 64 {
            (i64::MIN, i64::MAX)
        } else {
            (i32::MIN as i64, i32::MAX as i64)
        };
        let mut min = self.min.unwrap_or(domain_min);
        if !self.min_inclusive && self.min.is_some() {
            if min == domain_max {
                return None;
            }
            min += 1;
        }
        let mut max = self.max.unwrap_or(domain_max);
        if !self.max_inclusive && self.max.is_some() {
            if max == domain_min {
                return None;
            }
            max -= 1;
        }
        if min > max { None } else { Some((min, max)) }
    }
}

impl MultiTermQuery for NumericRangeQuery {
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
        let Some((min, max)) = self.effective_bounds() else {
            return Ok(None);
        };
        let bounds = split_range(min, max, self.value_type.bits(), self.precision_step);
        if bounds.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(FilteredTermsEnum::new(
            field.iter(),
            Box::new(NumericBoundsFilter {
                bounds: bounds.into(),
                upper: None,
            }),
        ))))
    }
}

/// Walks the decomposed trie ranges: seek to each range's lower bound,
/// accept terms up to its upper bound, then hop to the next range.
struct NumericBoundsFilter {
    bounds: VecDeque<(Vec<u8>, Vec<u8>)>,
    upper: Option<Vec<u8>>,
}

impl TermsFilter for NumericBoundsFilter {
    fn accept(&mut self, term: &[u8]) -> AcceptStatus {
        match &self.upper {
            Some(upper) if term <= upper.as_slice() => AcceptStatus::Yes,
            Some(_) => AcceptStatus::NoAndSeek,
            None => AcceptStatus::End,
        }
    }

    fn next_seek_term(&mut self, _current: Option<&[u8]>) -> Option<Vec<u8>> {
        match self.bounds.pop_front() {
            Some((lower, upper)) => {
                self.upper = Some(upper);
                Some(lower)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sortable_doubles_preserve_order() {
        let values = [-1000.5, -1.0, -0.0, 0.0, 0.25, 3.5, 1e9];
        for w in values.windows(2) {
            assert!(
                f64_to_sortable(w[0]) <= f64_to_sortable(w[1]),
                "sortable order broke between {} and {}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn prefix_coded_terms_sort_numerically() {
        let values = [i64::MIN, -5, -1, 0, 1, 7, i64::MAX];
        for w in values.windows(2) {
            assert!(
                prefix_coded_i64(w[0], 0) < prefix_coded_i64(w[1], 0),
                "term order broke between {} and {}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn split_range_bounds_come_out_in_term_order() {
        let bounds = split_range(17, 91234, 64, 4);
        assert!(!bounds.is_empty());
        let mut last: Option<Vec<u8>> = None;
        for (lower, upper) in &bounds {
            assert!(lower <= upper);
            if let Some(prev) = &last {
                assert!(prev < lower, "ranges must be emitted in increasing term order");
            }
            last = Some(upper.clone());
        }
    }

    #[test]
    fn split_range_single_value() {
        let bounds = split_range(42, 42, 64, 4);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].0, bounds[0].1);
        assert_eq!(bounds[0].0, prefix_coded_i64(42, 0));
    }

    #[test]
    fn empty_range_yields_nothing() {
        assert!(split_range(10, 5, 64, 4).is_empty());
    }

    #[test]
    fn exclusive_bounds_tighten_the_range() {
        let q = NumericRangeQuery::new_i64("n", 4, Some(5), Some(7), false, false).unwrap();
        assert_eq!(q.effective_bounds(), Some((6, 6)));
        let empty = NumericRangeQuery::new_i64("n", 4, Some(5), Some(6), false, false).unwrap();
        assert_eq!(empty.effective_bounds(), None);
    }
}
