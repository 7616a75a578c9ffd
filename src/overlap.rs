//! Pairwise interval intersection primitives.
//!
//! All functions expect their inputs ascending by start and internally
//! non-overlapping (a merged `ExonSet` footprint, or the aligned blocks of
//! one record). They run a two-pointer sweep in O(|a| + |b|).

use crate::model::exon_set::ExonSet;
use crate::types::{Interval, Strand};

/// Intersection intervals of two sorted, non-overlapping interval lists.
///
/// On overlap the intersection is emitted and the interval that ends first
/// is advanced (both on a tie); otherwise the one that starts earlier is.
pub fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        let x = a[i];
        let y = b[j];

        if let Some(hit) = x.intersection(y) {
            out.push(hit);
            match x.end.cmp(&y.end) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        } else if x.start < y.start {
            i += 1;
        } else {
            j += 1;
        }
    }

    out
}

/// Same sweep as [`intersect`], stopping at the first overlap.
pub fn any_overlap(a: &[Interval], b: &[Interval]) -> bool {
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        let x = a[i];
        let y = b[j];

        if x.overlaps(y) {
            return true;
        }
        if x.start < y.start {
            i += 1;
        } else {
            j += 1;
        }
    }

    false
}

/// Exon-level intersection of two footprints, ignoring strand.
pub fn intersect_unstranded(a: &ExonSet, b: &ExonSet) -> Vec<Interval> {
    debug_assert!(a.is_merged() && b.is_merged(), "footprints must be merged");
    intersect(a.intervals(), b.intervals())
}

/// Exon-level intersection restricted to footprints on the same strand.
pub fn intersect_stranded(a: &ExonSet, a_strand: Strand, b: &ExonSet, b_strand: Strand) -> Vec<Interval> {
    if a_strand != b_strand {
        return Vec::new();
    }
    intersect_unstranded(a, b)
}

/// Total base count covered by an intersection result.
pub fn overlap_length(a: &[Interval], b: &[Interval]) -> u64 {
    intersect(a, b).iter().map(|iv| iv.len()).sum()
}
