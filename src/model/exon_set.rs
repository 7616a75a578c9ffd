use crate::types::Interval;

/// Ordered collection of intervals on one chromosome/strand.
///
/// After [`ExonSet::merge`] the intervals are sorted by start, pairwise
/// non-overlapping and non-adjacent. `total_length` always matches the
/// current interval list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExonSet {
    intervals: Vec<Interval>,
    total_length: u64,
    merged: bool,
}

impl ExonSet {
    pub fn new() -> Self {
        Self {
            intervals: Vec::new(),
            total_length: 0,
            // the empty set is trivially a minimal cover
            merged: true,
        }
    }

    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        let total_length = intervals.iter().map(|iv| iv.len()).sum();
        Self {
            merged: intervals.is_empty(),
            intervals,
            total_length,
        }
    }

    pub fn push(&mut self, iv: Interval) {
        self.total_length += iv.len();
        self.intervals.push(iv);
        self.merged = false;
    }

    pub fn extend<I: IntoIterator<Item = Interval>>(&mut self, it: I) {
        for iv in it {
            self.push(iv);
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn is_merged(&self) -> bool {
        self.merged
    }

    /// Outer bounds (first start, max end).
    pub fn span(&self) -> Option<Interval> {
        let start = self.intervals.iter().map(|iv| iv.start).min()?;
        let end = self.intervals.iter().map(|iv| iv.end).max()?;
        Some(Interval { start, end })
    }

    /// Collapse to the minimal cover: sort by (start, end), then fold every
    /// interval that overlaps or abuts the running one into it.
    pub fn merge(&mut self) {
        if self.merged {
            return;
        }
        if self.intervals.is_empty() {
            self.merged = true;
            return;
        }

        self.intervals.sort_by_key(|iv| (iv.start, iv.end));

        let mut merged: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        let mut cur = self.intervals[0];

        for &iv in &self.intervals[1..] {
            if iv.start <= cur.end.saturating_add(1) {
                cur.end = cur.end.max(iv.end);
            } else {
                merged.push(cur);
                cur = iv;
            }
        }
        merged.push(cur);

        self.total_length = merged.iter().map(|iv| iv.len()).sum();
        self.intervals = merged;
        self.merged = true;
    }

    /// Consuming variant of [`ExonSet::merge`].
    pub fn merged(mut self) -> Self {
        self.merge();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ivs: &[(u32, u32)]) -> ExonSet {
        ExonSet::from_intervals(ivs.iter().map(|&(s, e)| Interval::new(s, e)).collect())
    }

    #[test]
    fn merge_folds_overlapping_and_adjacent() {
        let mut s = set(&[(200, 210), (100, 120), (110, 130), (131, 140), (300, 300)]);
        assert_eq!(s.total_length(), 11 + 21 + 21 + 10 + 1);

        s.merge();
        assert_eq!(
            s.intervals(),
            &[Interval::new(100, 140), Interval::new(200, 210), Interval::new(300, 300)]
        );
        assert_eq!(s.total_length(), 41 + 11 + 1);
    }

    #[test]
    fn merge_keeps_one_base_gap() {
        let s = set(&[(10, 20), (22, 30)]).merged();
        assert_eq!(s.len(), 2);
        assert_eq!(s.total_length(), 11 + 9);
    }

    #[test]
    fn merge_is_idempotent() {
        let once = set(&[(5, 9), (1, 3), (4, 4), (20, 25), (22, 40)]).merged();
        let mut twice = ExonSet::from_intervals(once.intervals().to_vec());
        twice.merge();
        assert_eq!(once.intervals(), twice.intervals());
        assert_eq!(once.total_length(), twice.total_length());
    }

    #[test]
    fn merged_length_never_exceeds_input() {
        let raw = set(&[(1, 10), (12, 20)]);
        let before = raw.total_length();
        let after = raw.merged().total_length();
        assert_eq!(before, after);

        let raw = set(&[(1, 10), (11, 20)]);
        let before = raw.total_length();
        let after = raw.merged().total_length();
        // adjacency does not shrink length, only overlap does
        assert_eq!(before, after);

        let raw = set(&[(1, 10), (5, 20)]);
        assert!(raw.clone().merged().total_length() < raw.total_length());
    }

    #[test]
    fn span_of_unmerged_set() {
        let s = set(&[(50, 60), (10, 100), (20, 30)]);
        assert_eq!(s.span(), Some(Interval::new(10, 100)));
        assert_eq!(ExonSet::new().span(), None);
    }
}
