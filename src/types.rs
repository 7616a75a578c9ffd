use serde::{Deserialize, Serialize};
use std::fmt;

/// Genomic strand/orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    #[inline]
    pub fn is_compatible_with(self, other: Strand) -> bool {
        // "Unknown" is treated as compatible with either.
        self == Strand::Unknown || other == Strand::Unknown || self == other
    }

    #[inline]
    pub fn flip(self) -> Strand {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unknown => ".",
        };
        write!(f, "{s}")
    }
}

/// How read strand relates to gene strand when deciding overlap.
///
/// Numeric forms follow the usual library convention:
/// `0` ignore strand, `1` same strand, `-1` opposite strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strandedness {
    #[default]
    Unstranded,
    Same,
    Opposite,
}

impl Strandedness {
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Strandedness::Unstranded),
            1 => Some(Strandedness::Same),
            -1 => Some(Strandedness::Opposite),
            _ => None,
        }
    }

    /// Does a read on `read` strand count towards a gene on `gene` strand?
    #[inline]
    pub fn accepts(self, gene: Strand, read: Strand) -> bool {
        match self {
            Strandedness::Unstranded => true,
            Strandedness::Same => gene.is_compatible_with(read),
            Strandedness::Opposite => gene.is_compatible_with(read.flip()),
        }
    }

    /// Whether the strand-aware ambiguous footprint applies.
    #[inline]
    pub fn is_stranded(self) -> bool {
        self != Strandedness::Unstranded
    }
}

/// A contiguous genomic interval.
/// Coordinates are 1-based, inclusive: [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: u32,
    pub end: u32,
}

impl Interval {
    /// Create a new interval. Panics if start > end.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start <= end, "Interval requires start <= end");
        Self { start, end }
    }

    /// Fallible constructor for untrusted coordinates.
    pub fn try_new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    #[inline]
    pub fn len(self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    #[inline]
    pub fn overlaps(self, other: Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Overlapping or directly adjacent (no base in between).
    #[inline]
    pub fn touches(self, other: Interval) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }

    #[inline]
    pub fn contains(self, other: Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[inline]
    pub fn intersection(self, other: Interval) -> Option<Interval> {
        Interval::try_new(self.start.max(other.start), self.end.min(other.end))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}
