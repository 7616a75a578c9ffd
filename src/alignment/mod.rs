//! Alignment records as seen by the counting engine.
//!
//! The engine never touches file bytes; anything that can produce
//! [`AlignmentRecord`] values in coordinate order can feed it. A BAM-backed
//! source lives in [`bam`].

pub mod bam;

use crate::types::{Interval, Strand};

/// SAM flag bits the engine cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFlags {
    pub unmapped: bool,
    pub duplicate: bool,
    pub secondary: bool,
}

/// One alignment in reference coordinates.
///
/// `blocks` are the aligned reference stretches, 1-based inclusive and
/// ascending; more than one block means a spliced or gapped alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub chrom: String,
    pub strand: Strand,
    pub blocks: Vec<Interval>,
    /// NH tag: number of reported placements of the read.
    pub multiplicity: Option<u32>,
    /// NM tag: edit distance to the reference.
    pub mismatches: Option<u32>,
    pub flags: RecordFlags,
}

impl AlignmentRecord {
    pub fn new(chrom: impl Into<String>, strand: Strand, blocks: Vec<Interval>) -> Self {
        Self {
            chrom: chrom.into(),
            strand,
            blocks,
            multiplicity: None,
            mismatches: None,
            flags: RecordFlags::default(),
        }
    }

    pub fn with_multiplicity(mut self, nh: u32) -> Self {
        self.multiplicity = Some(nh);
        self
    }

    pub fn with_mismatches(mut self, nm: u32) -> Self {
        self.mismatches = Some(nm);
        self
    }

    pub fn with_flags(mut self, flags: RecordFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Start of the first block and end of the last one.
    pub fn span(&self) -> Option<Interval> {
        let first = self.blocks.first()?;
        let last = self.blocks.last()?;
        Interval::try_new(first.start, last.end)
    }

    pub fn start(&self) -> Option<u32> {
        self.blocks.first().map(|b| b.start)
    }

    pub fn is_spliced(&self) -> bool {
        self.blocks.len() > 1
    }

    /// Blocks ascending and non-overlapping, as the overlap sweep needs.
    pub fn blocks_are_ordered(&self) -> bool {
        self.blocks.windows(2).all(|w| w[0].end < w[1].start)
    }
}
