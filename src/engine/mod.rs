//! Streaming gene assignment.
//!
//! [`AssignmentEngine`] matches one alignment at a time against an
//! [`AnnotationIndex`] with a merge join: both the gene lists and the
//! alignment stream are coordinate-sorted, so per-chromosome and per-gene
//! cursors only ever move forward. [`Quantifier`] drives the engine over a
//! whole input, applies record filters and the multi-gene resolution mode,
//! and aggregates counts.

pub mod converge;
pub mod counts;
pub mod quantifier;
pub mod resolve;

pub use counts::{FileCounts, GeneCounts, RunSummary};
pub use quantifier::Quantifier;

use std::collections::HashSet;

use crate::alignment::AlignmentRecord;
use crate::error::CountError;
use crate::index::{AnnotationIndex, Cursors};
use crate::model::types::{ChrId, GeneId};
use crate::overlap;
use crate::types::{Interval, Strand, Strandedness};

/// Cursor-driven matcher of alignments to overlapping genes.
///
/// Owns its cursor set, so several engines may share one index.
#[derive(Debug)]
pub struct AssignmentEngine<'a> {
    index: &'a AnnotationIndex,
    cursors: Cursors,
    strandedness: Strandedness,
    order: SortOrderCheck,
    // last looked-up chromosome, records arrive grouped by it
    chr_cache: Option<(String, Option<ChrId>)>,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(index: &'a AnnotationIndex, strandedness: Strandedness) -> Self {
        debug_assert!(index.is_finalized(), "AnnotationIndex must be finalized before counting");
        Self {
            index,
            cursors: index.cursors(),
            strandedness,
            order: SortOrderCheck::default(),
            chr_cache: None,
        }
    }

    pub fn index(&self) -> &'a AnnotationIndex {
        self.index
    }

    pub fn strandedness(&self) -> Strandedness {
        self.strandedness
    }

    pub fn cursors(&self) -> &Cursors {
        &self.cursors
    }

    /// Rewind all cursors; required before streaming another input.
    pub fn reset(&mut self) {
        self.cursors.reset();
        self.order = SortOrderCheck::default();
        self.chr_cache = None;
    }

    /// Genes whose exons overlap the aligned blocks of `rec`.
    ///
    /// The result is ordered by gene (start, end) and may be empty.
    /// Records must arrive coordinate-sorted; a step backwards is reported
    /// as `UnsortedInput` when it is noticed.
    pub fn assign(&mut self, rec: &AlignmentRecord) -> Result<Vec<GeneId>, CountError> {
        let span = rec.span().ok_or_else(|| CountError::MalformedRecord {
            reason: format!("record on {} has no aligned blocks", rec.chrom),
        })?;
        if !rec.blocks_are_ordered() {
            return Err(CountError::MalformedRecord {
                reason: format!("blocks of record at {}:{} are not ascending", rec.chrom, span.start),
            });
        }

        self.order.observe(&rec.chrom, span.start)?;

        let chr_id = self.lookup_chr(&rec.chrom).ok_or_else(|| CountError::MissingGeneModel {
            chrom: rec.chrom.clone(),
        })?;

        Ok(self.overlapping_genes(chr_id, span, &rec.blocks, rec.strand))
    }

    fn lookup_chr(&mut self, chrom: &str) -> Option<ChrId> {
        match &self.chr_cache {
            Some((name, id)) if name == chrom => *id,
            _ => {
                let id = self.index.chr_id(chrom);
                self.chr_cache = Some((chrom.to_string(), id));
                id
            }
        }
    }

    fn overlapping_genes(&mut self, chr_id: ChrId, span: Interval, blocks: &[Interval], strand: Strand) -> Vec<GeneId> {
        let index = self.index;

        // genes ending before this alignment end before every later one too
        while let Some(gid) = self.cursors.current_gene(index, chr_id) {
            if index.genes[gid].end >= span.start {
                break;
            }
            self.cursors.advance_gene(index, chr_id);
        }

        let mut hits = Vec::new();
        let candidates = &index.genes_on(chr_id)[self.cursors.gene_offset(chr_id)..];
        for &gid in candidates {
            let gene = &index.genes[gid];
            if gene.start > span.end {
                break;
            }
            // a long gene before this one kept the cursor back
            if gene.end < span.start {
                continue;
            }
            if !self.strandedness.accepts(gene.strand, strand) {
                continue;
            }
            if self.exons_overlap(gid, blocks, span.start) {
                hits.push(gid);
            }
        }
        hits
    }

    fn exons_overlap(&mut self, gid: GeneId, blocks: &[Interval], aln_start: u32) -> bool {
        let index = self.index;
        let exons = index.genes[gid].exons();

        let mut e = self.cursors.current_exon_index(gid);
        while e < exons.len() && exons[e].end < aln_start {
            e = self.cursors.advance_exon(index, gid);
        }

        overlap::any_overlap(&exons[e..], blocks)
    }
}

/// Opportunistic detection of unsorted alignment streams.
///
/// Catches a start position going backwards on one chromosome and a
/// chromosome reappearing after another one began.
#[derive(Debug, Default)]
struct SortOrderCheck {
    current: Option<(String, u32)>,
    finished: HashSet<String>,
}

impl SortOrderCheck {
    fn observe(&mut self, chrom: &str, start: u32) -> Result<(), CountError> {
        match &mut self.current {
            Some((name, last)) if name == chrom => {
                if start < *last {
                    return Err(CountError::UnsortedInput {
                        chrom: chrom.to_string(),
                        position: start,
                        previous: format!("{name}:{last}"),
                    });
                }
                *last = start;
            }
            Some((name, last)) => {
                if self.finished.contains(chrom) {
                    return Err(CountError::UnsortedInput {
                        chrom: chrom.to_string(),
                        position: start,
                        previous: format!("{name}:{last}"),
                    });
                }
                self.finished.insert(std::mem::take(name));
                self.current = Some((chrom.to_string(), start));
            }
            None => self.current = Some((chrom.to_string(), start)),
        }
        Ok(())
    }
}
