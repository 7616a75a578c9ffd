use crate::model::exon_set::ExonSet;
use crate::model::transcript::Transcript;
use crate::model::types::{AmbiguityKind, ChrId, GeneId, TranscriptId};
use crate::types::{Interval, Strand};

/// Gene model: names, owned transcript ids and the derived footprints.
///
/// Notes:
/// - `names[0]` is treated as the primary name (if present).
/// - `footprint` is the merged union of all transcript exons and is rebuilt
///   by [`Gene::finalize`] whenever transcripts were added.
/// - the two ambiguous footprints are filled from outside by the
///   gene-vs-gene sweep in `AnnotationIndex`; before that sweep runs they
///   are empty and `exclusive_length` equals `total_length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub id: GeneId,
    pub names: Vec<String>,
    pub chr_id: ChrId,
    pub strand: Strand,
    pub start: u32,
    pub end: u32,
    transcript_ids: Vec<TranscriptId>,
    footprint: ExonSet,
    ambiguous_stranded: ExonSet,
    ambiguous_unstranded: ExonSet,
}

impl Gene {
    pub fn new(id: GeneId, primary_name: impl Into<String>, chr_id: ChrId, strand: Strand) -> Self {
        Self {
            id,
            names: vec![primary_name.into()],
            chr_id,
            strand,
            start: u32::MAX,
            end: 0,
            transcript_ids: Vec::new(),
            footprint: ExonSet::new(),
            ambiguous_stranded: ExonSet::new(),
            ambiguous_unstranded: ExonSet::new(),
        }
    }

    /// Add an alias/alternative name (deduped).
    pub fn add_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    /// Primary name (if any).
    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|s| s.as_str())
    }

    /// Attach a transcript: its exons join the footprint and widen the span.
    pub fn add_transcript(&mut self, tx: &Transcript) {
        self.transcript_ids.push(tx.id);
        for &exon in tx.exons().intervals() {
            self.start = self.start.min(exon.start);
            self.end = self.end.max(exon.end);
            self.footprint.push(exon);
        }
    }

    pub fn transcript_ids(&self) -> &[TranscriptId] {
        &self.transcript_ids
    }

    /// Sort transcript IDs, remove duplicates and merge the footprint.
    pub fn finalize(&mut self) {
        self.transcript_ids.sort_unstable();
        self.transcript_ids.dedup();
        self.footprint.merge();
    }

    pub fn span(&self) -> Option<Interval> {
        Interval::try_new(self.start, self.end)
    }

    /// Non-redundant exonic footprint (merged union of transcript exons).
    pub fn footprint(&self) -> &ExonSet {
        &self.footprint
    }

    pub fn exons(&self) -> &[Interval] {
        self.footprint.intervals()
    }

    pub fn total_length(&self) -> u64 {
        self.footprint.total_length()
    }

    pub fn ambiguous(&self, kind: AmbiguityKind) -> &ExonSet {
        match kind {
            AmbiguityKind::Stranded => &self.ambiguous_stranded,
            AmbiguityKind::Unstranded => &self.ambiguous_unstranded,
        }
    }

    pub(crate) fn ambiguous_mut(&mut self, kind: AmbiguityKind) -> &mut ExonSet {
        match kind {
            AmbiguityKind::Stranded => &mut self.ambiguous_stranded,
            AmbiguityKind::Unstranded => &mut self.ambiguous_unstranded,
        }
    }

    pub(crate) fn clear_ambiguous(&mut self) {
        self.ambiguous_stranded = ExonSet::new();
        self.ambiguous_unstranded = ExonSet::new();
    }

    pub(crate) fn merge_ambiguous(&mut self) {
        self.ambiguous_stranded.merge();
        self.ambiguous_unstranded.merge();
    }

    pub fn ambiguous_length(&self, kind: AmbiguityKind) -> u64 {
        self.ambiguous(kind).total_length()
    }

    /// Exonic length not shared with any neighbouring gene.
    pub fn exclusive_length(&self, kind: AmbiguityKind) -> u64 {
        // the ambiguous set is built from intersections with this footprint,
        // so after merging it can never exceed it
        self.total_length().saturating_sub(self.ambiguous_length(kind))
    }
}
