use crate::model::exon_set::ExonSet;
use crate::model::types::{ChrId, GeneId, TranscriptId};
use crate::types::{Interval, Strand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub id: TranscriptId,
    pub gene_id: GeneId,
    pub names: Vec<String>,
    pub chr_id: ChrId,
    pub strand: Strand,
    exons: ExonSet,
}

impl Transcript {
    pub fn new(
        id: TranscriptId,
        gene_id: GeneId,
        primary_name: impl Into<String>,
        chr_id: ChrId,
        strand: Strand,
    ) -> Self {
        Self {
            id,
            gene_id,
            names: vec![primary_name.into()],
            chr_id,
            strand,
            exons: ExonSet::new(),
        }
    }

    pub fn add_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|s| s.as_str())
    }

    pub fn add_exon(&mut self, exon: Interval) {
        self.exons.push(exon);
    }

    pub fn exons(&self) -> &ExonSet {
        &self.exons
    }

    /// Sort/merge the exons and return the transcript span.
    pub fn finalize(&mut self) -> Option<Interval> {
        self.exons.merge();
        self.span()
    }

    pub fn span(&self) -> Option<Interval> {
        self.exons.span()
    }

    pub fn length(&self) -> u64 {
        self.exons.total_length()
    }
}
