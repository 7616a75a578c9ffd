/// Internal numeric IDs (indexes into Vecs).
pub type GeneId = usize;
pub type TranscriptId = usize;
pub type ChrId = usize;

/// Which ambiguous footprint a length query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbiguityKind {
    /// Only overlaps with genes on the same strand.
    Stranded,
    /// Overlaps with any neighbouring gene, regardless of strand.
    Unstranded,
}
