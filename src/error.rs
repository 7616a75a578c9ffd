use thiserror::Error;

use crate::annotation::io::ParseError;
use crate::types::Strand;

/// Errors raised while streaming alignments through the counting engine.
#[derive(Debug, Error)]
pub enum CountError {
    /// The alignment stream went backwards; assignments would be silently wrong.
    #[error("alignments are not coordinate-sorted: {chrom}:{position} follows {previous}")]
    UnsortedInput {
        chrom: String,
        position: u32,
        previous: String,
    },
    /// The record's chromosome has no genes in the annotation.
    #[error("no gene model for chromosome '{chrom}'")]
    MissingGeneModel { chrom: String },
    /// A single record lacks data the engine needs.
    #[error("malformed alignment record: {reason}")]
    MalformedRecord { reason: String },
    /// Iterative reassignment hit its cap before settling.
    #[error("iterative reassignment did not converge within {iterations} iterations")]
    ConvergenceLimitReached { iterations: usize },
    #[error("reading alignments failed")]
    Input(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CountError {
    /// Errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CountError::UnsortedInput { .. } | CountError::Input(_))
    }
}

/// Errors raised while building an `AnnotationIndex`.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("gene '{gene}' has transcripts on {first} and {second}")]
    InconsistentGene {
        gene: String,
        first: String,
        second: String,
    },
    #[error("invalid exon {start}-{end} for gene '{gene}'")]
    BadExon { gene: String, start: u32, end: u32 },
    #[error("annotation index is already finalized")]
    Finalized,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl IndexError {
    pub(crate) fn strand_conflict(gene: &str, first: Strand, second: Strand) -> Self {
        IndexError::InconsistentGene {
            gene: gene.to_string(),
            first: format!("strand {first}"),
            second: format!("strand {second}"),
        }
    }
}
