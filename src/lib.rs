//! gene_counter
//!
//! Streaming gene-level read counting. Genes are modelled as merged exon
//! footprints (1-based, inclusive) with precomputed regions shared with
//! neighbouring genes; coordinate-sorted alignments are matched against them
//! with forward-only cursors and credited under one of four multi-gene
//! resolution modes.

pub mod types;
pub mod model;
pub mod overlap;
pub mod annotation;
pub mod index;
pub mod alignment;
pub mod engine;
pub mod config;
pub mod error;
pub mod report;

pub use index::{AnnotationIndex, Cursors, IdNameKeys};

pub use annotation::AnnotationBuilder;

pub use types::{Interval, Strand, Strandedness};

pub use model::exon_set::ExonSet;
pub use model::gene::Gene;
pub use model::transcript::Transcript;
pub use model::{AmbiguityKind, GeneId, TranscriptId};

pub use alignment::{AlignmentRecord, RecordFlags};
pub use config::{CountConfig, ResolutionMode};
pub use engine::{AssignmentEngine, FileCounts, Quantifier, RunSummary};
pub use error::{CountError, IndexError};
