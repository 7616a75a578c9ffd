pub mod types;
pub mod exon_set;
pub mod transcript;
pub mod gene;

pub use types::{AmbiguityKind, ChrId, GeneId, TranscriptId};
