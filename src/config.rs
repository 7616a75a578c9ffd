use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::AmbiguityKind;
use crate::types::Strandedness;

// iterative reassignment defaults
pub const MAX_ITERATIONS: usize = 100;
pub const RPKM_TOLERANCE: f64 = 0.10;
pub const CONVERGENCE_FRACTION: f64 = 0.90;
pub const DEFAULT_SEED: u64 = 42;

// RPKM scaling: 10^3 (per kb) x 10^6 (per million reads)
pub const RPKM_SCALE: f64 = 1e9;

/// How reads overlapping more than one gene are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// Multi-gene reads count as ambiguous and credit no gene.
    #[default]
    Discard,
    /// Weight is split evenly over all overlapping genes.
    Fractional,
    /// One overlapping gene, drawn uniformly, gets the full weight.
    Random,
    /// Discard first, then iteratively redistribute ambiguous reads in
    /// proportion to provisional RPKM.
    Iterative,
}

impl ResolutionMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ResolutionMode::Discard),
            1 => Some(ResolutionMode::Fractional),
            2 => Some(ResolutionMode::Random),
            3 => Some(ResolutionMode::Iterative),
            _ => None,
        }
    }

    /// Discard mode normalises by exclusive length, all others by total length.
    pub fn uses_exclusive_length(self) -> bool {
        self == ResolutionMode::Discard
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionMode::Discard => "discard",
            ResolutionMode::Fractional => "fractional",
            ResolutionMode::Random => "random",
            ResolutionMode::Iterative => "iterative",
        };
        write!(f, "{s}")
    }
}

/// Every knob of one counting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountConfig {
    pub mode: ResolutionMode,
    pub strandedness: Strandedness,

    /// weight = 1/NH for records carrying a multiplicity tag
    pub weight_by_multiplicity: bool,
    /// drop records with NH > 1
    pub unique_only: bool,

    /// collapse adjacent records with identical placement
    pub collapse_duplicates: bool,
    pub skip_flagged_duplicates: bool,
    pub skip_secondary: bool,
    pub max_mismatches: Option<u32>,

    pub max_iterations: usize,
    pub rpkm_tolerance: f64,
    pub convergence_fraction: f64,

    pub seed: u64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            mode: ResolutionMode::Discard,
            strandedness: Strandedness::Unstranded,
            weight_by_multiplicity: false,
            unique_only: false,
            collapse_duplicates: false,
            skip_flagged_duplicates: true,
            skip_secondary: true,
            max_mismatches: None,
            max_iterations: MAX_ITERATIONS,
            rpkm_tolerance: RPKM_TOLERANCE,
            convergence_fraction: CONVERGENCE_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl CountConfig {
    /// Which ambiguous footprint matches the strandedness of this run.
    pub fn ambiguity_kind(&self) -> AmbiguityKind {
        if self.strandedness.is_stranded() {
            AmbiguityKind::Stranded
        } else {
            AmbiguityKind::Unstranded
        }
    }

    /// Weight one record contributes.
    pub fn weight(&self, multiplicity: Option<u32>) -> f64 {
        match multiplicity {
            Some(nh) if self.weight_by_multiplicity && nh > 0 => 1.0 / nh as f64,
            _ => 1.0,
        }
    }
}
