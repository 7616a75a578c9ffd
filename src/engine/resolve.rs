//! Multi-gene resolution policies for a single record.

use rand::Rng;

use crate::config::ResolutionMode;
use crate::engine::counts::GeneCounts;
use crate::model::types::GeneId;

/// What happened to one record's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    NoFeature,
    Assigned,
    /// Overlapped several genes and credited none.
    Ambiguous,
}

/// Credit `weight` to `genes` according to `mode`.
///
/// `Iterative` behaves like `Discard` here; the caller keeps the
/// ambiguous records for the redistribution passes.
pub fn resolve<R: Rng + ?Sized>(
    mode: ResolutionMode,
    genes: &[GeneId],
    weight: f64,
    counts: &mut GeneCounts,
    rng: &mut R,
) -> Resolution {
    if genes.is_empty() {
        return Resolution::NoFeature;
    }

    match mode {
        ResolutionMode::Discard | ResolutionMode::Iterative => {
            if genes.len() == 1 {
                counts.add(genes[0], weight);
                Resolution::Assigned
            } else {
                Resolution::Ambiguous
            }
        }
        ResolutionMode::Fractional => {
            let share = weight / genes.len() as f64;
            for &g in genes {
                counts.add(g, share);
            }
            Resolution::Assigned
        }
        ResolutionMode::Random => {
            let g = genes[rng.gen_range(0..genes.len())];
            counts.add(g, weight);
            Resolution::Assigned
        }
    }
}

/// Inverse-CDF draw of an index proportional to `weights`.
///
/// Non-positive or non-finite weights count as zero; if nothing is left the
/// draw is uniform.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    debug_assert!(!weights.is_empty());

    let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let total: f64 = weights.iter().copied().map(clean).sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }

    let target = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        let w = clean(w);
        if w == 0.0 {
            continue;
        }
        cumulative += w;
        last_positive = i;
        if target < cumulative {
            return i;
        }
    }
    // rounding left target at the very top of the distribution
    last_positive
}
