//! Iterative redistribution of ambiguous reads.
//!
//! Starts from the unique-only counts of a discard pass. Every pass draws a
//! home for each retained ambiguous read in proportion to the RPKM of the
//! previous pass, then recomputes RPKM. The loop stops once most influenced
//! genes have settled, or at the iteration cap.

use log::{debug, warn};
use rand::Rng;

use crate::config::CountConfig;
use crate::engine::counts::rpkm_all;
use crate::engine::resolve::pick_weighted;
use crate::error::CountError;
use crate::model::types::GeneId;

/// A read kept back from the discard pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousRead {
    pub genes: Vec<GeneId>,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    pub iterations: usize,
    pub converged: bool,
}

/// Result of the redistribution loop.
#[derive(Debug, Clone)]
pub struct Redistribution {
    pub counts: Vec<f64>,
    pub rpkm: Vec<f64>,
    pub convergence: Convergence,
}

/// Lengths the loop normalises by.
#[derive(Debug, Clone, Copy)]
pub struct Lengths<'a> {
    /// Seeds the first pass.
    pub exclusive: &'a [u64],
    /// Used from the first redistribution pass on.
    pub total: &'a [u64],
}

pub fn redistribute<R: Rng + ?Sized>(
    base: &[f64],
    ambiguous: &[AmbiguousRead],
    lengths: Lengths<'_>,
    total_mapped: f64,
    config: &CountConfig,
    rng: &mut R,
) -> Redistribution {
    if ambiguous.is_empty() {
        return Redistribution {
            counts: base.to_vec(),
            rpkm: rpkm_all(base, lengths.total, total_mapped),
            convergence: Convergence {
                iterations: 0,
                converged: true,
            },
        };
    }

    let mut candidates: Vec<GeneId> = ambiguous.iter().flat_map(|r| r.genes.iter().copied()).collect();
    candidates.sort_unstable();
    candidates.dedup();

    let mut prev_counts = base.to_vec();
    let mut prev_rpkm = rpkm_all(base, lengths.exclusive, total_mapped);
    let mut weights = Vec::new();

    for iteration in 1..=config.max_iterations {
        let mut counts = base.to_vec();
        for read in ambiguous {
            weights.clear();
            weights.extend(read.genes.iter().map(|&g| prev_rpkm[g]));
            let pick = pick_weighted(&weights, rng);
            counts[read.genes[pick]] += read.weight;
        }
        let rpkm = rpkm_all(&counts, lengths.total, total_mapped);

        let (influenced, stable) = settled(&candidates, &prev_counts, &prev_rpkm, &rpkm, config.rpkm_tolerance);
        debug!("pass {iteration}: {stable}/{influenced} influenced genes stable");

        if influenced == 0 || stable as f64 >= config.convergence_fraction * influenced as f64 {
            return Redistribution {
                counts,
                rpkm,
                convergence: Convergence {
                    iterations: iteration,
                    converged: true,
                },
            };
        }

        if iteration == config.max_iterations {
            warn!("{}", CountError::ConvergenceLimitReached { iterations: iteration });
            return Redistribution {
                counts,
                rpkm,
                convergence: Convergence {
                    iterations: iteration,
                    converged: false,
                },
            };
        }

        prev_counts = counts;
        prev_rpkm = rpkm;
    }

    // max_iterations == 0: keep the discard pass
    warn!("{}", CountError::ConvergenceLimitReached { iterations: 0 });
    Redistribution {
        rpkm: rpkm_all(base, lengths.total, total_mapped),
        counts: prev_counts,
        convergence: Convergence {
            iterations: 0,
            converged: false,
        },
    }
}

/// (influenced, stable) genes of one pass.
///
/// A gene is influenced when it takes part in an ambiguous read and had a
/// nonzero count before the pass; it is stable when its RPKM moved by less
/// than `tolerance` relative to the previous pass.
fn settled(candidates: &[GeneId], prev_counts: &[f64], prev_rpkm: &[f64], rpkm: &[f64], tolerance: f64) -> (usize, usize) {
    let mut influenced = 0;
    let mut stable = 0;
    for &g in candidates {
        if prev_counts[g] <= 0.0 {
            continue;
        }
        influenced += 1;
        let (old, new) = (prev_rpkm[g], rpkm[g]);
        let is_stable = if old == 0.0 {
            new == 0.0
        } else {
            ((new - old) / old).abs() < tolerance
        };
        if is_stable {
            stable += 1;
        }
    }
    (influenced, stable)
}
