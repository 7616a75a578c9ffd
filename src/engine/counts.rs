use serde::Serialize;

use crate::config::{CountConfig, RPKM_SCALE};
use crate::index::AnnotationIndex;
use crate::model::types::GeneId;

/// Per-gene accumulators, indexed by `GeneId`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneCounts {
    values: Vec<f64>,
}

impl GeneCounts {
    pub fn new(n_genes: usize) -> Self {
        Self { values: vec![0.0; n_genes] }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn add(&mut self, gene: GeneId, weight: f64) {
        self.values[gene] += weight;
    }

    pub fn get(&self, gene: GeneId) -> f64 {
        self.values[gene]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Reads per kilobase of feature per million mapped reads.
///
/// Zero when either the feature length or the library size is zero.
pub fn rpkm(count: f64, total_mapped: f64, length: u64) -> f64 {
    if length == 0 || total_mapped <= 0.0 {
        return 0.0;
    }
    count * RPKM_SCALE / (total_mapped * length as f64)
}

pub fn rpkm_all(counts: &[f64], lengths: &[u64], total_mapped: f64) -> Vec<f64> {
    counts
        .iter()
        .zip(lengths)
        .map(|(&c, &len)| rpkm(c, total_mapped, len))
        .collect()
}

/// Exclusive exonic length of every gene (ambiguous footprint removed).
pub fn exclusive_lengths(index: &AnnotationIndex, config: &CountConfig) -> Vec<u64> {
    let kind = config.ambiguity_kind();
    index.genes.iter().map(|g| g.exclusive_length(kind)).collect()
}

pub fn total_lengths(index: &AnnotationIndex) -> Vec<u64> {
    index.genes.iter().map(|g| g.total_length()).collect()
}

/// Lengths the final RPKM of a run is normalised by.
pub fn reporting_lengths(index: &AnnotationIndex, config: &CountConfig) -> Vec<u64> {
    if config.mode.uses_exclusive_length() {
        exclusive_lengths(index, config)
    } else {
        total_lengths(index)
    }
}

/// Bookkeeping for one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub total_records: u64,
    /// Sum of weights of records that passed all filters.
    pub total_mapped: f64,
    /// Sum of weights credited to genes.
    pub assigned: f64,
    pub no_feature: u64,
    pub ambiguous: u64,
    pub unmapped: u64,
    pub secondary: u64,
    pub flagged_duplicate: u64,
    pub collapsed_duplicate: u64,
    pub too_many_mismatches: u64,
    pub not_unique: u64,
    pub malformed: u64,
    pub missing_chromosome: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
}

impl RunSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Records rejected before assignment.
    pub fn filtered(&self) -> u64 {
        self.unmapped
            + self.secondary
            + self.flagged_duplicate
            + self.collapsed_duplicate
            + self.too_many_mismatches
            + self.not_unique
            + self.malformed
    }
}

/// Everything produced for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCounts {
    pub summary: RunSummary,
    pub counts: Vec<f64>,
    pub rpkm: Vec<f64>,
}

impl FileCounts {
    pub fn count(&self, gene: GeneId) -> f64 {
        self.counts[gene]
    }

    pub fn rpkm(&self, gene: GeneId) -> f64 {
        self.rpkm[gene]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpkm_formula() {
        // 10 reads on a 1 kb gene out of 1M mapped reads -> 10 RPKM
        assert!((rpkm(10.0, 1_000_000.0, 1000) - 10.0).abs() < 1e-12);
        assert_eq!(rpkm(5.0, 100.0, 0), 0.0);
        assert_eq!(rpkm(5.0, 0.0, 100), 0.0);
    }

    #[test]
    fn rpkm_all_pairs_counts_with_lengths() {
        let r = rpkm_all(&[1.0, 2.0, 3.0], &[1000, 0, 500], 1e6);
        assert_eq!(r.len(), 3);
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert_eq!(r[1], 0.0);
        assert!((r[2] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn gene_counts_accumulate() {
        let mut c = GeneCounts::new(3);
        c.add(0, 1.0);
        c.add(2, 0.5);
        c.add(2, 0.25);
        assert_eq!(c.as_slice(), &[1.0, 0.0, 0.75]);
        assert_eq!(c.total(), 1.75);
    }

    #[test]
    fn summary_filtered_sums_rejections() {
        let s = RunSummary {
            unmapped: 2,
            secondary: 1,
            malformed: 1,
            no_feature: 10,
            ..RunSummary::new("x")
        };
        assert_eq!(s.filtered(), 4);
    }
}
