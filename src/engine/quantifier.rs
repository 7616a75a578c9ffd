use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::alignment::AlignmentRecord;
use crate::config::{CountConfig, ResolutionMode};
use crate::engine::converge::{self, AmbiguousRead, Lengths};
use crate::engine::counts::{self, FileCounts, GeneCounts, RunSummary};
use crate::engine::resolve::{self, Resolution};
use crate::engine::AssignmentEngine;
use crate::error::CountError;
use crate::index::AnnotationIndex;
use crate::types::{Interval, Strand};

/// Placement of the last kept record, for adjacent-duplicate collapse.
///
/// Reference blocks stand in for start plus CIGAR shape, so alignments that
/// differ only in clipping or insertions compare equal.
type PlacementKey = (String, Strand, Vec<Interval>);

/// Runs whole inputs through an [`AssignmentEngine`].
///
/// One random generator is seeded at construction and shared by every
/// input counted with this quantifier.
pub struct Quantifier<'a> {
    engine: AssignmentEngine<'a>,
    config: CountConfig,
    rng: StdRng,
}

impl<'a> Quantifier<'a> {
    pub fn new(index: &'a AnnotationIndex, config: CountConfig) -> Self {
        Self {
            engine: AssignmentEngine::new(index, config.strandedness),
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &CountConfig {
        &self.config
    }

    pub fn index(&self) -> &'a AnnotationIndex {
        self.engine.index()
    }

    /// Gene lengths the reported RPKM is normalised by.
    pub fn lengths(&self) -> Vec<u64> {
        counts::reporting_lengths(self.engine.index(), &self.config)
    }

    /// Count one coordinate-sorted stream of records.
    ///
    /// Per-record problems are tallied in the summary; unsorted input and
    /// source errors abort.
    pub fn count_file<I, E>(&mut self, name: &str, records: I) -> Result<FileCounts, CountError>
    where
        I: IntoIterator<Item = Result<AlignmentRecord, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.engine.reset();

        let index = self.engine.index();
        let mode = self.config.mode;
        let mut summary = RunSummary::new(name);
        let mut counts = GeneCounts::new(index.genes.len());
        let mut ambiguous_reads: Vec<AmbiguousRead> = Vec::new();
        let mut last_kept: Option<PlacementKey> = None;

        for rec in records {
            let rec = rec.map_err(|e| CountError::Input(Box::new(e)))?;
            summary.total_records += 1;

            if !self.passes_filters(&rec, &mut summary) {
                continue;
            }

            if self.config.collapse_duplicates {
                let same = matches!(&last_kept, Some((c, s, b)) if *c == rec.chrom && *s == rec.strand && *b == rec.blocks);
                if same {
                    summary.collapsed_duplicate += 1;
                    continue;
                }
                last_kept = Some((rec.chrom.clone(), rec.strand, rec.blocks.clone()));
            }

            let weight = self.config.weight(rec.multiplicity);

            let genes = match self.engine.assign(&rec) {
                Ok(genes) => genes,
                Err(CountError::MalformedRecord { reason }) => {
                    warn!("{name}: skipping record: {reason}");
                    summary.malformed += 1;
                    continue;
                }
                Err(CountError::MissingGeneModel { .. }) => {
                    summary.missing_chromosome += 1;
                    summary.no_feature += 1;
                    summary.total_mapped += weight;
                    continue;
                }
                Err(e) => return Err(e),
            };
            summary.total_mapped += weight;

            if genes.len() > 1 {
                summary.ambiguous += 1;
            }
            match resolve::resolve(mode, &genes, weight, &mut counts, &mut self.rng) {
                Resolution::NoFeature => summary.no_feature += 1,
                Resolution::Ambiguous if mode == ResolutionMode::Iterative => {
                    ambiguous_reads.push(AmbiguousRead { genes, weight });
                }
                Resolution::Ambiguous | Resolution::Assigned => {}
            }
        }

        let (counts, rpkm) = if mode == ResolutionMode::Iterative {
            let exclusive = counts::exclusive_lengths(index, &self.config);
            let total = counts::total_lengths(index);
            let out = converge::redistribute(
                counts.as_slice(),
                &ambiguous_reads,
                Lengths {
                    exclusive: &exclusive,
                    total: &total,
                },
                summary.total_mapped,
                &self.config,
                &mut self.rng,
            );
            summary.iterations = Some(out.convergence.iterations);
            summary.converged = Some(out.convergence.converged);
            (out.counts, out.rpkm)
        } else {
            let lengths = self.lengths();
            let rpkm = counts::rpkm_all(counts.as_slice(), &lengths, summary.total_mapped);
            (counts.into_vec(), rpkm)
        };
        summary.assigned = counts.iter().sum();

        info!(
            "{}: {} records, {:.1} mapped, {:.1} assigned, {} no feature, {} ambiguous, {} filtered",
            name,
            summary.total_records,
            summary.total_mapped,
            summary.assigned,
            summary.no_feature,
            summary.ambiguous,
            summary.filtered()
        );

        Ok(FileCounts { summary, counts, rpkm })
    }

    fn passes_filters(&self, rec: &AlignmentRecord, summary: &mut RunSummary) -> bool {
        let cfg = &self.config;
        if rec.flags.unmapped {
            summary.unmapped += 1;
            return false;
        }
        if cfg.skip_secondary && rec.flags.secondary {
            summary.secondary += 1;
            return false;
        }
        if cfg.skip_flagged_duplicates && rec.flags.duplicate {
            summary.flagged_duplicate += 1;
            return false;
        }
        if let (Some(max), Some(nm)) = (cfg.max_mismatches, rec.mismatches) {
            if nm > max {
                summary.too_many_mismatches += 1;
                return false;
            }
        }
        if cfg.unique_only && rec.multiplicity.is_some_and(|nh| nh > 1) {
            summary.not_unique += 1;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::RecordFlags;
    use std::io;

    fn scenario_index() -> AnnotationIndex {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "A", "A.1", Interval::new(100, 150)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "A", "A.1", Interval::new(160, 200)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "B", "B.1", Interval::new(140, 170)).unwrap();
        idx.add_exon("chr1", Strand::Minus, "C", "C.1", Interval::new(1000, 1100)).unwrap();
        idx.add_exon("chr1", Strand::Minus, "C", "C.1", Interval::new(1500, 1600)).unwrap();
        idx.finalize();
        idx
    }

    fn rec(start: u32, end: u32) -> AlignmentRecord {
        AlignmentRecord::new("chr1", Strand::Plus, vec![Interval::new(start, end)])
    }

    fn ok(records: Vec<AlignmentRecord>) -> Vec<Result<AlignmentRecord, io::Error>> {
        records.into_iter().map(Ok).collect()
    }

    fn config(mode: ResolutionMode) -> CountConfig {
        CountConfig {
            mode,
            ..CountConfig::default()
        }
    }

    #[test]
    fn discard_mode_counts_ambiguous_separately() {
        let idx = scenario_index();
        let a = idx.gene_id("A").unwrap();
        let b = idx.gene_id("B").unwrap();
        let c = idx.gene_id("C").unwrap();
        let mut q = Quantifier::new(&idx, config(ResolutionMode::Discard));

        let out = q
            .count_file("s1", ok(vec![rec(105, 120), rec(145, 165), rec(1200, 1250), rec(1550, 1560)]))
            .unwrap();

        assert_eq!(out.count(a), 1.0);
        assert_eq!(out.count(b), 0.0);
        assert_eq!(out.count(c), 1.0);
        assert_eq!(out.summary.ambiguous, 1);
        assert_eq!(out.summary.no_feature, 1);
        assert_eq!(out.summary.total_mapped, 4.0);
        assert_eq!(out.summary.assigned, 2.0);
        // exclusive length of A is 70
        let expected = 1.0 * 1e9 / (4.0 * 70.0);
        assert!((out.rpkm(a) - expected).abs() < 1e-6);
    }

    #[test]
    fn fractional_mode_splits_shared_read() {
        let idx = scenario_index();
        let mut q = Quantifier::new(&idx, config(ResolutionMode::Fractional));
        let out = q.count_file("s1", ok(vec![rec(145, 165)])).unwrap();
        assert_eq!(out.count(idx.gene_id("A").unwrap()), 0.5);
        assert_eq!(out.count(idx.gene_id("B").unwrap()), 0.5);
        assert_eq!(out.summary.ambiguous, 1);
    }

    #[test]
    fn filters_are_tallied() {
        let idx = scenario_index();
        let cfg = CountConfig {
            max_mismatches: Some(2),
            unique_only: true,
            collapse_duplicates: true,
            ..CountConfig::default()
        };
        let mut q = Quantifier::new(&idx, cfg);

        let unmapped = rec(105, 120).with_flags(RecordFlags {
            unmapped: true,
            ..Default::default()
        });
        let secondary = rec(105, 120).with_flags(RecordFlags {
            secondary: true,
            ..Default::default()
        });
        let dup = rec(105, 120).with_flags(RecordFlags {
            duplicate: true,
            ..Default::default()
        });
        let records = vec![
            unmapped,
            secondary,
            dup,
            rec(106, 120).with_mismatches(5),
            rec(107, 120).with_multiplicity(3),
            rec(108, 120),
            rec(108, 120),
            AlignmentRecord::new("chr1", Strand::Plus, vec![]),
            AlignmentRecord::new("chrX", Strand::Plus, vec![Interval::new(5, 10)]),
        ];
        let out = q.count_file("s1", ok(records)).unwrap();
        let s = &out.summary;
        assert_eq!(s.total_records, 9);
        assert_eq!(
            (s.unmapped, s.secondary, s.flagged_duplicate, s.too_many_mismatches, s.not_unique),
            (1, 1, 1, 1, 1)
        );
        assert_eq!(s.collapsed_duplicate, 1);
        assert_eq!(s.malformed, 1);
        assert_eq!(s.missing_chromosome, 1);
        assert_eq!(s.total_mapped, 2.0);
        assert_eq!(out.count(idx.gene_id("A").unwrap()), 1.0);
    }

    fn collapsing() -> CountConfig {
        CountConfig {
            collapse_duplicates: true,
            ..CountConfig::default()
        }
    }

    #[test]
    fn collapse_only_compares_with_previous_kept_record() {
        let idx = scenario_index();
        let a = idx.gene_id("A").unwrap();
        let mut q = Quantifier::new(&idx, collapsing());

        // same start, different blocks in between
        let out = q
            .count_file("s1", ok(vec![rec(108, 120), rec(108, 125), rec(108, 120)]))
            .unwrap();
        assert_eq!(out.summary.collapsed_duplicate, 0);
        assert_eq!(out.count(a), 3.0);
    }

    #[test]
    fn filtered_records_do_not_reset_collapse() {
        let idx = scenario_index();
        let a = idx.gene_id("A").unwrap();
        let mut q = Quantifier::new(&idx, collapsing());

        let secondary = rec(108, 120).with_flags(RecordFlags {
            secondary: true,
            ..Default::default()
        });
        let out = q
            .count_file("s1", ok(vec![rec(108, 120), secondary, rec(108, 120)]))
            .unwrap();
        assert_eq!(out.summary.secondary, 1);
        assert_eq!(out.summary.collapsed_duplicate, 1);
        assert_eq!(out.count(a), 1.0);
    }

    #[test]
    fn multiplicity_weights_reads() {
        let idx = scenario_index();
        let cfg = CountConfig {
            weight_by_multiplicity: true,
            ..CountConfig::default()
        };
        let mut q = Quantifier::new(&idx, cfg);
        let out = q
            .count_file("s1", ok(vec![rec(105, 120).with_multiplicity(4), rec(110, 130)]))
            .unwrap();
        assert_eq!(out.count(idx.gene_id("A").unwrap()), 1.25);
        assert_eq!(out.summary.total_mapped, 1.25);
    }

    #[test]
    fn unsorted_input_aborts() {
        let idx = scenario_index();
        let mut q = Quantifier::new(&idx, CountConfig::default());
        let err = q.count_file("s1", ok(vec![rec(500, 510), rec(100, 110)])).unwrap_err();
        assert!(matches!(err, CountError::UnsortedInput { .. }));
    }

    #[test]
    fn source_errors_abort() {
        let idx = scenario_index();
        let mut q = Quantifier::new(&idx, CountConfig::default());
        let records = vec![Ok(rec(100, 110)), Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"))];
        let err = q.count_file("s1", records).unwrap_err();
        assert!(matches!(err, CountError::Input(_)));
    }

    #[test]
    fn iterative_mode_places_every_ambiguous_read() {
        let idx = scenario_index();
        let a = idx.gene_id("A").unwrap();
        let b = idx.gene_id("B").unwrap();
        let mut q = Quantifier::new(&idx, config(ResolutionMode::Iterative));

        let mut records: Vec<_> = (0..20).map(|i| rec(101 + i, 120 + i)).collect();
        records.push(rec(145, 165));
        records.push(rec(146, 166));
        records.push(rec(168, 170));
        let out = q.count_file("s1", ok(records)).unwrap();

        assert!(out.summary.converged.is_some());
        assert!(out.summary.iterations.unwrap() >= 1);
        assert!((out.count(a) + out.count(b) - 23.0).abs() < 1e-9);
        assert!(out.count(a) >= 20.0);
    }

    #[test]
    fn second_file_starts_from_fresh_cursors() {
        let idx = scenario_index();
        let a = idx.gene_id("A").unwrap();
        let mut q = Quantifier::new(&idx, CountConfig::default());
        let first = q.count_file("s1", ok(vec![rec(105, 120), rec(1550, 1560)])).unwrap();
        let second = q.count_file("s2", ok(vec![rec(105, 120)])).unwrap();
        assert_eq!(first.count(a), 1.0);
        assert_eq!(second.count(a), 1.0);
        assert_eq!(second.summary.name, "s2");
    }
}
