use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::annotation::io::ParseError;
use crate::error::IndexError;
use crate::index::{AnnotationIndex, IdNameKeys};

/// High-level builder for creating an `AnnotationIndex` from a GTF/GFF3 file.
///
/// - parses whole file (optionally gzipped)
/// - configurable mapping of ID/NAME keys for gene + transcript
/// - returns a finalized index (footprints merged, ambiguous regions computed)
#[derive(Debug, Clone, Default)]
pub struct AnnotationBuilder {
    pub keys: IdNameKeys,
}

impl AnnotationBuilder {
    /// Start with defaults that work reasonably for many GTF/GFF3 files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with caller-chosen attribute keys.
    pub fn with_keys(keys: IdNameKeys) -> Self {
        Self { keys }
    }

    /// Build index from anything implementing `BufRead`.
    pub fn build_from_reader<R: BufRead>(&self, reader: R) -> Result<AnnotationIndex, IndexError> {
        AnnotationIndex::from_reader(reader, &self.keys)
    }

    /// Build index from a file path; `.gz` files are decompressed on the fly.
    pub fn build_from_path<P: AsRef<Path>>(&self, path: P) -> Result<AnnotationIndex, IndexError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ParseError::IoPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_gz = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        info!("Loading annotation from {}", path.display());
        if is_gz {
            let decoder = flate2::read::GzDecoder::new(file);
            self.build_from_reader(BufReader::new(decoder))
        } else {
            self.build_from_reader(BufReader::new(file))
        }
    }
}

// -------------------- tests --------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AmbiguityKind;
    use crate::types::{Interval, Strand};
    use std::io::{Cursor, Write};

    #[test]
    fn builder_gtf_default_keys_builds_index() {
        let gtf = "\
chr1\tsrc\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; gene_name \"Alpha\"; transcript_id \"T1\";
chr1\tsrc\texon\t201\t250\t.\t+\t.\tgene_id \"G1\"; gene_name \"Alpha\"; transcript_id \"T1\";
chr1\tsrc\texon\t241\t300\t.\t+\t.\tgene_id \"G2\"; transcript_id \"T2\";
";

        let idx = AnnotationBuilder::new()
            .build_from_reader(Cursor::new(gtf.as_bytes()))
            .unwrap();

        assert_eq!(idx.genes.len(), 2);
        let g1 = idx.gene(idx.gene_id("G1").unwrap());
        assert_eq!(g1.exons(), &[Interval::new(101, 150), Interval::new(201, 250)]);
        assert_eq!(g1.ambiguous_length(AmbiguityKind::Stranded), 10);
        assert_eq!(g1.exclusive_length(AmbiguityKind::Stranded), 90);
    }

    #[test]
    fn builder_gff3_parent_linking_builds_index() {
        let gff = "\
chr2\tsrc\texon\t5\t20\t.\t-\t.\tParent=tx1;gene_id=G9;Name=GeneNice
chr2\tsrc\texon\t30\t40\t.\t-\t.\tParent=tx1;gene_id=G9;Name=GeneNice
";

        let keys = IdNameKeys {
            gene_id_keys: vec!["gene_id".into()],
            gene_name_keys: vec!["Name".into()],
            transcript_id_keys: Vec::new(),
            ..IdNameKeys::default()
        };
        let idx = AnnotationBuilder::with_keys(keys)
            .build_from_reader(Cursor::new(gff.as_bytes()))
            .unwrap();

        assert_eq!(idx.chr_names, vec!["chr2".to_string()]);
        assert_eq!(idx.transcripts.len(), 1);
        assert_eq!(idx.transcripts[0].strand, Strand::Minus);
        assert_eq!(idx.genes[0].total_length(), 16 + 11);
        assert!(idx.transcripts[0].names.iter().any(|n| n == "tx1"));
    }

    #[test]
    fn builder_respects_exon_feature_types_filter() {
        let gtf = "\
chr1\tsrc\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\tCDS\t201\t250\t.\t+\t0\tgene_id \"G1\"; transcript_id \"T1\";
";

        let idx = AnnotationBuilder::new()
            .build_from_reader(Cursor::new(gtf.as_bytes()))
            .unwrap();

        assert_eq!(idx.genes[0].exons(), &[Interval::new(101, 150)]);
    }

    #[test]
    fn builder_reads_gzipped_file() {
        let gtf = "chr1\tsrc\texon\t11\t20\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n";
        let path = std::env::temp_dir().join(format!("gene_counter_builder_{}.gtf.gz", std::process::id()));
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            enc.write_all(gtf.as_bytes()).unwrap();
            enc.finish().unwrap();
        }

        let idx = AnnotationBuilder::new().build_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(idx.genes.len(), 1);
        assert_eq!(idx.genes[0].total_length(), 10);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AnnotationBuilder::new().build_from_path("/definitely/not/here.gtf");
        assert!(matches!(err, Err(IndexError::Parse(ParseError::IoPath { .. }))));
    }
}
