use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, Level};

use gene_counter::alignment::bam::{self, BamOptions};
use gene_counter::report::{self, Table};
use gene_counter::{AnnotationBuilder, AnnotationIndex, CountConfig, IdNameKeys, Quantifier, ResolutionMode, Strandedness};

/// Count reads per gene from coordinate-sorted BAM files.
#[derive(Parser, Debug)]
#[command(name = "gene-count")]
#[command(author, version, about)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-chromosome and per-pass detail
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count alignments per gene and write a count table
    Count(CountArgs),

    /// Load an annotation and print summary stats
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Attribute keys to use for gene ID (repeatable).
    #[arg(
        long = "gene-id-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["gene_id".to_string()]
    )]
    gene_id_keys: Vec<String>,

    /// Attribute keys to use for gene name (repeatable).
    #[arg(
        long = "gene-name-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["gene_name".to_string()]
    )]
    gene_name_keys: Vec<String>,

    /// Attribute keys to use for transcript ID (repeatable).
    #[arg(
        long = "transcript-id-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["transcript_id".to_string()]
    )]
    transcript_id_keys: Vec<String>,

    /// GFF3 exon->transcript linkage keys (repeatable).
    #[arg(
        long = "parent-key",
        value_name = "KEY",
        num_args = 1..,
        default_values_t = vec!["Parent".to_string()]
    )]
    parent_keys: Vec<String>,

    /// Feature types that count as exon blocks (repeatable).
    #[arg(
        long = "exon-feature-type",
        value_name = "TYPE",
        num_args = 1..,
        default_values_t = vec!["exon".to_string()]
    )]
    exon_feature_types: Vec<String>,
}

impl KeyArgs {
    fn into_keys(self) -> IdNameKeys {
        IdNameKeys {
            gene_id_keys: self.gene_id_keys,
            gene_name_keys: self.gene_name_keys,
            transcript_id_keys: self.transcript_id_keys,
            parent_keys: self.parent_keys,
            exon_feature_types: self.exon_feature_types,
            ..IdNameKeys::default()
        }
    }
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Input annotation file (.gtf/.gff/.gff3, optionally .gz)
    #[arg(long, short)]
    annotation: PathBuf,

    #[command(flatten)]
    keys: KeyArgs,
}

#[derive(Args, Debug)]
struct CountArgs {
    /// Input annotation file (.gtf/.gff/.gff3, optionally .gz)
    #[arg(long, short)]
    annotation: PathBuf,

    /// Coordinate-sorted BAM files, one output column each
    #[arg(required = true)]
    bams: Vec<PathBuf>,

    /// Output count table (TSV)
    #[arg(long, short)]
    output: PathBuf,

    /// Also write an RPKM table with the same layout
    #[arg(long)]
    rpkm: Option<PathBuf>,

    /// Write a JSON summary of the run
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Multi-gene resolution: 0 discard, 1 fractional, 2 random, 3 iterative
    #[arg(long, short, default_value_t = 0)]
    mode: u8,

    /// Strandedness: 0 ignore, 1 same strand, -1 opposite strand
    #[arg(long, short, default_value_t = 0, allow_hyphen_values = true)]
    strandedness: i8,

    /// Weight each record by 1/NH
    #[arg(long)]
    weight_by_nh: bool,

    /// Drop records with NH > 1
    #[arg(long)]
    unique_only: bool,

    /// Collapse adjacent records with identical placement
    #[arg(long)]
    collapse_duplicates: bool,

    /// Keep records flagged as PCR/optical duplicates
    #[arg(long)]
    keep_flagged_duplicates: bool,

    /// Keep secondary alignments
    #[arg(long)]
    keep_secondary: bool,

    /// Drop records whose NM exceeds this
    #[arg(long)]
    max_mismatches: Option<u32>,

    /// Do not flip the strand of the second mate
    #[arg(long)]
    no_mate_flip: bool,

    /// Iteration cap for mode 3
    #[arg(long, default_value_t = gene_counter::config::MAX_ITERATIONS)]
    max_iterations: usize,

    /// Relative RPKM change under which a gene counts as settled (mode 3)
    #[arg(long, default_value_t = gene_counter::config::RPKM_TOLERANCE)]
    rpkm_tolerance: f64,

    /// Fraction of settled genes that ends mode 3
    #[arg(long, default_value_t = gene_counter::config::CONVERGENCE_FRACTION)]
    convergence_fraction: f64,

    /// Seed of the run-wide random generator
    #[arg(long, default_value_t = gene_counter::config::DEFAULT_SEED)]
    seed: u64,

    #[command(flatten)]
    keys: KeyArgs,
}

impl CountArgs {
    fn config(&self) -> Result<CountConfig> {
        let Some(mode) = ResolutionMode::from_code(self.mode) else {
            bail!("unknown mode {} (expected 0-3)", self.mode);
        };
        let Some(strandedness) = Strandedness::from_code(self.strandedness) else {
            bail!("unknown strandedness {} (expected 0, 1 or -1)", self.strandedness);
        };
        Ok(CountConfig {
            mode,
            strandedness,
            weight_by_multiplicity: self.weight_by_nh,
            unique_only: self.unique_only,
            collapse_duplicates: self.collapse_duplicates,
            skip_flagged_duplicates: !self.keep_flagged_duplicates,
            skip_secondary: !self.keep_secondary,
            max_mismatches: self.max_mismatches,
            max_iterations: self.max_iterations,
            rpkm_tolerance: self.rpkm_tolerance,
            convergence_fraction: self.convergence_fraction,
            seed: self.seed,
        })
    }
}

fn load_annotation(path: &Path, keys: KeyArgs) -> Result<AnnotationIndex> {
    AnnotationBuilder::with_keys(keys.into_keys())
        .build_from_path(path)
        .with_context(|| format!("building annotation index from {}", path.display()))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn sample_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_count(args: CountArgs) -> Result<()> {
    let config = args.config()?;
    info!("effective config: {}", serde_json::to_string(&config)?);

    let bam_options = BamOptions {
        flip_second_mate: !args.no_mate_flip,
    };
    let CountArgs {
        annotation,
        bams,
        output,
        rpkm,
        summary,
        keys,
        ..
    } = args;

    let index = load_annotation(&annotation, keys)?;
    info!("{index}");

    let mut quantifier = Quantifier::new(&index, config);
    let mut results = Vec::with_capacity(bams.len());
    for path in &bams {
        let records = bam::open(path, bam_options).with_context(|| format!("opening {}", path.display()))?;
        let counts = quantifier
            .count_file(&sample_name(path), records)
            .with_context(|| format!("counting {}", path.display()))?;
        results.push(counts);
    }

    let lengths = quantifier.lengths();
    report::write_counts_tsv(create(&output)?, &index, &lengths, &results, Table::Counts)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("counts written to {}", output.display());

    if let Some(path) = rpkm {
        report::write_counts_tsv(create(&path)?, &index, &lengths, &results, Table::Rpkm)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("RPKM written to {}", path.display());
    }

    if let Some(path) = summary {
        report::write_summary_json(create(&path)?, quantifier.config(), &results)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::Warn
    } else if cli.verbose {
        Level::Debug
    } else {
        Level::Info
    };
    simple_logger::init_with_level(level).context("initialising logger")?;

    match cli.cmd {
        Command::Count(args) => run_count(args)?,
        Command::Stats(args) => {
            let idx = load_annotation(&args.annotation, args.keys)?;
            println!("{idx}");
        }
    }

    Ok(())
}
