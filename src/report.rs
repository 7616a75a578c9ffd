//! Tab-separated count tables and the JSON run summary.

use std::io::{self, Write};

use serde::Serialize;

use crate::config::CountConfig;
use crate::engine::{FileCounts, RunSummary};
use crate::index::AnnotationIndex;

/// Which per-gene value a table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Counts,
    Rpkm,
}

/// One row per gene in index order, one column per input, then a
/// `TOTAL_READS` row holding the mapped total of every input.
pub fn write_counts_tsv<W: Write>(
    mut out: W,
    index: &AnnotationIndex,
    lengths: &[u64],
    files: &[FileCounts],
    table: Table,
) -> io::Result<()> {
    write!(out, "GENE_ID\tLENGTH")?;
    for f in files {
        write!(out, "\t{}", f.summary.name)?;
    }
    writeln!(out)?;

    for (gid, len) in lengths.iter().enumerate().take(index.genes.len()) {
        write!(out, "{}\t{}", index.gene_key(gid), len)?;
        for f in files {
            let value = match table {
                Table::Counts => f.count(gid),
                Table::Rpkm => f.rpkm(gid),
            };
            write!(out, "\t{value}")?;
        }
        writeln!(out)?;
    }

    write!(out, "TOTAL_READS\t")?;
    for f in files {
        write!(out, "\t{}", f.summary.total_mapped)?;
    }
    writeln!(out)?;
    out.flush()
}

#[derive(Serialize)]
struct SummaryDoc<'a> {
    config: &'a CountConfig,
    files: Vec<&'a RunSummary>,
}

/// Pretty JSON with the effective configuration and every input's summary.
pub fn write_summary_json<W: Write>(out: W, config: &CountConfig, files: &[FileCounts]) -> io::Result<()> {
    let doc = SummaryDoc {
        config,
        files: files.iter().map(|f| &f.summary).collect(),
    };
    serde_json::to_writer_pretty(out, &doc).map_err(io::Error::from)
}
