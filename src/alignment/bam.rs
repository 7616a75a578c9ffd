use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::warn;
use noodles::bam;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;

use crate::alignment::{AlignmentRecord, RecordFlags};
use crate::types::{Interval, Strand};

/// How raw BAM records are turned into [`AlignmentRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct BamOptions {
    /// Report the second mate of a pair on the opposite strand, so both
    /// mates carry the fragment's orientation.
    pub flip_second_mate: bool,
}

impl Default for BamOptions {
    fn default() -> Self {
        Self { flip_second_mate: true }
    }
}

/// Streaming iterator over the records of one BAM file.
pub struct BamRecords<R> {
    reader: bam::io::Reader<R>,
    reference_names: Vec<String>,
    record: bam::Record,
    options: BamOptions,
}

/// Open a BAM file and read its header.
pub fn open<P: AsRef<Path>>(path: P, options: BamOptions) -> io::Result<BamRecords<impl Read>> {
    let file = File::open(path.as_ref())?;
    BamRecords::new(bam::io::Reader::new(file), options)
}

impl<R: Read> BamRecords<R> {
    pub fn new(mut reader: bam::io::Reader<R>, options: BamOptions) -> io::Result<Self> {
        let header = reader.read_header()?;
        let sort_order = header
            .header()
            .and_then(|hd| hd.other_fields().get(&header_tag::SORT_ORDER))
            .map(|so| &so[..]);
        check_sort_order(sort_order)?;

        let reference_names = header
            .reference_sequences()
            .keys()
            .map(|name| name.to_string())
            .collect();

        Ok(Self {
            reader,
            reference_names,
            record: bam::Record::default(),
            options,
        })
    }

    pub fn reference_names(&self) -> &[String] {
        &self.reference_names
    }
}

impl<R: Read> Iterator for BamRecords<R> {
    type Item = io::Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(convert(&self.record, &self.reference_names, self.options)),
            Err(e) => Some(Err(e)),
        }
    }
}

fn convert(record: &bam::Record, reference_names: &[String], options: BamOptions) -> io::Result<AlignmentRecord> {
    let flags = record.flags();

    let chrom = match record.reference_sequence_id().transpose()? {
        Some(id) => reference_names
            .get(id)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("reference id {id} not in header")))?,
        None => "*".to_string(),
    };

    let mut strand = if flags.is_reverse_complemented() {
        Strand::Minus
    } else {
        Strand::Plus
    };
    if options.flip_second_mate && flags.is_segmented() && flags.is_last_segment() {
        strand = strand.flip();
    }

    let blocks = if flags.is_unmapped() {
        Vec::new()
    } else {
        match record.alignment_start().transpose()? {
            Some(pos) => {
                let ops = record
                    .cigar()
                    .iter()
                    .map(|op| op.map(|op| (op.kind(), op.len())))
                    .collect::<io::Result<Vec<_>>>()?;
                blocks_from_cigar(pos.get() as u32, &ops)
            }
            None => Vec::new(),
        }
    };

    let data = record.data();
    let int_tag = |tag: Tag| -> Option<u32> {
        let value = data.get(&tag)?.ok()?;
        value.as_int().and_then(|v| u32::try_from(v).ok())
    };

    Ok(AlignmentRecord {
        chrom,
        strand,
        blocks,
        multiplicity: int_tag(Tag::ALIGNMENT_HIT_COUNT),
        mismatches: int_tag(Tag::EDIT_DISTANCE),
        flags: RecordFlags {
            unmapped: flags.is_unmapped(),
            duplicate: flags.is_duplicate(),
            secondary: flags.is_secondary(),
        },
    })
}

/// Reject inputs whose `@HD SO` declares anything but coordinate order.
///
/// A missing sort order is let through; the engine still notices records
/// going backwards.
pub fn check_sort_order(sort_order: Option<&[u8]>) -> io::Result<()> {
    match sort_order {
        Some(b"coordinate") => Ok(()),
        Some(other) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "BAM header declares SO:{}, expected coordinate",
                String::from_utf8_lossy(other)
            ),
        )),
        None => {
            warn!("BAM header has no sort order; assuming coordinate-sorted records");
            Ok(())
        }
    }
}

/// Reference blocks covered by an alignment starting at 1-based `start`.
///
/// `N` (skipped region) splits blocks; `D` stays inside the current block.
/// Ops that do not consume the reference are ignored. Blocks are 1-based
/// inclusive.
pub fn blocks_from_cigar(start: u32, ops: &[(Kind, usize)]) -> Vec<Interval> {
    let mut blocks = Vec::new();
    let mut ref_pos = start;
    let mut block_start = start;

    for &(kind, len) in ops {
        let len = len as u32;
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch | Kind::Deletion => {
                ref_pos = ref_pos.saturating_add(len);
            }
            Kind::Skip => {
                if ref_pos > block_start {
                    blocks.push(Interval::new(block_start, ref_pos - 1));
                }
                ref_pos = ref_pos.saturating_add(len);
                block_start = ref_pos;
            }
            // Non-reference-consuming: Insertion, SoftClip, HardClip, Pad
            _ => {}
        }
    }

    if ref_pos > block_start {
        blocks.push(Interval::new(block_start, ref_pos - 1));
    }

    blocks
}
