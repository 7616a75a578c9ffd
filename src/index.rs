use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;

use log::{debug, info};

use crate::annotation::io::{AnnotationReader, ParseError};
use crate::error::IndexError;
use crate::model::gene::Gene;
use crate::model::transcript::Transcript;
use crate::model::types::{AmbiguityKind, ChrId, GeneId, TranscriptId};
use crate::overlap;
use crate::types::{Interval, Strand};

/// Configure which attribute keys are used to extract:
/// - gene stable identifier (used to intern -> GeneId, reported as GENE_ID)
/// - gene display names/aliases (stored in Gene.names after the id)
/// - transcript stable identifier (used to intern -> TranscriptId)
/// - transcript display names/aliases (stored in Transcript.names)
/// - (GFF3) exon -> transcript linking keys (usually Parent)
///
/// Notes:
/// - We allow multiple keys per category; first present wins.
/// - For GFF3 Parent values, we split by ',' and treat each parent as a transcript ID.
#[derive(Debug, Clone)]
pub struct IdNameKeys {
    pub gene_id_keys: Vec<String>,
    pub gene_name_keys: Vec<String>,

    pub transcript_id_keys: Vec<String>,
    pub transcript_name_keys: Vec<String>,

    /// GFF3 exon->transcript linkage (most commonly: Parent)
    pub parent_keys: Vec<String>,

    /// Feature types that count as exon blocks (default: ["exon"])
    pub exon_feature_types: Vec<String>,
}

impl Default for IdNameKeys {
    fn default() -> Self {
        Self {
            // Common GTF + some common variants
            gene_id_keys: vec!["gene_id".into(), "gene".into(), "GeneID".into()],
            gene_name_keys: vec!["gene_name".into(), "Name".into()],
            transcript_id_keys: vec!["transcript_id".into()],
            transcript_name_keys: vec!["transcript_name".into()],
            parent_keys: vec!["Parent".into()],
            exon_feature_types: vec!["exon".into()],
        }
    }
}

/// The owning annotation index:
/// - chromosome dictionary (chr name -> chr_id)
/// - genes + transcripts (arena storage, related by id)
/// - per-chromosome gene lists sorted by (start, end)
///
/// Build it with [`AnnotationIndex::add_exon`] (or `from_reader`), then call
/// [`AnnotationIndex::finalize`]. After that the index is read-only; all
/// mutable traversal state lives in [`Cursors`].
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    pub chr_names: Vec<String>,
    chr_to_id: HashMap<String, ChrId>,

    pub genes: Vec<Gene>,
    pub transcripts: Vec<Transcript>,

    gene_key_to_id: HashMap<String, GeneId>,
    tx_key_to_id: HashMap<String, TranscriptId>,

    chr_genes: Vec<Vec<GeneId>>,
    finalized: bool,
}

/// Human-readable summary of the `AnnotationIndex`.
///
/// Global line: genes, transcripts, chromosomes.
/// Per chromosome: gene count, summed exonic footprint and the strand-aware
/// and strand-agnostic ambiguous bp.
///
/// Meant for logging and diagnostics, not for machine-readable output.
impl fmt::Display for AnnotationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "AnnotationIndex: {} genes, {} transcripts, {} chromosomes",
            self.genes.len(),
            self.transcripts.len(),
            self.chr_names.len()
        )?;

        for (chr_id, chr_name) in self.chr_names.iter().enumerate() {
            let gene_ids = self.genes_on(chr_id);
            let (mut exonic, mut amb_s, mut amb_u) = (0u64, 0u64, 0u64);
            for &gid in gene_ids {
                let g = &self.genes[gid];
                exonic += g.total_length();
                amb_s += g.ambiguous_length(AmbiguityKind::Stranded);
                amb_u += g.ambiguous_length(AmbiguityKind::Unstranded);
            }
            writeln!(
                f,
                "  - {}: genes={}, exonic_bp={}, ambiguous_bp(stranded)={}, ambiguous_bp(unstranded)={}",
                chr_name,
                gene_ids.len(),
                exonic,
                amb_s,
                amb_u
            )?;
        }

        Ok(())
    }
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index directly from a GTF/GFF3 reader and finalize it.
    ///
    /// Workflow:
    /// 1) parse records
    /// 2) for exon features: intern gene and transcript(s), add exon block
    /// 3) finalize (merge footprints, sort genes, ambiguous-region sweep)
    ///
    /// # Example (minimal GTF via `BufRead`)
    /// ```
    /// use std::io::Cursor;
    /// use gene_counter::index::{AnnotationIndex, IdNameKeys};
    ///
    /// let gtf = "\
    /// chr1\tsrc\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
    /// chr1\tsrc\texon\t201\t250\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n";
    ///
    /// let idx = AnnotationIndex::from_reader(Cursor::new(gtf.as_bytes()), &IdNameKeys::default())
    ///     .unwrap();
    ///
    /// assert_eq!(idx.genes.len(), 1);
    /// assert_eq!(idx.genes[0].total_length(), 100);
    /// assert_eq!(idx.chr_names, vec!["chr1".to_string()]);
    /// ```
    pub fn from_reader<R: BufRead>(reader: R, keys: &IdNameKeys) -> Result<Self, IndexError> {
        let mut idx = AnnotationIndex::new();

        for rec in AnnotationReader::new(reader).records() {
            let rec = rec?;

            if !rec.is_exon_feature(&keys.exon_feature_types) {
                continue;
            }

            let gene_key = rec.pick_first_attr(&keys.gene_id_keys).ok_or_else(|| {
                ParseError::MissingAttribute {
                    line_no: rec.line_no,
                    tried: keys.gene_id_keys.clone(),
                }
            })?;

            let tx_key_raw = rec
                .pick_first_attr(&keys.transcript_id_keys)
                .or_else(|| rec.pick_first_attr(&keys.parent_keys))
                .ok_or_else(|| {
                    let mut tried = keys.transcript_id_keys.clone();
                    tried.extend(keys.parent_keys.clone());
                    ParseError::MissingAttribute {
                        line_no: rec.line_no,
                        tried,
                    }
                })?;

            let exon = Interval::try_new(rec.start, rec.end).ok_or(IndexError::BadExon {
                gene: gene_key.clone(),
                start: rec.start,
                end: rec.end,
            })?;

            // Parent can be comma-separated in GFF3; support multi-parent exons.
            for tx_key in split_gff3_parent_list(&tx_key_raw) {
                let (gid, tid) = idx.add_exon(&rec.seqname, rec.strand, &gene_key, &tx_key, exon)?;

                for k in &keys.gene_name_keys {
                    if let Some(v) = rec.attr(k) {
                        idx.genes[gid].add_name(v);
                    }
                }
                for k in &keys.transcript_name_keys {
                    if let Some(v) = rec.attr(k) {
                        idx.transcripts[tid].add_name(v);
                    }
                }
            }
        }

        idx.finalize();
        Ok(idx)
    }

    /// Register one exon of transcript `tx_key` belonging to gene `gene_key`.
    ///
    /// Genes and transcripts are created on first sight. A gene must keep
    /// one chromosome and one strand across all its exons.
    pub fn add_exon(
        &mut self,
        chrom: &str,
        strand: Strand,
        gene_key: &str,
        tx_key: &str,
        exon: Interval,
    ) -> Result<(GeneId, TranscriptId), IndexError> {
        if self.finalized {
            return Err(IndexError::Finalized);
        }

        let chr_id = self.intern_chr(chrom);
        let gid = self.intern_gene(gene_key, chr_id, strand)?;
        let tid = self.intern_tx(tx_key, gid, chr_id, strand)?;

        self.transcripts[tid].add_exon(exon);
        Ok((gid, tid))
    }

    /// Merge all footprints, sort genes per chromosome and run the
    /// ambiguous-region sweep. Idempotent.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }

        for tx in &mut self.transcripts {
            tx.finalize();
        }
        for tx in &self.transcripts {
            self.genes[tx.gene_id].add_transcript(tx);
        }
        for g in &mut self.genes {
            g.finalize();
        }

        self.chr_genes = vec![Vec::new(); self.chr_names.len()];
        for g in &self.genes {
            if g.span().is_some() {
                self.chr_genes[g.chr_id].push(g.id);
            }
        }
        for list in &mut self.chr_genes {
            list.sort_by_key(|&gid| (self.genes[gid].start, self.genes[gid].end, gid));
        }

        self.compute_ambiguous_regions();
        self.finalized = true;

        info!(
            "Indexed {} genes ({} transcripts) on {} chromosomes",
            self.genes.len(),
            self.transcripts.len(),
            self.chr_names.len()
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Fill every gene's ambiguous footprints from its exonic overlap with
    /// neighbouring genes.
    ///
    /// Per chromosome, gene `i` is compared with the genes after it only
    /// while they start inside `i`'s span; the list is start-sorted, so the
    /// first gene starting past `end(i)` ends the scan.
    fn compute_ambiguous_regions(&mut self) {
        for g in &mut self.genes {
            g.clear_ambiguous();
        }

        let mut pairs = 0usize;
        for chr_id in 0..self.chr_genes.len() {
            let list = &self.chr_genes[chr_id];
            let mut found: Vec<(GeneId, GeneId, Vec<Interval>, Vec<Interval>)> = Vec::new();

            for (i, &gi) in list.iter().enumerate() {
                let a = &self.genes[gi];
                for &gj in &list[i + 1..] {
                    let b = &self.genes[gj];
                    if b.start > a.end {
                        break;
                    }
                    let stranded = overlap::intersect_stranded(a.footprint(), a.strand, b.footprint(), b.strand);
                    let unstranded = overlap::intersect_unstranded(a.footprint(), b.footprint());
                    if !unstranded.is_empty() {
                        found.push((gi, gj, stranded, unstranded));
                    }
                }
            }

            pairs += found.len();
            for (gi, gj, stranded, unstranded) in found {
                for gid in [gi, gj] {
                    let g = &mut self.genes[gid];
                    g.ambiguous_mut(AmbiguityKind::Stranded).extend(stranded.iter().copied());
                    g.ambiguous_mut(AmbiguityKind::Unstranded).extend(unstranded.iter().copied());
                }
            }
            debug!("{}: ambiguous sweep done", self.chr_names[chr_id]);
        }

        for g in &mut self.genes {
            g.merge_ambiguous();
        }
        debug!("{} exonically overlapping gene pairs", pairs);
    }

    pub fn chr_id(&self, chrom: &str) -> Option<ChrId> {
        self.chr_to_id.get(chrom).copied()
    }

    /// Gene ids on a chromosome, sorted by (start, end).
    pub fn genes_on(&self, chr_id: ChrId) -> &[GeneId] {
        self.chr_genes.get(chr_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn gene(&self, gid: GeneId) -> &Gene {
        &self.genes[gid]
    }

    pub fn gene_id(&self, gene_key: &str) -> Option<GeneId> {
        self.gene_key_to_id.get(gene_key).copied()
    }

    /// Stable identifier the gene was registered under.
    pub fn gene_key(&self, gid: GeneId) -> &str {
        self.genes[gid].primary_name().unwrap_or("")
    }

    /// Fresh cursor set positioned at the start of every list.
    pub fn cursors(&self) -> Cursors {
        Cursors::new(self)
    }

    // -----------------------
    // Internal helpers
    // -----------------------

    fn intern_chr(&mut self, chr: &str) -> ChrId {
        if let Some(&id) = self.chr_to_id.get(chr) {
            return id;
        }
        let id = self.chr_names.len();
        self.chr_names.push(chr.to_string());
        self.chr_to_id.insert(chr.to_string(), id);
        id
    }

    fn intern_gene(&mut self, gene_key: &str, chr_id: ChrId, strand: Strand) -> Result<GeneId, IndexError> {
        if let Some(&gid) = self.gene_key_to_id.get(gene_key) {
            let g = &self.genes[gid];
            if g.chr_id != chr_id {
                return Err(IndexError::InconsistentGene {
                    gene: gene_key.to_string(),
                    first: self.chr_names[g.chr_id].clone(),
                    second: self.chr_names[chr_id].clone(),
                });
            }
            if g.strand != strand {
                return Err(IndexError::strand_conflict(gene_key, g.strand, strand));
            }
            return Ok(gid);
        }

        let gid = self.genes.len();
        self.genes.push(Gene::new(gid, gene_key, chr_id, strand));
        self.gene_key_to_id.insert(gene_key.to_string(), gid);
        Ok(gid)
    }

    fn intern_tx(
        &mut self,
        tx_key: &str,
        gene_id: GeneId,
        chr_id: ChrId,
        strand: Strand,
    ) -> Result<TranscriptId, IndexError> {
        if let Some(&tid) = self.tx_key_to_id.get(tx_key) {
            let tx = &self.transcripts[tid];
            if tx.gene_id != gene_id {
                return Err(IndexError::InconsistentGene {
                    gene: self.gene_key(gene_id).to_string(),
                    first: format!("transcript {tx_key} of {}", self.gene_key(tx.gene_id)),
                    second: format!("transcript {tx_key} of {}", self.gene_key(gene_id)),
                });
            }
            return Ok(tid);
        }

        let tid = self.transcripts.len();
        self.transcripts.push(Transcript::new(tid, gene_id, tx_key, chr_id, strand));
        self.tx_key_to_id.insert(tx_key.to_string(), tid);
        Ok(tid)
    }
}

/// Forward-only traversal state over one `AnnotationIndex`.
///
/// One chromosome cursor (offset into the sorted gene list) per chromosome
/// and one exon cursor (offset into the merged footprint) per gene. Offsets
/// only grow; `reset` is the only way back.
///
/// Precondition: queries are presented in non-decreasing coordinate order
/// per chromosome. Violating it does not panic, it yields wrong overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursors {
    chr: Vec<usize>,
    exon: Vec<usize>,
}

impl Cursors {
    pub fn new(index: &AnnotationIndex) -> Self {
        Self {
            chr: vec![0; index.chr_genes.len()],
            exon: vec![0; index.genes.len()],
        }
    }

    /// Gene under the chromosome cursor, `None` once the list is exhausted.
    pub fn current_gene(&self, index: &AnnotationIndex, chr_id: ChrId) -> Option<GeneId> {
        let offset = *self.chr.get(chr_id)?;
        index.genes_on(chr_id).get(offset).copied()
    }

    /// Step the chromosome cursor and return the new current gene.
    pub fn advance_gene(&mut self, index: &AnnotationIndex, chr_id: ChrId) -> Option<GeneId> {
        let len = index.genes_on(chr_id).len();
        let offset = self.chr.get_mut(chr_id)?;
        if *offset < len {
            *offset += 1;
        }
        index.genes_on(chr_id).get(*offset).copied()
    }

    /// Offset into the gene list of `chr_id`.
    pub fn gene_offset(&self, chr_id: ChrId) -> usize {
        self.chr.get(chr_id).copied().unwrap_or(0)
    }

    pub fn current_exon_index(&self, gene: GeneId) -> usize {
        self.exon[gene]
    }

    /// Step the exon cursor of `gene`, saturating at the footprint length.
    pub fn advance_exon(&mut self, index: &AnnotationIndex, gene: GeneId) -> usize {
        let len = index.genes[gene].exons().len();
        let offset = &mut self.exon[gene];
        if *offset < len {
            *offset += 1;
        }
        *offset
    }

    pub fn reset(&mut self) {
        self.chr.iter_mut().for_each(|c| *c = 0);
        self.exon.iter_mut().for_each(|e| *e = 0);
    }
}

/// Split Parent= list (GFF3) by commas; also trim whitespace.
fn split_gff3_parent_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.contains(',') {
        raw.split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    } else {
        vec![raw.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn two_gene_index() -> AnnotationIndex {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "A", "A.1", Interval::new(100, 150)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "A", "A.1", Interval::new(160, 200)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "B", "B.1", Interval::new(140, 170)).unwrap();
        idx.finalize();
        idx
    }

    #[test]
    fn ambiguous_regions_for_overlapping_same_strand_genes() {
        let idx = two_gene_index();
        let a = idx.gene(idx.gene_id("A").unwrap());
        let b = idx.gene(idx.gene_id("B").unwrap());

        assert_eq!(a.total_length(), 92);
        assert_eq!(b.total_length(), 31);
        assert_eq!(
            a.ambiguous(AmbiguityKind::Stranded).intervals(),
            &[Interval::new(140, 150), Interval::new(160, 170)]
        );
        assert_eq!(a.ambiguous_length(AmbiguityKind::Stranded), 22);
        assert_eq!(b.ambiguous_length(AmbiguityKind::Stranded), 22);
        assert_eq!(a.exclusive_length(AmbiguityKind::Stranded), 70);
        assert_eq!(b.exclusive_length(AmbiguityKind::Stranded), 9);
        assert_eq!(a.exclusive_length(AmbiguityKind::Unstranded), 70);
    }

    #[test]
    fn opposite_strand_overlap_is_only_unstranded_ambiguity() {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "P", "P.1", Interval::new(1, 100)).unwrap();
        idx.add_exon("chr1", Strand::Minus, "M", "M.1", Interval::new(51, 150)).unwrap();
        idx.finalize();

        let p = idx.gene(idx.gene_id("P").unwrap());
        assert_eq!(p.ambiguous_length(AmbiguityKind::Stranded), 0);
        assert_eq!(p.ambiguous_length(AmbiguityKind::Unstranded), 50);
        assert_eq!(p.exclusive_length(AmbiguityKind::Unstranded), 50);
    }

    #[test]
    fn ambiguity_from_several_neighbours_is_merged() {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "BIG", "t", Interval::new(1, 1000)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "X", "x", Interval::new(100, 200)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "Y", "y", Interval::new(150, 300)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "Z", "z", Interval::new(2000, 2100)).unwrap();
        idx.finalize();

        let big = idx.gene(idx.gene_id("BIG").unwrap());
        assert_eq!(big.ambiguous(AmbiguityKind::Stranded).intervals(), &[Interval::new(100, 300)]);
        assert_eq!(big.exclusive_length(AmbiguityKind::Stranded), 1000 - 201);

        let z = idx.gene(idx.gene_id("Z").unwrap());
        assert_eq!(z.ambiguous_length(AmbiguityKind::Unstranded), 0);

        for g in &idx.genes {
            assert!(g.ambiguous_length(AmbiguityKind::Stranded) <= g.total_length());
            assert!(g.ambiguous_length(AmbiguityKind::Unstranded) <= g.total_length());
        }
    }

    #[test]
    fn intronic_overlap_is_not_ambiguous() {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "HOST", "h", Interval::new(1, 100)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "HOST", "h", Interval::new(900, 1000)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "NESTED", "n", Interval::new(400, 500)).unwrap();
        idx.finalize();

        for g in &idx.genes {
            assert_eq!(g.ambiguous_length(AmbiguityKind::Unstranded), 0);
        }
    }

    #[test]
    fn genes_sorted_by_start_then_end() {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "C", "c", Interval::new(500, 600)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "B", "b", Interval::new(100, 900)).unwrap();
        idx.add_exon("chr1", Strand::Plus, "A", "a", Interval::new(100, 200)).unwrap();
        idx.add_exon("chr2", Strand::Minus, "D", "d", Interval::new(5, 10)).unwrap();
        idx.finalize();

        let chr1 = idx.chr_id("chr1").unwrap();
        let names: Vec<&str> = idx.genes_on(chr1).iter().map(|&g| idx.gene_key(g)).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(idx.genes_on(idx.chr_id("chr2").unwrap()).len(), 1);
        assert!(idx.chr_id("chrX").is_none());
    }

    #[test]
    fn inconsistent_gene_is_rejected() {
        let mut idx = AnnotationIndex::new();
        idx.add_exon("chr1", Strand::Plus, "G", "t1", Interval::new(1, 10)).unwrap();
        let err = idx.add_exon("chr1", Strand::Minus, "G", "t2", Interval::new(20, 30));
        assert!(matches!(err, Err(IndexError::InconsistentGene { .. })));
        let err = idx.add_exon("chr2", Strand::Plus, "G", "t3", Interval::new(20, 30));
        assert!(matches!(err, Err(IndexError::InconsistentGene { .. })));
    }

    #[test]
    fn add_after_finalize_fails() {
        let mut idx = two_gene_index();
        let err = idx.add_exon("chr1", Strand::Plus, "C", "c", Interval::new(1, 2));
        assert!(matches!(err, Err(IndexError::Finalized)));
    }

    #[test]
    fn cursors_move_forward_and_reset() {
        let idx = two_gene_index();
        let chr = idx.chr_id("chr1").unwrap();
        let a = idx.gene_id("A").unwrap();
        let b = idx.gene_id("B").unwrap();

        let mut cur = idx.cursors();
        assert_eq!(cur.current_gene(&idx, chr), Some(a));
        assert_eq!(cur.advance_gene(&idx, chr), Some(b));
        assert_eq!(cur.advance_gene(&idx, chr), None);
        // exhausted stays exhausted
        assert_eq!(cur.advance_gene(&idx, chr), None);
        assert_eq!(cur.gene_offset(chr), 2);

        assert_eq!(cur.current_exon_index(a), 0);
        assert_eq!(cur.advance_exon(&idx, a), 1);
        assert_eq!(cur.advance_exon(&idx, a), 2);
        assert_eq!(cur.advance_exon(&idx, a), 2);

        cur.reset();
        assert_eq!(cur.current_gene(&idx, chr), Some(a));
        assert_eq!(cur.current_exon_index(a), 0);
        assert_eq!(cur, idx.cursors());
    }

    #[test]
    fn builds_index_from_minimal_gtf() {
        let gtf = "\
chr1\tsrc\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; gene_name \"Alpha\"; transcript_id \"T1\"; transcript_name \"TxA\";
chr1\tsrc\texon\t201\t250\t.\t+\t.\tgene_id \"G1\"; gene_name \"Alpha\"; transcript_id \"T1\"; transcript_name \"TxA\";
chr1\tsrc\texon\t131\t210\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";
";
        let idx = AnnotationIndex::from_reader(Cursor::new(gtf.as_bytes()), &IdNameKeys::default()).unwrap();

        assert_eq!(idx.chr_names, vec!["chr1".to_string()]);
        assert_eq!(idx.genes.len(), 1);
        assert_eq!(idx.transcripts.len(), 2);
        assert_eq!(idx.gene_key(0), "G1");
        assert!(idx.genes[0].names.iter().any(|n| n == "Alpha"));
        assert!(idx.transcripts[0].names.iter().any(|n| n == "TxA"));
        assert_eq!(idx.genes[0].exons(), &[Interval::new(101, 250)]);
        assert!(idx.is_finalized());
    }

    #[test]
    fn gff3_parent_multi_value_creates_two_transcripts() {
        let gff = "\
chr2\tsrc\texon\t5\t20\t.\t-\t.\tParent=tx1,tx2;gene_id=G9;Name=GeneNice
";
        let keys = IdNameKeys {
            transcript_id_keys: vec![], // force Parent usage
            ..IdNameKeys::default()
        };

        let idx = AnnotationIndex::from_reader(Cursor::new(gff.as_bytes()), &keys).unwrap();

        assert_eq!(idx.genes.len(), 1);
        assert_eq!(idx.transcripts.len(), 2);
        assert_eq!(idx.transcripts[0].strand, Strand::Minus);
        assert_eq!(idx.transcripts[1].exons().intervals(), &[Interval::new(5, 20)]);
        assert!(idx.genes[0].names.iter().any(|n| n == "GeneNice"));
    }

    #[test]
    fn missing_gene_id_is_a_parse_error() {
        let gtf = "chr1\tsrc\texon\t1\t10\t.\t+\t.\ttranscript_id \"T1\";\n";
        let err = AnnotationIndex::from_reader(Cursor::new(gtf.as_bytes()), &IdNameKeys::default());
        assert!(matches!(err, Err(IndexError::Parse(ParseError::MissingAttribute { .. }))));
    }

    #[test]
    fn display_summarises_chromosomes() {
        let idx = two_gene_index();
        let s = idx.to_string();
        assert!(s.starts_with("AnnotationIndex: 2 genes, 2 transcripts, 1 chromosomes"));
        assert!(s.contains("chr1: genes=2, exonic_bp=123, ambiguous_bp(stranded)=44"));
    }
}
