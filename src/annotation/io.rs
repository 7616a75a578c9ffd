use std::collections::HashMap;
use std::io::BufRead;

use crate::types::Strand;

/// File dialect detected from attribute syntax.
///
/// - GFF3 typically uses: key=value;key2=value2
/// - GTF typically uses: key "value"; key2 "value2";
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Gff3,
    Gtf,
    Unknown,
}

/// A single parsed record line from GTF/GFF3.
///
/// Coordinates are kept as in the file: 1-based, inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub line_no: usize,
    pub seqname: String,      // chromosome / contig
    pub source: String,       // column 2
    pub feature_type: String, // column 3
    pub start: u32,
    pub end: u32,
    pub score: Option<f32>,   // '.' => None
    pub strand: Strand,       // + / - / . / ?
    pub phase: Option<u8>,    // '.' => None, else 0/1/2
    pub attrs: HashMap<String, String>,
    pub dialect: Dialect,
}

impl AnnotationRecord {
    /// Convenience: get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|s| s.as_str())
    }

    pub fn is_exon_feature(&self, exon_types: &[String]) -> bool {
        exon_types.iter().any(|t| t == &self.feature_type)
    }

    pub fn pick_first_attr(&self, keys: &[String]) -> Option<String> {
        for k in keys {
            if let Some(v) = self.attr(k) {
                let v = v.trim();
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
        None
    }
}

/// Parsing errors for GTF/GFF3.
#[derive(Debug)]
pub enum ParseError {
    IoPath { path: String, source: std::io::Error },
    MalformedLine { line_no: usize, line: String },
    BadCoordinates { line_no: usize, line: String },
    MissingAttribute { line_no: usize, tried: Vec<String> },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IoPath { path, source } => {
                write!(f, "I/O error while reading '{}': {}", path, source)
            }
            ParseError::MalformedLine { line_no, line } => {
                write!(f, "Malformed GTF/GFF line {}: {}", line_no, line)
            }
            ParseError::BadCoordinates { line_no, line } => {
                write!(f, "Bad coordinates in line {}: {}", line_no, line)
            }
            ParseError::MissingAttribute { line_no, tried } => {
                write!(f, "Line {}: none of the attributes {:?} is present", line_no, tried)
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::IoPath { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Low-level streaming parser for GTF/GFF3 files.
///
/// Most users should **not** use this directly.
/// Instead, use [`crate::annotation::AnnotationBuilder`] to build a full
/// `AnnotationIndex` from a file in one step.
///
/// # Example (streaming low-level usage)
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use gene_counter::annotation::io::AnnotationReader;
///
/// let file = File::open("genes.gtf").unwrap();
/// let reader = BufReader::new(file);
///
/// for rec in AnnotationReader::new(reader).records() {
///     let rec = rec.unwrap();
///     println!("{} {}-{}", rec.seqname, rec.start, rec.end);
/// }
/// ```
pub struct AnnotationReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
        }
    }

    /// Returns an iterator over parsed records.
    ///
    /// - Skips blank lines
    /// - Skips comment lines starting with '#'
    pub fn records(mut self) -> impl Iterator<Item = Result<AnnotationRecord, ParseError>> {
        std::iter::from_fn(move || loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    return Some(Err(ParseError::IoPath {
                        path: "<reader>".to_string(),
                        source: e,
                    }))
                }
            }

            let line = self.buf.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            return Some(parse_record_line(line, self.line_no));
        })
    }
}

/// Parse a single non-comment line into an `AnnotationRecord`.
pub fn parse_record_line(line: &str, line_no: usize) -> Result<AnnotationRecord, ParseError> {
    let malformed = || ParseError::MalformedLine {
        line_no,
        line: line.to_string(),
    };
    let bad_coords = || ParseError::BadCoordinates {
        line_no,
        line: line.to_string(),
    };

    // GTF/GFF have 9 tab-separated columns:
    // seqname source feature start end score strand phase attributes
    let cols: Vec<&str> = line.split('\t').collect();
    let [seqname, source, feature_type, start_s, end_s, score_s, strand_s, phase_s, attrs_s] =
        cols.as_slice()
    else {
        return Err(malformed());
    };

    let start: u32 = start_s.parse().map_err(|_| bad_coords())?;
    let end: u32 = end_s.parse().map_err(|_| bad_coords())?;
    if start == 0 || end < start {
        return Err(bad_coords());
    }

    let score = if *score_s == "." {
        None
    } else {
        Some(score_s.parse::<f32>().map_err(|_| malformed())?)
    };

    let strand = match *strand_s {
        "+" => Strand::Plus,
        "-" => Strand::Minus,
        "." | "?" => Strand::Unknown,
        _ => return Err(malformed()),
    };

    let phase = if *phase_s == "." {
        None
    } else {
        let p: u8 = phase_s.parse().map_err(|_| malformed())?;
        if p > 2 {
            return Err(malformed());
        }
        Some(p)
    };

    let (dialect, attrs) = parse_attributes(attrs_s);

    Ok(AnnotationRecord {
        line_no,
        seqname: seqname.to_string(),
        source: source.to_string(),
        feature_type: feature_type.to_string(),
        start,
        end,
        score,
        strand,
        phase,
        attrs,
        dialect,
    })
}

/// Parse the attributes field for either GFF3 or GTF.
///
/// Heuristics:
/// - If it contains '=' => treat as GFF3
/// - Else if it contains quotes => treat as GTF
/// - Else Unknown, but parse best-effort
pub fn parse_attributes(s: &str) -> (Dialect, HashMap<String, String>) {
    let s = s.trim();

    let dialect = if s.contains('=') {
        Dialect::Gff3
    } else if s.contains('"') {
        Dialect::Gtf
    } else {
        Dialect::Unknown
    };

    let mut map = HashMap::new();

    for part in s.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let gff_style = match dialect {
            Dialect::Gff3 => true,
            Dialect::Gtf => false,
            Dialect::Unknown => part.contains('='),
        };
        let (key, value) = if gff_style {
            let mut kv = part.splitn(2, '=');
            (kv.next().unwrap_or("").trim(), kv.next().unwrap_or("").trim())
        } else {
            let mut it = part.splitn(2, char::is_whitespace);
            (it.next().unwrap_or("").trim(), it.next().unwrap_or("").trim())
        };
        if key.is_empty() {
            continue;
        }
        let value = unquote(value);
        if gff_style || !value.is_empty() {
            map.insert(key.to_string(), value);
        }
    }

    (dialect, map)
}

fn unquote(v: &str) -> String {
    let v = v.trim();
    let v = v.strip_prefix('"').unwrap_or(v);
    let v = v.strip_suffix('"').unwrap_or(v);
    v.to_string()
}
