use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ContactsError, Result};

// ---------------------------------------------------------------------------
// MetadataValue – a single experiment-level scalar
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata scalar (experiment id, condition, replicate…).
/// Only ever rendered into output filenames.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => f.write_str(&format_float(*v)),
            MetadataValue::Bool(true) => write!(f, "True"),
            MetadataValue::Bool(false) => write!(f, "False"),
            MetadataValue::Null => write!(f, "None"),
        }
    }
}

/// Shortest round-trip float text as experiment sheets spell it: a fraction
/// is always shown, scientific notation below 1e-4 and from 1e16 with a
/// signed, at least two-digit exponent (`1e+20`, `2.5e-07`).
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{v:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if (-4..16).contains(&exp) {
        let plain = format!("{v}");
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// Experiment metadata: key → scalar, consumed by filename templates.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// DistanceMatrix – pairwise mark distances
// ---------------------------------------------------------------------------

/// Pairwise distances between marks, stored row by row.
///
/// Square and symmetric by convention only; nothing here checks either.
/// Unmeasured pairs are NaN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        DistanceMatrix { rows }
    }

    /// Number of marks (rows).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entry at `[row, col]`, or `None` when the matrix is too small there.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// All entries as `(row, col, value)` in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
    }
}

impl From<Vec<Vec<f64>>> for DistanceMatrix {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        DistanceMatrix::from_rows(rows)
    }
}

// ---------------------------------------------------------------------------
// Coordinate table – mark index → genomic segment
// ---------------------------------------------------------------------------

/// Genomic region assigned to one mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Segment {
    pub fn new(chrom: impl Into<String>, start: i64, end: i64) -> Self {
        Segment {
            chrom: chrom.into(),
            start,
            end,
        }
    }
}

/// Segments keyed by their row index label.
///
/// Whether labels start at 0 or 1 is the caller's business; annotation
/// calls declare it with their `one_based` flag. Rows are neither sorted by
/// position nor checked for overlap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateTable {
    rows: BTreeMap<usize, Segment>,
}

impl CoordinateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label `segments` consecutively, starting at 1 if `one_based` else 0.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>, one_based: bool) -> Self {
        let base = usize::from(one_based);
        let rows = segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| (i + base, seg))
            .collect();
        CoordinateTable { rows }
    }

    /// Insert a row under an explicit label, returning any row it replaced.
    pub fn insert(&mut self, index: usize, segment: Segment) -> Option<Segment> {
        self.rows.insert(index, segment)
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.rows.get(&index)
    }

    /// Like [`get`](Self::get) but a miss is a [`ContactsError::CoordinateNotFound`].
    pub fn lookup(&self, index: usize) -> Result<&Segment> {
        self.rows
            .get(&index)
            .ok_or(ContactsError::CoordinateNotFound { index })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowest index label, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.rows.keys().next().copied()
    }
}
