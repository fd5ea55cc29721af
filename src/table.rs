use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::data::model::Segment;
use crate::error::Result;

pub const CONTACT_COLUMNS: [&str; 7] =
    ["chrom1", "start1", "end1", "chrom2", "start2", "end2", "count"];
pub const DISTANCE_COLUMNS: [&str; 7] =
    ["chrom1", "start1", "end1", "chrom2", "start2", "end2", "distance"];

// ---------------------------------------------------------------------------
// Records – one output row each
// ---------------------------------------------------------------------------

/// One contact between two annotated marks. `count` is always 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub chrom1: String,
    pub start1: i64,
    pub end1: i64,
    pub chrom2: String,
    pub start2: i64,
    pub end2: i64,
    pub count: i64,
}

impl ContactRecord {
    pub fn new(first: &Segment, second: &Segment) -> Self {
        ContactRecord {
            chrom1: first.chrom.clone(),
            start1: first.start,
            end1: first.end,
            chrom2: second.chrom.clone(),
            start2: second.start,
            end2: second.end,
            count: 1,
        }
    }
}

/// Measured distance between two annotated marks; NaN when unmeasured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub chrom1: String,
    pub start1: i64,
    pub end1: i64,
    pub chrom2: String,
    pub start2: i64,
    pub end2: i64,
    pub distance: f64,
}

impl DistanceRecord {
    pub fn new(first: &Segment, second: &Segment, distance: f64) -> Self {
        DistanceRecord {
            chrom1: first.chrom.clone(),
            start1: first.start,
            end1: first.end,
            chrom2: second.chrom.clone(),
            start2: second.start,
            end2: second.end,
            distance,
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Annotated contacts, one row per stored contact pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactTable {
    pub records: Vec<ContactRecord>,
}

/// Annotated distances, one row per unordered pair `i <= j`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistanceTable {
    pub records: Vec<DistanceRecord>,
}

macro_rules! table_impl {
    ($table:ty, $record:ty, $columns:expr) => {
        impl $table {
            pub fn len(&self) -> usize {
                self.records.len()
            }

            pub fn is_empty(&self) -> bool {
                self.records.is_empty()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $record> {
                self.records.iter()
            }

            /// Write as tab-separated text with a header row.
            pub fn write_tsv(&self, writer: impl Write) -> Result<()> {
                write_records(writer, $columns, &self.records)
            }
        }
    };
}

table_impl!(ContactTable, ContactRecord, &CONTACT_COLUMNS);
table_impl!(DistanceTable, DistanceRecord, &DISTANCE_COLUMNS);

// ---------------------------------------------------------------------------
// TSV encoding
// ---------------------------------------------------------------------------

/// Serialise records as TSV: header first (even for an empty table), no
/// index column, fields in declaration order. NaN is written as `NaN`.
fn write_records<R: Serialize>(writer: impl Write, columns: &[&str], records: &[R]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(columns)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_records<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Read a contacts TSV written by [`ContactTable::write_tsv`].
pub fn read_contacts(path: &Path) -> Result<ContactTable> {
    Ok(ContactTable {
        records: read_records(path)?,
    })
}

/// Read a distances TSV written by [`DistanceTable::write_tsv`].
pub fn read_distances(path: &Path) -> Result<DistanceTable> {
    Ok(DistanceTable {
        records: read_records(path)?,
    })
}
