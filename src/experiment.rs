use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::data::model::{CoordinateTable, DistanceMatrix, Metadata};
use crate::error::{ContactsError, Result};
use crate::table::{ContactRecord, ContactTable, DistanceRecord, DistanceTable};
use crate::template;

/// Distance (in the matrix's own unit, usually nm) at or below which two
/// marks count as in contact.
pub const DEFAULT_THRESHOLD: f64 = 150.0;

/// Matrix index shift for a coordinate table labelled from 1 or from 0.
fn index_shift(one_based: bool) -> usize {
    usize::from(one_based)
}

// ---------------------------------------------------------------------------
// ContactList – thresholded matrix positions
// ---------------------------------------------------------------------------

/// Matrix positions `(row, col)` whose distance passed a threshold, in
/// row-major order.
///
/// Both halves of the matrix are scanned, so a contact between two marks
/// shows up as `(i, j)` and `(j, i)`, and self-pairs `(i, i)` are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactList {
    threshold: f64,
    pairs: Vec<(usize, usize)>,
}

impl ContactList {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ImagingExperiment
// ---------------------------------------------------------------------------

/// One multi-region microscopy experiment: the pairwise mark distances and
/// the metadata used to name its output files.
///
/// Nothing is validated on construction. A non-square matrix is accepted and
/// only fails later, where a read falls outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagingExperiment {
    matrix: DistanceMatrix,
    metadata: Metadata,
}

impl ImagingExperiment {
    /// Copy `matrix` and `metadata` into a new experiment.
    pub fn new(matrix: &[Vec<f64>], metadata: &Metadata) -> Self {
        Self::from_parts(matrix.to_vec().into(), metadata.clone())
    }

    pub fn from_parts(matrix: DistanceMatrix, metadata: Metadata) -> Self {
        ImagingExperiment { matrix, metadata }
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of marks.
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Every position with `distance <= threshold`. NaN never qualifies.
    pub fn convert_to_contacts(&self, threshold: f64) -> ContactList {
        let pairs: Vec<(usize, usize)> = self
            .matrix
            .entries()
            .filter(|&(_, _, d)| d <= threshold)
            .map(|(i, j, _)| (i, j))
            .collect();
        log::debug!(
            "{} contacts at threshold {threshold} over {} marks",
            pairs.len(),
            self.len()
        );
        ContactList { threshold, pairs }
    }

    /// Annotate every unordered pair `i <= j` with its coordinates and raw
    /// distance, rows ordered by `i` then `j`. NaN distances are kept.
    pub fn annotate_distances(
        &self,
        coordinates: &CoordinateTable,
        one_based: bool,
    ) -> Result<DistanceTable> {
        let shift = index_shift(one_based);
        let n = self.len();
        let mut records = Vec::with_capacity(n * (n + 1) / 2);

        for i in 0..n {
            let first = coordinates.lookup(i + shift)?;
            for j in i..n {
                let second = coordinates.lookup(j + shift)?;
                let distance = self
                    .matrix
                    .get(i, j)
                    .ok_or(ContactsError::MatrixIndex { row: i, col: j })?;
                records.push(DistanceRecord::new(first, second, distance));
            }
        }

        log::debug!("annotated {} distance pairs", records.len());
        Ok(DistanceTable { records })
    }

    /// Write `table` to the path `template` resolves to, replacing any file
    /// already there.
    pub fn save_contacts(&self, table: &ContactTable, template: &str) -> Result<PathBuf> {
        let path = template::resolve_path(template, &self.metadata)?;
        table.write_tsv(BufWriter::new(File::create(&path)?))?;
        log::info!("wrote {} contacts to {}", table.len(), path.display());
        Ok(path)
    }

    /// Write `table` to the path `template` resolves to, replacing any file
    /// already there.
    pub fn save_distances(&self, table: &DistanceTable, template: &str) -> Result<PathBuf> {
        let path = template::resolve_path(template, &self.metadata)?;
        table.write_tsv(BufWriter::new(File::create(&path)?))?;
        log::info!("wrote {} distances to {}", table.len(), path.display());
        Ok(path)
    }
}

/// Annotate each stored contact with the coordinates of both marks.
///
/// Row `k` of the result corresponds to `contacts.pairs()[k]`.
pub fn annotate_contacts(
    contacts: &ContactList,
    coordinates: &CoordinateTable,
    one_based: bool,
) -> Result<ContactTable> {
    let shift = index_shift(one_based);
    let records = contacts
        .pairs
        .iter()
        .map(|&(i, j)| {
            let first = coordinates.lookup(i + shift)?;
            let second = coordinates.lookup(j + shift)?;
            Ok(ContactRecord::new(first, second))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("annotated {} contacts", records.len());
    Ok(ContactTable { records })
}
