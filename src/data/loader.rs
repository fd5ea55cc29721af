use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, LargeListArray, ListArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{CoordinateTable, DistanceMatrix, Metadata, MetadataValue, Segment};

/// Name of the list column holding matrix rows in parquet input.
pub const PARQUET_MATRIX_COLUMN: &str = "distances";

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Distance matrix
// ---------------------------------------------------------------------------

/// Load a distance matrix from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one `distances` list column, one matrix row per record
/// * `.json`    – `[[0.0, 120.5, ...], ...]`, `null` for unmeasured pairs
/// * `.csv` / `.tsv` – headerless numeric rows, empty or `NaN` cells unmeasured
///
/// Rows are taken as they come: a ragged or non-square matrix loads fine.
pub fn load_matrix(path: &Path) -> Result<DistanceMatrix> {
    let matrix = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet_matrix(path)?,
        "json" => load_json_matrix(path)?,
        "csv" => load_delimited_matrix(path, b',')?,
        "tsv" | "txt" => load_delimited_matrix(path, b'\t')?,
        other => bail!("Unsupported matrix file extension: .{other}"),
    };
    log::debug!("loaded {}-row distance matrix from {}", matrix.len(), path.display());
    Ok(matrix)
}

fn load_json_matrix(path: &Path) -> Result<DistanceMatrix> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let matrix = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .with_context(|| format!("Row {i} is not a JSON array"))?;
            cells
                .iter()
                .enumerate()
                .map(|(j, v)| match v {
                    JsonValue::Null => Ok(f64::NAN),
                    other => other
                        .as_f64()
                        .with_context(|| format!("Row {i}, column {j}: not a number")),
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DistanceMatrix::from_rows(matrix))
}

fn load_delimited_matrix(path: &Path, delimiter: u8) -> Result<DistanceMatrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited matrix")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("matrix row {row_no}"))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(j, cell)| parse_distance(cell, row_no, j))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Ok(DistanceMatrix::from_rows(rows))
}

fn parse_distance(cell: &str, row: usize, col: usize) -> Result<f64> {
    let tok = cell.trim();
    if tok.is_empty() || tok.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    tok.parse::<f64>()
        .with_context(|| format!("Row {row}, column {col}: '{tok}' is not a number"))
}

/// Expected schema: a `distances` column of List<Float64> (or Float32,
/// LargeList). Null cells inside a row read as NaN.
fn load_parquet_matrix(path: &Path) -> Result<DistanceMatrix> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let col_idx = batch.schema().index_of(PARQUET_MATRIX_COLUMN).map_err(|_| {
            anyhow::anyhow!("Parquet file missing '{PARQUET_MATRIX_COLUMN}' column")
        })?;
        let col = batch.column(col_idx);

        for row in 0..batch.num_rows() {
            let values = extract_f64_list(col, row)
                .with_context(|| format!("Row {}: failed to read distances", rows.len()))?;
            rows.push(values);
        }
    }

    Ok(DistanceMatrix::from_rows(rows))
}

/// One matrix row out of the `distances` list column (List or LargeList of
/// Float64/Float32).
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("'{PARQUET_MATRIX_COLUMN}' is null; a whole matrix row cannot be missing");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("'{PARQUET_MATRIX_COLUMN}' must be a list of floats, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!(
            "'{PARQUET_MATRIX_COLUMN}' holds {:?} values, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

// ---------------------------------------------------------------------------
// Coordinate table
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CoordinateRow {
    #[serde(default)]
    index: Option<usize>,
    chrom: String,
    start: i64,
    end: i64,
}

/// Load a coordinate table.
///
/// `.tsv`/`.txt` (tab) and `.csv` (comma) need a `chrom  start  end` header;
/// an extra `index` column, if present, supplies the row labels. `.bed` files
/// are headerless: the first three columns are chrom, start and end, later
/// columns are ignored, and `#`/`track`/`browser` lines are skipped.
/// Without explicit labels rows are numbered from 1 (`one_based`) or 0.
pub fn load_coordinates(path: &Path, one_based: bool) -> Result<CoordinateTable> {
    let rows = match extension(path).as_str() {
        "csv" => read_coordinate_rows(path, b',')?,
        "tsv" | "txt" => read_coordinate_rows(path, b'\t')?,
        "bed" => read_bed_rows(path)?,
        other => bail!("Unsupported coordinate file extension: .{other}"),
    };

    let base = usize::from(one_based);
    let mut table = CoordinateTable::new();
    for (row_no, row) in rows.into_iter().enumerate() {
        let index = row.index.unwrap_or(row_no + base);
        if table
            .insert(index, Segment::new(row.chrom, row.start, row.end))
            .is_some()
        {
            log::warn!("coordinate index {index} appears more than once; keeping the last row");
        }
    }

    log::debug!("loaded {} coordinate rows from {}", table.len(), path.display());
    Ok(table)
}

fn read_coordinate_rows(path: &Path, delimiter: u8) -> Result<Vec<CoordinateRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .context("opening coordinate table")?;

    reader
        .deserialize::<CoordinateRow>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("coordinate row {row_no}")))
        .collect()
}

fn read_bed_rows(path: &Path) -> Result<Vec<CoordinateRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .from_path(path)
        .context("opening BED file")?;

    let mut rows = Vec::new();
    for (line_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("BED line {}", line_no + 1))?;
        let chrom = record.get(0).unwrap_or("").trim();
        if chrom.is_empty() || chrom.starts_with("track") || chrom.starts_with("browser") {
            continue;
        }
        if record.len() < 3 {
            bail!("BED line {}: expected at least 3 columns, found {}", line_no + 1, record.len());
        }
        let coord = |col: usize, name: &str| -> Result<i64> {
            let field = record.get(col).unwrap_or("").trim();
            field
                .parse()
                .with_context(|| format!("BED line {}: invalid {name} '{field}'", line_no + 1))
        };
        rows.push(CoordinateRow {
            index: None,
            chrom: chrom.to_string(),
            start: coord(1, "start")?,
            end: coord(2, "end")?,
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Load experiment metadata from a flat JSON object:
///
/// ```json
/// { "experiment_id": "exp1", "replicate": 2, "condition": "heat_shock" }
/// ```
pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let text = std::fs::read_to_string(path).context("reading metadata file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing metadata JSON")?;
    let obj = root
        .as_object()
        .context("Expected top-level JSON object for metadata")?;

    Ok(obj
        .iter()
        .map(|(key, val)| (key.clone(), json_to_metadata(val)))
        .collect())
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}
