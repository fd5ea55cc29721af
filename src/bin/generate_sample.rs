use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use imaging_contacts::data::loader::{
    load_coordinates, load_matrix, load_metadata, PARQUET_MATRIX_COLUMN,
};
use imaging_contacts::{ExperimentConfig, ExperimentState, ImagingExperiment, Segment};

const N_MARKS: usize = 30;
const SEGMENT_LEN: i64 = 30_000;
const REGION_START: i64 = 1_000_000;
/// Chance that a mark is not detected in the image.
const DROPOUT: f64 = 0.1;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Gaussian random walk in nm, one step per mark; undetected marks are `None`.
fn chromatin_walk(rng: &mut SimpleRng) -> Vec<Option<[f64; 3]>> {
    let mut pos = [0.0f64; 3];
    (0..N_MARKS)
        .map(|_| {
            for axis in &mut pos {
                *axis += rng.gauss(0.0, 70.0);
            }
            (rng.next_f64() >= DROPOUT).then_some(pos)
        })
        .collect()
}

fn distance_matrix(points: &[Option<[f64; 3]>]) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|a| {
            points
                .iter()
                .map(|b| match (a, b) {
                    (Some(a), Some(b)) => a
                        .iter()
                        .zip(b)
                        .map(|(x, y)| (x - y).powi(2))
                        .sum::<f64>()
                        .sqrt(),
                    _ => f64::NAN,
                })
                .collect()
        })
        .collect()
}

fn write_matrix_parquet(path: &Path, matrix: &[Vec<f64>]) -> Result<()> {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in matrix {
        let values = builder.values();
        for &v in row {
            values.append_option((!v.is_nan()).then_some(v));
        }
        builder.append(true);
    }
    let array = builder.finish();

    let schema = Arc::new(Schema::new(vec![Field::new(
        PARQUET_MATRIX_COLUMN,
        DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
        false,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(array)])
        .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating matrix file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing matrix")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_segments(path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .context("creating segments file")?;
    for k in 0..N_MARKS as i64 {
        let start = REGION_START + k * SEGMENT_LEN;
        wtr.serialize(Segment::new("chr2", start, start + SEGMENT_LEN))?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let matrix = distance_matrix(&chromatin_walk(&mut rng));

    let matrix_path = Path::new("sample_distances.parquet");
    let segments_path = Path::new("sample_segments.tsv");
    let metadata_path = Path::new("sample_metadata.json");

    write_matrix_parquet(matrix_path, &matrix)?;
    write_segments(segments_path)?;
    let metadata = serde_json::json!({
        "experiment_id": "sample",
        "condition": "untreated",
        "replicate": 1
    });
    std::fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)
        .context("writing metadata")?;

    // Read everything back the way a real run would.
    let config = ExperimentConfig {
        contacts_template: Some("contacts_{experiment_id}_{condition}_r{replicate}.tsv".into()),
        distances_template: Some("distances_{experiment_id}_{condition}_r{replicate}.tsv".into()),
        ..ExperimentConfig::default()
    };
    let experiment =
        ImagingExperiment::from_parts(load_matrix(matrix_path)?, load_metadata(metadata_path)?);
    let coords = load_coordinates(segments_path, config.one_based)?;

    let mut state = ExperimentState::new(experiment);
    let outputs = state.run(&config, &coords)?;

    let n_contacts = state.contact_table().map_or(0, |t| t.len());
    let n_distances = state.distance_table().map_or(0, |t| t.len());
    println!(
        "Wrote {N_MARKS} marks to {}; {n_contacts} contacts -> {:?}, {n_distances} distances -> {:?}",
        matrix_path.display(),
        outputs.contacts,
        outputs.distances,
    );
    Ok(())
}
