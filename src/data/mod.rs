/// Data layer: input types and loading.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv / .tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → DistanceMatrix / CoordinateTable / Metadata
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ ImagingExperiment│  matrix + metadata, derived tables on demand
///   └────────────────┘
/// ```

pub mod loader;
pub mod model;
