//! Convert multi-region microscopy distance matrices into genomic contact and
//! distance tables.
//!
//! A typical run:
//!
//! ```no_run
//! use std::path::Path;
//! use imaging_contacts::{annotate_contacts, data::loader, ImagingExperiment};
//!
//! # fn main() -> anyhow::Result<()> {
//! let matrix = loader::load_matrix(Path::new("exp1_distances.parquet"))?;
//! let metadata = loader::load_metadata(Path::new("exp1_metadata.json"))?;
//! let coords = loader::load_coordinates(Path::new("segments.tsv"), true)?;
//!
//! let exp = ImagingExperiment::from_parts(matrix, metadata);
//! let contacts = exp.convert_to_contacts(150.0);
//! let table = annotate_contacts(&contacts, &coords, true)?;
//! exp.save_contacts(&table, "contacts_{experiment_id}.tsv")?;
//!
//! let distances = exp.annotate_distances(&coords, true)?;
//! exp.save_distances(&distances, "distances_{experiment_id}.tsv")?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ExperimentState`] keeps the derived tables between calls instead.

pub mod config;
pub mod data;
pub mod error;
pub mod experiment;
pub mod state;
pub mod table;
pub mod template;

pub use config::ExperimentConfig;
pub use data::model::{CoordinateTable, DistanceMatrix, Metadata, MetadataValue, Segment};
pub use error::{ContactsError, Result};
pub use experiment::{annotate_contacts, ContactList, ImagingExperiment, DEFAULT_THRESHOLD};
pub use state::{ExperimentState, RunOutputs};
pub use table::{
    read_contacts, read_distances, ContactRecord, ContactTable, DistanceRecord, DistanceTable,
};
