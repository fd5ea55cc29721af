use std::path::PathBuf;

use crate::config::ExperimentConfig;
use crate::data::model::CoordinateTable;
use crate::error::{ContactsError, Result};
use crate::experiment::{annotate_contacts, ContactList, ImagingExperiment};
use crate::table::{ContactTable, DistanceTable};

// ---------------------------------------------------------------------------
// Experiment state
// ---------------------------------------------------------------------------

/// An experiment plus the derived views computed from it so far.
///
/// Steps must run in order: contacts → contact table → save, and
/// distance table → save. Calling a step early is a
/// [`ContactsError::MissingPrerequisite`].
#[derive(Debug, Clone)]
pub struct ExperimentState {
    /// Immutable input.
    pub experiment: ImagingExperiment,

    /// Thresholded matrix positions (None until `convert_to_contacts`).
    contacts: Option<ContactList>,

    /// Annotated contacts (None until `annotate_contacts`).
    contact_table: Option<ContactTable>,

    /// Annotated distances (None until `annotate_distances`).
    distance_table: Option<DistanceTable>,
}

/// Files written by [`ExperimentState::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutputs {
    pub contacts: Option<PathBuf>,
    pub distances: Option<PathBuf>,
}

impl ExperimentState {
    pub fn new(experiment: ImagingExperiment) -> Self {
        Self {
            experiment,
            contacts: None,
            contact_table: None,
            distance_table: None,
        }
    }

    pub fn contacts(&self) -> Option<&ContactList> {
        self.contacts.as_ref()
    }

    pub fn contact_table(&self) -> Option<&ContactTable> {
        self.contact_table.as_ref()
    }

    pub fn distance_table(&self) -> Option<&DistanceTable> {
        self.distance_table.as_ref()
    }

    /// Threshold the matrix, replacing any earlier contact list.
    pub fn convert_to_contacts(&mut self, threshold: f64) -> &ContactList {
        self.contacts
            .insert(self.experiment.convert_to_contacts(threshold))
    }

    /// Annotate the stored contact list. On error the previous table is kept.
    pub fn annotate_contacts(
        &mut self,
        coordinates: &CoordinateTable,
        one_based: bool,
    ) -> Result<&ContactTable> {
        let contacts = self
            .contacts
            .as_ref()
            .ok_or(ContactsError::MissingPrerequisite {
                step: "annotate_contacts",
                requires: "convert_to_contacts",
            })?;
        let table = annotate_contacts(contacts, coordinates, one_based)?;
        Ok(self.contact_table.insert(table))
    }

    /// Annotate all pairwise distances. On error the previous table is kept.
    pub fn annotate_distances(
        &mut self,
        coordinates: &CoordinateTable,
        one_based: bool,
    ) -> Result<&DistanceTable> {
        let table = self.experiment.annotate_distances(coordinates, one_based)?;
        Ok(self.distance_table.insert(table))
    }

    pub fn save_contacts(&self, template: &str) -> Result<PathBuf> {
        let table = self
            .contact_table
            .as_ref()
            .ok_or(ContactsError::MissingPrerequisite {
                step: "save_contacts",
                requires: "annotate_contacts",
            })?;
        self.experiment.save_contacts(table, template)
    }

    pub fn save_distances(&self, template: &str) -> Result<PathBuf> {
        let table = self
            .distance_table
            .as_ref()
            .ok_or(ContactsError::MissingPrerequisite {
                step: "save_distances",
                requires: "annotate_distances",
            })?;
        self.experiment.save_distances(table, template)
    }

    /// Convert, annotate and save in one go. Tables without a template in
    /// `config` are computed but not written.
    pub fn run(
        &mut self,
        config: &ExperimentConfig,
        coordinates: &CoordinateTable,
    ) -> Result<RunOutputs> {
        self.convert_to_contacts(config.threshold);
        self.annotate_contacts(coordinates, config.one_based)?;
        self.annotate_distances(coordinates, config.one_based)?;

        let mut outputs = RunOutputs::default();
        if let Some(template) = &config.contacts_template {
            outputs.contacts = Some(self.save_contacts(template)?);
        }
        if let Some(template) = &config.distances_template {
            outputs.distances = Some(self.save_distances(template)?);
        }
        Ok(outputs)
    }
}
