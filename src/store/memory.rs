//! In-process store for tests and offline use.
//!
//! Every mutation happens under one lock, so CSV generation for a batch is
//! serialised: the first trigger renders the artifact, later triggers return
//! it unchanged.

use super::SubmissionStore;
use crate::batches::models::{
    BatchDetails, BatchPayload, BatchStatus, CreatedBatch, PersistedBatch, SamplePayload,
};
use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId, SampleId};
use crate::export::lab_csv::{csv_filename, render_lab_csv};
use crate::export::models::CsvGeneration;
use crate::history::models::PlotHistoryEntry;
use crate::history::services::normalize_plot_id;
use crate::identifiers::persisted_bag_id;
use crate::references::models::{Company, Farm, FarmInput, Field, FieldInput, Grower, GrowerInput};
use crate::samples::models::PersistedSample;
use crate::{not_found, remote_unavailable};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const BATCH_PREFIX: &str = "KAS";
const FIRST_BATCH_NUMBER: u32 = 10_001;
const MIN_HISTORY_PLOT_ID_LEN: usize = 2;

struct StoredBatch {
    batch: PersistedBatch,
    samples: Vec<PersistedSample>,
    artifact: Option<Vec<u8>>,
}

#[derive(Default)]
struct State {
    companies: Vec<Company>,
    growers: Vec<Grower>,
    farms: Vec<Farm>,
    fields: Vec<Field>,
    plot_history: HashMap<String, Vec<PlotHistoryEntry>>,
    batches: Vec<StoredBatch>,
    last_reference_id: i32,
    last_sample_id: SampleId,
    batches_created: u32,
    csv_renders: usize,
    offline: bool,
}

impl State {
    fn next_reference_id(&mut self) -> i32 {
        self.last_reference_id += 1;
        self.last_reference_id
    }

    fn batch_mut(&mut self, batch_id: &str) -> PortalResult<&mut StoredBatch> {
        self.batches
            .iter_mut()
            .find(|stored| stored.batch.batch_id == batch_id)
            .ok_or_else(|| not_found!("Batch", batch_id))
    }

    fn company_name(&self, company_id: CompanyId) -> Option<String> {
        self.companies
            .iter()
            .find(|company| company.id == company_id)
            .map(|company| company.name.clone())
    }

    fn grower_name(&self, grower_id: GrowerId) -> Option<String> {
        self.growers
            .iter()
            .find(|grower| grower.id == grower_id)
            .map(|grower| grower.name.clone())
    }

    fn farm_name(&self, farm_id: Option<FarmId>) -> Option<String> {
        let farm_id = farm_id?;
        self.farms
            .iter()
            .find(|farm| farm.id == farm_id)
            .map(|farm| farm.name.clone())
    }

    fn field_name(&self, field_id: Option<FieldId>) -> Option<String> {
        let field_id = field_id?;
        self.fields
            .iter()
            .find(|field| field.id == field_id)
            .map(|field| field.name.clone())
    }
}

fn blank_to_none(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locked state, or `RemoteUnavailable` while offline
    fn state(&self, operation: &str) -> PortalResult<MutexGuard<'_, State>> {
        let state = self.lock();
        if state.offline {
            return Err(remote_unavailable!(operation, "store is offline"));
        }
        Ok(state)
    }

    pub fn add_company(&self, name: &str, is_outside_us: bool) -> CompanyId {
        let mut state = self.lock();
        let id = state.next_reference_id();
        state.companies.push(Company::new(id, name, is_outside_us));
        id
    }

    /// Records a prior submission; the latest insert is reported first
    pub fn insert_plot_history(&self, plot_id: &str, entry: PlotHistoryEntry) {
        self.lock()
            .plot_history
            .entry(normalize_plot_id(plot_id))
            .or_default()
            .insert(0, entry);
    }

    /// While offline every call fails with `RemoteUnavailable`
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of times a CSV artifact was actually rendered
    pub fn csv_render_count(&self) -> usize {
        self.lock().csv_renders
    }

    /// Moves a batch along the status table, as the lab workflow does
    pub fn set_status(&self, batch_id: &str, status: BatchStatus) -> PortalResult<()> {
        let mut state = self.lock();
        let stored = state.batch_mut(batch_id)?;
        stored.batch.status = stored.batch.status.transition(status)?;
        Ok(())
    }

    /// Records the lab's control id, completing `full_batch_id`
    pub fn assign_control_id(&self, batch_id: &str, control_id: &str) -> PortalResult<()> {
        let mut state = self.lock();
        let stored = state.batch_mut(batch_id)?;
        stored.batch.control_id = Some(control_id.to_string());
        stored.batch.full_batch_id = Some(format!("{batch_id}-{control_id}"));
        Ok(())
    }
}

fn persisted_sample(
    state: &mut State,
    batch: &PersistedBatch,
    sequence: u32,
    quarantine: bool,
    sample: &SamplePayload,
) -> PersistedSample {
    state.last_sample_id += 1;
    PersistedSample {
        id: state.last_sample_id,
        batch_id: batch.batch_id.clone(),
        sample_sequence: sequence,
        bag_id: persisted_bag_id(batch.batch_number, sequence),
        company_id: batch.company_id,
        grower_id: Some(sample.grower_id),
        farm_id: sample.farm_id,
        field_id: sample.field_id,
        sample_name: blank_to_none(&sample.sample_name),
        zone: blank_to_none(&sample.zone),
        plot_id: blank_to_none(&sample.plot_id),
        crop: blank_to_none(&sample.crop),
        yield_goal: sample.yield_goal,
        previous_crop: blank_to_none(&sample.previous_crop),
        previous_crop_yield: sample.previous_crop_yield,
        lime_history: sample.lime_history.clone(),
        acres: sample.acres,
        latitude: sample.latitude,
        longitude: sample.longitude,
        elevation: sample.elevation,
        collect_datetime: sample.collect_datetime,
        special_notes: sample.special_notes.clone(),
        program_level: sample.program_level,
        organic: sample.organic,
        quarantine,
        tests: sample.tests,
        company_name: batch.company_name.clone(),
        grower_name: state.grower_name(sample.grower_id),
        farm_name: state.farm_name(sample.farm_id),
        field_name: state.field_name(sample.field_id),
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn list_companies(&self) -> PortalResult<Vec<Company>> {
        let state = self.state("list_companies")?;
        let mut companies = state.companies.clone();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn list_growers(&self, company_id: CompanyId) -> PortalResult<Vec<Grower>> {
        let state = self.state("list_growers")?;
        Ok(state
            .growers
            .iter()
            .filter(|grower| grower.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_farms(&self, grower_id: GrowerId) -> PortalResult<Vec<Farm>> {
        let state = self.state("list_farms")?;
        Ok(state
            .farms
            .iter()
            .filter(|farm| farm.grower_id == grower_id)
            .cloned()
            .collect())
    }

    async fn list_fields(&self, farm_id: FarmId) -> PortalResult<Vec<Field>> {
        let state = self.state("list_fields")?;
        Ok(state
            .fields
            .iter()
            .filter(|field| field.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn create_grower(&self, grower: &GrowerInput) -> PortalResult<GrowerId> {
        let mut state = self.state("create_grower")?;
        if state.company_name(grower.company_id).is_none() {
            return Err(not_found!("Company", grower.company_id));
        }
        let id = state.next_reference_id();
        state.growers.push(Grower {
            id,
            company_id: grower.company_id,
            name: grower.grower_name.clone(),
            contact_person: grower.contact_person.clone(),
            email: grower.email.clone(),
            phone: grower.phone.clone(),
            city: grower.city.clone(),
            state: grower.state.clone(),
        });
        Ok(id)
    }

    async fn update_grower(&self, grower_id: GrowerId, grower: &GrowerInput) -> PortalResult<()> {
        let mut state = self.state("update_grower")?;
        let existing = state
            .growers
            .iter_mut()
            .find(|existing| existing.id == grower_id)
            .ok_or_else(|| not_found!("Grower", grower_id))?;
        existing.company_id = grower.company_id;
        existing.name.clone_from(&grower.grower_name);
        existing.contact_person.clone_from(&grower.contact_person);
        existing.email.clone_from(&grower.email);
        existing.phone.clone_from(&grower.phone);
        existing.city.clone_from(&grower.city);
        existing.state.clone_from(&grower.state);
        Ok(())
    }

    async fn delete_grower(&self, grower_id: GrowerId) -> PortalResult<()> {
        let mut state = self.state("delete_grower")?;
        let before = state.growers.len();
        state.growers.retain(|grower| grower.id != grower_id);
        if state.growers.len() == before {
            return Err(not_found!("Grower", grower_id));
        }
        let farm_ids: Vec<FarmId> = state
            .farms
            .iter()
            .filter(|farm| farm.grower_id == grower_id)
            .map(|farm| farm.id)
            .collect();
        state.farms.retain(|farm| farm.grower_id != grower_id);
        state.fields.retain(|field| !farm_ids.contains(&field.farm_id));
        Ok(())
    }

    async fn create_farm(&self, farm: &FarmInput) -> PortalResult<FarmId> {
        let mut state = self.state("create_farm")?;
        if state.grower_name(farm.grower_id).is_none() {
            return Err(not_found!("Grower", farm.grower_id));
        }
        let id = state.next_reference_id();
        state.farms.push(Farm {
            id,
            grower_id: farm.grower_id,
            name: farm.farm_name.clone(),
            location: farm.location.clone(),
            total_acres: farm.total_acres,
        });
        Ok(id)
    }

    async fn delete_farm(&self, farm_id: FarmId) -> PortalResult<()> {
        let mut state = self.state("delete_farm")?;
        let before = state.farms.len();
        state.farms.retain(|farm| farm.id != farm_id);
        if state.farms.len() == before {
            return Err(not_found!("Farm", farm_id));
        }
        state.fields.retain(|field| field.farm_id != farm_id);
        Ok(())
    }

    async fn create_field(&self, field: &FieldInput) -> PortalResult<FieldId> {
        let mut state = self.state("create_field")?;
        if state.farm_name(Some(field.farm_id)).is_none() {
            return Err(not_found!("Farm", field.farm_id));
        }
        let id = state.next_reference_id();
        state.fields.push(Field {
            id,
            farm_id: field.farm_id,
            name: field.field_name.clone(),
            acres: field.acres,
            description: field.description.clone(),
        });
        Ok(id)
    }

    async fn delete_field(&self, field_id: FieldId) -> PortalResult<()> {
        let mut state = self.state("delete_field")?;
        let before = state.fields.len();
        state.fields.retain(|field| field.id != field_id);
        if state.fields.len() == before {
            return Err(not_found!("Field", field_id));
        }
        Ok(())
    }

    async fn lookup_plot_history(&self, plot_id: &str) -> PortalResult<Vec<PlotHistoryEntry>> {
        let state = self.state("lookup_plot_history")?;
        let plot_id = normalize_plot_id(plot_id);
        if plot_id.chars().count() < MIN_HISTORY_PLOT_ID_LEN {
            return Ok(Vec::new());
        }
        let entries = state.plot_history.get(&plot_id).cloned().unwrap_or_default();
        debug!("Plot {plot_id} has {} history entries", entries.len());
        Ok(entries)
    }

    async fn create_batch(&self, payload: &BatchPayload) -> PortalResult<CreatedBatch> {
        let mut state = self.state("create_batch")?;
        let company = state
            .companies
            .iter()
            .find(|company| company.id == payload.company_id)
            .cloned()
            .ok_or_else(|| not_found!("Company", payload.company_id))?;

        let batch_number = FIRST_BATCH_NUMBER + state.batches_created;
        state.batches_created += 1;
        let sample_count = u32::try_from(payload.samples.len())
            .map_err(|_| remote_unavailable!("create_batch", "too many samples"))?;
        let batch = PersistedBatch {
            batch_id: format!("{BATCH_PREFIX}-{batch_number:05}"),
            batch_number,
            company_id: company.id,
            sample_count,
            notes: payload.notes.clone(),
            created_by: payload.created_by.clone(),
            submission_date: Some(Utc::now().naive_utc()),
            status: BatchStatus::Pending,
            csv_generated: false,
            csv_path: None,
            control_id: None,
            full_batch_id: None,
            company_name: Some(company.name.clone()),
            grower_name: payload
                .samples
                .first()
                .and_then(|sample| state.grower_name(sample.grower_id)),
        };

        let mut samples = Vec::with_capacity(payload.samples.len());
        for (sequence, sample) in (1..=sample_count).zip(&payload.samples) {
            samples.push(persisted_sample(
                &mut state,
                &batch,
                sequence,
                company.is_outside_us,
                sample,
            ));
        }

        let created = CreatedBatch {
            batch_id: batch.batch_id.clone(),
            batch_number,
            sample_count,
            bag_ids: samples.iter().map(|sample| sample.bag_id.clone()).collect(),
            sample_ids: samples.iter().map(|sample| sample.id).collect(),
        };
        info!("Stored batch {} with {sample_count} samples", batch.batch_id);
        state.batches.push(StoredBatch {
            batch,
            samples,
            artifact: None,
        });
        Ok(created)
    }

    async fn list_batches(&self, limit: u64, offset: u64) -> PortalResult<Vec<PersistedBatch>> {
        let state = self.state("list_batches")?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(state
            .batches
            .iter()
            .rev()
            .skip(skip)
            .take(take)
            .map(|stored| stored.batch.clone())
            .collect())
    }

    async fn get_batch(&self, batch_id: &str) -> PortalResult<BatchDetails> {
        let mut state = self.state("get_batch")?;
        let stored = state.batch_mut(batch_id)?;
        Ok(BatchDetails {
            batch: stored.batch.clone(),
            samples: stored.samples.clone(),
        })
    }

    async fn delete_batch(&self, batch_id: &str) -> PortalResult<()> {
        let mut state = self.state("delete_batch")?;
        let before = state.batches.len();
        state.batches.retain(|stored| stored.batch.batch_id != batch_id);
        if state.batches.len() == before {
            return Err(not_found!("Batch", batch_id));
        }
        Ok(())
    }

    async fn generate_csv(&self, batch_id: &str) -> PortalResult<CsvGeneration> {
        let mut state = self.state("generate_csv")?;
        let stored = state.batch_mut(batch_id)?;
        let filename = csv_filename(batch_id);

        let rendered = if stored.artifact.is_none() {
            let bytes = render_lab_csv(&stored.batch, &stored.samples)?;
            if stored.batch.status == BatchStatus::Pending {
                stored.batch.status = BatchStatus::CsvGenerated;
            }
            stored.artifact = Some(bytes);
            stored.batch.csv_generated = true;
            stored.batch.csv_path = Some(format!("exports/{filename}"));
            true
        } else {
            debug!("CSV for batch {batch_id} already exists");
            false
        };

        let generation = CsvGeneration {
            batch_id: batch_id.to_string(),
            csv_filename: filename,
            csv_path: stored.batch.csv_path.clone(),
            sample_count: stored.batch.sample_count,
        };
        if rendered {
            state.csv_renders += 1;
        }
        Ok(generation)
    }

    async fn download_csv(&self, batch_id: &str) -> PortalResult<Vec<u8>> {
        let mut state = self.state("download_csv")?;
        let stored = state.batch_mut(batch_id)?;
        stored
            .artifact
            .clone()
            .ok_or_else(|| PortalError::ArtifactNotReady {
                batch_id: batch_id.to_string(),
            })
    }
}
