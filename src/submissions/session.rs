//! One user's batch-composition session.
//!
//! Owns the cascading selection, the draft batch, the display batch number
//! and the plot-history lookups, and routes every store call through the
//! domain services. A failed remote call never leaves the draft half-edited.

use crate::batches::models::{BatchDraft, CreatedBatch};
use crate::batches::services::submit_batch;
use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::{CompanyId, Confirmation, DeleteOutcome, FarmId, FieldId, GrowerId};
use crate::config::Config;
use crate::history::models::HistoryFill;
use crate::history::services::{PlotHistoryLookup, merge_history, normalize_plot_id};
use crate::identifiers::{display_bag_id, generate_display_batch_number};
use crate::labels::render::{LabelBlock, render_clipboard, render_print_document};
use crate::labels::summary::{SampleSummary, SummaryContext, render_summary};
use crate::references::cache::ReferenceCache;
use crate::references::models::{Company, FarmInput, FieldInput, GrowerInput};
use crate::references::selection::{HierarchySelection, ListRequest};
use crate::references::services as references;
use crate::samples::defaults::resolve_defaults;
use crate::samples::models::{LimeEntry, OptionalTest, SampleDraft};
use crate::samples::validation::ValidationOptions;
use crate::not_found;
use crate::store::SubmissionStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SubmissionSession {
    store: Arc<dyn SubmissionStore>,
    options: ValidationOptions,
    created_by: String,
    cache: ReferenceCache,
    selection: HierarchySelection,
    draft: BatchDraft,
    display_batch_number: u32,
    rng: StdRng,
    history: PlotHistoryLookup,
}

impl SubmissionSession {
    pub fn new(store: Arc<dyn SubmissionStore>, config: &Config) -> Self {
        Self::with_rng(store, config, StdRng::from_rng(&mut rand::rng()))
    }

    /// Session with a caller-provided generator, for reproducible ids
    pub fn with_rng(store: Arc<dyn SubmissionStore>, config: &Config, mut rng: StdRng) -> Self {
        let display_batch_number = generate_display_batch_number(&mut rng);
        Self {
            history: PlotHistoryLookup::new(Arc::clone(&store), config),
            store,
            options: ValidationOptions::from(config),
            created_by: config.created_by.clone(),
            cache: ReferenceCache::new(),
            selection: HierarchySelection::new(),
            draft: BatchDraft {
                created_by: config.created_by.clone(),
                ..BatchDraft::default()
            },
            display_batch_number,
            rng,
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    pub fn draft(&self) -> &BatchDraft {
        &self.draft
    }

    pub fn selection(&self) -> &HierarchySelection {
        &self.selection
    }

    pub fn samples(&self) -> &[SampleDraft] {
        &self.draft.samples
    }

    pub fn sample(&self, index: usize) -> PortalResult<&SampleDraft> {
        let len = self.draft.samples.len();
        self.draft
            .samples
            .get(index)
            .ok_or(PortalError::IndexOutOfRange { index, len })
    }

    fn sample_mut(&mut self, index: usize) -> PortalResult<&mut SampleDraft> {
        let len = self.draft.samples.len();
        self.draft
            .samples
            .get_mut(index)
            .ok_or(PortalError::IndexOutOfRange { index, len })
    }

    pub fn display_batch_number(&self) -> u32 {
        self.display_batch_number
    }

    pub fn display_bag_id(&self, index: usize) -> String {
        display_bag_id(self.display_batch_number, index)
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.draft.notes = notes.to_string();
    }

    /// Company list for the picker; empty when the store cannot be reached
    pub async fn load_companies(&mut self) -> &[Company] {
        match self.cache.companies(self.store.as_ref()).await {
            Ok(companies) => companies,
            Err(e) => {
                warn!("Failed to load companies: {e}");
                &[]
            }
        }
    }

    async fn fetch(&mut self, request: ListRequest) -> PortalResult<()> {
        let store = self.store.as_ref();
        let applied = match request {
            ListRequest::Growers { company_id, .. } => {
                let growers = self.cache.growers(store, company_id).await?.to_vec();
                self.selection.apply_growers(request, growers)
            }
            ListRequest::Farms { grower_id, .. } => {
                let farms = self.cache.farms(store, grower_id).await?.to_vec();
                self.selection.apply_farms(request, farms)
            }
            ListRequest::Fields { farm_id, .. } => {
                let fields = self.cache.fields(store, farm_id).await?.to_vec();
                self.selection.apply_fields(request, fields)
            }
        };
        if !applied {
            debug!("Discarded superseded {request:?}");
        }
        Ok(())
    }

    /// Field choices belong to the farm, so they go whenever the farm may change
    fn clear_sample_fields(&mut self) {
        for sample in &mut self.draft.samples {
            sample.field_id = None;
        }
    }

    /// Quarantine and the company token are read from the company list, so a
    /// selected company must be in it. A miss reloads the list once, in case
    /// the company was added after the list was loaded.
    async fn resolve_company(&mut self, company_id: CompanyId) -> PortalResult<()> {
        let store = self.store.as_ref();
        let listed = |companies: &[Company]| companies.iter().any(|c| c.id == company_id);
        if listed(self.cache.companies(store).await?) {
            return Ok(());
        }
        self.cache.invalidate_companies();
        if listed(self.cache.companies(store).await?) {
            Ok(())
        } else {
            Err(not_found!("Company", company_id))
        }
    }

    /// Selects a company, clearing grower, farm and field first. A company
    /// that cannot be resolved leaves the selection untouched. On a failed
    /// grower fetch the grower list stays empty and the error is returned.
    pub async fn select_company(&mut self, company_id: Option<CompanyId>) -> PortalResult<()> {
        if let Some(company_id) = company_id {
            self.resolve_company(company_id).await?;
            // Selecting a parent always re-reads its children
            self.cache.invalidate_growers(company_id);
        }
        self.draft.company_id = company_id;
        self.draft.grower_id = None;
        self.draft.farm_id = None;
        self.clear_sample_fields();
        match self.selection.select_company(company_id) {
            Some(request) => self.fetch(request).await,
            None => Ok(()),
        }
    }

    pub async fn select_grower(&mut self, grower_id: Option<GrowerId>) -> PortalResult<()> {
        if let Some(grower_id) = grower_id {
            self.cache.invalidate_farms(grower_id);
        }
        self.draft.grower_id = grower_id;
        self.draft.farm_id = None;
        self.clear_sample_fields();
        match self.selection.select_grower(grower_id) {
            Some(request) => self.fetch(request).await,
            None => Ok(()),
        }
    }

    pub async fn select_farm(&mut self, farm_id: Option<FarmId>) -> PortalResult<()> {
        if let Some(farm_id) = farm_id {
            self.cache.invalidate_fields(farm_id);
        }
        self.draft.farm_id = farm_id;
        self.clear_sample_fields();
        match self.selection.select_farm(farm_id) {
            Some(request) => self.fetch(request).await,
            None => Ok(()),
        }
    }

    /// Field preselected for samples added from now on
    pub fn select_field(&mut self, field_id: Option<FieldId>) {
        self.selection.select_field(field_id);
    }

    pub async fn create_grower(&mut self, grower: &GrowerInput) -> PortalResult<GrowerId> {
        let grower_id =
            references::create_grower(self.store.as_ref(), &mut self.cache, grower).await?;
        if self.selection.company() == Some(grower.company_id) {
            if let Some(request) = self.selection.refresh_growers() {
                self.fetch(request).await?;
            }
        }
        Ok(grower_id)
    }

    pub async fn update_grower(
        &mut self,
        grower_id: GrowerId,
        grower: &GrowerInput,
    ) -> PortalResult<()> {
        references::update_grower(self.store.as_ref(), &mut self.cache, grower_id, grower).await?;
        if let Some(request) = self.selection.refresh_growers() {
            self.fetch(request).await?;
        }
        Ok(())
    }

    pub async fn create_farm(&mut self, farm: &FarmInput) -> PortalResult<FarmId> {
        let farm_id = references::create_farm(self.store.as_ref(), &mut self.cache, farm).await?;
        if self.selection.grower() == Some(farm.grower_id) {
            if let Some(request) = self.selection.refresh_farms() {
                self.fetch(request).await?;
            }
        }
        Ok(farm_id)
    }

    pub async fn create_field(&mut self, field: &FieldInput) -> PortalResult<FieldId> {
        let field_id = references::create_field(self.store.as_ref(), &mut self.cache, field).await?;
        if self.selection.farm() == Some(field.farm_id) {
            if let Some(request) = self.selection.refresh_fields() {
                self.fetch(request).await?;
            }
        }
        Ok(field_id)
    }

    /// Deletes a grower; if it was selected the selection below the company
    /// is cleared
    pub async fn delete_grower(
        &mut self,
        grower_id: GrowerId,
        confirmation: Confirmation,
    ) -> PortalResult<DeleteOutcome> {
        let outcome =
            references::delete_grower(self.store.as_ref(), &mut self.cache, grower_id, confirmation)
                .await?;
        if outcome == DeleteOutcome::Deleted {
            if self.selection.grower() == Some(grower_id) {
                self.select_grower(None).await?;
            }
            if let Some(request) = self.selection.refresh_growers() {
                self.fetch(request).await?;
            }
        }
        Ok(outcome)
    }

    pub async fn delete_farm(
        &mut self,
        farm_id: FarmId,
        confirmation: Confirmation,
    ) -> PortalResult<DeleteOutcome> {
        let outcome =
            references::delete_farm(self.store.as_ref(), &mut self.cache, farm_id, confirmation)
                .await?;
        if outcome == DeleteOutcome::Deleted {
            if self.selection.farm() == Some(farm_id) {
                self.select_farm(None).await?;
            }
            if let Some(request) = self.selection.refresh_farms() {
                self.fetch(request).await?;
            }
        }
        Ok(outcome)
    }

    pub async fn delete_field(
        &mut self,
        field_id: FieldId,
        confirmation: Confirmation,
    ) -> PortalResult<DeleteOutcome> {
        let outcome =
            references::delete_field(self.store.as_ref(), &mut self.cache, field_id, confirmation)
                .await?;
        if outcome == DeleteOutcome::Deleted {
            for sample in &mut self.draft.samples {
                if sample.field_id == Some(field_id) {
                    sample.field_id = None;
                }
            }
            if self.selection.field() == Some(field_id) {
                self.selection.select_field(None);
            }
            if let Some(request) = self.selection.refresh_fields() {
                self.fetch(request).await?;
            }
        }
        Ok(outcome)
    }

    /// Appends a sample seeded from the last one and returns its index
    pub fn add_sample(&mut self) -> usize {
        let mut sample = resolve_defaults(self.draft.samples.last(), &mut self.rng);
        if sample.field_id.is_none() {
            sample.field_id = self.selection.field();
        }
        self.draft.samples.push(sample);
        self.draft.samples.len() - 1
    }

    /// Applies `edit` to a sample; a changed plot id starts a history lookup
    pub fn update_sample<F>(&mut self, index: usize, edit: F) -> PortalResult<()>
    where
        F: FnOnce(&mut SampleDraft),
    {
        let sample = self.sample_mut(index)?;
        let plot_id = sample.plot_id.clone();
        edit(sample);
        let changed = sample.plot_id != plot_id;
        let new_plot_id = sample.plot_id.clone();
        if changed {
            self.history.request(index, &new_plot_id);
        }
        Ok(())
    }

    /// Sets the plot id and looks up its history. Returns whether a lookup
    /// was started.
    pub fn set_plot_id(&mut self, index: usize, plot_id: &str) -> PortalResult<bool> {
        self.sample_mut(index)?.plot_id = plot_id.to_string();
        Ok(self.history.request(index, plot_id))
    }

    pub fn remove_sample(&mut self, index: usize) -> PortalResult<SampleDraft> {
        self.sample(index)?;
        self.history.sample_removed(index);
        Ok(self.draft.samples.remove(index))
    }

    pub fn set_test(
        &mut self,
        index: usize,
        test: OptionalTest,
        enabled: bool,
    ) -> PortalResult<()> {
        self.sample_mut(index)?.set_test(test, enabled);
        Ok(())
    }

    pub fn add_lime_entry(&mut self, index: usize, entry: LimeEntry) -> PortalResult<()> {
        self.sample_mut(index)?.add_lime_entry(entry);
        Ok(())
    }

    pub fn remove_lime_entry(
        &mut self,
        index: usize,
        lime_index: usize,
    ) -> PortalResult<LimeEntry> {
        self.sample_mut(index)?.remove_lime_entry(lime_index)
    }

    pub fn is_history_pending(&self, index: usize) -> bool {
        self.history.is_pending(index)
    }

    /// Waits for the sample's history lookup and fills its empty fields.
    /// Nothing is written if the plot id changed since the lookup started.
    pub async fn apply_plot_history(&mut self, index: usize) -> PortalResult<HistoryFill> {
        self.sample(index)?;
        let Some((key, entry)) = self.history.finish(index).await else {
            return Ok(HistoryFill::default());
        };
        let sample = self.sample_mut(index)?;
        if normalize_plot_id(&sample.plot_id) != key.plot_id {
            debug!("Discarded history for '{}', plot id changed", key.plot_id);
            return Ok(HistoryFill::default());
        }
        let fill = merge_history(sample, &entry);
        if fill.any() {
            debug!("Filled sample {} from history of '{}'", index + 1, key.plot_id);
        }
        Ok(fill)
    }

    fn summary(&self, index: usize, sample: &SampleDraft) -> SampleSummary {
        let bag_id = self.display_bag_id(index);
        let context = SummaryContext::Draft {
            company: self
                .draft
                .company_id
                .and_then(|company_id| self.cache.cached_company(company_id)),
            farm: self.selection.selected_farm(),
            field: sample
                .field_id
                .and_then(|field_id| self.selection.find_field(field_id)),
            sample,
            bag_id: &bag_id,
        };
        render_summary(&context)
    }

    pub fn summaries(&self) -> Vec<SampleSummary> {
        self.draft
            .samples
            .iter()
            .enumerate()
            .map(|(index, sample)| self.summary(index, sample))
            .collect()
    }

    pub fn label_blocks(&self) -> Vec<LabelBlock> {
        self.summaries()
            .into_iter()
            .zip(1..)
            .map(|(summary, ordinal)| LabelBlock { ordinal, summary })
            .collect()
    }

    pub fn clipboard_text(&self) -> String {
        render_clipboard(&self.label_blocks())
    }

    pub fn print_document(&self) -> String {
        render_print_document(&self.label_blocks())
    }

    /// Submits the draft. On success the samples are cleared and a new
    /// display batch number is drawn; on failure the draft is kept as is.
    pub async fn submit(&mut self) -> PortalResult<CreatedBatch> {
        let created = submit_batch(
            self.store.as_ref(),
            &self.draft,
            self.display_batch_number,
            self.options,
        )
        .await?;

        self.history.cancel_all();
        self.draft.samples.clear();
        self.draft.notes.clear();
        self.draft.created_by.clone_from(&self.created_by);
        self.display_batch_number = generate_display_batch_number(&mut self.rng);
        info!(
            "Batch {} accepted, bag ids {}",
            created.batch_id,
            created.bag_ids.join(", ")
        );
        Ok(created)
    }
}
