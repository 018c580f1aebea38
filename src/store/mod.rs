//! Contract of the external submission store.
//!
//! The store owns companies, growers, farms and fields, assigns batch and bag
//! identifiers, and serialises every persisted-state mutation per batch
//! (status changes and the `csv_generated` flip). The core only reads through
//! this trait and triggers the operations it defines.

pub mod http;
pub mod memory;

use crate::batches::models::{BatchDetails, BatchPayload, CreatedBatch, PersistedBatch};
use crate::common::errors::PortalResult;
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId};
use crate::export::models::CsvGeneration;
use crate::history::models::PlotHistoryEntry;
use crate::references::models::{Company, Farm, FarmInput, Field, FieldInput, Grower, GrowerInput};
use async_trait::async_trait;

pub use http::HttpStore;
pub use memory::MemoryStore;


#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn list_companies(&self) -> PortalResult<Vec<Company>>;
    async fn list_growers(&self, company_id: CompanyId) -> PortalResult<Vec<Grower>>;
    async fn list_farms(&self, grower_id: GrowerId) -> PortalResult<Vec<Farm>>;
    async fn list_fields(&self, farm_id: FarmId) -> PortalResult<Vec<Field>>;

    async fn create_grower(&self, grower: &GrowerInput) -> PortalResult<GrowerId>;
    async fn update_grower(&self, grower_id: GrowerId, grower: &GrowerInput) -> PortalResult<()>;
    async fn delete_grower(&self, grower_id: GrowerId) -> PortalResult<()>;
    async fn create_farm(&self, farm: &FarmInput) -> PortalResult<FarmId>;
    async fn delete_farm(&self, farm_id: FarmId) -> PortalResult<()>;
    async fn create_field(&self, field: &FieldInput) -> PortalResult<FieldId>;
    async fn delete_field(&self, field_id: FieldId) -> PortalResult<()>;

    /// Most recent submission first
    async fn lookup_plot_history(&self, plot_id: &str) -> PortalResult<Vec<PlotHistoryEntry>>;

    async fn create_batch(&self, payload: &BatchPayload) -> PortalResult<CreatedBatch>;
    /// Newest submission first
    async fn list_batches(&self, limit: u64, offset: u64) -> PortalResult<Vec<PersistedBatch>>;
    async fn get_batch(&self, batch_id: &str) -> PortalResult<BatchDetails>;
    async fn delete_batch(&self, batch_id: &str) -> PortalResult<()>;

    /// Materialises the lab CSV and flips `csv_generated`. A duplicate trigger
    /// must not produce a second, divergent artifact.
    async fn generate_csv(&self, batch_id: &str) -> PortalResult<CsvGeneration>;
    async fn download_csv(&self, batch_id: &str) -> PortalResult<Vec<u8>>;
}
