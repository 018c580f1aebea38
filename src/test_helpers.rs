//! Shared fixtures: an in-memory store seeded with one company → grower →
//! farm → field chain.

use crate::batches::models::BatchDraft;
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId};
use crate::references::models::{FarmInput, FieldInput, GrowerInput};
use crate::samples::models::SampleDraft;
use crate::store::{MemoryStore, SubmissionStore};
use std::sync::Arc;

pub struct Seeded {
    pub store: Arc<MemoryStore>,
    pub company_id: CompanyId,
    pub grower_id: GrowerId,
    pub farm_id: FarmId,
    pub field_id: FieldId,
}

impl Seeded {
    pub fn dyn_store(&self) -> Arc<dyn SubmissionStore> {
        self.store.clone()
    }

    /// Draft for the seeded grower and farm with one sample per plot id
    pub fn draft(&self, plot_ids: &[&str]) -> BatchDraft {
        BatchDraft {
            company_id: Some(self.company_id),
            grower_id: Some(self.grower_id),
            farm_id: Some(self.farm_id),
            samples: plot_ids
                .iter()
                .map(|plot_id| SampleDraft {
                    field_id: Some(self.field_id),
                    plot_id: (*plot_id).to_string(),
                    crop: "Corn".to_string(),
                    ..SampleDraft::default()
                })
                .collect(),
            notes: String::new(),
            created_by: "Internal".to_string(),
        }
    }
}

pub async fn seeded_store(company: &str, is_outside_us: bool) -> Seeded {
    let store = Arc::new(MemoryStore::new());
    let company_id = store.add_company(company, is_outside_us);
    let grower_id = store
        .create_grower(&GrowerInput {
            company_id,
            grower_name: "G".to_string(),
            ..GrowerInput::default()
        })
        .await
        .unwrap();
    let farm_id = store
        .create_farm(&FarmInput {
            grower_id,
            farm_name: "F".to_string(),
            ..FarmInput::default()
        })
        .await
        .unwrap();
    let field_id = store
        .create_field(&FieldInput {
            farm_id,
            field_name: "North Pivot".to_string(),
            ..FieldInput::default()
        })
        .await
        .unwrap();
    Seeded {
        store,
        company_id,
        grower_id,
        farm_id,
        field_id,
    }
}
