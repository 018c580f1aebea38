use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId, SampleId, null_as_default};
use crate::identifiers::persisted_bag_id;
use crate::samples::models::{LimeEntry, PersistedSample, ProgramLevel, SampleDraft, TestSelection};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a persisted batch. Only `Pending -> CSV Generated` is
/// triggered by the core; the store drives the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum BatchStatus {
    #[default]
    Pending,
    #[serde(rename = "CSV Generated")]
    CsvGenerated,
    #[serde(rename = "Sent to Lab")]
    SentToLab,
    #[serde(rename = "Lab Results Received")]
    LabResultsReceived,
    Completed,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 5] = [
        BatchStatus::Pending,
        BatchStatus::CsvGenerated,
        BatchStatus::SentToLab,
        BatchStatus::LabResultsReceived,
        BatchStatus::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BatchStatus::Pending => "Pending",
            BatchStatus::CsvGenerated => "CSV Generated",
            BatchStatus::SentToLab => "Sent to Lab",
            BatchStatus::LabResultsReceived => "Lab Results Received",
            BatchStatus::Completed => "Completed",
        }
    }

    pub fn next(self) -> Option<BatchStatus> {
        match self {
            BatchStatus::Pending => Some(BatchStatus::CsvGenerated),
            BatchStatus::CsvGenerated => Some(BatchStatus::SentToLab),
            BatchStatus::SentToLab => Some(BatchStatus::LabResultsReceived),
            BatchStatus::LabResultsReceived => Some(BatchStatus::Completed),
            BatchStatus::Completed => None,
        }
    }

    /// Staying put or moving forward exactly one step
    pub fn can_transition_to(self, target: BatchStatus) -> bool {
        target == self || self.next() == Some(target)
    }

    pub fn transition(self, target: BatchStatus) -> PortalResult<BatchStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(PortalError::InvalidStatusTransition {
                from: self.label().to_string(),
                to: target.label().to_string(),
            })
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Client-side batch under composition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchDraft {
    pub company_id: Option<CompanyId>,
    pub grower_id: Option<GrowerId>,
    pub farm_id: Option<FarmId>,
    pub samples: Vec<SampleDraft>,
    pub notes: String,
    pub created_by: String,
}

/// Body of the create-batch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub company_id: CompanyId,
    pub samples: Vec<SamplePayload>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePayload {
    pub grower_id: GrowerId,
    pub farm_id: Option<FarmId>,
    pub field_id: Option<FieldId>,
    pub sample_name: String,
    pub zone: String,
    pub plot_id: String,
    pub crop: String,
    pub yield_goal: Option<Decimal>,
    pub previous_crop: String,
    pub previous_crop_yield: Option<Decimal>,
    pub lime_history: Vec<LimeEntry>,
    pub acres: Option<Decimal>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub elevation: Option<Decimal>,
    pub collect_datetime: Option<NaiveDateTime>,
    pub special_notes: Option<String>,
    pub program_level: ProgramLevel,
    pub organic: bool,
    pub tests: TestSelection,
}

/// Payload plus the cosmetic bag ids shown before the store answers
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledBatch {
    pub payload: BatchPayload,
    pub display_bag_ids: Vec<String>,
}

/// Authoritative identifiers returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedBatch {
    pub batch_id: String,
    pub batch_number: u32,
    pub sample_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bag_ids: Vec<String>,
    #[serde(default, rename = "samples", deserialize_with = "null_as_default")]
    pub sample_ids: Vec<SampleId>,
}

impl CreatedBatch {
    /// Fills bag ids from the batch number when the store left them out
    #[must_use]
    pub fn with_derived_bag_ids(mut self) -> Self {
        if self.bag_ids.is_empty() {
            self.bag_ids = (1..=self.sample_count)
                .map(|sequence| persisted_bag_id(self.batch_number, sequence))
                .collect();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBatch {
    pub batch_id: String,
    pub batch_number: u32,
    pub company_id: CompanyId,
    pub sample_count: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub submission_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BatchStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub csv_generated: bool,
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default)]
    pub control_id: Option<String>,
    #[serde(default)]
    pub full_batch_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub grower_name: Option<String>,
}

impl PersistedBatch {
    /// `{batch_id}-{control_id}` once the lab has assigned a control id
    pub fn derived_full_batch_id(&self) -> Option<String> {
        self.full_batch_id.clone().or_else(|| {
            self.control_id
                .as_ref()
                .map(|control_id| format!("{}-{control_id}", self.batch_id))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDetails {
    pub batch: PersistedBatch,
    #[serde(default, deserialize_with = "null_as_default")]
    pub samples: Vec<PersistedSample>,
}
