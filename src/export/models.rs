use serde::{Deserialize, Serialize};

/// Store acknowledgement of a CSV generation trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvGeneration {
    pub batch_id: String,
    pub csv_filename: String,
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default)]
    pub sample_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvGenerationOutcome {
    Generated(CsvGeneration),
    /// The batch already had an artifact; the store was not asked again
    AlreadyGenerated { batch_id: String },
}

/// Downloaded CSV, ready to be saved under `filename`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}
