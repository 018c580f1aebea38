use crate::common::models::string_or_number;
use serde::{Deserialize, Serialize};

/// One prior submission of a plot, as reported by the history service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlotHistoryEntry {
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub import_date: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub previous_crop: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub yield_goal: Option<String>,
    #[serde(default)]
    pub grower: Option<String>,
    #[serde(default)]
    pub farm: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

/// Which sample a lookup was issued for, and with which plot id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey {
    pub sample_index: usize,
    pub plot_id: String,
}

/// Fields written into a sample by [`merge_history`](super::services::merge_history)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryFill {
    pub crop: bool,
    pub previous_crop: bool,
    pub yield_goal: bool,
}

impl HistoryFill {
    pub fn any(self) -> bool {
        self.crop || self.previous_crop || self.yield_goal
    }
}
