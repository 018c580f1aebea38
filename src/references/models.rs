use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    #[serde(rename = "company_name")]
    pub name: String,
    /// Samples from companies outside the US are shipped under quarantine
    #[serde(default)]
    pub is_outside_us: bool,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Company {
    pub fn new(id: CompanyId, name: &str, is_outside_us: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            is_outside_us,
            contact_person: None,
            email: None,
            phone: None,
            city: None,
            state: None,
            country: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grower {
    pub id: GrowerId,
    pub company_id: CompanyId,
    #[serde(rename = "grower_name")]
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    pub id: FarmId,
    pub grower_id: GrowerId,
    #[serde(rename = "farm_name")]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub total_acres: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub farm_id: FarmId,
    #[serde(rename = "field_name")]
    pub name: String,
    #[serde(default)]
    pub acres: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create/update body for a grower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GrowerInput {
    pub company_id: CompanyId,
    pub grower_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FarmInput {
    pub grower_id: GrowerId,
    pub farm_name: String,
    pub location: Option<String>,
    pub total_acres: Option<Decimal>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldInput {
    pub farm_id: FarmId,
    pub field_name: String,
    pub acres: Option<Decimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// `{ "id": .. }` part of a create response
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct CreatedId {
    pub id: i32,
}
