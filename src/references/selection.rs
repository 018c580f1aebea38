//! Cascading company → grower → farm → field selection.
//!
//! Setting a level clears every level below it together with their option
//! lists, then hands back a [`ListRequest`] naming the list to fetch next.
//! Responses are applied only while their request is still the latest one,
//! so a slow answer for a previous farm can never populate the field list of
//! the farm selected after it.

use super::models::{Farm, Field, Grower};
use crate::common::models::{CompanyId, FarmId, FieldId, GrowerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRequest {
    Growers { company_id: CompanyId, generation: u64 },
    Farms { grower_id: GrowerId, generation: u64 },
    Fields { farm_id: FarmId, generation: u64 },
}

impl ListRequest {
    fn generation(self) -> u64 {
        match self {
            ListRequest::Growers { generation, .. }
            | ListRequest::Farms { generation, .. }
            | ListRequest::Fields { generation, .. } => generation,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HierarchySelection {
    company: Option<CompanyId>,
    grower: Option<GrowerId>,
    farm: Option<FarmId>,
    field: Option<FieldId>,
    growers: Vec<Grower>,
    farms: Vec<Farm>,
    fields: Vec<Field>,
    generation: u64,
}

impl HierarchySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company(&self) -> Option<CompanyId> {
        self.company
    }

    pub fn grower(&self) -> Option<GrowerId> {
        self.grower
    }

    pub fn farm(&self) -> Option<FarmId> {
        self.farm
    }

    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    pub fn growers(&self) -> &[Grower] {
        &self.growers
    }

    pub fn farms(&self) -> &[Farm] {
        &self.farms
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn selected_farm(&self) -> Option<&Farm> {
        let farm_id = self.farm?;
        self.farms.iter().find(|farm| farm.id == farm_id)
    }

    pub fn find_field(&self, field_id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    pub fn select_company(&mut self, company_id: Option<CompanyId>) -> Option<ListRequest> {
        self.company = company_id;
        self.clear_below_company();
        let generation = self.bump();
        company_id.map(|company_id| ListRequest::Growers {
            company_id,
            generation,
        })
    }

    pub fn select_grower(&mut self, grower_id: Option<GrowerId>) -> Option<ListRequest> {
        self.grower = grower_id;
        self.clear_below_grower();
        let generation = self.bump();
        grower_id.map(|grower_id| ListRequest::Farms {
            grower_id,
            generation,
        })
    }

    pub fn select_farm(&mut self, farm_id: Option<FarmId>) -> Option<ListRequest> {
        self.farm = farm_id;
        self.clear_below_farm();
        let generation = self.bump();
        farm_id.map(|farm_id| ListRequest::Fields {
            farm_id,
            generation,
        })
    }

    pub fn select_field(&mut self, field_id: Option<FieldId>) {
        self.field = field_id;
    }

    /// Installs growers fetched for `request`; returns false when superseded
    pub fn apply_growers(&mut self, request: ListRequest, growers: Vec<Grower>) -> bool {
        match request {
            ListRequest::Growers { company_id, .. }
                if self.is_current(request) && self.company == Some(company_id) =>
            {
                self.growers = growers;
                true
            }
            _ => false,
        }
    }

    pub fn apply_farms(&mut self, request: ListRequest, farms: Vec<Farm>) -> bool {
        match request {
            ListRequest::Farms { grower_id, .. }
                if self.is_current(request) && self.grower == Some(grower_id) =>
            {
                self.farms = farms;
                true
            }
            _ => false,
        }
    }

    pub fn apply_fields(&mut self, request: ListRequest, fields: Vec<Field>) -> bool {
        match request {
            ListRequest::Fields { farm_id, .. }
                if self.is_current(request) && self.farm == Some(farm_id) =>
            {
                self.fields = fields;
                true
            }
            _ => false,
        }
    }

    /// Re-fetch of the current grower list, e.g. after a grower was created
    pub fn refresh_growers(&self) -> Option<ListRequest> {
        self.company.map(|company_id| ListRequest::Growers {
            company_id,
            generation: self.generation,
        })
    }

    pub fn refresh_farms(&self) -> Option<ListRequest> {
        self.grower.map(|grower_id| ListRequest::Farms {
            grower_id,
            generation: self.generation,
        })
    }

    pub fn refresh_fields(&self) -> Option<ListRequest> {
        self.farm.map(|farm_id| ListRequest::Fields {
            farm_id,
            generation: self.generation,
        })
    }

    pub fn is_current(&self, request: ListRequest) -> bool {
        request.generation() == self.generation
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn clear_below_company(&mut self) {
        self.grower = None;
        self.growers.clear();
        self.clear_below_grower();
    }

    fn clear_below_grower(&mut self) {
        self.farm = None;
        self.farms.clear();
        self.clear_below_farm();
    }

    fn clear_below_farm(&mut self) {
        self.field = None;
        self.fields.clear();
    }
}
