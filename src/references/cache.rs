//! Read-through caches for the company → grower → farm → field lists.

use super::models::{Company, Farm, Field, Grower};
use crate::common::errors::PortalResult;
use crate::common::models::{CompanyId, FarmId, GrowerId};
use crate::store::SubmissionStore;
use std::collections::HashMap;
use tracing::debug;

/// Option lists keyed by parent id. A miss reads through to the store; an
/// entry lives until its parent is invalidated.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    companies: Option<Vec<Company>>,
    growers: HashMap<CompanyId, Vec<Grower>>,
    farms: HashMap<GrowerId, Vec<Farm>>,
    fields: HashMap<FarmId, Vec<Field>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn companies(&mut self, store: &dyn SubmissionStore) -> PortalResult<&[Company]> {
        if self.companies.is_none() {
            let companies = store.list_companies().await?;
            debug!("Loaded {} companies", companies.len());
            self.companies = Some(companies);
        }
        Ok(self.companies.as_deref().unwrap_or_default())
    }

    pub async fn growers(
        &mut self,
        store: &dyn SubmissionStore,
        company_id: CompanyId,
    ) -> PortalResult<&[Grower]> {
        if !self.growers.contains_key(&company_id) {
            let growers = store.list_growers(company_id).await?;
            debug!("Loaded {} growers for company {company_id}", growers.len());
            self.growers.insert(company_id, growers);
        }
        Ok(self.growers.get(&company_id).map(Vec::as_slice).unwrap_or_default())
    }

    pub async fn farms(
        &mut self,
        store: &dyn SubmissionStore,
        grower_id: GrowerId,
    ) -> PortalResult<&[Farm]> {
        if !self.farms.contains_key(&grower_id) {
            let farms = store.list_farms(grower_id).await?;
            debug!("Loaded {} farms for grower {grower_id}", farms.len());
            self.farms.insert(grower_id, farms);
        }
        Ok(self.farms.get(&grower_id).map(Vec::as_slice).unwrap_or_default())
    }

    pub async fn fields(
        &mut self,
        store: &dyn SubmissionStore,
        farm_id: FarmId,
    ) -> PortalResult<&[Field]> {
        if !self.fields.contains_key(&farm_id) {
            let fields = store.list_fields(farm_id).await?;
            debug!("Loaded {} fields for farm {farm_id}", fields.len());
            self.fields.insert(farm_id, fields);
        }
        Ok(self.fields.get(&farm_id).map(Vec::as_slice).unwrap_or_default())
    }

    pub fn cached_company(&self, company_id: CompanyId) -> Option<&Company> {
        self.companies
            .as_ref()?
            .iter()
            .find(|company| company.id == company_id)
    }

    pub fn is_cached_growers(&self, company_id: CompanyId) -> bool {
        self.growers.contains_key(&company_id)
    }

    pub fn invalidate_companies(&mut self) {
        self.companies = None;
    }

    pub fn invalidate_growers(&mut self, company_id: CompanyId) {
        self.growers.remove(&company_id);
    }

    pub fn invalidate_farms(&mut self, grower_id: GrowerId) {
        self.farms.remove(&grower_id);
    }

    pub fn invalidate_fields(&mut self, farm_id: FarmId) {
        self.fields.remove(&farm_id);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
