use super::cache::ReferenceCache;
use super::models::{FarmInput, FieldInput, GrowerInput};
use crate::common::errors::PortalResult;
use crate::common::models::{Confirmation, DeleteOutcome, FarmId, FieldId, GrowerId};
use crate::store::SubmissionStore;
use tracing::info;

pub async fn create_grower(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    grower: &GrowerInput,
) -> PortalResult<GrowerId> {
    let grower_id = store.create_grower(grower).await?;
    cache.invalidate_growers(grower.company_id);
    info!("Created grower {grower_id} ({})", grower.grower_name);
    Ok(grower_id)
}

pub async fn update_grower(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    grower_id: GrowerId,
    grower: &GrowerInput,
) -> PortalResult<()> {
    store.update_grower(grower_id, grower).await?;
    cache.invalidate_growers(grower.company_id);
    info!("Updated grower {grower_id}");
    Ok(())
}

pub async fn create_farm(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    farm: &FarmInput,
) -> PortalResult<FarmId> {
    let farm_id = store.create_farm(farm).await?;
    cache.invalidate_farms(farm.grower_id);
    info!("Created farm {farm_id} ({})", farm.farm_name);
    Ok(farm_id)
}

pub async fn create_field(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    field: &FieldInput,
) -> PortalResult<FieldId> {
    let field_id = store.create_field(field).await?;
    cache.invalidate_fields(field.farm_id);
    info!("Created field {field_id} ({})", field.field_name);
    Ok(field_id)
}

/// Deletes a grower with its farms and fields. Irreversible once accepted.
pub async fn delete_grower(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    grower_id: GrowerId,
    confirmation: Confirmation,
) -> PortalResult<DeleteOutcome> {
    if confirmation == Confirmation::Declined {
        return Ok(DeleteOutcome::Cancelled);
    }
    store.delete_grower(grower_id).await?;
    // The owning company is not known here, drop every cached list
    cache.clear();
    info!("Deleted grower {grower_id}");
    Ok(DeleteOutcome::Deleted)
}

pub async fn delete_farm(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    farm_id: FarmId,
    confirmation: Confirmation,
) -> PortalResult<DeleteOutcome> {
    if confirmation == Confirmation::Declined {
        return Ok(DeleteOutcome::Cancelled);
    }
    store.delete_farm(farm_id).await?;
    cache.clear();
    info!("Deleted farm {farm_id}");
    Ok(DeleteOutcome::Deleted)
}

pub async fn delete_field(
    store: &dyn SubmissionStore,
    cache: &mut ReferenceCache,
    field_id: FieldId,
    confirmation: Confirmation,
) -> PortalResult<DeleteOutcome> {
    if confirmation == Confirmation::Declined {
        return Ok(DeleteOutcome::Cancelled);
    }
    store.delete_field(field_id).await?;
    cache.clear();
    info!("Deleted field {field_id}");
    Ok(DeleteOutcome::Deleted)
}
