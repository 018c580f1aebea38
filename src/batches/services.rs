use super::assembler::assemble;
use super::models::{BatchDetails, BatchDraft, CreatedBatch, PersistedBatch};
use crate::common::errors::PortalResult;
use crate::common::models::{Confirmation, DeleteOutcome};
use crate::samples::validation::ValidationOptions;
use crate::store::SubmissionStore;
use tracing::{info, warn};

/// Validates, assembles and posts a draft. The draft is only read, so a
/// failed call leaves it untouched for a retry.
pub async fn submit_batch(
    store: &dyn SubmissionStore,
    draft: &BatchDraft,
    display_batch_number: u32,
    options: ValidationOptions,
) -> PortalResult<CreatedBatch> {
    let assembled = assemble(draft, display_batch_number, options)?;
    let created = store
        .create_batch(&assembled.payload)
        .await?
        .with_derived_bag_ids();

    info!(
        "Submitted batch {} with {} samples (previewed as {})",
        created.batch_id,
        created.sample_count,
        assembled.display_bag_ids.first().map_or("-", String::as_str)
    );
    Ok(created)
}

/// Batch list for display; a failed refresh shows nothing rather than failing
pub async fn refresh_batches(
    store: &dyn SubmissionStore,
    limit: u64,
    offset: u64,
) -> Vec<PersistedBatch> {
    match store.list_batches(limit, offset).await {
        Ok(batches) => batches,
        Err(e) => {
            warn!("Failed to refresh batches: {e}");
            Vec::new()
        }
    }
}

pub async fn load_batch(store: &dyn SubmissionStore, batch_id: &str) -> PortalResult<BatchDetails> {
    store.get_batch(batch_id).await
}

pub async fn delete_batch(
    store: &dyn SubmissionStore,
    batch_id: &str,
    confirmation: Confirmation,
) -> PortalResult<DeleteOutcome> {
    if confirmation == Confirmation::Declined {
        info!("Deletion of batch {batch_id} cancelled");
        return Ok(DeleteOutcome::Cancelled);
    }
    store.delete_batch(batch_id).await?;
    info!("Deleted batch {batch_id}");
    Ok(DeleteOutcome::Deleted)
}
