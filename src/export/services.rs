use super::lab_csv::csv_filename;
use super::models::{CsvArtifact, CsvGenerationOutcome};
use crate::common::errors::PortalResult;
use crate::store::SubmissionStore;
use tracing::{info, warn};

/// Asks the store to materialise the batch's lab CSV.
///
/// A batch that already has an artifact is left alone; the store is never
/// asked to regenerate it.
pub async fn generate_csv(
    store: &dyn SubmissionStore,
    batch_id: &str,
) -> PortalResult<CsvGenerationOutcome> {
    let details = store.get_batch(batch_id).await?;
    if details.batch.csv_generated {
        warn!("CSV for batch {batch_id} was already generated");
        return Ok(CsvGenerationOutcome::AlreadyGenerated {
            batch_id: batch_id.to_string(),
        });
    }

    let generation = store.generate_csv(batch_id).await?;
    info!(
        "Generated {} for batch {batch_id} ({} samples)",
        generation.csv_filename, generation.sample_count
    );
    Ok(CsvGenerationOutcome::Generated(generation))
}

/// Fails with `ArtifactNotReady` until the CSV has been generated
pub async fn download_csv(
    store: &dyn SubmissionStore,
    batch_id: &str,
) -> PortalResult<CsvArtifact> {
    let bytes = store.download_csv(batch_id).await?;
    info!("Downloaded CSV for batch {batch_id} ({} bytes)", bytes.len());
    Ok(CsvArtifact {
        filename: csv_filename(batch_id),
        bytes,
    })
}
