use super::models::{AssembledBatch, BatchDraft, BatchPayload, SamplePayload};
use crate::common::errors::{PortalError, PortalResult};
use crate::common::models::GrowerId;
use crate::identifiers::display_bag_id;
use crate::samples::models::SampleDraft;
use crate::samples::validation::{SampleNumbers, ValidationOptions, validate_batch};

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn sample_payload(
    draft: &BatchDraft,
    sample: &SampleDraft,
    numbers: SampleNumbers,
    grower_id: GrowerId,
) -> SamplePayload {
    SamplePayload {
        grower_id,
        farm_id: draft.farm_id,
        field_id: sample.field_id,
        sample_name: sample.sample_name.trim().to_string(),
        zone: sample.zone.trim().to_string(),
        plot_id: sample.plot_id.trim().to_string(),
        crop: sample.crop.trim().to_string(),
        yield_goal: numbers.yield_goal,
        previous_crop: sample.previous_crop.trim().to_string(),
        previous_crop_yield: numbers.previous_crop_yield,
        lime_history: sample.lime_history.clone(),
        acres: numbers.acres,
        latitude: numbers.latitude,
        longitude: numbers.longitude,
        elevation: numbers.elevation,
        collect_datetime: sample.collect_datetime,
        special_notes: non_empty(&sample.special_notes),
        program_level: sample.program_level,
        organic: sample.organic,
        tests: sample.tests,
    }
}

/// Turns a validated draft into the create-batch payload.
///
/// Every sample carries the batch's grower and farm; the display bag ids
/// are previews keyed on `display_batch_number` and are replaced by the
/// store's ids after submission.
pub fn assemble(
    draft: &BatchDraft,
    display_batch_number: u32,
    options: ValidationOptions,
) -> PortalResult<AssembledBatch> {
    let numbers = validate_batch(draft, options)?;
    let company_id = draft.company_id.ok_or(PortalError::MissingCompany)?;
    let grower_id = draft.grower_id.ok_or(PortalError::MissingGrower)?;

    let samples = draft
        .samples
        .iter()
        .zip(numbers)
        .map(|(sample, numbers)| sample_payload(draft, sample, numbers, grower_id))
        .collect();
    let display_bag_ids = (0..draft.samples.len())
        .map(|index| display_bag_id(display_batch_number, index))
        .collect();

    Ok(AssembledBatch {
        payload: BatchPayload {
            company_id,
            samples,
            notes: non_empty(&draft.notes),
            created_by: non_empty(&draft.created_by),
        },
        display_bag_ids,
    })
}
