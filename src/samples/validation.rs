//! Submit-time checks on a draft batch.
//!
//! Numeric inputs are either blank (absent) or must parse; a present value
//! that does not parse fails the whole batch before anything is sent. A blank
//! plot id only warns unless strict plot-id validation is configured.

use super::models::{SampleDraft, parse_decimal};
use crate::batches::models::BatchDraft;
use crate::common::errors::{PortalError, PortalResult};
use crate::config::Config;
use crate::invalid_numeric;
use rust_decimal::Decimal;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub strict_plot_id: bool,
}

impl From<&Config> for ValidationOptions {
    fn from(config: &Config) -> Self {
        Self {
            strict_plot_id: config.strict_plot_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericRule {
    /// Zero or more (yields, acres)
    NonNegative,
    /// Strictly above zero (lime amounts)
    Positive,
    /// Any finite number (coordinates, elevation)
    Any,
}

/// Parsed numeric inputs of one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleNumbers {
    pub yield_goal: Option<Decimal>,
    pub previous_crop_yield: Option<Decimal>,
    pub acres: Option<Decimal>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub elevation: Option<Decimal>,
}

pub fn parse_numeric(
    sample_index: usize,
    field: &str,
    text: &str,
    rule: NumericRule,
) -> PortalResult<Option<Decimal>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value = parse_decimal(text).ok_or_else(|| invalid_numeric!(sample_index, field, text))?;
    let accepted = match rule {
        NumericRule::NonNegative => value >= Decimal::ZERO,
        NumericRule::Positive => value > Decimal::ZERO,
        NumericRule::Any => true,
    };
    if accepted {
        Ok(Some(value))
    } else {
        Err(invalid_numeric!(sample_index, field, text))
    }
}

pub fn parse_sample_numbers(index: usize, sample: &SampleDraft) -> PortalResult<SampleNumbers> {
    Ok(SampleNumbers {
        yield_goal: parse_numeric(
            index,
            "yield_goal",
            &sample.yield_goal,
            NumericRule::NonNegative,
        )?,
        previous_crop_yield: parse_numeric(
            index,
            "previous_crop_yield",
            &sample.previous_crop_yield,
            NumericRule::NonNegative,
        )?,
        acres: parse_numeric(index, "acres", &sample.acres, NumericRule::NonNegative)?,
        latitude: parse_numeric(index, "latitude", &sample.latitude, NumericRule::Any)?,
        longitude: parse_numeric(index, "longitude", &sample.longitude, NumericRule::Any)?,
        elevation: parse_numeric(index, "elevation", &sample.elevation, NumericRule::Any)?,
    })
}

pub fn validate_sample(
    index: usize,
    sample: &SampleDraft,
    options: ValidationOptions,
) -> PortalResult<SampleNumbers> {
    if sample.plot_id.trim().is_empty() {
        if options.strict_plot_id {
            return Err(PortalError::MissingPlotId {
                sample_index: index,
            });
        }
        warn!("Sample {} has no plot id; history correlation will not work", index + 1);
    }

    for (lime_index, entry) in sample.lime_history.iter().enumerate() {
        if entry.amount_lbs_ac <= Decimal::ZERO {
            return Err(invalid_numeric!(
                index,
                format!("lime_history[{lime_index}].amount_lbs_ac"),
                entry.amount_lbs_ac
            ));
        }
        if !(1..=12).contains(&entry.month) {
            return Err(PortalError::InvalidLimeEntry {
                field: format!("lime_history[{lime_index}].month"),
                message: format!("{} is not a month (1-12)", entry.month),
            });
        }
    }

    parse_sample_numbers(index, sample)
}

/// Gates submission; nothing is sent when this fails. Returns the parsed
/// numbers of every sample in order.
pub fn validate_batch(
    draft: &BatchDraft,
    options: ValidationOptions,
) -> PortalResult<Vec<SampleNumbers>> {
    if draft.company_id.is_none() {
        return Err(PortalError::MissingCompany);
    }
    if draft.grower_id.is_none() {
        return Err(PortalError::MissingGrower);
    }
    if draft.samples.is_empty() {
        return Err(PortalError::EmptySampleSet);
    }
    draft
        .samples
        .iter()
        .enumerate()
        .map(|(index, sample)| validate_sample(index, sample, options))
        .collect()
}
