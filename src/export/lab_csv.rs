//! Lab submission CSV.
//!
//! One row per persisted sample, in sample-sequence order. The lab's own
//! columns come first, in the lab's order; portal columns follow.

use crate::batches::models::PersistedBatch;
use crate::common::errors::{PortalError, PortalResult};
use crate::samples::models::{OptionalTest, PersistedSample, StandardTest, TestKey};
use rust_decimal::Decimal;

/// Columns the lab's import expects, in order, before the test columns
pub const LAB_COLUMNS: [&str; 27] = [
    "CustomerOrderNo",
    "LayerId",
    "OrderNotes",
    "SampleName",
    "CollectDateTime",
    "Grower",
    "Farm",
    "Field",
    "Acres",
    "Latitude",
    "Longitude",
    "Elevation",
    "BagId",
    "SpecialNote",
    "Quarantine",
    "Crop1",
    "CropYieldGoal1",
    "CropNote1",
    "Crop2",
    "CropYieldGoal2",
    "CropNote2",
    "Crop3",
    "CropYieldGoal3",
    "CropNote3",
    "Crop4",
    "CropYieldGoal4",
    "CropNote4",
];

/// Lab test columns and the test each one reports. Columns the portal does
/// not offer are always left empty.
pub const LAB_TEST_COLUMNS: [(&str, Option<TestKey>); 34] = [
    ("Al", None),
    ("B", Some(TestKey::Standard(StandardTest::B))),
    ("BulkDen", Some(TestKey::Optional(OptionalTest::BulkDensity))),
    ("Ca", Some(TestKey::Standard(StandardTest::Ca))),
    ("Cl", Some(TestKey::Optional(OptionalTest::Cl))),
    ("Co", Some(TestKey::Optional(OptionalTest::Co))),
    ("Cu", Some(TestKey::Standard(StandardTest::Cu))),
    ("Fe", Some(TestKey::Standard(StandardTest::Fe))),
    ("I", None),
    ("K", Some(TestKey::Standard(StandardTest::K))),
    ("Mg", Some(TestKey::Standard(StandardTest::Mg))),
    ("Mn", Some(TestKey::Standard(StandardTest::Mn))),
    ("Mo", Some(TestKey::Optional(OptionalTest::Mo))),
    ("Morgan", None),
    ("Na", Some(TestKey::Standard(StandardTest::Na))),
    ("NH3", Some(TestKey::Optional(OptionalTest::Nh3))),
    ("NO3", Some(TestKey::Optional(OptionalTest::No3))),
    ("OLSE", Some(TestKey::Optional(OptionalTest::Olsen))),
    ("NO", None),
    ("MP1", None),
    ("P2", Some(TestKey::Standard(StandardTest::P2))),
    ("PH1 (Water)", Some(TestKey::Standard(StandardTest::Ph))),
    ("PH2 (Salt)", None),
    ("PH3 (Buffer)", None),
    ("PRET", None),
    ("S", Some(TestKey::Standard(StandardTest::S))),
    ("Salts", Some(TestKey::Optional(OptionalTest::Salts))),
    ("Zn", Some(TestKey::Standard(StandardTest::Zn))),
    ("Other", None),
    ("Sand Silt Clay", Some(TestKey::Optional(OptionalTest::Ssc))),
    ("Se", None),
    ("Si", None),
    ("PLFA", None),
    ("Total P", None),
];

/// Portal columns appended after the lab's
pub const PORTAL_COLUMNS: [&str; 9] = [
    "SampleSequence",
    "Company",
    "PlotId",
    "PreviousCrop",
    "PreviousCropYield",
    "ProgramLevel",
    "Organic",
    "LimeHistory",
    "OM",
];

pub fn csv_filename(batch_id: &str) -> String {
    format!("{batch_id}_lab_submission.csv")
}

pub fn headers() -> Vec<&'static str> {
    LAB_COLUMNS
        .iter()
        .copied()
        .chain(LAB_TEST_COLUMNS.iter().map(|(column, _)| *column))
        .chain(PORTAL_COLUMNS.iter().copied())
        .collect()
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn number(value: Option<Decimal>) -> String {
    value.map(|n| n.normalize().to_string()).unwrap_or_default()
}

fn flag(enabled: bool) -> String {
    String::from(if enabled { "Y" } else { "" })
}

fn sample_row(batch: &PersistedBatch, sample: &PersistedSample) -> Vec<String> {
    let mut row = vec![
        String::new(),
        batch.batch_id.clone(),
        // OrderNotes is for the lab's own use
        String::new(),
        sample
            .sample_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .or(sample.field_name.as_ref())
            .cloned()
            .unwrap_or_default(),
        sample
            .collect_datetime
            .map(|collected| collected.format("%m/%d/%y").to_string())
            .unwrap_or_default(),
        text(sample.grower_name.as_ref()),
        text(sample.farm_name.as_ref()),
        text(sample.field_name.as_ref()),
        number(sample.acres),
        number(sample.latitude),
        number(sample.longitude),
        number(sample.elevation),
        sample.bag_id.clone(),
        text(sample.special_notes.as_ref()),
        if sample.quarantine { "Y" } else { "N" }.to_string(),
        text(sample.crop.as_ref()),
        number(sample.yield_goal),
    ];
    // CropNote1 and the unused Crop2..4 groups
    row.extend(std::iter::repeat_n(String::new(), 10));

    row.extend(LAB_TEST_COLUMNS.iter().map(|(_, key)| {
        flag(key.is_some_and(|key| sample.tests.is_enabled(key)))
    }));

    let lime_history = sample
        .lime_history
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    row.extend([
        sample.sample_sequence.to_string(),
        text(sample.company_name.as_ref()),
        text(sample.plot_id.as_ref()),
        text(sample.previous_crop.as_ref()),
        number(sample.previous_crop_yield),
        sample.program_level.to_string(),
        flag(sample.organic),
        lime_history,
        flag(sample.tests.is_enabled(TestKey::Standard(StandardTest::Om))),
    ]);
    row
}

/// Renders the batch's lab CSV; samples are written in sequence order
pub fn render_lab_csv(
    batch: &PersistedBatch,
    samples: &[PersistedSample],
) -> PortalResult<Vec<u8>> {
    let mut ordered: Vec<&PersistedSample> = samples.iter().collect();
    ordered.sort_by_key(|sample| sample.sample_sequence);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers())?;
    for sample in ordered {
        writer.write_record(sample_row(batch, sample))?;
    }
    writer
        .into_inner()
        .map_err(|e| PortalError::ExportFailed {
            message: e.to_string(),
        })
}
