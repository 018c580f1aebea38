use super::assembler::assemble;
use super::models::{BatchDraft, BatchStatus, CreatedBatch, PersistedBatch};
use super::services::{delete_batch, load_batch, refresh_batches, submit_batch};
use crate::common::errors::PortalError;
use crate::common::models::{Confirmation, DeleteOutcome};
use crate::samples::models::{OptionalTest, SampleDraft, TestSelection};
use crate::samples::validation::ValidationOptions;
use crate::test_helpers::seeded_store;
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::json;

#[rstest]
#[case(BatchStatus::Pending, BatchStatus::Pending, true)]
#[case(BatchStatus::Pending, BatchStatus::CsvGenerated, true)]
#[case(BatchStatus::Pending, BatchStatus::SentToLab, false)]
#[case(BatchStatus::CsvGenerated, BatchStatus::SentToLab, true)]
#[case(BatchStatus::CsvGenerated, BatchStatus::Pending, false)]
#[case(BatchStatus::SentToLab, BatchStatus::LabResultsReceived, true)]
#[case(BatchStatus::LabResultsReceived, BatchStatus::Completed, true)]
#[case(BatchStatus::Completed, BatchStatus::Completed, true)]
#[case(BatchStatus::Completed, BatchStatus::Pending, false)]
fn test_status_transition_table(
    #[case] from: BatchStatus,
    #[case] to: BatchStatus,
    #[case] allowed: bool,
) {
    assert_eq!(from.can_transition_to(to), allowed);
    assert_eq!(from.transition(to).is_ok(), allowed);
}

#[test]
fn test_status_table_is_total_and_monotonic() {
    for from in BatchStatus::ALL {
        for to in BatchStatus::ALL {
            if from.can_transition_to(to) {
                assert!(to >= from, "{from} -> {to} moves backwards");
            }
        }
    }
    assert_eq!(BatchStatus::Completed.next(), None);
}

#[test]
fn test_status_rejection_names_both_states() {
    let err = BatchStatus::Pending
        .transition(BatchStatus::Completed)
        .unwrap_err();
    assert_eq!(
        err,
        PortalError::InvalidStatusTransition {
            from: "Pending".to_string(),
            to: "Completed".to_string(),
        }
    );
}

#[test]
fn test_status_uses_portal_labels() {
    assert_eq!(
        serde_json::to_value(BatchStatus::CsvGenerated).unwrap(),
        json!("CSV Generated")
    );
    let status: BatchStatus = serde_json::from_value(json!("Lab Results Received")).unwrap();
    assert_eq!(status, BatchStatus::LabResultsReceived);
    assert_eq!(BatchStatus::SentToLab.to_string(), "Sent to Lab");
}

#[test]
fn test_assemble_copies_grower_and_farm_to_every_sample() {
    let draft = BatchDraft {
        company_id: Some(1),
        grower_id: Some(7),
        farm_id: None,
        samples: vec![
            SampleDraft {
                plot_id: "A1000".to_string(),
                field_id: Some(3),
                yield_goal: " 220 ".to_string(),
                ..SampleDraft::default()
            },
            SampleDraft {
                plot_id: "A1001".to_string(),
                sample_name: "  S2 ".to_string(),
                ..SampleDraft::default()
            },
        ],
        notes: "  ".to_string(),
        created_by: "Internal".to_string(),
    };

    let assembled = assemble(&draft, 48213, ValidationOptions::default()).unwrap();
    assert_eq!(assembled.display_bag_ids, vec!["48213-1", "48213-2"]);

    let payload = assembled.payload;
    assert_eq!(payload.company_id, 1);
    assert_eq!(payload.notes, None);
    assert_eq!(payload.created_by.as_deref(), Some("Internal"));
    assert!(payload.samples.iter().all(|sample| sample.grower_id == 7));
    assert!(payload.samples.iter().all(|sample| sample.farm_id.is_none()));
    assert_eq!(payload.samples[0].field_id, Some(3));
    assert_eq!(payload.samples[0].yield_goal, Some(Decimal::from(220)));
    assert_eq!(payload.samples[1].sample_name, "S2");
    assert_eq!(payload.samples[1].yield_goal, None);
}

#[test]
fn test_assemble_refuses_invalid_draft() {
    let draft = BatchDraft {
        company_id: Some(1),
        ..BatchDraft::default()
    };
    assert_eq!(
        assemble(&draft, 10000, ValidationOptions::default()).unwrap_err(),
        PortalError::MissingGrower
    );
}

#[test]
fn test_payload_serialises_nested_test_flags() {
    let draft = BatchDraft {
        company_id: Some(1),
        grower_id: Some(2),
        samples: vec![SampleDraft {
            plot_id: "Z9999".to_string(),
            tests: TestSelection::default().with(OptionalTest::Salts),
            ..SampleDraft::default()
        }],
        ..BatchDraft::default()
    };
    let payload = assemble(&draft, 10000, ValidationOptions::default())
        .unwrap()
        .payload;
    let body = serde_json::to_value(&payload).unwrap();
    assert_eq!(body["samples"][0]["tests"]["test_salts"], json!(true));
    assert_eq!(body["samples"][0]["tests"]["test_k"], json!(true));
    assert_eq!(body["samples"][0]["program_level"], json!("Excellent"));
}

#[test]
fn test_created_batch_derives_missing_bag_ids() {
    let created: CreatedBatch = serde_json::from_value(json!({
        "batch_id": "KAS-00042",
        "batch_number": 42,
        "sample_count": 2,
        "samples": [11, 12]
    }))
    .unwrap();
    let created = created.with_derived_bag_ids();
    assert_eq!(created.bag_ids, vec!["00042-1", "00042-2"]);
    assert_eq!(created.sample_ids, vec![11, 12]);
}

#[test]
fn test_full_batch_id_once_control_id_is_known() {
    let mut batch: PersistedBatch = serde_json::from_value(json!({
        "batch_id": "KAS-10001",
        "batch_number": 10001,
        "company_id": 1,
        "sample_count": 1,
        "status": null
    }))
    .unwrap();
    assert_eq!(batch.status, BatchStatus::Pending);
    assert!(!batch.csv_generated);
    assert_eq!(batch.derived_full_batch_id(), None);

    batch.control_id = Some("7731".to_string());
    assert_eq!(
        batch.derived_full_batch_id().as_deref(),
        Some("KAS-10001-7731")
    );
}

#[tokio::test]
async fn test_submit_batch_returns_persisted_identifiers() {
    let seeded = seeded_store("Acme Ag", false).await;
    let draft = seeded.draft(&["A1234", "B2345", "C3456"]);

    let created = submit_batch(
        seeded.store.as_ref(),
        &draft,
        55555,
        ValidationOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(created.sample_count, 3);
    assert_eq!(created.batch_id, "KAS-10001");
    assert_eq!(created.bag_ids, vec!["10001-1", "10001-2", "10001-3"]);

    let details = load_batch(seeded.store.as_ref(), &created.batch_id)
        .await
        .unwrap();
    let sequences: Vec<u32> = details.samples.iter().map(|s| s.sample_sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(details.batch.status, BatchStatus::Pending);
    assert_eq!(details.samples[0].farm_name.as_deref(), Some("F"));
    assert_eq!(details.batch.grower_name.as_deref(), Some("G"));
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_store() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut draft = seeded.draft(&["A1234"]);
    draft.samples[0].acres = "forty".to_string();

    let err = submit_batch(seeded.store.as_ref(), &draft, 10000, ValidationOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(refresh_batches(seeded.store.as_ref(), 100, 0).await.is_empty());
}

#[tokio::test]
async fn test_refresh_batches_newest_first_and_degrades_when_offline() {
    let seeded = seeded_store("Acme Ag", false).await;
    for plot_id in ["A1111", "B2222"] {
        submit_batch(
            seeded.store.as_ref(),
            &seeded.draft(&[plot_id]),
            10000,
            ValidationOptions::default(),
        )
        .await
        .unwrap();
    }

    let batches = refresh_batches(seeded.store.as_ref(), 100, 0).await;
    let ids: Vec<&str> = batches.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(ids, vec!["KAS-10002", "KAS-10001"]);

    let page = refresh_batches(seeded.store.as_ref(), 1, 1).await;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].batch_id, "KAS-10001");

    seeded.store.set_offline(true);
    assert!(refresh_batches(seeded.store.as_ref(), 100, 0).await.is_empty());
}

#[tokio::test]
async fn test_delete_batch_requires_confirmation() {
    let seeded = seeded_store("Acme Ag", false).await;
    let created = submit_batch(
        seeded.store.as_ref(),
        &seeded.draft(&["A1234"]),
        10000,
        ValidationOptions::default(),
    )
    .await
    .unwrap();

    let outcome = delete_batch(seeded.store.as_ref(), &created.batch_id, Confirmation::Declined)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert!(load_batch(seeded.store.as_ref(), &created.batch_id).await.is_ok());

    let outcome = delete_batch(seeded.store.as_ref(), &created.batch_id, Confirmation::Confirmed)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(matches!(
        load_batch(seeded.store.as_ref(), &created.batch_id).await,
        Err(PortalError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_lab_workflow_advances_status_and_completes_full_batch_id() {
    let seeded = seeded_store("Acme Ag", false).await;
    let created = submit_batch(
        seeded.store.as_ref(),
        &seeded.draft(&["A1234"]),
        10000,
        ValidationOptions::default(),
    )
    .await
    .unwrap();
    let batch_id = created.batch_id.as_str();

    let err = seeded
        .store
        .set_status(batch_id, BatchStatus::SentToLab)
        .unwrap_err();
    assert!(matches!(err, PortalError::InvalidStatusTransition { .. }));

    seeded.store.set_status(batch_id, BatchStatus::CsvGenerated).unwrap();
    seeded.store.set_status(batch_id, BatchStatus::SentToLab).unwrap();
    seeded.store.assign_control_id(batch_id, "7731").unwrap();

    let batch = load_batch(seeded.store.as_ref(), batch_id).await.unwrap().batch;
    assert_eq!(batch.status, BatchStatus::SentToLab);
    assert_eq!(batch.full_batch_id.as_deref(), Some("KAS-10001-7731"));
    assert_eq!(batch.derived_full_batch_id(), batch.full_batch_id);

    assert!(matches!(
        seeded.store.assign_control_id("KAS-99999", "1").unwrap_err(),
        PortalError::NotFound { .. }
    ));
}
