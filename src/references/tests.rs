use super::cache::ReferenceCache;
use super::models::{Company, Farm, FarmInput, Field, Grower, GrowerInput};
use super::selection::{HierarchySelection, ListRequest};
use super::services::{create_farm, create_grower, delete_farm, delete_grower, update_grower};
use crate::common::models::{Confirmation, DeleteOutcome};
use crate::store::SubmissionStore;
use crate::test_helpers::seeded_store;
use serde_json::json;

fn grower(id: i32, company_id: i32) -> Grower {
    Grower {
        id,
        company_id,
        name: format!("Grower {id}"),
        contact_person: None,
        email: None,
        phone: None,
        city: None,
        state: None,
    }
}

fn farm(id: i32, grower_id: i32) -> Farm {
    Farm {
        id,
        grower_id,
        name: format!("Farm {id}"),
        location: None,
        total_acres: None,
    }
}

fn field(id: i32, farm_id: i32) -> Field {
    Field {
        id,
        farm_id,
        name: format!("Field {id}"),
        acres: None,
        description: None,
    }
}

#[test]
fn test_company_reads_portal_field_names() {
    let company: Company = serde_json::from_value(json!({
        "id": 4,
        "company_name": "Maple Co",
        "is_outside_us": true,
        "country": "Canada"
    }))
    .unwrap();
    assert_eq!(company.name, "Maple Co");
    assert!(company.is_outside_us);
}

#[test]
fn test_selecting_a_level_clears_everything_below() {
    let mut selection = HierarchySelection::new();
    let request = selection.select_company(Some(1)).unwrap();
    assert!(selection.apply_growers(request, vec![grower(10, 1)]));
    let request = selection.select_grower(Some(10)).unwrap();
    assert!(selection.apply_farms(request, vec![farm(20, 10)]));
    let request = selection.select_farm(Some(20)).unwrap();
    assert!(selection.apply_fields(request, vec![field(30, 20)]));
    selection.select_field(Some(30));

    let request = selection.select_company(Some(2));
    assert!(matches!(
        request,
        Some(ListRequest::Growers { company_id: 2, .. })
    ));
    assert_eq!(selection.company(), Some(2));
    assert_eq!(selection.grower(), None);
    assert_eq!(selection.farm(), None);
    assert_eq!(selection.field(), None);
    assert!(selection.growers().is_empty());
    assert!(selection.farms().is_empty());
    assert!(selection.fields().is_empty());
}

#[test]
fn test_clearing_a_selection_requests_nothing() {
    let mut selection = HierarchySelection::new();
    selection.select_company(Some(1));
    assert_eq!(selection.select_grower(None), None);
    assert_eq!(selection.company(), Some(1));
}

#[test]
fn test_stale_field_list_is_discarded() {
    let mut selection = HierarchySelection::new();
    selection.select_company(Some(1));
    selection.select_grower(Some(10));
    let slow = selection.select_farm(Some(20)).unwrap();
    let fast = selection.select_farm(Some(21)).unwrap();

    assert!(selection.apply_fields(fast, vec![field(31, 21)]));
    // The answer for the previous farm arrives late
    assert!(!selection.apply_fields(slow, vec![field(30, 20)]));
    assert_eq!(selection.fields(), &[field(31, 21)]);
}

#[test]
fn test_response_for_wrong_level_is_rejected() {
    let mut selection = HierarchySelection::new();
    let request = selection.select_company(Some(1)).unwrap();
    assert!(!selection.apply_farms(request, vec![farm(20, 10)]));
    assert!(selection.farms().is_empty());
}

#[test]
fn test_refresh_keeps_selection() {
    let mut selection = HierarchySelection::new();
    selection.select_company(Some(1));
    selection.select_grower(Some(10));
    let refresh = selection.refresh_growers().unwrap();
    assert!(selection.apply_growers(refresh, vec![grower(10, 1), grower(11, 1)]));
    assert_eq!(selection.grower(), Some(10));
    assert_eq!(selection.growers().len(), 2);
}

#[tokio::test]
async fn test_cache_reads_through_once() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut cache = ReferenceCache::new();

    let growers = cache
        .growers(seeded.store.as_ref(), seeded.company_id)
        .await
        .unwrap()
        .to_vec();
    assert_eq!(growers.len(), 1);
    assert!(cache.is_cached_growers(seeded.company_id));

    // Served from the cache while the store is unreachable
    seeded.store.set_offline(true);
    let cached = cache
        .growers(seeded.store.as_ref(), seeded.company_id)
        .await
        .unwrap();
    assert_eq!(cached, growers.as_slice());

    cache.invalidate_growers(seeded.company_id);
    assert!(cache
        .growers(seeded.store.as_ref(), seeded.company_id)
        .await
        .is_err());
}

#[tokio::test]
async fn test_create_invalidates_parent_list() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut cache = ReferenceCache::new();
    cache
        .farms(seeded.store.as_ref(), seeded.grower_id)
        .await
        .unwrap();

    create_farm(
        seeded.store.as_ref(),
        &mut cache,
        &FarmInput {
            grower_id: seeded.grower_id,
            farm_name: "Back Forty".to_string(),
            ..FarmInput::default()
        },
    )
    .await
    .unwrap();

    let farms = cache
        .farms(seeded.store.as_ref(), seeded.grower_id)
        .await
        .unwrap();
    assert_eq!(farms.len(), 2);
}

#[tokio::test]
async fn test_update_grower_refreshes_name() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut cache = ReferenceCache::new();
    let input = GrowerInput {
        company_id: seeded.company_id,
        grower_name: "Renamed".to_string(),
        ..GrowerInput::default()
    };

    update_grower(seeded.store.as_ref(), &mut cache, seeded.grower_id, &input)
        .await
        .unwrap();
    let growers = cache
        .growers(seeded.store.as_ref(), seeded.company_id)
        .await
        .unwrap();
    assert_eq!(growers[0].name, "Renamed");
}

#[tokio::test]
async fn test_declined_delete_leaves_store_untouched() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut cache = ReferenceCache::new();

    let outcome = delete_farm(
        seeded.store.as_ref(),
        &mut cache,
        seeded.farm_id,
        Confirmation::Declined,
    )
    .await
    .unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(seeded.store.list_farms(seeded.grower_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_grower_cascades() {
    let seeded = seeded_store("Acme Ag", false).await;
    let mut cache = ReferenceCache::new();
    let second = create_grower(
        seeded.store.as_ref(),
        &mut cache,
        &GrowerInput {
            company_id: seeded.company_id,
            grower_name: "Other".to_string(),
            ..GrowerInput::default()
        },
    )
    .await
    .unwrap();

    let outcome = delete_grower(
        seeded.store.as_ref(),
        &mut cache,
        seeded.grower_id,
        Confirmation::Confirmed,
    )
    .await
    .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);

    let growers = seeded.store.list_growers(seeded.company_id).await.unwrap();
    assert_eq!(growers.iter().map(|g| g.id).collect::<Vec<_>>(), vec![second]);
    assert!(seeded.store.list_farms(seeded.grower_id).await.unwrap().is_empty());
    assert!(seeded.store.list_fields(seeded.farm_id).await.unwrap().is_empty());
}
