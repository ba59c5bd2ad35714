use std::thread;

use super::common::*;
use crate::listings::domain::{ListingId, ListingStatus, ListingUpdate, ListingValidationError};
use crate::listings::ListingServiceError;
use crate::query::{DropReason, QueryError, QueryParams};
use crate::store::{ListingStore, StoreError};

#[test]
fn create_assigns_id_and_pending_status() {
    let (service, store) = build_service();
    let listing = service
        .create(draft("Downtown condo", "Austin", 525_000.0))
        .expect("draft is valid");

    assert!(listing.id.0.starts_with("lst-"));
    assert_eq!(listing.status, ListingStatus::Pending);
    assert!(listing.is_active);
    assert_eq!(listing.revision, 0);
    assert!(store.fetch(&listing.id).expect("fetch").is_some());
}

#[test]
fn create_rejects_invalid_drafts() {
    let (service, _) = build_service();

    match service.create(draft("   ", "Austin", 1.0)) {
        Err(ListingServiceError::Validation(ListingValidationError::Blank { field })) => {
            assert_eq!(field, "title")
        }
        other => panic!("expected blank title, got {other:?}"),
    }

    let mut off_map = draft("Somewhere", "Austin", 1.0);
    off_map.location.coordinates.lat = 123.0;
    assert!(matches!(
        service.create(off_map),
        Err(ListingServiceError::Validation(ListingValidationError::Coordinates { .. }))
    ));

    assert!(matches!(
        service.create(draft("Free house", "Austin", 0.0)),
        Err(ListingServiceError::Validation(ListingValidationError::Price))
    ));
}

#[test]
fn get_counts_views_and_like_counts_likes() {
    let (service, store) = build_service();
    let created = service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");

    service.get(&created.id).expect("first view");
    let viewed = service.get(&created.id).expect("second view");
    assert_eq!(viewed.views, 2);

    let liked = service.like(&created.id).expect("liked");
    assert_eq!(liked.likes, 1);
    let stored = store.fetch(&created.id).expect("fetch").expect("present");
    assert_eq!((stored.views, stored.likes), (2, 1));
}

#[test]
fn update_applies_partial_changes_and_bumps_revision() {
    let (service, _) = build_service();
    let created = service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");

    let updated = service
        .update(
            &created.id,
            ListingUpdate {
                price: Some(289_000.0),
                tags: Some(vec!["price-drop".to_string()]),
                ..ListingUpdate::default()
            },
        )
        .expect("update applies");

    assert_eq!(updated.price, 289_000.0);
    assert_eq!(updated.tags, vec!["price-drop".to_string()]);
    assert_eq!(updated.title, "Condo");
    assert_eq!(updated.revision, 1);
    assert!(updated.updated_at >= created.updated_at);

    let invalid = service.update(
        &created.id,
        ListingUpdate {
            price: Some(-5.0),
            ..ListingUpdate::default()
        },
    );
    assert!(matches!(
        invalid,
        Err(ListingServiceError::Validation(ListingValidationError::Price))
    ));
}

#[test]
fn missing_listings_surface_not_found() {
    let (service, _) = build_service();
    let id = ListingId("lst-missing".to_string());

    for result in [
        service.get(&id),
        service.like(&id),
        service.delete(&id),
        service.update(&id, ListingUpdate::default()),
    ] {
        assert!(matches!(
            result,
            Err(ListingServiceError::Store(StoreError::NotFound))
        ));
    }
}

#[test]
fn search_total_ignores_paging() {
    let (service, _) = build_service();
    for index in 0..7 {
        service
            .create(draft(&format!("Condo {index}"), "Austin", 200_000.0 + index as f64))
            .expect("created");
    }
    service
        .create(draft("Ranch", "Dallas", 250_000.0))
        .expect("created");

    let page = service
        .search(&QueryParams::parse("city=austin&page=2&limit=3&sort=price"))
        .expect("search runs");

    assert_eq!(page.data.len(), 3);
    assert_eq!(page.pagination.total, 7);
    assert_eq!(page.pagination.pages, 3);
    assert!(page.pagination.has_next);
    assert!(page.pagination.has_prev);
    assert_eq!(page.data[0]["price"], 200_003.0);
    assert!(page.data[0].get("revision").is_none());
}

#[test]
fn search_projection_and_relevance_score() {
    let (service, _) = build_service();
    service
        .create(draft("Lakeside cottage by the lake", "Austin", 410_000.0))
        .expect("created");
    service
        .create(draft("City loft", "Austin", 390_000.0))
        .expect("created");

    let page = service
        .search(&QueryParams::parse("text=lake&fields=title"))
        .expect("search runs");

    assert_eq!(page.pagination.total, 1);
    let document = page.data[0].as_object().expect("object");
    let mut keys: Vec<&str> = document.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["id", "score", "title"]);
    assert!(document["score"].as_f64().expect("numeric score") > 0.0);
}

#[test]
fn search_reports_dropped_fragments_and_refuses_injection() {
    let (service, _) = build_service();
    service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");

    let page = service
        .search(&QueryParams::parse("minPrice=abc"))
        .expect("malformed fragment is dropped");
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.dropped.len(), 1);
    assert_eq!(page.dropped[0].key, "minPrice");

    assert!(matches!(
        service.search(&QueryParams::parse("$where=1")),
        Err(ListingServiceError::Query(QueryError::ForbiddenKey(_)))
    ));
}

#[test]
fn oversized_terms_are_dropped_before_reaching_the_store() {
    let (service, _) = build_service();
    service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");
    let long = "a".repeat(2000);

    for key in ["search", "q", "city", "title"] {
        let page = service
            .search(&QueryParams::from_pairs([(key, long.as_str())]))
            .expect("oversized term is dropped");
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.dropped.len(), 1);
        assert_eq!(page.dropped[0].key, key);
        assert_eq!(page.dropped[0].reason, DropReason::TermTooLong);
    }
}

#[test]
fn concurrent_likes_and_views_are_all_counted() {
    let (service, store) = build_service();
    let created = service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..250 {
                    service.like(&created.id).expect("liked");
                    service.get(&created.id).expect("viewed");
                }
            });
        }
    });

    let stored = store.fetch(&created.id).expect("fetch").expect("present");
    assert_eq!((stored.likes, stored.views), (2_000, 2_000));
}

#[test]
fn views_never_revert_a_concurrent_update() {
    let (service, store) = build_service();
    let created = service
        .create(draft("Condo", "Austin", 300_000.0))
        .expect("created");

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..500 {
                service.get(&created.id).expect("viewed");
            }
        });
        scope.spawn(|| {
            for step in 1..=100 {
                let changes = ListingUpdate {
                    price: Some(300_000.0 + f64::from(step)),
                    ..ListingUpdate::default()
                };
                service.update(&created.id, changes).expect("updated");
            }
        });
    });

    let stored = store.fetch(&created.id).expect("fetch").expect("present");
    assert_eq!(stored.price, 300_100.0);
    assert_eq!(stored.revision, 100);
    assert_eq!(stored.views, 500);
}
