use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::listings::domain::{
    AreaUnit, GeoPoint, ListingDraft, ListingId, ListingType, Location, ProjectInfo,
    PropertyCategory, Specifications,
};
use crate::listings::{listing_router, Listing, ListingService};
use crate::query::{Predicate, QueryLimits};
use crate::store::{FindSpec, InMemoryListingStore, ListingStore, ScoredListing, StoreError};

pub(super) fn draft(title: &str, city: &str, price: f64) -> ListingDraft {
    ListingDraft {
        owner_id: "agent-7".to_string(),
        title: title.to_string(),
        description: "Light-filled rooms close to transit".to_string(),
        price,
        listing_type: ListingType::Sale,
        category: PropertyCategory::Condo,
        specifications: Specifications {
            bedrooms: 2,
            bathrooms: 1,
            area: 92.5,
            area_unit: AreaUnit::Sqm,
            year_built: Some(2012),
        },
        location: Location {
            address: "400 Congress Ave".to_string(),
            city: city.to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
            coordinates: GeoPoint {
                lat: 30.2672,
                lng: -97.7431,
            },
        },
        project: Some(ProjectInfo {
            name: "Congress Tower".to_string(),
            developer: "Lone Star Builders".to_string(),
        }),
        amenities: vec!["Gym".to_string(), "Rooftop deck".to_string()],
        tags: vec!["downtown".to_string()],
        featured: false,
        expires_at: None,
    }
}

pub(super) fn build_service() -> (ListingService<InMemoryListingStore>, Arc<InMemoryListingStore>) {
    let store = Arc::new(InMemoryListingStore::new());
    let service = ListingService::new(store.clone(), QueryLimits::default());
    (service, store)
}

pub(super) fn router_with_service(service: ListingService<InMemoryListingStore>) -> axum::Router {
    listing_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

/// Store whose every call fails, for exercising the 500 path.
pub(super) struct UnavailableStore;

impl ListingStore for UnavailableStore {
    fn insert(&self, _listing: Listing) -> Result<Listing, StoreError> {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()))
    }

    fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()))
    }

    fn remove(&self, _id: &ListingId) -> Result<Listing, StoreError> {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()))
    }

    fn find(&self, _spec: &FindSpec<'_>) -> Result<Vec<ScoredListing>, StoreError> {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()))
    }

    fn count(&self, _filter: &Predicate) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()))
    }

    fn modify<F, E>(&self, _id: &ListingId, _apply: F) -> Result<Listing, E>
    where
        F: FnOnce(&mut Listing) -> Result<(), E>,
        E: From<StoreError>,
    {
        Err(StoreError::Unavailable("connection refused by db-1:27017".to_string()).into())
    }
}
