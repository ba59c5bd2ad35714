use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{Listing, ListingDraft, ListingId, ListingUpdate};
use super::service::{ListingService, ListingServiceError};
use crate::query::{Projection, QueryParams};
use crate::store::{ListingStore, StoreError};

/// Router builder exposing listing CRUD and search endpoints.
pub fn listing_router<S>(service: Arc<ListingService<S>>) -> Router
where
    S: ListingStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings",
            get(search_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/listings/:listing_id",
            get(get_handler::<S>)
                .patch(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route("/api/v1/listings/:listing_id/like", post(like_handler::<S>))
        .with_state(service)
}

pub(crate) async fn search_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    RawQuery(raw): RawQuery,
) -> Response
where
    S: ListingStore + 'static,
{
    let params = QueryParams::parse(raw.as_deref().unwrap_or_default());
    match service.search(&params) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    axum::Json(draft): axum::Json<ListingDraft>,
) -> Response
where
    S: ListingStore + 'static,
{
    match service.create(draft) {
        Ok(listing) => listing_response(StatusCode::CREATED, &listing),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
{
    match service.get(&ListingId(listing_id)) {
        Ok(listing) => listing_response(StatusCode::OK, &listing),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    Path(listing_id): Path<String>,
    axum::Json(changes): axum::Json<ListingUpdate>,
) -> Response
where
    S: ListingStore + 'static,
{
    match service.update(&ListingId(listing_id), changes) {
        Ok(listing) => listing_response(StatusCode::OK, &listing),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
{
    match service.delete(&ListingId(listing_id)) {
        Ok(removed) => {
            let payload = json!({ "id": removed.id, "deleted": true });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn like_handler<S>(
    State(service): State<Arc<ListingService<S>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
{
    match service.like(&ListingId(listing_id)) {
        Ok(listing) => {
            let payload = json!({ "id": listing.id, "likes": listing.likes });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn listing_response(status: StatusCode, listing: &Listing) -> Response {
    match serde_json::to_value(listing) {
        Ok(document) => (status, axum::Json(Projection::Default.apply(document))).into_response(),
        Err(error) => error_response(ListingServiceError::Serialization(error)),
    }
}

pub(crate) fn error_response(error: ListingServiceError) -> Response {
    let (status, message) = match &error {
        ListingServiceError::Query(err) => (StatusCode::BAD_REQUEST, err.to_string()),
        ListingServiceError::Validation(err) => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        ListingServiceError::Store(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "listing not found".to_string())
        }
        ListingServiceError::Store(StoreError::Conflict) => {
            (StatusCode::CONFLICT, "listing already exists".to_string())
        }
        ListingServiceError::Store(StoreError::InvalidPredicate(_)) => {
            tracing::error!(error = %error, "store rejected a translated query");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "listing query could not be executed".to_string(),
            )
        }
        ListingServiceError::Store(_) | ListingServiceError::Serialization(_) => {
            tracing::error!(error = %error, "listing request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "listing store unavailable".to_string(),
            )
        }
    };
    (status, axum::Json(json!({ "error": message }))).into_response()
}
