use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use super::domain::{
    Listing, ListingDraft, ListingId, ListingStatus, ListingUpdate, ListingValidationError,
};
use crate::query::{
    DroppedFragment, ListingQuery, PaginationEnvelope, QueryError, QueryLimits, QueryParams,
};
use crate::store::{FoundPage, ListingStore, ScoredListing, StoreError};

/// Service composing validation, the query pipeline, and the listing store.
pub struct ListingService<S> {
    store: Arc<S>,
    limits: QueryLimits,
}

static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_listing_id() -> ListingId {
    let id = LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ListingId(format!("lst-{id:06}"))
}

/// One page of search results plus the envelope computed from the unpaginated count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub data: Vec<Value>,
    pub pagination: PaginationEnvelope,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedFragment>,
}

impl<S> ListingService<S>
where
    S: ListingStore + 'static,
{
    pub fn new(store: Arc<S>, limits: QueryLimits) -> Self {
        Self { store, limits }
    }

    /// Publish a new listing. Fresh listings await moderation.
    pub fn create(&self, draft: ListingDraft) -> Result<Listing, ListingServiceError> {
        let now = Utc::now();
        let listing = Listing {
            id: next_listing_id(),
            owner_id: draft.owner_id,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            listing_type: draft.listing_type,
            category: draft.category,
            status: ListingStatus::Pending,
            is_active: true,
            featured: draft.featured,
            specifications: draft.specifications,
            location: draft.location,
            project: draft.project,
            amenities: draft.amenities,
            tags: draft.tags,
            views: 0,
            likes: 0,
            expires_at: draft.expires_at,
            created_at: now,
            updated_at: now,
            revision: 0,
        };
        listing.validate(now)?;

        let stored = self.store.insert(listing)?;
        tracing::info!(listing_id = %stored.id.0, owner = %stored.owner_id, "listing created");
        Ok(stored)
    }

    /// Fetch a listing for display, counting the view.
    pub fn get(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.store.modify(id, |listing| {
            listing.views = listing.views.saturating_add(1);
            Ok(())
        })
    }

    pub fn update(
        &self,
        id: &ListingId,
        changes: ListingUpdate,
    ) -> Result<Listing, ListingServiceError> {
        let updated = self.store.modify(
            id,
            |listing: &mut Listing| -> Result<(), ListingServiceError> {
                changes.apply_to(listing);
                let now = Utc::now();
                listing.validate(now)?;
                listing.revision = listing.revision.saturating_add(1);
                listing.updated_at = now;
                Ok(())
            },
        )?;
        tracing::info!(listing_id = %updated.id.0, revision = updated.revision, "listing updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        let removed = self.store.remove(id)?;
        tracing::info!(listing_id = %removed.id.0, "listing removed");
        Ok(removed)
    }

    pub fn like(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.store.modify(id, |listing| {
            listing.likes = listing.likes.saturating_add(1);
            Ok(())
        })
    }

    /// Compose a query from raw parameters and execute it.
    pub fn search(&self, params: &QueryParams) -> Result<SearchPage, ListingServiceError> {
        let query = ListingQuery::from_params(params, &self.limits)?;
        self.execute(query)
    }

    /// Run a composed query: the page of hits plus a count over the bare filter.
    pub fn execute(&self, query: ListingQuery) -> Result<SearchPage, ListingServiceError> {
        let FoundPage { hits, total } = self.store.find_page(&query.find_spec())?;

        let data = hits
            .into_iter()
            .map(|hit| render(hit, &query))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            total,
            returned = data.len(),
            page = query.page.page,
            unfiltered = query.filter.is_all(),
            dropped = query.dropped.len(),
            "listing search executed"
        );

        Ok(SearchPage {
            data,
            pagination: PaginationEnvelope::new(query.page, total),
            dropped: query.dropped,
        })
    }
}

fn render(hit: ScoredListing, query: &ListingQuery) -> Result<Value, serde_json::Error> {
    let mut document = serde_json::to_value(&hit.listing)?;
    if let (true, Some(score), Value::Object(map)) = (query.relevance, hit.score, &mut document) {
        map.insert("score".to_string(), Value::from(score));
    }
    Ok(query.projection.apply(document))
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render listing: {0}")]
    Serialization(#[from] serde_json::Error),
}
