//! Result executor boundary for the listing query pipeline.

mod eval;
pub mod memory;

pub use memory::InMemoryListingStore;

use crate::listings::domain::{Listing, ListingId};
use crate::query::{Predicate, SortKey};

/// Data-query directives. Counting never sees these, only the bare filter.
#[derive(Debug, Clone, Copy)]
pub struct FindSpec<'a> {
    pub filter: &'a Predicate,
    pub sort: &'a [SortKey],
    pub skip: u64,
    pub limit: u64,
}

/// A matched listing plus its relevance score when the filter carries a text search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredListing {
    pub listing: Listing,
    pub score: Option<f64>,
}

/// One page of hits plus the total matched by the unpaginated filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundPage {
    pub hits: Vec<ScoredListing>,
    pub total: u64,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ListingStore: Send + Sync {
    fn insert(&self, listing: Listing) -> Result<Listing, StoreError>;
    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    fn remove(&self, id: &ListingId) -> Result<Listing, StoreError>;
    fn find(&self, spec: &FindSpec<'_>) -> Result<Vec<ScoredListing>, StoreError>;
    fn count(&self, filter: &Predicate) -> Result<u64, StoreError>;

    /// Read-modify-write of one record, atomic with respect to other writers.
    ///
    /// `apply` works on a copy; the stored record only changes when it returns `Ok`.
    fn modify<F, E>(&self, id: &ListingId, apply: F) -> Result<Listing, E>
    where
        F: FnOnce(&mut Listing) -> Result<(), E>,
        E: From<StoreError>;

    /// Data query and count. Stores that can serve both from one snapshot should override this.
    fn find_page(&self, spec: &FindSpec<'_>) -> Result<FoundPage, StoreError> {
        let hits = self.find(spec)?;
        let total = self.count(spec.filter)?;
        Ok(FoundPage { hits, total })
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    /// The store rejected a predicate it was handed. Translated queries never produce one.
    #[error("predicate cannot be executed: {0}")]
    InvalidPredicate(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
