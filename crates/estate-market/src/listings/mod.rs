//! Listing documents, their lifecycle service, and the HTTP surface that drives search.
//!
//! Search requests go through [`crate::query::ListingQuery`] and are executed against any
//! [`crate::store::ListingStore`]; the pagination total always comes from a separate count over
//! the same filter.

pub mod domain;
pub mod router;
pub mod seed;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AreaUnit, GeoPoint, Listing, ListingDraft, ListingId, ListingStatus, ListingType,
    ListingUpdate, ListingValidationError, Location, ProjectInfo, PropertyCategory,
    Specifications,
};
pub use router::listing_router;
pub use seed::{ListingSeeder, SeedError};
pub use service::{ListingService, ListingServiceError, SearchPage};
