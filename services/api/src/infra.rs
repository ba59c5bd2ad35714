use estate_market::listings::{ListingSeeder, SeedError};
use estate_market::store::InMemoryListingStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the process-local listing store, optionally hydrated from a seed file.
pub(crate) fn listing_store(seed: Option<&Path>) -> Result<InMemoryListingStore, SeedError> {
    let store = InMemoryListingStore::new();
    if let Some(path) = seed {
        let listings = ListingSeeder::from_path(path)?;
        ListingSeeder::load(&store, listings)?;
    }
    Ok(store)
}
