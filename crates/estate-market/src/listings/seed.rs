use std::io::Read;
use std::path::Path;

use chrono::Utc;

use super::domain::{Listing, ListingValidationError};
use crate::store::{ListingStore, StoreError};

#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid {
        index: usize,
        source: ListingValidationError,
    },
    Store(StoreError),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Io(err) => write!(f, "failed to read listing seed: {}", err),
            SeedError::Json(err) => write!(f, "invalid listing seed JSON: {}", err),
            SeedError::Invalid { index, source } => {
                write!(f, "seed listing #{} is invalid: {}", index, source)
            }
            SeedError::Store(err) => write!(f, "could not store seed listing: {}", err),
        }
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedError::Io(err) => Some(err),
            SeedError::Json(err) => Some(err),
            SeedError::Invalid { source, .. } => Some(source),
            SeedError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SeedError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StoreError> for SeedError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Loads demo listings from a JSON array of listing documents.
pub struct ListingSeeder;

impl ListingSeeder {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Listing>, SeedError> {
        let listings: Vec<Listing> = serde_json::from_reader(reader)?;
        let now = Utc::now();
        for (index, listing) in listings.iter().enumerate() {
            listing
                .validate(now)
                .map_err(|source| SeedError::Invalid { index, source })?;
        }
        Ok(listings)
    }

    /// Insert every listing, failing on the first duplicate id.
    pub fn load<S: ListingStore>(store: &S, listings: Vec<Listing>) -> Result<usize, SeedError> {
        let mut inserted = 0;
        for listing in listings {
            store.insert(listing)?;
            inserted += 1;
        }
        tracing::info!(inserted, "seed listings loaded");
        Ok(inserted)
    }
}
