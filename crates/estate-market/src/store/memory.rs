use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::eval::{order_slots, slot, text_score, text_terms, Matcher, Slot};
use super::{FindSpec, FoundPage, ListingStore, ScoredListing, StoreError};
use crate::listings::domain::{Listing, ListingId};
use crate::query::{Predicate, SortKey, SortTarget};

/// Process-local store that executes predicates directly against listing documents.
#[derive(Default, Clone)]
pub struct InMemoryListingStore {
    records: Arc<RwLock<BTreeMap<ListingId, Listing>>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: impl IntoIterator<Item = Listing>) -> Self {
        let records = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<ListingId, Listing>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("listing store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<ListingId, Listing>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("listing store lock poisoned".to_string()))
    }
}

impl ListingStore for InMemoryListingStore {
    fn insert(&self, listing: Listing) -> Result<Listing, StoreError> {
        let mut guard = self.write()?;
        if guard.contains_key(&listing.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(self.read()?.get(id).cloned())
    }

    fn remove(&self, id: &ListingId) -> Result<Listing, StoreError> {
        self.write()?.remove(id).ok_or(StoreError::NotFound)
    }

    fn find(&self, spec: &FindSpec<'_>) -> Result<Vec<ScoredListing>, StoreError> {
        let matcher = Matcher::compile(spec.filter)?;
        let guard = self.read()?;
        Ok(page_of(&guard, &matcher, spec))
    }

    fn count(&self, filter: &Predicate) -> Result<u64, StoreError> {
        let matcher = Matcher::compile(filter)?;
        let guard = self.read()?;
        Ok(count_of(&guard, &matcher))
    }

    fn modify<F, E>(&self, id: &ListingId, apply: F) -> Result<Listing, E>
    where
        F: FnOnce(&mut Listing) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut guard = self.write()?;
        let stored = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        let mut draft = stored.clone();
        apply(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }

    fn find_page(&self, spec: &FindSpec<'_>) -> Result<FoundPage, StoreError> {
        let matcher = Matcher::compile(spec.filter)?;
        let guard = self.read()?;
        Ok(FoundPage {
            hits: page_of(&guard, &matcher, spec),
            total: count_of(&guard, &matcher),
        })
    }
}

fn count_of(records: &BTreeMap<ListingId, Listing>, matcher: &Matcher) -> u64 {
    records
        .values()
        .filter(|listing| matcher.matches(listing))
        .count() as u64
}

fn page_of(
    records: &BTreeMap<ListingId, Listing>,
    matcher: &Matcher,
    spec: &FindSpec<'_>,
) -> Vec<ScoredListing> {
    let terms = spec.filter.text_query().map(text_terms);
    let mut hits: Vec<(&Listing, Option<f64>)> = records
        .values()
        .filter(|listing| matcher.matches(listing))
        .map(|listing| {
            let score = terms.as_deref().map(|terms| text_score(listing, terms));
            (listing, score)
        })
        .collect();

    hits.sort_by(|a, b| compare_hits(*a, *b, spec.sort));

    let skip = usize::try_from(spec.skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(spec.limit).unwrap_or(usize::MAX);
    hits.into_iter()
        .skip(skip)
        .take(limit)
        .map(|(listing, score)| ScoredListing {
            listing: listing.clone(),
            score,
        })
        .collect()
}

fn compare_hits(
    (a, a_score): (&Listing, Option<f64>),
    (b, b_score): (&Listing, Option<f64>),
    sort: &[SortKey],
) -> Ordering {
    for key in sort {
        let order = match key.target {
            SortTarget::Field(field) => order_slots(slot(a, field), slot(b, field), key.direction),
            SortTarget::Relevance => order_slots(
                a_score.map(Slot::Number).unwrap_or(Slot::Missing),
                b_score.map(Slot::Number).unwrap_or(Slot::Missing),
                key.direction,
            ),
        };
        if order != Ordering::Equal {
            return order;
        }
    }
    a.id.cmp(&b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::{
        AreaUnit, GeoPoint, ListingStatus, ListingType, Location, PropertyCategory,
        Specifications,
    };
    use crate::query::{Comparison, Field, FilterValue, SortDirection};
    use chrono::{TimeZone, Utc};

    fn listing(id: &str, city: &str, price: f64, day: u32) -> Listing {
        let created = Utc
            .with_ymd_and_hms(2025, 1, day, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        Listing {
            id: ListingId(id.to_string()),
            owner_id: "agent-1".to_string(),
            title: format!("Home in {city}"),
            description: "Quiet street".to_string(),
            price,
            listing_type: ListingType::Sale,
            category: PropertyCategory::House,
            status: ListingStatus::Approved,
            is_active: true,
            featured: false,
            specifications: Specifications {
                bedrooms: 3,
                bathrooms: 2,
                area: 140.0,
                area_unit: AreaUnit::Sqm,
                year_built: None,
            },
            location: Location {
                address: "1 Main St".to_string(),
                city: city.to_string(),
                state: "TX".to_string(),
                zip_code: "78701".to_string(),
                coordinates: GeoPoint {
                    lat: 30.27,
                    lng: -97.74,
                },
            },
            project: None,
            amenities: vec!["Pool".to_string()],
            tags: Vec::new(),
            views: 0,
            likes: 0,
            expires_at: None,
            created_at: created,
            updated_at: created,
            revision: 0,
        }
    }

    fn store() -> InMemoryListingStore {
        InMemoryListingStore::with_listings([
            listing("a", "Austin", 450_000.0, 1),
            listing("b", "Austin", 650_000.0, 2),
            listing("c", "Dallas", 700_000.0, 3),
            listing("d", "austin", 900_000.0, 4),
        ])
    }

    fn ids(hits: &[ScoredListing]) -> Vec<&str> {
        hits.iter().map(|hit| hit.listing.id.0.as_str()).collect()
    }

    #[test]
    fn insert_refuses_duplicates_and_modify_requires_existing() {
        let store = InMemoryListingStore::new();
        store.insert(listing("a", "Austin", 1.0, 1)).expect("first insert");
        assert!(matches!(
            store.insert(listing("a", "Austin", 1.0, 1)),
            Err(StoreError::Conflict)
        ));
        let missing: Result<Listing, StoreError> =
            store.modify(&ListingId("z".to_string()), |_| Ok(()));
        assert!(matches!(missing, Err(StoreError::NotFound)));
        assert!(store.remove(&ListingId("a".to_string())).is_ok());
        assert!(store.fetch(&ListingId("a".to_string())).unwrap().is_none());
    }

    #[test]
    fn failed_modify_leaves_the_record_untouched() {
        let store = store();
        let id = ListingId("a".to_string());
        let refused: Result<Listing, StoreError> = store.modify(&id, |listing| {
            listing.price = -1.0;
            Err(StoreError::Conflict)
        });
        assert!(matches!(refused, Err(StoreError::Conflict)));
        assert_eq!(store.fetch(&id).expect("fetch").expect("present").price, 450_000.0);

        let liked: Result<Listing, StoreError> = store.modify(&id, |listing| {
            listing.likes += 1;
            Ok(())
        });
        assert_eq!(liked.expect("modified").likes, 1);
        assert_eq!(store.fetch(&id).expect("fetch").expect("present").likes, 1);
    }

    #[test]
    fn concurrent_modifications_are_not_lost() {
        let store = store();
        let id = ListingId("b".to_string());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let bumped: Result<Listing, StoreError> = store.modify(&id, |listing| {
                            listing.views += 1;
                            Ok(())
                        });
                        bumped.expect("modified");
                    }
                });
            }
        });
        assert_eq!(store.fetch(&id).expect("fetch").expect("present").views, 4_000);
    }

    #[test]
    fn find_page_matches_find_and_count() {
        let store = store();
        let filter = Predicate::Pattern {
            field: Field::City,
            pattern: "austin".to_string(),
            case_insensitive: true,
        };
        let sort = [SortKey::desc(SortTarget::Field(Field::Price))];
        let spec = FindSpec {
            filter: &filter,
            sort: &sort,
            skip: 1,
            limit: 1,
        };

        let page = store.find_page(&spec).expect("find page");
        assert_eq!(page.total, 3);
        assert_eq!(page.total, store.count(&filter).expect("count"));
        assert_eq!(page.hits, store.find(&spec).expect("find"));
        assert_eq!(ids(&page.hits), ["b"]);
    }

    #[test]
    fn find_sorts_skips_and_limits_while_count_ignores_paging() {
        let store = store();
        let filter = Predicate::and(vec![
            Predicate::Pattern {
                field: Field::City,
                pattern: "Austin".to_string(),
                case_insensitive: true,
            },
            Predicate::compare(Field::Price, Comparison::Gte, FilterValue::Number(500_000.0)),
        ]);
        let sort = [SortKey {
            target: SortTarget::Field(Field::Price),
            direction: SortDirection::Desc,
        }];

        let first = store
            .find(&FindSpec {
                filter: &filter,
                sort: &sort,
                skip: 0,
                limit: 1,
            })
            .expect("find");
        let second = store
            .find(&FindSpec {
                filter: &filter,
                sort: &sort,
                skip: 1,
                limit: 1,
            })
            .expect("find");

        assert_eq!(ids(&first), ["d"]);
        assert_eq!(ids(&second), ["b"]);
        assert_eq!(store.count(&filter).expect("count"), 2);
    }

    #[test]
    fn text_search_scores_and_orders_by_relevance() {
        let mut loft = listing("x", "Austin", 1.0, 5);
        loft.title = "Lake loft with lake view".to_string();
        let mut cabin = listing("y", "Austin", 1.0, 6);
        cabin.description = "Walk to the lake".to_string();
        let store = InMemoryListingStore::with_listings([loft, cabin, listing("z", "Austin", 1.0, 7)]);

        let filter = Predicate::Text {
            query: "Lake".to_string(),
        };
        let sort = [SortKey::desc(SortTarget::Relevance)];
        let hits = store
            .find(&FindSpec {
                filter: &filter,
                sort: &sort,
                skip: 0,
                limit: 10,
            })
            .expect("find");

        assert_eq!(ids(&hits), ["x", "y"]);
        assert_eq!(hits[0].score, Some(6.0));
        assert_eq!(hits[1].score, Some(1.0));
    }

    #[test]
    fn geo_membership_uses_angular_radius() {
        let mut far = listing("far", "Houston", 1.0, 1);
        far.location.coordinates = GeoPoint {
            lat: 29.76,
            lng: -95.37,
        };
        let store = InMemoryListingStore::with_listings([listing("near", "Austin", 1.0, 2), far]);
        let filter = Predicate::GeoWithin {
            field: Field::Coordinates,
            center: GeoPoint {
                lat: 30.2,
                lng: -97.7,
            },
            radius_radians: 10.0 / 6371.0,
        };
        assert_eq!(store.count(&filter).expect("count"), 1);
    }

    #[test]
    fn list_fields_and_missing_values() {
        let mut tagged = listing("t", "Austin", 1.0, 1);
        tagged.tags = vec!["waterfront".to_string()];
        tagged.specifications.year_built = Some(2001);
        let store = InMemoryListingStore::with_listings([tagged, listing("u", "Austin", 1.0, 2)]);

        let not_in = Predicate::NotIn {
            field: Field::Tags,
            values: vec![FilterValue::Text("waterfront".to_string())],
        };
        assert_eq!(store.count(&not_in).expect("count"), 1);

        let built_after = Predicate::compare(Field::YearBuilt, Comparison::Gt, FilterValue::Number(1990.0));
        assert_eq!(store.count(&built_after).expect("count"), 1);

        let sort = [SortKey::desc(SortTarget::Field(Field::YearBuilt))];
        let all = Predicate::all();
        let hits = store
            .find(&FindSpec {
                filter: &all,
                sort: &sort,
                skip: 0,
                limit: 10,
            })
            .expect("find");
        assert_eq!(ids(&hits), ["t", "u"]);
    }

    #[test]
    fn default_recency_sort_is_newest_first() {
        let store = store();
        let all = Predicate::all();
        let sort = [SortKey::desc(SortTarget::Field(Field::CreatedAt))];
        let hits = store
            .find(&FindSpec {
                filter: &all,
                sort: &sort,
                skip: 0,
                limit: 10,
            })
            .expect("find");
        assert_eq!(ids(&hits), ["d", "c", "b", "a"]);
    }
}
