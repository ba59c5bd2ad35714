use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};

use super::StoreError;
use crate::listings::domain::{GeoPoint, Listing};
use crate::query::geo::central_angle;
use crate::query::{Comparison, Field, FilterValue, Predicate, SortDirection};

const PATTERN_SIZE_LIMIT: usize = 1 << 16;

/// A listing attribute resolved for comparison.
#[derive(Debug, Clone, Copy)]
pub(super) enum Slot<'a> {
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Text(&'a str),
    Texts(&'a [String]),
    Point(GeoPoint),
    Missing,
}

pub(super) fn slot(listing: &Listing, field: Field) -> Slot<'_> {
    let specs = &listing.specifications;
    let location = &listing.location;
    match field {
        Field::Title => Slot::Text(listing.title.as_str()),
        Field::Description => Slot::Text(listing.description.as_str()),
        Field::Price => Slot::Number(listing.price),
        Field::ListingType => Slot::Text(listing.listing_type.label()),
        Field::Category => Slot::Text(listing.category.label()),
        Field::Status => Slot::Text(listing.status.label()),
        Field::IsActive => Slot::Bool(listing.is_active),
        Field::Featured => Slot::Bool(listing.featured),
        Field::Bedrooms => Slot::Number(f64::from(specs.bedrooms)),
        Field::Bathrooms => Slot::Number(f64::from(specs.bathrooms)),
        Field::Area => Slot::Number(specs.area),
        Field::AreaUnit => Slot::Text(specs.area_unit.label()),
        Field::YearBuilt => specs
            .year_built
            .map(|year| Slot::Number(f64::from(year)))
            .unwrap_or(Slot::Missing),
        Field::Address => Slot::Text(location.address.as_str()),
        Field::City => Slot::Text(location.city.as_str()),
        Field::State => Slot::Text(location.state.as_str()),
        Field::ZipCode => Slot::Text(location.zip_code.as_str()),
        Field::Coordinates => Slot::Point(location.coordinates),
        Field::ProjectName => listing
            .project
            .as_ref()
            .map(|project| Slot::Text(project.name.as_str()))
            .unwrap_or(Slot::Missing),
        Field::Developer => listing
            .project
            .as_ref()
            .map(|project| Slot::Text(project.developer.as_str()))
            .unwrap_or(Slot::Missing),
        Field::Amenities => Slot::Texts(listing.amenities.as_slice()),
        Field::Tags => Slot::Texts(listing.tags.as_slice()),
        Field::Views => Slot::Number(listing.views as f64),
        Field::Likes => Slot::Number(listing.likes as f64),
        Field::ExpiresAt => listing.expires_at.map(Slot::Date).unwrap_or(Slot::Missing),
        Field::CreatedAt => Slot::Date(listing.created_at),
    }
}

/// Predicate compiled once per query so regexes are not rebuilt per record.
pub(super) enum Matcher {
    All(Vec<Matcher>),
    Any(Vec<Matcher>),
    Compare {
        field: Field,
        cmp: Comparison,
        value: FilterValue,
    },
    In {
        field: Field,
        values: Vec<FilterValue>,
        negate: bool,
    },
    Pattern {
        field: Field,
        regex: Regex,
    },
    Text {
        terms: Vec<String>,
    },
    Geo {
        field: Field,
        center: GeoPoint,
        radius_radians: f64,
    },
}

impl Matcher {
    pub(super) fn compile(predicate: &Predicate) -> Result<Self, StoreError> {
        Ok(match predicate {
            Predicate::And { clauses } => Matcher::All(compile_all(clauses)?),
            Predicate::Or { clauses } => Matcher::Any(compile_all(clauses)?),
            Predicate::Compare { field, cmp, value } => Matcher::Compare {
                field: *field,
                cmp: *cmp,
                value: value.clone(),
            },
            Predicate::In { field, values } => Matcher::In {
                field: *field,
                values: values.clone(),
                negate: false,
            },
            Predicate::NotIn { field, values } => Matcher::In {
                field: *field,
                values: values.clone(),
                negate: true,
            },
            Predicate::Pattern {
                field,
                pattern,
                case_insensitive,
            } => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .size_limit(PATTERN_SIZE_LIMIT)
                    .build()
                    .map_err(|err| StoreError::InvalidPredicate(err.to_string()))?;
                Matcher::Pattern {
                    field: *field,
                    regex,
                }
            }
            Predicate::Text { query } => {
                let terms = text_terms(query);
                if terms.is_empty() {
                    return Err(StoreError::InvalidPredicate(
                        "text search without terms".to_string(),
                    ));
                }
                Matcher::Text { terms }
            }
            Predicate::GeoWithin {
                field,
                center,
                radius_radians,
            } => Matcher::Geo {
                field: *field,
                center: *center,
                radius_radians: *radius_radians,
            },
        })
    }

    pub(super) fn matches(&self, listing: &Listing) -> bool {
        match self {
            Matcher::All(children) => children.iter().all(|child| child.matches(listing)),
            Matcher::Any(children) => children.iter().any(|child| child.matches(listing)),
            Matcher::Compare { field, cmp, value } => compare(slot(listing, *field), *cmp, value),
            Matcher::In {
                field,
                values,
                negate,
            } => {
                let current = slot(listing, *field);
                let found = values.iter().any(|value| equals(current, value));
                found != *negate
            }
            Matcher::Pattern { field, regex } => match slot(listing, *field) {
                Slot::Text(text) => regex.is_match(text),
                Slot::Texts(items) => items.iter().any(|item| regex.is_match(item)),
                _ => false,
            },
            Matcher::Text { terms } => text_score(listing, terms) > 0.0,
            Matcher::Geo {
                field,
                center,
                radius_radians,
            } => match slot(listing, *field) {
                Slot::Point(point) => central_angle(*center, point) <= *radius_radians,
                _ => false,
            },
        }
    }
}

fn compile_all(clauses: &[Predicate]) -> Result<Vec<Matcher>, StoreError> {
    clauses.iter().map(Matcher::compile).collect()
}

fn ordering(current: Slot<'_>, value: &FilterValue) -> Option<Ordering> {
    match (current, value) {
        (Slot::Number(a), FilterValue::Number(b)) => a.partial_cmp(b),
        (Slot::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
        (Slot::Date(a), FilterValue::Date(b)) => Some(a.cmp(b)),
        (Slot::Text(a), FilterValue::Text(b)) => Some(a.cmp(b.as_str())),
        _ => None,
    }
}

fn equals(current: Slot<'_>, value: &FilterValue) -> bool {
    match (current, value) {
        (Slot::Texts(items), FilterValue::Text(text)) => items.iter().any(|item| item == text),
        _ => ordering(current, value) == Some(Ordering::Equal),
    }
}

fn compare(current: Slot<'_>, cmp: Comparison, value: &FilterValue) -> bool {
    if let Slot::Texts(items) = current {
        return match cmp {
            Comparison::Eq => equals(current, value),
            Comparison::Ne => !equals(current, value),
            _ => items
                .iter()
                .any(|item| compare(Slot::Text(item.as_str()), cmp, value)),
        };
    }

    let order = ordering(current, value);
    match cmp {
        Comparison::Eq => order == Some(Ordering::Equal),
        Comparison::Ne => order != Some(Ordering::Equal),
        Comparison::Gt => order == Some(Ordering::Greater),
        Comparison::Gte => matches!(order, Some(Ordering::Greater | Ordering::Equal)),
        Comparison::Lt => order == Some(Ordering::Less),
        Comparison::Lte => matches!(order, Some(Ordering::Less | Ordering::Equal)),
    }
}

pub(super) fn text_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Weighted term frequency over the indexed text fields.
pub(super) fn text_score(listing: &Listing, terms: &[String]) -> f64 {
    let title = listing.title.to_lowercase();
    let description = listing.description.to_lowercase();
    let project = listing
        .project
        .as_ref()
        .map(|project| project.name.to_lowercase())
        .unwrap_or_default();

    terms
        .iter()
        .map(|term| {
            let hits = |text: &str| text.matches(term.as_str()).count() as f64;
            let in_list = |items: &[String]| {
                items
                    .iter()
                    .map(|item| hits(&item.to_lowercase()))
                    .sum::<f64>()
            };
            3.0 * hits(&title)
                + 2.0 * hits(&project)
                + 2.0 * in_list(&listing.tags)
                + in_list(&listing.amenities)
                + hits(&description)
        })
        .sum()
}

/// Ordering for sort keys. Missing values always sort last.
pub(super) fn order_slots(a: Slot<'_>, b: Slot<'_>, direction: SortDirection) -> Ordering {
    let base = match (a, b) {
        (Slot::Missing, Slot::Missing) => return Ordering::Equal,
        (Slot::Missing, _) => return Ordering::Greater,
        (_, Slot::Missing) => return Ordering::Less,
        (Slot::Number(x), Slot::Number(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Slot::Bool(x), Slot::Bool(y)) => x.cmp(&y),
        (Slot::Date(x), Slot::Date(y)) => x.cmp(&y),
        (Slot::Text(x), Slot::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => Ordering::Equal,
    };
    match direction {
        SortDirection::Asc => base,
        SortDirection::Desc => base.reverse(),
    }
}
