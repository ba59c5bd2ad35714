//! Compile-time allow-list of listing fields that callers may filter, sort, or project on.

use serde::{Serialize, Serializer};

use super::QueryError;
use crate::listings::domain::{AreaUnit, ListingStatus, ListingType, PropertyCategory};

/// Semantic type used to coerce raw parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Enum(&'static [&'static str]),
    Boolean,
    Date,
    Text,
    Geo,
}

/// A filterable listing field. Predicates only ever name fields through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Description,
    Price,
    ListingType,
    Category,
    Status,
    IsActive,
    Featured,
    Bedrooms,
    Bathrooms,
    Area,
    AreaUnit,
    YearBuilt,
    Address,
    City,
    State,
    ZipCode,
    Coordinates,
    ProjectName,
    Developer,
    Amenities,
    Tags,
    Views,
    Likes,
    ExpiresAt,
    CreatedAt,
}

impl Field {
    pub const ALL: [Field; 26] = [
        Field::Title,
        Field::Description,
        Field::Price,
        Field::ListingType,
        Field::Category,
        Field::Status,
        Field::IsActive,
        Field::Featured,
        Field::Bedrooms,
        Field::Bathrooms,
        Field::Area,
        Field::AreaUnit,
        Field::YearBuilt,
        Field::Address,
        Field::City,
        Field::State,
        Field::ZipCode,
        Field::Coordinates,
        Field::ProjectName,
        Field::Developer,
        Field::Amenities,
        Field::Tags,
        Field::Views,
        Field::Likes,
        Field::ExpiresAt,
        Field::CreatedAt,
    ];

    /// Dotted document path as stored.
    pub fn path(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Price => "price",
            Field::ListingType => "listing_type",
            Field::Category => "category",
            Field::Status => "status",
            Field::IsActive => "is_active",
            Field::Featured => "featured",
            Field::Bedrooms => "specifications.bedrooms",
            Field::Bathrooms => "specifications.bathrooms",
            Field::Area => "specifications.area",
            Field::AreaUnit => "specifications.area_unit",
            Field::YearBuilt => "specifications.year_built",
            Field::Address => "location.address",
            Field::City => "location.city",
            Field::State => "location.state",
            Field::ZipCode => "location.zip_code",
            Field::Coordinates => "location.coordinates",
            Field::ProjectName => "project.name",
            Field::Developer => "project.developer",
            Field::Amenities => "amenities",
            Field::Tags => "tags",
            Field::Views => "views",
            Field::Likes => "likes",
            Field::ExpiresAt => "expires_at",
            Field::CreatedAt => "created_at",
        }
    }

    /// Short parameter names accepted in addition to the document path.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::ListingType => &["listingType", "type"],
            Field::Category => &["propertyType", "property_type"],
            Field::IsActive => &["isActive"],
            Field::Bedrooms => &["bedrooms"],
            Field::Bathrooms => &["bathrooms"],
            Field::Area => &["area"],
            Field::AreaUnit => &["area_unit", "areaUnit"],
            Field::YearBuilt => &["year_built", "yearBuilt"],
            Field::Address => &["address"],
            Field::City => &["city"],
            Field::State => &["state"],
            Field::ZipCode => &["zip_code", "zipCode", "zip"],
            Field::ProjectName => &["project", "projectName", "project_name"],
            Field::Developer => &["developer"],
            Field::ExpiresAt => &["expiresAt"],
            Field::CreatedAt => &["createdAt"],
            _ => &[],
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Title
            | Field::Description
            | Field::Address
            | Field::City
            | Field::State
            | Field::ZipCode
            | Field::ProjectName
            | Field::Developer
            | Field::Amenities
            | Field::Tags => FieldKind::Text,
            Field::Price
            | Field::Bedrooms
            | Field::Bathrooms
            | Field::Area
            | Field::YearBuilt
            | Field::Views
            | Field::Likes => FieldKind::Number,
            Field::ListingType => FieldKind::Enum(ListingType::LABELS),
            Field::Category => FieldKind::Enum(PropertyCategory::LABELS),
            Field::Status => FieldKind::Enum(ListingStatus::LABELS),
            Field::AreaUnit => FieldKind::Enum(AreaUnit::LABELS),
            Field::IsActive | Field::Featured => FieldKind::Boolean,
            Field::ExpiresAt | Field::CreatedAt => FieldKind::Date,
            Field::Coordinates => FieldKind::Geo,
        }
    }

    /// Top-level document key holding this field, used by projections.
    pub fn document_key(self) -> &'static str {
        match self.path().split_once('.') {
            Some((head, _)) => head,
            None => self.path(),
        }
    }

    pub fn sortable(self) -> bool {
        !matches!(
            self,
            Field::Description
                | Field::Address
                | Field::ZipCode
                | Field::Coordinates
                | Field::Amenities
                | Field::Tags
        )
    }

    /// Resolve a caller-supplied name. Names carrying operator syntax are refused
    /// outright; well-formed names that are simply unknown resolve to `None`.
    pub fn lookup(name: &str) -> Result<Option<Field>, QueryError> {
        ensure_plain_name(name)?;
        Ok(Field::ALL
            .iter()
            .copied()
            .find(|field| field.path() == name || field.aliases().contains(&name)))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Reject anything that is not a plain dotted identifier (`$where`, `a[b]`, `price;drop`).
pub(crate) fn ensure_plain_name(name: &str) -> Result<(), QueryError> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.');

    if plain {
        Ok(())
    } else {
        tracing::warn!(key = %name, "rejected query key carrying operator syntax");
        Err(QueryError::ForbiddenKey(name.to_string()))
    }
}
