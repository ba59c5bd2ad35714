use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Whether the property is offered for purchase or for tenancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub const LABELS: &'static [&'static str] = &["sale", "rent"];

    pub fn label(self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    Apartment,
    House,
    Villa,
    Condo,
    Townhouse,
    Land,
    Commercial,
    Office,
}

impl PropertyCategory {
    pub const LABELS: &'static [&'static str] = &[
        "apartment",
        "house",
        "villa",
        "condo",
        "townhouse",
        "land",
        "commercial",
        "office",
    ];

    pub fn label(self) -> &'static str {
        match self {
            PropertyCategory::Apartment => "apartment",
            PropertyCategory::House => "house",
            PropertyCategory::Villa => "villa",
            PropertyCategory::Condo => "condo",
            PropertyCategory::Townhouse => "townhouse",
            PropertyCategory::Land => "land",
            PropertyCategory::Commercial => "commercial",
            PropertyCategory::Office => "office",
        }
    }
}

/// Moderation and market state of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Sold,
    Rented,
    Expired,
}

impl ListingStatus {
    pub const LABELS: &'static [&'static str] = &[
        "draft", "pending", "approved", "rejected", "sold", "rented", "expired",
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Sold => "sold",
            ListingStatus::Rented => "rented",
            ListingStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Sqft,
    Sqm,
}

impl AreaUnit {
    pub const LABELS: &'static [&'static str] = &["sqft", "sqm"];

    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::Sqft => "sqft",
            AreaUnit::Sqm => "sqm",
        }
    }
}

/// Physical characteristics of the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub area_unit: AreaUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub coordinates: GeoPoint,
}

/// Development project a unit belongs to, when sold off-plan or in a managed community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub developer: String,
}

/// Stored listing document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub listing_type: ListingType,
    pub category: PropertyCategory,
    pub status: ListingStatus,
    pub is_active: bool,
    #[serde(default)]
    pub featured: bool,
    pub specifications: Specifications,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub revision: u32,
}

/// Payload accepted when an owner publishes a new listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub listing_type: ListingType,
    pub category: PropertyCategory,
    pub specifications: Specifications,
    pub location: Location,
    #[serde(default)]
    pub project: Option<ProjectInfo>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub listing_type: Option<ListingType>,
    pub category: Option<PropertyCategory>,
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub specifications: Option<Specifications>,
    pub location: Option<Location>,
    pub project: Option<ProjectInfo>,
    pub amenities: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ListingUpdate {
    pub fn apply_to(self, listing: &mut Listing) {
        if let Some(title) = self.title {
            listing.title = title;
        }
        if let Some(description) = self.description {
            listing.description = description;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(listing_type) = self.listing_type {
            listing.listing_type = listing_type;
        }
        if let Some(category) = self.category {
            listing.category = category;
        }
        if let Some(is_active) = self.is_active {
            listing.is_active = is_active;
        }
        if let Some(featured) = self.featured {
            listing.featured = featured;
        }
        if let Some(specifications) = self.specifications {
            listing.specifications = specifications;
        }
        if let Some(location) = self.location {
            listing.location = location;
        }
        if let Some(project) = self.project {
            listing.project = Some(project);
        }
        if let Some(amenities) = self.amenities {
            listing.amenities = amenities;
        }
        if let Some(tags) = self.tags {
            listing.tags = tags;
        }
        if let Some(expires_at) = self.expires_at {
            listing.expires_at = Some(expires_at);
        }
    }
}

/// Reasons a listing document is refused before it reaches the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("price must be a positive amount")]
    Price,
    #[error("area must be a positive amount")]
    Area,
    #[error("coordinates ({lat}, {lng}) are out of range")]
    Coordinates { lat: f64, lng: f64 },
    #[error("year built {0} is outside the supported range")]
    YearBuilt(i32),
}

const EARLIEST_YEAR_BUILT: i32 = 1700;

impl Listing {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ListingValidationError> {
        require_text("owner_id", &self.owner_id)?;
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location.address", &self.location.address)?;
        require_text("location.city", &self.location.city)?;

        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(ListingValidationError::Price);
        }
        let area = self.specifications.area;
        if !(area.is_finite() && area > 0.0) {
            return Err(ListingValidationError::Area);
        }
        let point = self.location.coordinates;
        if !point.is_valid() {
            return Err(ListingValidationError::Coordinates {
                lat: point.lat,
                lng: point.lng,
            });
        }
        if let Some(year) = self.specifications.year_built {
            if year < EARLIEST_YEAR_BUILT || year > now.year() + 5 {
                return Err(ListingValidationError::YearBuilt(year));
            }
        }
        Ok(())
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ListingValidationError> {
    if value.trim().is_empty() {
        Err(ListingValidationError::Blank { field })
    } else {
        Ok(())
    }
}
