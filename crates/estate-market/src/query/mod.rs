//! Listing query pipeline.
//!
//! Raw query-string parameters pass through the filter translator, the search and geo-radius
//! stages, and finally sort/projection/pagination. The result is a [`ListingQuery`]: a typed
//! predicate tree plus directives that any [`crate::store::ListingStore`] can execute. Malformed
//! fragments are dropped and reported in [`ListingQuery::dropped`]; keys that look like operator
//! injection are refused with a [`QueryError`].

pub mod filter;
pub mod geo;
pub mod pagination;
pub mod params;
pub mod predicate;
pub mod projection;
pub mod schema;
pub mod search;
pub mod sort;

use serde::Serialize;

pub use pagination::{PageRequest, PaginationEnvelope};
pub use params::QueryParams;
pub use predicate::{Comparison, FilterValue, Predicate};
pub use projection::Projection;
pub use schema::{Field, FieldKind};
pub use sort::{SortDirection, SortKey, SortTarget};

use crate::store::FindSpec;

pub const PAGE: &str = "page";
pub const LIMIT: &str = "limit";
pub const SORT: &str = "sort";
pub const FIELDS: &str = "fields";
pub const SEARCH: &str = "search";
pub const SEARCH_SHORT: &str = "q";
pub const NEAR: &str = "near";
pub const RADIUS: &str = "radius";
pub const TEXT: &str = "text";

/// Keys consumed by dedicated stages and never treated as field filters.
pub const RESERVED_KEYS: [&str; 9] = [PAGE, SORT, LIMIT, FIELDS, SEARCH, SEARCH_SHORT, NEAR, RADIUS, TEXT];

/// Page-size bounds, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Client errors: the request is refused rather than partially executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query parameter `{0}` is not permitted")]
    ForbiddenKey(String),
    #[error("unknown filter operator `{operator}` on `{key}`")]
    UnknownOperator { key: String, operator: String },
    #[error("cannot sort by `{0}`")]
    InvalidSort(String),
    #[error("cannot select field `{0}`")]
    InvalidProjection(String),
    #[error("field selection cannot mix included and excluded fields")]
    MixedProjection,
}

/// Why a fragment was left out of the composed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    UnknownField,
    EmptyValue,
    MalformedNumber,
    MalformedBoolean,
    MalformedDate,
    UnknownEnumValue,
    InvalidPattern,
    TermTooLong,
    OperatorNotApplicable,
    InvalidGeo,
    InvalidPage,
    InvalidLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedFragment {
    pub key: String,
    pub reason: DropReason,
}

/// Accumulates predicate fragments while the stages run.
#[derive(Debug, Default)]
pub(crate) struct Fragments {
    clauses: Vec<Predicate>,
    dropped: Vec<DroppedFragment>,
}

impl Fragments {
    pub(crate) fn push(&mut self, clause: Predicate) {
        self.clauses.push(clause);
    }

    pub(crate) fn drop_fragment(&mut self, key: &str, reason: DropReason) {
        tracing::debug!(key, ?reason, "dropped query fragment");
        self.dropped.push(DroppedFragment {
            key: key.to_string(),
            reason,
        });
    }
}

/// Fully composed, executable listing query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingQuery {
    pub filter: Predicate,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: PageRequest,
    pub relevance: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedFragment>,
}

impl ListingQuery {
    pub fn from_params(params: &QueryParams, limits: &QueryLimits) -> Result<Self, QueryError> {
        let mut fragments = Fragments::default();

        filter::translate(params, &mut fragments)?;
        let relevance = search::apply(params, &mut fragments);
        geo::apply(params, &mut fragments);

        let sort = sort::parse(params.get(SORT), relevance)?;
        let projection = projection::parse(params.get(FIELDS))?;
        let page = PageRequest::from_params(params, limits, &mut fragments);

        Ok(Self {
            filter: Predicate::and(fragments.clauses),
            sort,
            projection,
            page,
            relevance,
            dropped: fragments.dropped,
        })
    }

    /// Data-query directives. The count query uses `self.filter` alone.
    pub fn find_spec(&self) -> FindSpec<'_> {
        FindSpec {
            filter: &self.filter,
            sort: &self.sort,
            skip: self.page.skip(),
            limit: self.page.limit,
        }
    }
}
