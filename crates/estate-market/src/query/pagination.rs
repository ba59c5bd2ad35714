use serde::Serialize;

use super::filter::parse_number;
use super::{DropReason, Fragments, QueryLimits, QueryParams, LIMIT, PAGE};

/// 1-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: u64, limit: u64, limits: &QueryLimits) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, limits.max_page_size.max(1)),
        }
    }

    pub(crate) fn from_params(
        params: &QueryParams,
        limits: &QueryLimits,
        fragments: &mut Fragments,
    ) -> Self {
        let page = match params.get(PAGE).map(parse_count) {
            None => 1,
            Some(Some(page)) => page,
            Some(None) => {
                fragments.drop_fragment(PAGE, DropReason::InvalidPage);
                1
            }
        };
        let limit = match params.get(LIMIT).map(parse_count) {
            None => limits.default_page_size,
            Some(Some(limit)) => limit,
            Some(None) => {
                fragments.drop_fragment(LIMIT, DropReason::InvalidLimit);
                limits.default_page_size
            }
        };
        Self::new(page, limit, limits)
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Positive whole numbers only; `2.0` is accepted, `2.5`, `0` and `-1` are not.
fn parse_count(raw: &str) -> Option<u64> {
    let value = parse_number(raw)?;
    (value >= 1.0 && value.fract() == 0.0 && value <= u64::MAX as f64).then_some(value as u64)
}

/// Page metadata returned alongside results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationEnvelope {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationEnvelope {
    /// `total` must come from a count over the unpaginated filter.
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = if request.limit == 0 {
            0
        } else {
            total.div_ceil(request.limit)
        };
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages,
            has_next: request.page < pages,
            has_prev: request.page > 1,
        }
    }
}
