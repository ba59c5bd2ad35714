use super::filter::substring_pattern;
use super::predicate::Predicate;
use super::schema::Field;
use super::{DropReason, Fragments, QueryParams, SEARCH, SEARCH_SHORT, TEXT};

/// Fields scanned by the substring search.
pub const SEARCH_FIELDS: [Field; 9] = [
    Field::Title,
    Field::Description,
    Field::Address,
    Field::City,
    Field::State,
    Field::ProjectName,
    Field::Developer,
    Field::Amenities,
    Field::Tags,
];

/// Adds the search predicates and reports whether a relevance score was requested.
pub(crate) fn apply(params: &QueryParams, fragments: &mut Fragments) -> bool {
    let substring = [SEARCH, SEARCH_SHORT]
        .iter()
        .filter_map(|key| params.get(key).map(|term| (*key, term.trim())))
        .find(|(_, term)| !term.is_empty());

    if let Some((key, term)) = substring {
        match substring_predicate(term) {
            Some(predicate) => fragments.push(predicate),
            None => fragments.drop_fragment(key, DropReason::TermTooLong),
        }
    }

    match params.get(TEXT).map(str::trim) {
        Some(query) if !query.is_empty() => {
            fragments.push(Predicate::Text {
                query: query.to_string(),
            });
            true
        }
        _ => false,
    }
}

/// OR of case-insensitive substring matches across [`SEARCH_FIELDS`].
pub fn substring_predicate(term: &str) -> Option<Predicate> {
    let clauses = SEARCH_FIELDS
        .iter()
        .map(|field| substring_pattern(*field, term))
        .collect::<Option<Vec<_>>>()?;
    Some(Predicate::Or { clauses })
}
