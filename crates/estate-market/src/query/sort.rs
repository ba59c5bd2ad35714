use std::fmt;

use serde::{Serialize, Serializer};

use super::schema::Field;
use super::QueryError;

pub const RELEVANCE_KEY: &str = "score";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTarget {
    Field(Field),
    Relevance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub target: SortTarget,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn desc(target: SortTarget) -> Self {
        Self {
            target,
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(target: SortTarget) -> Self {
        Self {
            target,
            direction: SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Desc {
            f.write_str("-")?;
        }
        match self.target {
            SortTarget::Field(field) => f.write_str(field.path()),
            SortTarget::Relevance => f.write_str(RELEVANCE_KEY),
        }
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Newest first, or best match first when a relevance score exists.
pub fn default_sort(relevance: bool) -> Vec<SortKey> {
    if relevance {
        vec![SortKey::desc(SortTarget::Relevance)]
    } else {
        vec![SortKey::desc(SortTarget::Field(Field::CreatedAt))]
    }
}

/// Parse `sort=-price,title`. Unknown names are refused rather than forwarded.
pub fn parse(raw: Option<&str>, relevance: bool) -> Result<Vec<SortKey>, QueryError> {
    let mut keys: Vec<SortKey> = Vec::new();

    for entry in raw.unwrap_or_default().split(',').map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let (direction, name) = match entry.strip_prefix('-') {
            Some(name) => (SortDirection::Desc, name),
            None => (SortDirection::Asc, entry.strip_prefix('+').unwrap_or(entry)),
        };

        let target = if name == RELEVANCE_KEY {
            if !relevance {
                return Err(QueryError::InvalidSort(name.to_string()));
            }
            SortTarget::Relevance
        } else {
            match Field::lookup(name)? {
                Some(field) if field.sortable() => SortTarget::Field(field),
                _ => return Err(QueryError::InvalidSort(name.to_string())),
            }
        };

        if keys.iter().all(|key| key.target != target) {
            keys.push(SortKey { target, direction });
        }
    }

    if keys.is_empty() {
        Ok(default_sort(relevance))
    } else {
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_newest_first() {
        assert_eq!(
            parse(None, false).unwrap(),
            vec![SortKey::desc(SortTarget::Field(Field::CreatedAt))]
        );
        assert_eq!(parse(Some(" , "), false).unwrap(), default_sort(false));
    }

    #[test]
    fn defaults_to_relevance_for_text_search() {
        assert_eq!(
            parse(None, true).unwrap(),
            vec![SortKey::desc(SortTarget::Relevance)]
        );
    }

    #[test]
    fn parses_directions_and_aliases() {
        let keys = parse(Some("-price, bedrooms,+createdAt,-price"), false).unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey::desc(SortTarget::Field(Field::Price)),
                SortKey::asc(SortTarget::Field(Field::Bedrooms)),
                SortKey::asc(SortTarget::Field(Field::CreatedAt)),
            ]
        );
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["-price", "specifications.bedrooms", "created_at"]);
    }

    #[test]
    fn rejects_unknown_unsortable_and_injected_names() {
        assert_eq!(
            parse(Some("password"), false),
            Err(QueryError::InvalidSort("password".to_string()))
        );
        assert_eq!(
            parse(Some("tags"), false),
            Err(QueryError::InvalidSort("tags".to_string()))
        );
        assert_eq!(
            parse(Some("score"), false),
            Err(QueryError::InvalidSort("score".to_string()))
        );
        assert_eq!(
            parse(Some("-$natural"), false),
            Err(QueryError::ForbiddenKey("$natural".to_string()))
        );
    }

    #[test]
    fn relevance_can_be_combined_with_fields() {
        let keys = parse(Some("-score,price"), true).unwrap();
        assert_eq!(
            keys,
            vec![
                SortKey::desc(SortTarget::Relevance),
                SortKey::asc(SortTarget::Field(Field::Price)),
            ]
        );
    }
}
