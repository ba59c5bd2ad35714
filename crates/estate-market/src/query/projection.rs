use serde::Serialize;
use serde_json::Value;

use super::schema::{ensure_plain_name, Field};
use super::QueryError;

/// Internal bookkeeping never returned unless explicitly part of the document contract.
pub const INTERNAL_KEYS: [&str; 1] = ["revision"];

/// Top-level listing keys a caller may select directly.
const DOCUMENT_KEYS: [&str; 20] = [
    "id",
    "owner_id",
    "title",
    "description",
    "price",
    "listing_type",
    "category",
    "status",
    "is_active",
    "featured",
    "specifications",
    "location",
    "project",
    "amenities",
    "tags",
    "views",
    "likes",
    "expires_at",
    "created_at",
    "updated_at",
];

const ALWAYS_INCLUDED: [&str; 2] = ["id", "score"];

/// Which document keys to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "keys", rename_all = "snake_case")]
pub enum Projection {
    Default,
    Include(Vec<&'static str>),
    Exclude(Vec<&'static str>),
}

impl Projection {
    /// Trim a serialized document down to the selected keys.
    pub fn apply(&self, document: Value) -> Value {
        let Value::Object(mut map) = document else {
            return document;
        };
        for key in INTERNAL_KEYS {
            map.remove(key);
        }
        match self {
            Projection::Default => {}
            Projection::Include(keys) => {
                map.retain(|key, _| {
                    is_always_included(key) || keys.iter().any(|k| *k == key.as_str())
                });
            }
            Projection::Exclude(keys) => {
                for key in keys {
                    if !is_always_included(key) {
                        map.remove(*key);
                    }
                }
            }
        }
        Value::Object(map)
    }
}

fn is_always_included(key: &str) -> bool {
    ALWAYS_INCLUDED.iter().any(|always| *always == key)
}

/// Parse `fields=title,price` or `fields=-description,-tags`.
pub fn parse(raw: Option<&str>) -> Result<Projection, QueryError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    for entry in raw.unwrap_or_default().split(',').map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let (excluded, name) = match entry.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, entry),
        };
        let key = resolve(name)?;
        let target = if excluded { &mut exclude } else { &mut include };
        if !target.contains(&key) {
            target.push(key);
        }
    }

    match (include.is_empty(), exclude.is_empty()) {
        (true, true) => Ok(Projection::Default),
        (false, true) => Ok(Projection::Include(include)),
        (true, false) => Ok(Projection::Exclude(exclude)),
        (false, false) => Err(QueryError::MixedProjection),
    }
}

fn resolve(name: &str) -> Result<&'static str, QueryError> {
    ensure_plain_name(name)?;
    if let Some(key) = DOCUMENT_KEYS.iter().find(|key| **key == name) {
        return Ok(*key);
    }
    match Field::lookup(name)? {
        Some(field) => Ok(field.document_key()),
        None => Err(QueryError::InvalidProjection(name.to_string())),
    }
}
