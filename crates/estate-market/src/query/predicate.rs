use chrono::{DateTime, Utc};
use serde::Serialize;

use super::schema::Field;
use crate::listings::domain::GeoPoint;

/// Typed operand carried by a predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Store-agnostic condition tree handed to a [`crate::store::ListingStore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    And {
        clauses: Vec<Predicate>,
    },
    Or {
        clauses: Vec<Predicate>,
    },
    Compare {
        field: Field,
        cmp: Comparison,
        value: FilterValue,
    },
    In {
        field: Field,
        values: Vec<FilterValue>,
    },
    NotIn {
        field: Field,
        values: Vec<FilterValue>,
    },
    Pattern {
        field: Field,
        pattern: String,
        case_insensitive: bool,
    },
    Text {
        query: String,
    },
    GeoWithin {
        field: Field,
        center: GeoPoint,
        radius_radians: f64,
    },
}

impl Predicate {
    /// Matches every record.
    pub fn all() -> Self {
        Predicate::And {
            clauses: Vec::new(),
        }
    }

    /// Conjunction that flattens nested `And` nodes and collapses single clauses.
    pub fn and(clauses: Vec<Predicate>) -> Self {
        let mut flat = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause {
                Predicate::And { clauses } => flat.extend(clauses),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::all(),
            1 => flat.remove(0),
            _ => Predicate::And { clauses: flat },
        }
    }

    pub fn compare(field: Field, cmp: Comparison, value: FilterValue) -> Self {
        Predicate::Compare { field, cmp, value }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::And { clauses } if clauses.is_empty())
    }

    /// First full-text query in the tree, if any.
    pub fn text_query(&self) -> Option<&str> {
        match self {
            Predicate::Text { query } => Some(query),
            Predicate::And { clauses } | Predicate::Or { clauses } => {
                clauses.iter().find_map(Predicate::text_query)
            }
            _ => None,
        }
    }
}
