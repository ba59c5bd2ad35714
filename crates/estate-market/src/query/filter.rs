//! Translates generic `field=value` and `field[op]=value` parameters into predicates.
//!
//! Operators come from a closed table ([`FilterOperator`]); field names come from the
//! [`Field`] allow-list. Nothing the caller types is spliced into the predicate verbatim
//! except literal operand values, and text operands are regex-escaped unless the caller
//! explicitly asked for `[regex]` (which is compiled first to prove it is well-formed).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::RegexBuilder;

use super::predicate::{Comparison, FilterValue, Predicate};
use super::schema::{ensure_plain_name, Field, FieldKind};
use super::{DropReason, Fragments, QueryError, QueryParams, RESERVED_KEYS};

const MAX_PATTERN_LEN: usize = 256;
const PATTERN_SIZE_LIMIT: usize = 1 << 16;

/// Operator tokens accepted inside `field[...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Gte,
    Gt,
    Lte,
    Lt,
    Ne,
    In,
    Nin,
    Regex,
}

impl FilterOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gte" => Some(Self::Gte),
            "gt" => Some(Self::Gt),
            "lte" => Some(Self::Lte),
            "lt" => Some(Self::Lt),
            "ne" => Some(Self::Ne),
            "in" => Some(Self::In),
            "nin" => Some(Self::Nin),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }

    fn comparison(self) -> Option<Comparison> {
        match self {
            Self::Gte => Some(Comparison::Gte),
            Self::Gt => Some(Comparison::Gt),
            Self::Lte => Some(Comparison::Lte),
            Self::Lt => Some(Comparison::Lt),
            Self::Ne => Some(Comparison::Ne),
            Self::In | Self::Nin | Self::Regex => None,
        }
    }
}

/// Named one-sided bounds that expand to a range on a numeric field.
const RANGE_KEYS: [(&str, Field, Comparison); 12] = [
    ("minPrice", Field::Price, Comparison::Gte),
    ("min_price", Field::Price, Comparison::Gte),
    ("maxPrice", Field::Price, Comparison::Lte),
    ("max_price", Field::Price, Comparison::Lte),
    ("minArea", Field::Area, Comparison::Gte),
    ("min_area", Field::Area, Comparison::Gte),
    ("maxArea", Field::Area, Comparison::Lte),
    ("max_area", Field::Area, Comparison::Lte),
    ("minYear", Field::YearBuilt, Comparison::Gte),
    ("min_year", Field::YearBuilt, Comparison::Gte),
    ("maxYear", Field::YearBuilt, Comparison::Lte),
    ("max_year", Field::YearBuilt, Comparison::Lte),
];

pub(crate) fn translate(params: &QueryParams, fragments: &mut Fragments) -> Result<(), QueryError> {
    for (key, values) in params.iter() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }

        if let Some((_, field, cmp)) = RANGE_KEYS.iter().find(|(name, _, _)| *name == key) {
            range_bound(key, values, *field, *cmp, fragments);
            continue;
        }

        let (name, operator) = split_operator(key)?;
        let Some(field) = Field::lookup(name)? else {
            fragments.drop_fragment(key, DropReason::UnknownField);
            continue;
        };

        match operator {
            None => equality(key, field, values, fragments),
            Some(operator) => operator_clause(key, field, operator, values, fragments),
        }
    }
    Ok(())
}

fn split_operator(key: &str) -> Result<(&str, Option<FilterOperator>), QueryError> {
    let Some((name, rest)) = key.split_once('[') else {
        return Ok((key, None));
    };
    ensure_plain_name(name)?;

    let token = rest
        .strip_suffix(']')
        .filter(|token| !token.contains('[') && !token.contains(']'))
        .ok_or_else(|| QueryError::ForbiddenKey(key.to_string()))?;

    match FilterOperator::from_token(token) {
        Some(operator) => Ok((name, Some(operator))),
        None => {
            tracing::warn!(key, operator = token, "rejected unknown filter operator");
            Err(QueryError::UnknownOperator {
                key: name.to_string(),
                operator: token.to_string(),
            })
        }
    }
}

fn range_bound(
    key: &str,
    values: &[String],
    field: Field,
    cmp: Comparison,
    fragments: &mut Fragments,
) {
    let Some(raw) = first_value(values) else {
        fragments.drop_fragment(key, DropReason::EmptyValue);
        return;
    };
    match parse_number(raw) {
        Some(bound) => fragments.push(Predicate::compare(field, cmp, FilterValue::Number(bound))),
        None => fragments.drop_fragment(key, DropReason::MalformedNumber),
    }
}

fn equality(key: &str, field: Field, values: &[String], fragments: &mut Fragments) {
    let values: Vec<&str> = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    let Some(first) = values.first().copied() else {
        fragments.drop_fragment(key, DropReason::EmptyValue);
        return;
    };

    match field.kind() {
        FieldKind::Text => {
            let patterns: Option<Vec<Predicate>> = values
                .iter()
                .map(|value| substring_pattern(field, value))
                .collect();
            match patterns {
                None => fragments.drop_fragment(key, DropReason::TermTooLong),
                Some(mut patterns) if patterns.len() == 1 => fragments.push(patterns.remove(0)),
                Some(patterns) => fragments.push(Predicate::Or { clauses: patterns }),
            }
        }
        FieldKind::Number if values.len() == 1 => numeric_expression(key, field, first, fragments),
        FieldKind::Date if values.len() == 1 => date_equality(key, field, first, fragments),
        _ => match coerce_all(field, values.iter().copied()) {
            Ok(mut parsed) if parsed.len() == 1 => {
                fragments.push(Predicate::compare(field, Comparison::Eq, parsed.remove(0)));
            }
            Ok(parsed) => fragments.push(Predicate::In {
                field,
                values: parsed,
            }),
            Err(reason) => fragments.drop_fragment(key, reason),
        },
    }
}

/// `3` is equality, `3+` is a lower bound, `2-4` is an inclusive range.
fn numeric_expression(key: &str, field: Field, raw: &str, fragments: &mut Fragments) {
    if let Some(value) = parse_number(raw) {
        fragments.push(Predicate::compare(field, Comparison::Eq, FilterValue::Number(value)));
        return;
    }

    if let Some(min) = raw.strip_suffix('+').and_then(parse_number) {
        fragments.push(Predicate::compare(field, Comparison::Gte, FilterValue::Number(min)));
        return;
    }

    let bounds = raw
        .char_indices()
        .skip(1)
        .find(|(_, ch)| *ch == '-')
        .and_then(|(idx, _)| Some((parse_number(&raw[..idx])?, parse_number(&raw[idx + 1..])?)));

    match bounds {
        Some((min, max)) => {
            fragments.push(Predicate::compare(field, Comparison::Gte, FilterValue::Number(min)));
            fragments.push(Predicate::compare(field, Comparison::Lte, FilterValue::Number(max)));
        }
        None => fragments.drop_fragment(key, DropReason::MalformedNumber),
    }
}

/// A calendar day matches the whole day; a full timestamp matches exactly.
fn date_equality(key: &str, field: Field, raw: &str, fragments: &mut Fragments) {
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        fragments.push(Predicate::compare(field, Comparison::Gte, FilterValue::Date(start)));
        fragments.push(Predicate::compare(field, Comparison::Lt, FilterValue::Date(end)));
        return;
    }
    match parse_date(raw) {
        Some(at) => fragments.push(Predicate::compare(field, Comparison::Eq, FilterValue::Date(at))),
        None => fragments.drop_fragment(key, DropReason::MalformedDate),
    }
}

fn operator_clause(
    key: &str,
    field: Field,
    operator: FilterOperator,
    values: &[String],
    fragments: &mut Fragments,
) {
    let kind = field.kind();
    if kind == FieldKind::Geo {
        fragments.drop_fragment(key, DropReason::OperatorNotApplicable);
        return;
    }

    match operator {
        FilterOperator::Gte | FilterOperator::Gt | FilterOperator::Lte | FilterOperator::Lt
            if !matches!(kind, FieldKind::Number | FieldKind::Date) =>
        {
            fragments.drop_fragment(key, DropReason::OperatorNotApplicable);
        }
        FilterOperator::In | FilterOperator::Nin => {
            let items = values
                .iter()
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|item| !item.is_empty());
            match coerce_all(field, items) {
                Ok(parsed) if parsed.is_empty() => {
                    fragments.drop_fragment(key, DropReason::EmptyValue)
                }
                Ok(parsed) if operator == FilterOperator::In => fragments.push(Predicate::In {
                    field,
                    values: parsed,
                }),
                Ok(parsed) => fragments.push(Predicate::NotIn {
                    field,
                    values: parsed,
                }),
                Err(reason) => fragments.drop_fragment(key, reason),
            }
        }
        FilterOperator::Regex => {
            if kind != FieldKind::Text {
                fragments.drop_fragment(key, DropReason::OperatorNotApplicable);
                return;
            }
            match first_value(values) {
                None => fragments.drop_fragment(key, DropReason::EmptyValue),
                Some(pattern) if !is_usable_pattern(pattern) => {
                    fragments.drop_fragment(key, DropReason::InvalidPattern)
                }
                Some(pattern) => fragments.push(Predicate::Pattern {
                    field,
                    pattern: pattern.to_string(),
                    case_insensitive: true,
                }),
            }
        }
        FilterOperator::Gte
        | FilterOperator::Gt
        | FilterOperator::Lte
        | FilterOperator::Lt
        | FilterOperator::Ne => {
            let Some(cmp) = operator.comparison() else {
                return;
            };
            let Some(raw) = first_value(values) else {
                fragments.drop_fragment(key, DropReason::EmptyValue);
                return;
            };
            match coerce(field, raw) {
                Ok(value) => fragments.push(Predicate::compare(field, cmp, value)),
                Err(reason) => fragments.drop_fragment(key, reason),
            }
        }
    }
}

/// Escaped substring match, or `None` when the escaped term is too large to execute.
pub(crate) fn substring_pattern(field: Field, value: &str) -> Option<Predicate> {
    let pattern = regex::escape(value);
    is_usable_pattern(&pattern).then(|| Predicate::Pattern {
        field,
        pattern,
        case_insensitive: true,
    })
}

fn is_usable_pattern(pattern: &str) -> bool {
    pattern.len() <= MAX_PATTERN_LEN
        && RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .is_ok()
}

fn coerce_all<'a>(
    field: Field,
    raw: impl Iterator<Item = &'a str>,
) -> Result<Vec<FilterValue>, DropReason> {
    raw.map(|value| coerce(field, value)).collect()
}

fn coerce(field: Field, raw: &str) -> Result<FilterValue, DropReason> {
    match field.kind() {
        FieldKind::Number => parse_number(raw)
            .map(FilterValue::Number)
            .ok_or(DropReason::MalformedNumber),
        FieldKind::Enum(labels) => {
            let normalized = raw.trim().to_ascii_lowercase();
            labels
                .iter()
                .find(|label| **label == normalized)
                .map(|label| FilterValue::Text((*label).to_string()))
                .ok_or(DropReason::UnknownEnumValue)
        }
        FieldKind::Boolean => parse_bool(raw)
            .map(FilterValue::Bool)
            .ok_or(DropReason::MalformedBoolean),
        FieldKind::Date => parse_date(raw)
            .map(FilterValue::Date)
            .ok_or(DropReason::MalformedDate),
        FieldKind::Text => Ok(FilterValue::Text(raw.trim().to_string())),
        FieldKind::Geo => Err(DropReason::OperatorNotApplicable),
    }
}

fn first_value(values: &[String]) -> Option<&str> {
    values
        .iter()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc())
}
