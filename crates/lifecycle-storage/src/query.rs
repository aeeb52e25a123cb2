//! Backend-neutral record queries.
//!
//! A [`RecordQuery`] is a filter predicate over record fields, an optional
//! sort key and an optional limit. Backends that cannot push predicates down
//! scan the collection and call [`RecordQuery::apply`].
//!
//! Sort comparison rules:
//! - numbers compare numerically
//! - RFC 3339 timestamp strings compare chronologically and sort before
//!   any other string
//! - other strings compare lexicographically
//! - a missing field sorts before any present value

use std::cmp::Ordering;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Predicate over the fields of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Matches every record
    All,
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field equals one of the values (empty set matches nothing)
    In { field: String, values: Vec<Value> },
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field` equals one of `values`; matches nothing when `values` is empty.
    pub fn any_of<V, I>(field: impl Into<String>, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (a, b) => Filter::Or(vec![a, b]),
        }
    }

    /// Evaluate against a JSON record.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => lookup(record, field) == Some(value),
            Filter::In { field, values } => match lookup(record, field) {
                Some(v) => values.contains(v),
                None => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "*"),
            Filter::Eq { field, value } => write!(f, "{} = {}", field, value),
            Filter::In { field, values } => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN [{}]", field, rendered.join(", "))
            }
            Filter::And(filters) => write_joined(f, filters, " AND "),
            Filter::Or(filters) => write_joined(f, filters, " OR "),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    filters: &[Filter],
    sep: &str,
) -> std::fmt::Result {
    let parts: Vec<String> = filters.iter().map(|x| x.to_string()).collect();
    write!(f, "({})", parts.join(sep))
}

/// Look up a possibly dotted field path (`a.b.c`).
fn lookup<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(record, |current, part| current.get(part))
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Field to order query results by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

/// A filter, optional sort and optional limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub filter: Filter,
    pub sort: Option<SortKey>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// Unsorted, unlimited query over `filter`.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            limit: None,
        }
    }

    /// Every record of the type, in backend order.
    pub fn all() -> Self {
        Self::new(Filter::All)
    }

    /// Sort results by `field`.
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    /// Keep at most `limit` results, applied after sorting.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter, sort and truncate a scanned collection.
    ///
    /// Sorting is stable, so records that compare equal keep backend order.
    pub fn apply<I>(&self, records: I) -> Vec<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let matching = records.into_iter().filter(|r| self.filter.matches(r));

        let Some(sort) = &self.sort else {
            return match self.limit {
                Some(limit) => matching.take(limit).collect(),
                None => matching.collect(),
            };
        };

        let mut results: Vec<Value> = matching.collect();
        results.sort_by(|a, b| {
            let ord = compare_values(lookup(a, &sort.field), lookup(b, &sort.field));
            match sort.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

impl std::fmt::Display for RecordQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filter)?;
        if let Some(sort) = &self.sort {
            let dir = match sort.order {
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            };
            write!(f, " ORDER BY {} {}", sort.field, dir)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            // Timestamps and plain text are ranked apart to keep the order total
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a)
            .cmp(&type_rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
