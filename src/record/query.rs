//! # List Queries
//!
//! Filter expressions over stored record documents, and the parsing of
//! `GET /<collection>` query strings into them.
//!
//! Query parameters:
//! - `page`: 1-based page number (default 1)
//! - `limit`: page size (default and maximum from `RecordSettings`)
//! - `dynamic.<name>[.<sub>]`: loose match against a dynamic field value
//! - anything else is handed to the attribute set's own filter table

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use super::errors::{RecordError, RecordResult};
use super::model::RecordAttributes;
use super::service::RecordSettings;
use crate::schema::parse_date;

/// Query-string prefix selecting a dynamic field filter
pub const DYNAMIC_PREFIX: &str = "dynamic.";

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Structural equality
    Eq,
    /// Case-insensitive substring of a string value
    Contains,
    /// Greater than or equal (numbers, or dates when both sides parse)
    Gte,
    /// Less than or equal (numbers, or dates when both sides parse)
    Lte,
    /// Equal to the filter string, or a number/bool rendering to it
    Loose,
}

/// A filter on one document path
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Path segments from the document root
    pub path: Vec<String>,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new<I, S>(path: I, operator: FilterOperator, value: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            operator,
            value,
        }
    }

    /// Create an equality filter on a top-level attribute
    pub fn eq(field: &str, value: Value) -> Self {
        Self::new([field], FilterOperator::Eq, value)
    }

    /// Create a case-insensitive substring filter
    pub fn contains(field: &str, needle: &str) -> Self {
        Self::new([field], FilterOperator::Contains, Value::String(needle.to_lowercase()))
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::new([field], FilterOperator::Gte, value)
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::new([field], FilterOperator::Lte, value)
    }

    /// Create a loose filter on a dynamic field (`dynamicFields.<path>`)
    pub fn dynamic(field_path: &str, value: &str) -> Self {
        let path = std::iter::once("dynamicFields").chain(field_path.split('.'));
        Self::new(path, FilterOperator::Loose, Value::String(value.to_string()))
    }

    fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.path.iter().try_fold(doc, |current, segment| current.get(segment))
    }

    /// Check if a document matches this filter
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match self.resolve(doc) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match self.operator {
            FilterOperator::Eq => field_value == &self.value,
            FilterOperator::Contains => match (field_value.as_str(), self.value.as_str()) {
                (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(needle),
                _ => false,
            },
            FilterOperator::Gte => {
                matches!(compare_json_values(field_value, &self.value), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOperator::Lte => {
                matches!(compare_json_values(field_value, &self.value), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOperator::Loose => match self.value.as_str() {
                Some(wanted) => loose_eq(field_value, wanted),
                None => field_value == &self.value,
            },
        }
    }
}

/// Compare two JSON values for ordering; `None` when not comparable
fn compare_json_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => match (parse_date(a), parse_date(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        _ => None,
    }
}

fn loose_eq(stored: &Value, wanted: &str) -> bool {
    match stored {
        Value::String(s) => s == wanted,
        Value::Number(_) | Value::Bool(_) => stored.to_string() == wanted,
        _ => false,
    }
}

/// A set of filters combined with AND logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check if a document matches all filters
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }
}

/// Parsed list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
    pub filters: FilterSet,
}

impl ListQuery {
    /// First page with the default limit and no filters
    pub fn first_page(settings: &RecordSettings) -> Self {
        Self {
            page: 1,
            limit: settings.default_limit,
            filters: FilterSet::new(),
        }
    }

    /// Parse query-string parameters for attribute set `A`
    pub fn parse<A: RecordAttributes>(
        params: &HashMap<String, String>,
        settings: &RecordSettings,
    ) -> RecordResult<Self> {
        let mut query = Self::first_page(settings);

        // Sorted keys keep the filter order independent of hash order.
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for key in keys {
            let value = &params[key];
            match key.as_str() {
                "page" => query.page = parse_positive("page", value)?,
                "limit" => {
                    let limit = parse_positive("limit", value)?;
                    if limit > settings.max_limit {
                        return Err(RecordError::LimitExceeded(limit, settings.max_limit));
                    }
                    query.limit = limit;
                }
                _ => {
                    if let Some(field) = key.strip_prefix(DYNAMIC_PREFIX) {
                        if field.is_empty() || field.split('.').any(str::is_empty) {
                            return Err(RecordError::InvalidQuery(key.clone()));
                        }
                        query.filters.filters.push(FilterExpr::dynamic(field, value));
                    } else if let Some(filter) = A::filter(key, value)? {
                        query.filters.filters.push(filter);
                    } else {
                        tracing::debug!(collection = A::COLLECTION, param = %key, "ignoring unknown query parameter");
                    }
                }
            }
        }

        Ok(query)
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(name: &str, value: &str) -> RecordResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(RecordError::InvalidQuery(format!(
            "{} must be a positive integer, got '{}'",
            name, value
        ))),
    }
}

/// One page of list results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    /// Matching records across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}
