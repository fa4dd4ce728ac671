//! Post-query filter, sort and limit

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One or more sort fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKeys {
    Single(String),
    Multiple(Vec<String>),
}

impl SortKeys {
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Single(key) => vec![key.as_str()],
            Self::Multiple(keys) => keys.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for SortKeys {
    fn from(key: &str) -> Self {
        Self::Single(key.to_string())
    }
}

impl From<Vec<String>> for SortKeys {
    fn from(keys: Vec<String>) -> Self {
        Self::Multiple(keys)
    }
}

/// Options applied to the array part of a query result
///
/// `filter` maps a (dotted) field path to an expected value, or to a list of
/// acceptable values; every entry must match. `sort` orders ascending by the
/// given fields. `limit` keeps the first N results; `0` means no limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKeys>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, field: impl Into<String>, expected: impl Into<Value>) -> Self {
        self.filter
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), expected.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<SortKeys>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// No filter, sort or limit requested
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.sort.is_none() && self.limit.is_none()
    }

    /// Filter, then sort, then limit
    pub fn apply(&self, mut items: Vec<Value>) -> Vec<Value> {
        if let Some(filter) = &self.filter {
            items.retain(|item| matches_filter(item, filter));
        }

        if let Some(sort) = &self.sort {
            let keys = sort.keys();
            items.sort_by(|a, b| {
                keys.iter()
                    .map(|key| compare_fields(lookup_field(a, key), lookup_field(b, key)))
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            items.truncate(limit);
        }

        items
    }
}

/// Follow a dotted field path into `value`
pub fn lookup_field<'v>(value: &'v Value, field: &str) -> Option<&'v Value> {
    field.split('.').try_fold(value, |current, part| match current {
        Value::Object(obj) => obj.get(part),
        Value::Array(arr) => part.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    })
}

fn matches_filter(item: &Value, filter: &BTreeMap<String, Value>) -> bool {
    filter.iter().all(|(field, expected)| {
        let Some(actual) = lookup_field(item, field) else {
            return false;
        };
        match expected {
            Value::Array(options) => options.iter().any(|option| values_match(actual, option)),
            single => values_match(actual, single),
        }
    })
}

/// Exact equality, or equal text for scalars (template arguments are strings)
fn values_match(actual: &Value, expected: &Value) -> bool {
    actual == expected
        || matches!((scalar_text(actual), scalar_text(expected)), (Some(a), Some(b)) if a == b)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ascending order; missing fields sort last
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => type_rank(a).cmp(&type_rank(b)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn services() -> Vec<Value> {
        vec![
            json!({ "name": "orders", "tier": 2, "team": { "name": "retail" } }),
            json!({ "name": "billing", "tier": 1, "team": { "name": "finance" } }),
            json!({ "name": "audit", "tier": 2, "team": { "name": "finance" } }),
            json!({ "tier": 3 }),
        ]
    }

    #[test]
    fn test_sort_single_key_missing_last() {
        let sorted = QueryOptions::new().with_sort("name").apply(services());
        let names: Vec<&Value> = sorted.iter().map(|s| &s["name"]).collect();
        assert_eq!(names, vec![&json!("audit"), &json!("billing"), &json!("orders"), &Value::Null]);
    }

    #[test]
    fn test_sort_multiple_keys_is_stable() {
        let sort = SortKeys::from(vec!["tier".to_string(), "team.name".to_string()]);
        let sorted = QueryOptions::new().with_sort(sort).apply(services());
        let names: Vec<&Value> = sorted.iter().map(|s| &s["name"]).collect();
        assert_eq!(names, vec![&json!("billing"), &json!("audit"), &json!("orders"), &Value::Null]);
    }

    #[test]
    fn test_filter_by_nested_field_and_value_list() {
        let finance = QueryOptions::new().with_filter("team.name", "finance").apply(services());
        assert_eq!(finance.len(), 2);

        let tiers = QueryOptions::new()
            .with_filter("tier", json!(["1", 3]))
            .apply(services());
        assert_eq!(tiers.len(), 2);

        let conjunction = QueryOptions::new()
            .with_filter("team.name", "finance")
            .with_filter("tier", 2)
            .apply(services());
        assert_eq!(conjunction, vec![services()[2].clone()]);
    }

    #[test]
    fn test_limit_applies_after_filter_and_sort() {
        let limited = QueryOptions::new()
            .with_filter("tier", 2)
            .with_sort("name")
            .with_limit(1)
            .apply(services());
        assert_eq!(limited, vec![services()[2].clone()]);

        assert_eq!(QueryOptions::new().with_limit(0).apply(services()).len(), 4);
    }

    #[test]
    fn test_options_deserialize_from_template_arguments() {
        let options: QueryOptions =
            serde_json::from_value(json!({ "sort": ["tier", "name"], "limit": 2 })).unwrap();
        assert_eq!(options.sort, Some(SortKeys::Multiple(vec!["tier".into(), "name".into()])));
        assert_eq!(options.limit, Some(2));
        assert!(options.filter.is_none());

        let single: QueryOptions = serde_json::from_value(json!({ "sort": "name" })).unwrap();
        assert_eq!(single.sort, Some(SortKeys::Single("name".into())));
        assert!(QueryOptions::default().is_empty());
    }
}
