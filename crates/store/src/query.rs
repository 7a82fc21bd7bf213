//! Query builder for the object store.
//!
//! A [`Query`] targets one class and holds field constraints, ordering,
//! paging and an optional field projection. Drivers may translate it into a
//! native query; [`Query::matches`] and [`Query::apply`] give the reference
//! semantics used by the in-memory driver.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// A condition on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op", content = "value")]
pub enum Constraint {
    /// Field equals the value.
    EqualTo(Value),
    /// Field is absent or differs from the value.
    NotEqualTo(Value),
    /// String field contains the substring, or array field contains the element.
    Contains(Value),
    /// Field equals one of the values.
    ContainedIn(Vec<Value>),
    /// Field is strictly greater.
    GreaterThan(Value),
    /// Field is strictly less.
    LessThan(Value),
    /// Field is present (`true`) or absent (`false`).
    Exists(bool),
}

impl Constraint {
    fn holds(&self, actual: Option<&Value>) -> bool {
        let present = actual.filter(|v| !v.is_null());
        match self {
            Self::EqualTo(expected) => present == Some(expected),
            Self::NotEqualTo(expected) => present != Some(expected),
            Self::Contains(needle) => match (present, needle) {
                (Some(Value::String(s)), Value::String(n)) => s.contains(n.as_str()),
                (Some(Value::Array(items)), n) => items.contains(n),
                _ => false,
            },
            Self::ContainedIn(options) => present.is_some_and(|v| options.contains(v)),
            Self::GreaterThan(bound) => {
                present.and_then(|v| compare_values(v, bound)) == Some(Ordering::Greater)
            }
            Self::LessThan(bound) => {
                present.and_then(|v| compare_values(v, bound)) == Some(Ordering::Less)
            }
            Self::Exists(expected) => present.is_some() == *expected,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Query against one class.
///
/// ```
/// use switchboard_store::Query;
///
/// let query = Query::new("Customer")
///     .equal_to("organizationId", "org-1")
///     .greater_than("tier", 1)
///     .descending("createdAt")
///     .limit(20);
/// assert_eq!(query.class_name(), "Customer");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    class_name: String,
    constraints: Vec<(String, Constraint)>,
    order: Vec<(String, SortDirection)>,
    limit: Option<usize>,
    skip: usize,
    select: Option<Vec<String>>,
}

impl Query {
    /// Query matching every record of a class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            constraints: Vec::new(),
            order: Vec::new(),
            limit: None,
            skip: 0,
            select: None,
        }
    }

    /// Target class.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Field constraints, in insertion order.
    pub fn constraints(&self) -> &[(String, Constraint)] {
        &self.constraints
    }

    /// Add a raw constraint.
    pub fn with_constraint(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.push((field.into(), constraint));
        self
    }

    /// `field == value`.
    pub fn equal_to(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_constraint(field, Constraint::EqualTo(value.into()))
    }

    /// `field != value`.
    pub fn not_equal_to(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_constraint(field, Constraint::NotEqualTo(value.into()))
    }

    /// Substring or element containment.
    pub fn contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_constraint(field, Constraint::Contains(value.into()))
    }

    /// `field` is one of `values`.
    pub fn contained_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with_constraint(field, Constraint::ContainedIn(values))
    }

    /// `field > value`.
    pub fn greater_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_constraint(field, Constraint::GreaterThan(value.into()))
    }

    /// `field < value`.
    pub fn less_than(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_constraint(field, Constraint::LessThan(value.into()))
    }

    /// `field` is present and not null.
    pub fn exists(self, field: impl Into<String>) -> Self {
        self.with_constraint(field, Constraint::Exists(true))
    }

    /// `field` is absent or null.
    pub fn does_not_exist(self, field: impl Into<String>) -> Self {
        self.with_constraint(field, Constraint::Exists(false))
    }

    /// Sort ascending by `field`, after any earlier sort keys.
    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), SortDirection::Ascending));
        self
    }

    /// Sort descending by `field`, after any earlier sort keys.
    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), SortDirection::Descending));
        self
    }

    /// Return at most `n` records.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first `n` matching records.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Return only these user-defined fields.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `record` satisfies every constraint.
    pub fn matches(&self, record: &Record) -> bool {
        record.class_name == self.class_name
            && self
                .constraints
                .iter()
                .all(|(field, constraint)| constraint.holds(record.get(field).as_ref()))
    }

    /// Filter, sort, page, and project `records`.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut matched: Vec<&Record> = records.into_iter().filter(|r| self.matches(r)).collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| self.compare(a, b));
        }

        matched
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|r| match &self.select {
                Some(keep) => r.clone().project(keep),
                None => r.clone(),
            })
            .collect()
    }

    /// Number of records `apply` would return before paging.
    pub fn count<'a, I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(|r| self.matches(r)).count()
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for (field, direction) in &self.order {
            let ordering = match (a.get(field), b.get(field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            };
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Order two JSON values of the same kind. Mixed kinds are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn customers() -> Vec<Record> {
        vec![
            Record::with_id("Customer", "c1")
                .with_field("name", "Ada")
                .with_field("tier", 3)
                .with_field("tags", json!(["vip", "eu"])),
            Record::with_id("Customer", "c2")
                .with_field("name", "Grace")
                .with_field("tier", 1),
            Record::with_id("Customer", "c3")
                .with_field("name", "Alan")
                .with_field("tier", 2)
                .with_field("archived", true),
            Record::with_id("Invoice", "i1").with_field("tier", 9),
        ]
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.object_id.as_deref()).collect()
    }

    #[rstest]
    #[case(Query::new("Customer"), vec!["c1", "c2", "c3"])]
    #[case(Query::new("Customer").equal_to("name", "Ada"), vec!["c1"])]
    #[case(Query::new("Customer").not_equal_to("name", "Ada"), vec!["c2", "c3"])]
    #[case(Query::new("Customer").contains("name", "A"), vec!["c1", "c3"])]
    #[case(Query::new("Customer").contains("tags", "vip"), vec!["c1"])]
    #[case(Query::new("Customer").contained_in("tier", [1, 2]), vec!["c2", "c3"])]
    #[case(Query::new("Customer").greater_than("tier", 1), vec!["c1", "c3"])]
    #[case(Query::new("Customer").less_than("tier", 3), vec!["c2", "c3"])]
    #[case(Query::new("Customer").exists("archived"), vec!["c3"])]
    #[case(Query::new("Customer").does_not_exist("archived"), vec!["c1", "c2"])]
    #[case(Query::new("Customer").equal_to("objectId", "c2"), vec!["c2"])]
    fn filters(#[case] query: Query, #[case] expected: Vec<&str>) {
        let records = customers();
        assert_eq!(ids(&query.apply(&records)), expected);
    }

    #[test]
    fn sorts_pages_and_projects() {
        let records = customers();
        let query = Query::new("Customer")
            .descending("tier")
            .skip(1)
            .limit(1)
            .select(["name"]);

        let result = query.apply(&records);
        assert_eq!(ids(&result), vec!["c3"]);
        assert_eq!(result[0].get("name"), Some(json!("Alan")));
        assert_eq!(result[0].get("tier"), None);
        assert_eq!(query.count(&records), 3);
    }

    #[test]
    fn missing_sort_keys_come_first() {
        let records = customers();
        let result = Query::new("Customer").ascending("archived").ascending("name").apply(&records);
        assert_eq!(ids(&result), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn mixed_kinds_are_unordered() {
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
        assert_eq!(compare_values(&json!(1.5), &json!(1)), Some(Ordering::Greater));
    }
}
