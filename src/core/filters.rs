use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::repository::Entity;
use crate::models::PageSize;

/// A value bound into a dynamically built statement.
///
/// `Null` doubles as the explicit "is absent" marker in filter sets and as a
/// literal NULL in writes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    UuidArray(Vec<Uuid>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
    Null,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<Vec<Uuid>> for FieldValue {
    fn from(value: Vec<Uuid>) -> Self {
        FieldValue::UuidArray(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Json(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => FieldValue::Null,
        }
    }
}

/// Ordered field-name to value mapping for equality / IS NULL predicates.
///
/// Field names that the target entity's registry does not know are silently
/// ignored when the predicate is built (forward-compatibility policy).
#[derive(Debug, Clone, Default)]
pub struct FilterSet(Vec<(String, FieldValue)>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.0.push((field.into(), value.into()));
        self
    }

    /// Marks a field as explicitly absent (`IS NULL` when the page request
    /// opts into nullable filtering).
    pub fn insert_absent(&mut self, field: impl Into<String>) -> &mut Self {
        self.0.push((field.into(), FieldValue::Null));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Named values for an insert or update.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet(Vec<(String, FieldValue)>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.push((field.into(), value.into()));
        self
    }

    /// Drops the named fields, e.g. to keep service-owned columns out of a
    /// caller-supplied profile update.
    pub fn without(mut self, fields: &[&str]) -> Self {
        self.0.retain(|(name, _)| !fields.contains(&name.as_str()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Case-insensitive substring search over a set of fields.
#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub text: String,
    pub fields: Vec<String>,
}

impl SearchSpec {
    pub fn new(text: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            text: text.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Parameters for a search-and-paginate operation.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: PageSize,
    pub search: Option<SearchSpec>,
    pub filters: FilterSet,
    /// When set, an absent filter value becomes `field IS NULL`; otherwise
    /// absent values are dropped from the predicate.
    pub include_nullable: bool,
    /// Trusted SQL fragment AND-ed in as the first predicate. Never built
    /// from user input.
    pub base_predicate: Option<String>,
    /// Trusted ORDER BY clause (without the keywords). Rows come back in
    /// natural order when unset.
    pub order_by: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::All,
            search: None,
            filters: FilterSet::new(),
            include_nullable: true,
            base_predicate: None,
            order_by: None,
        }
    }
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn search(mut self, text: impl Into<String>, fields: &[&str]) -> Self {
        self.search = Some(SearchSpec::new(text, fields));
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.insert(field, value);
        self
    }

    pub fn filter_absent(mut self, field: impl Into<String>) -> Self {
        self.filters.insert_absent(field);
        self
    }

    pub fn filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn include_nullable(mut self, include: bool) -> Self {
        self.include_nullable = include;
        self
    }

    pub fn base_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.base_predicate = Some(predicate.into());
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }
}

/// Binds a field value into the statement under construction.
pub(crate) fn push_bind_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FieldValue::Int(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Bool(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Uuid(v) => {
            qb.push_bind(*v);
        }
        FieldValue::UuidArray(v) => {
            qb.push_bind(v.clone());
        }
        FieldValue::Timestamp(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Date(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Json(v) => {
            qb.push_bind(v.clone());
        }
        FieldValue::Null => {
            qb.push("NULL");
        }
    }
}

fn push_joint(qb: &mut QueryBuilder<'_, Postgres>, started: &mut bool) {
    if *started {
        qb.push(" AND ");
    } else {
        qb.push(" WHERE ");
        *started = true;
    }
}

/// Appends the WHERE clause for a page request to a statement ending in
/// `FROM <table>`.
///
/// Order: base predicate, then the OR-group of search conditions, then the
/// AND-group of filters. Only field names present in `E`'s registry ever
/// reach the SQL text; everything else is skipped, which is both the
/// unknown-field policy and the gate that keeps arbitrary identifiers out of
/// the statement.
pub(crate) fn push_predicates<E: Entity>(qb: &mut QueryBuilder<'_, Postgres>, request: &PageRequest) {
    let mut started = false;

    if let Some(base) = &request.base_predicate {
        push_joint(qb, &mut started);
        qb.push("(").push(base.as_str()).push(")");
    }

    if let Some(search) = &request.search {
        let text = search.text.trim();
        let fields: Vec<&str> = search
            .fields
            .iter()
            .map(String::as_str)
            .filter(|field| E::has_field(field))
            .collect();

        if !text.is_empty() && !fields.is_empty() {
            let needle = format!("%{}%", text.to_lowercase());
            push_joint(qb, &mut started);
            qb.push("(");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("LOWER(").push(*field).push(") LIKE ");
                qb.push_bind(needle.clone());
            }
            qb.push(")");
        }
    }

    for (field, value) in request.filters.iter() {
        if !E::has_field(field) {
            continue;
        }
        match value {
            FieldValue::Null if request.include_nullable => {
                push_joint(qb, &mut started);
                qb.push(field.as_str()).push(" IS NULL");
            }
            FieldValue::Null => {}
            concrete => {
                push_joint(qb, &mut started);
                qb.push(field.as_str()).push(" = ");
                push_bind_value(qb, concrete);
            }
        }
    }
}
