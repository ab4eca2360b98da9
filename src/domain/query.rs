//! List queries: filtering, searching, ordering and pagination.
//!
//! Each resource declares a [`QuerySchema`] with allow-lists for the fields
//! that may be filtered, searched and ordered on. A [`ListQuery`] built from
//! raw query-string parameters keeps only allow-listed fields; anything else is
//! silently dropped. The same query is evaluated in memory by
//! [`ListQuery::apply`] and in SQL by
//! [`crate::infrastructure::persistence::sql`].

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Query-string keys with a reserved meaning.
pub const SEARCH_PARAM: &str = "search";
pub const ORDERING_PARAM: &str = "ordering";
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Timestamp,
}

/// A queryable field: its public name, the SQL expression backing it and its type.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }

    /// Parses a raw query-string value for this field.
    pub fn parse(&self, raw: &str) -> Option<FieldValue> {
        match self.kind {
            FieldKind::Integer => raw.trim().parse().ok().map(FieldValue::Integer),
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|dt| FieldValue::Timestamp(dt.with_timezone(&Utc))),
        }
    }
}

/// Per-resource declaration of what a list query may touch.
#[derive(Debug)]
pub struct QuerySchema {
    /// SQL expression of the primary key; used as the final tie-breaker.
    pub id_column: &'static str,
    pub fields: &'static [FieldSpec],
    pub filter_fields: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub ordering_fields: &'static [&'static str],
    /// Ordering applied when the request names no valid ordering field.
    pub default_ordering: &'static [&'static str],
}

impl QuerySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn allowed(&self, list: &[&str], name: &str) -> Option<&'static FieldSpec> {
        if list.contains(&name) {
            self.field(name)
        } else {
            None
        }
    }
}

/// A typed field value, used for both filter operands and record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => text_order(a, b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Case-insensitive text order with a byte-wise tie-break, matching the
/// `lower(column), column` ordering emitted for SQL.
pub fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Exact-match filter. A record matches when its field equals any of
/// `values`; an empty `values` list matches nothing.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: &'static FieldSpec,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderField {
    pub field: &'static FieldSpec,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// # Errors
    ///
    /// Returns a validation error if `number` is zero or `size` is outside `1..=1000`.
    pub fn new(number: u32, size: u32) -> Result<Self, AppError> {
        if number == 0 {
            return Err(AppError::bad_request("Page must be greater than 0"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::bad_request(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { number, size })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// Records that a [`ListQuery`] can be evaluated against in memory.
pub trait Queryable {
    fn id(&self) -> i64;
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// A sanitized list request for one resource.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub schema: &'static QuerySchema,
    pub filters: Vec<Filter>,
    pub search_terms: Vec<String>,
    pub ordering: Vec<OrderField>,
    pub page: Option<Page>,
}

impl ListQuery {
    /// An unfiltered query using the schema's default ordering.
    pub fn new(schema: &'static QuerySchema) -> Self {
        let mut query = Self {
            schema,
            filters: Vec::new(),
            search_terms: Vec::new(),
            ordering: Vec::new(),
            page: None,
        };
        query.apply_default_ordering();
        query
    }

    /// Builds a query from raw query-string parameters.
    ///
    /// `search`, `ordering`, `page` and `page_size` are reserved; every other
    /// key is a filter candidate. Keys outside the allow-lists are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed pagination parameters.
    pub fn from_params(
        schema: &'static QuerySchema,
        params: &HashMap<String, String>,
    ) -> Result<Self, AppError> {
        let mut query = Self::new(schema);

        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        for key in keys {
            let value = &params[key];
            match key.as_str() {
                SEARCH_PARAM => query = query.search(value),
                ORDERING_PARAM => query = query.order_by(value),
                PAGE_PARAM | PAGE_SIZE_PARAM => {}
                _ => query = query.filter(key, value),
            }
        }

        let page = parse_page_param(params, PAGE_PARAM)?;
        let page_size = parse_page_param(params, PAGE_SIZE_PARAM)?;
        if page.is_some() || page_size.is_some() {
            query.page = Some(Page::new(
                page.unwrap_or(1),
                page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            )?);
        }

        Ok(query)
    }

    /// Adds an exact-match filter if `field` is filterable.
    pub fn filter(mut self, field: &str, raw: &str) -> Self {
        if let Some(spec) = self.schema.allowed(self.schema.filter_fields, field) {
            self.filters.push(Filter {
                field: spec,
                values: spec.parse(raw).into_iter().collect(),
            });
        }
        self
    }

    /// Adds a membership filter (`field IN values`) if `field` is filterable.
    pub fn filter_any(mut self, field: &str, values: Vec<FieldValue>) -> Self {
        if let Some(spec) = self.schema.allowed(self.schema.filter_fields, field) {
            self.filters.push(Filter {
                field: spec,
                values,
            });
        }
        self
    }

    /// Sets the search term. Terms are split on whitespace and commas and
    /// each must match at least one searchable field.
    pub fn search(mut self, term: &str) -> Self {
        self.search_terms = term
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    /// Sets ordering from a comma-separated list such as `-publication_year,title`.
    pub fn order_by(mut self, raw: &str) -> Self {
        let ordering: Vec<OrderField> = raw
            .split(',')
            .map(str::trim)
            .filter_map(|term| {
                let (name, descending) = match term.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (term, false),
                };
                self.schema
                    .allowed(self.schema.ordering_fields, name)
                    .map(|field| OrderField { field, descending })
            })
            .collect();

        if ordering.is_empty() {
            self.apply_default_ordering();
        } else {
            self.ordering = ordering;
        }
        self
    }

    pub fn paginate(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// True when the query narrows results by search terms.
    pub fn has_search(&self) -> bool {
        !self.search_terms.is_empty() && !self.schema.search_fields.is_empty()
    }

    pub fn search_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        let schema = self.schema;
        schema
            .search_fields
            .iter()
            .filter_map(move |name| schema.field(name))
    }

    /// True when some filter can never match, so the result is known to be empty.
    pub fn matches_nothing(&self) -> bool {
        self.filters.iter().any(|f| f.values.is_empty())
    }

    /// Evaluates the query against in-memory records.
    pub fn apply<E: Queryable>(&self, items: Vec<E>) -> Vec<E> {
        let mut matched: Vec<E> = items
            .into_iter()
            .filter(|item| self.matches_filters(item) && self.matches_search(item))
            .collect();

        matched.sort_by(|a, b| self.compare(a, b));

        match self.page {
            Some(page) => matched
                .into_iter()
                .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
                .take(page.size as usize)
                .collect(),
            None => matched,
        }
    }

    fn matches_filters<E: Queryable>(&self, item: &E) -> bool {
        self.filters.iter().all(|filter| {
            item.field(filter.field.name)
                .is_some_and(|value| filter.values.contains(&value))
        })
    }

    fn matches_search<E: Queryable>(&self, item: &E) -> bool {
        if !self.has_search() {
            return true;
        }
        let haystacks: Vec<String> = self
            .search_fields()
            .filter_map(|f| item.field(f.name))
            .filter_map(|v| v.as_text().map(str::to_lowercase))
            .collect();

        self.search_terms.iter().all(|term| {
            let needle = term.to_lowercase();
            haystacks.iter().any(|h| h.contains(&needle))
        })
    }

    fn compare<E: Queryable>(&self, a: &E, b: &E) -> Ordering {
        for order in &self.ordering {
            let ordering = match (a.field(order.field.name), b.field(order.field.name)) {
                (Some(x), Some(y)) => x.compare(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = if order.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id().cmp(&b.id())
    }

    fn apply_default_ordering(&mut self) {
        let schema = self.schema;
        self.ordering = schema
            .default_ordering
            .iter()
            .filter_map(|term| {
                let (name, descending) = match term.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (*term, false),
                };
                schema
                    .field(name)
                    .map(|field| OrderField { field, descending })
            })
            .collect();
    }
}

fn parse_page_param(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, AppError> {
    params
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| AppError::bad_request(format!("{key} must be a positive integer")))
        })
        .transpose()
}
