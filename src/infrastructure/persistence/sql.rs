//! Translation of [`ListQuery`] into SQL clauses.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::query::{FieldKind, FieldValue, ListQuery};

/// Appends `WHERE`, `ORDER BY` and `LIMIT/OFFSET` for `query` to a `SELECT`.
///
/// Column names come from the static schema; every user-supplied value is bound.
pub fn push_list_clauses(builder: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    builder.push(" WHERE TRUE");

    for filter in &query.filters {
        if filter.values.is_empty() {
            builder.push(" AND FALSE");
            continue;
        }
        builder.push(" AND ").push(filter.field.column).push(" IN (");
        let mut separated = builder.separated(", ");
        for value in &filter.values {
            match value {
                FieldValue::Integer(v) => separated.push_bind(*v),
                FieldValue::Text(v) => separated.push_bind(v.clone()),
                FieldValue::Timestamp(v) => separated.push_bind(*v),
            };
        }
        separated.push_unseparated(")");
    }

    if query.has_search() {
        for term in &query.search_terms {
            let pattern = format!("%{}%", escape_like(term));
            builder.push(" AND (");
            for (i, field) in query.search_fields().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                match field.kind {
                    FieldKind::Text => builder.push(field.column),
                    _ => builder.push(field.column).push("::text"),
                };
                builder.push(" ILIKE ").push_bind(pattern.clone());
            }
            builder.push(")");
        }
    }

    builder.push(" ORDER BY ");
    for order in &query.ordering {
        let direction = if order.descending { " DESC, " } else { " ASC, " };
        if order.field.kind == FieldKind::Text {
            builder
                .push("lower(")
                .push(order.field.column)
                .push(")")
                .push(direction);
        }
        builder.push(order.field.column).push(direction);
    }
    builder.push(query.schema.id_column).push(" ASC");

    if let Some(page) = query.page {
        builder
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
    }
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
