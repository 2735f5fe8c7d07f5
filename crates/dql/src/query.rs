//! DQL statement builders.
//!
//! Pure functions turning a collection name plus filters, a document, or a
//! patch into a [`Query`]. Mutating statements bind their payload as
//! parameters; SELECT filters are inlined as escaped string literals.
//!
//! Identifier sanitisation is minimal ([`escape_ident`]); it is not a defence
//! against hostile collection or field names.

use std::fmt::Write as _;

use serde_json::Value;

use crate::{Document, Filters, ListOptions, Patch, Query, QueryArgs, QueryError};

/// Bound parameter holding the record identifier.
const ID_PARAM: &str = "id";

/// Bound parameter holding an inserted document.
const DOC_PARAM: &str = "doc";

/// Bound parameter holding the LIKE pattern for bulk deletes.
const PATTERN_PARAM: &str = "pattern";

/// Builds `SELECT * FROM <collection> [WHERE ...] [ORDER BY ...] [LIMIT n]`.
///
/// Filters become `field == "value"` terms joined by `AND`, in key order.
/// A sort with an empty field and a limit of zero are both ignored.
pub fn build_select(collection: &str, filters: &Filters, options: &ListOptions) -> String {
    let mut b = String::from("SELECT * FROM ");
    b.push_str(&escape_ident(collection));

    if !filters.is_empty() {
        b.push_str(" WHERE ");
        for (i, (field, value)) in filters.iter().enumerate() {
            if i > 0 {
                b.push_str(" AND ");
            }
            let _ = write!(b, "{} == \"{}\"", escape_ident(field), escape_string(value));
        }
    }

    if let Some(sort) = options.sort.as_ref().filter(|s| !s.field.is_empty()) {
        b.push_str(" ORDER BY ");
        b.push_str(&escape_ident(&sort.field));
        if let Some(order) = sort.order {
            b.push(' ');
            b.push_str(order.as_str());
        }
    }

    if let Some(limit) = options.limit.filter(|l| *l > 0) {
        let _ = write!(b, " LIMIT {limit}");
    }

    b
}

/// Builds `INSERT INTO <collection> DOCUMENTS (:doc)` with the whole document
/// bound under `doc`.
pub fn build_insert(collection: &str, doc: Document) -> Result<Query, QueryError> {
    if collection.is_empty() {
        return Err(QueryError::CollectionRequired);
    }

    let mut args = QueryArgs::new();
    args.insert(DOC_PARAM.to_string(), Value::Object(doc));
    Ok(Query::with_args(
        format!("INSERT INTO {} DOCUMENTS (:{DOC_PARAM})", escape_ident(collection)),
        args,
    ))
}

/// Builds `UPDATE <collection> SET f = :p_f, ... WHERE _id == :id`.
///
/// Each patch field is sanitised with [`escape_ident`] and bound as
/// `p_<field>` under the sanitised name; fields are emitted in key order.
pub fn build_update(collection: &str, id: &str, patch: Patch) -> Result<Query, QueryError> {
    if collection.is_empty() || id.is_empty() {
        return Err(QueryError::CollectionAndIdRequired);
    }
    if patch.is_empty() {
        return Err(QueryError::EmptyPatch);
    }

    let mut fields: Vec<(String, Value)> = patch.into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut args = QueryArgs::new();
    args.insert(ID_PARAM.to_string(), Value::String(id.to_string()));

    let mut set = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let ident = escape_ident(&field);
        let param = format!("p_{ident}");
        set.push(format!("{ident} = :{param}"));
        args.insert(param, value);
    }

    Ok(Query::with_args(
        format!(
            "UPDATE {} SET {} WHERE _id == :{ID_PARAM}",
            escape_ident(collection),
            set.join(", ")
        ),
        args,
    ))
}

/// Builds `SELECT * FROM <collection> WHERE _id == :id LIMIT 1`.
pub fn build_get_by_id(collection: &str, id: &str) -> Result<Query, QueryError> {
    if collection.is_empty() || id.is_empty() {
        return Err(QueryError::CollectionAndIdRequired);
    }
    Ok(Query::with_args(
        format!(
            "SELECT * FROM {} WHERE _id == :{ID_PARAM} LIMIT 1",
            escape_ident(collection)
        ),
        id_args(id),
    ))
}

/// Builds `DELETE FROM <collection> WHERE _id = :id`.
pub fn build_delete_by_id(collection: &str, id: &str) -> Result<Query, QueryError> {
    if collection.is_empty() || id.is_empty() {
        return Err(QueryError::CollectionAndIdRequired);
    }
    Ok(Query::with_args(
        format!("DELETE FROM {} WHERE _id = :{ID_PARAM}", escape_ident(collection)),
        id_args(id),
    ))
}

/// Builds `DELETE FROM <collection> WHERE _id LIKE :pattern` matching every id.
///
/// DQL has no TRUNCATE.
pub fn build_delete_all(collection: &str) -> Result<Query, QueryError> {
    if collection.is_empty() {
        return Err(QueryError::CollectionRequired);
    }
    let mut args = QueryArgs::new();
    args.insert(PATTERN_PARAM.to_string(), Value::String("%".to_string()));
    Ok(Query::with_args(
        format!(
            "DELETE FROM {} WHERE _id LIKE :{PATTERN_PARAM}",
            escape_ident(collection)
        ),
        args,
    ))
}

/// Minimal identifier sanitisation: drops backticks, turns spaces into underscores.
pub fn escape_ident(s: &str) -> String {
    s.replace('`', "").replace(' ', "_")
}

/// Escapes double quotes for use inside a `"..."` literal.
pub fn escape_string(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn id_args(id: &str) -> QueryArgs {
    let mut args = QueryArgs::new();
    args.insert(ID_PARAM.to_string(), Value::String(id.to_string()));
    args
}
