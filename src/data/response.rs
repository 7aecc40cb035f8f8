// Response envelopes returned by the analytics API
// Author: Gabriel Demetrios Lafis

use serde_json::Value as JsonValue;

use super::{DataError, Row};

/// Upstream message meaning the query has never been executed
pub const NO_CACHED_RESULT: &str = "No cached result found";

/// The nestings an upstream or proxied response may use for its rows
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// `{query_result: {data: {rows: [...]}}}`
    QueryResult(Vec<Row>),
    /// `{data: {results: [...]}}`
    Results(Vec<Row>),
    /// `{data: {data: [...]}}`
    Nested(Vec<Row>),
    /// `[...]`
    Bare(Vec<Row>),
}

impl ResponseShape {
    /// Probe the known nestings in order; the first match wins
    pub fn classify(body: JsonValue) -> Result<Self, DataError> {
        if let Some(rows) = body.pointer("/query_result/data/rows") {
            return Ok(ResponseShape::QueryResult(rows_from(rows)?));
        }
        if let Some(rows) = body.pointer("/data/results") {
            return Ok(ResponseShape::Results(rows_from(rows)?));
        }
        if let Some(rows) = body.pointer("/data/data") {
            return Ok(ResponseShape::Nested(rows_from(rows)?));
        }
        if body.is_array() {
            return Ok(ResponseShape::Bare(rows_from(&body)?));
        }

        Err(DataError::UnexpectedShape(describe_keys(&body)))
    }

    /// Accept only the canonical `query_result.data.rows` envelope
    pub fn classify_strict(body: JsonValue) -> Result<Vec<Row>, DataError> {
        match body.pointer("/query_result/data/rows") {
            Some(rows) => rows_from(rows),
            None => Err(DataError::UnexpectedShape(format!(
                "missing query_result.data.rows ({})",
                describe_keys(&body)
            ))),
        }
    }

    /// Name of the matched envelope, for diagnostics
    pub fn variant_name(&self) -> &'static str {
        match self {
            ResponseShape::QueryResult(_) => "query_result.data.rows",
            ResponseShape::Results(_) => "data.results",
            ResponseShape::Nested(_) => "data.data",
            ResponseShape::Bare(_) => "array",
        }
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            ResponseShape::QueryResult(rows)
            | ResponseShape::Results(rows)
            | ResponseShape::Nested(rows)
            | ResponseShape::Bare(rows) => rows,
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            ResponseShape::QueryResult(rows)
            | ResponseShape::Results(rows)
            | ResponseShape::Nested(rows)
            | ResponseShape::Bare(rows) => rows,
        }
    }
}

/// Whether a raw response body carries the "no cached result" sentinel
pub fn is_no_cached_result(body: &str) -> bool {
    body.contains(NO_CACHED_RESULT)
}

fn rows_from(value: &JsonValue) -> Result<Vec<Row>, DataError> {
    let items = value
        .as_array()
        .ok_or_else(|| DataError::UnexpectedShape("rows is not an array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_object()
                .cloned()
                .ok_or_else(|| DataError::UnexpectedShape(format!("row {} is not an object", i)))
        })
        .collect()
}

fn describe_keys(body: &JsonValue) -> String {
    match body.as_object() {
        Some(obj) => format!(
            "top-level keys: [{}]",
            obj.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
        ),
        None => "body is not an object or array".to_string(),
    }
}
