// Joining selected columns from one or more APIs
// Author: Gabriel Demetrios Lafis

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::{
    detect_date_columns, lookup_value, normalize_date_value, value_to_string, ApiCatalog, ApiConfig,
    ColumnData, HttpMethod, Row, MISSING_CELL,
};
use super::ProcessingError;

/// Per-API alignment column chosen by the user, keyed by API id
pub type DateColumnMapping = HashMap<String, String>;

/// Column of a joined table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableHeader {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
}

/// One output row: `{index, date?, [apiId_columnName]: value}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub values: Row,
}

impl JoinedRow {
    /// Value of a column, or of the `index`/`date` pseudo-columns
    pub fn cell(&self, field: &str) -> Option<JsonValue> {
        match field {
            "index" => Some(JsonValue::from(self.index)),
            "date" => self.date.clone().map(JsonValue::String),
            _ => self.values.get(field).cloned(),
        }
    }
}

/// How one API takes part in a multi-API join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub api_id: String,
    pub api_name: String,
    pub column_keys: Vec<String>,
    /// Column the API is aligned on, if one could be resolved
    pub date_column: Option<String>,
    /// Date-like columns detected for the API
    pub date_candidates: Vec<String>,
}

/// Result of joining the selected columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedTable {
    pub headers: Vec<TableHeader>,
    pub rows: Vec<JoinedRow>,
    pub needs_date_mapping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_groups: Option<Vec<ApiGroup>>,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV, header keys first
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ProcessingError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(self.headers.iter().map(|h| h.key.as_str()))?;

        for row in &self.rows {
            let record: Vec<String> = self
                .headers
                .iter()
                .map(|header| {
                    row.cell(&header.key)
                        .as_ref()
                        .and_then(value_to_string)
                        .unwrap_or_else(|| MISSING_CELL.to_string())
                })
                .collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn missing() -> JsonValue {
    JsonValue::String(MISSING_CELL.to_string())
}

/// Non-null value of a column in a row
fn present_value(row: &Row, column: &str) -> Option<JsonValue> {
    lookup_value(row, column).filter(|value| !value.is_null()).cloned()
}

struct Group<'a> {
    api_id: &'a str,
    api_name: &'a str,
    columns: Vec<&'a ColumnData>,
}

/// Group columns by source API in first-seen order, dropping repeated keys
fn group_by_api(columns: &[ColumnData]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    let mut seen_keys = HashSet::new();

    for column in columns {
        if !seen_keys.insert(column.key()) {
            continue;
        }

        match groups.iter_mut().find(|g| g.api_id == column.api_id) {
            Some(group) => group.columns.push(column),
            None => groups.push(Group {
                api_id: &column.api_id,
                api_name: &column.api_name,
                columns: vec![column],
            }),
        }
    }

    groups
}

fn column_headers(groups: &[Group<'_>]) -> Vec<TableHeader> {
    groups
        .iter()
        .flat_map(|group| {
            group.columns.iter().map(move |column| TableHeader {
                key: column.key(),
                label: format!("{} ({})", column.column_name, group.api_name),
                api_id: Some(group.api_id.to_string()),
            })
        })
        .collect()
}

fn pseudo_header(key: &str, label: &str) -> TableHeader {
    TableHeader {
        key: key.to_string(),
        label: label.to_string(),
        api_id: None,
    }
}

/// Date candidates for a group, from the catalog entry if there is one or
/// from the keys of the fetched rows otherwise
fn date_candidates(group: &Group<'_>, catalog: &ApiCatalog) -> Vec<String> {
    let sample: &[Row] = group
        .columns
        .iter()
        .map(|column| column.data.as_slice())
        .find(|rows| !rows.is_empty())
        .unwrap_or(&[]);

    match catalog.get(group.api_id) {
        Some(api) => detect_date_columns(api, sample),
        None => {
            let inferred = ApiConfig {
                id: group.api_id.to_string(),
                name: group.api_name.to_string(),
                endpoint: String::new(),
                method: HttpMethod::Get,
                columns: sample.first().map(|row| row.keys().cloned().collect()).unwrap_or_default(),
                chart_title: None,
                api_key: None,
                additional_options: None,
                page: None,
            };
            detect_date_columns(&inferred, sample)
        },
    }
}

/// Join the selected columns into one table.
///
/// Columns from a single API are zipped by position. Columns from several
/// APIs are aligned on a normalized date per API: a selected date-like
/// column, or the column named in `mapping`. When some API has neither, the
/// result has `needs_date_mapping` set and no rows.
pub fn generate_joined_table(columns: &[ColumnData], catalog: &ApiCatalog, mapping: &DateColumnMapping) -> JoinedTable {
    let groups = group_by_api(columns);

    match groups.len() {
        0 => JoinedTable::default(),
        1 => positional_join(&groups[0]),
        _ => date_join(&groups, catalog, mapping),
    }
}

fn positional_join(group: &Group<'_>) -> JoinedTable {
    let mut headers = vec![pseudo_header("index", "#")];
    headers.extend(column_headers(std::slice::from_ref(group)));

    let max_len = group.columns.iter().map(|c| c.data.len()).max().unwrap_or(0);

    let rows = (0..max_len)
        .map(|index| {
            let values = group
                .columns
                .iter()
                .map(|column| {
                    let value = column
                        .data
                        .get(index)
                        .and_then(|row| present_value(row, &column.column_name))
                        .unwrap_or_else(missing);
                    (column.key(), value)
                })
                .collect();

            JoinedRow {
                index,
                date: None,
                values,
            }
        })
        .collect();

    JoinedTable {
        headers,
        rows,
        needs_date_mapping: false,
        api_groups: None,
    }
}

fn date_join(groups: &[Group<'_>], catalog: &ApiCatalog, mapping: &DateColumnMapping) -> JoinedTable {
    let api_groups: Vec<ApiGroup> = groups
        .iter()
        .map(|group| {
            let candidates = date_candidates(group, catalog);
            let selected_date = group
                .columns
                .iter()
                .map(|column| &column.column_name)
                .find(|name| candidates.iter().any(|candidate| candidate.eq_ignore_ascii_case(name)))
                .cloned();

            ApiGroup {
                api_id: group.api_id.to_string(),
                api_name: group.api_name.to_string(),
                column_keys: group.columns.iter().map(|c| c.key()).collect(),
                date_column: selected_date.or_else(|| mapping.get(group.api_id).cloned()),
                date_candidates: candidates,
            }
        })
        .collect();

    let mut headers = vec![pseudo_header("index", "#"), pseudo_header("date", "Date")];
    headers.extend(column_headers(groups));

    if api_groups.iter().any(|g| g.date_column.is_none()) {
        return JoinedTable {
            headers,
            rows: Vec::new(),
            needs_date_mapping: true,
            api_groups: Some(api_groups),
        };
    }

    // Each API writes only its own column keys, so APIs never clobber each other
    let mut merged: BTreeMap<String, Row> = BTreeMap::new();

    for (group, api_group) in groups.iter().zip(&api_groups) {
        let date_column = api_group.date_column.as_deref().unwrap_or_default();

        for column in &group.columns {
            let key = column.key();

            for row in &column.data {
                let Some(date) = lookup_value(row, date_column).and_then(normalize_date_value) else {
                    continue;
                };

                // Every dated row yields a table row, even when its cells are missing
                let cells = merged.entry(date).or_default();
                if let Some(value) = present_value(row, &column.column_name) {
                    cells.insert(key.clone(), value);
                }
            }
        }
    }

    let value_keys: Vec<&str> = headers.iter().skip(2).map(|h| h.key.as_str()).collect();

    let rows = merged
        .into_iter()
        .enumerate()
        .map(|(index, (date, mut found))| {
            let values = value_keys
                .iter()
                .map(|key| (key.to_string(), found.remove(*key).unwrap_or_else(missing)))
                .collect();

            JoinedRow {
                index,
                date: Some(date),
                values,
            }
        })
        .collect();

    JoinedTable {
        headers,
        rows,
        needs_date_mapping: false,
        api_groups: Some(api_groups),
    }
}
