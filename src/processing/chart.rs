// Translating user chart configurations into renderer-ready specs
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::data::{lookup_value, value_to_f64, value_to_string, Row};
use crate::utils::{validate_not_blank, validate_not_empty_list};
use super::{JoinedTable, ProcessingError};

/// Palette cycled through when a configuration brings no colors
pub const DEFAULT_PALETTE: &[&str] = &[
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316", "#6366f1", "#84cc16",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    #[default]
    Chart,
    Table,
}

/// Chart style picked in the builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Area,
    Stacked,
    Pie,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Left,
    Right,
}

/// How one series is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    #[default]
    Bar,
    Line,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub axis: Axis,
    #[serde(default, rename = "type")]
    pub kind: SeriesKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// The builder's editable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: VisualizationKind,
    #[serde(default)]
    pub chart_type: ChartKind,
    pub x_column: String,
    #[serde(default)]
    pub y_columns: Vec<String>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl ChartConfiguration {
    pub fn validate(&self) -> Result<(), ProcessingError> {
        validate_not_blank(&self.name, "name").map_err(ProcessingError::InvalidConfiguration)?;
        validate_not_blank(&self.x_column, "xColumn").map_err(ProcessingError::InvalidConfiguration)?;
        validate_not_empty_list(&self.y_columns, "yColumns").map_err(ProcessingError::InvalidConfiguration)?;

        Ok(())
    }

    fn palette(&self) -> Vec<String> {
        if self.colors.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            self.colors.clone()
        }
    }

    fn default_series_kind(&self) -> SeriesKind {
        match self.chart_type {
            ChartKind::Line => SeriesKind::Line,
            ChartKind::Area => SeriesKind::Area,
            _ => SeriesKind::Bar,
        }
    }

    /// The group-by field, ignoring blank selections
    fn group_by_field(&self) -> Option<&str> {
        self.group_by.as_deref().filter(|field| !field.trim().is_empty())
    }
}

/// Chart type handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderedChartType {
    Bar,
    Line,
    Area,
    StackedBar,
    DualAxis,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisField {
    pub field: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSeries {
    pub field: String,
    pub display_name: String,
    pub axis: Axis,
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    pub color: String,
}

/// Renderer-ready chart config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: String,
    pub description: String,
    pub chart_type: RenderedChartType,
    pub x_axis: AxisField,
    pub series: Vec<RenderedSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<AxisField>,
    pub colors: Vec<String>,
}

impl ChartConfig {
    pub fn series_fields(&self) -> Vec<String> {
        self.series.iter().map(|s| s.field.clone()).collect()
    }
}

/// Short label for an `apiId_columnName` key: the last segment of a
/// two-part key, the last two segments of a longer one
pub fn display_name(key: &str) -> String {
    let segments: Vec<&str> = key.split('_').filter(|s| !s.is_empty()).collect();

    match segments.len() {
        0 => key.to_string(),
        1 => segments[0].to_string(),
        2 => segments[1].to_string(),
        n => segments[n - 2..].join("_"),
    }
}

/// Short labels for several keys; keys whose short labels collide keep
/// their full key
pub fn display_names(keys: &[String]) -> Vec<String> {
    let short: Vec<String> = keys.iter().map(|key| display_name(key)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &short {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }

    keys.iter()
        .zip(&short)
        .map(|(key, name)| if counts[name.as_str()] > 1 { key.clone() } else { name.clone() })
        .collect()
}

/// Pick the renderer chart type for a configuration
pub fn resolve_chart_type(configuration: &ChartConfiguration, series: &[RenderedSeries]) -> RenderedChartType {
    if series.iter().any(|s| s.axis == Axis::Right) {
        return RenderedChartType::DualAxis;
    }

    let stacked = configuration.chart_type == ChartKind::Stacked && configuration.y_columns.len() > 1;
    if configuration.group_by_field().is_some() || stacked {
        return RenderedChartType::StackedBar;
    }

    match configuration.chart_type {
        ChartKind::Pie => RenderedChartType::Pie,
        ChartKind::Line => RenderedChartType::Line,
        ChartKind::Area => RenderedChartType::Area,
        ChartKind::Bar | ChartKind::Stacked => RenderedChartType::Bar,
    }
}

/// Translate the builder state into a renderer-ready chart config
pub fn translate(configuration: &ChartConfiguration) -> Result<ChartConfig, ProcessingError> {
    configuration.validate()?;

    let palette = configuration.palette();
    let names = display_names(&configuration.y_columns);

    let series: Vec<RenderedSeries> = configuration
        .y_columns
        .iter()
        .zip(names)
        .enumerate()
        .map(|(i, (field, short_name))| {
            let explicit = configuration.series.iter().find(|s| &s.field == field);

            RenderedSeries {
                field: field.clone(),
                display_name: explicit.and_then(|s| s.label.clone()).unwrap_or(short_name),
                axis: explicit.map(|s| s.axis).unwrap_or_default(),
                kind: explicit.map(|s| s.kind).unwrap_or_else(|| configuration.default_series_kind()),
                color: explicit
                    .and_then(|s| s.color.clone())
                    .unwrap_or_else(|| palette[i % palette.len()].clone()),
            }
        })
        .collect();

    let chart_type = resolve_chart_type(configuration, &series);

    Ok(ChartConfig {
        title: configuration.name.clone(),
        description: configuration.description.clone(),
        chart_type,
        x_axis: AxisField {
            field: configuration.x_column.clone(),
            label: display_name(&configuration.x_column),
        },
        series,
        group_by: configuration.group_by_field().map(|field| AxisField {
            field: field.to_string(),
            label: display_name(field),
        }),
        colors: palette,
    })
}

/// Legend item for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub field: String,
    pub label: String,
    pub total: f64,
    pub color: String,
}

/// Legend for the given rows: one entry per field with its summed total,
/// largest first, colored by rank
pub fn legend_entries(rows: &[Row], fields: &[String], palette: &[String]) -> Vec<LegendEntry> {
    let palette: Vec<String> = if palette.is_empty() {
        DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
    } else {
        palette.to_vec()
    };

    let labels = display_names(fields);

    let mut totals: Vec<(String, String, f64)> = fields
        .iter()
        .zip(labels)
        .map(|(field, label)| {
            let total = rows
                .iter()
                .filter_map(|row| lookup_value(row, field).and_then(value_to_f64))
                .sum();
            (field.clone(), label, total)
        })
        .collect();

    totals.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    totals
        .into_iter()
        .enumerate()
        .map(|(rank, (field, label, total))| LegendEntry {
            field,
            label,
            total,
            color: palette[rank % palette.len()].clone(),
        })
        .collect()
}

/// Rows a renderer consumes, and the value keys they carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub keys: Vec<String>,
    pub rows: Vec<Row>,
}

/// Materialize chart rows from a joined table. With a group-by field the
/// rows are pivoted to one row per x value and one key per group.
pub fn materialize_chart_data(table: &JoinedTable, config: &ChartConfig) -> ChartData {
    match &config.group_by {
        Some(group_by) => pivot_by_group(table, config, &group_by.field),
        None => {
            let keys = config.series_fields();
            let rows = table
                .rows
                .iter()
                .map(|joined| {
                    let mut row = Row::new();
                    row.insert(
                        config.x_axis.field.clone(),
                        joined.cell(&config.x_axis.field).unwrap_or(JsonValue::Null),
                    );
                    for key in &keys {
                        let value = joined.cell(key).as_ref().and_then(value_to_f64);
                        row.insert(key.clone(), value.map_or(JsonValue::Null, |v| json!(v)));
                    }
                    row
                })
                .collect();

            ChartData { keys, rows }
        },
    }
}

fn pivot_by_group(table: &JoinedTable, config: &ChartConfig, group_field: &str) -> ChartData {
    let single_series = config.series.len() == 1;
    let mut keys: Vec<String> = Vec::new();
    let mut x_order: Vec<String> = Vec::new();
    let mut x_values: HashMap<String, JsonValue> = HashMap::new();
    let mut sums: HashMap<(String, String), f64> = HashMap::new();

    for joined in &table.rows {
        let Some(x) = joined.cell(&config.x_axis.field) else {
            continue;
        };
        let x_key = value_to_string(&x).unwrap_or_default();
        let group = joined
            .cell(group_field)
            .as_ref()
            .and_then(value_to_string)
            .unwrap_or_else(|| "Other".to_string());

        if !x_values.contains_key(&x_key) {
            x_order.push(x_key.clone());
            x_values.insert(x_key.clone(), x);
        }

        for series in &config.series {
            let Some(value) = joined.cell(&series.field).as_ref().and_then(value_to_f64) else {
                continue;
            };

            let key = if single_series {
                group.clone()
            } else {
                format!("{} {}", group, series.display_name)
            };

            if !keys.contains(&key) {
                keys.push(key.clone());
            }
            *sums.entry((x_key.clone(), key)).or_insert(0.0) += value;
        }
    }

    let rows = x_order
        .into_iter()
        .map(|x_key| {
            let mut row = Row::new();
            row.insert(
                config.x_axis.field.clone(),
                x_values.remove(&x_key).unwrap_or(JsonValue::Null),
            );
            for key in &keys {
                let total = sums.get(&(x_key.clone(), key.clone())).copied().unwrap_or(0.0);
                row.insert(key.clone(), json!(total));
            }
            row
        })
        .collect();

    ChartData { keys, rows }
}
