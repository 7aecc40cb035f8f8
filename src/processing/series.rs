// Time series built from query rows, and brush filtering
// Author: Gabriel Demetrios Lafis

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::data::{lookup_value, normalize_date, normalize_date_value, on_or_before, value_to_f64, Row};

/// One dated observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: String,
    pub values: BTreeMap<String, f64>,
}

/// Dated observations sorted by normalized date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub fields: Vec<String>,
    pub points: Vec<DataPoint>,
}

impl Series {
    /// Build a series from rows. Rows without a date are skipped; values
    /// that are not numeric are left out of the point.
    pub fn from_rows(rows: &[Row], date_column: &str, value_columns: &[String]) -> Self {
        let mut points: Vec<DataPoint> = rows
            .iter()
            .filter_map(|row| {
                let date = lookup_value(row, date_column).and_then(normalize_date_value)?;

                let values = value_columns
                    .iter()
                    .filter_map(|column| {
                        let value = lookup_value(row, column).and_then(value_to_f64)?;
                        Some((column.clone(), value))
                    })
                    .collect();

                Some(DataPoint { date, values })
            })
            .collect();

        points.sort_by(|a, b| a.date.cmp(&b.date));

        Series {
            fields: value_columns.to_vec(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Full date range covered by the series
    pub fn domain(&self) -> BrushDomain {
        BrushDomain {
            start: self.points.first().map(|p| p.date.clone()),
            end: self.points.last().map(|p| p.date.clone()),
        }
    }

    /// Copy of the series restricted to a brush selection
    pub fn filtered(&self, domain: &BrushDomain) -> Series {
        Series {
            fields: self.fields.clone(),
            points: brush_filter(&self.points, domain),
        }
    }

    /// Flat rows (`date` plus one key per field) for legends and renderers
    pub fn to_rows(&self) -> Vec<Row> {
        self.points
            .iter()
            .map(|point| {
                let mut row = Row::new();
                row.insert("date".to_string(), json!(point.date));
                for (field, value) in &point.values {
                    row.insert(field.clone(), json!(value));
                }
                row
            })
            .collect()
    }
}

/// A brushed date range; missing bounds are open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrushDomain {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl BrushDomain {
    /// Domain with both bounds normalized the same way as point dates
    pub fn new(start: Option<&str>, end: Option<&str>) -> Self {
        BrushDomain {
            start: start.map(normalize_date),
            end: end.map(normalize_date),
        }
    }

    pub fn contains(&self, date: &str) -> bool {
        let after_start = self.start.as_deref().map_or(true, |start| date >= start);
        let before_end = self.end.as_deref().map_or(true, |end| on_or_before(date, end));
        after_start && before_end
    }
}

/// Points inside the brush domain, bounds inclusive. An inverted domain
/// selects nothing.
pub fn brush_filter(points: &[DataPoint], domain: &BrushDomain) -> Vec<DataPoint> {
    points
        .iter()
        .filter(|point| domain.contains(&point.date))
        .cloned()
        .collect()
}
