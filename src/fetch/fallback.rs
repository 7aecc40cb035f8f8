// Placeholder data for datasets whose query failed
// Author: Gabriel Demetrios Lafis

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::data::Row;

/// What a dashboard dataset shows when its query fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Report the dataset as unavailable
    Disabled,
    /// Show generated data, explicitly marked as a placeholder
    Placeholder,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::Disabled
    }
}

/// One day of SOL burn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolBurnPoint {
    pub block_date: NaiveDate,
    pub sol_burn: f64,
    pub cumulative_sol_burn: f64,
}

impl SolBurnPoint {
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("block_date".to_string(), json!(self.block_date.format("%Y-%m-%d").to_string()));
        row.insert("sol_burn".to_string(), json!(self.sol_burn));
        row.insert("cumulative_sol_burn".to_string(), json!(self.cumulative_sol_burn));
        row
    }
}

fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = (end - start).num_days().max(-1) + 1;
    (0..count).map(move |offset| start + Duration::days(offset))
}

/// Daily SOL burn between `start` and `end` inclusive.
/// `cumulative_sol_burn` never decreases.
pub fn generate_sol_burn<R: Rng + ?Sized>(start: NaiveDate, end: NaiveDate, rng: &mut R) -> Vec<SolBurnPoint> {
    let mut cumulative = 0.0;

    days(start, end)
        .map(|block_date| {
            let sol_burn: f64 = rng.gen_range(500.0..5000.0);
            cumulative += sol_burn;

            SolBurnPoint {
                block_date,
                sol_burn,
                cumulative_sol_burn: cumulative,
            }
        })
        .collect()
}

/// Random-walk rows for an arbitrary dataset. Columns named `cumulative_*`
/// are running totals and never decrease.
pub fn generate_placeholder_rows<R: Rng + ?Sized>(
    start: NaiveDate,
    end: NaiveDate,
    date_column: &str,
    value_columns: &[String],
    rng: &mut R,
) -> Vec<Row> {
    let mut levels: Vec<f64> = value_columns.iter().map(|_| rng.gen_range(100.0..1000.0)).collect();
    let mut totals: Vec<f64> = vec![0.0; value_columns.len()];

    days(start, end)
        .map(|day| {
            let mut row = Row::new();
            row.insert(date_column.to_string(), JsonValue::String(day.format("%Y-%m-%d").to_string()));

            for (i, column) in value_columns.iter().enumerate() {
                let drift: f64 = rng.gen_range(-0.1..0.1);
                levels[i] = (levels[i] * (1.0 + drift)).max(1.0);

                let value = if column.starts_with("cumulative_") {
                    totals[i] += levels[i];
                    totals[i]
                } else {
                    levels[i]
                };

                row.insert(column.clone(), json!(value));
            }

            row
        })
        .collect()
}
