// Explorer session: selected columns and their fetch state
// Author: Gabriel Demetrios Lafis

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::data::{column_key, ApiCatalog, ColumnData, Row};
use crate::fetch::{fetch_api_data, FetchError, RowFetcher};
use super::{generate_joined_table, DateColumnMapping, JoinedTable, ProcessingError};

struct Selection {
    column: ColumnData,
    generation: u64,
}

/// The set of columns a user has picked, in selection order
pub struct ExplorerSession {
    catalog: Arc<ApiCatalog>,
    selections: Vec<Selection>,
    date_column_mapping: DateColumnMapping,
    next_generation: u64,
}

impl ExplorerSession {
    pub fn new(catalog: Arc<ApiCatalog>) -> Self {
        ExplorerSession {
            catalog,
            selections: Vec::new(),
            date_column_mapping: DateColumnMapping::new(),
            next_generation: 0,
        }
    }

    pub fn catalog(&self) -> &ApiCatalog {
        &self.catalog
    }

    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Select a column; it starts out loading. Returns the generation a
    /// fetch result must carry to be applied.
    pub fn select(&mut self, api_id: &str, column_name: &str) -> Result<u64, ProcessingError> {
        let api = self
            .catalog
            .get(api_id)
            .ok_or_else(|| ProcessingError::UnknownApi(api_id.to_string()))?;

        if !api.columns.is_empty() && !api.columns.iter().any(|c| c == column_name) {
            return Err(ProcessingError::InvalidArgument(format!(
                "API '{}' has no column '{}'",
                api_id, column_name
            )));
        }

        let column = ColumnData::pending(api, column_name);
        let generation = self.bump();
        let key = column.key();

        match self.selections.iter_mut().find(|s| s.column.key() == key) {
            Some(existing) => {
                existing.column = column;
                existing.generation = generation;
            },
            None => self.selections.push(Selection { column, generation }),
        }

        Ok(generation)
    }

    /// Remove a column from the selection
    pub fn deselect(&mut self, api_id: &str, column_name: &str) -> Option<ColumnData> {
        let key = column_key(api_id, column_name);
        let position = self.selections.iter().position(|s| s.column.key() == key)?;
        Some(self.selections.remove(position).column)
    }

    /// Replace a column's data with a fetch result. Results for a
    /// deselected column or from an older generation are dropped.
    pub fn apply_result(&mut self, key: &str, generation: u64, result: Result<Vec<Row>, FetchError>) -> bool {
        let Some(selection) = self.selections.iter_mut().find(|s| s.column.key() == key) else {
            debug!("Dropping result for deselected column {}", key);
            return false;
        };

        if selection.generation != generation {
            debug!("Dropping stale result for column {} (generation {})", key, generation);
            return false;
        }

        let column = &mut selection.column;
        column.loading = false;
        match result {
            Ok(rows) => {
                column.data = rows;
                column.error = None;
            },
            Err(err) => {
                column.data = Vec::new();
                column.error = Some(err.to_column_error());
            },
        }

        true
    }

    /// Choose the column an API is aligned on in multi-API joins
    pub fn set_date_mapping(&mut self, api_id: impl Into<String>, column: impl Into<String>) {
        self.date_column_mapping.insert(api_id.into(), column.into());
    }

    pub fn clear_date_mapping(&mut self, api_id: &str) {
        self.date_column_mapping.remove(api_id);
    }

    pub fn date_column_mapping(&self) -> &DateColumnMapping {
        &self.date_column_mapping
    }

    /// Selected columns in selection order
    pub fn columns(&self) -> Vec<&ColumnData> {
        self.selections.iter().map(|s| &s.column).collect()
    }

    pub fn column(&self, api_id: &str, column_name: &str) -> Option<&ColumnData> {
        let key = column_key(api_id, column_name);
        self.selections.iter().map(|s| &s.column).find(|c| c.key() == key)
    }

    /// Distinct API ids among the selections, first-seen order
    pub fn selected_api_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for selection in &self.selections {
            if !ids.contains(&selection.column.api_id) {
                ids.push(selection.column.api_id.clone());
            }
        }
        ids
    }

    /// Fetch every selected API once, concurrently, and hand its rows to
    /// each of its selected columns
    pub async fn refetch<F>(&mut self, fetcher: &F, parameters: Option<&JsonValue>)
    where
        F: RowFetcher + ?Sized,
    {
        let mut tickets: HashMap<String, Vec<(String, u64)>> = HashMap::new();

        for index in 0..self.selections.len() {
            let generation = self.bump();
            let selection = &mut self.selections[index];
            selection.generation = generation;
            selection.column.loading = true;
            tickets
                .entry(selection.column.api_id.clone())
                .or_default()
                .push((selection.column.key(), generation));
        }

        let apis: Vec<_> = self
            .selected_api_ids()
            .iter()
            .filter_map(|api_id| self.catalog.get(api_id).cloned())
            .collect();

        let results = join_all(apis.iter().map(|api| fetch_api_data(fetcher, api, parameters))).await;

        for (api, result) in apis.iter().zip(results) {
            match &result {
                Ok(rows) => info!("Fetched {} rows for API '{}'", rows.len(), api.id),
                Err(err) => info!("Fetch for API '{}' failed: {}", api.id, err),
            }

            for (key, generation) in tickets.remove(&api.id).unwrap_or_default() {
                self.apply_result(&key, generation, result.clone());
            }
        }
    }

    /// Select a column and fetch its API right away
    pub async fn select_and_fetch<F>(
        &mut self,
        fetcher: &F,
        api_id: &str,
        column_name: &str,
        parameters: Option<&JsonValue>,
    ) -> Result<(), ProcessingError>
    where
        F: RowFetcher + ?Sized,
    {
        let generation = self.select(api_id, column_name)?;
        let api = self
            .catalog
            .get(api_id)
            .cloned()
            .ok_or_else(|| ProcessingError::UnknownApi(api_id.to_string()))?;

        let result = fetch_api_data(fetcher, &api, parameters).await;
        self.apply_result(&column_key(api_id, column_name), generation, result);

        Ok(())
    }

    /// Join the current selections
    pub fn joined_table(&self) -> JoinedTable {
        let columns: Vec<ColumnData> = self.selections.iter().map(|s| s.column.clone()).collect();
        generate_joined_table(&columns, &self.catalog, &self.date_column_mapping)
    }
}
