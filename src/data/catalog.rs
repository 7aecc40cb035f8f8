// API catalog loaded from the build-time cache snapshot
// Author: Gabriel Demetrios Lafis

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{info, warn};

use super::{ApiConfig, DataError, HttpMethod};

/// Default location of the snapshot file
pub const DEFAULT_API_CACHE_PATH: &str = "public/api-cache.json";

/// Known API descriptors, in snapshot order
#[derive(Debug, Clone, Default)]
pub struct ApiCatalog {
    apis: Vec<ApiConfig>,
}

impl ApiCatalog {
    /// Build a catalog from descriptors. Duplicate ids keep the first entry.
    pub fn from_configs(configs: Vec<ApiConfig>) -> Self {
        let mut seen = HashSet::new();
        let mut apis = Vec::with_capacity(configs.len());

        for config in configs {
            if seen.insert(config.id.clone()) {
                apis.push(config);
            } else {
                warn!("Duplicate API id '{}' in catalog, keeping first entry", config.id);
            }
        }

        ApiCatalog { apis }
    }

    /// Load the snapshot, falling back to a single built-in entry when the
    /// file cannot be read
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(catalog) => {
                info!("Loaded {} API configs from {}", catalog.len(), path.as_ref().display());
                catalog
            },
            Err(err) => {
                warn!(
                    "Could not read API cache {}: {}; using built-in fallback entry",
                    path.as_ref().display(),
                    err
                );
                Self::fallback()
            },
        }
    }

    /// Load the snapshot, reporting any failure
    pub fn try_load(path: &Path) -> Result<Self, DataError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let configs: Vec<ApiConfig> = serde_json::from_reader(reader)?;
        Ok(Self::from_configs(configs))
    }

    /// Catalog used when the snapshot is unavailable
    pub fn fallback() -> Self {
        ApiCatalog {
            apis: vec![ApiConfig {
                id: "sol-burn".to_string(),
                name: "SOL Burn".to_string(),
                endpoint: "https://analytics.topledger.xyz/tl/api/queries/12435/results.json"
                    .to_string(),
                method: HttpMethod::Get,
                columns: vec![
                    "block_date".to_string(),
                    "sol_burn".to_string(),
                    "cumulative_sol_burn".to_string(),
                ],
                chart_title: Some("SOL Burn".to_string()),
                api_key: None,
                additional_options: None,
                page: None,
            }],
        }
    }

    pub fn get(&self, id: &str) -> Option<&ApiConfig> {
        self.apis.iter().find(|api| api.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiConfig> {
        self.apis.iter()
    }

    pub fn len(&self) -> usize {
        self.apis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }
}
