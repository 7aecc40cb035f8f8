// Memory storage implementation
// Author: Gabriel Demetrios Lafis

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{StorageError, SavedVisualization, VisualizationStore};

/// In-memory store for saved visualizations, listed oldest first
pub struct MemoryStorage {
    visualizations: Arc<RwLock<HashMap<String, SavedVisualization>>>,
}

impl MemoryStorage {
    /// Create a new memory storage
    pub fn new() -> Self {
        MemoryStorage {
            visualizations: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizationStore for MemoryStorage {
    fn store(&self, visualization: &SavedVisualization) -> Result<(), StorageError> {
        let mut visualizations = self.visualizations.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        match visualizations.entry(visualization.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(visualization.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(visualization.clone());
                Ok(())
            },
        }
    }

    fn load(&self, id: &str) -> Result<SavedVisualization, StorageError> {
        let visualizations = self.visualizations.read().map_err(|_| {
            StorageError::Other("Failed to acquire read lock".to_string())
        })?;

        visualizations
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn exists(&self, id: &str) -> Result<bool, StorageError> {
        let visualizations = self.visualizations.read().map_err(|_| {
            StorageError::Other("Failed to acquire read lock".to_string())
        })?;

        Ok(visualizations.contains_key(id))
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut visualizations = self.visualizations.write().map_err(|_| {
            StorageError::Other("Failed to acquire write lock".to_string())
        })?;

        if visualizations.remove(id).is_none() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn list(&self) -> Result<Vec<SavedVisualization>, StorageError> {
        let visualizations = self.visualizations.read().map_err(|_| {
            StorageError::Other("Failed to acquire read lock".to_string())
        })?;

        let mut all: Vec<SavedVisualization> = visualizations.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}
