// File storage implementation
// Author: Gabriel Demetrios Lafis

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::{validate_id, SavedVisualization, StorageError, VisualizationStore};

const EXTENSION: &str = "json";

/// Stores each visualization as a pretty-printed JSON file
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a new file storage
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }

        Ok(FileStorage { base_dir })
    }

    /// Get the path for a visualization
    fn get_path(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_id(id)?;

        let mut path = self.base_dir.clone();
        path.push(format!("{}.{}", id, EXTENSION));
        Ok(path)
    }

    fn read_file(path: &Path) -> Result<SavedVisualization, StorageError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl VisualizationStore for FileStorage {
    fn store(&self, visualization: &SavedVisualization) -> Result<(), StorageError> {
        let path = self.get_path(&visualization.id)?;

        // create_new keeps an existing snapshot from being overwritten
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(visualization.id.clone()),
                _ => StorageError::IoError(err),
            })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, visualization)?;
        writer.flush()?;

        debug!("Stored visualization {} at {}", visualization.id, path.display());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<SavedVisualization, StorageError> {
        let path = self.get_path(id)?;

        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        Self::read_file(&path)
    }

    fn exists(&self, id: &str) -> Result<bool, StorageError> {
        let path = self.get_path(id)?;
        Ok(path.exists())
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let path = self.get_path(id)?;

        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        fs::remove_file(path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<SavedVisualization>, StorageError> {
        let mut visualizations = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            let is_json = path.is_file() && path.extension().map_or(false, |ext| ext == EXTENSION);
            if is_json {
                visualizations.push(Self::read_file(&path)?);
            }
        }

        visualizations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(visualizations)
    }
}
