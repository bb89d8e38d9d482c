//! Event table persistence.

mod table;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use table::{EventTable, REQUIRED_COLUMNS};

use crate::error::StoreError;

/// Loads and saves the event table.
pub trait EventStore {
    /// Loads every event row.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing, unreadable, or lacks a
    /// required column.
    fn load(&self) -> Result<EventTable, StoreError>;

    /// Writes the owned cells of every row back.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    fn save(&self, table: &EventTable) -> Result<(), StoreError>;
}

/// CSV file event store.
#[derive(Debug, Clone)]
pub struct CsvEventStore {
    path: PathBuf,
}

impl CsvEventStore {
    /// Creates a store for the CSV file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, temp: &Path, table: &EventTable) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_path(temp)?;
        writer.write_record(table.headers())?;
        for record in table.to_records() {
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl EventStore for CsvEventStore {
    fn load(&self) -> Result<EventTable, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        let table = EventTable::from_records(headers, records)?;
        debug!("Loaded {} events from {}", table.len(), self.path.display());
        Ok(table)
    }

    fn save(&self, table: &EventTable) -> Result<(), StoreError> {
        let temp = self.temp_path();

        let written = self.write_temp(&temp, table).and_then(|()| {
            std::fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))
        });
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&temp) {
                warn!("Could not remove {}: {cleanup}", temp.display());
            }
            return Err(e);
        }

        debug!("Saved {} events to {}", table.len(), self.path.display());
        Ok(())
    }
}
