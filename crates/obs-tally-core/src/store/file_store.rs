//! TOML-file backed total store.
//!
//! Writes go to a temporary file that is synced and then renamed over the
//! target, so a crash mid-write never leaves a torn value behind.

use crate::{CoreError, CoreResult, store::TotalTimeStore};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    sync::Mutex,
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TotalRecord {
    total_seconds: u64,
}

/// Stores the total as `total_seconds = N` in a TOML file.
#[derive(Debug)]
pub struct FileTotalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTotalStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; `None` when no total has been written yet.
    #[track_caller]
    fn read_contents(&self) -> CoreResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| CoreError::StorageRead {
                reason: format!("Failed to read {}: {}", self.path.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn parse_or_default(&self, contents: &str) -> u64 {
        match toml::from_str::<TotalRecord>(contents) {
            Ok(record) => record.total_seconds,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Stored total corrupt, falling back to zero");
                0
            }
        }
    }

    /// Current total for a read-modify-write.
    ///
    /// Only a corrupt file counts as zero. An existing file that cannot be
    /// read is an error, so the write never replaces a total it did not see.
    #[track_caller]
    fn read_for_update(&self) -> CoreResult<u64> {
        Ok(self
            .read_contents()?
            .map_or(0, |contents| self.parse_or_default(&contents)))
    }

    #[track_caller]
    fn write(&self, total_seconds: u64) -> CoreResult<()> {
        let write_error = |reason: String| CoreError::StorageWrite {
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        let contents = toml::to_string(&TotalRecord { total_seconds })
            .map_err(|e| write_error(format!("Failed to serialize total: {}", e)))?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .map_err(|e| write_error(format!("Failed to create {}: {}", dir.display(), e)))?;
            debug!(dir = ?dir, "Created storage directory");
        }

        let temp_path = self.path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| write_error(format!("Failed to create temp file: {}", e)))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| write_error(format!("Failed to write temp file: {}", e)))?;

        temp_file
            .sync_all()
            .map_err(|e| write_error(format!("Failed to sync temp file: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| write_error(format!("Failed to rename temp file: {}", e)))?;

        Ok(())
    }
}

impl TotalTimeStore for FileTotalStore {
    fn load(&self) -> u64 {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.read_contents() {
            Ok(contents) => contents.map_or(0, |contents| self.parse_or_default(&contents)),
            Err(e) => {
                warn!(error = %e, "Stored total unreadable, falling back to zero");
                0
            }
        }
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    fn add(&self, seconds: u64) -> CoreResult<u64> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let total = self.read_for_update()?.saturating_add(seconds);
        self.write(total)?;
        info!(added = seconds, total_seconds = total, "Total updated");
        Ok(total)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    fn adjust_by(&self, delta: i64) -> CoreResult<u64> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let total = self.read_for_update()?.saturating_add_signed(delta);
        self.write(total)?;
        info!(delta, total_seconds = total, "Total adjusted");
        Ok(total)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    fn reset(&self) -> CoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write(0)?;
        info!("Total reset to zero");
        Ok(())
    }
}
