//! Open-handle registry keyed by canonical path.

use crate::error::Result;
use crate::extract::{ReadRequest, TimeSeries};
use crate::file::BinaryTimeSeriesFile;
use crate::header::OpenOptions;
use crate::legacy::{LegacyParameters, StaticLegacyParameters};
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Reuses decoded headers across repeated opens of the same file.
///
/// Handles are shared as `Arc`s; closing one removes it from the registry
/// and makes further reads through any clone fail with `Closed`.
#[derive(Debug, Default)]
pub struct Registry {
    files: Mutex<HashMap<PathBuf, Arc<BinaryTimeSeriesFile>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, path: impl AsRef<Path>) -> Result<Arc<BinaryTimeSeriesFile>> {
        self.open_with(path, &OpenOptions::default(), &StaticLegacyParameters)
    }

    /// Return the registered handle for `path`, opening it on first use.
    /// `options` and `legacy` only apply when the file is actually opened.
    ///
    /// The header is decoded without holding the registry lock. When two
    /// threads open the same new file at once, the first to register wins
    /// and the other's handle is closed.
    pub fn open_with(
        &self,
        path: impl AsRef<Path>,
        options: &OpenOptions,
        legacy: &dyn LegacyParameters,
    ) -> Result<Arc<BinaryTimeSeriesFile>> {
        let key = path.as_ref().canonicalize()?;
        if let Some(file) = self.get_canonical(&key) {
            info!("Reusing open handle for {}", key.display());
            return Ok(file);
        }
        let opened = Arc::new(BinaryTimeSeriesFile::open_with(&key, options, legacy)?);
        let registered = Arc::clone(
            self.lock()
                .entry(key)
                .or_insert_with(|| Arc::clone(&opened)),
        );
        if !Arc::ptr_eq(&registered, &opened) {
            debug!("{} was registered concurrently", opened.path().display());
            opened.mark_closed();
        }
        Ok(registered)
    }

    /// Registered handle for `path`, without opening.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<BinaryTimeSeriesFile>> {
        let key = path.as_ref().canonicalize().ok()?;
        self.get_canonical(&key)
    }

    fn get_canonical(&self, key: &Path) -> Option<Arc<BinaryTimeSeriesFile>> {
        self.lock().get(key).cloned()
    }

    /// Close and unregister. Returns false when the path was not open.
    pub fn close(&self, path: impl AsRef<Path>) -> bool {
        let Ok(key) = path.as_ref().canonicalize() else {
            return false;
        };
        match self.lock().remove(&key) {
            Some(file) => {
                file.mark_closed();
                info!("Closed {}", key.display());
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        let mut files = self.lock();
        for (path, file) in files.drain() {
            file.mark_closed();
            info!("Closed {}", path.display());
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Open (or reuse) `path` and run one request against it.
    pub fn read_time_series_list(
        &self,
        path: impl AsRef<Path>,
        request: &ReadRequest,
    ) -> Result<Vec<TimeSeries>> {
        self.open(path)?.read_time_series_list(request)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<BinaryTimeSeriesFile>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.close_all();
    }
}
