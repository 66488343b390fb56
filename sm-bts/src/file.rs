//! An open binary output file.

use crate::codec::RecordReader;
use crate::directory::{ParameterTable, StationCategory, StationDirectory};
use crate::error::{BtsError, Result};
use crate::geometry::{Geometry, HeaderCounts};
use crate::header::{read_header, Header, OpenOptions};
use crate::kind::{FileKind, IntervalBase};
use crate::legacy::{LegacyParameters, StaticLegacyParameters};
use crate::version::{FormatVersion, HeaderGeneration};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use sm_utils::dates::{format_date, YearType};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A StateMod binary output file with its header decoded.
///
/// The header, station directory and parameter table never change after
/// open. Reads seek on a single file handle guarded by a mutex, so one
/// instance can be shared between threads. Closing drops the handle even
/// while other clones of a shared instance are alive.
#[derive(Debug)]
pub struct BinaryTimeSeriesFile {
    path: PathBuf,
    header: Header,
    directory: StationDirectory,
    parameters: ParameterTable,
    reader: Mutex<Option<RecordReader<File>>>,
    closed: AtomicBool,
}

impl BinaryTimeSeriesFile {
    /// Open with lenient header checks and the built-in legacy parameter table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &OpenOptions::default(), &StaticLegacyParameters)
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        options: &OpenOptions,
        legacy: &dyn LegacyParameters,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let kind = FileKind::from_path(&path)?;
        let mut reader = RecordReader::new(File::open(&path)?);
        let decoded = read_header(&mut reader, kind, options, legacy)?;
        info!(
            "Opened {} ({}, version {}, {} to {})",
            path.display(),
            kind,
            decoded.header.version.version,
            decoded.header.period_start,
            decoded.header.period_end
        );
        Ok(BinaryTimeSeriesFile {
            path,
            header: decoded.header,
            directory: decoded.directory,
            parameters: decoded.parameters,
            reader: Mutex::new(Some(reader)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    /// Parameter names, corrected (`original = false`) or as stored.
    pub fn parameter_names(&self, original: bool) -> &[String] {
        self.parameters.names(original)
    }

    pub fn version(&self) -> &FormatVersion {
        &self.header.version.version
    }

    pub fn is_version_at_least(&self, version: &FormatVersion) -> bool {
        self.header.version.version.is_at_least(version)
    }

    pub fn kind(&self) -> FileKind {
        self.header.kind
    }

    pub fn interval(&self) -> IntervalBase {
        self.header.kind.interval
    }

    pub fn geometry(&self) -> &Geometry {
        &self.header.geometry
    }

    pub fn period(&self) -> (NaiveDate, NaiveDate) {
        (self.header.period_start, self.header.period_end)
    }

    /// Release the file handle; reads after this fail with `Closed`.
    /// Waits for a read in progress to finish.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.slot().take();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run a sequence of reads with exclusive access to the file handle.
    pub(crate) fn with_reader<T>(
        &self,
        read: impl FnOnce(&mut RecordReader<File>) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.slot();
        match slot.as_mut() {
            Some(reader) => read(reader),
            None => Err(BtsError::Closed(self.path.clone())),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<RecordReader<File>>> {
        // a panic mid-read leaves no partial state behind: every read seeks first
        self.reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn summary(&self) -> HeaderSummary {
        let h = &self.header;
        HeaderSummary {
            path: self.path.clone(),
            program: h.version.program.clone(),
            version: h.version.version.to_string(),
            generation: h.version.generation,
            created: h.version.created.clone(),
            kind: h.kind,
            year_type: h.year_type,
            start_year: h.start_year,
            end_year: h.end_year,
            period_start: h.period_start,
            period_end: h.period_end,
            counts: h.counts.clone(),
            geometry: h.geometry,
            parameters: self.parameters.len(),
        }
    }
}

impl fmt::Display for BinaryTimeSeriesFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        writeln!(f, "File:            {}", self.path.display())?;
        writeln!(
            f,
            "Program:         {} {} ({})",
            h.version.program, h.version.version, h.version.created
        )?;
        writeln!(f, "Kind:            {}", h.kind)?;
        writeln!(
            f,
            "Period:          {} to {} ({} year {}-{})",
            format_date(&h.period_start),
            format_date(&h.period_end),
            h.year_type,
            h.start_year,
            h.end_year
        )?;
        for category in StationCategory::SEARCH_ORDER {
            writeln!(
                f,
                "{:<16} {}",
                format!("{}s:", category),
                self.directory.list(category).len()
            )?;
        }
        writeln!(f, "Parameters:      {}", self.parameters.len())?;
        writeln!(f, "Record length:   {}", h.geometry.record_length)?;
        writeln!(f, "Header length:   {}", h.geometry.header_length)?;
        write!(f, "Interval stride: {}", h.geometry.interval_stride)
    }
}

/// Serializable header overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderSummary {
    pub path: PathBuf,
    pub program: String,
    pub version: String,
    pub generation: HeaderGeneration,
    pub created: String,
    pub kind: FileKind,
    pub year_type: YearType,
    pub start_year: i32,
    pub end_year: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub counts: HeaderCounts,
    pub geometry: Geometry,
    pub parameters: usize,
}
