//! Random-access reader for StateMod binary time series output files
//! (`.b43`/`.b49` diversion, `.b44`/`.b50` reservoir, `.b42`/`.b65` well).
//!
//! Opening a file decodes its header once: the format version, the fixed
//! record geometry, the station directory and the parameter table. Every
//! value after that is read with a single seek.
//!
//! ```no_run
//! use sm_bts::{BinaryTimeSeriesFile, ReadRequest};
//!
//! let file = BinaryTimeSeriesFile::open("model.b43")?;
//! let request = ReadRequest::new("08*.StateMod.Total_Supply");
//! for ts in file.read_time_series_list(&request)? {
//!     println!("{} {} values", ts.tsid, ts.values.len());
//! }
//! # Ok::<(), sm_bts::BtsError>(())
//! ```
pub mod codec;
pub mod date_range;
pub mod directory;
pub mod error;
pub mod extract;
pub mod file;
pub mod geometry;
pub mod header;
pub mod kind;
pub mod legacy;
pub mod pattern;
pub mod registry;
pub mod version;

pub use directory::{ParameterTable, Station, StationCategory, StationDirectory, StationKind};
pub use error::{BtsError, Result};
pub use extract::{DataPoint, ReadRequest, TimeSeries, CFS_TO_ACFT_PER_DAY};
pub use file::{BinaryTimeSeriesFile, HeaderSummary};
pub use geometry::Geometry;
pub use header::{Header, OpenOptions};
pub use kind::{Component, FileKind, IntervalBase};
pub use legacy::{LegacyParameters, StaticLegacyParameters};
pub use pattern::TsPattern;
pub use registry::Registry;
pub use version::{FormatVersion, HeaderGeneration};
