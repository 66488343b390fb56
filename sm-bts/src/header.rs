//! Decoding of the fixed header records.
//!
//! Read order: version record (11.0 and later), year range, counts, month
//! names, days per month, station records, parameter blocks.

use crate::codec::RecordReader;
use crate::directory::{ParameterTable, StationDirectory};
use crate::error::{BtsError, Result};
use crate::geometry::{self, Geometry, HeaderCounts, HeaderLayout};
use crate::kind::{FileKind, IntervalBase};
use crate::legacy::LegacyParameters;
use crate::version::{self, FormatVersion, VersionInfo};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sm_utils::dates::{days_in_month, first_of_month, YearType};
use std::io::{Read, Seek};

const MONTH_NAME_COUNT: usize = 14;
const MONTH_NAME_LENGTH: usize = 4;

/// How much of the header to trust.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Reject inconsistent headers instead of logging a warning and
    /// trusting the declared counts.
    pub strict: bool,
}

impl OpenOptions {
    pub fn strict() -> Self {
        OpenOptions { strict: true }
    }

    fn check(&self, problem: String) -> Result<()> {
        if self.strict {
            Err(BtsError::InvalidHeader(problem))
        } else {
            warn!("Header inconsistency (ignored): {}", problem);
            Ok(())
        }
    }
}

/// Header values fixed for the lifetime of an open file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub version: VersionInfo,
    pub kind: FileKind,
    pub start_year: i32,
    pub end_year: i32,
    pub year_type: YearType,
    pub month_names: Vec<String>,
    /// Days per month in calendar order (January first), as stored.
    pub month_days: [u32; 12],
    pub counts: HeaderCounts,
    pub layout: HeaderLayout,
    pub geometry: Geometry,
    /// First time step; the first of the month for monthly files.
    pub period_start: NaiveDate,
    /// Last time step; the first of the month for monthly files.
    pub period_end: NaiveDate,
}

impl Header {
    /// Stored days for a calendar month (1-12).
    pub fn days_in_calendar_month(&self, month: u32) -> u32 {
        self.month_days[(month as usize + 11) % 12]
    }
}

/// Everything decoded at open.
#[derive(Debug, Clone)]
pub struct DecodedHeader {
    pub header: Header,
    pub directory: StationDirectory,
    pub parameters: ParameterTable,
}

/// Decode the whole header region of a file of `kind`.
pub fn read_header<R: Read + Seek>(
    reader: &mut RecordReader<R>,
    kind: FileKind,
    options: &OpenOptions,
    legacy: &dyn LegacyParameters,
) -> Result<DecodedHeader> {
    let version = version::detect(reader)?;
    let modern = version.version.is_at_least(&FormatVersion::V11);
    let record_length = geometry::record_length(kind, &version.version);
    let metadata_records = version.generation.metadata_records();
    debug!(
        "{} file, version {}, record length {}",
        kind, version.version, record_length
    );

    let years_offset = metadata_records * record_length;
    let start_year = reader.read_i32_at(years_offset)?;
    let end_year = reader.read_i32_at(years_offset + 4)?;
    if end_year < start_year {
        options.check(format!("end year {} before start year {}", end_year, start_year))?;
    }

    let counts = read_counts(reader, (metadata_records + 1) * record_length, modern, options)?;
    let parameter_count = counts.parameters_for(kind.component);
    let layout = HeaderLayout::new(
        metadata_records,
        &counts,
        modern,
        record_length,
        parameter_count,
    );

    let month_names = (0..MONTH_NAME_COUNT as u64)
        .map(|i| {
            let offset = layout.month_names * record_length + i * MONTH_NAME_LENGTH as u64;
            reader.read_string_at(offset, MONTH_NAME_LENGTH)
        })
        .collect::<Result<Vec<String>>>()?;
    let first_month = month_names.first().map(String::as_str).unwrap_or_default();
    let year_type = match YearType::from_first_month(first_month) {
        Some(year_type) => year_type,
        None => {
            options.check(format!("unrecognized first month {:?}", first_month))?;
            YearType::Calendar
        }
    };

    let mut month_days = [0u32; 12];
    for position in 0..12u64 {
        let stored = reader.read_i32_at(layout.month_days * record_length + position * 4)?;
        let month = year_type.calendar_month(position as usize);
        month_days[month as usize - 1] = if (28..=31).contains(&stored) {
            stored as u32
        } else {
            options.check(format!("month {} has {} days", month, stored))?;
            // non-leap calendar length
            days_in_month(1999, month)
        };
    }

    let directory = StationDirectory::read(reader, &layout, &counts, record_length)?;
    for problem in directory.problems(&counts) {
        options.check(problem)?;
    }

    let parameters = if modern {
        if parameter_count > counts.max_parameters {
            options.check(format!(
                "{} parameters exceed block length {}",
                parameter_count, counts.max_parameters
            ))?;
        }
        ParameterTable::read(
            reader,
            &layout,
            &counts,
            kind.component,
            &version.version,
            record_length,
        )?
    } else {
        match legacy.parameters(kind.component, &version.version) {
            Some(names) => ParameterTable::from_legacy(names, kind.interval.output_units()),
            None => {
                options.check(format!(
                    "no parameter list for {:?} version {}",
                    kind.component, version.version
                ))?;
                ParameterTable::default()
            }
        }
    };
    if parameters.len() as u64 * 4 > record_length {
        options.check(format!(
            "{} parameters do not fit a {}-byte record",
            parameters.len(),
            record_length
        ))?;
    }

    let stations_per_interval =
        geometry::records_per_interval(kind.component, &counts, &directory.accounts);
    let geometry = Geometry::new(record_length, &layout, stations_per_interval);
    debug!(
        "Header length {} bytes, interval stride {} bytes",
        geometry.header_length, geometry.interval_stride
    );

    let file_length = reader.len()?;
    if file_length < geometry.header_length {
        options.check(format!(
            "file length {} shorter than header length {}",
            file_length, geometry.header_length
        ))?;
    }

    let (period_start, period_end) = period(year_type, kind.interval, start_year, end_year)?;

    Ok(DecodedHeader {
        header: Header {
            version,
            kind,
            start_year,
            end_year,
            year_type,
            month_names,
            month_days,
            counts,
            layout,
            geometry,
            period_start,
            period_end,
        },
        directory,
        parameters,
    })
}

fn read_counts<R: Read + Seek>(
    reader: &mut RecordReader<R>,
    offset: u64,
    modern: bool,
    options: &OpenOptions,
) -> Result<HeaderCounts> {
    const LABELS: [&str; 13] = [
        "river node",
        "diversion",
        "instream flow",
        "reservoir",
        "reservoir owner",
        "active reservoir",
        "baseflow",
        "well",
        "internal",
        "max parameter",
        "diversion parameter",
        "reservoir parameter",
        "well parameter",
    ];
    let n = if modern { LABELS.len() } else { 9 };
    let mut values = [0usize; 13];
    for (i, label) in LABELS.iter().enumerate().take(n) {
        let raw = reader.read_i32_at(offset + 4 * i as u64)?;
        values[i] = if raw < 0 {
            options.check(format!("negative {} count {}", label, raw))?;
            0
        } else {
            raw as usize
        };
    }
    Ok(HeaderCounts {
        river_nodes: values[0],
        diversions: values[1],
        instream_flows: values[2],
        reservoirs: values[3],
        reservoir_owners: values[4],
        active_reservoirs: values[5],
        baseflows: values[6],
        wells: values[7],
        internal: values[8],
        max_parameters: values[9],
        diversion_parameters: values[10],
        reservoir_parameters: values[11],
        well_parameters: values[12],
    })
}

/// First and last time steps for a year range.
pub fn period(
    year_type: YearType,
    interval: IntervalBase,
    start_year: i32,
    end_year: i32,
) -> Result<(NaiveDate, NaiveDate)> {
    let start = year_type
        .year_start(start_year)
        .ok_or_else(|| BtsError::InvalidHeader(format!("start year {} out of range", start_year)))?;
    let last_day = year_type
        .year_end(end_year)
        .ok_or_else(|| BtsError::InvalidHeader(format!("end year {} out of range", end_year)))?;
    let end = match interval {
        IntervalBase::Month => first_of_month(&last_day),
        IntervalBase::Day => last_day,
    };
    Ok((start, end))
}
