//! Time series extraction to CSV.

use anyhow::Context;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use sm_bts::{BinaryTimeSeriesFile, ReadRequest, TimeSeries};
use sm_utils::dates::{format_date, parse_date_or_month};
use std::io::Write;
use std::path::Path;

/// Arguments of the `read` command.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub tsid: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub original: bool,
}

impl ReadOptions {
    pub fn to_request(&self) -> anyhow::Result<ReadRequest> {
        Ok(ReadRequest::new(self.tsid.as_str())
            .with_period(parse_bound(&self.start)?, parse_bound(&self.end)?)
            .with_include(self.include.clone())
            .with_exclude(self.exclude.clone())
            .with_original_names(self.original))
    }
}

fn parse_bound(text: &Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    text.as_deref()
        .map(|s| parse_date_or_month(s).with_context(|| format!("invalid date {:?}", s)))
        .transpose()
}

#[derive(Debug, Serialize)]
struct ValueRow<'a> {
    tsid: &'a str,
    date: String,
    value: f64,
    unit: &'a str,
}

/// Write matching series as CSV (`tsid,date,value,unit`).
pub fn run_read(path: &Path, options: &ReadOptions, out: impl Write) -> anyhow::Result<()> {
    let file = BinaryTimeSeriesFile::open(path)?;
    let request = options.to_request()?;
    let series = file.read_time_series_list(&request)?;
    let rows = write_values(&series, out)?;
    info!(
        "Read {} time series ({} values) matching {:?}",
        series.len(),
        rows,
        options.tsid
    );
    Ok(())
}

fn write_values(series: &[TimeSeries], out: impl Write) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    let mut rows = 0;
    for ts in series {
        for point in &ts.values {
            writer.serialize(ValueRow {
                tsid: &ts.tsid,
                date: format_date(&point.date),
                value: point.value,
                unit: &ts.units,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// Print every identifier the file can serve, one per line.
pub fn run_list(path: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    let file = BinaryTimeSeriesFile::open(path)?;
    for tsid in file.time_series_identifiers()? {
        writeln!(out, "{}", tsid)?;
    }
    Ok(())
}
