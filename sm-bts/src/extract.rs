//! Random-access time series extraction.
//!
//! Every value is located algebraically:
//!
//! ```text
//! header_length
//!   + step * interval_stride
//!   + station_record * record_length
//!   + parameter * 4
//! ```
//!
//! where `step` counts months (or Feb-29-free days) from the period start
//! and `station_record` is the river node / well position, or for
//! reservoirs the block offset plus the account number.

use crate::codec::RecordReader;
use crate::date_range::{DayRange, MonthRange};
use crate::directory::{Station, StationCategory};
use crate::error::{BtsError, Result};
use crate::file::BinaryTimeSeriesFile;
use crate::kind::IntervalBase;
use crate::pattern::{format_tsid, TsPattern};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sm_utils::dates::{days_between_no_leap, first_of_month, months_between};
use std::collections::HashSet;
use std::fs::File;

/// Acre-feet per day of one cubic foot per second.
pub const CFS_TO_ACFT_PER_DAY: f64 = 1.9835;

/// What to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
    /// Identifier pattern, see [`TsPattern`].
    pub pattern: String,
    /// Inclusive; defaults to the file period.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// When false only metadata is returned.
    pub read_data: bool,
    /// Parameter names to keep; empty keeps all.
    pub include: Vec<String>,
    /// Parameter names to drop.
    pub exclude: Vec<String>,
    /// Match and label with the parameter names as stored.
    pub original_names: bool,
}

impl ReadRequest {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            start: None,
            end: None,
            read_data: true,
            include: Vec::new(),
            exclude: Vec::new(),
            original_names: false,
        }
    }

    pub fn with_period(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_read_data(mut self, read_data: bool) -> Self {
        self.read_data = read_data;
        self
    }

    pub fn with_include(mut self, names: Vec<String>) -> Self {
        self.include = names;
        self
    }

    pub fn with_exclude(mut self, names: Vec<String>) -> Self {
        self.exclude = names;
        self
    }

    pub fn with_original_names(mut self, original: bool) -> Self {
        self.original_names = original;
        self
    }

    fn keeps_parameter(&self, name: &str) -> bool {
        let listed = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(name));
        (self.include.is_empty() || listed(&self.include)) && !listed(&self.exclude)
    }
}

/// A single dated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One extracted series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// `Location.StateMod.Parameter.Interval`
    pub tsid: String,
    /// Station id, with `-N` for reservoir accounts other than the total.
    pub location: String,
    pub parameter: String,
    pub units: String,
    pub interval: IntervalBase,
    pub description: String,
    /// Full file period.
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
    /// Requested period clipped to the file period; `None` when the
    /// request falls entirely outside it.
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub values: Vec<DataPoint>,
}

/// Where one series lives in each interval.
#[derive(Debug, Clone, Copy)]
struct Target {
    /// Record within the interval.
    record: u64,
    parameter: usize,
}

impl BinaryTimeSeriesFile {
    /// Every identifier this file can serve.
    pub fn time_series_identifiers(&self) -> Result<Vec<String>> {
        let request = ReadRequest::new("*").with_read_data(false);
        Ok(self
            .read_time_series_list(&request)?
            .into_iter()
            .map(|ts| ts.tsid)
            .collect())
    }

    /// Read the first series matching `tsid`, if any.
    pub fn read_time_series(
        &self,
        tsid: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        read_data: bool,
    ) -> Result<Option<TimeSeries>> {
        let request = ReadRequest::new(tsid)
            .with_period(start, end)
            .with_read_data(read_data);
        Ok(self.read_time_series_list(&request)?.into_iter().next())
    }

    /// Read every series matching the request. No match is an empty list.
    pub fn read_time_series_list(&self, request: &ReadRequest) -> Result<Vec<TimeSeries>> {
        let component = self.kind().component;
        let pattern = TsPattern::parse(&request.pattern, component)?;
        let names = self.parameter_names(request.original_names);
        let period = self.clip_period(request.start, request.end);
        if self.is_closed() {
            return Err(BtsError::Closed(self.path().to_path_buf()));
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut results = Vec::new();
        let mut targets = Vec::new();
        for category in StationCategory::SEARCH_ORDER {
            if !category.searched_by(component) {
                continue;
            }
            for (position, station) in self.directory().list(category).iter().enumerate() {
                if !pattern.location.matches(&station.id) {
                    continue;
                }
                if !station.is_active() {
                    debug!("Skipping inactive reservoir {}", station.id);
                    continue;
                }
                let Some(address) = station.address_index(position) else {
                    warn!(
                        "{} {} has no usable river node position, skipping",
                        category, station.id
                    );
                    continue;
                };
                for (parameter, name) in names.iter().enumerate() {
                    if name == "NA" || !request.keeps_parameter(name) {
                        continue;
                    }
                    if !pattern.parameter.matches(name) {
                        continue;
                    }
                    if !seen.insert((address, parameter)) {
                        continue;
                    }
                    for (account, target) in self.targets(station, position, address, parameter, &pattern) {
                        results.push(self.describe(station, account, name, period));
                        targets.push(target);
                    }
                }
            }
        }
        let wanted = request.read_data && !results.is_empty();
        if let Some((start, end)) = period.filter(|_| wanted) {
            self.with_reader(|reader| {
                for (ts, &target) in results.iter_mut().zip(&targets) {
                    ts.values = self.read_values(reader, target, start, end, &ts.tsid)?;
                }
                Ok(())
            })?;
        }
        debug!(
            "Pattern {:?} matched {} time series",
            request.pattern,
            results.len()
        );
        Ok(results)
    }

    /// Accounts to emit for a matched station and where each one lives.
    fn targets(
        &self,
        station: &Station,
        position: usize,
        address: usize,
        parameter: usize,
        pattern: &TsPattern,
    ) -> Vec<(Option<usize>, Target)> {
        if station.category() != StationCategory::Reservoir {
            return vec![(
                None,
                Target {
                    record: address as u64,
                    parameter,
                },
            )];
        }

        let accounts = &self.directory().accounts;
        let (Some(&records), Some(&block)) = (
            accounts.records.get(position),
            accounts.block_offsets.get(position),
        ) else {
            return Vec::new();
        };
        let wanted: Vec<usize> = match pattern.account {
            Some(account) if account >= 1 && account < records => vec![account],
            Some(account) => {
                warn!(
                    "Reservoir {} has no account {} (valid 1..{}), skipping",
                    station.id, account, records
                );
                Vec::new()
            }
            None if pattern.location.is_wildcard() => (0..records).collect(),
            None => vec![0],
        };
        wanted
            .into_iter()
            .map(|account| {
                let label = if account == 0 { None } else { Some(account) };
                let target = Target {
                    record: (block + account) as u64,
                    parameter,
                };
                (label, target)
            })
            .collect()
    }

    fn describe(
        &self,
        station: &Station,
        account: Option<usize>,
        parameter: &str,
        period: Option<(NaiveDate, NaiveDate)>,
    ) -> TimeSeries {
        let interval = self.interval();
        let (location, description) = match account {
            Some(n) => (
                format!("{}-{}", station.id, n),
                format!("{} - Account {}", station.name, n),
            ),
            None => (station.id.clone(), station.name.clone()),
        };
        let (original_start, original_end) = self.period();
        TimeSeries {
            tsid: format_tsid(&location, parameter, &interval.to_string()),
            location,
            parameter: parameter.to_string(),
            units: interval.output_units().to_string(),
            interval,
            description,
            original_start,
            original_end,
            start: period.map(|(start, _)| start),
            end: period.map(|(_, end)| end),
            values: Vec::new(),
        }
    }

    /// Requested period intersected with the file period, `None` when empty.
    fn clip_period(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let (period_start, period_end) = self.period();
        let normalize = |date: NaiveDate| match self.interval() {
            IntervalBase::Month => first_of_month(&date),
            IntervalBase::Day => date,
        };
        let start = start.map(normalize).map_or(period_start, |d| d.max(period_start));
        let end = end.map(normalize).map_or(period_end, |d| d.min(period_end));
        (start <= end).then_some((start, end))
    }

    /// Byte offset of a value for the time step containing `date`.
    fn value_offset(&self, target: Target, date: &NaiveDate) -> u64 {
        let geometry = self.geometry();
        let (period_start, _) = self.period();
        let step = match self.interval() {
            IntervalBase::Month => months_between(&period_start, date),
            IntervalBase::Day => days_between_no_leap(&period_start, date),
        };
        geometry.header_length
            + step.max(0) as u64 * geometry.interval_stride
            + target.record * geometry.record_length
            + target.parameter as u64 * 4
    }

    fn read_values(
        &self,
        reader: &mut RecordReader<File>,
        target: Target,
        start: NaiveDate,
        end: NaiveDate,
        tsid: &str,
    ) -> Result<Vec<DataPoint>> {
        let dates: Box<dyn Iterator<Item = NaiveDate>> = match self.interval() {
            IntervalBase::Month => Box::new(MonthRange::new(start, end)),
            IntervalBase::Day => Box::new(DayRange(start, end)),
        };
        let mut values = Vec::new();
        for date in dates {
            let offset = self.value_offset(target, &date);
            let raw = match reader.read_f32_at(offset) {
                Ok(raw) => raw,
                Err(e @ BtsError::Truncated { .. }) => {
                    warn!(
                        "{}: stopping at {} after {} values: {}",
                        tsid,
                        date,
                        values.len(),
                        e
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            values.push(DataPoint {
                date,
                value: self.convert(raw, &date),
            });
        }
        Ok(values)
    }

    /// Monthly flow (CFS) becomes volume (ACFT); daily values pass through.
    fn convert(&self, raw: f32, date: &NaiveDate) -> f64 {
        match self.interval() {
            IntervalBase::Month => {
                let days = self.header().days_in_calendar_month(date.month());
                raw as f64 * CFS_TO_ACFT_PER_DAY * days as f64
            }
            IntervalBase::Day => raw as f64,
        }
    }
}
