//! Synthetic binary output files for integration tests.
#![allow(dead_code)]

use sm_bts::{Component, FileKind, IntervalBase};
use sm_utils::dates::MONTH_ABBREVIATIONS;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const NON_LEAP_DAYS: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// How record 0 is written.
#[derive(Debug, Clone, Copy)]
pub enum HeaderStyle {
    /// No metadata record.
    Pre11,
    /// Program, float version, date.
    Float(f32),
    /// Program, text version, date.
    Text(&'static str),
}

#[derive(Debug, Clone)]
pub struct StationSpec {
    pub id: String,
    pub name: String,
    pub river_node: i32,
}

#[derive(Debug, Clone)]
pub struct ReservoirSpec {
    pub id: String,
    pub name: String,
    pub river_node: i32,
    pub active: bool,
    pub accounts: usize,
}

pub fn station(id: &str, river_node: i32) -> StationSpec {
    StationSpec {
        id: id.to_string(),
        name: format!("{} name", id),
        river_node,
    }
}

pub fn reservoir(id: &str, active: bool, accounts: usize) -> ReservoirSpec {
    ReservoirSpec {
        id: id.to_string(),
        name: format!("{} name", id),
        river_node: 1,
        active,
        accounts,
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Default stored value: recoverable time step, record and parameter.
pub fn encode(step: usize, record: usize, parameter: usize) -> f32 {
    (step * 10_000 + record * 100 + parameter) as f32
}

/// Description of one synthetic file.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub kind: FileKind,
    pub style: HeaderStyle,
    pub start_year: i32,
    pub end_year: i32,
    /// Calendar month the stored year starts with (1, 10 or 11).
    pub first_month: usize,
    pub river_nodes: Vec<StationSpec>,
    pub diversions: Vec<StationSpec>,
    pub instream_flows: Vec<StationSpec>,
    pub reservoirs: Vec<ReservoirSpec>,
    pub baseflows: Vec<StationSpec>,
    pub wells: Vec<StationSpec>,
    pub diversion_parameters: Vec<String>,
    pub reservoir_parameters: Vec<String>,
    pub well_parameters: Vec<String>,
    pub unit: &'static str,
    /// Intervals of data to write; `None` writes the full period.
    pub intervals: Option<usize>,
    pub values: fn(usize, usize, usize) -> f32,
}

impl Fixture {
    pub fn new(kind: FileKind, style: HeaderStyle, start_year: i32, end_year: i32) -> Self {
        Fixture {
            kind,
            style,
            start_year,
            end_year,
            first_month: 1,
            river_nodes: Vec::new(),
            diversions: Vec::new(),
            instream_flows: Vec::new(),
            reservoirs: Vec::new(),
            baseflows: Vec::new(),
            wells: Vec::new(),
            diversion_parameters: Vec::new(),
            reservoir_parameters: Vec::new(),
            well_parameters: Vec::new(),
            unit: "CFS",
            intervals: None,
            values: encode,
        }
    }

    pub fn modern(&self) -> bool {
        !matches!(self.style, HeaderStyle::Pre11)
    }

    pub fn record_length(&self) -> usize {
        match (self.kind.component, self.kind.interval, self.modern()) {
            (Component::Diversion, IntervalBase::Month, false) => 140,
            (Component::Diversion, IntervalBase::Day, false) => 144,
            (Component::Reservoir, _, false) => 96,
            (Component::Well, _, _) => 92,
            (_, _, true) => 160,
        }
    }

    pub fn parameters(&self) -> &[String] {
        match self.kind.component {
            Component::Diversion => &self.diversion_parameters,
            Component::Reservoir => &self.reservoir_parameters,
            Component::Well => &self.well_parameters,
        }
    }

    pub fn records_per_interval(&self) -> usize {
        match self.kind.component {
            Component::Diversion => self.river_nodes.len(),
            Component::Reservoir => self
                .reservoirs
                .iter()
                .map(|r| r.accounts + usize::from(r.active))
                .sum(),
            Component::Well => self.wells.len(),
        }
    }

    pub fn full_intervals(&self) -> usize {
        let years = (self.end_year - self.start_year + 1).max(0) as usize;
        match self.kind.interval {
            IntervalBase::Month => years * 12,
            IntervalBase::Day => years * 365,
        }
    }

    fn max_parameters(&self) -> usize {
        [
            self.diversion_parameters.len(),
            self.reservoir_parameters.len(),
            self.well_parameters.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = Records::new(self.record_length());

        match self.style {
            HeaderStyle::Pre11 => {}
            HeaderStyle::Float(version) => {
                let r = out.next();
                put_str(r, 0, 8, "StateMod");
                put_f32(r, 8, version);
                put_str(r, 12, 10, "2004/01/15");
            }
            HeaderStyle::Text(version) => {
                let r = out.next();
                put_str(r, 0, 8, "StateMod");
                put_str(r, 8, 8, version);
                put_str(r, 16, 10, "2019/06/01");
            }
        }

        let r = out.next();
        put_i32(r, 0, self.start_year);
        put_i32(r, 4, self.end_year);

        let owners: usize = self.reservoirs.iter().map(|r| r.accounts).sum();
        let active = self.reservoirs.iter().filter(|r| r.active).count();
        let mut counts = vec![
            self.river_nodes.len(),
            self.diversions.len(),
            self.instream_flows.len(),
            self.reservoirs.len(),
            owners,
            active,
            self.baseflows.len(),
            self.wells.len(),
            0,
        ];
        if self.modern() {
            counts.extend([
                self.max_parameters(),
                self.diversion_parameters.len(),
                self.reservoir_parameters.len(),
                self.well_parameters.len(),
            ]);
        }
        let r = out.next();
        for (i, count) in counts.iter().enumerate() {
            put_i32(r, i * 4, *count as i32);
        }

        let r = out.next();
        for i in 0..12 {
            let name = MONTH_ABBREVIATIONS[(self.first_month - 1 + i) % 12];
            put_str(r, i * 4, 4, name);
        }
        put_str(r, 48, 4, "AVE");
        put_str(r, 52, 4, "TOT");

        let r = out.next();
        for i in 0..12 {
            put_i32(r, i * 4, NON_LEAP_DAYS[(self.first_month - 1 + i) % 12]);
        }

        for (i, s) in self.river_nodes.iter().enumerate() {
            let r = out.next();
            put_i32(r, 0, i as i32 + 1);
            put_str(r, 4, 12, &s.id);
            put_str(r, 16, 24, &s.name);
        }
        for list in [&self.diversions, &self.instream_flows] {
            write_stations(&mut out, list);
        }
        let mut pointer = 1;
        for (i, res) in self.reservoirs.iter().enumerate() {
            let r = out.next();
            put_i32(r, 0, i as i32 + 1);
            put_str(r, 4, 12, &res.id);
            put_str(r, 16, 24, &res.name);
            put_i32(r, 40, res.river_node);
            put_i32(r, 44, i32::from(res.active));
            put_i32(r, 48, pointer);
            pointer += res.accounts as i32;
        }
        let sentinel = out.next();
        put_i32(sentinel, 48, pointer);
        for list in [&self.baseflows, &self.wells] {
            write_stations(&mut out, list);
        }

        if self.modern() {
            let max = self.max_parameters();
            for block in [
                &self.diversion_parameters,
                &self.reservoir_parameters,
                &self.well_parameters,
            ] {
                for i in 0..max {
                    let r = out.next();
                    put_i32(r, 0, i as i32 + 1);
                    if let Some(name) = block.get(i) {
                        put_str(r, 4, 24, name);
                    }
                }
            }
            let n = self.parameters().len();
            let length = self.record_length();
            let blocks = (n * 4).div_ceil(length).max(1);
            let mut units = vec![0u8; blocks * length];
            for i in 0..n {
                put_str(&mut units, i * 4, 4, self.unit);
            }
            out.bytes.extend(units);
        }

        out.bytes
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Records::new(self.record_length());
        out.bytes = self.header_bytes();
        let parameters = self.parameters().len();
        for step in 0..self.intervals.unwrap_or_else(|| self.full_intervals()) {
            for record in 0..self.records_per_interval() {
                let r = out.next();
                for p in 0..parameters {
                    put_f32(r, p * 4, (self.values)(step, record, p));
                }
            }
        }
        out.bytes
    }

    /// Write to a fresh temp dir with the extension matching `kind`.
    pub fn write(&self) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("fixture.{}", extension(self.kind)));
        fs::write(&path, self.bytes()).unwrap();
        (dir, path)
    }
}

pub fn extension(kind: FileKind) -> &'static str {
    match (kind.component, kind.interval) {
        (Component::Diversion, IntervalBase::Month) => "b43",
        (Component::Diversion, IntervalBase::Day) => "b49",
        (Component::Reservoir, IntervalBase::Month) => "b44",
        (Component::Reservoir, IntervalBase::Day) => "b50",
        (Component::Well, IntervalBase::Month) => "b42",
        (Component::Well, IntervalBase::Day) => "b65",
    }
}

struct Records {
    length: usize,
    bytes: Vec<u8>,
}

impl Records {
    fn new(length: usize) -> Self {
        Records {
            length,
            bytes: Vec::new(),
        }
    }

    /// Append a zeroed record and return it.
    fn next(&mut self) -> &mut [u8] {
        let start = self.bytes.len();
        self.bytes.resize(start + self.length, 0);
        &mut self.bytes[start..]
    }
}

fn write_stations(out: &mut Records, list: &[StationSpec]) {
    for (i, s) in list.iter().enumerate() {
        let r = out.next();
        put_i32(r, 0, i as i32 + 1);
        put_str(r, 4, 12, &s.id);
        put_str(r, 16, 24, &s.name);
        put_i32(r, 40, s.river_node);
    }
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Space-padded fixed-width string.
fn put_str(buf: &mut [u8], offset: usize, len: usize, text: &str) {
    let bytes = text.as_bytes();
    for i in 0..len {
        buf[offset + i] = bytes.get(i).copied().unwrap_or(b' ');
    }
}
