//! Record length, header layout and per-interval stride.
//!
//! The file is a Fortran direct-access file: every header entry and every
//! data record occupies exactly one fixed-length record, so all positions
//! are computed from counts rather than found by scanning.

use crate::kind::{Component, FileKind, IntervalBase};
use crate::version::FormatVersion;
use log::warn;
use serde::{Deserialize, Serialize};

/// Bytes per record for a file kind and version.
pub fn record_length(kind: FileKind, version: &FormatVersion) -> u64 {
    let modern = version.is_at_least(&FormatVersion::V11);
    match (kind.component, kind.interval, modern) {
        (Component::Diversion, IntervalBase::Month, false) => 140,
        (Component::Diversion, IntervalBase::Day, false) => 144,
        (Component::Diversion, _, true) => 160,
        (Component::Reservoir, _, false) => 96,
        (Component::Reservoir, _, true) => 160,
        (Component::Well, _, _) => 92,
    }
}

/// Station and parameter counts from the counts record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCounts {
    pub river_nodes: usize,
    pub diversions: usize,
    pub instream_flows: usize,
    pub reservoirs: usize,
    pub reservoir_owners: usize,
    pub active_reservoirs: usize,
    pub baseflows: usize,
    pub wells: usize,
    /// Written by the model for its own bookkeeping; unused for addressing.
    pub internal: usize,
    /// Length of each in-file parameter name block (11.0 and later).
    pub max_parameters: usize,
    pub diversion_parameters: usize,
    pub reservoir_parameters: usize,
    pub well_parameters: usize,
}

impl HeaderCounts {
    /// Number of parameters stored per data record for a component.
    pub fn parameters_for(&self, component: Component) -> usize {
        match component {
            Component::Diversion => self.diversion_parameters,
            Component::Reservoir => self.reservoir_parameters,
            Component::Well => self.well_parameters,
        }
    }
}

/// Record index of every header section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLayout {
    pub years: u64,
    pub counts: u64,
    pub month_names: u64,
    pub month_days: u64,
    pub river_nodes: u64,
    pub diversions: u64,
    pub instream_flows: u64,
    /// Reservoir records, followed by one sentinel record.
    pub reservoirs: u64,
    pub baseflows: u64,
    pub wells: u64,
    /// Three name blocks (diversion, reservoir, well), `max_parameters` each.
    pub parameter_names: Option<u64>,
    pub units: Option<u64>,
    /// Total header records; data starts right after.
    pub total_records: u64,
}

impl HeaderLayout {
    /// Lay out the header. `parameter_count` is the open file's own
    /// component count and only sizes the unit block.
    pub fn new(
        metadata_records: u64,
        counts: &HeaderCounts,
        has_parameter_blocks: bool,
        record_length: u64,
        parameter_count: usize,
    ) -> HeaderLayout {
        let years = metadata_records;
        let counts_record = years + 1;
        let month_names = counts_record + 1;
        let month_days = month_names + 1;
        let river_nodes = month_days + 1;
        let diversions = river_nodes + counts.river_nodes as u64;
        let instream_flows = diversions + counts.diversions as u64;
        let reservoirs = instream_flows + counts.instream_flows as u64;
        let baseflows = reservoirs + counts.reservoirs as u64 + 1;
        let wells = baseflows + counts.baseflows as u64;
        let stations_end = wells + counts.wells as u64;

        let (parameter_names, units, total_records) = if has_parameter_blocks {
            let units = stations_end + 3 * counts.max_parameters as u64;
            let total = units + unit_block_records(parameter_count, record_length);
            (Some(stations_end), Some(units), total)
        } else {
            (None, None, stations_end)
        };

        HeaderLayout {
            years,
            counts: counts_record,
            month_names,
            month_days,
            river_nodes,
            diversions,
            instream_flows,
            reservoirs,
            baseflows,
            wells,
            parameter_names,
            units,
            total_records,
        }
    }
}

/// Records used by the unit block: 4 bytes per parameter, at least one record.
pub fn unit_block_records(parameter_count: usize, record_length: u64) -> u64 {
    if record_length == 0 {
        return 1;
    }
    let bytes = parameter_count as u64 * 4;
    bytes.div_ceil(record_length).max(1)
}

/// Account bookkeeping for reservoir files.
///
/// Within each interval the active reservoirs' blocks come first, in
/// reservoir order, each holding a total record followed by one record per
/// account. Inactive reservoirs have no total record and their account
/// blocks are moved after all active blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservoirAccounts {
    /// Accounts per reservoir, total excluded.
    pub accounts: Vec<usize>,
    /// Records per reservoir: accounts plus the total when active.
    pub records: Vec<usize>,
    /// Running sum of `records` in reservoir order, inclusive.
    pub cumulative: Vec<usize>,
    /// Records preceding each reservoir's block with inactive blocks moved
    /// to the end. This is the table used for addressing.
    pub block_offsets: Vec<usize>,
}

impl ReservoirAccounts {
    /// Derive the tables from the stored owner pointers (one more pointer
    /// than reservoirs) and the active switches.
    pub fn from_pointers(pointers: &[i32], active: &[bool]) -> ReservoirAccounts {
        let count = active.len().min(pointers.len().saturating_sub(1));
        let mut accounts = Vec::with_capacity(count);
        let mut records = Vec::with_capacity(count);
        let mut cumulative = Vec::with_capacity(count);
        let mut running = 0usize;
        for i in 0..count {
            let n = match pointers[i + 1].checked_sub(pointers[i]) {
                Some(diff) if diff >= 0 => diff as usize,
                _ => {
                    warn!(
                        "Reservoir {} owner pointers unusable ({} -> {}), using 0 accounts",
                        i + 1,
                        pointers[i],
                        pointers[i + 1]
                    );
                    0
                }
            };
            let r = n + usize::from(active[i]);
            running += r;
            accounts.push(n);
            records.push(r);
            cumulative.push(running);
        }

        let active_total: usize = (0..count).filter(|&i| active[i]).map(|i| records[i]).sum();
        let mut active_running = 0usize;
        let mut inactive_running = active_total;
        let mut block_offsets = Vec::with_capacity(count);
        for i in 0..count {
            if active[i] {
                block_offsets.push(active_running);
                active_running += records[i];
            } else {
                block_offsets.push(inactive_running);
                inactive_running += records[i];
            }
        }

        ReservoirAccounts {
            accounts,
            records,
            cumulative,
            block_offsets,
        }
    }

    /// Records one interval spans, inactive accounts included.
    pub fn records_per_interval(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }
}

/// Sizes fixed at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub record_length: u64,
    pub header_records: u64,
    /// Byte offset of the first data record.
    pub header_length: u64,
    /// Bytes spanned by one month (or day) across all stations.
    pub interval_stride: u64,
}

impl Geometry {
    /// `stations_per_interval` is river nodes, reservoir records or wells
    /// depending on the component; see [`records_per_interval`].
    pub fn new(record_length: u64, layout: &HeaderLayout, stations_per_interval: usize) -> Self {
        Geometry {
            record_length,
            header_records: layout.total_records,
            header_length: record_length * layout.total_records,
            interval_stride: record_length * stations_per_interval as u64,
        }
    }
}

/// Data records per interval for a component.
pub fn records_per_interval(
    component: Component,
    counts: &HeaderCounts,
    reservoirs: &ReservoirAccounts,
) -> usize {
    match component {
        Component::Diversion => counts.river_nodes,
        // Naive cumulative count: inactive accounts keep their slots.
        Component::Reservoir => reservoirs.records_per_interval(),
        Component::Well => counts.wells,
    }
}
