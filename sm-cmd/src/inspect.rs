//! Header, station and parameter listings.

use log::info;
use serde::Serialize;
use sm_bts::{BinaryTimeSeriesFile, StationCategory, StationKind};
use std::io::Write;
use std::path::Path;

/// One row of the `stations` listing.
#[derive(Debug, Serialize)]
struct StationRow<'a> {
    category: String,
    index: usize,
    id: &'a str,
    name: &'a str,
    river_node: Option<i32>,
    active: Option<bool>,
    accounts: Option<usize>,
}

/// One row of the `parameters` listing.
#[derive(Debug, Serialize)]
struct ParameterRow<'a> {
    index: usize,
    name: &'a str,
    units: &'a str,
}

/// Print the header summary as text or JSON.
pub fn run_info(path: &Path, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let file = BinaryTimeSeriesFile::open(path)?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &file.summary())?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", file)?;
    }
    Ok(())
}

/// Write the station directory as CSV
/// (`category,index,id,name,river_node,active,accounts`).
pub fn run_stations(path: &Path, out: impl Write) -> anyhow::Result<()> {
    let file = BinaryTimeSeriesFile::open(path)?;
    let directory = file.directory();
    let mut writer = csv::Writer::from_writer(out);
    let mut rows = 0;
    for category in StationCategory::SEARCH_ORDER {
        for (index, station) in directory.list(category).iter().enumerate() {
            let (active, accounts) = match station.kind {
                StationKind::Reservoir { active, .. } => {
                    (Some(active), directory.accounts.accounts.get(index).copied())
                }
                _ => (None, None),
            };
            writer.serialize(StationRow {
                category: category.to_string(),
                index,
                id: &station.id,
                name: &station.name,
                river_node: station.river_node(),
                active,
                accounts,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    info!("Listed {} stations from {}", rows, path.display());
    Ok(())
}

/// Write parameter names and units as CSV (`index,name,units`).
pub fn run_parameters(path: &Path, original: bool, out: impl Write) -> anyhow::Result<()> {
    let file = BinaryTimeSeriesFile::open(path)?;
    let table = file.parameters();
    let mut writer = csv::Writer::from_writer(out);
    for (index, name) in table.names(original).iter().enumerate() {
        let units = table.units.get(index).map(String::as_str).unwrap_or_default();
        writer.serialize(ParameterRow { index, name, units })?;
    }
    writer.flush()?;
    Ok(())
}
