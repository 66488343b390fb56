//! Station and parameter directories decoded from the header.

use crate::codec::RecordReader;
use crate::error::Result;
use crate::geometry::{HeaderCounts, HeaderLayout, ReservoirAccounts};
use crate::kind::Component;
use crate::version::FormatVersion;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};

const ID_LENGTH: usize = 12;
const NAME_LENGTH: usize = 24;
const PARAMETER_NAME_LENGTH: usize = 24;
const UNIT_LENGTH: usize = 4;

/// The six station lists, in the order requests search them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationCategory {
    Diversion,
    InstreamFlow,
    Reservoir,
    Baseflow,
    Well,
    RiverNode,
}

impl StationCategory {
    pub const SEARCH_ORDER: [StationCategory; 6] = [
        StationCategory::Diversion,
        StationCategory::InstreamFlow,
        StationCategory::Reservoir,
        StationCategory::Baseflow,
        StationCategory::Well,
        StationCategory::RiverNode,
    ];

    /// Whether a file of `component` holds data for this list.
    pub fn searched_by(&self, component: Component) -> bool {
        match component {
            Component::Diversion => matches!(
                self,
                StationCategory::Diversion
                    | StationCategory::InstreamFlow
                    | StationCategory::Baseflow
                    | StationCategory::RiverNode
            ),
            Component::Reservoir => *self == StationCategory::Reservoir,
            Component::Well => *self == StationCategory::Well,
        }
    }
}

impl fmt::Display for StationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StationCategory::Diversion => "diversion",
            StationCategory::InstreamFlow => "instream_flow",
            StationCategory::Reservoir => "reservoir",
            StationCategory::Baseflow => "baseflow",
            StationCategory::Well => "well",
            StationCategory::RiverNode => "river_node",
        };
        write!(f, "{}", label)
    }
}

/// Per-category station data.
///
/// `river_node` is the 1-based position in the river node list as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    RiverNode,
    Diversion {
        river_node: i32,
    },
    InstreamFlow {
        river_node: i32,
    },
    Reservoir {
        river_node: i32,
        active: bool,
        owner_pointer: i32,
    },
    Baseflow {
        river_node: i32,
    },
    Well {
        river_node: i32,
    },
}

/// One station record from the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Leading counter written by the model; informational only.
    pub sequence: i32,
    pub id: String,
    pub name: String,
    pub kind: StationKind,
}

impl Station {
    pub fn category(&self) -> StationCategory {
        match self.kind {
            StationKind::RiverNode => StationCategory::RiverNode,
            StationKind::Diversion { .. } => StationCategory::Diversion,
            StationKind::InstreamFlow { .. } => StationCategory::InstreamFlow,
            StationKind::Reservoir { .. } => StationCategory::Reservoir,
            StationKind::Baseflow { .. } => StationCategory::Baseflow,
            StationKind::Well { .. } => StationCategory::Well,
        }
    }

    /// Stored 1-based river node position; `None` for river nodes.
    pub fn river_node(&self) -> Option<i32> {
        match self.kind {
            StationKind::RiverNode => None,
            StationKind::Diversion { river_node }
            | StationKind::InstreamFlow { river_node }
            | StationKind::Reservoir { river_node, .. }
            | StationKind::Baseflow { river_node }
            | StationKind::Well { river_node } => Some(river_node),
        }
    }

    /// Reservoir on/off switch; every other station counts as active.
    pub fn is_active(&self) -> bool {
        match self.kind {
            StationKind::Reservoir { active, .. } => active,
            _ => true,
        }
    }

    /// Record position within one interval of data, or `None` when the
    /// stored river node position is unusable.
    ///
    /// Diversion-file stations are addressed through their river node;
    /// reservoirs and wells by their own list position.
    pub fn address_index(&self, list_position: usize) -> Option<usize> {
        match self.kind {
            StationKind::RiverNode | StationKind::Reservoir { .. } | StationKind::Well { .. } => {
                Some(list_position)
            }
            StationKind::Diversion { river_node }
            | StationKind::InstreamFlow { river_node }
            | StationKind::Baseflow { river_node } => {
                if river_node >= 1 {
                    Some(river_node as usize - 1)
                } else {
                    None
                }
            }
        }
    }
}

/// All station lists of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDirectory {
    pub river_nodes: Vec<Station>,
    pub diversions: Vec<Station>,
    pub instream_flows: Vec<Station>,
    pub reservoirs: Vec<Station>,
    pub baseflows: Vec<Station>,
    pub wells: Vec<Station>,
    /// Stored owner pointers, one per reservoir plus the trailing sentinel.
    pub owner_pointers: Vec<i32>,
    pub accounts: ReservoirAccounts,
}

impl StationDirectory {
    /// Decode every station record named by the header counts.
    pub fn read<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        layout: &HeaderLayout,
        counts: &HeaderCounts,
        record_length: u64,
    ) -> Result<StationDirectory> {
        let river_nodes = read_list(
            reader,
            layout.river_nodes,
            counts.river_nodes,
            StationCategory::RiverNode,
            record_length,
        )?;
        let diversions = read_list(
            reader,
            layout.diversions,
            counts.diversions,
            StationCategory::Diversion,
            record_length,
        )?;
        let instream_flows = read_list(
            reader,
            layout.instream_flows,
            counts.instream_flows,
            StationCategory::InstreamFlow,
            record_length,
        )?;
        // the sentinel record only contributes its owner pointer
        let mut reservoirs = read_list(
            reader,
            layout.reservoirs,
            counts.reservoirs + 1,
            StationCategory::Reservoir,
            record_length,
        )?;
        let baseflows = read_list(
            reader,
            layout.baseflows,
            counts.baseflows,
            StationCategory::Baseflow,
            record_length,
        )?;
        let wells = read_list(
            reader,
            layout.wells,
            counts.wells,
            StationCategory::Well,
            record_length,
        )?;

        let owner_pointers: Vec<i32> = reservoirs
            .iter()
            .map(|r| match r.kind {
                StationKind::Reservoir { owner_pointer, .. } => owner_pointer,
                _ => 0,
            })
            .collect();
        reservoirs.truncate(counts.reservoirs);
        let active: Vec<bool> = reservoirs.iter().map(Station::is_active).collect();
        let accounts = ReservoirAccounts::from_pointers(&owner_pointers, &active);

        debug!(
            "Read stations: {} river nodes, {} diversions, {} instream flows, {} reservoirs, {} baseflows, {} wells",
            river_nodes.len(),
            diversions.len(),
            instream_flows.len(),
            reservoirs.len(),
            baseflows.len(),
            wells.len()
        );

        Ok(StationDirectory {
            river_nodes,
            diversions,
            instream_flows,
            reservoirs,
            baseflows,
            wells,
            owner_pointers,
            accounts,
        })
    }

    pub fn list(&self, category: StationCategory) -> &[Station] {
        match category {
            StationCategory::Diversion => &self.diversions,
            StationCategory::InstreamFlow => &self.instream_flows,
            StationCategory::Reservoir => &self.reservoirs,
            StationCategory::Baseflow => &self.baseflows,
            StationCategory::Well => &self.wells,
            StationCategory::RiverNode => &self.river_nodes,
        }
    }

    /// Describe inconsistencies between the lists and the header counts.
    pub fn problems(&self, counts: &HeaderCounts) -> Vec<String> {
        let mut problems = Vec::new();
        for category in StationCategory::SEARCH_ORDER {
            for station in self.list(category) {
                if let Some(node) = station.river_node() {
                    if node < 1 || node as usize > counts.river_nodes {
                        problems.push(format!(
                            "{} {} river node position {} outside 1..={}",
                            category, station.id, node, counts.river_nodes
                        ));
                    }
                }
            }
        }
        for pair in self.owner_pointers.windows(2) {
            match pair[1].checked_sub(pair[0]) {
                Some(diff) if diff < 0 => problems.push(format!(
                    "reservoir owner pointers decrease ({} -> {})",
                    pair[0], pair[1]
                )),
                None => problems.push(format!(
                    "reservoir owner pointers too far apart ({} -> {})",
                    pair[0], pair[1]
                )),
                Some(_) => {}
            }
        }
        problems
    }
}

fn read_list<R: Read + Seek>(
    reader: &mut RecordReader<R>,
    start: u64,
    n: usize,
    category: StationCategory,
    record_length: u64,
) -> Result<Vec<Station>> {
    (0..n as u64)
        .map(|i| read_station(reader, (start + i) * record_length, category))
        .collect()
}

fn read_station<R: Read + Seek>(
    reader: &mut RecordReader<R>,
    offset: u64,
    category: StationCategory,
) -> Result<Station> {
    let sequence = reader.read_i32_at(offset)?;
    let id = reader.read_string_at(offset + 4, ID_LENGTH)?;
    let name = reader.read_string_at(offset + 16, NAME_LENGTH)?;
    let kind = match category {
        StationCategory::RiverNode => StationKind::RiverNode,
        _ => {
            let river_node = reader.read_i32_at(offset + 40)?;
            match category {
                StationCategory::Diversion => StationKind::Diversion { river_node },
                StationCategory::InstreamFlow => StationKind::InstreamFlow { river_node },
                StationCategory::Baseflow => StationKind::Baseflow { river_node },
                StationCategory::Well => StationKind::Well { river_node },
                _ => StationKind::Reservoir {
                    river_node,
                    active: reader.read_i32_at(offset + 44)? != 0,
                    owner_pointer: reader.read_i32_at(offset + 48)?,
                },
            }
        }
    };
    Ok(Station {
        sequence,
        id,
        name,
        kind,
    })
}

/// Parameter names and units of the open file's component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTable {
    /// Names as stored.
    pub original: Vec<String>,
    /// Names with known model bugs corrected; same length and order.
    pub latest: Vec<String>,
    pub units: Vec<String>,
}

impl ParameterTable {
    /// Read the in-file parameter blocks (11.0 and later). All three
    /// component blocks are decoded; only `component`'s is kept.
    pub fn read<R: Read + Seek>(
        reader: &mut RecordReader<R>,
        layout: &HeaderLayout,
        counts: &HeaderCounts,
        component: Component,
        version: &FormatVersion,
        record_length: u64,
    ) -> Result<ParameterTable> {
        let (Some(names_start), Some(units_start)) = (layout.parameter_names, layout.units) else {
            return Ok(ParameterTable::default());
        };

        let blocks = [
            (Component::Diversion, counts.diversion_parameters),
            (Component::Reservoir, counts.reservoir_parameters),
            (Component::Well, counts.well_parameters),
        ];
        let mut original = Vec::new();
        for (block, (block_component, n)) in blocks.into_iter().enumerate() {
            let start = names_start + (block * counts.max_parameters) as u64;
            let n = n.min(counts.max_parameters);
            let names = (0..n as u64)
                .map(|i| {
                    // 4-byte counter precedes each name
                    let offset = (start + i) * record_length + 4;
                    reader.read_string_at(offset, PARAMETER_NAME_LENGTH)
                })
                .collect::<Result<Vec<String>>>()?;
            debug!("{:?} parameter block: {} names", block_component, names.len());
            if block_component == component {
                original = names;
            }
        }

        let n = counts.parameters_for(component);
        let units = (0..n as u64)
            .map(|i| {
                let offset = units_start * record_length + i * UNIT_LENGTH as u64;
                reader.read_string_at(offset, UNIT_LENGTH)
            })
            .collect::<Result<Vec<String>>>()?;

        let latest = if component == Component::Reservoir && *version <= FormatVersion::V15_00_02 {
            correct_reservoir_parameters(&original)
        } else {
            original.clone()
        };

        Ok(ParameterTable {
            original,
            latest,
            units,
        })
    }

    /// Table for files whose names come from the legacy lookup. Units are
    /// not stored in those files and are labeled from the interval.
    pub fn from_legacy(names: Vec<String>, units: &str) -> ParameterTable {
        ParameterTable {
            units: vec![units.to_string(); names.len()],
            latest: names.clone(),
            original: names,
        }
    }

    pub fn names(&self, original: bool) -> &[String] {
        if original {
            &self.original
        } else {
            &self.latest
        }
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

/// Fix duplicate reservoir parameter names written by StateMod 15.00.02 and
/// earlier: the second "Total_Release" at position 19 is "River_Release",
/// the second "Total_Supply" at position 20 is "River_Divert".
pub fn correct_reservoir_parameters(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let count = seen.entry(name.as_str()).or_insert(0);
            *count += 1;
            match (name.as_str(), *count, i) {
                ("Total_Release", 2, 19) => "River_Release".to_string(),
                ("Total_Supply", 2, 20) => "River_Divert".to_string(),
                _ => name.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(kind: StationKind) -> Station {
        Station {
            sequence: 1,
            id: "id".into(),
            name: "name".into(),
            kind,
        }
    }

    #[test]
    fn test_address_index() {
        assert_eq!(station(StationKind::RiverNode).address_index(4), Some(4));
        assert_eq!(
            station(StationKind::Diversion { river_node: 2 }).address_index(0),
            Some(1)
        );
        assert_eq!(
            station(StationKind::Baseflow { river_node: 0 }).address_index(0),
            None
        );
        let res = station(StationKind::Reservoir {
            river_node: 7,
            active: true,
            owner_pointer: 1,
        });
        assert_eq!(res.address_index(3), Some(3));
        assert_eq!(station(StationKind::Well { river_node: 9 }).address_index(2), Some(2));
    }

    #[test]
    fn test_searched_by() {
        use StationCategory::*;
        let div: Vec<_> = StationCategory::SEARCH_ORDER
            .into_iter()
            .filter(|c| c.searched_by(Component::Diversion))
            .collect();
        assert_eq!(div, vec![Diversion, InstreamFlow, Baseflow, RiverNode]);
        assert!(Reservoir.searched_by(Component::Reservoir));
        assert!(!Diversion.searched_by(Component::Reservoir));
        assert!(Well.searched_by(Component::Well));
        assert!(!RiverNode.searched_by(Component::Well));
    }

    fn reservoir_names() -> Vec<String> {
        let mut names: Vec<String> = (0..19).map(|i| format!("Param_{i}")).collect();
        names[3] = "Total_Release".into();
        names[4] = "Total_Supply".into();
        names.push("Total_Release".into());
        names.push("Total_Supply".into());
        names.push("River_Outflow".into());
        names
    }

    #[test]
    fn test_duplicate_name_correction() {
        let original = reservoir_names();
        let latest = correct_reservoir_parameters(&original);
        assert_eq!(latest.len(), original.len());
        assert_eq!(original[19], "Total_Release");
        assert_eq!(latest[19], "River_Release");
        assert_eq!(original[20], "Total_Supply");
        assert_eq!(latest[20], "River_Divert");
        // first occurrences untouched
        assert_eq!(latest[3], "Total_Release");
        assert_eq!(latest[4], "Total_Supply");
        assert_eq!(latest[21], "River_Outflow");
    }

    #[test]
    fn test_correction_needs_exact_position() {
        let mut names = reservoir_names();
        names.insert(0, "Extra".into());
        let latest = correct_reservoir_parameters(&names);
        assert_eq!(latest, names);
    }

    #[test]
    fn test_problems() {
        let mut dir = StationDirectory::default();
        dir.diversions.push(station(StationKind::Diversion { river_node: 3 }));
        dir.owner_pointers = vec![1, 4, 2];
        let counts = HeaderCounts {
            river_nodes: 2,
            ..HeaderCounts::default()
        };
        let problems = dir.problems(&counts);
        assert_eq!(problems.len(), 2);

        dir.diversions.clear();
        dir.owner_pointers = vec![-2_000_000_000, 2_000_000_000];
        let problems = dir.problems(&counts);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("too far apart"));
    }

    #[test]
    fn test_from_legacy() {
        let table = ParameterTable::from_legacy(vec!["A".into(), "B".into()], "ACFT");
        assert_eq!(table.len(), 2);
        assert_eq!(table.units, vec!["ACFT", "ACFT"]);
        assert_eq!(table.names(true), table.names(false));
    }
}
