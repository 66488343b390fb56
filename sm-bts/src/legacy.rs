//! Output parameter lists for files written before 11.0.
//!
//! Older files do not carry their parameter names, so the list is looked up
//! by component and version instead.

use crate::kind::Component;
use crate::version::FormatVersion;

/// Source of parameter names for files without in-file parameter blocks.
pub trait LegacyParameters: Send + Sync {
    /// Ordered parameter names, one per 4-byte value in a data record.
    /// Returns `None` when the version is unknown to the table.
    fn parameters(&self, component: Component, version: &FormatVersion) -> Option<Vec<String>>;
}

const DIVERSION_9_69: &[&str] = &[
    "Total_Demand",
    "CU_Demand",
    "From_River_By_Priority",
    "From_River_By_Storage",
    "From_River_By_Exchange",
    "From_Carrier_By_Priority",
    "From_Carrier_By_Storage",
    "Carried_Water",
    "From_Soil",
    "Total_Supply",
    "Total_Short",
    "CU_Short",
    "Consumptive_Use",
    "To_Soil",
    "Total_Return",
    "Loss",
    "Upstream_Inflow",
    "Reach_Gain",
    "Return_Flow",
    "Well_Depletion",
    "To_From_GW_Storage",
    "River_Inflow",
    "River_Divert",
    "River_By_Well",
    "River_Outflow",
    "Available_Flow",
    "NA",
    "Control_Location",
];

const RESERVOIR_9_69: &[&str] = &[
    "Initial_Storage",
    "River_Priority",
    "River_Storage",
    "River_Exchange",
    "Carrier_Priority",
    "Carrier_Storage",
    "Total_Supply",
    "Storage_Exchange",
    "Carrier_Use",
    "Total_Release",
    "Evap",
    "Seep_Spill",
    "Sim_EOM",
    "Target_Limit",
    "Fill_Limit",
    "River_Inflow",
    "River_Release",
    "River_Divert",
    "River_By_Well",
    "River_Outflow",
];

const WELL_9_69: &[&str] = &[
    "Demand",
    "From_Well",
    "From_SW",
    "From_Soil",
    "Total_Supply",
    "Total_Short",
    "CU",
    "To_Soil",
    "Total_Return",
    "Loss",
    "River_Depletion",
    "GW_Storage",
];

/// Built-in table covering the 9.69 output lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticLegacyParameters;

impl LegacyParameters for StaticLegacyParameters {
    fn parameters(&self, component: Component, version: &FormatVersion) -> Option<Vec<String>> {
        if version.is_at_least(&FormatVersion::V11) {
            return None;
        }
        let names = match component {
            Component::Diversion => DIVERSION_9_69,
            Component::Reservoir => RESERVOIR_9_69,
            Component::Well => WELL_9_69,
        };
        Some(names.iter().map(|s| s.to_string()).collect())
    }
}
