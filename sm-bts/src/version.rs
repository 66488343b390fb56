//! Format version detection.
//!
//! Three header generations exist and none carries a magic number, so the
//! generation is sniffed from a few fixed byte positions in the first record:
//!
//! | generation | record 0 layout |
//! |---|---|
//! | before 11.0 | no version record; record 0 holds the year range |
//! | 11.0 to 12.28 | 8-byte program, 4-byte float version, 10-byte date |
//! | 12.29 and later | 8-byte program, 8-byte version string, 10-byte date |

use crate::codec::RecordReader;
use crate::error::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek};

/// Byte that holds '.' when the version is stored as text ("12.29", "15.02.00").
const TEXT_VERSION_DOT_OFFSET: u64 = 10;
/// Bytes that hold '/' in a "YYYY/MM/DD" date following a float version.
const FLOAT_DATE_SLASH_OFFSETS: [u64; 2] = [16, 19];

/// Which fixed header layout a file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderGeneration {
    /// Before 11.0: no program/version record at all.
    Pre11,
    /// 11.0 through 12.28: version stored as a 4-byte float.
    Float11,
    /// 12.29 and later: version stored as an 8-byte string.
    Text1229,
}

impl HeaderGeneration {
    /// Number of metadata records preceding the year-range record.
    pub fn metadata_records(&self) -> u64 {
        match self {
            HeaderGeneration::Pre11 => 0,
            _ => 1,
        }
    }
}

/// A StateMod version, compared numerically.
///
/// Parsing accepts "9.69", "11.00", "15.02.00"; display zero-pads the
/// major and minor fields so "9.69" prints as "09.69".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl FormatVersion {
    /// Assumed for every file written before 11.0.
    pub const LEGACY_FALLBACK: FormatVersion = FormatVersion::new(9, 69, None);
    /// First version with a metadata record and in-file parameter lists.
    pub const V11: FormatVersion = FormatVersion::new(11, 0, None);
    /// First version with a text version field.
    pub const V12_29: FormatVersion = FormatVersion::new(12, 29, None);
    /// Last version with the duplicate reservoir parameter name bug.
    pub const V15_00_02: FormatVersion = FormatVersion::new(15, 0, Some(2));

    pub const fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted version string. Missing minor reads as zero.
    pub fn parse(s: &str) -> Option<FormatVersion> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = match parts.next() {
            Some(p) if !p.trim().is_empty() => p.trim().parse().ok()?,
            _ => 0,
        };
        let patch = match parts.next() {
            Some(p) if !p.trim().is_empty() => Some(p.trim().parse().ok()?),
            _ => None,
        };
        Some(FormatVersion::new(major, minor, patch))
    }

    /// Version stored as a float in 11.0-12.28 files, read to two decimals.
    pub fn from_float(value: f32) -> Option<FormatVersion> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        FormatVersion::parse(&format!("{:.2}", value))
    }

    pub fn is_at_least(&self, other: &FormatVersion) -> bool {
        self >= other
    }

    fn key(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl PartialEq for FormatVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FormatVersion {}

impl Hash for FormatVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for FormatVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FormatVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{:02}", patch)?;
        }
        Ok(())
    }
}

/// Everything recoverable from the first header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub generation: HeaderGeneration,
    pub version: FormatVersion,
    pub program: String,
    pub created: String,
}

/// Classify the header generation and read the version metadata.
pub fn detect<R: Read + Seek>(reader: &mut RecordReader<R>) -> Result<VersionInfo> {
    let marker = reader.read_u8_at(TEXT_VERSION_DOT_OFFSET)?;
    if marker == b'.' {
        let program = reader.read_string_at(0, 8)?;
        let text = reader.read_string_at(8, 8)?;
        let created = reader.read_string_at(16, 10)?;
        let version = FormatVersion::parse(&text).unwrap_or_else(|| {
            warn!(
                "Unreadable version string {:?}, assuming {}",
                text,
                FormatVersion::V12_29
            );
            FormatVersion::V12_29
        });
        debug!("Detected text version header: {} {}", program, version);
        return Ok(VersionInfo {
            generation: HeaderGeneration::Text1229,
            version,
            program,
            created,
        });
    }

    let first = reader.read_u8_at(FLOAT_DATE_SLASH_OFFSETS[0])?;
    let second = reader.read_u8_at(FLOAT_DATE_SLASH_OFFSETS[1])?;
    let pre_11 = first == 0 || (first != b'/' && second == 0);
    if pre_11 {
        debug!(
            "No version record found, assuming {}",
            FormatVersion::LEGACY_FALLBACK
        );
        return Ok(VersionInfo {
            generation: HeaderGeneration::Pre11,
            version: FormatVersion::LEGACY_FALLBACK,
            program: String::new(),
            created: String::new(),
        });
    }

    let program = reader.read_string_at(0, 8)?;
    let raw = reader.read_f32_at(8)?;
    let created = reader.read_string_at(12, 10)?;
    let version = FormatVersion::from_float(raw).unwrap_or_else(|| {
        warn!(
            "Unreadable float version {}, assuming {}",
            raw,
            FormatVersion::V11
        );
        FormatVersion::V11
    });
    debug!("Detected float version header: {} {}", program, version);
    Ok(VersionInfo {
        generation: HeaderGeneration::Float11,
        version,
        program,
        created,
    })
}
