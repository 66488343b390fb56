//! File classification by extension.

use crate::error::{BtsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Which station list a file is authoritative for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Diversion, instream flow and stream station output (river-node addressed).
    Diversion,
    Reservoir,
    Well,
}

/// Native time step of the data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalBase {
    Month,
    Day,
}

impl IntervalBase {
    /// Unit label of extracted values: monthly flow is converted to volume.
    pub fn output_units(&self) -> &'static str {
        match self {
            IntervalBase::Month => "ACFT",
            IntervalBase::Day => "CFS",
        }
    }
}

impl fmt::Display for IntervalBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalBase::Month => write!(f, "Month"),
            IntervalBase::Day => write!(f, "Day"),
        }
    }
}

/// Component and interval, as selected by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileKind {
    pub component: Component,
    pub interval: IntervalBase,
}

impl FileKind {
    pub const fn new(component: Component, interval: IntervalBase) -> Self {
        Self {
            component,
            interval,
        }
    }

    /// Map a (case-insensitive) extension to its file kind.
    ///
    /// | ext | component | interval |
    /// |---|---|---|
    /// | b43 | diversion | month |
    /// | b49 | diversion | day |
    /// | b44 | reservoir | month |
    /// | b50 | reservoir | day |
    /// | b42 | well | month |
    /// | b65 | well | day |
    pub fn from_extension(ext: &str) -> Option<FileKind> {
        use Component::*;
        use IntervalBase::*;
        match ext.to_ascii_lowercase().as_str() {
            "b43" => Some(FileKind::new(Diversion, Month)),
            "b49" => Some(FileKind::new(Diversion, Day)),
            "b44" => Some(FileKind::new(Reservoir, Month)),
            "b50" => Some(FileKind::new(Reservoir, Day)),
            "b42" => Some(FileKind::new(Well, Month)),
            "b65" => Some(FileKind::new(Well, Day)),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<FileKind> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        FileKind::from_extension(ext).ok_or_else(|| BtsError::UnknownExtension(ext.to_string()))
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.component, self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension_mapping() {
        let kind = FileKind::from_extension("B43").unwrap();
        assert_eq!(kind, FileKind::new(Component::Diversion, IntervalBase::Month));
        let kind = FileKind::from_extension("b50").unwrap();
        assert_eq!(kind, FileKind::new(Component::Reservoir, IntervalBase::Day));
        let kind = FileKind::from_extension("b65").unwrap();
        assert_eq!(kind, FileKind::new(Component::Well, IntervalBase::Day));
        assert!(FileKind::from_extension("xdd").is_none());
    }

    #[test]
    fn test_from_path() {
        let kind = FileKind::from_path(&PathBuf::from("/tmp/cm2015.B42")).unwrap();
        assert_eq!(kind.component, Component::Well);
        assert_eq!(kind.interval, IntervalBase::Month);
        let err = FileKind::from_path(&PathBuf::from("/tmp/cm2015")).unwrap_err();
        assert!(matches!(err, BtsError::UnknownExtension(_)));
    }

    #[test]
    fn test_output_units() {
        assert_eq!(IntervalBase::Month.output_units(), "ACFT");
        assert_eq!(IntervalBase::Day.output_units(), "CFS");
    }
}
