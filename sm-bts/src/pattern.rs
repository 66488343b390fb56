//! Time series identifier patterns.
//!
//! Identifiers are dotted: `Location.Source.Parameter.Interval.Scenario`.
//! Only the location and parameter fields take part in matching; each may
//! contain one `*`. A reservoir location may end in `-N` to select account N.

use crate::error::{BtsError, Result};
use crate::kind::Component;
use serde::{Deserialize, Serialize};

/// Source field written into generated identifiers.
pub const SOURCE: &str = "StateMod";

/// One identifier field, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPattern {
    Any,
    Exact(String),
    Glob { prefix: String, suffix: String },
}

impl FieldPattern {
    pub fn parse(field: &str) -> Result<FieldPattern> {
        let field = field.trim();
        match field.matches('*').count() {
            0 if field.is_empty() => Ok(FieldPattern::Any),
            0 => Ok(FieldPattern::Exact(field.to_ascii_lowercase())),
            1 if field == "*" => Ok(FieldPattern::Any),
            1 => {
                let (prefix, suffix) = field.split_once('*').unwrap_or((field, ""));
                Ok(FieldPattern::Glob {
                    prefix: prefix.to_ascii_lowercase(),
                    suffix: suffix.to_ascii_lowercase(),
                })
            }
            _ => Err(BtsError::InvalidPattern(format!(
                "more than one wildcard in {:?}",
                field
            ))),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim().to_ascii_lowercase();
        match self {
            FieldPattern::Any => true,
            FieldPattern::Exact(text) => value == *text,
            FieldPattern::Glob { prefix, suffix } => {
                value.len() >= prefix.len() + suffix.len()
                    && value.starts_with(prefix.as_str())
                    && value.ends_with(suffix.as_str())
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, FieldPattern::Exact(_))
    }
}

/// A parsed identifier pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsPattern {
    pub location: FieldPattern,
    /// Explicit reservoir account (reservoir files only).
    pub account: Option<usize>,
    pub parameter: FieldPattern,
}

impl TsPattern {
    /// Parse `text` for a file of `component`. Only reservoir files
    /// interpret a trailing `-N` on the location as an account number.
    pub fn parse(text: &str, component: Component) -> Result<TsPattern> {
        let mut fields = text.split('.');
        let location_text = fields.next().unwrap_or_default().trim();
        if location_text.is_empty() {
            return Err(BtsError::InvalidPattern(format!(
                "missing location in {:?}",
                text
            )));
        }
        let _source = fields.next();
        let parameter = FieldPattern::parse(fields.next().unwrap_or_default())?;

        let (location_text, account) = match component {
            Component::Reservoir => split_account(location_text),
            _ => (location_text, None),
        };

        Ok(TsPattern {
            location: FieldPattern::parse(location_text)?,
            account,
            parameter,
        })
    }
}

fn split_account(location: &str) -> (&str, Option<usize>) {
    match location.rsplit_once('-') {
        Some((base, suffix))
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (base, suffix.parse().ok())
        }
        _ => (location, None),
    }
}

/// Identifier for a generated series: `Location.StateMod.Parameter.Interval`.
pub fn format_tsid(location: &str, parameter: &str, interval: &str) -> String {
    format!("{}.{}.{}.{}", location, SOURCE, parameter, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_pattern() {
        let any = FieldPattern::parse("*").unwrap();
        assert!(any.matches("anything"));
        assert!(any.is_wildcard());

        let exact = FieldPattern::parse("Div1").unwrap();
        assert!(exact.matches("div1"));
        assert!(exact.matches("DIV1 "));
        assert!(!exact.matches("div10"));
        assert!(!exact.is_wildcard());

        let glob = FieldPattern::parse("Total_*").unwrap();
        assert!(glob.matches("Total_Supply"));
        assert!(!glob.matches("River_Inflow"));

        let glob = FieldPattern::parse("*_Short").unwrap();
        assert!(glob.matches("CU_Short"));
        assert!(!glob.matches("_Shor"));

        assert!(FieldPattern::parse("a*b*").is_err());
    }

    #[test]
    fn test_parse_full_identifier() {
        let p = TsPattern::parse("div1.StateMod.Diversion.Month", Component::Diversion).unwrap();
        assert_eq!(p.location, FieldPattern::Exact("div1".into()));
        assert_eq!(p.parameter, FieldPattern::Exact("diversion".into()));
        assert_eq!(p.account, None);
    }

    #[test]
    fn test_parse_location_only() {
        let p = TsPattern::parse("*", Component::Well).unwrap();
        assert_eq!(p.location, FieldPattern::Any);
        assert_eq!(p.parameter, FieldPattern::Any);
    }

    #[test]
    fn test_parse_reservoir_account() {
        let p = TsPattern::parse("res1-2.StateMod.Sim_EOM.Month", Component::Reservoir).unwrap();
        assert_eq!(p.location, FieldPattern::Exact("res1".into()));
        assert_eq!(p.account, Some(2));

        // suffix is only special in reservoir files
        let p = TsPattern::parse("res1-2.StateMod.Sim_EOM", Component::Diversion).unwrap();
        assert_eq!(p.location, FieldPattern::Exact("res1-2".into()));
        assert_eq!(p.account, None);

        let p = TsPattern::parse("res-a..Sim_EOM", Component::Reservoir).unwrap();
        assert_eq!(p.location, FieldPattern::Exact("res-a".into()));
        assert_eq!(p.account, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(TsPattern::parse("", Component::Diversion).is_err());
        assert!(TsPattern::parse(".StateMod.X", Component::Diversion).is_err());
        assert!(TsPattern::parse("a**", Component::Diversion).is_err());
    }

    #[test]
    fn test_format_tsid() {
        assert_eq!(
            format_tsid("res1-2", "Sim_EOM", "Month"),
            "res1-2.StateMod.Sim_EOM.Month"
        );
    }
}
