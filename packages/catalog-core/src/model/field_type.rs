//! Closed set of field type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Type tag of a data field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Character,
    Numeric,
    Date,
    Datetime,
    Boolean,
    PackedDecimal,
    Float,
    Double,
    Integer,
    Long,
    Short,
    Byte,
    String,
    Text,
    Blob,
    Clob,
    Other,
}

impl FieldType {
    /// Every tag, in declaration order.
    pub const ALL: [FieldType; 17] = [
        FieldType::Character,
        FieldType::Numeric,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Boolean,
        FieldType::PackedDecimal,
        FieldType::Float,
        FieldType::Double,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Short,
        FieldType::Byte,
        FieldType::String,
        FieldType::Text,
        FieldType::Blob,
        FieldType::Clob,
        FieldType::Other,
    ];

    /// Wire name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Character => "CHARACTER",
            FieldType::Numeric => "NUMERIC",
            FieldType::Date => "DATE",
            FieldType::Datetime => "DATETIME",
            FieldType::Boolean => "BOOLEAN",
            FieldType::PackedDecimal => "PACKED_DECIMAL",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Short => "SHORT",
            FieldType::Byte => "BYTE",
            FieldType::String => "STRING",
            FieldType::Text => "TEXT",
            FieldType::Blob => "BLOB",
            FieldType::Clob => "CLOB",
            FieldType::Other => "OTHER",
        }
    }

    /// Parses a tag, ignoring case. The error names the attribute and lists
    /// every accepted value.
    pub fn parse(value: &str, attribute: &str) -> Result<FieldType, CatalogError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidInput(format!(
                "{} must be a non-empty string.",
                attribute
            )));
        }
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let allowed: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
                CatalogError::InvalidInput(format!(
                    "Invalid {}: '{}'. Must be one of [{}]",
                    attribute,
                    value,
                    allowed.join(", ")
                ))
            })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::parse(s, "fieldType")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(FieldType::parse("packed_decimal", "fieldType"), Ok(FieldType::PackedDecimal));
        assert_eq!(FieldType::parse("  Numeric ", "fieldType"), Ok(FieldType::Numeric));
        assert_eq!("clob".parse::<FieldType>(), Ok(FieldType::Clob));
    }

    #[test]
    fn test_parse_unknown_lists_all_values() {
        let err = FieldType::parse("VARCHAR", "fieldType").unwrap_err();
        let CatalogError::InvalidInput(msg) = err else {
            panic!("expected InvalidInput");
        };
        assert!(msg.contains("'VARCHAR'"));
        for tag in FieldType::ALL {
            assert!(msg.contains(tag.as_str()), "missing {} in {}", tag, msg);
        }
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            FieldType::parse("   ", "fieldType"),
            Err(CatalogError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&FieldType::PackedDecimal).unwrap();
        assert_eq!(json, "\"PACKED_DECIMAL\"");
        let back: FieldType = serde_json::from_str("\"DATETIME\"").unwrap();
        assert_eq!(back, FieldType::Datetime);
    }
}
