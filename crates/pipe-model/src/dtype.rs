//! Recast target type names.

use std::fmt;
use std::str::FromStr;

use polars::prelude::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Type names accepted by `recast_map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DTypeName {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Date,
    Datetime,
}

impl DTypeName {
    pub const ALL: [Self; 14] = [
        Self::Boolean,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
        Self::String,
        Self::Date,
        Self::Datetime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Date => "Date",
            Self::Datetime => "Datetime",
        }
    }

    /// Engine type for this name. Datetimes use microsecond precision.
    pub fn to_polars(self) -> DataType {
        match self {
            Self::Boolean => DataType::Boolean,
            Self::Int8 => DataType::Int8,
            Self::Int16 => DataType::Int16,
            Self::Int32 => DataType::Int32,
            Self::Int64 => DataType::Int64,
            Self::UInt8 => DataType::UInt8,
            Self::UInt16 => DataType::UInt16,
            Self::UInt32 => DataType::UInt32,
            Self::UInt64 => DataType::UInt64,
            Self::Float32 => DataType::Float32,
            Self::Float64 => DataType::Float64,
            Self::String => DataType::String,
            Self::Date => DataType::Date,
            Self::Datetime => DataType::Datetime(TimeUnit::Microseconds, None),
        }
    }
}

impl fmt::Display for DTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DTypeName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("utf8") || wanted.eq_ignore_ascii_case("str") {
            return Ok(Self::String);
        }
        if wanted.eq_ignore_ascii_case("bool") {
            return Ok(Self::Boolean);
        }
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ConfigError::invalid_field(
                    "recast_map",
                    format!("unknown type name '{wanted}'"),
                )
            })
    }
}

impl TryFrom<String> for DTypeName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DTypeName> for String {
    fn from(value: DTypeName) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("utf8".parse::<DTypeName>().unwrap(), DTypeName::String);
        assert_eq!("float64".parse::<DTypeName>().unwrap(), DTypeName::Float64);
        assert_eq!("Int32".parse::<DTypeName>().unwrap(), DTypeName::Int32);
        assert!("Decimal".parse::<DTypeName>().is_err());
    }

    #[test]
    fn maps_to_engine_types() {
        assert_eq!(DTypeName::Int64.to_polars(), DataType::Int64);
        assert!(DTypeName::Datetime.to_polars().is_temporal());
    }
}
