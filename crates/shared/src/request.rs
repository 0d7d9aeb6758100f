use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive match against `asc`/`desc`; anything else is ascending.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pageable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Sort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacetSort {
    Count,
    Index,
}

impl FacetSort {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetSort::Count => "COUNT",
            FacetSort::Index => "INDEX",
        }
    }
}

impl FromStr for FacetSort {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COUNT" => Ok(FacetSort::Count),
            "INDEX" => Ok(FacetSort::Index),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacetSpec {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<FacetSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl FacetSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKey {
    Between,
    Contains,
    EndsWith,
    Equals,
    Expression,
    StartsWith,
}

impl OperationKey {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKey::Between => "BETWEEN",
            OperationKey::Contains => "CONTAINS",
            OperationKey::EndsWith => "ENDS_WITH",
            OperationKey::Equals => "EQUALS",
            OperationKey::Expression => "EXPRESSION",
            OperationKey::StartsWith => "STARTS_WITH",
        }
    }
}

impl FromStr for OperationKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BETWEEN" => Ok(OperationKey::Between),
            "CONTAINS" => Ok(OperationKey::Contains),
            "ENDS_WITH" => Ok(OperationKey::EndsWith),
            "EQUALS" => Ok(OperationKey::Equals),
            "EXPRESSION" => Ok(OperationKey::Expression),
            "STARTS_WITH" => Ok(OperationKey::StartsWith),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key `{0}`")]
pub struct UnknownKey(pub String);

/// Positional `field,operationKey,option` filter. Missing or unknown positions stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexable {
    pub field: String,
    pub operation_key: Option<OperationKey>,
    pub option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Request {
    pub pageable: Pageable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<FacetSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexable: Option<Indexable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[cfg(test)]
#[path = "tests/request_tests.rs"]
mod tests;
