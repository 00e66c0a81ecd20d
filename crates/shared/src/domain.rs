use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Any further profile fields the server sends along; kept opaque.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    #[serde(rename = "type_1")]
    Type1,
    #[serde(rename = "type_2")]
    Type2,
    Ccs,
    Chademo,
    Nacs,
}

impl ConnectorType {
    pub const ALL: [ConnectorType; 5] = [
        ConnectorType::Type1,
        ConnectorType::Type2,
        ConnectorType::Ccs,
        ConnectorType::Chademo,
        ConnectorType::Nacs,
    ];

    pub fn token(self) -> &'static str {
        match self {
            ConnectorType::Type1 => "type_1",
            ConnectorType::Type2 => "type_2",
            ConnectorType::Ccs => "ccs",
            ConnectorType::Chademo => "chademo",
            ConnectorType::Nacs => "nacs",
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown connector type '{0}' (expected one of: type_1, type_2, ccs, chademo, nacs)")]
pub struct UnknownConnectorType(pub String);

impl FromStr for ConnectorType {
    type Err = UnknownConnectorType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "type_1" | "type1" | "j1772" => Ok(ConnectorType::Type1),
            "type_2" | "type2" | "mennekes" => Ok(ConnectorType::Type2),
            "ccs" => Ok(ConnectorType::Ccs),
            "chademo" => Ok(ConnectorType::Chademo),
            "nacs" | "tesla" => Ok(ConnectorType::Nacs),
            _ => Err(UnknownConnectorType(raw.to_string())),
        }
    }
}

/// Connector kind as the server renders it: sometimes a bare string, sometimes
/// an enum object carrying its `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectorKind {
    Tagged { value: String },
    Plain(String),
}

impl ConnectorKind {
    pub fn label(&self) -> &str {
        match self {
            ConnectorKind::Tagged { value } => value,
            ConnectorKind::Plain(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ConnectorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectors: Option<Vec<Connector>>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub battery_charge_limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub battery_size: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub max_kw_ac: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub max_kw_dc: Option<i64>,
}

/// Accepts integers, floats (truncated) and numeric strings; anything else,
/// `null` included, reads as absent so one odd record never sinks the list.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

impl Car {
    /// Connector labels joined for display, `-` when the car has none.
    pub fn connector_summary(&self) -> String {
        let labels: Vec<&str> = self
            .connectors
            .iter()
            .flatten()
            .filter_map(|connector| connector.kind.as_ref())
            .map(ConnectorKind::label)
            .filter(|label| !label.is_empty())
            .collect();
        if labels.is_empty() {
            "-".to_string()
        } else {
            labels.join(", ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    pub name: String,
    pub connector_types: BTreeSet<ConnectorType>,
    pub battery_charge_limit: i64,
    pub battery_size: i64,
    pub max_kw_ac: i64,
    pub max_kw_dc: i64,
}
