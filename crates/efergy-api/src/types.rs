// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of efergy-rs.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Value returned by a reading request
///
/// The proxy is loose with types: instant power is a number, energy and cost
/// sums come back as numeric strings, budget is a status word.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Value(Value),
    /// Latest value per sensor id
    Sensors(BTreeMap<String, Value>),
}

impl Reading {
    /// Numeric view of a single value, accepting numeric strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Value(value) => value_as_f64(value),
            Reading::Sensors(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reading::Value(value) => value.as_str(),
            Reading::Sensors(_) => None,
        }
    }

    pub fn sensors(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Reading::Sensors(sensors) => Some(sensors),
            Reading::Value(_) => None,
        }
    }
}

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One sensor entry of `getCurrentValuesSummary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSummary {
    #[serde(deserialize_with = "deserialize_sid")]
    pub sid: i64,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
    /// Data points keyed by millisecond timestamp
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

impl SensorSummary {
    /// First value of the first data point
    pub fn latest(&self) -> Option<&Value> {
        self.data.first().and_then(|point| point.values().next())
    }
}

/// Sensor ids come back as either strings or integers depending on the hub firmware
fn deserialize_sid<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("sid out of range: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("sid is not an integer: {s}"))),
        other => Err(serde::de::Error::custom(format!(
            "unexpected sid type: {other}"
        ))),
    }
}

/// Payload of `getStatus`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub hid: String,
    #[serde(default)]
    pub list_of_macs: Vec<MacStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacStatus {
    pub mac: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Summary of the household hub, taken from the first MAC of a status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInfo {
    pub hid: String,
    pub mac: String,
    pub status: String,
    pub device_type: String,
    pub version: String,
}

impl HubStatus {
    pub fn hub_info(&self) -> Option<HubInfo> {
        self.list_of_macs.first().map(|mac| HubInfo {
            hid: self.hid.clone(),
            mac: mac.mac.clone(),
            status: mac.status.clone(),
            device_type: mac.device_type.clone(),
            version: mac.version.clone(),
        })
    }
}
