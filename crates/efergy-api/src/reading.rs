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

//! Reading type resolution
//!
//! Maps the reading names callers use (`instant_readings`, `energy_day`,
//! `budget`, ...) to the proxy command that serves them and pulls the
//! interesting value out of the response.

use crate::errors::{EfergyError, EfergyResult};
use crate::types::{Reading, SensorSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Aggregation period accepted by the energy, cost and forecast endpoints
///
/// The API treats a month as 28 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Period keyword as it may appear inside a reading name (`daily_cost`, `energy_week`)
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "day" | "daily" => Some(Period::Day),
            "week" | "weekly" => Some(Period::Week),
            "month" | "monthly" => Some(Period::Month),
            "year" | "yearly" => Some(Period::Year),
            _ => None,
        }
    }
}

impl FromStr for Period {
    type Err = EfergyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| EfergyError::InvalidPeriod(s.to_owned()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of meter data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingType {
    /// Current power draw in watts
    Instant,
    /// kWh used during a period
    Energy,
    /// Cost of the energy used during a period
    Cost,
    /// Monthly budget status
    Budget,
    /// Latest value of every sensor on the account
    CurrentValues,
}

impl ReadingType {
    fn command(self) -> &'static str {
        match self {
            ReadingType::Instant => "getInstant",
            ReadingType::Energy => "getEnergy",
            ReadingType::Cost => "getCost",
            ReadingType::Budget => "getBudget",
            ReadingType::CurrentValues => "getCurrentValuesSummary",
        }
    }

    fn value_field(self) -> Option<&'static str> {
        match self {
            ReadingType::Instant => Some("reading"),
            ReadingType::Energy | ReadingType::Cost => Some("sum"),
            ReadingType::Budget => Some("status"),
            ReadingType::CurrentValues => None,
        }
    }

    fn takes_period(self) -> bool {
        matches!(self, ReadingType::Energy | ReadingType::Cost)
    }
}

impl FromStr for ReadingType {
    type Err = EfergyError;

    /// Energy and cost names may carry extra characters for keying by period
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instant_readings" | "instant" => Ok(ReadingType::Instant),
            "budget" => Ok(ReadingType::Budget),
            "current_values" => Ok(ReadingType::CurrentValues),
            name if name.contains("energy") => Ok(ReadingType::Energy),
            name if name.contains("cost") => Ok(ReadingType::Cost),
            other => Err(EfergyError::InvalidReadingType(other.to_owned())),
        }
    }
}

/// A reading to fetch, with its optional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRequest {
    pub name: String,
    pub period: Option<Period>,
    pub sid: Option<i64>,
}

impl ReadingRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            period: None,
            sid: None,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Only meaningful for `current_values`
    pub fn with_sid(mut self, sid: i64) -> Self {
        self.sid = Some(sid);
        self
    }
}

/// Proxy command and parameters serving a reading request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReading {
    pub reading_type: ReadingType,
    pub command: &'static str,
    pub params: Vec<(&'static str, String)>,
    pub sid: Option<i64>,
}

/// Resolve a reading request to the endpoint that serves it
///
/// The period for energy and cost comes from the request, then from a period
/// keyword inside the name, then defaults to a month.
pub fn resolve(request: &ReadingRequest) -> EfergyResult<ResolvedReading> {
    let reading_type: ReadingType = request.name.parse()?;

    let mut params = Vec::new();
    if reading_type.takes_period() {
        let period = request
            .period
            .or_else(|| period_from_name(&request.name))
            .unwrap_or_default();
        params.push(("period", period.as_str().to_owned()));
    }

    Ok(ResolvedReading {
        reading_type,
        command: reading_type.command(),
        params,
        sid: request.sid,
    })
}

fn period_from_name(name: &str) -> Option<Period> {
    name.split(['_', '-', ' '])
        .find_map(|word| Period::from_keyword(&word.to_ascii_lowercase()))
}

impl ResolvedReading {
    /// Pull the reading out of a proxy response
    pub fn extract(&self, data: Value) -> EfergyResult<Reading> {
        match self.reading_type.value_field() {
            Some(field) => {
                let record = match &data {
                    Value::Array(items) => items.first(),
                    other => Some(other),
                };
                record
                    .and_then(|r| r.get(field))
                    .cloned()
                    .map(Reading::Value)
                    .ok_or_else(|| {
                        EfergyError::InvalidResponse(format!(
                            "{} response has no '{}' field",
                            self.command, field
                        ))
                    })
            }
            None => self.extract_sensors(data),
        }
    }

    fn extract_sensors(&self, data: Value) -> EfergyResult<Reading> {
        let sensors: Vec<SensorSummary> = serde_json::from_value(data)?;

        let mut readings = BTreeMap::new();
        for sensor in &sensors {
            let Some(value) = sensor.latest() else {
                continue;
            };
            if self.sid == Some(sensor.sid) {
                return Ok(Reading::Value(value.clone()));
            }
            readings.insert(sensor.sid.to_string(), value.clone());
        }
        Ok(Reading::Sensors(readings))
    }
}
