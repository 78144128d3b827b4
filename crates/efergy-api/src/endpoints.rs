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

//! Remaining mobile proxy calls
//!
//! Most of these hand back the proxy JSON untouched; the payloads are wide and
//! vary between hub generations.

use crate::client::{EfergyClient, Params};
use crate::errors::{EfergyError, EfergyResult};
use crate::reading::Period;
use crate::types::{HubStatus, SensorSummary};
use reqwest::Method;
use serde_json::Value;
use tracing::info;

/// Unit of historical series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Kwh,
    Cost,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Kwh => "kwh",
            DataType::Cost => "cost",
        }
    }
}

/// Time window shared by the graph and aggregation calls
///
/// Times are epoch timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateQuery {
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
    pub agg_period: Period,
    pub cache_key: Option<String>,
}

impl AggregateQuery {
    pub fn new(from_time: i64, to_time: i64) -> Self {
        Self {
            from_time: Some(from_time),
            to_time: Some(to_time),
            ..Self::default()
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.agg_period = period;
        self
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    fn window(&self, params: &mut Params) {
        push_opt(params, "fromTime", self.from_time);
        push_opt(params, "toTime", self.to_time);
    }
}

fn push_opt<T: ToString>(params: &mut Params, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

/// The proxy expects capitalised booleans
fn flag(value: bool) -> String {
    let word = if value { "True" } else { "False" };
    word.to_owned()
}

fn data_field(command: &str, mut data: Value) -> EfergyResult<Value> {
    data.get_mut("data").map(Value::take).ok_or_else(|| {
        EfergyError::InvalidResponse(format!("{command} response has no 'data' field"))
    })
}

impl EfergyClient {
    async fn get(&self, command: &str, params: &[(&'static str, String)]) -> EfergyResult<Value> {
        self.request(Method::GET, command, params).await
    }

    fn cache_params(&self, query: &AggregateQuery) -> Params {
        let mut params = vec![("cacheTTL", self.cache_ttl().to_string())];
        push_opt(&mut params, "cacheKey", query.cache_key.as_deref());
        query.window(&mut params);
        params
    }

    /// Sensor ids attached to the account
    pub async fn get_sids(&self) -> EfergyResult<Vec<i64>> {
        let data = self.get("getCurrentValuesSummary", &[]).await?;
        let sensors: Vec<SensorSummary> = serde_json::from_value(data)?;
        Ok(sensors.into_iter().map(|s| s.sid).collect())
    }

    /// Device status of the household hub
    pub async fn get_status(&self) -> EfergyResult<HubStatus> {
        let data = self.get("getStatus", &[]).await?;
        let status: HubStatus = serde_json::from_value(data)?;
        if let Some(hub) = status.hub_info() {
            info!(
                "📟 [EFERGY STATUS] Hub {} ({} {}) is {}",
                hub.mac, hub.device_type, hub.version, hub.status
            );
        }
        Ok(status)
    }

    /// Hub status together with the sensor ids attached to the account
    pub async fn get_status_with_sids(&self) -> EfergyResult<(HubStatus, Vec<i64>)> {
        let status = self.get_status().await?;
        let sids = self.get_sids().await?;
        Ok((status, sids))
    }

    /// Create and apply a tariff from a single price per kWh
    pub async fn hid_simple_tariff(&self, cost_per_kwh: f64) -> EfergyResult<Value> {
        self.get(
            "createHidSimpleTariff",
            &[("cost_per_kwh", cost_per_kwh.to_string())],
        )
        .await
    }

    /// Carbon generated by the production of the energy used over a period
    ///
    /// Zero times select the period so far.
    pub async fn carbon(&self, period: Period, from_time: i64, to_time: i64) -> EfergyResult<Value> {
        self.get(
            "getCarbon",
            &[
                ("period", period.to_string()),
                ("fromTime", from_time.to_string()),
                ("toTime", to_time.to_string()),
            ],
        )
        .await
    }

    /// Timeseries of aggregated devices on a channel
    pub async fn channel_aggregated(
        &self,
        query: &AggregateQuery,
        channel_type: Option<&str>,
        agg_func: &str,
    ) -> EfergyResult<Value> {
        let mut params = self.cache_params(query);
        params.push(("aggPeriod", query.agg_period.to_string()));
        params.push(("aggFunc", agg_func.to_owned()));
        push_opt(&mut params, "type", channel_type);
        self.get("getChannelAggregated", &params).await
    }

    /// Comparison with other households for day, week and month
    pub async fn comp_combined(&self) -> EfergyResult<Value> {
        self.get("getCompCombined", &[]).await
    }

    pub async fn comp_day(&self) -> EfergyResult<Value> {
        self.get("getCompDay", &[]).await
    }

    pub async fn comp_week(&self) -> EfergyResult<Value> {
        self.get("getCompWeek", &[]).await
    }

    pub async fn comp_month(&self) -> EfergyResult<Value> {
        self.get("getCompMonth", &[]).await
    }

    pub async fn comp_year(&self) -> EfergyResult<Value> {
        self.get("getCompYear", &[]).await
    }

    /// Timeseries of consumption, cost and CO2
    pub async fn consumption_co2_graph(&self, query: &AggregateQuery) -> EfergyResult<Value> {
        let mut params = self.cache_params(query);
        params.push(("aggPeriod", query.agg_period.to_string()));
        self.get("getConsumptionCostCO2Graph", &params).await
    }

    /// Share of consumption generated at home versus imported
    ///
    /// Only meaningful with PWER and PWER_GAC channels.
    pub async fn generated_consumption_import(&self, query: &AggregateQuery) -> EfergyResult<Value> {
        let command = "getConsumptionGeneratedAndImport";
        let data = self.get(command, &self.cache_params(query)).await?;
        data_field(command, data)
    }

    /// Share of generation used at home versus exported
    ///
    /// Only meaningful with PWER and PWER_GAC channels.
    pub async fn generated_consumption_export(&self, query: &AggregateQuery) -> EfergyResult<Value> {
        let command = "getGeneratedConsumptionAndExport";
        let data = self.get(command, &self.cache_params(query)).await?;
        data_field(command, data)
    }

    /// Countries and their mains voltage
    pub async fn country_list(&self) -> EfergyResult<Value> {
        self.get("getCountryList", &[]).await
    }

    /// Minute resolution consumption for the previous 24 hours
    pub async fn day(&self, previous_period: u32, cache: bool) -> EfergyResult<Value> {
        let data = self
            .get(
                "getDay",
                &[
                    ("getPreviousPeriod", previous_period.to_string()),
                    ("cache", flag(cache)),
                ],
            )
            .await?;
        data_field("getDay", data)
    }

    /// Hour resolution consumption for the previous week
    pub async fn week(
        &self,
        previous_period: u32,
        cache: bool,
        data_type: DataType,
    ) -> EfergyResult<Value> {
        self.history("getWeek", Some(previous_period), cache, data_type)
            .await
    }

    /// Day resolution consumption for the previous month
    pub async fn month(
        &self,
        previous_period: u32,
        cache: bool,
        data_type: DataType,
    ) -> EfergyResult<Value> {
        self.history("getMonth", Some(previous_period), cache, data_type)
            .await
    }

    /// Month resolution consumption for the previous year
    pub async fn year(&self, cache: bool, data_type: DataType) -> EfergyResult<Value> {
        self.history("getYear", None, cache, data_type).await
    }

    async fn history(
        &self,
        command: &str,
        previous_period: Option<u32>,
        cache: bool,
        data_type: DataType,
    ) -> EfergyResult<Value> {
        let mut params = Vec::new();
        push_opt(&mut params, "getPreviousPeriod", previous_period);
        params.push(("cache", flag(cache)));
        params.push(("dataType", data_type.as_str().to_owned()));
        let data = self.get(command, &params).await?;
        data_field(command, data)
    }

    /// Estimated usage for the current day and month
    pub async fn estimated_combined(&self) -> EfergyResult<Value> {
        self.get("getEstCombined", &[]).await
    }

    /// Time of the first data point (UTC)
    pub async fn first_data(&self) -> EfergyResult<Value> {
        self.get("getFirstData", &[]).await
    }

    /// Forecast of consumption, emissions and cost (if a tariff is set)
    pub async fn forecast(&self, period: Period) -> EfergyResult<Value> {
        self.get("getForecast", &[("period", period.to_string())])
            .await
    }

    /// Timeseries of consumption, revenue and CO2 saved
    pub async fn generated_energy_revenue_carbon(
        &self,
        query: &AggregateQuery,
    ) -> EfergyResult<Value> {
        let mut params = self.cache_params(query);
        params.push(("aggPeriod", query.agg_period.to_string()));
        self.get("getGeneratedEnergyRevenueCarbon", &params).await
    }

    /// Timeseries of consumed, generated, self-consumed, exported and imported energy
    pub async fn generated_consumption_graph(&self, query: &AggregateQuery) -> EfergyResult<Value> {
        let mut params = self.cache_params(query);
        params.push(("aggPeriod", query.agg_period.to_string()));
        self.get("getGenerationConsumptionGraph", &params).await
    }

    /// Same as [`Self::generated_consumption_graph`] with costs and revenue
    pub async fn generated_consumption_graph_cost_revenue(
        &self,
        query: &AggregateQuery,
    ) -> EfergyResult<Value> {
        let mut params = self.cache_params(query);
        params.push(("aggPeriod", query.agg_period.to_string()));
        self.get("getGenerationConsumptionGraphCostRevenue", &params)
            .await
    }

    pub async fn historical_values(&self, period: Period, channel_type: &str) -> EfergyResult<Value> {
        self.get(
            "getHV",
            &[("period", period.to_string()), ("type", channel_type.to_owned())],
        )
        .await
    }

    /// Household attributes
    pub async fn household(&self) -> EfergyResult<Value> {
        self.get("getHousehold", &[]).await
    }

    /// Allowed values for the household attributes
    pub async fn household_data_reference(&self) -> EfergyResult<Value> {
        self.get("getHouseholdDataReference", &[]).await
    }

    pub async fn mac(&self) -> EfergyResult<Value> {
        self.get("getMAC", &[]).await
    }

    pub async fn mac_status(&self, mac: &str) -> EfergyResult<Value> {
        self.get("getMACStatus", &[("mac_address", mac.to_owned())])
            .await
    }

    /// Pulse rate of an IR clamp
    pub async fn pulse(&self, sid: i64) -> EfergyResult<Value> {
        self.get("getPulse", &[("sid", sid.to_string())]).await
    }

    pub async fn tariff(&self) -> EfergyResult<Value> {
        self.get("getTariff", &[]).await
    }

    /// Consumption timeseries over an arbitrary window
    pub async fn time_series(
        &self,
        query: &AggregateQuery,
        agg_func: &str,
        cache: bool,
        data_type: DataType,
    ) -> EfergyResult<Value> {
        let mut params = Vec::new();
        query.window(&mut params);
        params.push(("aggPeriod", query.agg_period.to_string()));
        params.push(("aggFunc", agg_func.to_owned()));
        params.push(("cache", flag(cache)));
        params.push(("dataType", data_type.as_str().to_owned()));
        self.get("getTimeSeries", &params).await
    }

    /// Current weather at the household location
    pub async fn weather(
        &self,
        city: &str,
        country: &str,
        timestamp: Option<i64>,
    ) -> EfergyResult<Value> {
        let mut params = vec![("city", city.to_owned()), ("country", country.to_owned())];
        push_opt(&mut params, "timestamp", timestamp);
        self.get("getWeather", &params).await
    }

    /// Set the monthly budget
    pub async fn set_budget(&self, budget: f64) -> EfergyResult<Value> {
        self.get("setBudget", &[("budget", budget.to_string())])
            .await
    }
}
