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

//! Client configuration loaded from TOML with environment fallbacks

use crate::client::{DEFAULT_CACHE_TTL, EfergyClient};
use crate::errors::{EfergyError, EfergyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const TOKEN_ENV: &str = "EFERGY_TOKEN";
pub const UTC_OFFSET_ENV: &str = "EFERGY_UTC_OFFSET";
pub const CURRENCY_ENV: &str = "EFERGY_CURRENCY";
pub const BASE_URL_ENV: &str = "EFERGY_BASE_URL";

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL
}

fn default_10() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfergyConfig {
    /// API token from the Efergy Engage portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Literal offset ("-05:00") or timezone name ("Europe/London")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,

    /// ISO 4217 currency expected for cost readings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Use the energyhive.com host instead of engage.efergy.com
    #[serde(default)]
    pub alternate_host: bool,

    /// Custom API base URL (overrides both hosts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    #[serde(default = "default_10")]
    pub timeout_secs: u64,
}

impl Default for EfergyConfig {
    fn default() -> Self {
        Self {
            token: None,
            utc_offset: None,
            currency: None,
            alternate_host: false,
            base_url: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout_secs: 10,
        }
    }
}

impl EfergyConfig {
    pub fn from_file(path: impl AsRef<Path>) -> EfergyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EfergyError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded Efergy configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> EfergyResult<Self> {
        toml::from_str(content)
            .map_err(|e| EfergyError::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Fill unset values from `EFERGY_*` environment variables
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset values from `lookup`; values already set are kept
    pub fn with_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.token = self.token.or_else(|| lookup(TOKEN_ENV));
        self.utc_offset = self.utc_offset.or_else(|| lookup(UTC_OFFSET_ENV));
        self.currency = self.currency.or_else(|| lookup(CURRENCY_ENV));
        self.base_url = self.base_url.or_else(|| lookup(BASE_URL_ENV));
        self
    }

    /// Build a client, validating the token, offset and currency
    pub fn build_client(&self) -> EfergyResult<EfergyClient> {
        let token = self.token.as_deref().ok_or_else(|| {
            EfergyError::ConfigError(format!(
                "Efergy token not found in config or {TOKEN_ENV} environment variable"
            ))
        })?;

        let mut client = EfergyClient::new(token)?
            .with_alternate_host(self.alternate_host)
            .with_cache_ttl(self.cache_ttl)
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url.as_str());
        }
        if let Some(offset) = &self.utc_offset {
            client = client.with_utc_offset(offset)?;
        }
        if let Some(currency) = &self.currency {
            client = client.with_currency(currency)?;
        }

        info!("Initializing Efergy client for {}", client.base_url());
        Ok(client)
    }
}
