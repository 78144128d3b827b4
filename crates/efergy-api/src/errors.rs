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

use serde_json::Value;
use thiserror::Error;

/// Efergy API error types
#[derive(Error, Debug)]
pub enum EfergyError {
    #[error("Provided API token is invalid")]
    InvalidToken,

    #[error("Unknown reading type: {0}")]
    InvalidReadingType(String),

    #[error("Provided UTC offset is invalid: {0}")]
    InvalidOffset(String),

    #[error("Provided period is invalid: {0} (options are: day, week, month, year)")]
    InvalidPeriod(String),

    #[error("Provided currency is not an ISO 4217 code: {0}")]
    InvalidCurrency(String),

    /// Hub or sensor unreachable, or the proxy answered with a server side failure.
    #[error("Service unavailable{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    ServiceUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("Connection failed: {0}")]
    ConnectError(String),

    #[error("JSON parsing error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("API key has reached the allowed number of calls per day")]
    ApiCallLimit,

    #[error("API rejected the request data: {0}")]
    DataError(Value),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl EfergyError {
    pub(crate) fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            status,
            message: message.into(),
        }
    }
}

pub type EfergyResult<T> = Result<T, EfergyError>;
