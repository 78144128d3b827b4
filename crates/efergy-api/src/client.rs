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

use crate::currency::Currency;
use crate::errors::{EfergyError, EfergyResult};
use crate::offset::UtcOffset;
use crate::reading::{ReadingRequest, ReadingType, resolve};
use crate::session::SessionManager;
use crate::types::Reading;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::ops::Deref;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

pub const DEFAULT_BASE_URL: &str = "https://engage.efergy.com/mobile_proxy";
pub const ALTERNATE_BASE_URL: &str = "https://www.energyhive.com/mobile_proxy";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_TTL: u64 = 60;

/// Query or body parameters of a proxy call
pub type Params = Vec<(&'static str, String)>;

/// Efergy mobile proxy client
#[derive(Debug)]
pub struct EfergyClient {
    token: String,
    base_url: String,
    utc_offset: UtcOffset,
    currency: Option<Currency>,
    cache_ttl: u64,
    timeout: Duration,
    session: SessionManager,
}

impl EfergyClient {
    /// Create a client for the default host
    pub fn new(token: impl Into<String>) -> EfergyResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(EfergyError::InvalidToken);
        }

        Ok(Self {
            token,
            base_url: DEFAULT_BASE_URL.to_owned(),
            utc_offset: UtcOffset::UTC,
            currency: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
            session: SessionManager::new(),
        })
    }

    /// Set the UTC offset from a literal offset (`"-05:00"`) or a timezone name
    pub fn with_utc_offset(mut self, offset: &str) -> EfergyResult<Self> {
        self.utc_offset = UtcOffset::parse(offset)?;
        debug!(
            "UTC offset '{}' -> {} (api value {})",
            offset,
            self.utc_offset,
            self.utc_offset.api_value()
        );
        Ok(self)
    }

    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Expected ISO 4217 currency of cost readings
    pub fn with_currency(mut self, code: &str) -> EfergyResult<Self> {
        self.currency = Some(Currency::parse(code)?);
        Ok(self)
    }

    /// Use a caller-owned HTTP session; the client never closes it
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.session = SessionManager::with_external(client);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Switch between the default host and the energyhive.com mirror
    pub fn with_alternate_host(self, alternate: bool) -> Self {
        self.with_base_url(if alternate {
            ALTERNATE_BASE_URL
        } else {
            DEFAULT_BASE_URL
        })
    }

    /// `cacheTTL` sent with aggregating calls
    pub fn with_cache_ttl(mut self, cache_ttl: u64) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub fn currency(&self) -> Option<Currency> {
        self.currency
    }

    pub fn cache_ttl(&self) -> u64 {
        self.cache_ttl
    }

    /// Open a session scope; the session is released when the guard drops
    ///
    /// Scopes nest: only the outermost guard closes the session.
    pub fn open(&self) -> EfergyResult<SessionGuard<'_>> {
        self.session.enter()?;
        Ok(SessionGuard { client: self })
    }

    /// Close an owned session immediately; the next request reopens it
    pub fn close(&self) {
        self.session.close();
    }

    pub fn is_session_open(&self) -> bool {
        self.session.is_open()
    }

    /// Get a reading by type name (`instant_readings`, `energy_day`, `budget`, ...)
    pub async fn get_reading(&self, reading_type: &str) -> EfergyResult<Reading> {
        self.get_reading_with(&ReadingRequest::new(reading_type))
            .await
    }

    pub async fn get_reading_with(&self, request: &ReadingRequest) -> EfergyResult<Reading> {
        let resolved = resolve(request)?;
        let data = self
            .request(Method::GET, resolved.command, &resolved.params)
            .await?;

        if resolved.reading_type == ReadingType::Cost {
            self.check_cost_currency(&data);
        }

        let reading = resolved.extract(data)?;
        debug!("✅ [EFERGY READING] {} = {:?}", request.name, reading);
        Ok(reading)
    }

    fn check_cost_currency(&self, data: &Value) {
        let Some(currency) = self.currency else {
            return;
        };
        let units = data.get("units").and_then(Value::as_str);
        if units != Some(currency.code()) {
            debug!(
                "Currency provided ({}) does not match device settings ({:?}). \
                 This can affect energy cost statistics",
                currency, units
            );
        }
    }

    /// Send one authenticated call to the proxy and return its parsed JSON
    ///
    /// GET carries `params` in the query string, POST as a JSON object body.
    /// The token and UTC offset are always query parameters.
    pub async fn request<K>(
        &self,
        method: Method,
        command: &str,
        params: &[(K, String)],
    ) -> EfergyResult<Value>
    where
        K: AsRef<str> + Serialize + Debug + Sync,
    {
        let url = format!("{}/{}", self.base_url, command);
        debug!("🔍 [EFERGY QUERY] {} {}", method, command);
        debug!("   Params: {:?}", params);

        let http = self.session.acquire()?;
        let offset = self.utc_offset.api_value().to_string();
        let mut builder = http
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .query(&[("token", self.token.as_str()), ("offset", offset.as_str())]);

        builder = if method == Method::GET {
            builder.query(params)
        } else {
            let body: Map<String, Value> = params
                .iter()
                .map(|(key, value)| (key.as_ref().to_owned(), Value::String(value.clone())))
                .collect();
            builder.json(&body)
        };

        let response = builder.send().await.map_err(|e| transport_error(command, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(command, e))?;

        check_status(command, status, &body)?;

        if body.trim().is_empty() {
            trace!("   Empty body from {}", command);
            return Ok(Value::Object(Map::new()));
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| {
            error!("❌ [EFERGY ERROR] Malformed JSON from {}: {}", command, e);
            EfergyError::ParseError(e)
        })?;
        trace!("   Response: {}", data);

        check_payload(command, data)
    }
}

/// Scope over an open session; dereferences to the client
#[derive(Debug)]
pub struct SessionGuard<'a> {
    client: &'a EfergyClient,
}

impl Deref for SessionGuard<'_> {
    type Target = EfergyClient;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.client.session.exit();
    }
}

fn transport_error(command: &str, e: reqwest::Error) -> EfergyError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        error!("❌ [EFERGY ERROR] {} failed to reach the proxy: {}", command, e);
        EfergyError::ConnectError(e.to_string())
    } else {
        error!("❌ [EFERGY ERROR] {} HTTP failure: {}", command, e);
        EfergyError::HttpError(e)
    }
}

fn check_status(command: &str, status: StatusCode, body: &str) -> EfergyResult<()> {
    if status.is_success() {
        return Ok(());
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            error!("❌ [EFERGY ERROR] Authentication failed for: {}", command);
            Err(EfergyError::InvalidToken)
        }
        StatusCode::REQUEST_TIMEOUT => {
            error!("❌ [EFERGY ERROR] Proxy timed out serving: {}", command);
            Err(EfergyError::ConnectError(format!(
                "{command}: proxy answered {status}"
            )))
        }
        status => {
            error!("❌ [EFERGY ERROR] Status {} for {}: {}", status, command, body);
            Err(EfergyError::service(Some(status.as_u16()), body))
        }
    }
}

/// Map error payloads the proxy returns with a 2xx status
fn check_payload(command: &str, data: Value) -> EfergyResult<Value> {
    if data.get("description").and_then(Value::as_str) == Some("bad token") {
        error!("❌ [EFERGY ERROR] Token rejected for: {}", command);
        return Err(EfergyError::InvalidToken);
    }
    if data.get("desc").and_then(Value::as_str) == Some("Method call failed") {
        error!("❌ [EFERGY ERROR] Hub unreachable for: {}", command);
        return Err(EfergyError::service(
            None,
            "Error communicating with sensor/hub. Check connections",
        ));
    }

    let Some(api_error) = data.get("error") else {
        return Ok(data);
    };
    let id = api_error.get("id").and_then(|id| match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    let more = api_error
        .get("more")
        .map(|more| match more {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    match id {
        Some(400) if more.contains("period") => {
            warn!("⚠️ [EFERGY ERROR] Invalid period for {}: {}", command, more);
            Err(EfergyError::InvalidPeriod(more))
        }
        Some(400) => {
            warn!("⚠️ [EFERGY ERROR] Data error for {}: {}", command, data);
            Err(EfergyError::DataError(data))
        }
        Some(404) => {
            error!("❌ [EFERGY ERROR] Daily call limit reached ({})", command);
            Err(EfergyError::ApiCallLimit)
        }
        Some(500) => {
            error!("❌ [EFERGY ERROR] Hub error for {}: {}", command, more);
            Err(EfergyError::service(
                Some(500),
                "Error communicating with sensor/hub. Check connections",
            ))
        }
        _ => Ok(data),
    }
}
