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

use crate::errors::{EfergyError, EfergyResult};
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("efergy-api/", env!("CARGO_PKG_VERSION"));

/// Holds the HTTP session shared by every request of one client
///
/// A session we build ourselves is opened on first use and dropped when the
/// outermost scope exits. A session handed in by the caller belongs to the
/// caller and is never dropped here.
#[derive(Debug)]
pub struct SessionManager {
    slot: Mutex<SessionSlot>,
}

#[derive(Debug)]
struct SessionSlot {
    http: Option<Client>,
    external: bool,
    scopes: usize,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(SessionSlot {
                http: None,
                external: false,
                scopes: 0,
            }),
        }
    }

    pub fn with_external(client: Client) -> Self {
        Self {
            slot: Mutex::new(SessionSlot {
                http: Some(client),
                external: true,
                scopes: 0,
            }),
        }
    }

    /// Current session, opening one if needed
    pub fn acquire(&self) -> EfergyResult<Client> {
        Self::open(&mut self.slot.lock())
    }

    /// Enter a scope, opening the session if this is the outermost one
    pub fn enter(&self) -> EfergyResult<()> {
        let mut slot = self.slot.lock();
        Self::open(&mut slot)?;
        slot.scopes += 1;
        debug!("[EFERGY SESSION] Entered scope (depth {})", slot.scopes);
        Ok(())
    }

    /// Leave a scope, closing an owned session once no scope remains
    pub fn exit(&self) {
        let mut slot = self.slot.lock();
        slot.scopes = slot.scopes.saturating_sub(1);
        debug!("[EFERGY SESSION] Left scope (depth {})", slot.scopes);
        if slot.scopes == 0 {
            Self::release(&mut slot);
        }
    }

    /// Drop an owned session regardless of open scopes
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        Self::release(&mut slot);
    }

    pub fn is_open(&self) -> bool {
        self.slot.lock().http.is_some()
    }

    pub fn is_external(&self) -> bool {
        self.slot.lock().external
    }

    fn open(slot: &mut SessionSlot) -> EfergyResult<Client> {
        if let Some(client) = &slot.http {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EfergyError::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        info!("🔌 [EFERGY SESSION] Opened HTTP session");
        slot.http = Some(client.clone());
        Ok(client)
    }

    fn release(slot: &mut SessionSlot) {
        if slot.external {
            return;
        }
        if slot.http.take().is_some() {
            info!("🔌 [EFERGY SESSION] Closed HTTP session");
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
