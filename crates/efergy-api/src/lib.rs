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

//! Async client for the Efergy energy meter web API
//!
//! ```no_run
//! # use efergy_api::EfergyClient;
//! # async fn example() -> efergy_api::EfergyResult<()> {
//! let client = EfergyClient::new("token")?.with_utc_offset("America/New_York")?;
//! let session = client.open()?;
//! let watts = session.get_reading("instant_readings").await?;
//! println!("{watts:?}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod currency;
pub mod endpoints;
pub mod errors;
pub mod offset;
pub mod reading;
pub mod session;
pub mod types;

pub use client::{EfergyClient, Params, SessionGuard};
pub use config::EfergyConfig;
pub use currency::Currency;
pub use endpoints::{AggregateQuery, DataType};
pub use errors::{EfergyError, EfergyResult};
pub use offset::UtcOffset;
pub use reading::{Period, ReadingRequest, ReadingType, ResolvedReading, resolve};
pub use types::{HubInfo, HubStatus, MacStatus, Reading, SensorSummary};

pub use reqwest::Method;
