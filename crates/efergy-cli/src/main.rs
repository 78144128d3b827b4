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

//! Efergy CLI - query an Efergy hub from the command line
//!
//! Logs go to stderr, results are printed to stdout as JSON.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use efergy_api::{EfergyClient, EfergyConfig, Method, Period, ReadingRequest};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "efergy")]
#[command(about = "Query the Efergy energy meter web API", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API token (overrides the config file)
    #[arg(short, long, env = "EFERGY_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// UTC offset ("-05:00") or timezone name ("America/New_York")
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<String>,

    /// ISO 4217 currency code expected for cost readings
    #[arg(long)]
    currency: Option<String>,

    /// Use the energyhive.com host
    #[arg(long)]
    alt: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read one value (instant_readings, energy, cost, budget, current_values, ...)
    Reading {
        reading_type: String,

        #[arg(short, long)]
        period: Option<Period>,

        /// Sensor id for current_values
        #[arg(short, long)]
        sid: Option<i64>,
    },
    /// Hub status and attached devices
    Status,
    /// Sensor ids reported by the hub
    Sids,
    /// Raw call against any proxy command
    Call {
        command: String,

        /// Query parameters as KEY=VALUE
        params: Vec<String>,

        /// Send as POST with a JSON body
        #[arg(long)]
        post: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "efergy=info,efergy_api=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = build_client(&cli)?;

    let session = client.open().context("Failed to open HTTP session")?;
    let output = match cli.command {
        Command::Reading {
            reading_type,
            period,
            sid,
        } => {
            let mut request = ReadingRequest::new(reading_type);
            if let Some(period) = period {
                request = request.with_period(period);
            }
            if let Some(sid) = sid {
                request = request.with_sid(sid);
            }
            let reading = session
                .get_reading_with(&request)
                .await
                .with_context(|| format!("Failed to read {}", request.name))?;
            serde_json::to_value(reading)?
        }
        Command::Status => {
            let status = session.get_status().await.context("Failed to get hub status")?;
            serde_json::to_value(status)?
        }
        Command::Sids => {
            let sids = session.get_sids().await.context("Failed to list sensors")?;
            json!(sids)
        }
        Command::Call {
            command,
            params,
            post,
        } => {
            let params = parse_params(&params)?;
            let method = if post { Method::POST } else { Method::GET };
            session
                .request(method, &command, &params)
                .await
                .with_context(|| format!("Call to {command} failed"))?
        }
    };
    drop(session);

    print_json(&output)
}

fn build_client(cli: &Cli) -> Result<EfergyClient> {
    let mut config = match &cli.config {
        Some(path) => EfergyConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => EfergyConfig::default(),
    };

    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(offset) = &cli.offset {
        config.utc_offset = Some(offset.clone());
    }
    if let Some(currency) = &cli.currency {
        config.currency = Some(currency.clone());
    }
    if cli.alt {
        config.alternate_host = true;
    }

    let client = config
        .with_env_fallback()
        .build_client()
        .context("Invalid Efergy configuration")?;
    info!(
        "Using {} with offset {}",
        client.base_url(),
        client.utc_offset()
    );
    Ok(client)
}

fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
            _ => bail!("Expected KEY=VALUE, got '{pair}'"),
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    debug!("Printing {} bytes", text.len());
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params =
            parse_params(&["period=day".to_owned(), "note=a=b".to_owned()]).unwrap();
        assert_eq!(
            params,
            vec![
                ("period".to_owned(), "day".to_owned()),
                ("note".to_owned(), "a=b".to_owned()),
            ]
        );
    }

    #[test]
    fn test_parse_params_rejects_bare_words() {
        assert!(parse_params(&["period".to_owned()]).is_err());
        assert!(parse_params(&["=day".to_owned()]).is_err());
    }

    #[test]
    fn test_cli_parses_reading() {
        let cli = Cli::try_parse_from([
            "efergy", "--token", "abc", "--offset", "-05:00", "reading", "energy", "--period",
            "week",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert!(matches!(
            cli.command,
            Command::Reading {
                period: Some(Period::Week),
                ..
            }
        ));
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "efergy", "--token", "abc", "--offset", "-05:00", "--alt", "sids",
        ])
        .unwrap();

        let client = build_client(&cli).unwrap();
        assert_eq!(client.utc_offset().api_value(), 300);
        assert!(client.base_url().contains("energyhive"));
    }

    #[test]
    fn test_cli_call_collects_params() {
        let cli = Cli::try_parse_from([
            "efergy", "--token", "abc", "call", "getForecast", "period=month", "--post",
        ])
        .unwrap();

        let Command::Call {
            command,
            params,
            post,
        } = cli.command
        else {
            panic!("expected call");
        };
        assert_eq!(command, "getForecast");
        assert_eq!(params, vec!["period=month".to_owned()]);
        assert!(post);
    }
}
