//! Environment-style configuration with documented defaults.
//!
//! Flat named settings only; no cascading config objects. Every value has a
//! default suitable for local development, so the server starts with an
//! empty environment.

use std::{env, str::FromStr, time::Duration};

use bigdecimal::BigDecimal;
use quotation_pdf::{error::AddContext, Error, ExportConfig, DEFAULT_CURRENCY};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PORT`, default 8080.
    pub port: u16,
    /// `PUBLIC_BASE_URL`: base used to build the internal print-page
    /// navigation URL. Default `http://127.0.0.1:<port>`.
    pub public_base_url: String,
    /// `WEBDRIVER_URL`, default `http://localhost:4444`.
    pub webdriver_url: String,
    /// `SPAWN_CHROMEDRIVER`: start a chromedriver child at boot. Default false.
    pub spawn_chromedriver: bool,
    /// `CHROMEDRIVER_PORT`, default 4444.
    pub chromedriver_port: u16,
    /// `DEFAULT_CURRENCY`, default `EUR`.
    pub default_currency: String,
    /// `DEFAULT_TAX_RATE_PERCENT`, default 23.
    pub default_tax_rate_percent: BigDecimal,
    /// `NAVIGATION_TIMEOUT_MS`, default 10000.
    pub navigation_timeout: Duration,
    /// `CONTENT_WAIT_TIMEOUT_MS`, default 10000.
    pub content_wait_timeout: Duration,
}

impl ServerConfig {
    pub fn load() -> Result<Self, Error> {
        let port: u16 = parse_env("PORT", "8080")?;
        let public_base_url = get_env(
            "PUBLIC_BASE_URL",
            &format!("http://127.0.0.1:{port}"),
        );
        Ok(ServerConfig {
            port,
            public_base_url,
            webdriver_url: get_env("WEBDRIVER_URL", "http://localhost:4444"),
            spawn_chromedriver: parse_env("SPAWN_CHROMEDRIVER", "false")?,
            chromedriver_port: parse_env("CHROMEDRIVER_PORT", "4444")?,
            default_currency: get_env("DEFAULT_CURRENCY", DEFAULT_CURRENCY),
            default_tax_rate_percent: parse_env("DEFAULT_TAX_RATE_PERCENT", "23")?,
            navigation_timeout: Duration::from_millis(parse_env("NAVIGATION_TIMEOUT_MS", "10000")?),
            content_wait_timeout: Duration::from_millis(parse_env(
                "CONTENT_WAIT_TIMEOUT_MS",
                "10000",
            )?),
        })
    }

    /// Exporter settings derived from this configuration.
    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            webdriver_url: self.webdriver_url.clone(),
            print_page_url: format!("{}/print", self.public_base_url.trim_end_matches('/')),
            default_currency: self.default_currency.clone(),
            default_tax_rate_percent: self.default_tax_rate_percent.clone(),
            navigation_timeout: self.navigation_timeout,
            content_wait_timeout: self.content_wait_timeout,
            ..ExportConfig::default()
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default)
        .parse()
        .map_err(|e: T::Err| Error::from(format!("{key}: {e}")))
        .add_context("loading configuration")
}
