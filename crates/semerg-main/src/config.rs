// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SEMERG.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Configuration loaded from `~/.semerg/config` (TOML) with environment overrides

use chrono_tz::Tz;
use semerg_core::Tariff;
use semerg_core::sources::{entsoe, fingrid};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "SEMERG_CONFIG";
pub const ENTSOE_TOKEN_ENV: &str = "SEMERG_ENTSOE_TOKEN";
pub const FINGRID_TOKEN_ENV: &str = "SEMERG_FINGRID_TOKEN";
pub const TIMEZONE_ENV: &str = "SEMERG_TIMEZONE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing {0}, set it in the config file or environment")]
    MissingToken(&'static str),

    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_entsoe_base_url() -> String {
    entsoe::DEFAULT_BASE_URL.to_owned()
}

fn default_bidding_zone() -> String {
    entsoe::DEFAULT_BIDDING_ZONE.to_owned()
}

fn default_fingrid_base_url() -> String {
    fingrid::DEFAULT_BASE_URL.to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    #[serde(default)]
    pub entsoe: EntsoeConfig,

    #[serde(default)]
    pub fingrid: FingridConfig,

    #[serde(default)]
    pub tariff: TariffConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntsoeConfig {
    /// Transparency Platform security token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,

    #[serde(default = "default_entsoe_base_url")]
    pub base_url: String,

    /// EIC code of the bidding zone
    #[serde(default = "default_bidding_zone")]
    pub bidding_zone: String,
}

impl Default for EntsoeConfig {
    fn default() -> Self {
        Self {
            security_token: None,
            base_url: default_entsoe_base_url(),
            bidding_zone: default_bidding_zone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FingridConfig {
    /// Open-data API key, sent as `x-api-key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_token: Option<String>,

    #[serde(default = "default_fingrid_base_url")]
    pub base_url: String,
}

impl Default for FingridConfig {
    fn default() -> Self {
        Self {
            authentication_token: None,
            base_url: default_fingrid_base_url(),
        }
    }
}

/// Optional tariff overrides; anything unset keeps the built-in value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TariffConfig {
    pub timezone: Option<String>,
    pub vat_multiplier: Option<f64>,
    pub margin: Option<f64>,
    pub electricity_tax: Option<f64>,
    pub supply_security_fee: Option<f64>,
    pub transmission_fee_day: Option<f64>,
    pub transmission_fee_night: Option<f64>,
    pub day_start_hour: Option<u32>,
    pub day_end_hour: Option<u32>,
    pub include_overhead: Option<bool>,
}

/// `$SEMERG_CONFIG`, else `$HOME/.semerg/config`
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".semerg").join("config"))
}

impl AppConfig {
    /// Load the config file and apply environment overrides.
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    info!("No config file at {}, using defaults", path.display());
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides looked up by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENTSOE_TOKEN_ENV).filter(|t| !t.is_empty()) {
            debug!("ENTSO-E token taken from {ENTSOE_TOKEN_ENV}");
            self.entsoe.security_token = Some(token);
        }
        if let Some(token) = lookup(FINGRID_TOKEN_ENV).filter(|t| !t.is_empty()) {
            debug!("Fingrid token taken from {FINGRID_TOKEN_ENV}");
            self.fingrid.authentication_token = Some(token);
        }
        if let Some(tz) = lookup(TIMEZONE_ENV).filter(|t| !t.is_empty()) {
            self.tariff.timezone = Some(tz);
        }
    }

    pub fn entsoe_token(&self) -> Result<&str, ConfigError> {
        self.entsoe
            .security_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken("entsoe.security-token"))
    }

    pub fn fingrid_token(&self) -> Result<&str, ConfigError> {
        self.fingrid
            .authentication_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken("fingrid.authentication-token"))
    }

    /// Build and validate the effective tariff
    pub fn tariff(&self) -> Result<Tariff, ConfigError> {
        let overrides = &self.tariff;
        let mut tariff = Tariff::default();

        if let Some(name) = &overrides.timezone {
            tariff.timezone = parse_timezone(name)?;
        }
        if let Some(v) = overrides.vat_multiplier {
            tariff.vat_multiplier = v;
        }
        if let Some(v) = overrides.margin {
            tariff.margin = v;
        }
        if let Some(v) = overrides.electricity_tax {
            tariff.electricity_tax = v;
        }
        if let Some(v) = overrides.supply_security_fee {
            tariff.supply_security_fee = v;
        }
        if let Some(v) = overrides.transmission_fee_day {
            tariff.transmission_fee_day = v;
        }
        if let Some(v) = overrides.transmission_fee_night {
            tariff.transmission_fee_night = v;
        }
        if let Some(v) = overrides.day_start_hour {
            tariff.day_start_hour = v;
        }
        if let Some(v) = overrides.day_end_hour {
            tariff.day_end_hour = v;
        }
        if let Some(v) = overrides.include_overhead {
            tariff.include_overhead = v;
        }

        tariff
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(tariff)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(name.to_owned()))
}
