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

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::{AdjustedPricePoint, PricePoint};

/// One production reading or forecast value (MW)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPoint {
    pub start_time: DateTime<FixedOffset>,
    pub energy: f64,
}

/// The JSON document consumed by the price/production chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyDataset {
    /// When the gather run happened
    pub fetch_time: DateTime<Utc>,

    /// Fetch window start, `YYYY-MM-DDTHH:MM:SSZ`
    pub start_time: String,

    /// Fetch window end, `YYYY-MM-DDTHH:MM:SSZ`
    pub end_time: String,

    /// Day-ahead prices (c/kWh, before tax)
    pub base_prices: Vec<PricePoint>,

    /// Customer prices derived from `base_prices`
    #[serde(default)]
    pub adjusted_prices: Vec<AdjustedPricePoint>,

    /// Measured wind production
    #[serde(default)]
    pub wind_production: Vec<ProductionPoint>,

    #[serde(default)]
    pub wind_production_forecast: Vec<ProductionPoint>,

    #[serde(default)]
    pub solar_production_forecast: Vec<ProductionPoint>,
}
