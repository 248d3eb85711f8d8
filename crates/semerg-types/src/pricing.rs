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

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

/// Day-ahead base market price for one interval (c/kWh, before tax)
///
/// `start_time` keeps the timestamp exactly as it appears in the dataset. Parsing it
/// into a civil time is the price adjuster's job, so a malformed value surfaces there
/// with the index of the offending point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub start_time: String,
    pub price: f64,
}

impl PricePoint {
    pub fn new(start_time: impl Into<String>, price: f64) -> Self {
        Self {
            start_time: start_time.into(),
            price,
        }
    }

    /// Build a point from a zoned timestamp, rendered as RFC 3339 with offset
    pub fn at<Tz>(start: &DateTime<Tz>, price: f64) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self::new(start.to_rfc3339_opts(SecondsFormat::Secs, true), price)
    }
}

/// Customer-facing price for one interval, derived from a [`PricePoint`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedPricePoint {
    /// Interval start in the tariff's civil time zone
    pub start_time: DateTime<FixedOffset>,

    /// Price including VAT and fees (c/kWh)
    pub price: f64,
}
