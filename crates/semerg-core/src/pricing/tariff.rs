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

//! Retail tariff applied on top of the day-ahead price.
//!
//! All amounts are c/kWh. Values follow the Finnish retail contract the chart was built
//! for and change with regulation, so every component is a named constant and can be
//! overridden through configuration.

use chrono_tz::Tz;

use crate::error::{PricingError, PricingResult};

/// VAT multiplier applied to positive prices only
pub const VAT_MULTIPLIER: f64 = 1.255;

/// Retailer margin
pub const MARGIN: f64 = 0.5;

/// Electricity tax
pub const ELECTRICITY_TAX: f64 = 2.7776;

/// Security-of-supply fee
pub const SUPPLY_SECURITY_FEE: f64 = 0.01612;

/// Transmission fee during the day tariff window
pub const TRANSMISSION_FEE_DAY: f64 = 3.20;

/// Transmission fee outside the day tariff window
pub const TRANSMISSION_FEE_NIGHT: f64 = 1.40;

/// First hour (inclusive) of the day tariff window
pub const DAY_TARIFF_START_HOUR: u32 = 7;

/// First hour after the day tariff window (exclusive bound)
pub const DAY_TARIFF_END_HOUR: u32 = 22;

/// Civil time zone of the FI bidding zone
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Helsinki;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tariff {
    pub vat_multiplier: f64,
    pub margin: f64,
    pub electricity_tax: f64,
    pub supply_security_fee: f64,
    pub transmission_fee_day: f64,
    pub transmission_fee_night: f64,
    pub day_start_hour: u32,
    pub day_end_hour: u32,

    /// Zone whose wall clock decides between day and night transmission fee
    pub timezone: Tz,

    /// When false only VAT is applied; surcharge and transmission fee are skipped
    pub include_overhead: bool,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            vat_multiplier: VAT_MULTIPLIER,
            margin: MARGIN,
            electricity_tax: ELECTRICITY_TAX,
            supply_security_fee: SUPPLY_SECURITY_FEE,
            transmission_fee_day: TRANSMISSION_FEE_DAY,
            transmission_fee_night: TRANSMISSION_FEE_NIGHT,
            day_start_hour: DAY_TARIFF_START_HOUR,
            day_end_hour: DAY_TARIFF_END_HOUR,
            timezone: DEFAULT_TIMEZONE,
            include_overhead: true,
        }
    }
}

impl Tariff {
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_overhead(mut self, include_overhead: bool) -> Self {
        self.include_overhead = include_overhead;
        self
    }

    /// Margin + electricity tax + supply-security fee, independent of sign and hour
    pub fn surcharge(&self) -> f64 {
        self.margin + self.electricity_tax + self.supply_security_fee
    }

    /// Whether a local hour (0-23) falls in `[day_start_hour, day_end_hour)`
    pub fn is_day_hour(&self, hour: u32) -> bool {
        (self.day_start_hour..self.day_end_hour).contains(&hour)
    }

    pub fn transmission_fee(&self, hour: u32) -> f64 {
        if self.is_day_hour(hour) {
            self.transmission_fee_day
        } else {
            self.transmission_fee_night
        }
    }

    pub fn validate(&self) -> PricingResult<()> {
        let amounts = [
            ("vat_multiplier", self.vat_multiplier),
            ("margin", self.margin),
            ("electricity_tax", self.electricity_tax),
            ("supply_security_fee", self.supply_security_fee),
            ("transmission_fee_day", self.transmission_fee_day),
            ("transmission_fee_night", self.transmission_fee_night),
        ];
        if let Some((name, value)) = amounts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PricingError::InvalidTariff(format!(
                "{name} must be a finite number, got {value}"
            )));
        }

        if self.vat_multiplier <= 0.0 {
            return Err(PricingError::InvalidTariff(format!(
                "vat_multiplier must be positive, got {}",
                self.vat_multiplier
            )));
        }

        if self.day_end_hour > 24 || self.day_start_hour >= self.day_end_hour {
            return Err(PricingError::InvalidTariff(format!(
                "day tariff window {}..{} must satisfy start < end <= 24",
                self.day_start_hour, self.day_end_hour
            )));
        }

        Ok(())
    }
}
