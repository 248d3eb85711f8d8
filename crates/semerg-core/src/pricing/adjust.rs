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

//! Day-ahead price → customer price.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use semerg_types::{AdjustedPricePoint, PricePoint};
use tracing::debug;

use super::tariff::Tariff;
use crate::error::{PricingError, PricingResult};

/// Offset-carrying formats that are not strict RFC 3339 (e.g. `+0000`)
const OFFSET_FORMATS: [&str; 1] = ["%Y-%m-%dT%H:%M:%S%.f%z"];

/// Civil-time formats without offset, read as wall clock in the tariff zone
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a dataset timestamp into the given zone.
///
/// Timestamps with an offset are converted; naive timestamps are taken as wall-clock
/// time in `tz`. A naive time repeated by a DST fall-back resolves to the earlier
/// instant, a naive time skipped by a spring-forward gap is rejected.
pub fn parse_start_time(raw: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&tz));
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("unparseable timestamp '{raw}'"))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(format!("'{raw}' does not exist in {}", tz.name())),
    }
}

/// Adjust a single base price observed at local `hour`
pub fn adjust_price(price: f64, hour: u32, tariff: &Tariff) -> f64 {
    // VAT is not charged on amounts paid to the customer
    let mut adjusted = if price > 0.0 {
        price * tariff.vat_multiplier
    } else {
        price
    };

    if tariff.include_overhead {
        adjusted += tariff.surcharge() + tariff.transmission_fee(hour);
    }

    adjusted
}

fn adjust_point(
    index: usize,
    point: &PricePoint,
    tariff: &Tariff,
) -> PricingResult<AdjustedPricePoint> {
    if !point.price.is_finite() {
        return Err(PricingError::InvalidPricePoint {
            index,
            reason: format!("price must be a finite number, got {}", point.price),
        });
    }

    let start = parse_start_time(&point.start_time, tariff.timezone)
        .map_err(|reason| PricingError::InvalidPricePoint { index, reason })?;

    Ok(AdjustedPricePoint {
        start_time: start.fixed_offset(),
        price: adjust_price(point.price, start.hour(), tariff),
    })
}

/// Adjust every point, one output per input and in the same order.
///
/// The first malformed point aborts the whole run.
pub fn adjust_prices(
    points: &[PricePoint],
    tariff: &Tariff,
) -> PricingResult<Vec<AdjustedPricePoint>> {
    debug!(
        "Adjusting {} price points (tz={}, overhead={})",
        points.len(),
        tariff.timezone.name(),
        tariff.include_overhead
    );

    points
        .iter()
        .enumerate()
        .map(|(index, point)| adjust_point(index, point, tariff))
        .collect()
}
