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

//! SEMERG core: customer price adjustment and the upstream data sources.
//!
//! The adjuster turns day-ahead market prices into what a household actually pays
//! (VAT, margin, taxes and a time-of-day transmission fee). The sources fetch those
//! prices from ENTSO-E and production series from Fingrid, and [`DatasetGatherer`]
//! combines everything into the dataset the price chart reads.

pub mod error;
pub mod gather;
pub mod pricing;
pub mod sources;

pub use error::{FetchError, FetchResult, PricingError, PricingResult};
pub use gather::DatasetGatherer;
pub use pricing::{Tariff, adjust_price, adjust_prices, parse_start_time};
pub use sources::{
    EntsoeClient, FetchWindow, FingridClient, PriceDataSource, ProductionDataSource,
    ProductionSeries, RetryPolicy,
};

// Re-export types for convenience
pub use semerg_types::{AdjustedPricePoint, EnergyDataset, PricePoint, ProductionPoint};
