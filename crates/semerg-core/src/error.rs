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

//! Error types for the core crate

use thiserror::Error;

/// Price adjustment errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Invalid price point at index {index}: {reason}")]
    InvalidPricePoint { index: usize, reason: String },

    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),
}

pub type PricingResult<T> = Result<T, PricingError>;

/// Errors from the ENTSO-E and Fingrid data sources
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} API returned error status {status}: {message}")]
    Api {
        source_name: &'static str,
        status: u16,
        message: String,
    },

    #[error("Authentication failed for {0}")]
    AuthenticationFailed(&'static str),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data available: {0}")]
    NoData(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Price adjustment failed: {0}")]
    Pricing(#[from] PricingError),
}

pub type FetchResult<T> = Result<T, FetchError>;
