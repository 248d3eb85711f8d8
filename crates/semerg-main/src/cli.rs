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

//! CLI argument definitions using clap.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "semerg")]
#[command(author, version, about = "SEMERG spot price and production data tool")]
#[command(
    long_about = "Fetch day-ahead electricity prices and wind/solar production, and turn spot\n\
    prices into what a household actually pays.\n\
    \nCustomer price = spot * 1.255 (positive prices only) + margin + electricity tax\n\
    + supply-security fee + transmission fee (day 07-22, night otherwise).\n\
    \nExamples:\n  \
    semerg gather-data --output data.json        # Today's and tomorrow's dataset\n  \
    semerg adjust --input data.json --format table\n  \
    semerg tariff                                # Show the effective tariff"
)]
pub struct Cli {
    /// Config file (defaults to $SEMERG_CONFIG or ~/.semerg/config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch prices and production data and write the chart dataset
    #[command(
        long_about = "Download day-ahead prices from the ENTSO-E Transparency Platform and\n\
        wind/solar production from Fingrid, adjust the prices and write the dataset.\n\
        \nThe window starts at local midnight of --date and covers two civil days.\n\
        Requires both API tokens (config file or SEMERG_ENTSOE_TOKEN / SEMERG_FINGRID_TOKEN).\n\
        \nExamples:\n  \
        semerg gather-data\n  \
        semerg gather-data --date 2024-03-30 --output public/data.json\n  \
        semerg gather-data --include-overhead false"
    )]
    GatherData(GatherArgs),

    /// Adjust the prices of a dataset or a bare price array
    #[command(
        long_about = "Read base prices and print the customer prices.\n\
        \nInput is either a dataset written by gather-data (its basePrices are used)\n\
        or a JSON array of {\"startTime\": ..., \"price\": ...} objects.\n\
        Timestamps without an offset are read in the tariff time zone.\n\
        \nExamples:\n  \
        semerg adjust --input data.json\n  \
        semerg adjust --input prices.json --format table --timezone Europe/Stockholm"
    )]
    Adjust(AdjustArgs),

    /// Print the effective tariff
    Tariff,
}

#[derive(Debug, Parser)]
pub struct GatherArgs {
    /// First day of the window, YYYY-MM-DD or "today"
    #[arg(long, default_value = "today")]
    pub date: String,

    /// Output file (pretty JSON to stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Add margin, taxes and transmission fee on top of VAT
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub include_overhead: Option<bool>,
}

#[derive(Debug, Parser)]
pub struct AdjustArgs {
    /// Dataset or price array to read
    #[arg(long, short)]
    pub input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// IANA time zone for the day/night fee (overrides the config)
    #[arg(long)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Resolve `--date`, reading "today" on the wall clock of `tz`
pub fn resolve_date(raw: &str, tz: Tz) -> Result<NaiveDate> {
    if raw.eq_ignore_ascii_case("today") {
        return Ok(Utc::now().with_timezone(&tz).date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid --date '{raw}', expected YYYY-MM-DD or 'today'"))
}
