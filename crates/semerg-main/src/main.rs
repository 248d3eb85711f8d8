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

mod cli;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use semerg_core::{DatasetGatherer, EntsoeClient, FingridClient, adjust_prices};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{AdjustArgs, Cli, Commands, GatherArgs, OutputFormat};
use crate::config::{AppConfig, parse_timezone};
use crate::output::PriceInput;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for JSON output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::GatherData(args) => gather_data(&config, args).await,
        Commands::Adjust(args) => adjust(&config, &args),
        Commands::Tariff => {
            let tariff = config.tariff().context("Invalid tariff configuration")?;
            println!("{}", output::tariff_table(&tariff));
            Ok(())
        }
    }
}

async fn gather_data(config: &AppConfig, args: GatherArgs) -> Result<()> {
    let mut tariff = config.tariff().context("Invalid tariff configuration")?;
    if let Some(include_overhead) = args.include_overhead {
        tariff = tariff.with_overhead(include_overhead);
    }
    let date = cli::resolve_date(&args.date, tariff.timezone)?;

    let entsoe = EntsoeClient::new(
        config.entsoe.base_url.as_str(),
        config.entsoe_token()?,
        config.entsoe.bidding_zone.as_str(),
    )
    .context("Failed to create ENTSO-E client")?;
    let fingrid = FingridClient::new(config.fingrid.base_url.as_str(), config.fingrid_token()?)
        .context("Failed to create Fingrid client")?;

    let gatherer = DatasetGatherer::new(Arc::new(entsoe), Arc::new(fingrid), tariff);
    let dataset = gatherer
        .gather(date)
        .await
        .with_context(|| format!("Failed to gather data for {date}"))?;

    output::write_json(&dataset, args.output.as_deref()).context("Failed to write dataset")?;
    if let Some(path) = &args.output {
        info!("Dataset written to {}", path.display());
    }
    Ok(())
}

fn adjust(config: &AppConfig, args: &AdjustArgs) -> Result<()> {
    let mut tariff = config.tariff().context("Invalid tariff configuration")?;
    if let Some(name) = &args.timezone {
        tariff = tariff.with_timezone(parse_timezone(name)?);
    }

    let prices = PriceInput::read(&args.input)?.into_prices();
    let adjusted = adjust_prices(&prices, &tariff)
        .with_context(|| format!("Failed to adjust prices from {}", args.input.display()))?;
    info!("Adjusted {} prices", adjusted.len());

    match args.format {
        OutputFormat::Json => output::write_json(&adjusted, args.output.as_deref()),
        OutputFormat::Table => output::write_text(
            &output::price_table(&prices, &adjusted, &tariff),
            args.output.as_deref(),
        ),
    }
}
