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

//! Input parsing and output formatting for the CLI.

use anyhow::{Context, Result};
use chrono::Timelike;
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use semerg_core::Tariff;
use semerg_types::{AdjustedPricePoint, EnergyDataset, PricePoint};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Prices accepted by `adjust`: a full dataset or a bare price array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Dataset(Box<EnergyDataset>),
    Prices(Vec<PricePoint>),
}

impl PriceInput {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .context("Expected a dataset object or an array of {startTime, price}")
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn into_prices(self) -> Vec<PricePoint> {
        match self {
            PriceInput::Dataset(dataset) => dataset.base_prices,
            PriceInput::Prices(prices) => prices,
        }
    }
}

/// Write pretty JSON to `output`, or stdout when it is `None`
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

/// Write plain text to `output`, or stdout when it is `None`
pub fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{text}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Format base and adjusted prices side by side
pub fn price_table(
    base: &[PricePoint],
    adjusted: &[AdjustedPricePoint],
    tariff: &Tariff,
) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Start").add_attribute(Attribute::Bold),
        Cell::new("Base\n(c/kWh)").add_attribute(Attribute::Bold),
        Cell::new("Customer\n(c/kWh)").add_attribute(Attribute::Bold),
        Cell::new("Tariff").add_attribute(Attribute::Bold),
    ]);

    for (base, adjusted) in base.iter().zip(adjusted) {
        let hour = adjusted.start_time.hour();
        let period = if tariff.is_day_hour(hour) { "day" } else { "night" };

        let base_cell = if base.price < 0.0 {
            Cell::new(format!("{:.3}", base.price)).fg(Color::Green)
        } else {
            Cell::new(format!("{:.3}", base.price))
        };

        table.add_row(vec![
            Cell::new(adjusted.start_time.format("%Y-%m-%d %H:%M %:z")),
            base_cell,
            Cell::new(format!("{:.3}", adjusted.price)),
            Cell::new(period),
        ]);
    }

    table.to_string()
}

pub fn tariff_table(tariff: &Tariff) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Component").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let rows = [
        ("VAT multiplier (positive prices)", format!("{}", tariff.vat_multiplier)),
        ("Margin (c/kWh)", format!("{}", tariff.margin)),
        ("Electricity tax (c/kWh)", format!("{}", tariff.electricity_tax)),
        ("Supply-security fee (c/kWh)", format!("{}", tariff.supply_security_fee)),
        ("Surcharge total (c/kWh)", format!("{:.5}", tariff.surcharge())),
        (
            "Transmission day (c/kWh)",
            format!(
                "{} ({:02}:00-{:02}:00)",
                tariff.transmission_fee_day, tariff.day_start_hour, tariff.day_end_hour
            ),
        ),
        ("Transmission night (c/kWh)", format!("{}", tariff.transmission_fee_night)),
        ("Time zone", tariff.timezone.name().to_owned()),
        ("Overhead included", tariff.include_overhead.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    table.to_string()
}
