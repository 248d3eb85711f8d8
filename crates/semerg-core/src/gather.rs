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

//! Assemble the chart dataset from the price and production sources

use chrono::{DateTime, NaiveDate, Utc};
use semerg_types::{EnergyDataset, ProductionPoint};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{FetchError, FetchResult};
use crate::pricing::{Tariff, adjust_prices};
use crate::sources::{FetchWindow, PriceDataSource, ProductionDataSource, ProductionSeries};

/// Number of civil days covered by one gather run (today and the day-ahead auction day)
pub const GATHER_DAYS: u64 = 2;

pub struct DatasetGatherer {
    prices: Arc<dyn PriceDataSource>,
    production: Arc<dyn ProductionDataSource>,
    tariff: Tariff,
}

impl std::fmt::Debug for DatasetGatherer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetGatherer")
            .field("prices", &self.prices.name())
            .field("production", &self.production.name())
            .field("tariff", &self.tariff)
            .finish()
    }
}

impl DatasetGatherer {
    pub fn new(
        prices: Arc<dyn PriceDataSource>,
        production: Arc<dyn ProductionDataSource>,
        tariff: Tariff,
    ) -> Self {
        Self {
            prices,
            production,
            tariff,
        }
    }

    pub async fn gather(&self, date: NaiveDate) -> FetchResult<EnergyDataset> {
        self.gather_at(date, Utc::now()).await
    }

    /// Gather the dataset for the window starting at local midnight of `date`
    pub async fn gather_at(
        &self,
        date: NaiveDate,
        fetch_time: DateTime<Utc>,
    ) -> FetchResult<EnergyDataset> {
        let window = FetchWindow::local_days(date, GATHER_DAYS, self.tariff.timezone)?;
        info!("Gathering dataset for {date} ({window})");

        let base_prices = self.prices.fetch_prices(&window).await?;
        if base_prices.is_empty() {
            return Err(FetchError::NoData(format!(
                "{} returned no prices for {window}",
                self.prices.name()
            )));
        }
        let adjusted_prices = adjust_prices(&base_prices, &self.tariff)?;

        // Production is requested over the span the prices actually cover
        let production_window = match (adjusted_prices.first(), adjusted_prices.last()) {
            (Some(first), Some(last)) => FetchWindow::new(
                first.start_time.with_timezone(&Utc),
                last.start_time.with_timezone(&Utc),
            ),
            _ => window,
        };

        let mut production = self.fetch_production(production_window).await;
        let mut take = |series: ProductionSeries| production.remove(&series).unwrap_or_default();
        let wind = take(ProductionSeries::Wind);
        let wind_forecast = take(ProductionSeries::WindForecast);
        let solar_forecast = take(ProductionSeries::SolarForecast);

        info!(
            "Dataset ready: {} prices, {} wind, {} wind forecast, {} solar forecast points",
            base_prices.len(),
            wind.len(),
            wind_forecast.len(),
            solar_forecast.len()
        );

        Ok(EnergyDataset {
            fetch_time,
            start_time: window.start_param(),
            end_time: window.end_param(),
            base_prices,
            adjusted_prices,
            wind_production: wind,
            wind_production_forecast: wind_forecast,
            solar_production_forecast: solar_forecast,
        })
    }

    /// Fetch every production series concurrently; failed series are left out
    async fn fetch_production(
        &self,
        window: FetchWindow,
    ) -> HashMap<ProductionSeries, Vec<ProductionPoint>> {
        let mut tasks = JoinSet::new();
        for &series in ProductionSeries::all() {
            let source = Arc::clone(&self.production);
            tasks.spawn(async move {
                let result = source.fetch_production(series, &window).await;
                (series, result)
            });
        }

        let mut production = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((series, Ok(points))) => {
                    production.insert(series, points);
                }
                Ok((series, Err(e))) => {
                    warn!(
                        "Failed to fetch {series} from {}: {e}. Leaving it empty",
                        self.production.name()
                    );
                }
                Err(e) => warn!("Production fetch task failed: {e}"),
            }
        }
        production
    }
}
