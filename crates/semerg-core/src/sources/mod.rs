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

//! Upstream data sources: ENTSO-E day-ahead prices and Fingrid production series.

pub mod entsoe;
pub mod fingrid;

pub use entsoe::EntsoeClient;
pub use fingrid::FingridClient;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use semerg_types::{PricePoint, ProductionPoint};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::error::{FetchError, FetchResult};

/// UTC interval requested from the upstream APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// From local midnight of `date` to local midnight `days` civil days later, in `tz`
    pub fn local_days(date: NaiveDate, days: u64, tz: Tz) -> FetchResult<Self> {
        let end_date = date
            .checked_add_days(Days::new(days))
            .ok_or_else(|| FetchError::InvalidResponse(format!("date overflow after {date}")))?;

        Ok(Self {
            start: local_midnight(date, tz)?,
            end: local_midnight(end_date, tz)?,
        })
    }

    pub fn start_param(&self) -> String {
        format_utc(self.start)
    }

    pub fn end_param(&self) -> String {
        format_utc(self.end)
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_param(), self.end_param())
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> FetchResult<DateTime<Utc>> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            FetchError::InvalidResponse(format!(
                "midnight of {date} does not exist in {}",
                tz.name()
            ))
        })
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the interval format both upstream APIs accept
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Production series published by the grid operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductionSeries {
    Wind,
    WindForecast,
    SolarForecast,
}

impl ProductionSeries {
    pub fn all() -> &'static [ProductionSeries] {
        &[Self::Wind, Self::WindForecast, Self::SolarForecast]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Wind => "wind production",
            Self::WindForecast => "wind production forecast",
            Self::SolarForecast => "solar production forecast",
        }
    }
}

impl fmt::Display for ProductionSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Source of day-ahead base prices (c/kWh, before tax)
#[async_trait]
pub trait PriceDataSource: Send + Sync {
    async fn fetch_prices(&self, window: &FetchWindow) -> FetchResult<Vec<PricePoint>>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Source of production time series (MW)
#[async_trait]
pub trait ProductionDataSource: Send + Sync {
    async fn fetch_production(
        &self,
        series: ProductionSeries,
        window: &FetchWindow,
    ) -> FetchResult<Vec<ProductionPoint>>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Retry settings shared by the HTTP clients
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry a request with exponential backoff on transport errors.
///
/// HTTP error statuses are returned as responses and never retried.
pub(crate) async fn retry_request<F, Fut>(
    policy: RetryPolicy,
    source_name: &str,
    mut request_fn: F,
) -> FetchResult<reqwest::Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempts = 0;
    let mut delay = policy.retry_delay;

    loop {
        attempts += 1;
        match request_fn().await {
            Ok(response) => return Ok(response),
            Err(e) if attempts >= policy.max_retries => {
                error!("{source_name} request failed after {attempts} attempts: {e}");
                return Err(FetchError::Http(e));
            }
            Err(e) => {
                warn!(
                    "{source_name} request failed (attempt {attempts}/{}): {e}. Retrying in {delay:?}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Helsinki;

    #[test]
    fn test_window_winter_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let window = FetchWindow::local_days(date, 2, Helsinki).unwrap();

        assert_eq!(window.start_param(), "2024-01-14T22:00:00Z");
        assert_eq!(window.end_param(), "2024-01-16T22:00:00Z");
        assert_eq!(window.to_string(), "2024-01-14T22:00:00Z/2024-01-16T22:00:00Z");
    }

    #[test]
    fn test_window_across_spring_forward() {
        // Clocks move forward on 2024-03-31, so the window is one hour short of 48h
        let date = NaiveDate::from_ymd_opt(2024, 3, 30).unwrap();
        let window = FetchWindow::local_days(date, 2, Helsinki).unwrap();

        assert_eq!(window.start_param(), "2024-03-29T22:00:00Z");
        assert_eq!(window.end_param(), "2024-03-31T21:00:00Z");
        assert_eq!((window.end - window.start).num_hours(), 47);
    }

    #[test]
    fn test_format_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(format_utc(dt), "2024-05-06T07:08:09Z");
    }

    /// URL of a local port nothing listens on
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/")
    }

    #[tokio::test]
    async fn test_retry_request_gives_up_on_transport_error() {
        let client = reqwest::Client::new();
        let url = closed_port_url();
        let policy = RetryPolicy {
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
        };
        let mut attempts = 0;

        let result = retry_request(policy, "test", || {
            attempts += 1;
            client.get(&url).send()
        })
        .await;

        assert!(matches!(result, Err(FetchError::Http(_))));
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_request_returns_error_status_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let client = reqwest::Client::new();
        let url = server.url();

        let response = retry_request(RetryPolicy::default(), "test", || client.get(&url).send())
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        mock.assert_async().await;
    }

    #[test]
    fn test_series_names() {
        assert_eq!(ProductionSeries::all().len(), 3);
        assert_eq!(ProductionSeries::Wind.to_string(), "wind production");
    }
}
