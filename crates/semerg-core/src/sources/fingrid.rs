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

//! Fingrid open data: wind and solar production series for Finland

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use semerg_types::ProductionPoint;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{
    FetchWindow, HTTP_TIMEOUT, ProductionDataSource, ProductionSeries, RetryPolicy,
    retry_request,
};
use crate::error::{FetchError, FetchResult};
use crate::pricing::parse_start_time;

pub const DEFAULT_BASE_URL: &str = "https://api.fingrid.fi";

const SOURCE_NAME: &str = "Fingrid";

impl ProductionSeries {
    /// Fingrid variable id of the series
    pub fn fingrid_variable(&self) -> u32 {
        match self {
            Self::Wind => 75,
            Self::WindForecast => 245,
            Self::SolarForecast => 248,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FingridEvent {
    value: f64,
    start_time: String,
}

/// Fingrid REST API client
#[derive(Debug, Clone)]
pub struct FingridClient {
    base_url: String,
    api_key: String,
    client: Client,
    retry: RetryPolicy,
}

impl FingridClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> FetchResult<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Set custom retry configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the events of one variable within `window`
    pub async fn fetch_variable(
        &self,
        variable_id: u32,
        window: &FetchWindow,
    ) -> FetchResult<Vec<ProductionPoint>> {
        let url = format!("{}/v1/variable/{variable_id}/events/json", self.base_url);
        let start = window.start_param();
        let end = window.end_param();
        debug!("Fetching Fingrid variable {variable_id} over {window}");

        let response = retry_request(self.retry, SOURCE_NAME, || async {
            self.client
                .get(&url)
                .header("x-api-key", &self.api_key)
                .query(&[("start_time", start.as_str()), ("end_time", end.as_str())])
                .send()
                .await
        })
        .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                let points = parse_events(&body)?;
                debug!("Variable {variable_id}: {} events", points.len());
                Ok(points)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("{SOURCE_NAME} rejected the API key");
                Err(FetchError::AuthenticationFailed(SOURCE_NAME))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                error!("{SOURCE_NAME} variable {variable_id} returned {status}: {message}");
                Err(FetchError::Api {
                    source_name: SOURCE_NAME,
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl ProductionDataSource for FingridClient {
    async fn fetch_production(
        &self,
        series: ProductionSeries,
        window: &FetchWindow,
    ) -> FetchResult<Vec<ProductionPoint>> {
        let points = self.fetch_variable(series.fingrid_variable(), window).await?;
        info!("Fetched {} points of {series}", points.len());
        Ok(points)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

fn parse_events(body: &str) -> FetchResult<Vec<ProductionPoint>> {
    let events: Vec<FingridEvent> = serde_json::from_str(body)?;

    events
        .into_iter()
        .map(|event| -> FetchResult<ProductionPoint> {
            let start = parse_start_time(&event.start_time, chrono_tz::UTC)
                .map_err(FetchError::InvalidResponse)?;
            Ok(ProductionPoint {
                start_time: start.fixed_offset(),
                energy: event.value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn window() -> FetchWindow {
        FetchWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_variable_ids() {
        assert_eq!(ProductionSeries::Wind.fingrid_variable(), 75);
        assert_eq!(ProductionSeries::WindForecast.fingrid_variable(), 245);
        assert_eq!(ProductionSeries::SolarForecast.fingrid_variable(), 248);
    }

    #[test]
    fn test_parse_events_compact_offset() {
        let body = json!([
            {"value": 1520.0, "start_time": "2024-01-01T00:00:00+0000", "end_time": "2024-01-01T01:00:00+0000"},
            {"value": 1490.5, "start_time": "2024-01-01T01:00:00+00:00", "end_time": "2024-01-01T02:00:00+00:00"}
        ])
        .to_string();

        let points = parse_events(&body).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].start_time.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!((points[1].energy - 1490.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_events_bad_timestamp() {
        let body = json!([{"value": 1.0, "start_time": "not a time"}]).to_string();

        assert!(matches!(parse_events(&body), Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_production_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/variable/75/events/json")
            .match_header("x-api-key", "test_key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_time".into(), "2024-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("end_time".into(), "2024-01-01T02:00:00Z".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"value": 1520.0, "start_time": "2024-01-01T00:00:00+0000", "end_time": "2024-01-01T01:00:00+0000"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let client = FingridClient::new(server.url(), "test_key").unwrap();
        let points = client
            .fetch_production(ProductionSeries::Wind, &window())
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert!((points[0].energy - 1520.0).abs() < f64::EPSILON);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_production_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/variable/248/events/json")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = FingridClient::new(server.url(), "bad_key").unwrap();
        let result = client
            .fetch_production(ProductionSeries::SolarForecast, &window())
            .await;

        assert!(matches!(result, Err(FetchError::AuthenticationFailed(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_production_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/variable/245/events/json")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = FingridClient::new(server.url(), "test_key").unwrap();
        let result = client
            .fetch_production(ProductionSeries::WindForecast, &window())
            .await;

        match result {
            Err(FetchError::Api { status, message, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }
}
