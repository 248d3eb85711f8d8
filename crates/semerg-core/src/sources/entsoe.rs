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

//! ENTSO-E Transparency Platform day-ahead prices (document type A44)

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use semerg_types::PricePoint;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use super::{FetchWindow, HTTP_TIMEOUT, PriceDataSource, RetryPolicy, retry_request};
use crate::error::{FetchError, FetchResult};

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu";

/// Finland
pub const DEFAULT_BIDDING_ZONE: &str = "10YFI-1--------U";

const SOURCE_NAME: &str = "ENTSO-E";

/// EUR/MWh → c/kWh
const EUR_PER_MWH_TO_CENTS_PER_KWH: f64 = 0.1;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Deserialize)]
struct PublicationDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<XmlTimeSeries>,
}

#[derive(Debug, Deserialize)]
struct XmlTimeSeries {
    #[serde(rename = "curveType", default)]
    curve_type: Option<String>,
    #[serde(rename = "Period", default)]
    periods: Vec<XmlPeriod>,
}

#[derive(Debug, Deserialize)]
struct XmlPeriod {
    #[serde(rename = "timeInterval")]
    time_interval: XmlInterval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<XmlPoint>,
}

#[derive(Debug, Deserialize)]
struct XmlInterval {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct XmlPoint {
    position: u32,
    #[serde(rename = "price.amount")]
    price_amount: f64,
}

#[derive(Debug, Deserialize)]
struct AcknowledgementDocument {
    #[serde(rename = "Reason", default)]
    reasons: Vec<XmlReason>,
}

#[derive(Debug, Deserialize)]
struct XmlReason {
    #[serde(default)]
    code: String,
    #[serde(default)]
    text: String,
}

/// ENTSO-E REST API client
#[derive(Debug, Clone)]
pub struct EntsoeClient {
    base_url: String,
    security_token: String,
    bidding_zone: String,
    client: Client,
    retry: RetryPolicy,
}

impl EntsoeClient {
    pub fn new(
        base_url: impl Into<String>,
        security_token: impl Into<String>,
        bidding_zone: impl Into<String>,
    ) -> FetchResult<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            security_token: security_token.into(),
            bidding_zone: bidding_zone.into(),
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Set custom retry configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Download the raw A44 price document for `window`
    pub async fn fetch_price_document(&self, window: &FetchWindow) -> FetchResult<String> {
        let url = format!("{}/api", self.base_url);
        let interval = window.to_string();
        info!(
            "Downloading day-ahead prices for {} over {}",
            self.bidding_zone, interval
        );

        let response = retry_request(self.retry, SOURCE_NAME, || async {
            self.client
                .get(&url)
                .query(&[
                    ("documentType", "A44"),
                    ("securityToken", self.security_token.as_str()),
                    ("timeInterval", interval.as_str()),
                    ("in_domain", self.bidding_zone.as_str()),
                    ("out_domain", self.bidding_zone.as_str()),
                ])
                .send()
                .await
        })
        .await?;

        let status = response.status();
        let body = response.text().await?;
        match status {
            StatusCode::OK => Ok(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("{SOURCE_NAME} rejected the security token");
                Err(FetchError::AuthenticationFailed(SOURCE_NAME))
            }
            status => {
                let message = acknowledgement_reason(&body).unwrap_or(body);
                error!("{SOURCE_NAME} returned status {status}: {message}");
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
impl PriceDataSource for EntsoeClient {
    async fn fetch_prices(&self, window: &FetchWindow) -> FetchResult<Vec<PricePoint>> {
        let document = self.fetch_price_document(window).await?;
        let points = parse_price_document(&document)?;
        info!("Parsed {} day-ahead price points", points.len());
        Ok(points)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Convert an A44 document into base price points in c/kWh, sorted by start time.
///
/// An acknowledgement document (the API's "no data" answer) becomes
/// [`FetchError::NoData`] with the reason text.
pub fn parse_price_document(xml: &str) -> FetchResult<Vec<PricePoint>> {
    if xml.contains("Acknowledgement_MarketDocument") {
        let reason = acknowledgement_reason(xml).unwrap_or_else(|| "no reason given".to_owned());
        return Err(FetchError::NoData(reason));
    }

    let document: PublicationDocument = quick_xml::de::from_str(xml)?;

    // Keyed by start so overlapping series keep the first value seen
    let mut prices: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for series in &document.time_series {
        let fill_gaps = series.curve_type.as_deref() == Some("A03");
        for period in &series.periods {
            for (start, eur_per_mwh) in expand_period(period, fill_gaps)? {
                if prices.contains_key(&start) {
                    debug!("Duplicate price interval at {start}, keeping first");
                    continue;
                }
                prices.insert(start, eur_per_mwh * EUR_PER_MWH_TO_CENTS_PER_KWH);
            }
        }
    }

    if prices.is_empty() {
        warn!("Price document contained no points");
    }

    Ok(prices
        .into_iter()
        .map(|(start, price)| PricePoint::at(&start, price))
        .collect())
}

fn expand_period(
    period: &XmlPeriod,
    fill_gaps: bool,
) -> FetchResult<Vec<(DateTime<Utc>, f64)>> {
    let start = parse_entsoe_time(&period.time_interval.start)?;
    let end = parse_entsoe_time(&period.time_interval.end)?;
    let step = parse_resolution(&period.resolution)?;

    let mut points: Vec<&XmlPoint> = period.points.iter().collect();
    points.sort_by_key(|p| p.position);

    let mut expanded = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if point.position == 0 {
            return Err(FetchError::InvalidResponse("point positions start at 1".to_owned()));
        }

        // A03 curves omit positions whose price repeats the previous one
        let last_position = if fill_gaps {
            points
                .get(i + 1)
                .map_or_else(|| slot_count(start, end, step), |next| next.position - 1)
        } else {
            point.position
        };

        for position in point.position..=last_position.max(point.position) {
            let slot_start = i32::try_from(position - 1)
                .ok()
                .and_then(|offset| step.checked_mul(offset))
                .and_then(|delta| start.checked_add_signed(delta))
                .ok_or_else(|| out_of_range(position))?;
            if slot_start >= end {
                break;
            }
            expanded.push((slot_start, point.price_amount));
        }
    }

    Ok(expanded)
}

fn out_of_range(position: u32) -> FetchError {
    FetchError::InvalidResponse(format!("point position {position} out of range"))
}

fn slot_count(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> u32 {
    let slots = (end - start).num_minutes() / step.num_minutes().max(1);
    u32::try_from(slots).unwrap_or(0)
}

/// ENTSO-E omits seconds (`2024-01-01T23:00Z`); full RFC 3339 is accepted too
fn parse_entsoe_time(raw: &str) -> FetchResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .map_err(|e| FetchError::InvalidResponse(format!("bad interval timestamp '{raw}': {e}")))
}

/// ISO 8601 resolutions used by the platform: `PT15M`, `PT30M`, `PT60M`, `PT1H`, `P1D`
fn parse_resolution(raw: &str) -> FetchResult<Duration> {
    let invalid = || FetchError::InvalidResponse(format!("unsupported resolution '{raw}'"));

    let (amount, unit) = if let Some(rest) = raw.strip_prefix("PT") {
        rest.split_at(rest.len().saturating_sub(1))
    } else if let Some(rest) = raw.strip_prefix('P') {
        rest.split_at(rest.len().saturating_sub(1))
    } else {
        return Err(invalid());
    };
    let amount: i64 = amount.parse().map_err(|_| invalid())?;

    // No period is longer than a day
    match (raw.starts_with("PT"), unit) {
        (true, "M") if (1..=MINUTES_PER_DAY).contains(&amount) => Ok(Duration::minutes(amount)),
        (true, "H") if (1..=24).contains(&amount) => Ok(Duration::hours(amount)),
        (false, "D") if amount == 1 => Ok(Duration::days(amount)),
        _ => Err(invalid()),
    }
}

fn acknowledgement_reason(xml: &str) -> Option<String> {
    let ack: AcknowledgementDocument = quick_xml::de::from_str(xml).ok()?;
    let text = ack
        .reasons
        .iter()
        .map(|r| format!("{} ({})", r.text.trim(), r.code.trim()))
        .collect::<Vec<_>>()
        .join("; ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};

    const HOURLY_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
    <mRID>3f0a0c5d8f1b4e36</mRID>
    <type>A44</type>
    <period.timeInterval>
        <start>2023-12-31T22:00Z</start>
        <end>2024-01-01T01:00Z</end>
    </period.timeInterval>
    <TimeSeries>
        <mRID>1</mRID>
        <businessType>A62</businessType>
        <in_Domain.mRID codingScheme="A01">10YFI-1--------U</in_Domain.mRID>
        <currency_Unit.name>EUR</currency_Unit.name>
        <price_Measure_Unit.name>MWH</price_Measure_Unit.name>
        <curveType>A01</curveType>
        <Period>
            <timeInterval>
                <start>2023-12-31T22:00Z</start>
                <end>2024-01-01T01:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point>
                <position>1</position>
                <price.amount>45.12</price.amount>
            </Point>
            <Point>
                <position>2</position>
                <price.amount>-3.5</price.amount>
            </Point>
            <Point>
                <position>3</position>
                <price.amount>0</price.amount>
            </Point>
        </Period>
    </TimeSeries>
</Publication_MarketDocument>"#;

    const SPARSE_QUARTER_HOUR_DOCUMENT: &str = r#"<Publication_MarketDocument>
    <TimeSeries>
        <curveType>A03</curveType>
        <Period>
            <timeInterval>
                <start>2025-10-01T22:00Z</start>
                <end>2025-10-01T23:00Z</end>
            </timeInterval>
            <resolution>PT15M</resolution>
            <Point><position>1</position><price.amount>10</price.amount></Point>
            <Point><position>3</position><price.amount>20</price.amount></Point>
        </Period>
    </TimeSeries>
</Publication_MarketDocument>"#;

    const ACKNOWLEDGEMENT: &str = r#"<Acknowledgement_MarketDocument>
    <mRID>d6b6e8b2</mRID>
    <Reason>
        <code>999</code>
        <text>No matching data found for Data item Day-ahead Prices</text>
    </Reason>
</Acknowledgement_MarketDocument>"#;

    const OVERLAPPING_SERIES_DOCUMENT: &str = r#"<Publication_MarketDocument>
    <TimeSeries>
        <curveType>A01</curveType>
        <Period>
            <timeInterval>
                <start>2024-01-01T22:00Z</start>
                <end>2024-01-02T00:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point><position>1</position><price.amount>10</price.amount></Point>
            <Point><position>2</position><price.amount>20</price.amount></Point>
        </Period>
    </TimeSeries>
    <TimeSeries>
        <curveType>A01</curveType>
        <Period>
            <timeInterval>
                <start>2024-01-01T21:00Z</start>
                <end>2024-01-01T23:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point><position>1</position><price.amount>5</price.amount></Point>
            <Point><position>2</position><price.amount>99</price.amount></Point>
        </Period>
    </TimeSeries>
</Publication_MarketDocument>"#;

    fn single_point_document(resolution: &str, position: u32) -> String {
        format!(
            r#"<Publication_MarketDocument>
    <TimeSeries>
        <curveType>A01</curveType>
        <Period>
            <timeInterval>
                <start>2024-01-01T22:00Z</start>
                <end>2024-01-02T22:00Z</end>
            </timeInterval>
            <resolution>{resolution}</resolution>
            <Point><position>{position}</position><price.amount>42</price.amount></Point>
        </Period>
    </TimeSeries>
</Publication_MarketDocument>"#
        )
    }

    fn window() -> FetchWindow {
        FetchWindow::new(
            Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 22, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_parse_hourly_document() {
        let points = parse_price_document(HOURLY_DOCUMENT).unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].start_time, "2023-12-31T22:00:00Z");
        assert_eq!(points[1].start_time, "2023-12-31T23:00:00Z");
        assert_eq!(points[2].start_time, "2024-01-01T00:00:00Z");
        assert!((points[0].price - 4.512).abs() < 1e-9);
        assert!((points[1].price - (-0.35)).abs() < 1e-9);
        assert!(points[2].price.abs() < 1e-9);
    }

    #[test]
    fn test_parse_sparse_curve_forward_fills() {
        let points = parse_price_document(SPARSE_QUARTER_HOUR_DOCUMENT).unwrap();
        let prices: Vec<f64> = points.iter().map(|p| p.price).collect();

        assert_eq!(points.len(), 4);
        assert_eq!(points[1].start_time, "2025-10-01T22:15:00Z");
        assert_eq!(points[3].start_time, "2025-10-01T22:45:00Z");
        assert!((prices[0] - 1.0).abs() < 1e-9);
        assert!((prices[1] - 1.0).abs() < 1e-9);
        assert!((prices[2] - 2.0).abs() < 1e-9);
        assert!((prices[3] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_overlapping_series_sorted_first_wins() {
        let points = parse_price_document(OVERLAPPING_SERIES_DOCUMENT).unwrap();
        let starts: Vec<&str> = points.iter().map(|p| p.start_time.as_str()).collect();

        assert_eq!(
            starts,
            [
                "2024-01-01T21:00:00Z",
                "2024-01-01T22:00:00Z",
                "2024-01-01T23:00:00Z"
            ]
        );
        assert!((points[0].price - 0.5).abs() < 1e-9);
        // 22:00 appears in both series; the first series in the document wins
        assert!((points[1].price - 1.0).abs() < 1e-9);
        assert!((points[2].price - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_huge_position_is_invalid_response() {
        let xml = single_point_document("P1D", 2_000_000_000);

        let result = parse_price_document(&xml);

        match result {
            Err(FetchError::InvalidResponse(message)) => {
                assert!(message.contains("out of range"));
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_oversized_resolution_is_invalid_response() {
        let xml = single_point_document("PT9999999999999M", 1);

        let result = parse_price_document(&xml);

        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_acknowledgement_is_no_data() {
        let err = parse_price_document(ACKNOWLEDGEMENT).unwrap_err();

        match err {
            FetchError::NoData(reason) => assert!(reason.contains("No matching data found")),
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("PT15M").unwrap(), Duration::minutes(15));
        assert_eq!(parse_resolution("PT60M").unwrap(), Duration::hours(1));
        assert_eq!(parse_resolution("PT1H").unwrap(), Duration::hours(1));
        assert_eq!(parse_resolution("P1D").unwrap(), Duration::days(1));
        assert!(parse_resolution("PT0M").is_err());
        assert!(parse_resolution("15 minutes").is_err());
        assert!(parse_resolution("P1H").is_err());
        assert!(parse_resolution("PT1441M").is_err());
        assert!(parse_resolution("P2D").is_err());
    }

    #[test]
    fn test_parse_entsoe_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();

        assert_eq!(parse_entsoe_time("2024-01-01T23:00Z").unwrap(), expected);
        assert_eq!(parse_entsoe_time("2024-01-01T23:00:00Z").unwrap(), expected);
        assert!(parse_entsoe_time("01.01.2024 23:00").is_err());
    }

    #[tokio::test]
    async fn test_fetch_prices_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("documentType".into(), "A44".into()),
                Matcher::UrlEncoded("securityToken".into(), "test_token".into()),
                Matcher::UrlEncoded(
                    "timeInterval".into(),
                    "2023-12-31T22:00:00Z/2024-01-02T22:00:00Z".into(),
                ),
                Matcher::UrlEncoded("in_domain".into(), DEFAULT_BIDDING_ZONE.into()),
                Matcher::UrlEncoded("out_domain".into(), DEFAULT_BIDDING_ZONE.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(HOURLY_DOCUMENT)
            .create_async()
            .await;

        let client = EntsoeClient::new(server.url(), "test_token", DEFAULT_BIDDING_ZONE).unwrap();
        let points = client.fetch_prices(&window()).await.unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(client.name(), "ENTSO-E");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_prices_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client = EntsoeClient::new(server.url(), "bad_token", DEFAULT_BIDDING_ZONE).unwrap();
        let result = client.fetch_prices(&window()).await;

        assert!(matches!(result, Err(FetchError::AuthenticationFailed(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_prices_api_error_uses_reason() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(ACKNOWLEDGEMENT)
            .create_async()
            .await;

        let client = EntsoeClient::new(server.url(), "test_token", DEFAULT_BIDDING_ZONE).unwrap();
        let result = client.fetch_prices(&window()).await;

        match result {
            Err(FetchError::Api { status, message, .. }) => {
                assert_eq!(status, 400);
                assert!(message.contains("No matching data found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }
}
