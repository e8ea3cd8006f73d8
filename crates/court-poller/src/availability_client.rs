//! Client for the court availability endpoint.
//!
//! One GET per (tenant, date) pair, issued strictly one after another with a
//! fixed pause in between so the upstream service is not hammered.

use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use slot_types::{DayAvailability, RawResource};
use std::time::Duration;

use crate::config::Config;
use crate::error::{CycleError, FetchError};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub struct AvailabilityClient {
    http: reqwest::Client,
    url: String,
    sport_id: String,
    pause: Duration,
}

/// Result of querying one tenant for one date
#[derive(Debug)]
pub struct PairResult {
    pub date: NaiveDate,
    pub outcome: PairOutcome,
}

#[derive(Debug)]
pub enum PairOutcome {
    Available(Vec<RawResource>),
    /// 200 with an empty body, `null` or `[]`
    Empty,
    Failed(FetchError),
}

impl PairResult {
    pub fn into_day(self) -> Option<DayAvailability> {
        match self.outcome {
            PairOutcome::Available(resources) => Some(DayAvailability {
                date: self.date,
                resources,
            }),
            PairOutcome::Empty | PairOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, PairOutcome::Failed(_))
    }
}

/// `today` plus the following `days - 1` dates.
pub fn query_window(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .map(|offset| today + ChronoDuration::days(i64::from(offset)))
        .collect()
}

impl AvailabilityClient {
    pub fn new(config: &Config) -> Result<Self, CycleError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(CycleError::Client)?;

        Ok(Self {
            http,
            url: config.availability_url.clone(),
            sport_id: config.sport_id.clone(),
            pause: Duration::from_millis(config.request_pause_ms),
        })
    }

    /// Query every (tenant, date) pair in order. Never fails as a whole;
    /// each pair carries its own outcome.
    pub async fn fetch_window(&self, tenant_ids: &[String], dates: &[NaiveDate]) -> Vec<PairResult> {
        let mut results = Vec::with_capacity(tenant_ids.len() * dates.len());

        for tenant_id in tenant_ids {
            for date in dates {
                if !results.is_empty() && !self.pause.is_zero() {
                    tokio::time::sleep(self.pause).await;
                }

                let outcome = match self.fetch_day(tenant_id, *date).await {
                    Ok(resources) if resources.is_empty() => {
                        tracing::debug!(tenant = %tenant_id, %date, "no slots");
                        PairOutcome::Empty
                    }
                    Ok(resources) => {
                        tracing::debug!(
                            tenant = %tenant_id,
                            %date,
                            resources = resources.len(),
                            "data found"
                        );
                        PairOutcome::Available(resources)
                    }
                    Err(e) => {
                        tracing::warn!(
                            tenant = %tenant_id,
                            %date,
                            timeout = e.is_timeout(),
                            "availability request failed: {}",
                            e
                        );
                        PairOutcome::Failed(e)
                    }
                };

                results.push(PairResult {
                    date: *date,
                    outcome,
                });
            }
        }

        results
    }

    /// Fetch one tenant's resources for one date. An empty or `null` body
    /// yields an empty list.
    pub async fn fetch_day(&self, tenant_id: &str, date: NaiveDate) -> Result<Vec<RawResource>, FetchError> {
        let date_param = date.format("%Y-%m-%d").to_string();
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("tenant_id", tenant_id),
                ("sport_id", self.sport_id.as_str()),
                ("date", date_param.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        parse_body(&body)
    }
}

fn parse_body(body: &str) -> Result<Vec<RawResource>, FetchError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let resources: Option<Vec<RawResource>> = serde_json::from_str(body)?;
    Ok(resources.unwrap_or_default())
}
