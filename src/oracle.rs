//! Adapters that turn an external classifier into an [`ExternalScore`].
//!
//! Every adapter degrades to `None` on failure; callers then analyze with
//! the built-in signals only.

use crate::scoring::ExternalScore;
use crate::url_extractor::CandidateUrl;
use crate::url_features::{heuristic_probability, PHISHING_PROBABILITY};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Ceiling on the confidence of a reply that says "not phishing"
const NEGATIVE_CONFIDENCE_CAP: f64 = 0.35;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OracleReply {
    is_phishing: Option<bool>,
    confidence: Option<f64>,
    #[serde(alias = "flags")]
    red_flags: Vec<String>,
}

impl OracleReply {
    fn into_external(self) -> Option<ExternalScore> {
        let mut confidence = self.confidence?;
        if !confidence.is_finite() {
            return None;
        }
        // Percentages (0-100) are accepted as well as probabilities
        if confidence > 1.0 {
            confidence /= 100.0;
        }
        confidence = confidence.clamp(0.0, 1.0);
        if self.is_phishing == Some(false) {
            confidence = confidence.min(NEGATIVE_CONFIDENCE_CAP);
        }

        Some(ExternalScore::new(confidence, self.red_flags))
    }
}

/// Parse a classifier reply that may wrap its JSON in prose or code fences
pub fn parse_oracle_reply(text: &str) -> Option<ExternalScore> {
    if let Ok(reply) = serde_json::from_str::<OracleReply>(text.trim()) {
        return reply.into_external();
    }

    let patterns = [
        r"(?s)```json\s*(\{.*?\})\s*```",
        r"(?s)```\s*(\{.*?\})\s*```",
        r#"(\{[^{}]*"is_phishing"[^{}]*\})"#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        let Some(captured) = re.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        if let Ok(reply) = serde_json::from_str::<OracleReply>(captured.as_str()) {
            return reply.into_external();
        }
    }

    log::debug!("Unparseable oracle reply ({} bytes)", text.len());
    None
}

/// Offline URL heuristic standing in for the URL model
#[derive(Debug, Clone, Default)]
pub struct HeuristicOracle;

impl HeuristicOracle {
    pub fn score(&self, urls: &[CandidateUrl]) -> Option<ExternalScore> {
        if urls.is_empty() {
            return None;
        }

        let probabilities: Vec<(f64, &CandidateUrl)> = urls
            .iter()
            .map(|u| (heuristic_probability(&u.raw), u))
            .collect();
        let average =
            probabilities.iter().map(|(p, _)| p).sum::<f64>() / probabilities.len() as f64;
        let flagged = probabilities
            .iter()
            .filter(|(p, _)| *p > PHISHING_PROBABILITY)
            .map(|(_, u)| u.raw.clone())
            .collect();

        Some(ExternalScore::new(average, flagged))
    }
}

#[derive(Debug, Serialize)]
struct OracleRequest<'a> {
    message: &'a str,
    urls: Vec<&'a str>,
}

/// Remote classifier reached over HTTP
pub struct RemoteOracle {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl RemoteOracle {
    pub fn new(endpoint: &str, timeout_seconds: u64) -> Result<Self, reqwest::Error> {
        let timeout_seconds = timeout_seconds.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("tanabbah/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout_seconds,
        })
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    async fn request(&self, message: &str, urls: &[CandidateUrl]) -> Result<String, reqwest::Error> {
        let body = OracleRequest {
            message,
            urls: urls.iter().map(|u| u.raw.as_str()).collect(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }

    /// Ask the remote classifier; any failure yields `None`
    pub async fn score(&self, message: &str, urls: &[CandidateUrl]) -> Option<ExternalScore> {
        match self.request(message, urls).await {
            Ok(text) => {
                let score = parse_oracle_reply(&text);
                if score.is_none() {
                    log::warn!("Oracle at {} returned an unusable reply", self.endpoint);
                }
                score
            }
            Err(e) => {
                log::warn!(
                    "Oracle at {} unavailable, using built-in signals only: {}",
                    self.endpoint,
                    e
                );
                None
            }
        }
    }
}

pub enum Oracle {
    Heuristic(HeuristicOracle),
    Remote(RemoteOracle),
}

impl Oracle {
    pub async fn score(&self, message: &str, urls: &[CandidateUrl]) -> Option<ExternalScore> {
        match self {
            Oracle::Heuristic(oracle) => oracle.score(urls),
            Oracle::Remote(oracle) => oracle.score(message, urls).await,
        }
    }
}
