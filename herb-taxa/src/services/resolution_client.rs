//! External name resolution client
//!
//! Submits names the local tree does not know to a fuzzy name-matching
//! service, in one batch request per pass. Candidates below
//! [`ACCEPT_THRESHOLD`] get a single retry with `var.`/`subsp.` swapped;
//! whatever is still below the threshold afterwards is rejected.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{MatchStatus, ResolutionCandidate};
use crate::names::swap_rank_tokens;
use crate::utils::retry_with_backoff;

/// Minimum confidence for automated tree mutation
pub const ACCEPT_THRESHOLD: f64 = 0.99;

const USER_AGENT: &str = concat!("herb-taxa/", env!("CARGO_PKG_VERSION"));

/// Name resolution service errors
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error {0}: {1}")]
    Http(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Name resolution service URL not configured")]
    NotConfigured,
}

impl ResolverError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ResolverError::Network(_) => true,
            ResolverError::Http(status, _) => *status == 429 || *status >= 500,
            ResolverError::Parse(_) | ResolverError::NotConfigured => false,
        }
    }
}

/// One name submitted to the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameQuery {
    pub row_id: String,
    pub full_name: String,
}

/// Best match the service found for one submitted row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    pub row_id: String,
    #[serde(default)]
    pub matched_name: Option<String>,
    #[serde(default)]
    pub canonical_author: Option<String>,
    #[serde(default)]
    pub accepted_name_author: Option<String>,
    /// Empty or missing scores count as 0
    #[serde(default, deserialize_with = "deserialize_score")]
    pub overall_score: f64,
    #[serde(default)]
    pub unmatched_terms: Option<String>,
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let score = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 })
}

/// Fuzzy name matching backend
#[async_trait]
pub trait NameMatchService: Send + Sync {
    /// Match a batch of names; results are keyed by `row_id`
    async fn match_names(&self, queries: &[NameQuery]) -> Result<Vec<NameMatch>, ResolverError>;
}

/// HTTP backend: POSTs the query list as JSON, expects a JSON list of matches
pub struct HttpNameMatchService {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpNameMatchService {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, ResolverError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl NameMatchService for HttpNameMatchService {
    async fn match_names(&self, queries: &[NameQuery]) -> Result<Vec<NameMatch>, ResolverError> {
        debug!(names = queries.len(), url = %self.base_url, "Submitting names for resolution");

        let response = self
            .http_client
            .post(&self.base_url)
            .json(queries)
            .send()
            .await
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResolverError::Http(status.as_u16(), error_text));
        }

        response
            .json::<Vec<NameMatch>>()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))
    }
}

/// Final verdict for one input row
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalOutcome {
    pub row_id: String,
    pub candidate: ResolutionCandidate,
    pub status: MatchStatus,
}

/// Batch resolver with thresholding and the rank-swap retry
pub struct ExternalResolver {
    service: Arc<dyn NameMatchService>,
    max_retry_wait_ms: u64,
}

impl ExternalResolver {
    pub fn new(service: Arc<dyn NameMatchService>, max_retry_wait_ms: u64) -> Self {
        Self {
            service,
            max_retry_wait_ms,
        }
    }

    /// Resolve `(row_id, full_name)` pairs
    ///
    /// Returns one outcome per input row, in input order. Any service failure
    /// that outlasts the retry budget fails the whole batch.
    pub async fn resolve_batch(
        &self,
        names: &[(String, String)],
    ) -> Result<Vec<ExternalOutcome>, ResolverError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // Identical names are submitted once, under the first row that carries them
        let mut unique: Vec<NameQuery> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (row_id, full_name) in names {
            if !seen.contains_key(full_name.as_str()) {
                seen.insert(full_name.as_str(), unique.len());
                unique.push(NameQuery {
                    row_id: row_id.clone(),
                    full_name: full_name.clone(),
                });
            }
        }

        let first_pass = self.submit(&unique).await?;
        let mut best: Vec<ResolutionCandidate> = unique
            .iter()
            .map(|query| candidate_from(query, first_pass.get(&query.row_id), false))
            .collect();

        // Single hypothesis retry for the low-confidence subset
        let retry: Vec<(usize, NameQuery)> = unique
            .iter()
            .enumerate()
            .filter(|(i, _)| best[*i].confidence < ACCEPT_THRESHOLD)
            .filter_map(|(i, query)| {
                swap_rank_tokens(&query.full_name).map(|swapped| {
                    (
                        i,
                        NameQuery {
                            row_id: query.row_id.clone(),
                            full_name: swapped,
                        },
                    )
                })
            })
            .collect();

        if !retry.is_empty() {
            info!(names = retry.len(), "Retrying low-confidence names with var./subsp. swapped");
            let queries: Vec<NameQuery> = retry.iter().map(|(_, q)| q.clone()).collect();
            let second_pass = self.submit(&queries).await?;

            for (i, query) in &retry {
                let swapped = candidate_from(query, second_pass.get(&query.row_id), true);
                if swapped.confidence > best[*i].confidence {
                    debug!(
                        submitted = %unique[*i].full_name,
                        swapped = %query.full_name,
                        confidence = swapped.confidence,
                        "Rank-swapped submission scored higher"
                    );
                    best[*i] = swapped;
                }
            }
        }

        Ok(names
            .iter()
            .filter_map(|(row_id, full_name)| {
                let index = *seen.get(full_name.as_str())?;
                let candidate = best[index].clone();
                let status = verdict(&candidate);
                Some(ExternalOutcome {
                    row_id: row_id.clone(),
                    candidate,
                    status,
                })
            })
            .collect())
    }

    async fn submit(&self, queries: &[NameQuery]) -> Result<HashMap<String, NameMatch>, ResolverError> {
        let matches = retry_with_backoff(
            "name match request",
            self.max_retry_wait_ms,
            ResolverError::is_transient,
            || self.service.match_names(queries),
        )
        .await?;

        // Keep the highest score when the service answers a row more than once
        let mut by_row: HashMap<String, NameMatch> = HashMap::new();
        for m in matches {
            match by_row.get(&m.row_id) {
                Some(existing) if existing.overall_score >= m.overall_score => {}
                _ => {
                    by_row.insert(m.row_id.clone(), m);
                }
            }
        }
        Ok(by_row)
    }
}

fn candidate_from(query: &NameQuery, found: Option<&NameMatch>, rank_swapped: bool) -> ResolutionCandidate {
    match found {
        Some(m) => ResolutionCandidate {
            submitted_name: query.full_name.clone(),
            matched_name: m.matched_name.clone(),
            author: m.canonical_author.clone(),
            accepted_author: m.accepted_name_author.clone(),
            confidence: m.overall_score,
            unmatched_terms: m.unmatched_terms.clone(),
            rank_swapped,
        },
        None => ResolutionCandidate {
            rank_swapped,
            ..ResolutionCandidate::unmatched(query.full_name.clone())
        },
    }
}

fn verdict(candidate: &ResolutionCandidate) -> MatchStatus {
    if candidate.confidence >= ACCEPT_THRESHOLD {
        MatchStatus::Accepted
    } else if candidate.matched_name.is_none() {
        MatchStatus::Rejected("no match returned".to_string())
    } else {
        MatchStatus::Rejected(format!(
            "confidence {:.3} below {}",
            candidate.confidence, ACCEPT_THRESHOLD
        ))
    }
}
