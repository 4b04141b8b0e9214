//! In-process name matching services

use async_trait::async_trait;
use herb_taxa::services::{NameMatch, NameMatchService, NameQuery, ResolverError};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers from a fixed table of `name -> (score, author)`; unknown names get no match
pub struct StubService {
    answers: HashMap<String, (f64, Option<String>)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubService {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, name: &str, score: f64, author: Option<&str>) -> Self {
        self.answers
            .insert(name.to_string(), (score, author.map(str::to_string)));
        self
    }

    /// Names submitted in each request, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameMatchService for StubService {
    async fn match_names(&self, queries: &[NameQuery]) -> Result<Vec<NameMatch>, ResolverError> {
        self.calls
            .lock()
            .unwrap()
            .push(queries.iter().map(|q| q.full_name.clone()).collect());

        Ok(queries
            .iter()
            .filter_map(|q| {
                self.answers.get(&q.full_name).map(|(score, author)| NameMatch {
                    row_id: q.row_id.clone(),
                    matched_name: Some(q.full_name.clone()),
                    canonical_author: author.clone(),
                    accepted_name_author: None,
                    overall_score: *score,
                    unmatched_terms: None,
                })
            })
            .collect())
    }
}

/// Always fails with a transient error
pub struct FailingService;

#[async_trait]
impl NameMatchService for FailingService {
    async fn match_names(&self, _queries: &[NameQuery]) -> Result<Vec<NameMatch>, ResolverError> {
        Err(ResolverError::Network("connection refused".to_string()))
    }
}
