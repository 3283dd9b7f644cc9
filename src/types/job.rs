//! Optional bookkeeping wrapper around one generation.

use super::request::GenerateRequest;
use super::response::GenerateResponse;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Tracks a submitted request until it completes with a response or an error.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    id: String,
    request: GenerateRequest,
    response: Option<GenerateResponse>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn new(request: GenerateRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            response: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn complete(self, response: GenerateResponse) -> Self {
        Self {
            response: Some(response),
            error: None,
            completed_at: Some(Utc::now()),
            ..self
        }
    }

    pub fn fail(self, error: impl Into<String>) -> Self {
        Self {
            response: None,
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
            ..self
        }
    }

    /// Record the outcome of a client call.
    pub fn finish(self, outcome: &crate::Result<GenerateResponse>) -> Self {
        match outcome {
            Ok(resp) => self.complete(resp.clone()),
            Err(e) => self.fail(e.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request(&self) -> &GenerateRequest {
        &self.request
    }

    pub fn response(&self) -> Option<&GenerateResponse> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some() || self.error.is_some()
    }

    pub fn is_successful(&self) -> bool {
        self.response.is_some() && self.error.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.created_at)
    }
}
