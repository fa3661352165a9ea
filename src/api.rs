use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BenchConfig;
use crate::error::AppError;
use crate::run::stream::StreamSession;
use crate::run::types::ModelDescriptor;

// ============================================================================
// Response / request types
// ============================================================================

/// `GET /api/models` response body.
#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// `POST /api/problem` response body.
#[derive(Debug, Deserialize)]
pub struct ProblemResponse {
    pub message: String,
    pub current_problem: String,
    pub current_correct_answer: String,
}

#[derive(Serialize)]
struct RunModelBody<'a> {
    model_id: &'a str,
}

#[derive(Serialize)]
struct UpdateProblemBody<'a> {
    problem_text: &'a str,
    correct_answer: &'a str,
}

/// `GET /api/test-subset` answers with either a bare array or a
/// `{results: [...]}` wrapper, depending on server version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubsetResponse {
    Wrapped { results: Vec<Value> },
    Bare(Vec<Value>),
}

// ============================================================================
// BenchClient
// ============================================================================

/// HTTP client that wraps the benchmark server's REST endpoints.
///
/// Result payloads come back as raw JSON values in their source shape;
/// callers normalize them at ingestion. Every call is single-shot: a
/// failure surfaces immediately and nothing retries.
pub struct BenchClient {
    http: reqwest::Client,
    base_url: String,
}

impl BenchClient {
    /// Create a client for the configured server. The underlying
    /// `reqwest::Client` carries the configured per-request timeout.
    pub fn new(config: &BenchConfig) -> BenchClient {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        BenchClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        Ok(self
            .http
            .get(self.endpoint(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// `GET /api/models` -- list the models available for testing.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, AppError> {
        let response: ModelsResponse = self.get_json("/api/models").await?;
        Ok(response.models)
    }

    /// `POST /api/test` -- run the benchmark against a single model.
    /// Returns the raw live-test payload.
    pub async fn run_model(&self, model_id: &str) -> Result<Value, AppError> {
        Ok(self
            .http
            .post(self.endpoint("/api/test"))
            .json(&RunModelBody { model_id })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// `GET /api/results` -- results persisted by earlier sessions, in
    /// storage shape.
    pub async fn persisted_results(&self) -> Result<Vec<Value>, AppError> {
        self.get_json("/api/results").await
    }

    /// `GET /api/test-subset` -- quick run over the first few models.
    pub async fn run_subset(&self) -> Result<Vec<Value>, AppError> {
        let response: SubsetResponse = self.get_json("/api/test-subset").await?;
        Ok(match response {
            SubsetResponse::Wrapped { results } => results,
            SubsetResponse::Bare(results) => results,
        })
    }

    /// `POST /api/problem` -- replace the benchmark problem and its
    /// expected answer.
    pub async fn update_problem(
        &self,
        problem_text: &str,
        correct_answer: &str,
    ) -> Result<ProblemResponse, AppError> {
        Ok(self
            .http
            .post(self.endpoint("/api/problem"))
            .json(&UpdateProblemBody { problem_text, correct_answer })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// `GET /api/test-all` -- open the streaming run feed.
    pub async fn open_run_feed(&self) -> Result<StreamSession, AppError> {
        StreamSession::connect(&self.http, &self.endpoint("/api/test-all")).await
    }
}
