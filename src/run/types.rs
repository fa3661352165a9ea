use serde::{Deserialize, Serialize};

/// A test subject from the model registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Prompt/completion token counts for one model response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt: u64,
    #[serde(default)]
    pub completion: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt + self.completion
    }
}

/// Canonical benchmark result. Every inbound payload shape is normalized
/// into this before it reaches the store; immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub model_name: String,
    pub correct: bool,
    /// Seconds the model took to respond.
    pub response_time: f64,
    pub token_usage: TokenUsage,
    /// The extracted answer, when one was found.
    pub answer: Option<String>,
    /// Upstream-computed score, nominally in [0, 100].
    pub score: i32,
    pub response_text: String,
    /// Present on results loaded from earlier sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Progress counters for the run in flight. Replaced wholesale by each
/// `progress` envelope; after a pause they may understate reality since
/// paused events are dropped, not replayed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub completed: u32,
    pub total: u32,
    pub elapsed_seconds: f64,
    pub estimated_remaining_seconds: f64,
    pub current_model_name: Option<String>,
}

impl ProgressSnapshot {
    /// Percent complete in [0, 100]. Zero while the total is unknown.
    pub fn percent_complete(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Lifecycle of one run. Terminal states require a fresh start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Cancelled,
    Completed,
    Errored,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Cancelled | RunState::Completed | RunState::Errored)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Cancelled => "cancelled",
            RunState::Completed => "completed",
            RunState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire payload of a `progress` envelope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub current_model_count: u32,
    #[serde(default)]
    pub total_models: u32,
    #[serde(default)]
    pub elapsed_time: f64,
    #[serde(default)]
    pub estimated_remaining: f64,
    #[serde(default)]
    pub testing_model_name: Option<String>,
}

/// One decoded message unit from the incremental feed.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Total {
        total_models: u32,
    },
    Progress(ProgressUpdate),
    /// Raw result payload; normalized at the controller boundary.
    Result(serde_json::Value),
    /// `model_name` present means one model failed and the run continues;
    /// absent means the whole run failed.
    Error {
        model_name: Option<String>,
        error_message: String,
    },
    Complete {
        message: String,
    },
}

impl Envelope {
    /// Decode one feed payload. Unknown `type` values and undecodable
    /// payloads yield None and are skipped by the session.
    pub fn decode(raw: &str) -> Option<Envelope> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => return None,
        };

        let kind = value.get("type").and_then(|t| t.as_str()).unwrap_or("");
        let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);

        match kind {
            "total" => {
                let total_models = data
                    .get("total_models")
                    .and_then(|t| t.as_u64())
                    .unwrap_or(0);
                Some(Envelope::Total {
                    total_models: total_models as u32,
                })
            }

            "progress" => serde_json::from_value(data).ok().map(Envelope::Progress),

            "result" => Some(Envelope::Result(data)),

            "error" => {
                // An empty model_name means an overall failure, same as a
                // missing one.
                let model_name = data
                    .get("model_name")
                    .and_then(|m| m.as_str())
                    .filter(|s| !s.is_empty())
                    .map(String::from);
                let error_message = data
                    .get("error_message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error")
                    .to_string();
                Some(Envelope::Error {
                    model_name,
                    error_message,
                })
            }

            "complete" => {
                let message = data
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(Envelope::Complete { message })
            }

            _ => None,
        }
    }
}
