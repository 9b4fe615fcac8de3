use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub api_key: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            api_key: api_key.into(),
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
