//! Shared constants used across the application

/// Assistant turn appended when a submission fails at the transport level.
pub const TRANSPORT_ERROR_MESSAGE: &str = "Error: Failed to connect to the RAG server. Make sure the API key is correct and the backend is running.";

/// Base URL used when neither the command line nor the config file names one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable consulted for the backend credential.
pub const API_KEY_ENV: &str = "RAGCHAT_API_KEY";
