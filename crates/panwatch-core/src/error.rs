// ── Core error types ──
//
// User-facing errors from panwatch-core. Consumers never see HTTP status
// codes or XML parse failures directly; the `From<panwatch_api::Error>`
// impl folds transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to firewall at {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Firewall disconnected")]
    Disconnected,

    #[error("Firewall request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Security rule not found: {name}")]
    RuleNotFound { name: String },

    #[error("Refresh failed: {message}")]
    RefreshFailed { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Commit job {job_id} failed: {details}")]
    CommitFailed { job_id: u64, details: String },

    #[error("A controller for {key} is already running")]
    AlreadyRunning { key: String },

    #[error("No controller running for {key}")]
    NotRunning { key: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// PAN-OS response code (e.g. `"17"` for a malformed command).
        code: Option<String>,
        /// HTTP status code, if the failure happened at that layer.
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<panwatch_api::Error> for CoreError {
    fn from(err: panwatch_api::Error) -> Self {
        match err {
            panwatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            panwatch_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "no API key -- authenticate first".into(),
            },
            panwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        host: e
                            .url()
                            .and_then(|u| u.host_str().map(str::to_owned))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            panwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            panwatch_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            panwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                host: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            panwatch_api::Error::Http { status, body } => CoreError::Api {
                message: body,
                code: None,
                status: Some(status),
            },
            panwatch_api::Error::Api { message, code } => CoreError::Api {
                message,
                code,
                status: None,
            },
            panwatch_api::Error::Xml { message, body: _ } => {
                CoreError::Internal(format!("XML parse error: {message}"))
            }
            panwatch_api::Error::CommitFailed { job_id, details } => {
                CoreError::CommitFailed { job_id, details }
            }
        }
    }
}
