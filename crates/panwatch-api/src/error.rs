use thiserror::Error;

/// Top-level error type for the `panwatch-api` crate.
///
/// Covers every failure mode of the XML API surface: authentication,
/// transport, API-level error envelopes, malformed XML, and commit jobs.
/// `panwatch-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Key generation failed or the device rejected the API key.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A request was attempted before [`login`](crate::XmlApiClient::login).
    #[error("No API key -- call login first")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request or job wait timed out.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status without a parseable XML envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── XML API ─────────────────────────────────────────────────────
    /// `<response status="error">` returned by the device.
    #[error("PAN-OS API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
    },

    /// The body was not well-formed XML, or lacked a required element.
    #[error("XML error: {message}")]
    Xml { message: String, body: String },

    // ── Commit ──────────────────────────────────────────────────────
    /// The commit job finished with a result other than `OK`.
    #[error("Commit job {job_id} failed: {details}")]
    CommitFailed { job_id: u64, details: String },
}

impl Error {
    /// Returns `true` if this error indicates the API key is invalid
    /// and generating a new one might resolve it.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::NotAuthenticated)
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Extract the PAN-OS response code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
