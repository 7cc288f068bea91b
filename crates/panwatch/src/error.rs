//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use panwatch_config::ConfigError;
use panwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const COMMIT: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to firewall at {host}")]
    #[diagnostic(
        code(panwatch::connection_failed),
        help(
            "Check that the management interface is reachable and the XML API is enabled.\n\
             Reason: {reason}\n\
             Try: panwatch status --insecure"
        )
    )]
    ConnectionFailed { host: String, reason: String },

    #[error("Firewall connection lost")]
    #[diagnostic(code(panwatch::disconnected))]
    Disconnected,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(panwatch::auth_failed),
        help(
            "Verify the username and password, or the API key.\n\
             Run: panwatch config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(panwatch::no_credentials),
        help(
            "Configure credentials with: panwatch config init\n\
             Or set PANWATCH_USERNAME and PANWATCH_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Security rule '{name}' not found")]
    #[diagnostic(
        code(panwatch::rule_not_found),
        help("Run: panwatch rules list to see available rules")
    )]
    RuleNotFound { name: String },

    // ── Operations ───────────────────────────────────────────────────
    #[error("Commit job {job_id} failed")]
    #[diagnostic(
        code(panwatch::commit_failed),
        help(
            "The change was pushed to the candidate configuration but not committed.\n\
             Details: {details}"
        )
    )]
    CommitFailed { job_id: u64, details: String },

    #[error("Refresh failed: {message}")]
    #[diagnostic(code(panwatch::refresh_failed))]
    RefreshFailed { message: String },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(panwatch::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(panwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(panwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: panwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No firewall host configured")]
    #[diagnostic(
        code(panwatch::no_config),
        help(
            "Create a profile with: panwatch config init\n\
             Or pass --host. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(panwatch::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(panwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(panwatch::timeout),
        help("Increase timeout with --timeout or check firewall responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::RuleNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::CommitFailed { .. } => exit_code::COMMIT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, reason } => {
                CliError::ConnectionFailed { host, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Disconnected => CliError::Disconnected,
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::RuleNotFound { name } => CliError::RuleNotFound { name },
            CoreError::RefreshFailed { message } => CliError::RefreshFailed { message },
            CoreError::CommitFailed { job_id, details } => {
                CliError::CommitFailed { job_id, details }
            }
            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                code: code
                    .or_else(|| status.map(|s| format!("HTTP {s}")))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::AlreadyRunning { key } | CoreError::NotRunning { key } => {
                CliError::ApiError {
                    code: "registry".into(),
                    message: key,
                }
            }
            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see panwatch config profiles)".into(),
            },
            ConfigError::Firewall(core) => core.into(),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_failure_has_own_exit_code() {
        let err: CliError = CoreError::CommitFailed {
            job_id: 9,
            details: "rule references unknown zone".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::COMMIT);
    }

    #[test]
    fn api_status_used_when_no_code() {
        let err: CliError = CoreError::Api {
            message: "forbidden".into(),
            code: None,
            status: Some(403),
        }
        .into();
        assert!(matches!(err, CliError::ApiError { ref code, .. } if code == "HTTP 403"));
    }

    #[test]
    fn invalid_config_is_usage_error() {
        let err: CliError = ConfigError::Firewall(CoreError::Config {
            message: "scan interval too short".into(),
        })
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
