use thiserror::Error;

/// Pipeline stage an extraction cycle is in (or failed in)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Authenticating,
    Rendering,
    Extracting,
    Persisting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Authenticating => "authenticating",
            Stage::Rendering => "rendering",
            Stage::Extracting => "extracting",
            Stage::Persisting => "persisting",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the identity gate refused a caller.
///
/// Only used for logging; callers always see the same message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("no credential supplied")]
    MissingCredential,
    #[error("credential rejected by identity service")]
    Rejected,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Failures raised while driving the browser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("navigation failed: {message}")]
    Navigation { message: String },
    #[error("timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("browser session error: {message}")]
    Session { message: String },
}

/// Error taxonomy for one extraction cycle. Every variant is terminal.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Auth(AuthFailure),

    #[error("render failed: {0}")]
    Render(RenderError),

    #[error("could not parse page markup: {0}")]
    Parse(String),

    #[error("could not store links: {0}")]
    Store(String),
}

impl ExtractionError {
    /// Stage the failure belongs to
    pub fn stage(&self) -> Stage {
        match self {
            ExtractionError::Validation(_) => Stage::Validating,
            ExtractionError::Auth(_) => Stage::Authenticating,
            ExtractionError::Render(_) => Stage::Rendering,
            ExtractionError::Parse(_) => Stage::Extracting,
            ExtractionError::Store(_) => Stage::Persisting,
        }
    }

    /// Message safe to show to the caller.
    ///
    /// Upstream bodies and auth detail stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ExtractionError::Validation(msg) => format!("invalid request: {msg}"),
            ExtractionError::Auth(_) => "authentication failed".to_string(),
            ExtractionError::Render(RenderError::Status { status, .. }) => {
                format!("render failed: upstream returned HTTP {status}")
            }
            ExtractionError::Render(RenderError::Timeout { after_secs }) => {
                format!("render failed: timed out after {after_secs}s")
            }
            ExtractionError::Render(RenderError::Navigation { .. }) => {
                "render failed: could not load page".to_string()
            }
            ExtractionError::Render(RenderError::Session { .. }) => {
                "render failed: browser session error".to_string()
            }
            ExtractionError::Parse(_) => "could not parse page markup".to_string(),
            ExtractionError::Store(_) => "could not store extracted links".to_string(),
        }
    }

    /// HTTP status code used when the failure reaches the HTTP boundary
    pub fn http_status(&self) -> u16 {
        match self {
            ExtractionError::Validation(_) => 400,
            ExtractionError::Auth(_) => 401,
            ExtractionError::Render(RenderError::Timeout { .. }) => 504,
            ExtractionError::Render(_) => 502,
            ExtractionError::Parse(_) => 502,
            ExtractionError::Store(_) => 500,
        }
    }
}

impl From<AuthFailure> for ExtractionError {
    fn from(value: AuthFailure) -> Self {
        ExtractionError::Auth(value)
    }
}

impl From<RenderError> for ExtractionError {
    fn from(value: RenderError) -> Self {
        ExtractionError::Render(value)
    }
}

/// Errors raised while loading the service configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ExtractionError::Validation("x".into()).http_status(), 400);
        assert_eq!(
            ExtractionError::Auth(AuthFailure::MissingCredential).http_status(),
            401
        );
        assert_eq!(
            ExtractionError::Render(RenderError::Timeout { after_secs: 90 }).http_status(),
            504
        );
        assert_eq!(
            ExtractionError::Render(RenderError::Status {
                status: 500,
                message: "boom".into()
            })
            .http_status(),
            502
        );
        assert_eq!(ExtractionError::Parse("empty".into()).http_status(), 502);
        assert_eq!(ExtractionError::Store("down".into()).http_status(), 500);
    }

    #[test]
    fn test_auth_reasons_share_public_message() {
        let missing = ExtractionError::Auth(AuthFailure::MissingCredential);
        let rejected = ExtractionError::Auth(AuthFailure::Rejected);
        assert_eq!(missing.public_message(), rejected.public_message());
        assert_eq!(missing.stage(), Stage::Authenticating);
    }

    #[test]
    fn test_upstream_body_not_exposed() {
        let err = ExtractionError::Render(RenderError::Status {
            status: 500,
            message: "stack trace at secret.internal:8080".into(),
        });
        let public = err.public_message();
        assert!(public.contains("500"));
        assert!(!public.contains("secret.internal"));
    }
}
