use thiserror::Error;

/// Failure reported by one of the external services
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request to {service} failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} responded with HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Transport failures, throttling and server-side errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport { .. } => true,
            GatewayError::Status { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Decode { .. } | GatewayError::Io(_) => false,
        }
    }

    /// Whether a request that creates something can be sent again. Only an
    /// explicit throttling or unavailable answer guarantees nothing was created.
    pub fn is_safe_to_resend(&self) -> bool {
        matches!(self, GatewayError::Status { status: 429 | 503, .. })
    }
}

/// Error type shared by the resolver, the updaters and the HTTP layer.
///
/// `NotFound` is kept apart from gateway and layout failures so callers can
/// tell "no such CID" from "the spreadsheet could not be read".
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("{0}")]
    Validation(String),

    #[error("No record found for CID '{0}'")]
    NotFound(String),

    #[error("sheet layout error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_gateway_failures_are_retryable() {
        let status = |status| GatewayError::Status {
            service: "sheets",
            status,
            body: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(
            GatewayError::Transport {
                service: "drive",
                message: "connection reset".into()
            }
            .is_retryable()
        );
        assert!(
            !GatewayError::Decode {
                service: "drive",
                message: "missing id".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn only_rejected_creates_are_resent() {
        let status = |status| GatewayError::Status {
            service: "drive",
            status,
            body: String::new(),
        };
        assert!(status(429).is_safe_to_resend());
        assert!(status(503).is_safe_to_resend());
        assert!(!status(500).is_safe_to_resend());
        assert!(
            !GatewayError::Transport {
                service: "drive",
                message: "operation timed out".into()
            }
            .is_safe_to_resend()
        );
    }
}
