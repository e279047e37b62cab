use std::fmt;

use thiserror::Error;

/// Raw failure reported by the hosted payment provider before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFailure {
    pub status: Option<u16>,
    pub kind: Option<String>,
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP {}: ", status)?;
        }
        if let Some(kind) = &self.kind {
            write!(f, "[{}] ", kind)?;
        }
        f.write_str(&self.message)
    }
}

/// Error type covering every failure the onboarding flow can surface.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Incomplete data: {0}")]
    IncompleteData(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Network error ({}): {message}", describe_status(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },
    #[error("Plan unavailable: {0}")]
    PlanUnavailable(String),
    #[error("Payment configuration error: {0}")]
    PaymentConfiguration(String),
    #[error("Card error: {0}")]
    Card(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Payment provider error: {0}")]
    Gateway(PaymentFailure),
    #[error("Role lookup failed: {0}")]
    RoleLookup(String),
    #[error("Backend feature unavailable: {0}")]
    BackendUnavailable(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Checkout failed: {0}")]
    Checkout(String),
    #[error("Subscription failed: {0}")]
    Submission(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OnboardingError>;

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl OnboardingError {
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        OnboardingError::Network {
            status,
            message: message.into(),
        }
    }

    /// Transient failures worth another attempt: no response, 5xx, or 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            OnboardingError::Network { status: None, .. } => true,
            OnboardingError::Network {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            OnboardingError::Network { status, .. } => *status,
            OnboardingError::Gateway(failure) => failure.status,
            _ => None,
        }
    }

    /// Single notice shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            OnboardingError::Validation(message) => message.clone(),
            OnboardingError::IncompleteData(_) => {
                "Please complete all required information before continuing.".into()
            }
            OnboardingError::Auth(_) => "Your session has expired. Please log in again.".into(),
            OnboardingError::Network { .. } => {
                "We couldn't reach the server. Please check your connection and try again.".into()
            }
            OnboardingError::PlanUnavailable(_) => {
                "The selected plan is currently unavailable. Please choose another plan.".into()
            }
            OnboardingError::PaymentConfiguration(_) => {
                "Payments are temporarily unavailable due to a configuration problem. Please contact support.".into()
            }
            OnboardingError::Card(message) => {
                format!("Your card could not be processed: {}", message)
            }
            OnboardingError::InvalidRequest(_) => {
                "The payment request was invalid. Please review your details and try again.".into()
            }
            OnboardingError::Gateway(_) | OnboardingError::Checkout(_) => {
                "We couldn't start checkout. Please try again.".into()
            }
            OnboardingError::RoleLookup(_) => {
                "We couldn't set up your account role. Please try again later.".into()
            }
            OnboardingError::BackendUnavailable(_) => "This feature is not available yet.".into(),
            OnboardingError::Submission(_) => {
                "We couldn't activate your subscription. Please try again.".into()
            }
            OnboardingError::Config(_)
            | OnboardingError::UnexpectedResponse(_)
            | OnboardingError::Storage(_)
            | OnboardingError::Io(_)
            | OnboardingError::Serde(_) => "Something went wrong. Please try again.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(OnboardingError::network(None, "timeout").is_retryable());
        assert!(OnboardingError::network(Some(503), "down").is_retryable());
        assert!(OnboardingError::network(Some(429), "slow down").is_retryable());
        assert!(!OnboardingError::network(Some(404), "missing").is_retryable());
        assert!(!OnboardingError::Validation("bad".into()).is_retryable());
    }

    #[test]
    fn network_display_mentions_status() {
        let err = OnboardingError::network(Some(502), "bad gateway");
        assert_eq!(err.to_string(), "Network error (502): bad gateway");
        let err = OnboardingError::network(None, "connection refused");
        assert_eq!(err.to_string(), "Network error (no response): connection refused");
    }

    #[test]
    fn card_message_carries_provider_detail() {
        let err = OnboardingError::Card("Your card was declined.".into());
        assert_eq!(
            err.user_message(),
            "Your card could not be processed: Your card was declined."
        );
    }
}
