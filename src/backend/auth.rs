use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::backend::AuthProvider;
use crate::errors::{OnboardingError, Result};

/// Client-credentials token response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Performs the actual token request.
pub trait TokenSource: Send + Sync {
    fn fetch_token(&self) -> Result<AccessToken>;
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Caches a client-credentials token until `expires_in` minus the refresh
/// margin has elapsed.
pub struct ClientCredentialsAuth<S: TokenSource> {
    source: S,
    margin: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl<S: TokenSource> ClientCredentialsAuth<S> {
    pub fn new(source: S, margin: Duration) -> Self {
        Self {
            source,
            margin,
            cached: Mutex::new(None),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CachedToken>> {
        self.cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: TokenSource> AuthProvider for ClientCredentialsAuth<S> {
    fn token(&self) -> Result<String> {
        let mut cached = self.lock();
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
            tracing::debug!("access token near expiry, refreshing");
        }

        let fresh = self.source.fetch_token()?;
        if fresh.access_token.is_empty() {
            *cached = None;
            return Err(OnboardingError::Auth("token endpoint returned no token".into()));
        }
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(self.margin);
        *cached = Some(CachedToken {
            value: fresh.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        tracing::info!(expires_in = fresh.expires_in, "acquired access token");
        Ok(fresh.access_token)
    }

    fn is_authenticated(&self) -> bool {
        self.lock()
            .as_ref()
            .map_or(false, |token| Instant::now() < token.refresh_at)
    }

    fn logout(&self) {
        *self.lock() = None;
    }
}

/// Fixed token, for bearer tokens obtained through the login endpoint.
pub struct StaticToken(pub String);

impl AuthProvider for StaticToken {
    fn token(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(OnboardingError::Auth("not logged in".into()));
        }
        Ok(self.0.clone())
    }

    fn is_authenticated(&self) -> bool {
        !self.0.is_empty()
    }

    fn logout(&self) {}
}
