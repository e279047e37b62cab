//! Remote collaborators the onboarding core talks to: the application
//! backend, the hosted payment provider, and page navigation.

pub mod auth;
pub mod http;
pub mod locations;
pub mod responses;
pub mod retry;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::dashboard::CallRecord;
use crate::domain::{
    Plan, SubscriptionConfirmation, SubscriptionPayload, TaxCalculation, TaxPreviewRequest,
};
use crate::errors::Result;

pub use auth::{AccessToken, ClientCredentialsAuth, StaticToken, TokenSource};
pub use http::{HttpBackend, HttpTokenSource};
pub use locations::{LocationDirectory, LocationKind, Ticket};
pub use responses::LoginResponse;
pub use retry::RetryPolicy;

/// Country, state or city entry returned by the list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "iso2", alias = "state_code")]
    pub code: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.map(str::to_string),
            active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

fn id_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("unsupported id value: {}", other))),
    }
}

/// Body of the hosted checkout session request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub plan_id: String,
    pub amount: f64,
    pub customer_email: String,
    pub customer_name: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    #[serde(alias = "sessionId", alias = "session_id")]
    pub id: String,
    pub url: String,
}

/// Application backend consumed by the wizards.
pub trait OnboardingBackend: Send + Sync {
    fn list_plans(&self) -> Result<Vec<Plan>>;
    fn list_countries(&self) -> Result<Vec<Location>>;
    /// Returns an empty list when the backend does not offer states yet.
    fn list_states(&self, country_id: &str) -> Result<Vec<Location>>;
    /// Returns an empty list when the backend does not offer cities yet.
    fn list_cities(&self, state_id: &str) -> Result<Vec<Location>>;
    fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxCalculation>;
    /// Role identifier assigned to newly onboarded customers.
    fn resolve_role_id(&self) -> Result<u64>;
    /// Never retried automatically.
    fn create_subscription(&self, payload: &SubscriptionPayload)
        -> Result<SubscriptionConfirmation>;
}

/// Hosted payment provider.
pub trait CheckoutGateway: Send + Sync {
    fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

/// Hands control to another page. After a checkout navigation nothing else
/// in the current flow runs.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

pub trait AuthProvider: Send + Sync {
    fn token(&self) -> Result<String>;
    fn is_authenticated(&self) -> bool;
    fn logout(&self);
}

/// Source of the call history shown on the dashboard.
pub trait CallReportSource: Send + Sync {
    fn call_records(&self) -> Result<Vec<CallRecord>>;
}
