//! HTTP implementation of the backend contracts over a blocking reqwest
//! client. Reads go through the retry policy; writes are sent once.

use std::sync::Arc;

use reqwest::blocking::Client;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::backend::auth::{AccessToken, TokenSource};
use crate::backend::responses::{self, LoginResponse};
use crate::backend::{
    AuthProvider, CallReportSource, CheckoutGateway, CheckoutRequest, CheckoutSession, Location,
    OnboardingBackend, RetryPolicy,
};
use crate::config::AppConfig;
use crate::dashboard::CallRecord;
use crate::domain::{
    Plan, SubscriptionConfirmation, SubscriptionPayload, TaxCalculation, TaxPreviewRequest,
};
use crate::errors::{OnboardingError, PaymentFailure, Result};

const CUSTOMER_ROLE: &str = "customer";

pub struct HttpBackend {
    client: Client,
    base: Url,
    retry: RetryPolicy,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl HttpBackend {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| OnboardingError::Config(format!("http client: {}", err)))?;
        Ok(Self {
            client,
            base: base_url(&config.api_base_url)?,
            retry: RetryPolicy::from_settings(&config.retry),
            auth: None,
        })
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|err| OnboardingError::Config(format!("endpoint `{}`: {}", path, err)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Sends one request and returns the status with the decoded body.
    fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<(u16, Value)> {
        let mut request = self.client.request(method, url);
        if let Some(auth) = &self.auth {
            request = request.bearer_auth(auth.token()?);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(transport)?;
        let status = response.status().as_u16();
        let text = response.text().map_err(transport)?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
        };
        Ok((status, body))
    }

    fn ensure_success(&self, status: u16, body: Value) -> Result<Value> {
        if (200..300).contains(&status) {
            return Ok(body);
        }
        let message = error_message(status, &body);
        if status == 401 {
            if let Some(auth) = &self.auth {
                auth.logout();
            }
            return Err(OnboardingError::Auth(message));
        }
        Err(OnboardingError::network(Some(status), message))
    }

    fn get(&self, label: &str, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.endpoint(path, query)?;
        self.retry.run(label, || {
            let (status, body) = self.send(Method::GET, url.clone(), None)?;
            self.ensure_success(status, body)
        })
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.endpoint(path, &[])?;
        let body = serde_json::to_value(body)?;
        let (status, body) = self.send(Method::POST, url, Some(&body))?;
        self.ensure_success(status, body)
    }

    /// Location list where a 404 means the endpoint is not offered yet.
    fn optional_locations(
        &self,
        resource: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Location>> {
        match self.get(resource, path, query) {
            Ok(body) => responses::parse_locations(&body, resource),
            Err(err) if err.status() == Some(404) => {
                let unavailable = OnboardingError::BackendUnavailable(format!("{} endpoint", resource));
                tracing::info!(%unavailable, "treating missing endpoint as an empty list");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = self.post("oauth/user/login", &json!({ "email": email, "password": password }))?;
        let login = responses::parse_login(&body)?;
        tracing::info!(email, "user logged in");
        Ok(login)
    }
}

impl OnboardingBackend for HttpBackend {
    fn list_plans(&self) -> Result<Vec<Plan>> {
        let body = self.get("plans", "plans", &[])?;
        let items = responses::extract_list(&body, "plans")?;
        Ok(responses::parse_items(items, "plans"))
    }

    fn list_countries(&self) -> Result<Vec<Location>> {
        let body = self.get("countries", "countries", &[])?;
        responses::parse_locations(&body, "countries")
    }

    fn list_states(&self, country_id: &str) -> Result<Vec<Location>> {
        self.optional_locations("states", "states", &[("country_id", country_id)])
    }

    fn list_cities(&self, state_id: &str) -> Result<Vec<Location>> {
        self.optional_locations("cities", "cities", &[("state_id", state_id)])
    }

    fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxCalculation> {
        let amount = format!("{:.2}", request.amount);
        let query = [
            ("amount", amount.as_str()),
            ("country", request.country.as_str()),
            ("state", request.state.as_str()),
            ("postal_code", request.postal_code.as_str()),
        ];
        let body = self.get("tax_preview", "tax/preview", &query)?;
        responses::parse_object(body)
    }

    fn resolve_role_id(&self) -> Result<u64> {
        let body = self.get("roles", "roles", &[])?;
        let roles = responses::extract_list(&body, "roles")?;
        roles
            .iter()
            .find(|role| {
                role.get("name")
                    .and_then(Value::as_str)
                    .map_or(false, |name| name.eq_ignore_ascii_case(CUSTOMER_ROLE))
            })
            .and_then(|role| role.get("id"))
            .and_then(|id| id.as_u64().or_else(|| id.as_str()?.parse().ok()))
            .ok_or_else(|| OnboardingError::RoleLookup(format!("no `{}` role", CUSTOMER_ROLE)))
    }

    fn create_subscription(
        &self,
        payload: &SubscriptionPayload,
    ) -> Result<SubscriptionConfirmation> {
        let body = self.post("subscriptions/create-from-session", payload)?;
        responses::parse_object(body)
    }
}

impl CheckoutGateway for HttpBackend {
    fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let url = self.endpoint("payments/create-checkout-session", &[])?;
        let body = serde_json::to_value(request)?;
        let (status, body) = self.send(Method::POST, url, Some(&body))?;
        if !(200..300).contains(&status) {
            return Err(OnboardingError::Gateway(payment_failure(status, &body)));
        }
        responses::parse_object(body)
    }
}

impl CallReportSource for HttpBackend {
    fn call_records(&self) -> Result<Vec<CallRecord>> {
        let body = self.get("calls", "calls", &[])?;
        let items = responses::extract_list(&body, "calls")?;
        Ok(responses::parse_items(items, "calls"))
    }
}

/// Client-credentials token endpoint.
pub struct HttpTokenSource {
    client: Client,
    url: Url,
    client_id: String,
    client_secret: String,
    retry: RetryPolicy,
}

impl HttpTokenSource {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.clone(), config.client_secret.clone())
        else {
            return Err(OnboardingError::Config(
                "client_id and client_secret are required for token requests".into(),
            ));
        };
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| OnboardingError::Config(format!("http client: {}", err)))?;
        let url = base_url(&config.api_base_url)?
            .join("oauth/token")
            .map_err(|err| OnboardingError::Config(err.to_string()))?;
        Ok(Self {
            client,
            url,
            client_id,
            client_secret,
            retry: RetryPolicy::from_settings(&config.retry),
        })
    }
}

impl TokenSource for HttpTokenSource {
    fn fetch_token(&self) -> Result<AccessToken> {
        self.retry.run("token", || {
            let response = self
                .client
                .post(self.url.clone())
                .json(&json!({
                    "grant_type": "client_credentials",
                    "client_id": self.client_id,
                    "client_secret": self.client_secret,
                }))
                .send()
                .map_err(transport)?;
            let status = response.status().as_u16();
            let text = response.text().map_err(transport)?;
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            if !(200..300).contains(&status) {
                let message = error_message(status, &body);
                return Err(if status == 401 || status == 403 {
                    OnboardingError::Auth(message)
                } else {
                    OnboardingError::network(Some(status), message)
                });
            }
            responses::parse_object(body)
        })
    }
}

fn base_url(raw: &str) -> Result<Url> {
    let normalized = format!("{}/", raw.trim().trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|err| OnboardingError::Config(format!("api_base_url `{}`: {}", raw, err)))
}

fn transport(err: reqwest::Error) -> OnboardingError {
    OnboardingError::network(err.status().map(|status| status.as_u16()), err.to_string())
}

fn error_message(status: u16, body: &Value) -> String {
    let candidates = [
        body.get("message"),
        body.get("error").filter(|error| error.is_string()),
        body.get("error").and_then(|error| error.get("message")),
        body.get("detail"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(str::to_string)
        .or_else(|| body.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Reads the provider's error envelope, either `{ "error": { type, code,
/// message } }` or the same keys at the top level.
pub fn payment_failure(status: u16, body: &Value) -> PaymentFailure {
    let scope = body.get("error").filter(|error| error.is_object()).unwrap_or(body);
    let text = |key: &str| scope.get(key).and_then(Value::as_str).map(str::to_string);
    PaymentFailure {
        status: Some(status),
        kind: text("type"),
        code: text("code"),
        message: text("message").unwrap_or_else(|| error_message(status, body)),
    }
}
