//! Hand-off to the hosted checkout page.

use std::sync::Arc;

use crate::backend::{CheckoutGateway, CheckoutRequest, CheckoutSession, Navigator, OnboardingBackend};
use crate::domain::{CustomerDataAccumulator, Plan};
use crate::errors::{OnboardingError, PaymentFailure, Result};

/// Placeholder the payment provider replaces with the real session id.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    /// Return URLs pointing back at the sign-up page of `site_url`.
    pub fn for_site(site_url: &str) -> Self {
        let site = site_url.trim().trim_end_matches('/');
        Self {
            success_url: format!(
                "{}/signup?success=true&session_id={}",
                site, SESSION_ID_PLACEHOLDER
            ),
            cancel_url: format!("{}/signup?canceled=true", site),
        }
    }
}

pub struct CheckoutRedirect {
    backend: Arc<dyn OnboardingBackend>,
    gateway: Arc<dyn CheckoutGateway>,
    navigator: Arc<dyn Navigator>,
    urls: CheckoutUrls,
}

impl CheckoutRedirect {
    pub fn new(
        backend: Arc<dyn OnboardingBackend>,
        gateway: Arc<dyn CheckoutGateway>,
        navigator: Arc<dyn Navigator>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            backend,
            gateway,
            navigator,
            urls,
        }
    }

    pub fn urls(&self) -> &CheckoutUrls {
        &self.urls
    }

    /// Resolves the customer role, persists the wizard state, opens a hosted
    /// checkout session and navigates to it. Nothing is persisted or
    /// navigated when a precondition or the role lookup fails.
    pub fn initiate(
        &self,
        plan: Option<&Plan>,
        accumulator: &mut CustomerDataAccumulator,
    ) -> Result<CheckoutSession> {
        let Some(plan) = plan else {
            return Err(OnboardingError::IncompleteData("no plan selected".into()));
        };
        if accumulator.is_empty() {
            return Err(OnboardingError::IncompleteData("customer data missing".into()));
        }

        let role_id = self.backend.resolve_role_id().map_err(|err| match err {
            OnboardingError::RoleLookup(_) => err,
            other => OnboardingError::RoleLookup(other.to_string()),
        })?;
        accumulator.set_role_id(role_id);
        accumulator.persist(Some(plan))?;

        let data = accumulator.data();
        let customer_name = if data.last_name.trim().is_empty() {
            data.full_name.trim().to_string()
        } else {
            format!("{} {}", data.full_name.trim(), data.last_name.trim())
        };
        let request = CheckoutRequest {
            plan_id: plan.id.clone(),
            amount: plan.price,
            customer_email: data.email.trim().to_string(),
            customer_name,
            success_url: self.urls.success_url.clone(),
            cancel_url: self.urls.cancel_url.clone(),
        };

        tracing::info!(plan = %plan.id, role_id, "creating checkout session");
        let session = self
            .gateway
            .create_checkout_session(&request)
            .map_err(classify_payment_failure)?;
        tracing::info!(session = %session.id, "navigating to hosted checkout");
        self.navigator.navigate(&session.url);
        Ok(session)
    }
}

/// Maps a payment provider failure onto the most specific error kind.
pub fn classify_payment_failure(err: OnboardingError) -> OnboardingError {
    let failure = match err {
        OnboardingError::Gateway(failure) => failure,
        OnboardingError::Network { status, message } => PaymentFailure {
            status,
            message,
            ..PaymentFailure::default()
        },
        other => return other,
    };

    let kind = failure.kind.as_deref().unwrap_or_default();
    let code = failure.code.as_deref().unwrap_or_default();
    let message = failure.message.to_ascii_lowercase();

    let classified = if kind == "card_error" {
        OnboardingError::Card(failure.message.clone())
    } else if failure.status == Some(404)
        || code == "resource_missing"
        || message.contains("no such plan")
        || message.contains("no such price")
        || message.contains("plan not found")
    {
        OnboardingError::PlanUnavailable(failure.message.clone())
    } else if matches!(failure.status, Some(401) | Some(403))
        || kind == "authentication_error"
        || message.contains("api key")
    {
        OnboardingError::PaymentConfiguration(failure.message.clone())
    } else if kind == "invalid_request_error" || failure.status == Some(400) {
        OnboardingError::InvalidRequest(failure.message.clone())
    } else {
        OnboardingError::Checkout(failure.to_string())
    };
    tracing::warn!(%failure, classified = %classified, "checkout session failed");
    classified
}
