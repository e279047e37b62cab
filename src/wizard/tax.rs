use std::sync::Arc;

use crate::backend::OnboardingBackend;
use crate::domain::{CustomerData, OrderSummary, Plan, TaxCalculation, TaxPreviewRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TaxKey {
    state: String,
    plan_id: String,
    price_cents: i64,
}

/// Keeps the tax preview for the current `(state, plan)` pair. Any other
/// change to the customer record leaves the cached calculation alone.
pub struct TaxCalculator {
    backend: Arc<dyn OnboardingBackend>,
    key: Option<TaxKey>,
    failed: Option<TaxKey>,
    current: Option<TaxCalculation>,
    requests: usize,
}

impl TaxCalculator {
    pub fn new(backend: Arc<dyn OnboardingBackend>) -> Self {
        Self {
            backend,
            key: None,
            failed: None,
            current: None,
            requests: 0,
        }
    }

    pub fn current(&self) -> Option<&TaxCalculation> {
        self.current.as_ref()
    }

    /// Whether the last preview for the current pair failed.
    pub fn has_failed(&self) -> bool {
        self.failed.is_some()
    }

    /// Number of preview requests issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Recomputes when the state, plan or price changed. A pair whose
    /// preview failed is not asked for again until it changes or
    /// [`TaxCalculator::retry`] is called. Returns whether a request was made.
    pub fn refresh(&mut self, customer: &CustomerData, plan: Option<&Plan>) -> bool {
        let state = customer.state.trim();
        let (Some(plan), false) = (plan, state.is_empty()) else {
            if self.key.take().is_some() {
                tracing::debug!("clearing tax preview, no state or plan");
            }
            self.failed = None;
            self.current = None;
            return false;
        };

        let key = TaxKey {
            state: state.to_string(),
            plan_id: plan.id.clone(),
            price_cents: plan.price_cents(),
        };
        if self.key.as_ref() == Some(&key) || self.failed.as_ref() == Some(&key) {
            return false;
        }

        let request = TaxPreviewRequest {
            amount: plan.price,
            country: customer.country.clone(),
            state: key.state.clone(),
            postal_code: customer.zip.clone(),
        };
        self.requests += 1;
        match self.backend.tax_preview(&request) {
            Ok(calculation) => {
                tracing::info!(
                    state = %key.state,
                    plan = %key.plan_id,
                    tax = calculation.tax_amount,
                    "tax preview updated"
                );
                self.current = Some(calculation);
                self.failed = None;
                self.key = Some(key);
            }
            Err(err) => {
                tracing::warn!(error = %err, state = %key.state, "tax preview failed");
                self.current = None;
                self.key = None;
                self.failed = Some(key);
            }
        }
        true
    }

    /// Asks again for a pair whose preview failed.
    pub fn retry(&mut self, customer: &CustomerData, plan: Option<&Plan>) -> bool {
        self.failed = None;
        self.refresh(customer, plan)
    }

    pub fn summary(&self, plan: &Plan) -> OrderSummary {
        OrderSummary::for_plan(plan, self.current.as_ref())
    }
}
