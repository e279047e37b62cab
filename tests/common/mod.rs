#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use receptionist_onboarding::backend::{
    CheckoutGateway, CheckoutRequest, CheckoutSession, Location, Navigator, OnboardingBackend,
};
use receptionist_onboarding::config::CheckoutMode;
use receptionist_onboarding::domain::{
    Plan, SubscriptionConfirmation, SubscriptionPayload, TaxCalculation, TaxPreviewRequest,
};
use receptionist_onboarding::errors::{OnboardingError, PaymentFailure, Result};
use receptionist_onboarding::storage::{MemoryStore, WizardPersistence};
use receptionist_onboarding::wizard::{
    CheckoutUrls, Collaborators, NoticeLog, PaymentWizard, StepOutcome,
};

pub const SITE: &str = "https://app.example.com";

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct FakeBackend {
    pub plans: Mutex<Vec<Plan>>,
    pub states: Mutex<HashMap<String, Vec<Location>>>,
    pub tax_rate: Mutex<f64>,
    pub role: Mutex<Option<u64>>,
    pub subscription_failures: Mutex<u32>,
    pub tax_unavailable: Mutex<bool>,
    pub tax_requests: Mutex<Vec<TaxPreviewRequest>>,
    pub subscriptions: Mutex<Vec<SubscriptionPayload>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        *backend.plans.lock().unwrap() = vec![
            Plan::new("starter", "Starter", 49.0),
            Plan::new("pro", "Professional", 99.0),
        ];
        *backend.tax_rate.lock().unwrap() = 0.0825;
        *backend.role.lock().unwrap() = Some(2);
        backend
            .states
            .lock()
            .unwrap()
            .insert("231".into(), vec![Location::new("57", "Texas", Some("TX"))]);
        backend
    }

    pub fn without_role(self) -> Self {
        *self.role.lock().unwrap() = None;
        self
    }

    pub fn failing_tax(self) -> Self {
        *self.tax_unavailable.lock().unwrap() = true;
        self
    }

    pub fn failing_subscriptions(self, count: u32) -> Self {
        *self.subscription_failures.lock().unwrap() = count;
        self
    }

    pub fn tax_calls(&self) -> usize {
        self.tax_requests.lock().unwrap().len()
    }

    pub fn subscription_calls(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }
}

impl OnboardingBackend for FakeBackend {
    fn list_plans(&self) -> Result<Vec<Plan>> {
        Ok(self.plans.lock().unwrap().clone())
    }

    fn list_countries(&self) -> Result<Vec<Location>> {
        Ok(vec![
            Location::new("231", "United States", Some("US")),
            Location::new("232", "United Kingdom", Some("GB")),
        ])
    }

    fn list_states(&self, country_id: &str) -> Result<Vec<Location>> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(country_id)
            .cloned()
            .unwrap_or_default())
    }

    fn list_cities(&self, _state_id: &str) -> Result<Vec<Location>> {
        Ok(vec![Location::new("900", "Austin", None)])
    }

    fn tax_preview(&self, request: &TaxPreviewRequest) -> Result<TaxCalculation> {
        self.tax_requests.lock().unwrap().push(request.clone());
        if *self.tax_unavailable.lock().unwrap() {
            return Err(OnboardingError::network(Some(400), "tax preview rejected"));
        }
        let rate = *self.tax_rate.lock().unwrap();
        let tax = (request.amount * rate * 100.0).round() / 100.0;
        Ok(TaxCalculation {
            amount: request.amount,
            currency: "USD".into(),
            country: request.country.clone(),
            state: request.state.clone(),
            postal_code: request.postal_code.clone(),
            tax_amount: tax,
            tax_rate: rate,
            total_amount: request.amount + tax,
        })
    }

    fn resolve_role_id(&self) -> Result<u64> {
        self.role
            .lock()
            .unwrap()
            .ok_or_else(|| OnboardingError::RoleLookup("customer role missing".into()))
    }

    fn create_subscription(&self, payload: &SubscriptionPayload) -> Result<SubscriptionConfirmation> {
        self.subscriptions.lock().unwrap().push(payload.clone());
        let mut failures = self.subscription_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(OnboardingError::network(Some(503), "service unavailable"));
        }
        Ok(SubscriptionConfirmation {
            id: format!("sub_{}", self.subscription_calls()),
            status: "active".into(),
        })
    }
}

/// Gateway returning either a fixed session or a fixed failure.
pub struct FakeGateway {
    pub failure: Mutex<Option<PaymentFailure>>,
    pub requests: Mutex<Vec<CheckoutRequest>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            failure: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: PaymentFailure) -> Self {
        let gateway = Self::new();
        *gateway.failure.lock().unwrap() = Some(failure);
        gateway
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl CheckoutGateway for FakeGateway {
    fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(failure) = self.failure.lock().unwrap().clone() {
            return Err(OnboardingError::Gateway(failure));
        }
        Ok(CheckoutSession {
            id: "cs_test_123".into(),
            url: "https://checkout.example.com/pay/cs_test_123".into(),
        })
    }
}

/// Navigator that records targets and, when given a store, whether the
/// customer record was already persisted at navigation time.
#[derive(Default)]
pub struct RecordingNavigator {
    pub visits: Mutex<Vec<String>>,
    pub persisted_at_navigation: Mutex<Vec<bool>>,
    pub store: Option<Arc<MemoryStore>>,
}

impl RecordingNavigator {
    pub fn watching(store: Arc<MemoryStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        if let Some(store) = &self.store {
            let persisted = store.contains("customer_data") && store.contains("selected_plan");
            self.persisted_at_navigation.lock().unwrap().push(persisted);
        }
        self.visits.lock().unwrap().push(url.to_string());
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub gateway: Arc<FakeGateway>,
    pub navigator: Arc<RecordingNavigator>,
    pub notices: Arc<NoticeLog>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeBackend::new(), FakeGateway::new())
    }

    pub fn with(backend: FakeBackend, gateway: FakeGateway) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            backend: Arc::new(backend),
            gateway: Arc::new(gateway),
            navigator: Arc::new(RecordingNavigator::watching(store.clone())),
            notices: Arc::new(NoticeLog::new()),
            store,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            backend: self.backend.clone(),
            gateway: self.gateway.clone(),
            navigator: self.navigator.clone(),
            notices: self.notices.clone(),
            store: self.store.clone(),
        }
    }

    /// Fresh store handle for a "new page load" that keeps persisted state.
    pub fn persistence(&self) -> Arc<dyn WizardPersistence> {
        self.store.clone()
    }

    pub fn wizard(&self, mode: CheckoutMode) -> PaymentWizard {
        PaymentWizard::new(&self.collaborators(), CheckoutUrls::for_site(SITE), mode)
    }
}

pub fn fill_profile(wizard: &mut PaymentWizard) {
    for (key, value) in [
        ("fullName", "Dana Reyes"),
        ("email", "dana@reyesdental.com"),
        ("companyName", "Reyes Dental"),
        ("officeNumber", "512 555 0142"),
        ("industry", "Healthcare"),
        ("heardAbout", "Search engine"),
    ] {
        wizard.handle_profile_change(key, value);
    }
}

pub fn fill_business(wizard: &mut PaymentWizard) {
    for (key, value) in [
        ("company", "Reyes Dental LLC"),
        ("address1", "1200 Congress Ave"),
        ("country", "US"),
        ("state", "TX"),
        ("city", "Austin"),
        ("zip", "73301"),
        ("mobileNumber", "512 555 0199"),
    ] {
        wizard.handle_business_change(key, value);
    }
}

/// Drives a wizard with valid data up to the Summary step.
pub fn wizard_at_summary(harness: &Harness, mode: CheckoutMode) -> PaymentWizard {
    let mut wizard = harness.wizard(mode);
    wizard.select_plan(Some(Plan::new("pro", "Professional", 99.0)));
    fill_profile(&mut wizard);
    assert!(matches!(wizard.next_step(), StepOutcome::Advanced(_)));
    fill_business(&mut wizard);
    assert!(matches!(wizard.next_step(), StepOutcome::Advanced(_)));
    wizard
}
