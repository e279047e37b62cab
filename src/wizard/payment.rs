//! Payment wizard: Profile → Business → Summary → Get Started.
//!
//! Profile and Business each own a [`FormController`] whose `validate_form`
//! gates advancement. Summary starts the hosted checkout (or skips it in
//! [`CheckoutMode::Bypass`]). Returning from checkout is handled by
//! [`PaymentWizard::resume`], which reads the URL markers exactly once.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use url::form_urlencoded;
use uuid::Uuid;

use crate::backend::CheckoutSession;
use crate::config::CheckoutMode;
use crate::domain::{
    BusinessUpdate, CustomerData, CustomerDataAccumulator, OrderSummary, Plan, ProfileUpdate,
};
use crate::errors::OnboardingError;
use crate::forms::{FieldSpec, FormController, FormDescriptor};
use crate::validation::{rules, FieldType};
use crate::wizard::checkout::{CheckoutRedirect, CheckoutUrls};
use crate::wizard::notice::{Notice, NoticeSink};
use crate::wizard::tax::TaxCalculator;
use crate::wizard::Collaborators;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentStep {
    Profile,
    Business,
    Summary,
    GetStarted,
}

impl PaymentStep {
    pub const ALL: [PaymentStep; 4] = [
        PaymentStep::Profile,
        PaymentStep::Business,
        PaymentStep::Summary,
        PaymentStep::GetStarted,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStep::Profile => "Your Profile",
            PaymentStep::Business => "Business Details",
            PaymentStep::Summary => "Order Summary",
            PaymentStep::GetStarted => "Get Started",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PaymentStep::Profile => "Tell us about yourself and your company",
            PaymentStep::Business => "Where your business is located",
            PaymentStep::Summary => "Review your plan and pay",
            PaymentStep::GetStarted => "Set up your receptionist",
        }
    }
}

impl fmt::Display for PaymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn profile_form() -> FormDescriptor {
    FormDescriptor::new(
        "profile",
        vec![
            FieldSpec::new("fullName", "Full name", FieldType::Name),
            FieldSpec::new("email", "Email", FieldType::Email),
            FieldSpec::new("companyName", "Company name", FieldType::Company),
            FieldSpec::new("officeNumber", "Office number", FieldType::Phone),
            FieldSpec::new("industry", "industry", FieldType::Select),
            FieldSpec::new("heardAbout", "referral source", FieldType::Select),
        ],
    )
}

pub fn business_form() -> FormDescriptor {
    FormDescriptor::new(
        "business",
        vec![
            FieldSpec::new("company", "Company", FieldType::Company),
            FieldSpec::new("address1", "Address", FieldType::Address),
            FieldSpec::new("address2", "Address line 2", FieldType::Text),
            FieldSpec::new("country", "country", FieldType::Select),
            FieldSpec::new("state", "State", FieldType::Text),
            FieldSpec::new("city", "City", FieldType::Text),
            FieldSpec::new("zip", "ZIP code", FieldType::ZipCode),
            FieldSpec::new("mobileNumber", "Mobile number", FieldType::Phone),
        ],
    )
}

/// Data handed to the parent once payment has completed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCompletion {
    pub customer_data: CustomerData,
    pub selected_plan: Plan,
    pub session_id: String,
}

#[derive(Debug)]
pub enum StepOutcome {
    Advanced(PaymentStep),
    /// The active form is invalid; a blocking notice was shown.
    Blocked(PaymentStep),
    /// A checkout request is already outstanding.
    Busy,
    /// Navigation handed to the hosted checkout page.
    CheckoutStarted(CheckoutSession),
    /// Development mode skipped payment.
    CheckoutBypassed(Option<PaymentCompletion>),
    CheckoutFailed(OnboardingError),
    /// Get Started finished; the configuration wizard takes over.
    EnterConfigWizard,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeEvent {
    /// No checkout markers in the URL.
    None,
    Canceled,
    Completed(PaymentCompletion),
    /// The session was already reported.
    AlreadyHandled,
    /// Payment succeeded but no customer data or plan could be recovered.
    MissingData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOutcome {
    /// URL with the checkout markers removed.
    pub url: String,
    pub event: ResumeEvent,
}

type StepListener = Box<dyn FnMut(PaymentStep) + Send>;
type CompletionListener = Box<dyn FnMut(&PaymentCompletion) + Send>;

pub struct PaymentWizard {
    step: PaymentStep,
    profile: FormController,
    business: FormController,
    accumulator: CustomerDataAccumulator,
    selected_plan: Option<Plan>,
    tax: TaxCalculator,
    checkout: CheckoutRedirect,
    mode: CheckoutMode,
    notices: Arc<dyn NoticeSink>,
    checkout_in_flight: bool,
    handled_sessions: HashSet<String>,
    completion: Option<PaymentCompletion>,
    step_listener: Option<StepListener>,
    completion_listener: Option<CompletionListener>,
}

impl PaymentWizard {
    pub fn new(collaborators: &Collaborators, urls: CheckoutUrls, mode: CheckoutMode) -> Self {
        Self {
            step: PaymentStep::Profile,
            profile: FormController::empty(profile_form()),
            business: FormController::empty(business_form()),
            accumulator: CustomerDataAccumulator::new(collaborators.store.clone()),
            selected_plan: None,
            tax: TaxCalculator::new(collaborators.backend.clone()),
            checkout: CheckoutRedirect::new(
                collaborators.backend.clone(),
                collaborators.gateway.clone(),
                collaborators.navigator.clone(),
                urls,
            ),
            mode,
            notices: collaborators.notices.clone(),
            checkout_in_flight: false,
            handled_sessions: HashSet::new(),
            completion: None,
            step_listener: None,
            completion_listener: None,
        }
    }

    /// Called with the new step after every step change.
    pub fn on_step_change<F>(&mut self, listener: F)
    where
        F: FnMut(PaymentStep) + Send + 'static,
    {
        self.step_listener = Some(Box::new(listener));
    }

    /// Called once per checkout session when payment completes.
    pub fn on_complete<F>(&mut self, listener: F)
    where
        F: FnMut(&PaymentCompletion) + Send + 'static,
    {
        self.completion_listener = Some(Box::new(listener));
    }

    pub fn step(&self) -> PaymentStep {
        self.step
    }

    pub fn mode(&self) -> CheckoutMode {
        self.mode
    }

    pub fn profile(&self) -> &FormController {
        &self.profile
    }

    pub fn business(&self) -> &FormController {
        &self.business
    }

    pub fn customer_data(&self) -> &CustomerData {
        self.accumulator.data()
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.selected_plan.as_ref()
    }

    pub fn tax(&self) -> &TaxCalculator {
        &self.tax
    }

    pub fn checkout_in_flight(&self) -> bool {
        self.checkout_in_flight
    }

    pub fn completion(&self) -> Option<&PaymentCompletion> {
        self.completion.as_ref()
    }

    pub fn select_plan(&mut self, plan: Option<Plan>) {
        self.selected_plan = plan;
        self.tax
            .refresh(self.accumulator.data(), self.selected_plan.as_ref());
    }

    /// Requests the tax preview again after a failure. Returns whether a
    /// request was made.
    pub fn retry_tax(&mut self) -> bool {
        self.tax
            .retry(self.accumulator.data(), self.selected_plan.as_ref())
    }

    /// Subtotal, tax and total for the selected plan.
    pub fn order_summary(&self) -> Option<OrderSummary> {
        self.selected_plan.as_ref().map(|plan| self.tax.summary(plan))
    }

    pub fn handle_profile_change(&mut self, name: &str, value: &str) {
        self.profile.handle_change(name, value);
        if let Some(update) = profile_update(name, value) {
            self.accumulator.update_profile_data(update);
        }
    }

    pub fn handle_profile_blur(&mut self, name: &str, value: &str) {
        self.profile.handle_blur(name, value);
    }

    pub fn handle_business_change(&mut self, name: &str, value: &str) {
        self.business.handle_change(name, value);
        if name == "country" {
            self.set_business_country(value);
        } else if let Some(update) = business_update(name, value) {
            self.accumulator.update_business_data(update);
        }
        self.tax
            .refresh(self.accumulator.data(), self.selected_plan.as_ref());
    }

    pub fn handle_business_blur(&mut self, name: &str, value: &str) {
        self.business.handle_blur(name, value);
    }

    /// Country drives phone/postal validation and the dialing code.
    fn set_business_country(&mut self, country: &str) {
        let code = country.trim().to_ascii_uppercase();
        self.business.set_country_code(Some(&code));
        self.accumulator.update_business_data(BusinessUpdate {
            country: Some(code.clone()),
            phone_code: rules::dial_code(&code).map(str::to_string),
            ..BusinessUpdate::default()
        });
    }

    pub fn next_step(&mut self) -> StepOutcome {
        match self.step {
            PaymentStep::Profile => self.advance_from_form(PaymentStep::Profile),
            PaymentStep::Business => self.advance_from_form(PaymentStep::Business),
            PaymentStep::Summary => self.start_checkout(),
            PaymentStep::GetStarted => {
                tracing::info!("payment wizard finished, entering configuration");
                StepOutcome::EnterConfigWizard
            }
        }
    }

    pub fn prev_step(&mut self) -> PaymentStep {
        let previous = self.step.index().saturating_sub(1);
        if let Some(step) = PaymentStep::from_index(previous) {
            self.set_step(step);
        }
        self.step
    }

    fn advance_from_form(&mut self, step: PaymentStep) -> StepOutcome {
        let form = match step {
            PaymentStep::Profile => &mut self.profile,
            _ => &mut self.business,
        };
        if !form.validate_form() {
            let invalid: Vec<&str> = form
                .errors()
                .iter()
                .filter(|(_, message)| !message.is_empty())
                .map(|(field, _)| field.as_str())
                .collect();
            tracing::warn!(step = %step, fields = ?invalid, "step validation failed");
            self.notices.show(Notice::blocking(
                "Please fix the highlighted fields before continuing.",
            ));
            return StepOutcome::Blocked(step);
        }

        let values = form.fields().clone();
        self.sync_into_accumulator(step, &values);
        let next = PaymentStep::from_index(step.index() + 1).unwrap_or(step);
        self.set_step(next);
        StepOutcome::Advanced(next)
    }

    fn sync_into_accumulator(&mut self, step: PaymentStep, values: &BTreeMap<String, String>) {
        for (name, value) in values {
            match step {
                PaymentStep::Profile => {
                    if let Some(update) = profile_update(name, value) {
                        self.accumulator.update_profile_data(update);
                    }
                }
                _ if name == "country" => self.set_business_country(value),
                _ => {
                    if let Some(update) = business_update(name, value) {
                        self.accumulator.update_business_data(update);
                    }
                }
            }
        }
        self.tax
            .refresh(self.accumulator.data(), self.selected_plan.as_ref());
    }

    fn start_checkout(&mut self) -> StepOutcome {
        if self.checkout_in_flight {
            tracing::debug!("ignoring duplicate checkout request");
            return StepOutcome::Busy;
        }
        if !(self.profile.is_valid() && self.business.is_valid()) {
            tracing::warn!("checkout requested before profile and business were valid");
            self.notices.show(Notice::blocking(
                "Please complete your profile and business details first.",
            ));
            return StepOutcome::Blocked(PaymentStep::Summary);
        }

        match self.mode {
            CheckoutMode::Bypass => {
                tracing::info!("checkout bypassed in development mode");
                let completion = self.selected_plan.clone().map(|plan| PaymentCompletion {
                    customer_data: self.accumulator.data().clone(),
                    selected_plan: plan,
                    session_id: format!("dev_{}", Uuid::new_v4().simple()),
                });
                self.set_step(PaymentStep::GetStarted);
                if let Some(completion) = &completion {
                    self.complete(completion.clone());
                }
                StepOutcome::CheckoutBypassed(completion)
            }
            CheckoutMode::Hosted => {
                self.checkout_in_flight = true;
                match self
                    .checkout
                    .initiate(self.selected_plan.as_ref(), &mut self.accumulator)
                {
                    Ok(session) => StepOutcome::CheckoutStarted(session),
                    Err(err) => {
                        self.checkout_in_flight = false;
                        tracing::error!(error = %err, "checkout could not start");
                        self.notices.show(Notice::error(err.user_message()));
                        StepOutcome::CheckoutFailed(err)
                    }
                }
            }
        }
    }

    /// Handles a page load carrying checkout return markers. Success forces
    /// the Get Started step and reports completion once per session;
    /// cancellation keeps the current step and shows an informational notice.
    pub fn resume(&mut self, url: &str) -> ResumeOutcome {
        let markers = ReturnMarkers::parse(url);
        if let Some(session_id) = markers.session_id.clone().filter(|_| markers.success) {
            self.checkout_in_flight = false;
            self.set_step(PaymentStep::GetStarted);
            let event = if self.handled_sessions.contains(&session_id) {
                tracing::debug!(session = %session_id, "checkout return already handled");
                ResumeEvent::AlreadyHandled
            } else {
                self.restore_after_return();
                match self.selected_plan.clone() {
                    Some(plan) if !self.accumulator.is_empty() => {
                        let completion = PaymentCompletion {
                            customer_data: self.accumulator.data().clone(),
                            selected_plan: plan,
                            session_id: session_id.clone(),
                        };
                        tracing::info!(session = %session_id, "payment completed");
                        self.notices.show(Notice::success(
                            "Payment successful! Let's set up your receptionist.",
                        ));
                        self.complete(completion.clone());
                        ResumeEvent::Completed(completion)
                    }
                    _ => {
                        tracing::warn!(session = %session_id, "payment returned without wizard data");
                        ResumeEvent::MissingData
                    }
                }
            };
            return ResumeOutcome {
                url: markers.stripped,
                event,
            };
        }

        if markers.canceled {
            self.checkout_in_flight = false;
            self.restore_after_return();
            tracing::info!("checkout canceled by the user");
            self.notices.show(Notice::info(
                "Checkout was canceled. You can review your order and try again.",
            ));
            return ResumeOutcome {
                url: markers.stripped,
                event: ResumeEvent::Canceled,
            };
        }

        ResumeOutcome {
            url: url.to_string(),
            event: ResumeEvent::None,
        }
    }

    /// Reads the persisted copies back in when memory is empty, then pushes
    /// the recovered values into both forms.
    fn restore_after_return(&mut self) {
        let was_empty = self.accumulator.is_empty();
        match self.accumulator.restore_persisted() {
            Ok(stored_plan) => {
                if self.selected_plan.is_none() {
                    self.selected_plan = stored_plan;
                }
            }
            Err(err) => tracing::warn!(error = %err, "could not read persisted wizard state"),
        }
        if was_empty && !self.accumulator.is_empty() {
            self.hydrate_forms();
        }
        self.tax
            .refresh(self.accumulator.data(), self.selected_plan.as_ref());
    }

    fn hydrate_forms(&mut self) {
        let data = self.accumulator.data().clone();
        if !data.country.is_empty() {
            self.business.set_country_code(Some(&data.country));
        }
        for (form, descriptor) in [
            (&mut self.profile, profile_form()),
            (&mut self.business, business_form()),
        ] {
            for field in &descriptor.fields {
                if let Some(value) = customer_field(&data, field.key) {
                    form.set_field_value(field.key, value);
                }
            }
        }
    }

    fn complete(&mut self, completion: PaymentCompletion) {
        if !self.handled_sessions.insert(completion.session_id.clone()) {
            return;
        }
        if let Some(listener) = self.completion_listener.as_mut() {
            listener(&completion);
        }
        self.completion = Some(completion);
    }

    fn set_step(&mut self, step: PaymentStep) {
        if step == self.step {
            return;
        }
        tracing::info!(from = %self.step, to = %step, "payment wizard step changed");
        self.step = step;
        if let Some(listener) = self.step_listener.as_mut() {
            listener(step);
        }
    }
}

struct ReturnMarkers {
    success: bool,
    canceled: bool,
    session_id: Option<String>,
    stripped: String,
}

impl ReturnMarkers {
    const KEYS: [&'static str; 3] = ["success", "session_id", "canceled"];

    fn parse(url: &str) -> Self {
        let (without_fragment, fragment) = match url.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (url, None),
        };
        let (base, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut markers = Self {
            success: false,
            canceled: false,
            session_id: None,
            stripped: String::new(),
        };
        let mut kept = form_urlencoded::Serializer::new(String::new());
        let mut kept_any = false;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "success" => markers.success = value == "true",
                "canceled" => markers.canceled = value == "true",
                "session_id" if !value.is_empty() => markers.session_id = Some(value.to_string()),
                _ => {}
            }
            if !Self::KEYS.iter().any(|marker| *marker == key) {
                kept.append_pair(&key, &value);
                kept_any = true;
            }
        }

        let mut stripped = base.to_string();
        if kept_any {
            stripped.push('?');
            stripped.push_str(&kept.finish());
        }
        if let Some(fragment) = fragment {
            stripped.push('#');
            stripped.push_str(fragment);
        }
        markers.stripped = stripped;
        markers
    }
}

fn profile_update(name: &str, value: &str) -> Option<ProfileUpdate> {
    let value = Some(value.to_string());
    let mut update = ProfileUpdate::default();
    match name {
        "fullName" => update.full_name = value,
        "lastName" => update.last_name = value,
        "companyName" => update.company_name = value,
        "officeNumber" => update.office_number = value,
        "email" => update.email = value,
        "industry" => update.industry = value,
        "heardAbout" => update.heard_about = value,
        _ => return None,
    }
    Some(update)
}

fn business_update(name: &str, value: &str) -> Option<BusinessUpdate> {
    let value = Some(value.to_string());
    let mut update = BusinessUpdate::default();
    match name {
        "company" => update.company = value,
        "address1" => update.address1 = value,
        "address2" => update.address2 = value,
        "city" => update.city = value,
        "state" => update.state = value,
        "zip" => update.zip = value,
        "country" => update.country = value,
        "mobileNumber" => update.mobile_number = value,
        _ => return None,
    }
    Some(update)
}

fn customer_field<'a>(data: &'a CustomerData, name: &str) -> Option<&'a str> {
    let value = match name {
        "fullName" => &data.full_name,
        "lastName" => &data.last_name,
        "companyName" => &data.company_name,
        "officeNumber" => &data.office_number,
        "email" => &data.email,
        "industry" => &data.industry,
        "heardAbout" => &data.heard_about,
        "company" => &data.company,
        "address1" => &data.address1,
        "address2" => &data.address2,
        "city" => &data.city,
        "state" => &data.state,
        "zip" => &data.zip,
        "country" => &data.country,
        "mobileNumber" => &data.mobile_number,
        _ => return None,
    };
    Some(value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_read_and_stripped() {
        let markers =
            ReturnMarkers::parse("https://x.test/signup?plan=pro&success=true&session_id=cs_1#top");
        assert!(markers.success);
        assert_eq!(markers.session_id.as_deref(), Some("cs_1"));
        assert_eq!(markers.stripped, "https://x.test/signup?plan=pro#top");
    }

    #[test]
    fn cancel_marker_is_stripped() {
        let markers = ReturnMarkers::parse("/signup?canceled=true");
        assert!(markers.canceled);
        assert!(!markers.success);
        assert_eq!(markers.stripped, "/signup");
    }

    #[test]
    fn url_without_markers_is_unchanged() {
        let markers = ReturnMarkers::parse("/signup?plan=pro");
        assert!(!markers.success && !markers.canceled);
        assert_eq!(markers.stripped, "/signup?plan=pro");
    }

    #[test]
    fn step_indices_are_ordered() {
        assert_eq!(PaymentStep::Summary.index(), 2);
        assert_eq!(PaymentStep::from_index(3), Some(PaymentStep::GetStarted));
        assert_eq!(PaymentStep::from_index(4), None);
        for step in PaymentStep::ALL {
            assert!(!step.description().is_empty(), "{:?}", step);
        }
        assert_eq!(PaymentStep::Summary.description(), "Review your plan and pay");
        assert_eq!(
            crate::wizard::ConfigStep::Confirm.description(),
            "Pick a time for your setup call"
        );
    }

    #[test]
    fn field_mapping_covers_both_forms() {
        let data = CustomerData {
            full_name: "Dana Reyes".into(),
            zip: "73301".into(),
            ..CustomerData::default()
        };
        for field in profile_form().fields.iter().chain(business_form().fields.iter()) {
            assert!(customer_field(&data, field.key).is_some(), "{}", field.key);
        }
        assert!(profile_update("unknown", "x").is_none());
        assert_eq!(
            business_update("zip", "73301").and_then(|u| u.zip).as_deref(),
            Some("73301")
        );
    }
}
