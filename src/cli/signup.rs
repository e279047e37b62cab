//! Interactive sign-up: payment wizard, configuration wizard, submission.

use std::sync::Mutex;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::backend::{Location, LocationDirectory, Navigator};
use crate::cli::output;
use crate::cli::CliError;
use crate::config::AppConfig;
use crate::domain::{ReportFrequency, SubscriptionConfirmation, UsageOption};
use crate::forms::FormController;
use crate::validation::FieldType;
use crate::wizard::config::{setup_form, SETUP_DAYS};
use crate::wizard::payment::{business_form, profile_form};
use crate::wizard::{
    CheckoutUrls, Collaborators, ConfigOutcome, ConfigStep, ConfigWizard, PaymentCompletion,
    PaymentStep, PaymentWizard, ResumeEvent, StepOutcome, SubmissionOrchestrator, SubmitOutcome,
};

pub const INDUSTRIES: [&str; 8] = [
    "Healthcare",
    "Legal",
    "Real Estate",
    "Home Services",
    "Financial Services",
    "Retail",
    "Technology",
    "Other",
];

pub const REFERRAL_SOURCES: [&str; 5] = [
    "Search engine",
    "Social media",
    "Friend or colleague",
    "Advertisement",
    "Other",
];

pub const TIMEZONES: [&str; 8] = [
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Phoenix",
    "America/Los_Angeles",
    "America/Anchorage",
    "Pacific/Honolulu",
    "Europe/London",
];

/// Prompting surface for the sign-up flow.
pub trait SignupInteraction {
    fn text(&mut self, prompt: &str, initial: &str) -> Result<String, CliError>;
    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize, CliError>;
    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError>;
}

pub struct DialoguerInteraction {
    theme: ColorfulTheme,
}

impl DialoguerInteraction {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl SignupInteraction for DialoguerInteraction {
    fn text(&mut self, prompt: &str, initial: &str) -> Result<String, CliError> {
        let value = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()?;
        Ok(value)
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize, CliError> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()?;
        Ok(index)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(true)
            .interact()?;
        Ok(answer)
    }
}

/// Prints navigation targets instead of opening a browser.
#[derive(Default)]
pub struct TerminalNavigator {
    last: Mutex<Option<String>>,
}

impl TerminalNavigator {
    pub fn last_url(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, url: &str) {
        output::info(format!("Continue at: {}", url));
        if let Ok(mut last) = self.last.lock() {
            *last = Some(url.to_string());
        }
    }
}

#[derive(Debug)]
pub enum SignupResult {
    /// Payment continues on the hosted checkout page.
    AwaitingPayment { checkout_url: String },
    Completed(SubscriptionConfirmation),
    Abandoned,
}

pub fn run_signup(
    collaborators: &Collaborators,
    config: &AppConfig,
    interaction: &mut dyn SignupInteraction,
    resume_url: Option<&str>,
) -> Result<SignupResult, CliError> {
    let mut wizard = PaymentWizard::new(
        collaborators,
        CheckoutUrls::for_site(&config.site_url),
        config.checkout_mode,
    );
    let mut payment: Option<PaymentCompletion> = None;

    if let Some(url) = resume_url {
        let outcome = wizard.resume(url);
        tracing::debug!(url = %outcome.url, "checkout markers consumed");
        match outcome.event {
            ResumeEvent::Completed(completion) => payment = Some(completion),
            ResumeEvent::MissingData => {
                output::error("We could not recover your sign-up details. Please start again.");
                return Ok(SignupResult::Abandoned);
            }
            ResumeEvent::Canceled | ResumeEvent::AlreadyHandled | ResumeEvent::None => {}
        }
    }

    if wizard.step() != PaymentStep::GetStarted {
        if wizard.selected_plan().is_none() {
            let plans = collaborators.backend.list_plans()?;
            if plans.is_empty() {
                output::error("No plans are available right now.");
                return Ok(SignupResult::Abandoned);
            }
            let labels: Vec<String> = plans
                .iter()
                .map(|plan| format!("{} ({:.2} {}/{})", plan.name, plan.price, plan.currency, plan.interval))
                .collect();
            let index = interaction.choose("Choose a plan", &labels)?;
            wizard.select_plan(plans.into_iter().nth(index));
        }

        let mut locations = LocationDirectory::new();
        while wizard.step() != PaymentStep::GetStarted {
            output::section(wizard.step(), wizard.step().description());
            match wizard.step() {
                PaymentStep::Profile => collect_profile(&mut wizard, interaction)?,
                PaymentStep::Business => {
                    collect_business(&mut wizard, collaborators, &mut locations, interaction)?
                }
                PaymentStep::Summary => {
                    if wizard.tax().has_failed() {
                        wizard.retry_tax();
                    }
                    show_summary(&wizard);
                    if !interaction.confirm("Proceed to payment?")? {
                        wizard.prev_step();
                        continue;
                    }
                }
                PaymentStep::GetStarted => {}
            }

            match wizard.next_step() {
                StepOutcome::Advanced(_) | StepOutcome::Busy => {}
                StepOutcome::Blocked(_) => {
                    let form = match wizard.step() {
                        PaymentStep::Profile => wizard.profile(),
                        _ => wizard.business(),
                    };
                    report_form_errors(form);
                }
                StepOutcome::CheckoutStarted(session) => {
                    output::info("Complete payment in your browser, then run `onboarding_cli signup --resume-url <return url>`.");
                    return Ok(SignupResult::AwaitingPayment {
                        checkout_url: session.url,
                    });
                }
                StepOutcome::CheckoutBypassed(completion) => payment = completion,
                StepOutcome::CheckoutFailed(_) => {
                    if !interaction.confirm("Try checkout again?")? {
                        return Ok(SignupResult::Abandoned);
                    }
                }
                StepOutcome::EnterConfigWizard => {}
            }
        }
    }

    output::section(PaymentStep::GetStarted, PaymentStep::GetStarted.description());
    output::info("Payment received. Let's configure how your receptionist answers calls.");
    if !matches!(wizard.next_step(), StepOutcome::EnterConfigWizard) {
        return Ok(SignupResult::Abandoned);
    }

    let Some(payment) = payment.or_else(|| wizard.completion().cloned()) else {
        output::error("Payment details are missing; please restart sign-up.");
        return Ok(SignupResult::Abandoned);
    };

    let config_data = run_config_wizard(interaction)?;
    let mut submission = SubmissionOrchestrator::new(collaborators, config.home_route.clone());
    submission.config_completed(config_data);
    let mut outcome = submission.payment_completed(payment);
    loop {
        match outcome {
            SubmitOutcome::Submitted(confirmation) => {
                return Ok(SignupResult::Completed(confirmation));
            }
            SubmitOutcome::Failed(_) | SubmitOutcome::AwaitingRetry => {
                if !interaction.confirm("Retry activating your subscription?")? {
                    return Ok(SignupResult::Abandoned);
                }
                outcome = submission.retry();
            }
            SubmitOutcome::Waiting | SubmitOutcome::AlreadySubmitted => {
                return Ok(SignupResult::Abandoned);
            }
        }
    }
}

fn to_options(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn collect_profile(
    wizard: &mut PaymentWizard,
    interaction: &mut dyn SignupInteraction,
) -> Result<(), CliError> {
    for field in profile_form().fields {
        let value = match field.key {
            "industry" => {
                let index = interaction.choose("Industry", &to_options(&INDUSTRIES))?;
                INDUSTRIES.get(index).copied().unwrap_or_default().to_string()
            }
            "heardAbout" => {
                let index =
                    interaction.choose("How did you hear about us?", &to_options(&REFERRAL_SOURCES))?;
                REFERRAL_SOURCES.get(index).copied().unwrap_or_default().to_string()
            }
            key => {
                let current = wizard.profile().value(key).to_string();
                interaction.text(field.label, &current)?
            }
        };
        wizard.handle_profile_change(field.key, value.trim());
    }
    Ok(())
}

fn choose_location(
    interaction: &mut dyn SignupInteraction,
    prompt: &str,
    items: &[Location],
) -> Result<Location, CliError> {
    let labels: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
    let index = interaction.choose(prompt, &labels)?;
    items
        .get(index)
        .cloned()
        .ok_or_else(|| CliError::Usage(format!("no option {} for {}", index, prompt)))
}

fn collect_business(
    wizard: &mut PaymentWizard,
    collaborators: &Collaborators,
    locations: &mut LocationDirectory,
    interaction: &mut dyn SignupInteraction,
) -> Result<(), CliError> {
    let backend = collaborators.backend.as_ref();

    let countries = match locations.load_countries(backend) {
        Ok(countries) => countries.to_vec(),
        Err(err) => {
            tracing::warn!(error = %err, "country list unavailable");
            Vec::new()
        }
    };
    let country = if countries.is_empty() {
        let current = wizard.business().value("country").to_string();
        let code = interaction.text("Country code (e.g. US)", &current)?;
        Location::new(code.trim(), code.trim(), Some(code.trim()))
    } else {
        choose_location(interaction, "Country", &countries)?
    };
    let country_code = country.code.clone().unwrap_or_else(|| country.id.clone());
    wizard.handle_business_change("country", &country_code);

    let states = locations
        .select_country(backend, &country.id)
        .map(<[Location]>::to_vec)
        .unwrap_or_default();
    let mut state_id = None;
    let state = if states.is_empty() {
        let current = wizard.business().value("state").to_string();
        interaction.text("State / region (optional)", &current)?
    } else {
        let state = choose_location(interaction, "State", &states)?;
        state_id = Some(state.id.clone());
        state.code.unwrap_or(state.name)
    };
    wizard.handle_business_change("state", state.trim());

    let cities = match state_id {
        Some(id) => locations
            .select_state(backend, &id)
            .map(<[Location]>::to_vec)
            .unwrap_or_default(),
        None => Vec::new(),
    };
    let city = if cities.is_empty() {
        let current = wizard.business().value("city").to_string();
        interaction.text("City", &current)?
    } else {
        choose_location(interaction, "City", &cities)?.name
    };
    wizard.handle_business_change("city", city.trim());

    for field in business_form().fields {
        if matches!(field.key, "country" | "state" | "city") {
            continue;
        }
        let current = wizard.business().value(field.key).to_string();
        let label = if field.field_type == FieldType::Text {
            format!("{} (optional)", field.label)
        } else {
            field.label.to_string()
        };
        let value = interaction.text(&label, &current)?;
        wizard.handle_business_change(field.key, value.trim());
    }
    Ok(())
}

fn show_summary(wizard: &PaymentWizard) {
    let Some(summary) = wizard.order_summary() else {
        output::warning("No plan selected.");
        return;
    };
    output::info(format!("Plan:      {}", summary.plan_name));
    output::info(format!("Subtotal:  {:.2} {}", summary.subtotal, summary.currency));
    match summary.tax_rate {
        Some(rate) => output::info(format!(
            "Tax:       {:.2} {} ({:.2}%)",
            summary.tax,
            summary.currency,
            rate * 100.0
        )),
        None => output::info(format!("Tax:       {:.2} {}", summary.tax, summary.currency)),
    }
    output::info(format!("Total:     {:.2} {}", summary.total, summary.currency));
}

fn report_form_errors(form: &FormController) {
    for field in &form.descriptor().fields {
        if let Some(message) = form.field_error(field.key) {
            output::warning(message);
        }
    }
}

pub fn run_config_wizard(
    interaction: &mut dyn SignupInteraction,
) -> Result<crate::domain::ConfigWizardData, CliError> {
    let mut wizard = ConfigWizard::new();
    loop {
        output::section(wizard.step(), wizard.step().description());
        match wizard.step() {
            ConfigStep::Setup => {
                for field in setup_form().fields {
                    let current = wizard.setup().value(field.key).to_string();
                    let value = interaction.text(field.label, &current)?;
                    wizard.set_setup_field(field.key, value.trim());
                }
            }
            ConfigStep::Options => {
                let index = interaction.choose("Timezone", &to_options(&TIMEZONES))?;
                wizard.set_timezone(TIMEZONES.get(index).copied().unwrap_or_default());
                let current = wizard.options().value("reportEmail").to_string();
                let email = interaction.text("Report email", &current)?;
                wizard.set_report_email(email.trim());
                for option in UsageOption::ALL {
                    let enabled = interaction.confirm(&format!("Answer calls during: {}?", option.label()))?;
                    wizard.set_usage(option, enabled);
                }
                let frequencies = [
                    ReportFrequency::Daily,
                    ReportFrequency::Weekly,
                    ReportFrequency::Monthly,
                ];
                let labels: Vec<String> = frequencies.iter().map(ToString::to_string).collect();
                let index = interaction.choose("Call report frequency", &labels)?;
                wizard.set_report_frequency(frequencies.get(index).copied().unwrap_or_default());
            }
            ConfigStep::Confirm => {
                let index = interaction.choose("Setup call day", &to_options(&SETUP_DAYS))?;
                wizard.select_day(SETUP_DAYS.get(index).copied().unwrap_or_default())?;
                let open: Vec<String> = wizard
                    .available_slots()
                    .into_iter()
                    .filter(|slot| slot.available)
                    .map(|slot| slot.time.to_string())
                    .collect();
                if open.is_empty() {
                    output::warning("No setup slots are open that day. Please pick another day.");
                    continue;
                }
                let index = interaction.choose("Setup call time", &open)?;
                if let Some(time) = open.get(index) {
                    if let Err(err) = wizard.select_time(time) {
                        output::warning(err.user_message());
                    }
                }
            }
            ConfigStep::Finalize => {
                let data = wizard.data();
                output::info(format!("Greeting: {}", data.greeting_script));
                output::info(format!("Timezone: {}", data.timezone));
                output::info(format!(
                    "Setup call: {} at {}",
                    data.setup_day, data.setup_time
                ));
                if !interaction.confirm("Activate my receptionist?")? {
                    wizard.prev_step();
                    continue;
                }
            }
        }

        match wizard.next_step() {
            ConfigOutcome::Advanced(_) => {}
            ConfigOutcome::Completed(data) => return Ok(data),
            ConfigOutcome::Blocked(step) => {
                let form = match step {
                    ConfigStep::Setup => wizard.setup(),
                    ConfigStep::Options => wizard.options(),
                    _ => wizard.confirm(),
                };
                report_form_errors(form);
                if step == ConfigStep::Options && wizard.usage().is_empty() {
                    output::warning("Select at least one time for your receptionist to answer calls.");
                }
            }
        }
    }
}
