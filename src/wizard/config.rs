//! Post-payment configuration wizard: Setup → Options → Confirm → Finalize.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{ConfigWizardData, ReportFrequency, UsageOption};
use crate::errors::{OnboardingError, Result};
use crate::forms::{FieldSpec, FormController, FormDescriptor};
use crate::validation::FieldType;

pub const DEFAULT_REPORT_TIME: &str = "08:00";

pub const SETUP_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const WEEKDAY_SLOTS: [&str; 7] = ["09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00"];
const SATURDAY_SLOTS: [&str; 2] = ["10:00", "11:00"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigStep {
    Setup,
    Options,
    Confirm,
    /// Review screen shown after Confirm; its action completes the wizard.
    Finalize,
}

impl ConfigStep {
    pub fn label(self) -> &'static str {
        match self {
            ConfigStep::Setup => "Receptionist Setup",
            ConfigStep::Options => "Options",
            ConfigStep::Confirm => "Schedule Setup Call",
            ConfigStep::Finalize => "Finalize",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ConfigStep::Setup => "What your receptionist says on every call",
            ConfigStep::Options => "When to answer and how to report calls",
            ConfigStep::Confirm => "Pick a time for your setup call",
            ConfigStep::Finalize => "Review and activate your receptionist",
        }
    }

    fn next(self) -> Self {
        match self {
            ConfigStep::Setup => ConfigStep::Options,
            ConfigStep::Options => ConfigStep::Confirm,
            ConfigStep::Confirm | ConfigStep::Finalize => ConfigStep::Finalize,
        }
    }

    fn prev(self) -> Self {
        match self {
            ConfigStep::Setup | ConfigStep::Options => ConfigStep::Setup,
            ConfigStep::Confirm => ConfigStep::Options,
            ConfigStep::Finalize => ConfigStep::Confirm,
        }
    }
}

impl fmt::Display for ConfigStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: &'static str,
    pub available: bool,
}

/// Setup-call slots for `day`. Some are pre-booked; Sunday has none.
pub fn time_slots(day: &str) -> Vec<TimeSlot> {
    let (slots, booked): (&[&'static str], &[&str]) = match canonical_day(day) {
        Some("Monday") => (&WEEKDAY_SLOTS[..], &["09:00", "13:00"][..]),
        Some("Tuesday") => (&WEEKDAY_SLOTS[..], &["11:00"][..]),
        Some("Wednesday") => (&WEEKDAY_SLOTS[..], &["10:00", "15:00"][..]),
        Some("Thursday") => (&WEEKDAY_SLOTS[..], &["14:00"][..]),
        Some("Friday") => (&WEEKDAY_SLOTS[..], &["15:00", "16:00"][..]),
        Some("Saturday") => (&SATURDAY_SLOTS[..], &["11:00"][..]),
        _ => (&[][..], &[][..]),
    };
    slots
        .iter()
        .map(|&time| TimeSlot {
            time,
            available: !booked.contains(&time),
        })
        .collect()
}

fn canonical_day(day: &str) -> Option<&'static str> {
    let day = day.trim();
    SETUP_DAYS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(day))
}

pub fn setup_form() -> FormDescriptor {
    FormDescriptor::new(
        "setup",
        vec![
            FieldSpec::new("greetingScript", "Greeting script", FieldType::Required),
            FieldSpec::new("goodbyeScript", "Goodbye script", FieldType::Required),
            FieldSpec::new(
                "businessDescription",
                "Business description",
                FieldType::Required,
            ),
            FieldSpec::new("specialInstructions", "Special instructions", FieldType::Text),
        ],
    )
}

pub fn options_form() -> FormDescriptor {
    FormDescriptor::new(
        "options",
        vec![
            FieldSpec::new("timezone", "timezone", FieldType::Select),
            FieldSpec::new("reportEmail", "Report email", FieldType::Email),
        ],
    )
}

pub fn confirm_form() -> FormDescriptor {
    FormDescriptor::new(
        "confirm",
        vec![
            FieldSpec::new("day", "day", FieldType::Select),
            FieldSpec::new("time", "time slot", FieldType::Select),
        ],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    Advanced(ConfigStep),
    Blocked(ConfigStep),
    Completed(ConfigWizardData),
}

pub struct ConfigWizard {
    step: ConfigStep,
    setup: FormController,
    options: FormController,
    confirm: FormController,
    usage: BTreeSet<UsageOption>,
    report_frequency: ReportFrequency,
    report_time: String,
}

impl Default for ConfigWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigWizard {
    pub fn new() -> Self {
        Self {
            step: ConfigStep::Setup,
            setup: FormController::empty(setup_form()),
            options: FormController::empty(options_form()),
            confirm: FormController::empty(confirm_form()),
            usage: BTreeSet::new(),
            report_frequency: ReportFrequency::default(),
            report_time: DEFAULT_REPORT_TIME.to_string(),
        }
    }

    pub fn step(&self) -> ConfigStep {
        self.step
    }

    pub fn setup(&self) -> &FormController {
        &self.setup
    }

    pub fn options(&self) -> &FormController {
        &self.options
    }

    pub fn confirm(&self) -> &FormController {
        &self.confirm
    }

    pub fn usage(&self) -> &BTreeSet<UsageOption> {
        &self.usage
    }

    pub fn set_setup_field(&mut self, name: &str, value: &str) {
        self.setup.handle_change(name, value);
    }

    pub fn set_timezone(&mut self, timezone: &str) {
        self.options.handle_change("timezone", timezone);
    }

    pub fn set_report_email(&mut self, email: &str) {
        self.options.handle_change("reportEmail", email);
    }

    pub fn set_usage(&mut self, option: UsageOption, enabled: bool) {
        if enabled {
            self.usage.insert(option);
        } else {
            self.usage.remove(&option);
        }
    }

    pub fn set_report_frequency(&mut self, frequency: ReportFrequency) {
        self.report_frequency = frequency;
    }

    pub fn set_report_time(&mut self, time: &str) {
        self.report_time = time.trim().to_string();
    }

    /// Picks the setup-call day. Any previously chosen time is cleared.
    pub fn select_day(&mut self, day: &str) -> Result<()> {
        let day = canonical_day(day)
            .ok_or_else(|| OnboardingError::Validation(format!("Unknown day `{}`", day.trim())))?;
        self.confirm.handle_change("day", day);
        self.confirm.set_field_value("time", "");
        Ok(())
    }

    /// Picks a time slot on the selected day. Booked or unknown slots are
    /// rejected and leave the current choice unchanged.
    pub fn select_time(&mut self, time: &str) -> Result<()> {
        let day = self.confirm.value("day").to_string();
        if day.is_empty() {
            return Err(OnboardingError::Validation("Please select a day first".into()));
        }
        let time = time.trim();
        match time_slots(&day).into_iter().find(|slot| slot.time == time) {
            Some(slot) if slot.available => {
                self.confirm.handle_change("time", time);
                Ok(())
            }
            Some(_) => Err(OnboardingError::Validation(format!(
                "{} on {} is no longer available",
                time, day
            ))),
            None => Err(OnboardingError::Validation(format!(
                "{} is not a bookable time on {}",
                time, day
            ))),
        }
    }

    pub fn available_slots(&self) -> Vec<TimeSlot> {
        time_slots(self.confirm.value("day"))
    }

    /// Validity of the active step; Options also needs one usage option.
    pub fn is_current_step_valid(&self) -> bool {
        match self.step {
            ConfigStep::Setup => self.setup.is_valid(),
            ConfigStep::Options => self.options.is_valid() && !self.usage.is_empty(),
            ConfigStep::Confirm => self.confirm.is_valid(),
            ConfigStep::Finalize => {
                self.setup.is_valid()
                    && self.options.is_valid()
                    && !self.usage.is_empty()
                    && self.confirm.is_valid()
            }
        }
    }

    pub fn next_step(&mut self) -> ConfigOutcome {
        let valid = match self.step {
            ConfigStep::Setup => self.setup.validate_form(),
            ConfigStep::Options => {
                let fields_valid = self.options.validate_form();
                fields_valid && !self.usage.is_empty()
            }
            ConfigStep::Confirm => self.confirm.validate_form(),
            ConfigStep::Finalize => return self.finalize(),
        };
        if !valid {
            tracing::warn!(step = %self.step, "configuration step incomplete");
            return ConfigOutcome::Blocked(self.step);
        }
        self.step = self.step.next();
        tracing::info!(step = %self.step, "configuration wizard advanced");
        ConfigOutcome::Advanced(self.step)
    }

    pub fn prev_step(&mut self) -> ConfigStep {
        self.step = self.step.prev();
        self.step
    }

    fn finalize(&mut self) -> ConfigOutcome {
        if !self.is_current_step_valid() {
            return ConfigOutcome::Blocked(ConfigStep::Finalize);
        }
        tracing::info!("configuration wizard completed");
        ConfigOutcome::Completed(self.data())
    }

    /// Snapshot of everything collected so far.
    pub fn data(&self) -> ConfigWizardData {
        ConfigWizardData {
            greeting_script: self.setup.value("greetingScript").to_string(),
            goodbye_script: self.setup.value("goodbyeScript").to_string(),
            business_description: self.setup.value("businessDescription").to_string(),
            special_instructions: self.setup.value("specialInstructions").to_string(),
            timezone: self.options.value("timezone").to_string(),
            report_email: self.options.value("reportEmail").to_string(),
            report_frequency: self.report_frequency,
            report_time: self.report_time.clone(),
            usage: self.usage.clone(),
            setup_day: self.confirm.value("day").to_string(),
            setup_time: self.confirm.value("time").to_string(),
        }
    }
}
