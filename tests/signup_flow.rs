mod common;

use std::collections::HashMap;

use common::Harness;
use receptionist_onboarding::cli::signup::{run_signup, SignupInteraction, SignupResult};
use receptionist_onboarding::cli::CliError;
use receptionist_onboarding::config::{AppConfig, CheckoutMode};

/// Answers prompts from a table; unlisted choices pick the first option and
/// every confirmation is accepted.
struct ScriptedInteraction {
    answers: HashMap<&'static str, &'static str>,
    choices: HashMap<&'static str, usize>,
    prompts: Vec<String>,
}

impl ScriptedInteraction {
    fn new() -> Self {
        let answers = HashMap::from([
            ("Full name", "Dana Reyes"),
            ("Email", "dana@reyesdental.com"),
            ("Company name", "Reyes Dental"),
            ("Office number", "512 555 0142"),
            ("Company", "Reyes Dental LLC"),
            ("Address", "1200 Congress Ave"),
            ("ZIP code", "73301"),
            ("Mobile number", "512 555 0199"),
            ("Greeting script", "Thanks for calling Reyes Dental!"),
            ("Goodbye script", "Goodbye!"),
            ("Business description", "Family dentistry"),
            ("Report email", "reports@reyesdental.com"),
        ]);
        Self {
            answers,
            choices: HashMap::from([("Choose a plan", 1)]),
            prompts: Vec::new(),
        }
    }

    fn record(&mut self, prompt: &str) {
        self.prompts.push(prompt.to_string());
        assert!(self.prompts.len() < 200, "sign-up flow did not terminate");
    }
}

impl SignupInteraction for ScriptedInteraction {
    fn text(&mut self, prompt: &str, _initial: &str) -> Result<String, CliError> {
        self.record(prompt);
        Ok(self.answers.get(prompt).copied().unwrap_or_default().to_string())
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize, CliError> {
        self.record(prompt);
        assert!(!options.is_empty(), "no options for {}", prompt);
        Ok(self.choices.get(prompt).copied().unwrap_or(0))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError> {
        self.record(prompt);
        Ok(true)
    }
}

#[test]
fn bypass_signup_runs_both_wizards_and_submits() {
    let harness = Harness::new();
    let config = AppConfig {
        checkout_mode: CheckoutMode::Bypass,
        ..AppConfig::default()
    };
    let mut interaction = ScriptedInteraction::new();

    let result = run_signup(&harness.collaborators(), &config, &mut interaction, None).unwrap();

    assert!(matches!(result, SignupResult::Completed(_)));
    assert_eq!(harness.gateway.calls(), 0);
    let payloads = harness.backend.subscriptions.lock().unwrap().clone();
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert!(payload.session_id.starts_with("dev_"));
    assert_eq!(payload.user_data.country, "US");
    assert_eq!(payload.user_data.state, "TX");
    assert_eq!(payload.user_data.city, "Austin");
    assert_eq!(payload.service_configuration.setup_call_day, "Monday");
    assert_eq!(payload.service_configuration.setup_call_time, "10:00");
    assert!(payload.service_configuration.after_hours);
    assert!(interaction.prompts.iter().any(|prompt| prompt == "State"));
}

#[test]
fn hosted_signup_stops_at_checkout() {
    let harness = Harness::new();
    let config = AppConfig {
        checkout_mode: CheckoutMode::Hosted,
        site_url: common::SITE.into(),
        ..AppConfig::default()
    };
    let mut interaction = ScriptedInteraction::new();

    let result = run_signup(&harness.collaborators(), &config, &mut interaction, None).unwrap();

    let SignupResult::AwaitingPayment { checkout_url } = result else {
        panic!("expected hosted checkout, got {:?}", result);
    };
    assert_eq!(checkout_url, "https://checkout.example.com/pay/cs_test_123");
    assert!(harness.store.contains("customer_data"));
    assert_eq!(harness.backend.subscription_calls(), 0);
}
