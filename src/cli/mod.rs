pub mod output;
pub mod signup;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::{
    CallReportSource, ClientCredentialsAuth, HttpBackend, HttpTokenSource,
};
use crate::config::{app_home, AppConfig, CheckoutMode, ConfigManager};
use crate::dashboard::{render_call_report, CallRecord};
use crate::errors::OnboardingError;
use crate::storage::JsonFileStore;
use crate::utils::build_info;
use crate::validation::{validate, FieldType, ValidationContext};
use crate::wizard::Collaborators;

use self::output::TerminalNotices;
use self::signup::{run_signup, DialoguerInteraction, SignupResult, TerminalNavigator};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Onboarding(#[from] OnboardingError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

const USAGE: &str = "\
Usage: onboarding_cli <command> [options]

Commands:
  validate <type> <value> [--country CC] [--field NAME]
                         Check a single field value
  signup [--resume-url URL] [--dev]
                         Walk through sign-up, payment and receptionist setup
  calls [--file PATH]    Show the call report
  version                Print build information
  help                   Show this message";

/// Runs one command and returns the process exit code.
pub fn run_cli<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(2);
    };
    tracing::debug!(command = %command, "dispatching command");

    match command.as_str() {
        "validate" => run_validate(rest),
        "signup" => run_signup_command(rest),
        "calls" => run_calls(rest),
        "version" | "--version" | "-V" => {
            for line in build_info::current().describe() {
                println!("{}", line);
            }
            Ok(0)
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(0)
        }
        other => Err(CliError::Usage(format!(
            "unknown command `{}`\n\n{}",
            other, USAGE
        ))),
    }
}

/// Splits `--flag value` pairs from positional arguments.
#[derive(Debug, Default)]
struct ParsedArgs {
    positional: Vec<String>,
    options: Vec<(String, Option<String>)>,
}

impl ParsedArgs {
    fn parse(args: &[String], flags_with_values: &[&str]) -> Result<Self, CliError> {
        let mut parsed = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                if let Some((name, value)) = name.split_once('=') {
                    parsed.options.push((name.to_string(), Some(value.to_string())));
                } else if flags_with_values.contains(&name) {
                    let value = iter
                        .next()
                        .ok_or_else(|| CliError::Usage(format!("--{} needs a value", name)))?;
                    parsed.options.push((name.to_string(), Some(value.clone())));
                } else {
                    parsed.options.push((name.to_string(), None));
                }
            } else {
                parsed.positional.push(arg.clone());
            }
        }
        Ok(parsed)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    fn flag(&self, name: &str) -> bool {
        self.options.iter().any(|(key, _)| key == name)
    }
}

fn run_validate(args: &[String]) -> Result<i32, CliError> {
    let parsed = ParsedArgs::parse(args, &["country", "field"])?;
    let [field_type, rest @ ..] = parsed.positional.as_slice() else {
        return Err(CliError::Usage(
            "validate needs a field type and a value".into(),
        ));
    };
    let field_type: FieldType = field_type.parse().map_err(CliError::Usage)?;
    let value = rest.join(" ");

    let context = match parsed.value("field") {
        Some(name) => ValidationContext::named(name),
        None => ValidationContext::default(),
    }
    .with_country(parsed.value("country"));

    let result = validate(&value, field_type, &context);
    println!("{}", output::describe_validation(&result));
    Ok(if result.is_valid { 0 } else { 1 })
}

fn load_config() -> Result<(PathBuf, AppConfig), CliError> {
    let home = app_home();
    let manager = ConfigManager::with_base_dir(home.clone())?;
    let mut config = manager.load()?;
    config.apply_env_overrides();
    Ok((home, config))
}

fn http_backend(config: &AppConfig) -> Result<HttpBackend, CliError> {
    let backend = HttpBackend::new(config)?;
    if config.client_id.is_some() && config.client_secret.is_some() {
        let source = HttpTokenSource::new(config)?;
        let auth = ClientCredentialsAuth::new(
            source,
            std::time::Duration::from_secs(config.token_refresh_margin_secs),
        );
        return Ok(backend.with_auth(Arc::new(auth)));
    }
    Ok(backend)
}

fn run_signup_command(args: &[String]) -> Result<i32, CliError> {
    let parsed = ParsedArgs::parse(args, &["resume-url"])?;
    let (home, mut config) = load_config()?;
    if parsed.flag("dev") {
        config.checkout_mode = CheckoutMode::Bypass;
    }

    let backend = Arc::new(http_backend(&config)?);
    let store = JsonFileStore::new(config.state_dir(&home))?;
    let collaborators = Collaborators {
        backend: backend.clone(),
        gateway: backend,
        navigator: Arc::new(TerminalNavigator::default()),
        notices: Arc::new(TerminalNotices),
        store: Arc::new(store),
    };

    let mut interaction = DialoguerInteraction::new();
    let result = run_signup(
        &collaborators,
        &config,
        &mut interaction,
        parsed.value("resume-url"),
    )?;
    match result {
        SignupResult::AwaitingPayment { checkout_url } => {
            output::info(format!("Checkout: {}", checkout_url));
            Ok(0)
        }
        SignupResult::Completed(confirmation) => {
            output::success(format!(
                "Subscription {} is {}.",
                confirmation.id, confirmation.status
            ));
            Ok(0)
        }
        SignupResult::Abandoned => Ok(1),
    }
}

fn run_calls(args: &[String]) -> Result<i32, CliError> {
    let parsed = ParsedArgs::parse(args, &["file"])?;
    let records: Vec<CallRecord> = match parsed.value("file") {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        }
        None => {
            let (_, config) = load_config()?;
            http_backend(&config)?.call_records()?
        }
    };
    println!("{}", render_call_report(&records));
    Ok(0)
}
