//! Application configuration loaded from `config/config.json` under the
//! onboarding home directory.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::errors::OnboardingError;
use crate::utils::persistence::{read_json, write_json_atomic};

const HOME_ENV: &str = "ONBOARDING_HOME";
const DEV_MODE_ENV: &str = "ONBOARDING_DEV_MODE";
const API_URL_ENV: &str = "ONBOARDING_API_BASE_URL";
const DEFAULT_DIR_NAME: &str = ".receptionist_onboarding";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const STATE_DIR: &str = "state";

/// What the Summary step does when the user continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Hand navigation to the hosted checkout page.
    Hosted,
    /// Skip payment and jump straight to Get Started. Development builds only.
    Bypass,
}

impl CheckoutMode {
    /// Mode compiled into this build via the `dev-mode` feature.
    pub fn build_default() -> Self {
        if cfg!(feature = "dev-mode") {
            CheckoutMode::Bypass
        } else {
            CheckoutMode::Hosted
        }
    }

    fn from_flag(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(CheckoutMode::Bypass),
            "0" | "false" | "no" | "off" => Some(CheckoutMode::Hosted),
            _ => None,
        }
    }
}

impl Default for CheckoutMode {
    fn default() -> Self {
        Self::build_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_ms: 1000,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub site_url: String,
    pub checkout_mode: CheckoutMode,
    pub retry: RetrySettings,
    pub token_refresh_margin_secs: u64,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    pub home_route: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".into(),
            site_url: "http://localhost:3000".into(),
            checkout_mode: CheckoutMode::build_default(),
            retry: RetrySettings::default(),
            token_refresh_margin_secs: 60,
            request_timeout_secs: 30,
            client_id: None,
            client_secret: None,
            storage_dir: None,
            home_route: "/".into(),
        }
    }
}

impl AppConfig {
    /// Applies `ONBOARDING_DEV_MODE` and `ONBOARDING_API_BASE_URL`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(DEV_MODE_ENV) {
            match CheckoutMode::from_flag(&raw) {
                Some(mode) => self.checkout_mode = mode,
                None => tracing::warn!(value = %raw, "ignoring unrecognised {}", DEV_MODE_ENV),
            }
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory holding wizard state persisted across the checkout redirect.
    pub fn state_dir(&self, home: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| home.join(STATE_DIR))
    }
}

/// Root directory for configuration and persisted wizard state.
pub fn app_home() -> PathBuf {
    if let Some(dir) = env::var_os(HOME_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, OnboardingError> {
        Self::with_base_dir(app_home())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, OnboardingError> {
        let config_root = base.join(CONFIG_DIR);
        fs::create_dir_all(&config_root)?;
        Ok(Self {
            path: config_root.join(CONFIG_FILE),
            base,
        })
    }

    /// Reads the stored configuration, falling back to defaults when absent.
    pub fn load(&self) -> Result<AppConfig, OnboardingError> {
        let stored: Option<AppConfig> = read_json(&self.path).map_err(|err| {
            OnboardingError::Config(format!("{}: {}", self.path.display(), err))
        })?;
        Ok(stored.unwrap_or_default())
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), OnboardingError> {
        write_json_atomic(&self.path, config)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
