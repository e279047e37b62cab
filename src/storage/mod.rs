//! Durable client-side storage used to carry wizard state across the full
//! navigation to the hosted checkout and back.

pub mod json_backend;
pub mod memory;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::OnboardingError;

pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, OnboardingError>;

/// Storage key for the accumulated customer record.
pub const CUSTOMER_DATA_KEY: &str = "customer_data";
/// Storage key for the plan chosen before checkout.
pub const SELECTED_PLAN_KEY: &str = "selected_plan";

/// Key/value persistence for values that must survive a page navigation.
pub trait WizardPersistence: Send + Sync {
    fn save(&self, key: &str, value: &Value) -> Result<()>;
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn clear(&self, key: &str) -> Result<()>;

    /// Reads a value and removes it so it is consumed exactly once.
    fn load_and_clear(&self, key: &str) -> Result<Option<Value>> {
        let value = self.load(key)?;
        if value.is_some() {
            self.clear(key)?;
        }
        Ok(value)
    }
}

/// Serializes `value` under `key`.
pub fn save_typed<T: Serialize>(
    store: &dyn WizardPersistence,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_value(value)?;
    store.save(key, &json)
}

/// Consumes the value stored under `key`, deserializing it into `T`.
///
/// A value that no longer matches `T` is discarded rather than reported.
pub fn take_typed<T: DeserializeOwned>(
    store: &dyn WizardPersistence,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = store.load_and_clear(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable persisted value");
            Ok(None)
        }
    }
}
