use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::errors::OnboardingError;

use super::{Result, WizardPersistence};

/// In-process store; state does not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    fn poisoned() -> OnboardingError {
        OnboardingError::Storage("memory store lock poisoned".into())
    }
}

impl WizardPersistence for MemoryStore {
    fn save(&self, key: &str, value: &Value) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_and_clear_consumes_once() {
        let store = MemoryStore::new();
        store.save("customer_data", &json!({"email": "a@b.co"})).unwrap();

        assert_eq!(
            store.load_and_clear("customer_data").unwrap(),
            Some(json!({"email": "a@b.co"}))
        );
        assert_eq!(store.load_and_clear("customer_data").unwrap(), None);
        assert!(!store.contains("customer_data"));
    }
}
