//! Customer record accumulated across the payment wizard's steps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::plan::Plan;
use crate::errors::OnboardingError;
use crate::storage::{self, WizardPersistence, CUSTOMER_DATA_KEY, SELECTED_PLAN_KEY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerData {
    pub full_name: String,
    pub last_name: String,
    pub company_name: String,
    pub office_number: String,
    pub email: String,
    pub industry: String,
    pub heard_about: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub mobile_number: String,
    #[serde(rename = "phone_code", skip_serializing_if = "Option::is_none")]
    pub phone_code: Option<String>,
    #[serde(rename = "role_id", skip_serializing_if = "Option::is_none")]
    pub role_id: Option<u64>,
}

impl CustomerData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fields written by the profile step. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub office_number: Option<String>,
    pub email: Option<String>,
    pub industry: Option<String>,
    pub heard_about: Option<String>,
}

/// Fields written by the business step. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessUpdate {
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub mobile_number: Option<String>,
    pub phone_code: Option<String>,
}

fn merge(slot: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Owns the in-progress [`CustomerData`] together with the store that
/// carries it across the checkout redirect.
pub struct CustomerDataAccumulator {
    data: CustomerData,
    store: Arc<dyn WizardPersistence>,
}

impl CustomerDataAccumulator {
    pub fn new(store: Arc<dyn WizardPersistence>) -> Self {
        Self {
            data: CustomerData::default(),
            store,
        }
    }

    pub fn data(&self) -> &CustomerData {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn update_profile_data(&mut self, update: ProfileUpdate) {
        let data = &mut self.data;
        merge(&mut data.full_name, update.full_name);
        merge(&mut data.last_name, update.last_name);
        merge(&mut data.company_name, update.company_name);
        merge(&mut data.office_number, update.office_number);
        merge(&mut data.email, update.email);
        merge(&mut data.industry, update.industry);
        merge(&mut data.heard_about, update.heard_about);
    }

    pub fn update_business_data(&mut self, update: BusinessUpdate) {
        let data = &mut self.data;
        merge(&mut data.company, update.company);
        merge(&mut data.address1, update.address1);
        merge(&mut data.address2, update.address2);
        merge(&mut data.city, update.city);
        merge(&mut data.state, update.state);
        merge(&mut data.zip, update.zip);
        merge(&mut data.country, update.country);
        merge(&mut data.mobile_number, update.mobile_number);
        if update.phone_code.is_some() {
            data.phone_code = update.phone_code;
        }
    }

    pub fn set_role_id(&mut self, role_id: u64) {
        self.data.role_id = Some(role_id);
    }

    /// Writes the record and the selected plan to durable storage. Must run
    /// before handing navigation to the hosted checkout.
    pub fn persist(&self, plan: Option<&Plan>) -> Result<(), OnboardingError> {
        storage::save_typed(self.store.as_ref(), CUSTOMER_DATA_KEY, &self.data)?;
        match plan {
            Some(plan) => storage::save_typed(self.store.as_ref(), SELECTED_PLAN_KEY, plan)?,
            None => self.store.clear(SELECTED_PLAN_KEY)?,
        }
        tracing::info!(email = %self.data.email, "persisted customer data ahead of checkout");
        Ok(())
    }

    /// Consumes the persisted copies. The stored record replaces the in-memory
    /// one only when the latter is empty; the stored plan is returned for the
    /// caller to use when it has none of its own.
    pub fn restore_persisted(&mut self) -> Result<Option<Plan>, OnboardingError> {
        let stored: Option<CustomerData> =
            storage::take_typed(self.store.as_ref(), CUSTOMER_DATA_KEY)?;
        let plan: Option<Plan> = storage::take_typed(self.store.as_ref(), SELECTED_PLAN_KEY)?;
        if self.data.is_empty() {
            if let Some(data) = stored {
                tracing::info!("restored customer data from durable storage");
                self.data = data;
            }
        }
        Ok(plan)
    }
}
