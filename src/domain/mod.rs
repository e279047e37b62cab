pub mod customer;
pub mod plan;
pub mod service;

pub use customer::{BusinessUpdate, CustomerData, CustomerDataAccumulator, ProfileUpdate};
pub use plan::{BillingInterval, OrderSummary, Plan, TaxCalculation, TaxPreviewRequest};
pub use service::{
    ConfigWizardData, ReportFrequency, ServiceConfiguration, SubscriptionConfirmation,
    SubscriptionPayload, UsageOption, UserData, DEFAULT_ROLE_ID,
};
