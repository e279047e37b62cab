pub mod checkout;
pub mod config;
pub mod notice;
pub mod payment;
pub mod submission;
pub mod tax;

use std::sync::Arc;

use crate::backend::{CheckoutGateway, Navigator, OnboardingBackend};
use crate::storage::WizardPersistence;

pub use checkout::{classify_payment_failure, CheckoutRedirect, CheckoutUrls};
pub use config::{ConfigOutcome, ConfigStep, ConfigWizard, TimeSlot};
pub use notice::{Notice, NoticeLevel, NoticeLog, NoticeSink};
pub use payment::{
    PaymentCompletion, PaymentStep, PaymentWizard, ResumeEvent, ResumeOutcome, StepOutcome,
};
pub use submission::{SubmissionOrchestrator, SubmissionState, SubmitOutcome};
pub use tax::TaxCalculator;

/// Shared handles passed to every wizard component.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn OnboardingBackend>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub navigator: Arc<dyn Navigator>,
    pub notices: Arc<dyn NoticeSink>,
    pub store: Arc<dyn WizardPersistence>,
}
