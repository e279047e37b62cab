//! Creates the subscription once both wizards have finished.

use std::sync::Arc;

use crate::backend::{Navigator, OnboardingBackend};
use crate::domain::{ConfigWizardData, SubscriptionConfirmation, SubscriptionPayload};
use crate::errors::OnboardingError;
use crate::wizard::notice::{Notice, NoticeSink};
use crate::wizard::payment::PaymentCompletion;
use crate::wizard::Collaborators;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    InFlight,
    Done(SubscriptionConfirmation),
    /// Last attempt failed; only an explicit retry submits again.
    Failed(String),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Still waiting for the other wizard.
    Waiting,
    Submitted(SubscriptionConfirmation),
    /// A submission for this pair is in flight or already succeeded.
    AlreadySubmitted,
    Failed(OnboardingError),
    /// The previous attempt failed and has not been retried.
    AwaitingRetry,
}

/// Watches for the payment and configuration results. The create call fires
/// the moment the second one arrives, in either order, and at most once per
/// completed pair.
pub struct SubmissionOrchestrator {
    backend: Arc<dyn OnboardingBackend>,
    navigator: Arc<dyn Navigator>,
    notices: Arc<dyn NoticeSink>,
    home_route: String,
    payment: Option<PaymentCompletion>,
    config: Option<ConfigWizardData>,
    state: SubmissionState,
    attempts: u32,
}

impl SubmissionOrchestrator {
    pub fn new(collaborators: &Collaborators, home_route: impl Into<String>) -> Self {
        Self {
            backend: collaborators.backend.clone(),
            navigator: collaborators.navigator.clone(),
            notices: collaborators.notices.clone(),
            home_route: home_route.into(),
            payment: None,
            config: None,
            state: SubmissionState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn payment(&self) -> Option<&PaymentCompletion> {
        self.payment.as_ref()
    }

    pub fn config(&self) -> Option<&ConfigWizardData> {
        self.config.as_ref()
    }

    pub fn payment_completed(&mut self, completion: PaymentCompletion) -> SubmitOutcome {
        if self.locked() {
            return SubmitOutcome::AlreadySubmitted;
        }
        self.payment = Some(completion);
        self.evaluate()
    }

    pub fn config_completed(&mut self, data: ConfigWizardData) -> SubmitOutcome {
        if self.locked() {
            return SubmitOutcome::AlreadySubmitted;
        }
        self.config = Some(data);
        self.evaluate()
    }

    /// User-triggered resubmission after a failure.
    pub fn retry(&mut self) -> SubmitOutcome {
        match self.state {
            SubmissionState::Failed(_) => {
                self.state = SubmissionState::Idle;
                self.evaluate()
            }
            SubmissionState::Idle => self.evaluate(),
            SubmissionState::InFlight | SubmissionState::Done(_) => SubmitOutcome::AlreadySubmitted,
        }
    }

    fn locked(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight | SubmissionState::Done(_))
    }

    fn evaluate(&mut self) -> SubmitOutcome {
        match self.state {
            SubmissionState::Idle => {}
            SubmissionState::Failed(_) => return SubmitOutcome::AwaitingRetry,
            SubmissionState::InFlight | SubmissionState::Done(_) => {
                tracing::debug!("subscription already submitted");
                return SubmitOutcome::AlreadySubmitted;
            }
        }
        let (Some(payment), Some(config)) = (&self.payment, &self.config) else {
            return SubmitOutcome::Waiting;
        };

        let payload =
            SubscriptionPayload::assemble(&payment.session_id, &payment.customer_data, config);
        self.state = SubmissionState::InFlight;
        self.attempts += 1;
        tracing::info!(
            session = %payload.session_id,
            attempt = self.attempts,
            "creating subscription"
        );

        match self.backend.create_subscription(&payload) {
            Ok(confirmation) => {
                tracing::info!(subscription = %confirmation.id, "subscription created");
                self.state = SubmissionState::Done(confirmation.clone());
                self.notices.show(Notice::success(
                    "Your virtual receptionist is all set! Welcome aboard.",
                ));
                self.navigator.navigate(&self.home_route);
                SubmitOutcome::Submitted(confirmation)
            }
            Err(err) => {
                tracing::error!(error = %err, "subscription creation failed");
                self.state = SubmissionState::Failed(err.to_string());
                self.notices.show(Notice::error(err.user_message()));
                SubmitOutcome::Failed(err)
            }
        }
    }
}
