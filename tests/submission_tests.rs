mod common;

use common::{FakeBackend, FakeGateway, Harness};
use receptionist_onboarding::domain::{
    ConfigWizardData, CustomerData, Plan, ReportFrequency, UsageOption,
};
use receptionist_onboarding::wizard::{
    NoticeLevel, PaymentCompletion, SubmissionOrchestrator, SubmissionState, SubmitOutcome,
};

fn completion() -> PaymentCompletion {
    PaymentCompletion {
        customer_data: CustomerData {
            full_name: "Dana Reyes".into(),
            email: "dana@reyesdental.com".into(),
            company: "Reyes Dental LLC".into(),
            state: "TX".into(),
            role_id: Some(7),
            ..CustomerData::default()
        },
        selected_plan: Plan::new("pro", "Professional", 99.0),
        session_id: "cs_test_123".into(),
    }
}

fn config() -> ConfigWizardData {
    ConfigWizardData {
        greeting_script: "Thanks for calling!".into(),
        goodbye_script: "Goodbye.".into(),
        business_description: "Dental practice".into(),
        special_instructions: String::new(),
        timezone: "America/Chicago".into(),
        report_email: "reports@reyesdental.com".into(),
        report_frequency: ReportFrequency::Daily,
        report_time: "08:00".into(),
        usage: [UsageOption::WeekdayHours, UsageOption::AfterHours]
            .into_iter()
            .collect(),
        setup_day: "Monday".into(),
        setup_time: "10:00".into(),
    }
}

#[test]
fn waits_for_both_inputs_in_either_order() {
    for payment_first in [true, false] {
        let harness = Harness::new();
        let mut orchestrator = SubmissionOrchestrator::new(&harness.collaborators(), "/");
        let first = if payment_first {
            orchestrator.payment_completed(completion())
        } else {
            orchestrator.config_completed(config())
        };
        assert!(matches!(first, SubmitOutcome::Waiting));
        assert_eq!(harness.backend.subscription_calls(), 0);

        let second = if payment_first {
            orchestrator.config_completed(config())
        } else {
            orchestrator.payment_completed(completion())
        };
        assert!(matches!(second, SubmitOutcome::Submitted(_)));
        assert_eq!(harness.backend.subscription_calls(), 1);
    }
}

#[test]
fn submits_at_most_once() {
    let harness = Harness::new();
    let mut orchestrator = SubmissionOrchestrator::new(&harness.collaborators(), "/dashboard");
    orchestrator.payment_completed(completion());
    orchestrator.config_completed(config());

    assert!(matches!(
        orchestrator.config_completed(config()),
        SubmitOutcome::AlreadySubmitted
    ));
    assert!(matches!(
        orchestrator.payment_completed(completion()),
        SubmitOutcome::AlreadySubmitted
    ));
    assert!(matches!(orchestrator.retry(), SubmitOutcome::AlreadySubmitted));
    assert_eq!(harness.backend.subscription_calls(), 1);
    assert_eq!(orchestrator.attempts(), 1);
    assert_eq!(harness.navigator.visits(), vec!["/dashboard".to_string()]);
    assert_eq!(harness.notices.last().unwrap().level, NoticeLevel::Success);
}

#[test]
fn payload_combines_customer_and_configuration() {
    let harness = Harness::new();
    let mut orchestrator = SubmissionOrchestrator::new(&harness.collaborators(), "/");
    orchestrator.config_completed(config());
    orchestrator.payment_completed(completion());

    let payload = harness.backend.subscriptions.lock().unwrap()[0].clone();
    assert_eq!(payload.session_id, "cs_test_123");
    assert_eq!(payload.user_data.first_name, "Dana");
    assert_eq!(payload.user_data.last_name, "Reyes");
    assert_eq!(payload.user_data.company_name, "Reyes Dental LLC");
    assert_eq!(payload.user_data.role_id, 7);
    let service = payload.service_configuration;
    assert!(service.weekday_hours && service.after_hours && !service.weekend_hours);
    assert_eq!(service.special_instructions, None);
    assert_eq!(service.setup_call_day, "Monday");
}

#[test]
fn failure_keeps_data_until_explicit_retry() {
    let harness = Harness::with(FakeBackend::new().failing_subscriptions(1), FakeGateway::new());
    let mut orchestrator = SubmissionOrchestrator::new(&harness.collaborators(), "/");
    orchestrator.payment_completed(completion());
    let outcome = orchestrator.config_completed(config());

    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(matches!(orchestrator.state(), SubmissionState::Failed(_)));
    assert!(orchestrator.payment().is_some());
    assert!(orchestrator.config().is_some());
    assert!(harness.navigator.visits().is_empty());
    assert_eq!(harness.notices.last().unwrap().level, NoticeLevel::Error);

    assert!(matches!(
        orchestrator.config_completed(config()),
        SubmitOutcome::AwaitingRetry
    ));
    assert_eq!(harness.backend.subscription_calls(), 1);

    assert!(matches!(orchestrator.retry(), SubmitOutcome::Submitted(_)));
    assert_eq!(harness.backend.subscription_calls(), 2);
    assert_eq!(orchestrator.attempts(), 2);
    assert_eq!(harness.navigator.visits(), vec!["/".to_string()]);
}
