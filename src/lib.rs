#![doc(test(attr(deny(warnings))))]

//! Receptionist Onboarding implements the sign-up core of a virtual
//! receptionist service: field validation, the payment wizard with its hosted
//! checkout hand-off, the post-payment configuration wizard and the final
//! subscription submission.

pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod errors;
pub mod forms;
pub mod storage;
pub mod utils;
pub mod validation;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Receptionist onboarding tracing initialized.");
    });
}
