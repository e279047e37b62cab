//! Service configuration collected after payment and the combined payload
//! sent to create the subscription.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerData;

/// Role assigned when the backend lookup produced none.
pub const DEFAULT_ROLE_ID: u64 = 2;

/// Hours during which the receptionist answers calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageOption {
    WeekdayHours,
    WeekendHours,
    AfterHours,
}

impl UsageOption {
    pub const ALL: [UsageOption; 3] = [
        UsageOption::WeekdayHours,
        UsageOption::WeekendHours,
        UsageOption::AfterHours,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UsageOption::WeekdayHours => "Weekday business hours",
            UsageOption::WeekendHours => "Weekends",
            UsageOption::AfterHours => "After hours",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for ReportFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportFrequency::Daily => "daily",
            ReportFrequency::Weekly => "weekly",
            ReportFrequency::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

/// Everything the configuration wizard collects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWizardData {
    pub greeting_script: String,
    pub goodbye_script: String,
    pub business_description: String,
    pub special_instructions: String,
    pub timezone: String,
    pub report_email: String,
    pub report_frequency: ReportFrequency,
    pub report_time: String,
    pub usage: BTreeSet<UsageOption>,
    pub setup_day: String,
    pub setup_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company_name: String,
    pub office_number: String,
    pub mobile_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_code: Option<String>,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub role_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    pub greeting_script: String,
    pub goodbye_script: String,
    pub business_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub timezone: String,
    pub report_email: String,
    pub report_frequency: ReportFrequency,
    pub report_time: String,
    pub weekday_hours: bool,
    pub weekend_hours: bool,
    pub after_hours: bool,
    pub setup_call_day: String,
    pub setup_call_time: String,
    pub industry: String,
    pub heard_about: String,
}

/// Body of the create-subscription-from-session call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub session_id: String,
    pub user_data: UserData,
    pub service_configuration: ServiceConfiguration,
}

impl SubscriptionPayload {
    pub fn assemble(session_id: &str, customer: &CustomerData, config: &ConfigWizardData) -> Self {
        let (first_name, last_name) = split_name(&customer.full_name, &customer.last_name);
        let company_name = if customer.company_name.trim().is_empty() {
            customer.company.trim().to_string()
        } else {
            customer.company_name.trim().to_string()
        };
        let special = config.special_instructions.trim();

        Self {
            session_id: session_id.to_string(),
            user_data: UserData {
                first_name,
                last_name,
                email: customer.email.trim().to_string(),
                company_name,
                office_number: customer.office_number.clone(),
                mobile_number: customer.mobile_number.clone(),
                phone_code: customer.phone_code.clone(),
                address1: customer.address1.clone(),
                address2: customer.address2.clone(),
                city: customer.city.clone(),
                state: customer.state.clone(),
                zip: customer.zip.clone(),
                country: customer.country.clone(),
                role_id: customer.role_id.unwrap_or(DEFAULT_ROLE_ID),
            },
            service_configuration: ServiceConfiguration {
                greeting_script: config.greeting_script.trim().to_string(),
                goodbye_script: config.goodbye_script.trim().to_string(),
                business_description: config.business_description.trim().to_string(),
                special_instructions: (!special.is_empty()).then(|| special.to_string()),
                timezone: config.timezone.clone(),
                report_email: config.report_email.trim().to_string(),
                report_frequency: config.report_frequency,
                report_time: config.report_time.clone(),
                weekday_hours: config.usage.contains(&UsageOption::WeekdayHours),
                weekend_hours: config.usage.contains(&UsageOption::WeekendHours),
                after_hours: config.usage.contains(&UsageOption::AfterHours),
                setup_call_day: config.setup_day.clone(),
                setup_call_time: config.setup_time.clone(),
                industry: customer.industry.clone(),
                heard_about: customer.heard_about.clone(),
            },
        }
    }
}

/// Confirmation returned once the subscription exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfirmation {
    #[serde(alias = "subscription_id")]
    pub id: String,
    #[serde(default = "SubscriptionConfirmation::default_status")]
    pub status: String,
}

impl SubscriptionConfirmation {
    fn default_status() -> String {
        "active".into()
    }
}

/// Splits a combined name when no explicit last name was collected.
pub fn split_name(full_name: &str, last_name: &str) -> (String, String) {
    let full = full_name.trim();
    let last = last_name.trim();
    if !last.is_empty() {
        return (full.to_string(), last.to_string());
    }
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_data() -> ConfigWizardData {
        ConfigWizardData {
            greeting_script: "Thanks for calling Reyes Dental".into(),
            goodbye_script: "Have a great day".into(),
            business_description: "Family dentistry".into(),
            special_instructions: "  ".into(),
            timezone: "America/Chicago".into(),
            report_email: "reports@reyesdental.com".into(),
            report_frequency: ReportFrequency::Weekly,
            report_time: "08:00".into(),
            usage: BTreeSet::from([UsageOption::WeekdayHours, UsageOption::AfterHours]),
            setup_day: "Tuesday".into(),
            setup_time: "10:00".into(),
        }
    }

    #[test]
    fn split_name_handles_combined_and_explicit_names() {
        assert_eq!(
            split_name("Dana Reyes Smith", ""),
            ("Dana".into(), "Reyes Smith".into())
        );
        assert_eq!(split_name("Dana", ""), ("Dana".into(), String::new()));
        assert_eq!(split_name("Dana", "Reyes"), ("Dana".into(), "Reyes".into()));
    }

    #[test]
    fn assemble_maps_both_records() {
        let customer = CustomerData {
            full_name: "Dana Reyes".into(),
            email: "dana@reyesdental.com".into(),
            company: "Reyes Dental LLC".into(),
            industry: "healthcare".into(),
            heard_about: "search".into(),
            ..CustomerData::default()
        };
        let payload = SubscriptionPayload::assemble("cs_test_1", &customer, &config_data());

        assert_eq!(payload.session_id, "cs_test_1");
        assert_eq!(payload.user_data.first_name, "Dana");
        assert_eq!(payload.user_data.last_name, "Reyes");
        assert_eq!(payload.user_data.company_name, "Reyes Dental LLC");
        assert_eq!(payload.user_data.role_id, DEFAULT_ROLE_ID);
        let service = &payload.service_configuration;
        assert!(service.weekday_hours && service.after_hours && !service.weekend_hours);
        assert_eq!(service.special_instructions, None);
        assert_eq!(service.industry, "healthcare");
    }

    #[test]
    fn service_configuration_wire_shape() {
        let payload =
            SubscriptionPayload::assemble("cs_test_1", &CustomerData::default(), &config_data());
        let json = serde_json::to_string_pretty(&payload.service_configuration).unwrap();
        insta::assert_snapshot!(json, @r###"
        {
          "greeting_script": "Thanks for calling Reyes Dental",
          "goodbye_script": "Have a great day",
          "business_description": "Family dentistry",
          "timezone": "America/Chicago",
          "report_email": "reports@reyesdental.com",
          "report_frequency": "weekly",
          "report_time": "08:00",
          "weekday_hours": true,
          "weekend_hours": false,
          "after_hours": true,
          "setup_call_day": "Tuesday",
          "setup_call_time": "10:00",
          "industry": "",
          "heard_about": ""
        }
        "###);
    }

    #[test]
    fn confirmation_accepts_subscription_id_alias() {
        let confirmation: SubscriptionConfirmation =
            serde_json::from_str(r#"{"subscription_id":"sub_1"}"#).unwrap();
        assert_eq!(confirmation.id, "sub_1");
        assert_eq!(confirmation.status, "active");
    }
}
