use std::fmt;

use serde::{Deserialize, Serialize};

/// Billing cadence advertised for a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Month,
    Year,
}

impl fmt::Display for BillingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingInterval::Month => f.write_str("month"),
            BillingInterval::Year => f.write_str("year"),
        }
    }
}

/// Subscription plan the customer picked before entering the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default = "Plan::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub interval: BillingInterval,
}

impl Plan {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            currency: Self::default_currency(),
            interval: BillingInterval::Month,
        }
    }

    pub fn default_currency() -> String {
        "USD".into()
    }

    /// Price in minor units, used wherever equality on money matters.
    pub fn price_cents(&self) -> i64 {
        to_cents(self.price)
    }
}

/// Query sent to the tax preview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxPreviewRequest {
    pub amount: f64,
    pub country: String,
    pub state: String,
    pub postal_code: String,
}

/// Tax breakdown returned by the backend for a plan price and state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCalculation {
    pub amount: f64,
    #[serde(default = "Plan::default_currency")]
    pub currency: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    pub tax_amount: f64,
    pub tax_rate: f64,
    pub total_amount: f64,
}

/// Figures rendered on the summary step before checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub plan_name: String,
    pub currency: String,
    pub subtotal: f64,
    pub tax: f64,
    pub tax_rate: Option<f64>,
    pub total: f64,
}

impl OrderSummary {
    /// Subtotal equals the plan price; tax stays zero until a calculation exists.
    pub fn for_plan(plan: &Plan, tax: Option<&TaxCalculation>) -> Self {
        let subtotal = round_cents(plan.price);
        match tax {
            Some(calc) => Self {
                plan_name: plan.name.clone(),
                currency: plan.currency.clone(),
                subtotal,
                tax: round_cents(calc.tax_amount),
                tax_rate: Some(calc.tax_rate),
                total: round_cents(calc.total_amount),
            },
            None => Self {
                plan_name: plan.name.clone(),
                currency: plan.currency.clone(),
                subtotal,
                tax: 0.0,
                tax_rate: None,
                total: subtotal,
            },
        }
    }
}

pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn round_cents(amount: f64) -> f64 {
    to_cents(amount) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_without_tax_uses_plan_price() {
        let plan = Plan::new("starter", "Starter", 49.99);
        let summary = OrderSummary::for_plan(&plan, None);
        assert_eq!(summary.subtotal, 49.99);
        assert_eq!(summary.tax, 0.0);
        assert_eq!(summary.total, 49.99);
        assert!(summary.tax_rate.is_none());
    }

    #[test]
    fn summary_with_tax_uses_backend_figures() {
        let plan = Plan::new("pro", "Professional", 100.0);
        let calc = TaxCalculation {
            amount: 100.0,
            currency: "USD".into(),
            country: "US".into(),
            state: "TX".into(),
            postal_code: "73301".into(),
            tax_amount: 8.25,
            tax_rate: 0.0825,
            total_amount: 108.25,
        };
        let summary = OrderSummary::for_plan(&plan, Some(&calc));
        assert_eq!(summary.tax, 8.25);
        assert_eq!(summary.total, 108.25);
    }

    #[test]
    fn plan_deserializes_with_defaults() {
        let plan: Plan =
            serde_json::from_str(r#"{"id":"basic","name":"Basic","price":29}"#).unwrap();
        assert_eq!(plan.currency, "USD");
        assert_eq!(plan.interval, BillingInterval::Month);
        assert_eq!(plan.price_cents(), 2900);
    }
}
