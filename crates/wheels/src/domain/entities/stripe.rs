//! Stripe PaymentIntent and webhook events

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::value_objects::Money;

/// Parameters for `POST /v1/payment_intents`
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaymentIntent {
    pub amount: Money,
    /// Lowercase ISO currency code
    pub currency: String,
    pub payment_method_types: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl CreatePaymentIntent {
    /// Card-only intent in the given currency
    pub fn card(amount: Money, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into().to_lowercase(),
            payment_method_types: vec!["card".to_string()],
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Form fields in Stripe's bracket notation
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("amount".to_string(), self.amount.minor_units().to_string()),
            ("currency".to_string(), self.currency.clone()),
        ];
        for method in &self.payment_method_types {
            fields.push(("payment_method_types[]".to_string(), method.clone()));
        }
        for (key, value) in &self.metadata {
            fields.push((format!("metadata[{key}]"), value.clone()));
        }
        fields
    }
}

/// The subset of a Stripe PaymentIntent this backend reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A verified webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Event types the webhook acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    Other(String),
}

impl StripeEvent {
    pub fn kind(&self) -> StripeEventKind {
        match self.event_type.as_str() {
            "payment_intent.succeeded" => StripeEventKind::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => StripeEventKind::PaymentIntentFailed,
            other => StripeEventKind::Other(other.to_string()),
        }
    }

    /// The embedded object as a PaymentIntent, when it is one
    pub fn payment_intent(&self) -> Option<PaymentIntent> {
        if self.data.object.get("object").and_then(|o| o.as_str()) != Some("payment_intent") {
            return None;
        }
        serde_json::from_value(self.data.object.clone()).ok()
    }
}
