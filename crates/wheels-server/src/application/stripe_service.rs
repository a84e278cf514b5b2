//! Stripe Checkout Service (Use Case)
//!
//! Creates PaymentIntents for custom amounts or featured plans, and turns
//! verified webhook events into realtime notifications for the paying user.

use serde_json::json;
use std::sync::Arc;

use wheels::domain::services::stripe_signature;
use wheels::{
    CreatePaymentIntent, DomainError, FeaturedPlan, Money, PaymentIntent, PaymentIntentService,
    RealtimeEnvelope, StripeEvent, StripeEventKind,
};

use super::RealtimeHub;
use crate::config::StripeWebhookConfig;

/// Intent metadata key naming the paying user
pub const USER_METADATA_KEY: &str = "user_id";

/// Where the charged amount comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AmountSource {
    Custom(Money),
    Plan(FeaturedPlan),
}

impl AmountSource {
    /// Exactly one of `amount` (major units) or `plan_id` must be given
    pub fn resolve(amount: Option<f64>, plan_id: Option<&str>) -> Result<Self, DomainError> {
        match (amount, plan_id.map(str::trim).filter(|p| !p.is_empty())) {
            (Some(amount), None) => Ok(Self::Custom(Money::from_major(amount)?)),
            (None, Some(plan_id)) => Ok(Self::Plan(FeaturedPlan::find(plan_id)?)),
            (Some(_), Some(_)) => Err(DomainError::Validation(
                "provide either amount or planId, not both".into(),
            )),
            (None, None) => Err(DomainError::Validation(
                "amount or planId is required".into(),
            )),
        }
    }

    pub fn money(&self) -> Result<Money, DomainError> {
        match self {
            Self::Custom(money) => Ok(*money),
            Self::Plan(plan) => plan.amount(),
        }
    }
}

pub struct StripeCheckout {
    payments: Arc<dyn PaymentIntentService>,
    currency: String,
}

impl StripeCheckout {
    pub fn new(payments: Arc<dyn PaymentIntentService>, currency: impl Into<String>) -> Self {
        Self {
            payments,
            currency: currency.into(),
        }
    }

    pub async fn create_payment_intent(
        &self,
        source: &AmountSource,
        order_id: Option<&str>,
        listing_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<PaymentIntent, DomainError> {
        let mut request = CreatePaymentIntent::card(source.money()?, &self.currency);
        if let AmountSource::Plan(plan) = source {
            request = request.with_metadata("plan_id", &plan.id);
        }
        if let Some(order_id) = order_id.filter(|o| !o.is_empty()) {
            request = request.with_metadata("order_id", order_id);
        }
        if let Some(listing_id) = listing_id.filter(|l| !l.is_empty()) {
            request = request.with_metadata("listing_id", listing_id);
        }
        if let Some(user_id) = user_id.filter(|u| !u.is_empty()) {
            request = request.with_metadata(USER_METADATA_KEY, user_id);
        }

        self.payments.create_payment_intent(&request).await
    }
}

/// Verifies and dispatches Stripe webhook deliveries
pub struct StripeWebhook {
    config: StripeWebhookConfig,
}

impl StripeWebhook {
    pub fn new(config: StripeWebhookConfig) -> Self {
        Self { config }
    }

    /// Check the signature, then parse the event
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<StripeEvent, DomainError> {
        let header = signature_header
            .ok_or_else(|| DomainError::Signature("Missing Stripe-Signature header".into()))?;

        stripe_signature::verify(
            payload,
            header,
            &self.config.secret,
            self.config.tolerance_secs,
            now,
        )?;

        serde_json::from_slice(payload)
            .map_err(|e| DomainError::Signature(format!("Invalid event payload: {e}")))
    }

    /// Publish the notification an event implies to its owner; returns it
    /// for logging
    pub fn dispatch(&self, hub: &RealtimeHub, event: &StripeEvent) -> Option<RealtimeEnvelope> {
        let envelope = event_notification(event)?;
        hub.publish(envelope.clone());
        Some(envelope)
    }
}

fn event_notification(event: &StripeEvent) -> Option<RealtimeEnvelope> {
    let (kind, title) = match event.kind() {
        StripeEventKind::PaymentIntentSucceeded => ("payment_succeeded", "Payment successful"),
        StripeEventKind::PaymentIntentFailed => ("payment_failed", "Payment failed"),
        StripeEventKind::Other(event_type) => {
            tracing::debug!(event_id = %event.id, event_type = %event_type, "Unhandled Stripe event");
            return None;
        }
    };

    let intent = event.payment_intent();
    let intent_id = intent.as_ref().map(|i| i.id.clone()).unwrap_or_default();
    let amount = intent.as_ref().map(|i| i.amount);

    match kind {
        "payment_succeeded" => {
            tracing::info!(intent_id = %intent_id, ?amount, "✅ PaymentIntent succeeded")
        }
        _ => tracing::warn!(intent_id = %intent_id, ?amount, "❌ PaymentIntent failed"),
    }

    let metadata = intent.map(|i| i.metadata).unwrap_or_default();
    let Some(owner) = metadata.get(USER_METADATA_KEY).cloned() else {
        tracing::debug!(intent_id = %intent_id, "PaymentIntent has no owning user, not broadcasting");
        return None;
    };
    let body = match amount {
        Some(minor) => format!("Payment of {} processed", Money::from_minor(minor)),
        None => "Payment processed".to_string(),
    };

    Some(RealtimeEnvelope::Notification {
        kind: kind.to_string(),
        title: title.to_string(),
        body,
        data: json!({
            "eventId": event.id,
            "paymentIntentId": intent_id,
            "amount": amount,
            "metadata": metadata,
        }),
        recipient_id: Some(owner),
    })
}
