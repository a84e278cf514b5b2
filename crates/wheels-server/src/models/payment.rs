//! Payment DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use wheels::{DomainError, Money, PaymentInitRequest};

/// Request to start a Bank Alfalah hosted checkout
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    /// Amount in rupees
    pub amount: Option<f64>,
    pub order_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub description: Option<String>,
    /// Where the bank redirects after payment
    pub return_url: Option<String>,
}

impl InitializePaymentRequest {
    pub fn into_domain(self) -> Result<PaymentInitRequest, DomainError> {
        let amount = self
            .amount
            .ok_or_else(|| DomainError::Validation("amount is required".into()))?;

        Ok(PaymentInitRequest::new(
            Money::from_major(amount)?,
            self.order_id.unwrap_or_default(),
            self.return_url.unwrap_or_default(),
        )?
        .with_customer(self.customer_name, self.customer_email)
        .with_description(self.description))
    }
}

/// Request for a Stripe PaymentIntent; give `amount` or `planId`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Custom amount in major units
    pub amount: Option<f64>,
    /// Featured plan to pay for
    pub plan_id: Option<String>,
    pub order_id: Option<String>,
    pub listing_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// Acknowledgement sent back to Stripe
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
