//! Bank Alfalah Checkout Service (Use Case)
//!
//! Drives the signed handshake, then the SSO initialization.

use std::sync::Arc;

use wheels::{AlfalahMerchant, BankGateway, DomainError, PaymentInitRequest, PaymentVerification};

/// Application service for hosted-checkout payments
pub struct AlfalahCheckout<G: BankGateway + ?Sized> {
    gateway: Arc<G>,
    merchant: AlfalahMerchant,
}

impl<G: BankGateway + ?Sized> AlfalahCheckout<G> {
    pub fn new(gateway: Arc<G>, merchant: AlfalahMerchant) -> Self {
        Self { gateway, merchant }
    }

    /// Handshake, then initialize; a refused handshake stops before the
    /// second call
    pub async fn initialize(
        &self,
        request: &PaymentInitRequest,
    ) -> Result<serde_json::Value, DomainError> {
        let handshake_params = self
            .merchant
            .handshake_params(&request.order_id, &request.return_url);

        let auth_token = self
            .gateway
            .handshake(&handshake_params)
            .await?
            .into_auth_token()?;

        tracing::debug!(order_id = %request.order_id, "Handshake accepted");

        let payment_params = self.merchant.payment_params(&auth_token, request);
        let response = self.gateway.initiate(&payment_params).await?;

        tracing::info!(
            order_id = %request.order_id,
            amount = %request.amount,
            "🏦 Alfalah payment initialized"
        );

        Ok(response)
    }

    pub async fn verify(&self, order_id: &str) -> Result<PaymentVerification, DomainError> {
        if order_id.trim().is_empty() {
            return Err(DomainError::Validation("orderId is required".into()));
        }

        let verification = self.gateway.order_status(order_id).await?.into_verification();

        tracing::info!(
            order_id = %order_id,
            status = %verification.status,
            "Alfalah payment verified"
        );

        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{merchant, MockBankGateway};
    use wheels::{Money, PaymentStatus};

    fn request() -> PaymentInitRequest {
        PaymentInitRequest::new(
            Money::from_major(1500.5).unwrap(),
            "ORD-1",
            "https://wheels.example/return",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_signs_both_steps() {
        let gateway = Arc::new(MockBankGateway::accepting("token-abc"));
        let checkout = AlfalahCheckout::new(gateway.clone(), merchant());

        let response = checkout.initialize(&request()).await.unwrap();
        assert_eq!(response["success"], "true");

        let handshake = gateway.last_handshake().unwrap();
        assert_eq!(handshake["HS_TransactionReferenceNumber"], "ORD-1");
        assert!(handshake.contains_key("HS_RequestHash"));

        let initiate = gateway.last_initiate().unwrap();
        assert_eq!(initiate["AuthToken"], "token-abc");
        assert_eq!(initiate["TransactionAmount"], "1500.5");
        assert_eq!(initiate["TransactionTypeId"], "3");
        assert!(initiate.contains_key("RequestHash"));
    }

    #[tokio::test]
    async fn test_refused_handshake_skips_initiate() {
        let gateway = Arc::new(MockBankGateway::refusing(Some("Invalid merchant")));
        let checkout = AlfalahCheckout::new(gateway.clone(), merchant());

        let err = checkout.initialize(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid merchant");
        assert_eq!(gateway.initiate_calls(), 0);
    }

    #[tokio::test]
    async fn test_refusal_without_message_uses_default() {
        let gateway = Arc::new(MockBankGateway::refusing(None));
        let checkout = AlfalahCheckout::new(gateway.clone(), merchant());

        let err = checkout.initialize(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "Handshake failed");
    }

    #[tokio::test]
    async fn test_verify_paid_order() {
        let gateway = Arc::new(MockBankGateway::accepting("t").with_order_status("Paid"));
        let checkout = AlfalahCheckout::new(gateway, merchant());

        let verification = checkout.verify("ORD-1").await.unwrap();
        assert!(verification.success);
        assert_eq!(verification.status, PaymentStatus::Completed);
        assert_eq!(verification.transaction_details.order_id.as_deref(), Some("ORD-1"));
    }

    #[tokio::test]
    async fn test_verify_failed_order() {
        let gateway = Arc::new(MockBankGateway::accepting("t").with_order_status("Failed"));
        let checkout = AlfalahCheckout::new(gateway, merchant());

        let verification = checkout.verify("ORD-1").await.unwrap();
        assert!(!verification.success);
        assert_eq!(verification.status, PaymentStatus::Failed);
    }
}
