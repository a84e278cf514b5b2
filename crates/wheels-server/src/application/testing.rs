//! In-memory port implementations for tests

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use wheels::{
    AlfalahMerchant, BankGateway, CreatePaymentIntent, DomainError, GatewayParams,
    HandshakeResponse, OrderStatus, PaymentIntent, PaymentIntentService, PushMessage,
    PushNotifier,
};

pub fn merchant() -> AlfalahMerchant {
    AlfalahMerchant {
        merchant_id: "123".into(),
        store_id: "000456".into(),
        username: "merchant".into(),
        password: "secret-password".into(),
        merchant_hash: "merchant-hash".into(),
        channel_id: "1001".into(),
        currency: "PKR".into(),
    }
}

pub struct MockBankGateway {
    handshake: HandshakeResponse,
    transaction_status: String,
    handshakes: Mutex<Vec<GatewayParams>>,
    initiates: Mutex<Vec<GatewayParams>>,
    initiate_calls: AtomicUsize,
}

impl MockBankGateway {
    pub fn accepting(token: &str) -> Self {
        Self::with_handshake(HandshakeResponse {
            success: true,
            auth_token: Some(token.into()),
            return_url: None,
            error_message: None,
        })
    }

    pub fn refusing(message: Option<&str>) -> Self {
        Self::with_handshake(HandshakeResponse {
            success: false,
            auth_token: None,
            return_url: None,
            error_message: message.map(str::to_string),
        })
    }

    fn with_handshake(handshake: HandshakeResponse) -> Self {
        Self {
            handshake,
            transaction_status: "Pending".into(),
            handshakes: Mutex::new(Vec::new()),
            initiates: Mutex::new(Vec::new()),
            initiate_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_order_status(mut self, status: &str) -> Self {
        self.transaction_status = status.into();
        self
    }

    pub fn last_handshake(&self) -> Option<GatewayParams> {
        self.handshakes.lock().unwrap().last().cloned()
    }

    pub fn last_initiate(&self) -> Option<GatewayParams> {
        self.initiates.lock().unwrap().last().cloned()
    }

    pub fn initiate_calls(&self) -> usize {
        self.initiate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BankGateway for MockBankGateway {
    async fn handshake(&self, params: &GatewayParams) -> Result<HandshakeResponse, DomainError> {
        self.handshakes.lock().unwrap().push(params.clone());
        Ok(self.handshake.clone())
    }

    async fn initiate(&self, params: &GatewayParams) -> Result<serde_json::Value, DomainError> {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        self.initiates.lock().unwrap().push(params.clone());
        Ok(json!({"success": "true", "RedirectURL": "https://sandbox.bankalfalah.com/pay"}))
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, DomainError> {
        Ok(OrderStatus {
            transaction_status: Some(self.transaction_status.clone()),
            description: Some(format!("Transaction {}", self.transaction_status)),
            transaction_amount: Some(json!("1500")),
            transaction_reference_number: Some(order_id.to_string()),
            transaction_id: Some(json!(987654)),
            transaction_date_time: Some("2024-01-15 14:30:00".into()),
        })
    }
}

/// Records requests and answers with a fixed client secret
#[derive(Default)]
pub struct MockPaymentIntents {
    pub requests: Mutex<Vec<CreatePaymentIntent>>,
    pub fail: bool,
}

impl MockPaymentIntents {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn last_request(&self) -> Option<CreatePaymentIntent> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentIntentService for MockPaymentIntents {
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, DomainError> {
        if self.fail {
            return Err(DomainError::ExternalService("stripe is down".into()));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(PaymentIntent {
            id: "pi_test".into(),
            client_secret: Some("pi_test_secret".into()),
            amount: request.amount.minor_units(),
            currency: request.currency.clone(),
            status: Some("requires_payment_method".into()),
            metadata: request.metadata.clone(),
        })
    }
}

/// Collects pushed messages; tokens marked unregistered answer NotFound
#[derive(Default)]
pub struct MockNotifier {
    pub sent: Mutex<Vec<PushMessage>>,
    unregistered: Vec<String>,
}

impl MockNotifier {
    pub fn with_unregistered(tokens: &[&str]) -> Self {
        Self {
            unregistered: tokens.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushNotifier for MockNotifier {
    async fn send(&self, message: &PushMessage) -> Result<String, DomainError> {
        if self.unregistered.contains(&message.token) {
            return Err(DomainError::not_found("FCM token", &message.token));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("projects/test/messages/{}", sent.len()))
    }
}
