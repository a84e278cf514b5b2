//! Bank Alfalah HTTP Gateway
//!
//! Posts signed parameter sets to the hosted-checkout endpoints using reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use wheels::{BankGateway, DomainError, GatewayParams, HandshakeResponse, OrderStatus};

use crate::config::AlfalahConfig;

pub struct HttpAlfalahGateway {
    client: Client,
    base_url: String,
    merchant_id: String,
    store_id: String,
}

impl HttpAlfalahGateway {
    pub fn new(config: &AlfalahConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            merchant_id: config.merchant.merchant_id.clone(),
            store_id: config.merchant.store_id.clone(),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &GatewayParams,
    ) -> Result<T, DomainError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Posting to Bank Alfalah");

        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Bank Alfalah request failed: {e}")))?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DomainError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DomainError::ExternalService(format!(
            "Bank Alfalah returned {status}: {body}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| DomainError::ExternalService(format!("Invalid Bank Alfalah response: {e}")))
}

#[async_trait]
impl BankGateway for HttpAlfalahGateway {
    async fn handshake(&self, params: &GatewayParams) -> Result<HandshakeResponse, DomainError> {
        self.post_json("/HS/HS/HS", params).await
    }

    async fn initiate(&self, params: &GatewayParams) -> Result<serde_json::Value, DomainError> {
        self.post_json("/SSO/SSO/SSO", params).await
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, DomainError> {
        let url = format!(
            "{}/HS/api/IPN/OrderStatus/{}/{}/{}",
            self.base_url,
            self.merchant_id,
            self.store_id,
            urlencoding::encode(order_id)
        );
        tracing::debug!(order_id = %order_id, "Fetching Bank Alfalah order status");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Bank Alfalah request failed: {e}")))?;

        decode(response).await
    }
}
