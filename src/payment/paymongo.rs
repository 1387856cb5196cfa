//! PayMongo integration via REST API (no SDK dependency)
//!
//! Basic Auth uses the secret key as username with an empty password.
//! Amounts are converted to integer centavos on the wire.

use super::{to_centavos, CheckoutSession, GatewayError, PaymentGateway};
use crate::models::PaymentStatus;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.paymongo.com/v1";

/// PayMongo checkout-session client
pub struct PayMongoGateway {
    secret_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    data: SessionData,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    id: String,
    attributes: SessionAttributes,
}

#[derive(Debug, Deserialize)]
struct SessionAttributes {
    #[serde(default)]
    checkout_url: String,
    #[serde(default)]
    status: String,
}

impl PayMongoGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn read_body(res: reqwest::Response) -> Result<(u16, String), GatewayError> {
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl PaymentGateway for PayMongoGateway {
    async fn create_session(
        &self,
        amount: f64,
        reference_id: &str,
        description: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        let body = json!({
            "data": {
                "attributes": {
                    "line_items": [{
                        "amount": to_centavos(amount),
                        "currency": "PHP",
                        "name": description,
                        "quantity": 1,
                    }],
                    "payment_method_types": ["qrph", "gcash", "paymaya", "card", "grab_pay"],
                    "description": description,
                    "reference_number": reference_id,
                    "send_email_receipt": false,
                    "show_description": true,
                    "show_line_items": true,
                    "success_url": success_url,
                    "cancel_url": cancel_url,
                }
            }
        });

        let res = self
            .client
            .post(format!("{API_BASE}/checkout_sessions"))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let (status, body) = Self::read_body(res).await?;
        if status != 200 && status != 201 {
            return Err(GatewayError::Api { status, body });
        }

        let session: SessionResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        tracing::info!(
            session_id = %session.data.id,
            reference_id,
            "PayMongo checkout session created"
        );

        Ok(CheckoutSession {
            payment_id: session.data.id,
            checkout_url: session.data.attributes.checkout_url,
        })
    }

    async fn verify(&self, session_id: &str) -> Result<PaymentStatus, GatewayError> {
        let res = self
            .client
            .get(format!("{API_BASE}/checkout_sessions/{session_id}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let (status, body) = Self::read_body(res).await?;
        if status != 200 {
            return Err(GatewayError::Api { status, body });
        }

        let session: SessionResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        if session.data.attributes.status == "paid" {
            Ok(PaymentStatus::Completed)
        } else {
            Ok(PaymentStatus::Pending)
        }
    }

    async fn refund(&self, order_id: &str, amount: f64) -> Result<(), GatewayError> {
        let body = json!({
            "data": {
                "attributes": {
                    "amount": to_centavos(amount),
                    "reason": "requested_by_customer",
                    "notes": order_id,
                }
            }
        });

        let res = self
            .client
            .post(format!("{API_BASE}/refunds"))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let (status, body) = Self::read_body(res).await?;
        if status != 200 && status != 201 {
            return Err(GatewayError::Api { status, body });
        }

        tracing::info!(order_id, amount, "PayMongo refund accepted");
        Ok(())
    }
}
