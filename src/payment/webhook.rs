//! Webhook event parsing
//!
//! Payloads are parsed once at the boundary into a tagged variant; the
//! handler dispatches on the tag instead of matching event-type strings
//! throughout the code.

use serde_json::Value;

/// A recognized gateway webhook event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout session was paid; carries the session id
    PaymentPaid(String),
    /// Checkout session expired without payment; carries the session id
    SessionExpired(String),
    /// Anything else; carries the session id when one is present so the
    /// handler can fall back to verifying it against the gateway
    Other(Option<String>),
}

impl WebhookEvent {
    /// Parse a raw webhook body
    ///
    /// Event type and session id live at `data.attributes.type` and
    /// `data.attributes.id`. Malformed payloads parse to `Other(None)`;
    /// the webhook endpoint always answers 200.
    pub fn parse(payload: &Value) -> Self {
        let attributes = payload.get("data").and_then(|d| d.get("attributes"));
        let Some(attributes) = attributes else {
            return WebhookEvent::Other(None);
        };

        let id = attributes
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from);
        let event_type = attributes.get("type").and_then(|v| v.as_str());

        match (event_type, id) {
            (Some("checkout_session.payment.paid"), Some(id)) => WebhookEvent::PaymentPaid(id),
            (Some("checkout_session.expired"), Some(id)) => WebhookEvent::SessionExpired(id),
            (_, id) => WebhookEvent::Other(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payment_paid() {
        let payload = json!({
            "data": {
                "attributes": {
                    "type": "checkout_session.payment.paid",
                    "id": "cs_123"
                }
            }
        });
        assert_eq!(
            WebhookEvent::parse(&payload),
            WebhookEvent::PaymentPaid("cs_123".into())
        );
    }

    #[test]
    fn test_parse_session_expired() {
        let payload = json!({
            "data": {
                "attributes": {
                    "type": "checkout_session.expired",
                    "id": "cs_456"
                }
            }
        });
        assert_eq!(
            WebhookEvent::parse(&payload),
            WebhookEvent::SessionExpired("cs_456".into())
        );
    }

    #[test]
    fn test_parse_unknown_type_keeps_id() {
        let payload = json!({
            "data": {
                "attributes": {
                    "type": "payment.refund.updated",
                    "id": "cs_789"
                }
            }
        });
        assert_eq!(
            WebhookEvent::parse(&payload),
            WebhookEvent::Other(Some("cs_789".into()))
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(
            WebhookEvent::parse(&json!({"hello": "world"})),
            WebhookEvent::Other(None)
        );
        assert_eq!(WebhookEvent::parse(&json!(null)), WebhookEvent::Other(None));
    }
}
