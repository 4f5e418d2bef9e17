// src/api/razorpay.rs
//
// Minimal client for the Razorpay Orders API plus the two signature checks:
// the client-submitted checkout signature and the raw-body webhook signature.
// Neither flow is trusted without its HMAC.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

#[derive(Debug)]
pub enum RazorpayError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for RazorpayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RazorpayError::Http(e) => write!(f, "http error: {e}"),
            RazorpayError::Api { status, body } => {
                write!(f, "razorpay api error status={status} body={body}")
            }
            RazorpayError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl std::error::Error for RazorpayError {}

impl From<reqwest::Error> for RazorpayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

pub async fn create_order(
    base_url: &str,
    key_id: &str,
    key_secret: &str,
    req: CreateOrderRequest,
) -> Result<GatewayOrder, RazorpayError> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/v1/orders", base_url.trim_end_matches('/')))
        .basic_auth(key_id, Some(key_secret))
        .json(&req)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(RazorpayError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<GatewayOrder>(&body)
        .map_err(|e| RazorpayError::InvalidResponse(format!("{e}; body={body}")))
}

/// Checkout signature: HMAC-SHA256 over "{order_id}|{payment_id}" with the key
/// secret, hex-encoded.
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &str,
) -> bool {
    let payload = format!("{order_id}|{payment_id}");
    verify_hmac_hex(payload.as_bytes(), signature, key_secret)
}

/// Webhook signature: HMAC-SHA256 over the raw request body with the webhook
/// secret, hex-encoded, carried in X-Razorpay-Signature.
pub fn verify_webhook_signature(body: &[u8], signature: &str, webhook_secret: &str) -> bool {
    verify_hmac_hex(body, signature, webhook_secret)
}

fn verify_hmac_hex(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Hex signature for a payload, used by tests and by callers constructing
/// outbound signed requests.
pub fn sign_hex(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
