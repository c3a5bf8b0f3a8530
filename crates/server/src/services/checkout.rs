//! Hosted checkout session client.
//!
//! Builds a single-line-item checkout session at the payment processor and
//! returns the hosted payment URL for the storefront to redirect to. The
//! full order payload rides along as opaque session metadata so it can be
//! correlated after payment. No payment state is recorded here.

use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

/// Payment processor API base URL.
const BASE_URL: &str = "https://api.stripe.com";

/// Timeout for session-creation calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Processor returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Line-item amount is unusable (negative or out of range).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Failed to serialize the order payload for session metadata.
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Inputs for a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    /// Display name for the single line item.
    pub product_title: String,
    /// Unit price in major currency units.
    pub price: Decimal,
    /// Quantity purchased; folded into the line-item amount.
    pub quantity: u32,
    /// Buyer email for the processor receipt.
    pub email: String,
    /// Opaque order payload, embedded as session metadata.
    pub order_data: serde_json::Value,
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Processor-hosted payment page URL.
    pub url: String,
}

/// Client for the payment processor's checkout API.
#[derive(Clone)]
pub struct CheckoutClient {
    client: reqwest::Client,
    secret_key: SecretString,
    site_domain: String,
}

impl CheckoutClient {
    /// Create a new checkout client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig, site_domain: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            site_domain: site_domain.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a hosted checkout session and return its redirect URL.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the amount is unusable, the request fails,
    /// or the processor rejects the session.
    pub async fn create_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, CheckoutError> {
        let form = build_form(params, &self.site_domain)?;

        let response = self
            .client
            .post(format!("{BASE_URL}/v1/checkout/sessions"))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response.json().await?;
        Ok(session)
    }
}

/// Line-item amount in minor currency units: round(price × quantity × 100),
/// half away from zero like the original storefront computed it.
fn amount_minor_units(price: Decimal, quantity: u32) -> Result<i64, CheckoutError> {
    if price.is_sign_negative() {
        return Err(CheckoutError::InvalidAmount(format!(
            "negative price: {price}"
        )));
    }

    let amount = (price * Decimal::from(quantity) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    amount
        .to_i64()
        .ok_or_else(|| CheckoutError::InvalidAmount(format!("amount out of range: {amount}")))
}

/// Build the form body for a session-creation call.
///
/// The processor takes nested fields in bracket notation; the session is one
/// card line item with the order payload serialized into metadata.
fn build_form(
    params: &CheckoutSessionParams,
    site_domain: &str,
) -> Result<Vec<(&'static str, String)>, CheckoutError> {
    let amount = amount_minor_units(params.price, params.quantity)?;
    let order_data = serde_json::to_string(&params.order_data)?;

    Ok(vec![
        ("payment_method_types[0]", "card".to_owned()),
        ("line_items[0][price_data][currency]", "usd".to_owned()),
        (
            "line_items[0][price_data][product_data][name]",
            params.product_title.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]",
            amount.to_string(),
        ),
        ("line_items[0][quantity]", "1".to_owned()),
        ("customer_email", params.email.clone()),
        ("mode", "payment".to_owned()),
        ("metadata[orderData]", order_data),
        (
            "success_url",
            format!("{site_domain}/dashboard/success?session_id={{CHECKOUT_SESSION_ID}}"),
        ),
        ("cancel_url", format!("{site_domain}/dashboard/cancel")),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params() -> CheckoutSessionParams {
        CheckoutSessionParams {
            product_title: "Denim Jacket".to_owned(),
            price: Decimal::new(1999, 2), // 19.99
            quantity: 2,
            email: "buyer@example.com".to_owned(),
            order_data: serde_json::json!({"sellerEmail": "seller@example.com"}),
        }
    }

    #[test]
    fn test_amount_minor_units() {
        assert_eq!(amount_minor_units(Decimal::new(1999, 2), 2).unwrap(), 3998);
        assert_eq!(amount_minor_units(Decimal::from(10), 1).unwrap(), 1000);
        assert_eq!(amount_minor_units(Decimal::ZERO, 5).unwrap(), 0);
    }

    #[test]
    fn test_amount_rounds_half_away_from_zero() {
        // 0.335 * 1 * 100 = 33.5 -> 34, matching Math.round in the original.
        assert_eq!(amount_minor_units(Decimal::new(335, 3), 1).unwrap(), 34);
        // 0.325 * 100 = 32.5 -> 33 (banker's rounding would give 32).
        assert_eq!(amount_minor_units(Decimal::new(325, 3), 1).unwrap(), 33);
    }

    #[test]
    fn test_amount_rejects_negative_price() {
        assert!(matches!(
            amount_minor_units(Decimal::new(-100, 2), 1),
            Err(CheckoutError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_build_form_fields() {
        let form = build_form(&params(), "https://shop.example.com").unwrap();
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("line_items[0][price_data][unit_amount]"), "3998");
        assert_eq!(get("line_items[0][quantity]"), "1");
        assert_eq!(get("customer_email"), "buyer@example.com");
        assert_eq!(get("mode"), "payment");
        assert_eq!(
            get("success_url"),
            "https://shop.example.com/dashboard/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(get("cancel_url"), "https://shop.example.com/dashboard/cancel");

        let metadata: serde_json::Value = serde_json::from_str(get("metadata[orderData]")).unwrap();
        assert_eq!(metadata["sellerEmail"], "seller@example.com");
    }

    #[test]
    fn test_build_form_strips_trailing_slash_upstream() {
        // CheckoutClient::new trims the trailing slash before build_form sees it.
        let form = build_form(&params(), "https://shop.example.com").unwrap();
        assert!(
            form.iter()
                .all(|(_, v)| !v.contains("example.com//dashboard"))
        );
    }
}
