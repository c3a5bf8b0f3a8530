//! Identity verifier client.
//!
//! Routes never inspect tokens themselves: the raw bearer token is handed to
//! the external identity provider's lookup endpoint and only the verified
//! email claim that comes back is trusted. Verification is read-only and safe
//! to retry.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use loomcart_core::{Email, EmailError};

use crate::config::IdentityConfig;

/// Timeout for verification calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when verifying an identity token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed (network, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The verifier rejected the token (expired, malformed, wrong issuer).
    #[error("token rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The verifier accepted the token but returned no email claim.
    #[error("verified token carries no email claim")]
    MissingEmail,

    /// The email claim is not a usable address.
    #[error("invalid email claim: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// A principal identity confirmed by the external verifier.
///
/// The email is normalized to lowercase; it is the only claim this service
/// trusts.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub email: Email,
}

/// Client for the external identity-token verifier.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a new identity verifier client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }

    /// Verify a bearer token and return the principal it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Rejected`] when the verifier refuses the
    /// token, and transport/decoding variants otherwise.
    pub async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = format!(
            "{}/v1/accounts:lookup?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let lookup: LookupResponse = response.json().await?;
        identity_from_lookup(lookup)
    }
}

/// Account-lookup response from the verifier.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

/// One account in a lookup response.
#[derive(Debug, Deserialize)]
struct LookupUser {
    email: Option<String>,
}

/// Extract the verified principal from a lookup response.
fn identity_from_lookup(lookup: LookupResponse) -> Result<VerifiedIdentity, IdentityError> {
    let email = lookup
        .users
        .into_iter()
        .next()
        .and_then(|u| u.email)
        .ok_or(IdentityError::MissingEmail)?;

    let email = Email::parse(&email)?.normalized();
    Ok(VerifiedIdentity { email })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_lookup_normalizes_email() {
        let lookup = LookupResponse {
            users: vec![LookupUser {
                email: Some("Buyer@Example.COM".to_owned()),
            }],
        };

        let identity = identity_from_lookup(lookup).unwrap();
        assert_eq!(identity.email.as_str(), "buyer@example.com");
    }

    #[test]
    fn test_identity_from_lookup_no_users() {
        let lookup = LookupResponse { users: vec![] };
        assert!(matches!(
            identity_from_lookup(lookup),
            Err(IdentityError::MissingEmail)
        ));
    }

    #[test]
    fn test_identity_from_lookup_user_without_email() {
        let lookup = LookupResponse {
            users: vec![LookupUser { email: None }],
        };
        assert!(matches!(
            identity_from_lookup(lookup),
            Err(IdentityError::MissingEmail)
        ));
    }

    #[test]
    fn test_identity_from_lookup_invalid_email() {
        let lookup = LookupResponse {
            users: vec![LookupUser {
                email: Some("not-an-email".to_owned()),
            }],
        };
        assert!(matches!(
            identity_from_lookup(lookup),
            Err(IdentityError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_lookup_response_tolerates_missing_users_field() {
        let lookup: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(lookup.users.is_empty());
    }
}
