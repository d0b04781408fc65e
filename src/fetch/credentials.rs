//! Google service-account credentials.
//!
//! The key blob is the JSON file downloaded from the Cloud console. It is
//! exchanged for a short-lived OAuth access token by signing a JWT bearer
//! assertion with the account's RSA private key.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::SheetsError;

/// Read-only scopes: Drive to find the spreadsheet by title, Sheets to read it.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// Assertion lifetime accepted by Google's token endpoint.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service-account key material.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,

    pub private_key: String,

    #[serde(default)]
    pub private_key_id: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Claims of the JWT bearer assertion.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON blob.
    pub fn from_json(blob: &str) -> Result<Self, SheetsError> {
        let key: ServiceAccountKey = serde_json::from_str(blob)
            .map_err(|e| SheetsError::InvalidKey(e.to_string()))?;

        if key.client_email.trim().is_empty() {
            return Err(SheetsError::InvalidKey("client_email is empty".to_string()));
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err(SheetsError::InvalidKey(
                "private_key is not a PEM encoded key".to_string(),
            ));
        }

        Ok(key)
    }

    /// Build the signed assertion posted to the token endpoint.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Response body of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub token_type: Option<String>,
}
