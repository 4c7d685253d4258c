use anyhow::{Context, Result};
use chrono::{DateTime, Duration as TokenLifetime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::Url;
use std::time::Duration;

use super::types::*;

/// Read-only spreadsheet API client authenticated as a service account
pub struct SheetsClient {
    api_base: String,
    key: ServiceAccountKey,
    scopes: Vec<String>,
    client: Client,
}

impl SheetsClient {
    pub fn new(
        api_base: &str,
        key: ServiceAccountKey,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            key,
            scopes,
            client,
        })
    }

    /// Load a service-account key file (the JSON downloaded from the cloud console)
    pub fn load_key(path: &std::path::Path) -> Result<ServiceAccountKey> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid service-account key in {}", path.display()))
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)
            .with_context(|| format!("Invalid API base URL {}", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL {} cannot take a path", self.api_base))?
            .pop_if_empty()
            .extend(["spreadsheets", spreadsheet_id, "values", range]);
        Ok(url)
    }

    /// Sign the JWT assertion for the token exchange
    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = assertion_claims(&self.key, &self.scopes, now);
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Service-account private key is not a valid RSA PEM")?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("Failed to sign token assertion")
    }

    /// Exchange a signed assertion for a bearer token
    fn access_token(&self) -> Result<String> {
        let assertion = self.assertion(Utc::now())?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .context("Token request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow::anyhow!("Token endpoint error {}: {}", status, body));
        }

        let token: TokenResponse = resp.json().context("Invalid token response")?;
        tracing::debug!(
            "Obtained access token for {} (expires in {:?}s)",
            self.key.client_email,
            token.expires_in
        );
        Ok(token.access_token)
    }

    /// Fetch the cell values of a range
    pub fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let token = self.access_token()?;
        let url = self.values_url(spreadsheet_id, range)?;
        tracing::debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .context("Spreadsheet request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(anyhow::anyhow!("Spreadsheet API error {}: {}", status, body));
        }

        resp.json().context("Invalid spreadsheet response")
    }
}

/// Claims for a one-hour assertion issued at `now`
pub(crate) fn assertion_claims(
    key: &ServiceAccountKey,
    scopes: &[String],
    now: DateTime<Utc>,
) -> AssertionClaims {
    AssertionClaims {
        iss: key.client_email.clone(),
        scope: scopes.join(" "),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + TokenLifetime::hours(1)).timestamp(),
    }
}
