//! HTTP client for the external cart service.

use openkart_core::{CartVersion, CurrencyCode, ExternalCartId};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::instrument;

use crate::config::CommerceConfig;

use super::types::{CartAction, CartDraft, CartUpdate, CreatedCart, ExternalCart};
use super::{CommerceCartApi, CommerceError};

/// Fixed timeout applied to every call against the external service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the external commerce-cloud cart API.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference-counted.
#[derive(Clone)]
pub struct CartClient {
    client: reqwest::Client,
    base_url: String,
    project_key: String,
}

impl CartClient {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Config`] if the API token is not a valid
    /// header value, or [`CommerceError::Transport`] if the HTTP client
    /// fails to build.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| CommerceError::Config(format!("invalid API token: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT);

        // Certificate validation stays on unless a test environment opted
        // out via configuration.
        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            project_key: config.project_key.clone(),
        })
    }

    /// URL of the carts collection: `{base_url}/{project_key}/carts/`.
    fn carts_url(&self) -> String {
        format!("{}/{}/carts/", self.base_url, self.project_key)
    }

    /// URL of a single cart: `{base_url}/{project_key}/carts/{cart_id}`.
    fn cart_url(&self, cart_id: &ExternalCartId) -> String {
        format!("{}/{}/carts/{}", self.base_url, self.project_key, cart_id)
    }

    /// Read the response body and parse it, keeping a body snippet around
    /// for diagnostics on parse failures.
    async fn parse_body<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CommerceError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    /// Map a non-success response to the error taxonomy.
    async fn error_for_status(
        response: reqwest::Response,
        cart_id: &ExternalCartId,
        supplied: Option<CartVersion>,
    ) -> CommerceError {
        let status = response.status();
        match (status, supplied) {
            (StatusCode::NOT_FOUND, _) => CommerceError::NotFound(cart_id.to_string()),
            (StatusCode::CONFLICT, Some(version)) => CommerceError::Conflict {
                cart_id: cart_id.to_string(),
                supplied: version,
            },
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(500)
                    .collect();
                CommerceError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

impl CommerceCartApi for CartClient {
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn fetch_cart(&self, cart_id: &ExternalCartId) -> Result<ExternalCart, CommerceError> {
        let response = self.client.get(self.cart_url(cart_id)).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response, cart_id, None).await);
        }

        Self::parse_body(response).await
    }

    #[instrument(skip(self))]
    async fn create_anonymous_cart(
        &self,
        currency: CurrencyCode,
        anonymous_token: &str,
    ) -> Result<CreatedCart, CommerceError> {
        let draft = CartDraft {
            currency,
            anonymous_id: anonymous_token.to_owned(),
        };

        let response = self
            .client
            .post(self.carts_url())
            .json(&draft)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(500)
                .collect();
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Self::parse_body(response).await
    }

    #[instrument(skip(self, action), fields(cart_id = %cart_id, version = %version))]
    async fn apply_action(
        &self,
        cart_id: &ExternalCartId,
        version: CartVersion,
        action: CartAction,
    ) -> Result<ExternalCart, CommerceError> {
        let update = CartUpdate {
            version,
            actions: vec![action],
        };

        let response = self
            .client
            .post(self.cart_url(cart_id))
            .json(&update)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response, cart_id, Some(version)).await);
        }

        Self::parse_body(response).await
    }
}
