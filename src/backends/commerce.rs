// SPDX-License-Identifier: GPL-3.0-only

//! Storefront collaborators used by the cart handoff
//!
//! Only two capabilities are consumed: "is someone signed in" and "add this
//! item to the cart". Both live outside the try-on core.

use crate::constants::{app_info, cart};
use crate::errors::CartError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authentication state of the current user
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Token sent with cart calls, if any
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed credentials, used by the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    token: Option<String>,
}

impl StaticAuth {
    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// One line item forwarded to the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    pub color: String,
}

impl CartItem {
    /// Reject ids the catalog could never have issued
    pub fn validate(&self) -> Result<(), CartError> {
        let id = &self.product_id;
        if id.len() == cart::PRODUCT_ID_LEN && id.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(())
        } else {
            Err(CartError::InvalidProductId(id.clone()))
        }
    }
}

#[async_trait]
pub trait CartClient: Send + Sync {
    async fn add_item(&self, item: &CartItem) -> Result<(), CartError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Cart client speaking the storefront JSON API
pub struct HttpCartClient {
    client: Client,
    endpoint: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpCartClient {
    pub fn new(base_url: &str, auth: Arc<dyn AuthProvider>) -> Self {
        let client = Client::builder()
            .user_agent(app_info::user_agent())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), cart::ADD_PATH),
            auth,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CartClient for HttpCartClient {
    async fn add_item(&self, item: &CartItem) -> Result<(), CartError> {
        let token = self.auth.bearer_token().ok_or(CartError::NotAuthenticated)?;
        item.validate()?;
        debug!(product_id = %item.product_id, endpoint = %self.endpoint, "Adding item to cart");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", token))
            .json(item)
            .send()
            .await
            .map_err(|e| CartError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|parsed| parsed.detail)
                .unwrap_or(body);
            return Err(CartError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}
