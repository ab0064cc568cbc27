// SPDX-License-Identifier: GPL-3.0-only

//! Cart handoff from the try-on screen
//!
//! Forwards the bound product and its locked color to the cart. The result
//! is a transient [`Notification`]; session state is never touched.

use crate::backends::commerce::{AuthProvider, CartClient, CartItem};
use crate::constants::{cart, notifications};
use crate::errors::CartError;
use crate::session::BoundProduct;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Short-lived user message
#[derive(Debug, Clone)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    created_at: Instant,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= notifications::TTL
    }
}

pub struct CartHandoff {
    cart: Arc<dyn CartClient>,
    auth: Arc<dyn AuthProvider>,
}

impl CartHandoff {
    pub fn new(cart: Arc<dyn CartClient>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { cart, auth }
    }

    pub async fn add_bound_product_to_cart(&self, product: Option<&BoundProduct>) -> Notification {
        let Some(product) = product else {
            warn!("Cart handoff without a bound product");
            return Notification::new(Severity::Warning, CartError::NotBound.to_string());
        };

        if !self.auth.is_authenticated() {
            warn!(product_id = %product.id, "Cart handoff requires sign-in");
            return Notification::new(Severity::Warning, CartError::NotAuthenticated.to_string());
        }

        let item = CartItem {
            product_id: product.id.clone(),
            quantity: cart::HANDOFF_QUANTITY,
            color: product.locked_color.to_hex(),
        };
        if let Err(e) = item.validate() {
            warn!(product_id = %item.product_id, "Refusing malformed product id");
            return Notification::new(Severity::Error, e.to_string());
        }

        match self.cart.add_item(&item).await {
            Ok(()) => {
                info!(product_id = %item.product_id, color = %item.color, "Added to cart");
                Notification::new(Severity::Success, "Added to cart")
            }
            Err(e) => {
                warn!(product_id = %item.product_id, error = %e, "Add to cart failed");
                Notification::new(
                    Severity::Error,
                    "Something went wrong while adding to the cart",
                )
            }
        }
    }
}
