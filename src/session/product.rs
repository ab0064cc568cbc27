// SPDX-License-Identifier: GPL-3.0-only

//! Product binding
//!
//! A try-on launched from a product page arrives with an inbound bundle
//! (`product_id`, `locked_color`, `category`). The category is mapped to the
//! region the product governs through [`CategoryRules`], which is plain
//! configuration data so the catalog taxonomy can change without code.

use super::parameters::{Region, Rgb};
use crate::errors::BindingError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inbound parameters produced by a product page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductBinding {
    pub product_id: String,
    pub locked_color: String,
    pub category: String,
}

/// A catalog product constraining the session to one fixed color/region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundProduct {
    pub id: String,
    pub locked_region: Region,
    pub locked_color: Rgb,
}

impl BoundProduct {
    /// Resolve an inbound bundle against the category rules
    pub fn resolve(binding: &ProductBinding, rules: &CategoryRules) -> Result<Self, BindingError> {
        let locked_region = rules
            .region_for(&binding.category)
            .ok_or_else(|| BindingError::UnknownCategory(binding.category.clone()))?;

        let locked_color = Rgb::parse_hex(&binding.locked_color)
            .map_err(|_| BindingError::InvalidColor(binding.locked_color.clone()))?;

        Ok(Self {
            id: binding.product_id.clone(),
            locked_region,
            locked_color,
        })
    }
}

/// One category label pattern and the region it governs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    pub region: Region,
}

impl CategoryRule {
    pub fn new(pattern: impl Into<String>, region: Region) -> Self {
        Self {
            pattern: pattern.into(),
            region,
        }
    }

    /// Case-insensitive containment after trimming, so "Blush Palette"
    /// matches the "blush" rule
    fn matches(&self, normalized_category: &str) -> bool {
        let pattern = self.pattern.trim().to_lowercase();
        !pattern.is_empty() && normalized_category.contains(&pattern)
    }
}

/// Ordered category rules; the first match wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRules(Vec<CategoryRule>);

impl CategoryRules {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.0
    }

    pub fn region_for(&self, category: &str) -> Option<Region> {
        let normalized = category.trim().to_lowercase();
        let region = self
            .0
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.region);

        debug!(category, ?region, "Resolved product category");
        region
    }
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self(vec![
            CategoryRule::new("son môi", Region::Lips),
            CategoryRule::new("lipstick", Region::Lips),
            CategoryRule::new("má hồng", Region::Cheeks),
            CategoryRule::new("blush", Region::Cheeks),
        ])
    }
}
