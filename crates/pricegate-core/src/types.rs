use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ─── Campaign Status ──────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Targeting Rules ──────────────────────────────────────────────

/// Comparison operator for a header targeting rule.
///
/// Unrecognized strings deserialize to [`RuleCondition::Unknown`], which
/// never matches; eligibility is not granted on a rule we cannot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleCondition {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Exists,
    NotExists,
    #[serde(other)]
    Unknown,
}

impl RuleCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Matches => "matches",
            Self::Exists => "exists",
            Self::NotExists => "notExists",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single header-based predicate contributing to an AND-aggregated
/// eligibility decision. Rules are stateless and evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRule {
    pub header_name: String,
    pub condition: RuleCondition,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub negate: bool,
}

// ─── Headers ──────────────────────────────────────────────────────

/// The normalized request header map.
///
/// Constructed once at the transport boundary and passed explicitly through
/// the call chain. Keys are folded to lowercase on insertion, so lookups are
/// case-insensitive by construction. Deliberately not deserializable: the
/// only way in is through [`Headers::from_pairs`] / [`Headers::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Build a header map from raw (name, value) pairs, folding names.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value.into());
        }
        headers
    }

    pub fn insert(&mut self, name: &str, value: String) {
        self.0.insert(name.to_ascii_lowercase(), value);
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ─── Catalog Records ──────────────────────────────────────────────

/// Raw product record as fetched from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Decimal string, e.g. `"100.00"`.
    pub price: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountValueType {
    Percentage,
    FixedAmount,
    /// Value types we do not price (e.g. shipping adjustments).
    #[default]
    #[serde(other)]
    Other,
}

/// Raw discount record as fetched from the catalog.
///
/// `value` is a signed decimal string: `"-30.0"` means 30% off for a
/// percentage discount, 30 currency units off for a fixed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: u64,
    pub code: String,
    pub value_type: DiscountValueType,
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub usage_count: Option<u64>,
    #[serde(default)]
    pub target_type: Option<String>,
}

// ─── Enriched Views ───────────────────────────────────────────────

/// Product with derived pricing, produced by the enrichment transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub original_price: f64,
    pub discounted_price: f64,
    pub discount_percentage: f64,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedDiscount {
    pub id: u64,
    pub code: String,
    pub value_type: DiscountValueType,
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub usage_count: Option<u64>,
    #[serde(default)]
    pub target_type: Option<String>,
}

// ─── Campaign ─────────────────────────────────────────────────────

/// Raw campaign as submitted by an operator, before enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 instants, optionally with a trailing `Z`. Kept as strings;
    /// parsed at evaluation time so a malformed bound degrades per-check.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub product_ids: Vec<u64>,
    #[serde(default)]
    pub discount_ids: Vec<u64>,
    #[serde(default, alias = "headerTargetRules")]
    pub header_target_rules: Vec<TargetRule>,
}

/// The enriched, stored view of the single current campaign.
///
/// Immutable per request: the serving path loads a fresh snapshot for every
/// gating decision and never writes it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub product_ids: Vec<u64>,
    #[serde(default)]
    pub discount_ids: Vec<u64>,
    #[serde(default, alias = "headerTargetRules")]
    pub header_target_rules: Vec<TargetRule>,
    #[serde(default)]
    pub detailed_products: Vec<DetailedProduct>,
    #[serde(default)]
    pub detailed_discounts: Vec<DetailedDiscount>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ─── Tests ────────────────────────────────────────────────────────
