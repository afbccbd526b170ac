//! Tool invocation: gate, execute, respond.
//!
//! One invocation moves `Idle -> Gating -> {Denied, Executing} ->
//! Responded`; this module is the pure part of that machine, a function
//! from (request, campaign snapshot, headers, now) to an outcome carrying
//! the response payloads and at most one notification for the dispatcher
//! to schedule. No IO, no clock access.

use chrono::{DateTime, Utc};

use pricegate_core::eligibility;
use pricegate_core::types::{CampaignSnapshot, Headers};

use crate::protocol::ToolRequest;

// ─── Constants ───────────────────────────────────────────────────────

/// Fixed denial payload text.
pub const NO_PRICING_MESSAGE: &str =
    "We don't have any special pricing available for you at this time.";

/// Logger name stamped on notification payloads.
const NOTIFY_LOGGER: &str = "pricing_service";

pub const TOOL_GET_PRODUCTS: &str = "get-products";
pub const TOOL_GET_DISCOUNT: &str = "get-discount";

// ─── Outcome ─────────────────────────────────────────────────────────

/// Result of one tool invocation: response payloads plus an optional
/// notification to deliver out of band.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub payloads: Vec<serde_json::Value>,
    pub notification: Option<serde_json::Value>,
}

impl ToolOutcome {
    fn respond(payload: serde_json::Value) -> Self {
        Self {
            payloads: vec![payload],
            notification: None,
        }
    }

    fn with_notification(mut self, message: String) -> Self {
        self.notification = Some(serde_json::json!({
            "level": "info",
            "logger": NOTIFY_LOGGER,
            "message": message,
        }));
        self
    }
}

// ─── Invocation ──────────────────────────────────────────────────────

/// Execute one tool invocation against a freshly loaded campaign snapshot.
pub fn invoke(
    request: &ToolRequest,
    campaign: Option<&CampaignSnapshot>,
    headers: &Headers,
    now: DateTime<Utc>,
) -> ToolOutcome {
    // Gating.
    let decision = eligibility::evaluate(campaign, headers, now);
    if let Some(reason) = decision.denial_reason() {
        tracing::info!(reason, tool = %request.name, "pricing request denied");
        return ToolOutcome::respond(serde_json::json!({ "message": NO_PRICING_MESSAGE }))
            .with_notification(format!("Pricing request denied: {reason}"));
    }
    debug_assert!(decision.is_eligible());
    let campaign = campaign.expect("eligible implies a campaign is present");

    // Executing.
    match request.name.as_str() {
        TOOL_GET_PRODUCTS => get_products(campaign),
        TOOL_GET_DISCOUNT => get_discount(campaign, request),
        other => {
            tracing::debug!(tool = other, "unknown tool requested");
            ToolOutcome::respond(serde_json::json!({
                "error": format!("Unknown tool: {other}"),
            }))
        }
    }
}

/// `get-products`: the enriched product list, verbatim.
fn get_products(campaign: &CampaignSnapshot) -> ToolOutcome {
    let count = campaign.detailed_products.len();
    ToolOutcome::respond(serde_json::json!({ "products": campaign.detailed_products }))
        .with_notification(format!("Retrieved {count} products from active campaign"))
}

/// `get-discount`: look the product up by stringwise id, return it with
/// the campaign's first discount code. Lookup misses are structured
/// results, not gating failures, and schedule no notification.
fn get_discount(campaign: &CampaignSnapshot, request: &ToolRequest) -> ToolOutcome {
    let Some(product_id) = string_argument(request, "product_id") else {
        return ToolOutcome::respond(serde_json::json!({
            "error": "Missing required argument: product_id",
        }));
    };

    let Some(product) = campaign
        .detailed_products
        .iter()
        .find(|p| p.id.to_string() == product_id)
    else {
        return ToolOutcome::respond(serde_json::json!({ "error": "Product not found" }));
    };

    // Single-discount-per-response policy: the first available discount
    // applies, independent of which product was asked for.
    let Some(discount) = campaign.detailed_discounts.first() else {
        return ToolOutcome::respond(serde_json::json!({ "error": "No discount available" }));
    };

    let code = discount.code.clone();
    ToolOutcome::respond(serde_json::json!({
        "product": product,
        "discount_code": discount.code,
        "discount_percentage": product.discount_percentage,
    }))
    .with_notification(format!(
        "Retrieved discount for product {product_id}: {code}"
    ))
}

/// Fetch a stringwise argument: JSON strings pass through, numbers are
/// stringified (ids arrive both ways from agent callers).
fn string_argument(request: &ToolRequest, key: &str) -> Option<String> {
    match request.arguments.get(key) {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pricegate_core::types::{
        CampaignStatus, DetailedDiscount, DetailedProduct, DiscountValueType, RuleCondition,
        TargetRule,
    };

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
    }

    fn detailed_product(id: u64) -> DetailedProduct {
        DetailedProduct {
            id,
            title: format!("Product {id}"),
            description: None,
            original_price: 100.0,
            discounted_price: 70.0,
            discount_percentage: 30.0,
            vendor: None,
            product_type: None,
            handle: None,
            status: None,
            inventory_quantity: None,
            image_url: None,
        }
    }

    fn campaign() -> CampaignSnapshot {
        CampaignSnapshot {
            status: CampaignStatus::Active,
            detailed_products: vec![detailed_product(1), detailed_product(2)],
            detailed_discounts: vec![DetailedDiscount {
                id: 7,
                code: "SPRING30".to_string(),
                value_type: DiscountValueType::Percentage,
                value: "-30.0".to_string(),
                title: None,
                starts_at: None,
                ends_at: None,
                usage_count: None,
                target_type: None,
            }],
            ..Default::default()
        }
    }

    fn request(name: &str, arguments: serde_json::Value) -> ToolRequest {
        ToolRequest {
            name: name.to_string(),
            arguments: arguments
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    // ── Gating ──────────────────────────────────────────────────

    #[test]
    fn absent_campaign_denies_with_inactive_reason() {
        let outcome = invoke(
            &request(TOOL_GET_PRODUCTS, serde_json::json!({})),
            None,
            &Headers::new(),
            now(),
        );
        assert_eq!(
            outcome.payloads,
            vec![serde_json::json!({ "message": NO_PRICING_MESSAGE })]
        );
        let notification = outcome.notification.expect("denial notification");
        assert_eq!(
            notification["message"],
            "Pricing request denied: inactive campaign"
        );
    }

    #[test]
    fn targeting_mismatch_denies_with_distinct_reason() {
        let campaign = CampaignSnapshot {
            header_target_rules: vec![TargetRule {
                header_name: "user-agent".to_string(),
                condition: RuleCondition::Contains,
                value: Some("ChatGPT".to_string()),
                negate: false,
            }],
            ..campaign()
        };
        let headers = Headers::from_pairs([("user-agent", "curl/8.0")]);
        let outcome = invoke(
            &request(TOOL_GET_PRODUCTS, serde_json::json!({})),
            Some(&campaign),
            &headers,
            now(),
        );
        let notification = outcome.notification.expect("denial notification");
        assert_eq!(
            notification["message"],
            "Pricing request denied: targeting mismatch"
        );
    }

    // ── get-products ────────────────────────────────────────────

    #[test]
    fn get_products_returns_list_and_count_notification() {
        let campaign = campaign();
        let outcome = invoke(
            &request(TOOL_GET_PRODUCTS, serde_json::json!({})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(outcome.payloads.len(), 1);
        let products = outcome.payloads[0]["products"]
            .as_array()
            .expect("products array");
        assert_eq!(products.len(), 2);
        let notification = outcome.notification.expect("retrieval notification");
        assert_eq!(
            notification["message"],
            "Retrieved 2 products from active campaign"
        );
        assert_eq!(notification["logger"], "pricing_service");
    }

    // ── get-discount ────────────────────────────────────────────

    #[test]
    fn get_discount_returns_product_code_and_percentage() {
        let campaign = campaign();
        let outcome = invoke(
            &request(TOOL_GET_DISCOUNT, serde_json::json!({"product_id": "1"})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        let payload = &outcome.payloads[0];
        assert_eq!(payload["product"]["id"], 1);
        assert_eq!(payload["discount_code"], "SPRING30");
        assert_eq!(payload["discount_percentage"], 30.0);
        assert!(outcome.notification.is_some());
    }

    #[test]
    fn get_discount_accepts_numeric_product_id() {
        let campaign = campaign();
        let outcome = invoke(
            &request(TOOL_GET_DISCOUNT, serde_json::json!({"product_id": 2})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(outcome.payloads[0]["product"]["id"], 2);
    }

    #[test]
    fn get_discount_unknown_product_is_not_found_without_notification() {
        let campaign = campaign();
        let outcome = invoke(
            &request(TOOL_GET_DISCOUNT, serde_json::json!({"product_id": "999"})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(
            outcome.payloads,
            vec![serde_json::json!({ "error": "Product not found" })]
        );
        assert!(outcome.notification.is_none());
    }

    #[test]
    fn get_discount_missing_argument_is_structured_error() {
        let campaign = campaign();
        let outcome = invoke(
            &request(TOOL_GET_DISCOUNT, serde_json::json!({})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(
            outcome.payloads[0]["error"],
            "Missing required argument: product_id"
        );
        assert!(outcome.notification.is_none());
    }

    #[test]
    fn get_discount_without_discounts_reports_none_available() {
        let mut campaign = campaign();
        campaign.detailed_discounts.clear();
        let outcome = invoke(
            &request(TOOL_GET_DISCOUNT, serde_json::json!({"product_id": "1"})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(
            outcome.payloads,
            vec![serde_json::json!({ "error": "No discount available" })]
        );
        assert!(outcome.notification.is_none());
    }

    // ── Unknown tool ────────────────────────────────────────────

    #[test]
    fn unknown_tool_is_structured_error_without_notification() {
        let campaign = campaign();
        let outcome = invoke(
            &request("get-unicorns", serde_json::json!({})),
            Some(&campaign),
            &Headers::new(),
            now(),
        );
        assert_eq!(
            outcome.payloads,
            vec![serde_json::json!({ "error": "Unknown tool: get-unicorns" })]
        );
        assert!(outcome.notification.is_none());
    }
}
