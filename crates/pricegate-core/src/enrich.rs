//! Catalog enrichment: the pure transform from a raw campaign draft plus
//! catalog records to the enriched snapshot the serving path reads.
//!
//! Two-stage model: the draft carries id selections; enrichment resolves
//! them against the catalog and derives per-product pricing. The transform
//! holds no state and performs no IO.

use crate::types::{
    CampaignDraft, CampaignSnapshot, DetailedDiscount, DetailedProduct, Discount,
    DiscountValueType, Product,
};

// ─── Price Arithmetic ─────────────────────────────────────────────

/// Derived pricing for one product under one discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceAdjustment {
    pub discounted_price: f64,
    pub discount_percentage: f64,
}

impl PriceAdjustment {
    fn unchanged(original_price: f64) -> Self {
        Self {
            discounted_price: original_price,
            discount_percentage: 0.0,
        }
    }
}

/// Apply one discount to an original price.
///
/// Stored values are signed decimal strings (`"-30.0"` = 30 off); a
/// positive value is normalized to negative before applying. Percentage
/// discounts scale the price, fixed amounts subtract and floor at zero.
/// Value types we do not price, and unparseable values, leave the price
/// unchanged.
pub fn apply_discount(original_price: f64, discount: &Discount) -> PriceAdjustment {
    let value: f64 = match discount.value.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(
                code = %discount.code,
                value = %discount.value,
                "unparseable discount value, leaving price unchanged"
            );
            return PriceAdjustment::unchanged(original_price);
        }
    };
    let value = if value > 0.0 { -value } else { value };

    match discount.value_type {
        DiscountValueType::Percentage => PriceAdjustment {
            discounted_price: round2(original_price * (1.0 + value / 100.0)),
            discount_percentage: round2(value.abs()),
        },
        DiscountValueType::FixedAmount => {
            let discounted = (original_price + value).max(0.0);
            let percentage = if original_price > 0.0 {
                (value / original_price * 100.0).abs()
            } else {
                0.0
            };
            PriceAdjustment {
                discounted_price: round2(discounted),
                discount_percentage: round2(percentage),
            }
        }
        DiscountValueType::Other => PriceAdjustment::unchanged(original_price),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ─── Campaign Enrichment ──────────────────────────────────────────

/// Build the enriched snapshot for a draft against catalog records.
///
/// Products are resolved by id in draft order; a product whose price string
/// fails to parse is skipped and logged. The first of the campaign's
/// discounts (in catalog order) prices every selected product, the same
/// single-discount policy the query side applies. Timestamps and the fixed
/// document id are stamped by the store on save, not here.
pub fn enrich_campaign(
    draft: &CampaignDraft,
    products: &[Product],
    discounts: &[Discount],
) -> CampaignSnapshot {
    let detailed_discounts: Vec<DetailedDiscount> = discounts
        .iter()
        .filter(|d| draft.discount_ids.contains(&d.id))
        .map(to_detailed_discount)
        .collect();

    let applied_discount = discounts
        .iter()
        .find(|d| draft.discount_ids.contains(&d.id));

    let mut detailed_products = Vec::with_capacity(draft.product_ids.len());
    for product_id in &draft.product_ids {
        let Some(product) = products.iter().find(|p| p.id == *product_id) else {
            tracing::warn!(product_id, "campaign references unknown product, skipping");
            continue;
        };
        let original_price: f64 = match product.price.parse() {
            Ok(p) => p,
            Err(_) => {
                tracing::warn!(
                    product_id,
                    price = %product.price,
                    "unparseable product price, skipping product"
                );
                continue;
            }
        };
        let adjustment = match applied_discount {
            Some(discount) => apply_discount(original_price, discount),
            None => PriceAdjustment::unchanged(original_price),
        };
        detailed_products.push(DetailedProduct {
            id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            original_price,
            discounted_price: adjustment.discounted_price,
            discount_percentage: adjustment.discount_percentage,
            vendor: product.vendor.clone(),
            product_type: product.product_type.clone(),
            handle: product.handle.clone(),
            status: product.status.clone(),
            inventory_quantity: product.inventory_quantity,
            image_url: product.image_url.clone(),
        });
    }

    CampaignSnapshot {
        id: None,
        name: draft.name.clone(),
        description: draft.description.clone(),
        start_date: draft.start_date.clone(),
        end_date: draft.end_date.clone(),
        status: draft.status,
        product_ids: draft.product_ids.clone(),
        discount_ids: draft.discount_ids.clone(),
        header_target_rules: draft.header_target_rules.clone(),
        detailed_products,
        detailed_discounts,
        created_at: None,
        updated_at: None,
    }
}

fn to_detailed_discount(discount: &Discount) -> DetailedDiscount {
    DetailedDiscount {
        id: discount.id,
        code: discount.code.clone(),
        value_type: discount.value_type,
        value: discount.value.clone(),
        title: discount.title.clone(),
        starts_at: discount.starts_at.clone(),
        ends_at: discount.ends_at.clone(),
        usage_count: discount.usage_count,
        target_type: discount.target_type.clone(),
    }
}

// ─── Tests ────────────────────────────────────────────────────────
