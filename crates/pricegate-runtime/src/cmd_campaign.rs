//! Campaign admin subcommands: set (enrich + store), show, clear.
//!
//! `set` runs the full enrichment pipeline: read the operator's draft,
//! resolve its product and discount selections against the catalog, and
//! persist the enriched snapshot the serving path will load.

use std::path::Path;

use anyhow::Context;

use pricegate_core::enrich::enrich_campaign;
use pricegate_core::types::CampaignDraft;
use pricegate_store::{CampaignStore, JsonCatalog, ProductCatalog};

use crate::cli::CampaignCmd;

pub fn run(data_dir: &str, cmd: CampaignCmd) -> anyhow::Result<()> {
    let store = CampaignStore::open(Path::new(data_dir).join("campaign.json"))
        .with_context(|| format!("campaign store unusable under {data_dir:?}"))?;

    match cmd {
        CampaignCmd::Set { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read campaign draft {file:?}"))?;
            let draft: CampaignDraft =
                serde_json::from_str(&raw).context("malformed campaign draft")?;

            let catalog = JsonCatalog::new(Path::new(data_dir).join("catalog.json"));
            let products = catalog
                .products()
                .with_context(|| format!("catalog unreadable at {}", catalog.path().display()))?;
            let discounts = catalog.discounts()?;

            let snapshot = enrich_campaign(&draft, &products, &discounts);
            let saved = store.save(snapshot)?;
            println!(
                "campaign {:?} saved ({} products, {} discounts, status {})",
                saved.name,
                saved.detailed_products.len(),
                saved.detailed_discounts.len(),
                saved.status,
            );
        }
        CampaignCmd::Show => match store.load()? {
            Some(campaign) => println!("{}", serde_json::to_string_pretty(&campaign)?),
            None => println!("no campaign configured"),
        },
        CampaignCmd::Clear => {
            store.clear()?;
            println!("campaign cleared");
        }
    }

    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────
