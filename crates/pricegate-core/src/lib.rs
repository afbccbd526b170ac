//! pricegate-core: campaign model, header targeting, eligibility gating,
//! and the catalog enrichment transform.
//!
//! Pure domain logic: no IO, no clock access. Callers pass `now` in.

pub mod eligibility;
pub mod enrich;
pub mod targeting;
pub mod types;
