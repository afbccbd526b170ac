//! Single-campaign document store: load/save of one JSON document.
//!
//! The document shape is `{"campaign": {...}}`; an empty object means no
//! campaign is configured. The serving path re-reads the document on every
//! gating decision, so an operator edit takes effect on the next request.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use pricegate_core::types::CampaignSnapshot;

use crate::error::StoreError;

// ─── Constants ───────────────────────────────────────────────────────

/// Fixed id of the single campaign document.
const CURRENT_CAMPAIGN_ID: &str = "current_campaign";

// ─── Document ────────────────────────────────────────────────────────

/// On-disk wrapper around the campaign.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CampaignDocument {
    #[serde(default)]
    campaign: serde_json::Value,
}

// ─── Store ───────────────────────────────────────────────────────────

/// File-backed store for the single current campaign.
#[derive(Debug, Clone)]
pub struct CampaignStore {
    path: PathBuf,
}

impl CampaignStore {
    /// Create a store at `path`, ensuring the parent directory and an
    /// empty document exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { path: path.into() };
        store.ensure_file()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_file(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        if !self.path.exists() {
            self.write_document(&CampaignDocument {
                campaign: serde_json::json!({}),
            })?;
        }
        Ok(())
    }

    /// Load the current campaign. A missing file or empty document is
    /// `None`; an unreadable or corrupt file is an error for the caller
    /// to degrade on (the serving path treats it as "no pricing").
    pub fn load(&self) -> Result<Option<CampaignSnapshot>, StoreError> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "campaign file not found");
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let document: CampaignDocument = serde_json::from_str(&raw)?;

        match &document.campaign {
            serde_json::Value::Object(map) if !map.is_empty() => {
                let snapshot: CampaignSnapshot = serde_json::from_value(document.campaign)?;
                Ok(Some(snapshot))
            }
            _ => Ok(None),
        }
    }

    /// Save a campaign as the single current document, fixing its id and
    /// stamping timestamps. `created_at` is preserved from any existing
    /// document; `updated_at` is always refreshed.
    pub fn save(&self, mut campaign: CampaignSnapshot) -> Result<CampaignSnapshot, StoreError> {
        let now = Utc::now();
        campaign.id = Some(CURRENT_CAMPAIGN_ID.to_string());
        campaign.created_at = self
            .load()
            .ok()
            .flatten()
            .and_then(|existing| existing.created_at)
            .or(Some(now));
        campaign.updated_at = Some(now);

        self.write_document(&CampaignDocument {
            campaign: serde_json::to_value(&campaign)?,
        })?;
        Ok(campaign)
    }

    /// Clear the campaign by writing the empty document back.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.write_document(&CampaignDocument {
            campaign: serde_json::json!({}),
        })
    }

    fn write_document(&self, document: &CampaignDocument) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pricegate_core::types::CampaignStatus;

    fn store_in(dir: &tempfile::TempDir) -> CampaignStore {
        CampaignStore::open(dir.path().join("campaign.json")).expect("open store")
    }

    fn campaign(name: &str) -> CampaignSnapshot {
        CampaignSnapshot {
            name: name.to_string(),
            status: CampaignStatus::Active,
            ..Default::default()
        }
    }

    #[test]
    fn open_creates_empty_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.path().exists());
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn save_then_load_roundtrips_with_fixed_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let saved = store.save(campaign("spring sale")).expect("save");
        assert_eq!(saved.id.as_deref(), Some("current_campaign"));
        assert!(saved.created_at.is_some());
        assert!(saved.updated_at.is_some());

        let loaded = store.load().expect("load").expect("some campaign");
        assert_eq!(loaded.name, "spring sale");
        assert_eq!(loaded.status, CampaignStatus::Active);
        assert_eq!(loaded.id.as_deref(), Some("current_campaign"));
    }

    #[test]
    fn save_preserves_created_at_across_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let first = store.save(campaign("v1")).expect("save v1");
        let second = store.save(campaign("v2")).expect("save v2");

        assert_eq!(second.created_at, first.created_at);
        let loaded = store.load().expect("load").expect("some campaign");
        assert_eq!(loaded.name, "v2");
    }

    #[test]
    fn clear_resets_to_no_campaign() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(campaign("spring sale")).expect("save");
        store.clear().expect("clear");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::remove_file(store.path()).expect("remove");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").expect("write");
        assert!(store.load().is_err());
    }
}
