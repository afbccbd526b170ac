//! Eligibility gating: activation-window check plus AND-aggregated header
//! targeting over the current campaign snapshot.
//!
//! Pure and clock-free; callers pass `now` in. Status and window logic
//! fails closed; a malformed date bound fails open (the bound is skipped,
//! the other checks still apply).

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::targeting::matches_all;
use crate::types::{CampaignSnapshot, CampaignStatus, Headers};

// ─── Decision ─────────────────────────────────────────────────────

/// Outcome of a gating decision for one request.
///
/// The two denial reasons are distinguishable so that the denial
/// notification can report them differently. When both would apply,
/// the inactive campaign is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityDecision {
    Eligible,
    InactiveCampaign,
    TargetingMismatch,
}

impl EligibilityDecision {
    pub fn is_eligible(self) -> bool {
        self == Self::Eligible
    }

    /// Human-readable denial reason for the notification body.
    pub fn denial_reason(self) -> Option<&'static str> {
        match self {
            Self::Eligible => None,
            Self::InactiveCampaign => Some("inactive campaign"),
            Self::TargetingMismatch => Some("targeting mismatch"),
        }
    }
}

// ─── Evaluation ───────────────────────────────────────────────────

/// Gate one request: activation window first, then targeting rules.
///
/// An absent campaign (nothing configured, or the store was unreadable)
/// is an inactive campaign; the caller gets the standard denial.
pub fn evaluate(
    campaign: Option<&CampaignSnapshot>,
    headers: &Headers,
    now: DateTime<Utc>,
) -> EligibilityDecision {
    let Some(campaign) = campaign else {
        return EligibilityDecision::InactiveCampaign;
    };

    if !campaign_active(campaign, now) {
        return EligibilityDecision::InactiveCampaign;
    }

    if !matches_all(&campaign.header_target_rules, headers) {
        return EligibilityDecision::TargetingMismatch;
    }

    EligibilityDecision::Eligible
}

/// Is the campaign active at `now`, by status and date window?
pub fn campaign_active(campaign: &CampaignSnapshot, now: DateTime<Utc>) -> bool {
    if campaign.status != CampaignStatus::Active {
        return false;
    }

    if let Some(start) = campaign.start_date.as_deref().and_then(parse_bound) {
        if now < start {
            tracing::debug!(%now, %start, "campaign not started yet");
            return false;
        }
    }

    if let Some(end) = campaign.end_date.as_deref().and_then(parse_bound) {
        if now > end {
            tracing::debug!(%now, %end, "campaign already ended");
            return false;
        }
    }

    true
}

/// Parse a window bound: RFC3339 (trailing `Z` or explicit offset), with a
/// naive-timestamp fallback taken as UTC. Malformed strings are logged and
/// skipped: the bound is treated as absent rather than failing the check.
fn parse_bound(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    tracing::warn!("invalid campaign date {raw:?}, skipping bound");
    None
}

// ─── Tests ────────────────────────────────────────────────────────
