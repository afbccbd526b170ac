//! Header targeting: evaluates one rule against the normalized header map.
//!
//! Failure policy is fail-closed: an unknown condition or an invalid regex
//! pattern evaluates to `false` (before negation) and is logged, never
//! surfaced to the caller.

use regex::Regex;

use crate::types::{Headers, RuleCondition, TargetRule};

/// Evaluate a single targeting rule against the request headers.
///
/// Header lookup is case-insensitive (the [`Headers`] map folds keys).
/// `exists`/`notExists` look at presence alone; the value-comparing
/// conditions treat a missing header as a non-match. `negate` is applied
/// last, inverting whatever was computed.
pub fn matches_rule(rule: &TargetRule, headers: &Headers) -> bool {
    let value = rule.value.as_deref().unwrap_or("");
    let header_value = headers.get(&rule.header_name);

    let result = match rule.condition {
        RuleCondition::Exists => header_value.is_some(),
        RuleCondition::NotExists => header_value.is_none(),
        RuleCondition::Equals => header_value.is_some_and(|hv| hv == value),
        RuleCondition::Contains => header_value.is_some_and(|hv| hv.contains(value)),
        RuleCondition::StartsWith => header_value.is_some_and(|hv| hv.starts_with(value)),
        RuleCondition::EndsWith => header_value.is_some_and(|hv| hv.ends_with(value)),
        RuleCondition::Matches => header_value.is_some_and(|hv| regex_search(value, hv)),
        RuleCondition::Unknown => {
            tracing::warn!(header = %rule.header_name, "unknown rule condition, treating as non-match");
            false
        }
    };

    if rule.negate { !result } else { result }
}

/// AND-aggregate all rules, short-circuiting on the first non-match.
///
/// An empty rule list matches: a campaign with no targeting applies to
/// every caller.
pub fn matches_all(rules: &[TargetRule], headers: &Headers) -> bool {
    for rule in rules {
        if !matches_rule(rule, headers) {
            tracing::debug!(
                header = %rule.header_name,
                condition = %rule.condition,
                "targeting rule not matched"
            );
            return false;
        }
    }
    true
}

/// Unanchored regex search. An invalid pattern is a non-match, not an error.
fn regex_search(pattern: &str, haystack: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(haystack),
        Err(e) => {
            tracing::warn!("invalid targeting regex {pattern:?}: {e}");
            false
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
