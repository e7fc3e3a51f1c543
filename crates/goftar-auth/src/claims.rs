//! Pure identity-to-claims mapping.
//!
//! No I/O, no signing library types: everything here is a total function of
//! its inputs, which is what makes the translation layer trivially testable.

use chrono::{DateTime, Duration, Utc};

use goftar_core::{ClaimSet, Identity, Tier, TokenKind};

/// Policy knobs for claim construction.
///
/// The tier granted to a privileged identity without a subscription is a
/// business policy, not a technical necessity, so it is configurable rather
/// than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct ClaimPolicy {
    /// Tier granted when `is_privileged` is set and no subscription
    /// resolves.
    pub privileged_tier: Tier,
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            privileged_tier: Tier::Enterprise,
        }
    }
}

/// Map a resolved subscription (or its absence) to the remote tier
/// vocabulary.
///
/// Absent or unknown subscriptions fall back to `Free`. A privileged
/// identity without a subscription gets the policy tier instead; an
/// existing subscription always wins over the privilege flag.
pub fn map_tier(tier: Option<Tier>, is_privileged: bool, policy: &ClaimPolicy) -> Tier {
    match tier {
        Some(t) => t,
        None if is_privileged => policy.privileged_tier,
        None => Tier::Free,
    }
}

/// Derive a non-empty username claim.
///
/// Preference order: display name, email local-part, first 8 hex chars of
/// the subject id. Deterministic, so repeated mints agree.
pub fn synthesize_username(identity: &Identity) -> String {
    if let Some(name) = identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        return name.to_string();
    }

    if let Some(local) = identity
        .email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        return local.to_string();
    }

    identity.subject_id.simple().to_string()[..8].to_string()
}

/// Build the full claim set the Core service requires.
///
/// Total by construction: every claim is set for every identity, and `sub`
/// is always the stable local id. Does not touch the identity record.
pub fn build_claims(
    identity: &Identity,
    kind: TokenKind,
    now: DateTime<Utc>,
    ttl: Duration,
    policy: &ClaimPolicy,
) -> ClaimSet {
    ClaimSet {
        sub: identity.subject_id,
        username: synthesize_username(identity),
        email: identity.email.clone(),
        tier: map_tier(identity.tier, identity.is_privileged, policy),
        kind,
        issued_at: now.timestamp(),
        expires_at: (now + ttl).timestamp(),
    }
}
