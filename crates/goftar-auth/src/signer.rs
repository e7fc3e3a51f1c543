//! JWT signing for Core-bound tokens.
//!
//! The encoding key is built once at startup; a missing secret is a fatal
//! configuration error, never a per-request failure.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use goftar_core::{defaults, ClaimSet, Error, Identity, Result, Tier, TokenKind};

use crate::claims::{build_claims, ClaimPolicy};

/// Configuration for the token signer.
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// HMAC signing secret shared with the Core service.
    pub secret: String,
    /// Access-token lifetime in seconds.
    pub access_ttl_secs: u64,
    /// Refresh-token lifetime in seconds.
    pub refresh_ttl_secs: u64,
    /// Tier granted to privileged identities without a subscription.
    pub privileged_tier: Tier,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl_secs: defaults::ACCESS_TTL_SECS,
            refresh_ttl_secs: defaults::REFRESH_TTL_SECS,
            privileged_tier: Tier::Enterprise,
        }
    }
}

impl SignerConfig {
    /// Create a config with the given secret and default lifetimes.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CORE_TOKEN_SECRET` | — | HMAC secret (required) |
    /// | `CORE_ACCESS_TTL_SECS` | `900` | Access-token lifetime |
    /// | `CORE_REFRESH_TTL_SECS` | `604800` | Refresh-token lifetime |
    /// | `CORE_PRIVILEGED_TIER` | `enterprise` | Tier for privileged unsubscribed identities |
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("CORE_TOKEN_SECRET").unwrap_or_default(),
            access_ttl_secs: std::env::var("CORE_ACCESS_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::ACCESS_TTL_SECS),
            refresh_ttl_secs: std::env::var("CORE_REFRESH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::REFRESH_TTL_SECS),
            privileged_tier: std::env::var("CORE_PRIVILEGED_TIER")
                .map(|v| Tier::from_plan_name(&v))
                .unwrap_or(Tier::Enterprise),
        }
    }
}

/// Wire claims in the exact shape the Core service validates.
///
/// The kind claim is named `type` on the wire; internally it stays `kind`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WireClaims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub tier: Tier,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl From<&ClaimSet> for WireClaims {
    fn from(c: &ClaimSet) -> Self {
        Self {
            sub: c.sub.to_string(),
            username: c.username.clone(),
            email: c.email.clone(),
            tier: c.tier,
            kind: c.kind,
            iat: c.issued_at,
            exp: c.expires_at,
        }
    }
}

/// Mints Core-bound JWTs from local identities.
///
/// The key is process-wide and read-only after construction; minting is
/// pure beyond the signature and never mutates the identity record.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    config: SignerConfig,
    policy: ClaimPolicy,
}

impl TokenSigner {
    /// Build a signer from configuration. Fails with `Error::Config` when
    /// the secret is missing, so a misconfigured process refuses to boot
    /// instead of failing on every request.
    pub fn new(config: SignerConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(Error::Config(
                "CORE_TOKEN_SECRET is not set; refusing to mint unsigned tokens".to_string(),
            ));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let policy = ClaimPolicy {
            privileged_tier: config.privileged_tier,
        };

        Ok(Self {
            encoding_key,
            config,
            policy,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Build the claim set for an identity without signing it.
    pub fn claims_for(&self, identity: &Identity, kind: TokenKind) -> ClaimSet {
        let ttl = match kind {
            TokenKind::Access => Duration::seconds(self.config.access_ttl_secs as i64),
            TokenKind::Refresh => Duration::seconds(self.config.refresh_ttl_secs as i64),
        };
        build_claims(identity, kind, Utc::now(), ttl, &self.policy)
    }

    /// Mint a signed token for the identity.
    pub fn mint(&self, identity: &Identity, kind: TokenKind) -> Result<String> {
        let claims = self.claims_for(identity, kind);
        let wire = WireClaims::from(&claims);

        let token = encode(&Header::default(), &wire, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("JWT encoding failed: {}", e)))?;

        debug!(
            subsystem = "auth",
            component = "signer",
            op = "mint",
            sub = %claims.sub,
            tier = %claims.tier,
            kind = kind.as_str(),
            "Minted Core token"
        );

        Ok(token)
    }
}
