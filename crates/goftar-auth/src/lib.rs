//! # goftar-auth
//!
//! Token Translator for the Goftar Core Bridge.
//!
//! The Core service was built independently and expects a token shape
//! different from the internal one: the kind claim is named `type`, and the
//! tier vocabulary differs from internal plan names. This crate is split
//! into a pure `Identity -> ClaimSet` mapping ([`claims`]) with zero
//! library coupling, and a thin signing layer ([`signer`]) around
//! `jsonwebtoken`.

pub mod claims;
pub mod signer;

pub use claims::{build_claims, map_tier, synthesize_username, ClaimPolicy};
pub use signer::{SignerConfig, TokenSigner};
