//! # goftar-store
//!
//! Object Stager for the Goftar Core Bridge.
//!
//! User uploads are staged in a content-addressed temporary namespace of an
//! S3-compatible bucket; the Core service fetches the bytes itself via the
//! shared store. Staged objects carry a fixed retention window and are
//! removed by [`cleanup`], not by store-native lifecycle rules.

pub mod cleanup;
pub mod stager;

pub use cleanup::{partition_expired, ObjectSummary, PurgeConfirmation};
pub use stager::{ObjectStager, StagerConfig};
