//! Centralized default constants for the Goftar Core Bridge.
//!
//! **This module is the single source of truth** for all shared default
//! values. Bridge crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// QUERY LIMITS
// =============================================================================

/// Maximum file references attached to a single query.
pub const MAX_QUERY_FILES: usize = 5;

/// Maximum size of a single staged file in bytes (20 MiB).
pub const MAX_FILE_BYTES: i64 = 20 * 1024 * 1024;

// =============================================================================
// TOKENS
// =============================================================================

/// Access-token lifetime in seconds (15 minutes).
pub const ACCESS_TTL_SECS: u64 = 900;

/// Refresh-token lifetime in seconds (7 days).
pub const REFRESH_TTL_SECS: u64 = 7 * 24 * 3600;

// =============================================================================
// STAGING
// =============================================================================

/// Retention window for staged uploads before the sweep removes them.
pub const STAGED_RETENTION_HOURS: i64 = 24;

/// Default lifetime of a presigned read URL in seconds.
pub const PRESIGN_TTL_SECS: u64 = 3600;

/// Key prefix for the temporary staging namespace.
pub const STAGING_PREFIX: &str = "staging/";

// =============================================================================
// CORE SERVICE TIMEOUTS
// =============================================================================

/// Buffered query timeout in seconds. Long, because one answer may involve
/// retrieval plus generation latency.
pub const QUERY_TIMEOUT_SECS: u64 = 300;

/// Maximum silence between streamed chunks before the stream is treated as
/// interrupted.
pub const STREAM_IDLE_TIMEOUT_SECS: u64 = 60;

/// Overall ceiling for one streamed response.
pub const STREAM_TOTAL_TIMEOUT_SECS: u64 = 600;

/// Capacity of the bounded channel between the upstream reader task and the
/// caller-facing stream.
pub const STREAM_CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Interval between reconciliation sweeps in seconds.
pub const RECONCILE_INTERVAL_SECS: u64 = 3600;

/// Interval between staged-object cleanup sweeps in seconds.
pub const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Capacity of the maintenance-event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;
