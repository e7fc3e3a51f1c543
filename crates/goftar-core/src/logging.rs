//! Structured logging field name constants for the Goftar Core Bridge.
//!
//! All crates use these names for consistent structured logging fields so
//! log aggregation tools can query by standardized keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, caller-visible error surfaced |
//! | INFO  | Lifecycle events, sweep completions |
//! | DEBUG | Decision points, per-request details |
//! | TRACE | Per-chunk streaming data |

/// Subsystem originating the log event.
/// Values: "auth", "store", "bridge", "db", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "stager", "proxy", "reconciler", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "put", "sweep_expired", "send_stream", "reconcile"
pub const OPERATION: &str = "op";

/// Account id owning the affected resource.
pub const OWNER_ID: &str = "owner_id";

/// Object key in the staging namespace.
pub const OBJECT_KEY: &str = "object_key";

/// Remote conversation id.
pub const CONVERSATION_ID: &str = "conversation_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
