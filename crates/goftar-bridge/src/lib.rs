//! # goftar-bridge
//!
//! The Core Bridge proper: proxies user queries to the remote Core
//! retrieval/answer service (buffered and server-streamed), and reconciles
//! local conversation references against the remote store.
//!
//! [`CoreBridge`] is the facade the surrounding CRUD layer calls into; the
//! clients it composes are constructed once at process start and injected
//! explicitly.

pub mod bridge;
pub mod proxy;
pub mod reconciler;
pub mod sse;
pub mod types;

pub use bridge::CoreBridge;
pub use proxy::{CoreConfig, CoreProxy, QueryStream};
pub use reconciler::Reconciler;
