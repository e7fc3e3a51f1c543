//! # goftar-jobs
//!
//! Background maintenance scheduler for the Goftar Core Bridge.
//!
//! A dumb timer: on a fixed cadence it triggers the conversation
//! reconciler and the staged-object cleanup sweep, broadcasts each report,
//! and keeps going when a sweep fails.
//!
//! ## Example
//!
//! ```ignore
//! use goftar_jobs::{MaintenanceConfig, MaintenanceWorker};
//!
//! let worker = MaintenanceWorker::new(bridge, MaintenanceConfig::from_env());
//! let handle = worker.start();
//!
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! handle.shutdown().await?;
//! ```

pub mod worker;

pub use worker::{MaintenanceConfig, MaintenanceEvent, MaintenanceWorker, WorkerHandle};
