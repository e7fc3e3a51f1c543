//! Interval-driven maintenance worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use goftar_bridge::CoreBridge;
use goftar_core::{defaults, CleanupReport, Error, Result, SweepReport};

/// Configuration for the maintenance worker.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Seconds between reconciliation sweeps.
    pub reconcile_interval_secs: u64,
    /// Seconds between staged-object cleanup sweeps.
    pub cleanup_interval_secs: u64,
    /// Age cutoff for the cleanup sweep, in hours.
    pub cleanup_older_than_hours: i64,
    /// Report-only mode: neither sweep mutates anything.
    pub dry_run: bool,
    /// Whether to run maintenance at all.
    pub enabled: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: defaults::RECONCILE_INTERVAL_SECS,
            cleanup_interval_secs: defaults::CLEANUP_INTERVAL_SECS,
            cleanup_older_than_hours: defaults::STAGED_RETENTION_HOURS,
            dry_run: false,
            enabled: true,
        }
    }
}

impl MaintenanceConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MAINTENANCE_ENABLED` | `true` | Enable/disable the worker |
    /// | `MAINTENANCE_DRY_RUN` | `false` | Report-only mode |
    /// | `RECONCILE_INTERVAL_SECS` | `3600` | Reconciliation cadence |
    /// | `CLEANUP_INTERVAL_SECS` | `3600` | Cleanup cadence |
    /// | `CLEANUP_OLDER_THAN_HOURS` | `24` | Cleanup age cutoff |
    pub fn from_env() -> Self {
        let base = Self::default();

        let enabled = std::env::var("MAINTENANCE_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let dry_run = std::env::var("MAINTENANCE_DRY_RUN")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            reconcile_interval_secs: std::env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.reconcile_interval_secs),
            cleanup_interval_secs: std::env::var("CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.cleanup_interval_secs),
            cleanup_older_than_hours: std::env::var("CLEANUP_OLDER_THAN_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.cleanup_older_than_hours),
            dry_run,
            enabled,
        }
    }

    /// Set the reconciliation cadence.
    pub fn with_reconcile_interval(mut self, secs: u64) -> Self {
        self.reconcile_interval_secs = secs;
        self
    }

    /// Set the cleanup cadence.
    pub fn with_cleanup_interval(mut self, secs: u64) -> Self {
        self.cleanup_interval_secs = secs;
        self
    }

    /// Enable or disable report-only mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Event emitted by the maintenance worker.
#[derive(Debug, Clone)]
pub enum MaintenanceEvent {
    /// Worker started.
    Started,
    /// A reconciliation sweep finished.
    ReconcileFinished(SweepReport),
    /// A cleanup sweep finished.
    CleanupFinished(CleanupReport),
    /// A sweep failed; the worker keeps running.
    SweepFailed { task: &'static str, error: String },
    /// Worker stopped.
    Stopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<MaintenanceEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<MaintenanceEvent> {
        self.event_rx.resubscribe()
    }
}

/// Maintenance worker driving reconcile and cleanup on a fixed cadence.
pub struct MaintenanceWorker {
    bridge: Arc<CoreBridge>,
    config: MaintenanceConfig,
    event_tx: broadcast::Sender<MaintenanceEvent>,
}

impl MaintenanceWorker {
    /// Create a new maintenance worker.
    pub fn new(bridge: Arc<CoreBridge>, config: MaintenanceConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            bridge,
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!(
                subsystem = "jobs",
                component = "worker",
                "Maintenance worker disabled by configuration"
            );
            return;
        }

        info!(
            subsystem = "jobs",
            component = "worker",
            reconcile_interval_secs = self.config.reconcile_interval_secs,
            cleanup_interval_secs = self.config.cleanup_interval_secs,
            dry_run = self.config.dry_run,
            "Maintenance worker started"
        );
        let _ = self.event_tx.send(MaintenanceEvent::Started);

        let mut reconcile_tick =
            interval(Duration::from_secs(self.config.reconcile_interval_secs));
        let mut cleanup_tick = interval(Duration::from_secs(self.config.cleanup_interval_secs));
        reconcile_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        cleanup_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Both intervals fire immediately on the first tick; swallow it so
        // the first sweep happens one cadence after startup.
        reconcile_tick.tick().await;
        cleanup_tick.tick().await;

        loop {
            tokio::select! {
                _ = reconcile_tick.tick() => self.run_reconcile().await,
                _ = cleanup_tick.tick() => self.run_cleanup().await,
                _ = shutdown_rx.recv() => {
                    info!(subsystem = "jobs", component = "worker", "Maintenance worker stopping");
                    let _ = self.event_tx.send(MaintenanceEvent::Stopped);
                    return;
                }
            }
        }
    }

    async fn run_reconcile(&self) {
        match self.bridge.reconcile(self.config.dry_run).await {
            Ok(report) => {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "reconcile",
                    checked = report.checked,
                    removed = report.removed,
                    errors = report.errors,
                    "Scheduled reconciliation finished"
                );
                let _ = self
                    .event_tx
                    .send(MaintenanceEvent::ReconcileFinished(report));
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "reconcile",
                    error = %e,
                    "Scheduled reconciliation failed"
                );
                let _ = self.event_tx.send(MaintenanceEvent::SweepFailed {
                    task: "reconcile",
                    error: e.to_string(),
                });
            }
        }
    }

    async fn run_cleanup(&self) {
        let older_than = chrono::Duration::hours(self.config.cleanup_older_than_hours);
        match self.bridge.cleanup(older_than, self.config.dry_run).await {
            Ok(report) => {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "cleanup",
                    deleted = report.deleted_count,
                    kept = report.kept_count,
                    errors = report.errors,
                    freed_bytes = report.freed_bytes,
                    "Scheduled cleanup finished"
                );
                let _ = self.event_tx.send(MaintenanceEvent::CleanupFinished(report));
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "cleanup",
                    error = %e,
                    "Scheduled cleanup failed"
                );
                let _ = self.event_tx.send(MaintenanceEvent::SweepFailed {
                    task: "cleanup",
                    error: e.to_string(),
                });
            }
        }
    }
}
