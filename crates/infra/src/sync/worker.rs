//! Background sync worker with explicit lifecycle management.
//!
//! Listens for reachability transitions and drives a drain pass through the
//! orchestrator whenever the remote store becomes callable. A manual trigger
//! channel lets the application surface a "sync now" affordance; triggers
//! arriving while a drain is in flight coalesce into at most one follow-up.

use std::sync::Arc;
use std::time::Duration;

use flexlog_core::{Reachability, SyncOrchestrator};
use flexlog_domain::{FlexLogError, Result, SyncAttempt, SyncReport};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Configuration for the sync worker.
#[derive(Debug, Clone)]
pub struct SyncWorkerConfig {
    /// Join timeout when stopping
    pub join_timeout: Duration,
    /// Capacity of the drain report broadcast channel
    pub report_capacity: usize,
}

impl Default for SyncWorkerConfig {
    fn default() -> Self {
        Self { join_timeout: Duration::from_secs(5), report_capacity: 16 }
    }
}

/// Sync worker that turns reachability transitions into drain passes.
pub struct SyncWorker {
    orchestrator: Arc<SyncOrchestrator>,
    reachability: Arc<dyn Reachability>,
    config: SyncWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
    force_tx: mpsc::Sender<()>,
    force_rx: Option<mpsc::Receiver<()>>,
    report_tx: broadcast::Sender<SyncReport>,
}

impl SyncWorker {
    /// Create a new worker with the given configuration.
    pub fn new(
        orchestrator: Arc<SyncOrchestrator>,
        reachability: Arc<dyn Reachability>,
        config: SyncWorkerConfig,
    ) -> Self {
        // Capacity 1 on purpose: a second trigger while one is pending adds
        // nothing, so try_send may drop it.
        let (force_tx, force_rx) = mpsc::channel(1);
        let (report_tx, _) = broadcast::channel(config.report_capacity.max(1));
        Self {
            orchestrator,
            reachability,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
            force_tx,
            force_rx: Some(force_rx),
            report_tx,
        }
    }

    /// Start the worker, spawning the background listener task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(FlexLogError::Internal(
                "sync worker already running".into(),
            ));
        }

        info!("starting sync worker");

        self.cancellation = CancellationToken::new();
        let force_rx = match self.force_rx.take() {
            Some(rx) => rx,
            None => {
                let (force_tx, force_rx) = mpsc::channel(1);
                self.force_tx = force_tx;
                force_rx
            }
        };

        let orchestrator = Arc::clone(&self.orchestrator);
        let reachability = Arc::clone(&self.reachability);
        let cancel = self.cancellation.clone();
        let report_tx = self.report_tx.clone();

        let handle = tokio::spawn(async move {
            Self::listen_loop(orchestrator, reachability, force_rx, cancel, report_tx).await;
        });

        self.task_handle = Some(handle);
        info!("sync worker started");
        Ok(())
    }

    /// Stop the worker and wait for the listener task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(FlexLogError::Internal(
                "sync worker not running".into(),
            ));
        }

        info!("stopping sync worker");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "sync worker task panicked");
                    return Err(FlexLogError::Internal(
                        "sync worker task panicked".into(),
                    ));
                }
                Err(_) => {
                    warn!("sync worker task did not complete within timeout");
                    return Err(FlexLogError::Internal(
                        "sync worker join timeout".into(),
                    ));
                }
            }
        }

        info!("sync worker stopped");
        Ok(())
    }

    /// Returns true when a worker task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Request a drain pass outside of a reachability transition. Non-blocking;
    /// a trigger already pending makes this a no-op.
    pub fn force_sync(&self) {
        if self.force_tx.try_send(()).is_err() {
            debug!("sync trigger already pending; coalescing");
        }
    }

    /// Subscribe to drain reports for the notification surface.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<SyncReport> {
        self.report_tx.subscribe()
    }

    async fn listen_loop(
        orchestrator: Arc<SyncOrchestrator>,
        reachability: Arc<dyn Reachability>,
        mut force_rx: mpsc::Receiver<()>,
        cancel: CancellationToken,
        report_tx: broadcast::Sender<SyncReport>,
    ) {
        let mut transitions = reachability.subscribe();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("sync worker loop cancelled");
                    break;
                }
                changed = transitions.changed() => {
                    if changed.is_err() {
                        debug!("reachability channel closed; stopping sync worker loop");
                        break;
                    }
                    if !*transitions.borrow_and_update() {
                        debug!("remote store became unreachable");
                        continue;
                    }
                    info!("remote store became reachable; draining");
                    Self::run_drain(&orchestrator, &report_tx).await;
                }
                trigger = force_rx.recv() => {
                    if trigger.is_none() {
                        break;
                    }
                    debug!("manual sync trigger received");
                    Self::run_drain(&orchestrator, &report_tx).await;
                }
            }
        }
    }

    async fn run_drain(
        orchestrator: &Arc<SyncOrchestrator>,
        report_tx: &broadcast::Sender<SyncReport>,
    ) {
        match orchestrator.sync_now().await {
            Ok(SyncAttempt::Completed(report)) => {
                info!(
                    succeeded = report.succeeded,
                    failed = report.failed,
                    summary = %report.summary(),
                    "drain pass completed"
                );
                // No subscribers is fine; the report is advisory.
                let _ = report_tx.send(report);
            }
            Ok(SyncAttempt::Skipped(reason)) => {
                debug!(%reason, "drain pass skipped");
            }
            Err(err) => {
                warn!(error = %err, "drain pass failed");
            }
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("sync worker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
