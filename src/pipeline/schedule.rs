// src/pipeline/schedule.rs

//! Cooperative scheduling loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::pipeline::Monitor;

/// Runs a cycle immediately, then once per configured interval.
pub struct Scheduler {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the loop on the current runtime.
    pub fn start(monitor: Arc<Monitor>) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            log::info!("Scheduler started");
            loop {
                if *stop_rx.borrow() {
                    break;
                }

                monitor.run_cycle().await;

                let frequency = monitor.frequency().await;
                log::debug!("Next cycle in {}s", frequency.as_secs());
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(frequency) => {}
                }
            }
            log::info!("Scheduler stopped");
        });

        Self { stop_tx, handle }
    }

    /// Ask the loop not to start another cycle.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Signal the loop and wait for the in-flight cycle to finish.
    pub async fn stop(self) {
        self.signal_stop();
        if let Err(e) = self.handle.await {
            log::error!("Scheduler task ended abnormally: {}", e);
        }
    }
}
