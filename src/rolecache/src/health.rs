//! Directory health reporting
//!
//! Health is read straight from the directory client's own probe. Cache
//! contents never influence it and nothing here touches the caches.

use crate::config::RoleCacheConfig;
use crate::directory::{DirectoryHealth, RoleDirectoryClient};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

/// Binary health signal with operator-facing details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub details: String,
}

impl From<DirectoryHealth> for HealthStatus {
    fn from(health: DirectoryHealth) -> Self {
        Self {
            healthy: health.healthy,
            details: health.details,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.healthy { "healthy" } else { "unhealthy" };
        write!(f, "{}: {}", state, self.details)
    }
}

/// Maps the directory's health probe into a [`HealthStatus`]
#[derive(Clone)]
pub struct HealthReporter {
    directory: Arc<dyn RoleDirectoryClient>,
}

impl HealthReporter {
    pub fn new(directory: Arc<dyn RoleDirectoryClient>) -> Self {
        Self { directory }
    }

    /// Probe the directory; failures are reported, never returned as errors
    pub async fn check_health(&self) -> HealthStatus {
        self.directory.check_health().await.into()
    }
}

/// Background poller for a [`HealthReporter`]
///
/// Logs healthy/unhealthy transitions and keeps the last observed status.
pub struct HealthMonitor {
    reporter: HealthReporter,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    last_status: Arc<RwLock<Option<HealthStatus>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    pub fn new(reporter: HealthReporter, interval: Duration) -> Self {
        Self {
            reporter,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            last_status: Arc::new(RwLock::new(None)),
            handle: Mutex::new(None),
        }
    }

    /// Monitor polling every `health_poll_interval_secs`
    pub fn from_config(reporter: HealthReporter, config: &RoleCacheConfig) -> Self {
        Self::new(reporter, config.health_poll_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling on the current tokio runtime
    ///
    /// Calling `start` on a running monitor does nothing.
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }

        self.shutdown.store(false, Ordering::Relaxed);
        let reporter = self.reporter.clone();
        let interval = self.interval;
        let shutdown = self.shutdown.clone();
        let last_status = self.last_status.clone();

        *handle = Some(tokio::spawn(async move {
            info!("Starting role directory health monitor with interval: {:?}", interval);

            while !shutdown.load(Ordering::Relaxed) {
                let status = reporter.check_health().await;
                let previous = last_status.write().replace(status.clone());

                match previous {
                    Some(prev) if prev.healthy && !status.healthy => {
                        warn!(details = %status.details, "Role directory became unhealthy");
                    }
                    Some(prev) if !prev.healthy && status.healthy => {
                        info!(details = %status.details, "Role directory recovered");
                    }
                    None if !status.healthy => {
                        warn!(details = %status.details, "Role directory unhealthy");
                    }
                    _ => {}
                }

                sleep(interval).await;
            }

            info!("Role directory health monitor stopped");
        }));
    }

    /// Stop polling
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some() && !self.shutdown.load(Ordering::Relaxed)
    }

    /// Most recent status seen by the poller, if it has run at least once
    pub fn last_status(&self) -> Option<HealthStatus> {
        self.last_status.read().clone()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticRoleDirectory;

    #[tokio::test]
    async fn test_health_maps_directory_signal() {
        let directory = Arc::new(StaticRoleDirectory::new());
        let reporter = HealthReporter::new(directory.clone());

        let status = reporter.check_health().await;
        assert!(status.healthy);
        assert!(status.details.contains("online"));

        directory.set_available(false);
        let status = reporter.check_health().await;
        assert!(!status.healthy);
        assert_eq!(status.to_string(), "unhealthy: static directory offline");
    }

    #[tokio::test]
    async fn test_monitor_tracks_transitions() {
        let directory = Arc::new(StaticRoleDirectory::new());
        let monitor = HealthMonitor::new(
            HealthReporter::new(directory.clone()),
            Duration::from_millis(10),
        );
        assert!(monitor.last_status().is_none());

        monitor.start();
        assert!(monitor.is_running());
        sleep(Duration::from_millis(50)).await;
        assert!(monitor.last_status().unwrap().healthy);

        directory.set_available(false);
        sleep(Duration::from_millis(50)).await;
        assert!(!monitor.last_status().unwrap().healthy);

        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_monitor_from_config_uses_poll_interval() {
        let directory = Arc::new(StaticRoleDirectory::new());
        let config = RoleCacheConfig {
            health_poll_interval_secs: 30,
            ..Default::default()
        };
        let monitor = HealthMonitor::from_config(HealthReporter::new(directory), &config);
        assert_eq!(monitor.interval(), Duration::from_secs(30));
        assert!(!monitor.is_running());

        // First poll runs immediately, the next one waits a full interval
        monitor.start();
        sleep(Duration::from_millis(50)).await;
        assert!(monitor.last_status().unwrap().healthy);
        monitor.stop();
    }
}
