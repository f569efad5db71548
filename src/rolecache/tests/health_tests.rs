//! Health reporting is independent of cache state

mod common;

use common::{past_primary_ttl, test_resolver, MockDirectory};
use cretoai_rolecache::{HealthMonitor, RoleCacheConfig, RoleSet};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_health_follows_directory_not_cache() {
    let directory = Arc::new(MockDirectory::new().with_roles("user", RoleSet::new(["role1"])));
    let (resolver, _clock) = test_resolver(directory.clone());
    let reporter = resolver.health_reporter();

    // Empty cache, healthy directory
    let status = reporter.check_health().await;
    assert!(status.healthy);
    assert_eq!(status.details, "directory reachable");

    // Populated cache, unhealthy directory
    resolver.resolve("user").await.unwrap();
    directory.set_healthy(false);
    let status = reporter.check_health().await;
    assert!(!status.healthy);
    assert_eq!(status.details, "directory unreachable");
}

#[tokio::test]
async fn test_health_reports_healthy_while_fetches_fail() {
    // The directory's own probe is authoritative, even if fetches fail
    let directory = Arc::new(MockDirectory::new());
    directory.set_failing(true);
    let (resolver, _clock) = test_resolver(directory.clone());

    assert!(resolver.resolve("user").await.is_err());
    assert!(resolver.health_reporter().check_health().await.healthy);
}

#[tokio::test]
async fn test_health_check_leaves_cache_untouched() {
    let directory = Arc::new(MockDirectory::new().with_roles("user", RoleSet::new(["role1"])));
    let (resolver, clock) = test_resolver(directory.clone());
    resolver.resolve("user").await.unwrap();
    clock.advance(past_primary_ttl());

    let before = resolver.cache_stats();
    for _ in 0..5 {
        resolver.health_reporter().check_health().await;
    }
    let after = resolver.cache_stats();

    assert_eq!(before, after);
    assert_eq!(directory.calls(), 1);
    // The stale primary entry is still stored; nothing swept it
    assert_eq!(resolver.store().primary_len(), 1);
}

#[tokio::test]
async fn test_monitor_polls_reporter() {
    let directory = Arc::new(MockDirectory::new());
    let (resolver, _clock) = test_resolver(directory.clone());
    let monitor = HealthMonitor::new(resolver.health_reporter(), Duration::from_millis(10));

    monitor.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(monitor.last_status().unwrap().healthy);

    directory.set_healthy(false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = monitor.last_status().unwrap();
    assert!(!status.healthy);
    assert_eq!(status.details, "directory unreachable");

    monitor.stop();
    assert_eq!(directory.calls(), 0);
}

#[tokio::test]
async fn test_resolver_monitor_follows_config_interval() {
    let directory = Arc::new(MockDirectory::new());
    let (resolver, _clock) = test_resolver(directory.clone());
    let config = RoleCacheConfig {
        health_poll_interval_secs: 5,
        ..Default::default()
    };

    let monitor = resolver.health_monitor(&config);
    assert_eq!(monitor.interval(), Duration::from_secs(5));
    assert!(monitor.last_status().is_none());

    monitor.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(monitor.last_status().unwrap().healthy);
    monitor.stop();
}
