use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

use crate::service::CourtMonitor;

/// Drives the monitor: cycle, sleep, repeat until shutdown.
pub struct PollingScheduler {
    monitor: CourtMonitor,
    interval: Duration,
    retry_delay: Duration,
}

/// Counters returned when the scheduler stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failed_cycles: u64,
}

impl PollingScheduler {
    pub fn new(monitor: CourtMonitor, interval: Duration, retry_delay: Duration) -> Self {
        Self {
            monitor,
            interval,
            retry_delay,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Shutdown is only observed between cycles; a running cycle always
    /// completes. The wait after a cycle is measured from its end.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!(
            interval = ?self.interval,
            retry_delay = ?self.retry_delay,
            "polling scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            summary.cycles += 1;
            let delay = match self.monitor.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        days_with_data = report.days_with_data,
                        failed_requests = report.failed_requests,
                        valid_slots = report.valid_slots,
                        new_slots = report.new_slots,
                        delivery = ?report.delivery,
                        known_slots = self.monitor.known().len(),
                        "cycle complete"
                    );
                    self.interval
                }
                Err(e) => {
                    summary.failed_cycles += 1;
                    tracing::error!("cycle failed: {}", e);
                    self.retry_delay
                }
            };

            tracing::debug!(?delay, "sleeping until next cycle");
            tokio::select! {
                _ = time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            cycles = summary.cycles,
            failed_cycles = summary.failed_cycles,
            "polling scheduler stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notifier::{Notification, Notifier, NotifyError};
    use async_trait::async_trait;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "null"
        }
    }

    fn monitor(server: &MockServer) -> CourtMonitor {
        let mut config = Config::example();
        config.tenant_ids = vec!["T1".to_string()];
        config.days_ahead = 1;
        config.request_pause_ms = 0;
        config.request_timeout_secs = 2;
        config.min_hour = Some(17);
        config.availability_url = format!("{}/api/clubs/availability", server.uri());
        CourtMonitor::new(&config, Box::new(NullNotifier)).unwrap()
    }

    async fn wait_for_requests(server: &MockServer, count: usize) {
        for _ in 0..200 {
            if server.received_requests().await.map_or(0, |r| r.len()) >= count {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} requests");
    }

    #[tokio::test]
    async fn test_stops_before_first_cycle_when_already_shut_down() {
        let server = MockServer::start().await;
        let (tx, rx) = watch::channel(true);

        let scheduler = PollingScheduler::new(monitor(&server), Duration::from_secs(300), Duration::from_secs(60));
        let summary = scheduler.run(rx).await;
        drop(tx);

        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_interval_sleep() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let (tx, rx) = watch::channel(false);
        let scheduler = PollingScheduler::new(monitor(&server), Duration::from_secs(3600), Duration::from_secs(3600));
        let handle = tokio::spawn(scheduler.run(rx));

        wait_for_requests(&server, 1).await;
        tx.send(true).unwrap();

        let summary = time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop promptly")
            .unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.failed_cycles, 0);
    }

    #[tokio::test]
    async fn test_failed_cycle_uses_retry_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"resource_id": "R1", "slots": [{"start_time": "late"}]}])),
            )
            .mount(&server)
            .await;

        let (tx, rx) = watch::channel(false);
        // Long interval, short retry: a second request proves the retry path.
        let scheduler = PollingScheduler::new(monitor(&server), Duration::from_secs(3600), Duration::from_millis(20));
        let handle = tokio::spawn(scheduler.run(rx));

        wait_for_requests(&server, 2).await;
        tx.send(true).unwrap();

        let summary = time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(summary.cycles >= 2);
        assert_eq!(summary.cycles, summary.failed_cycles);
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_scheduler() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (tx, rx) = watch::channel(false);
        let scheduler = PollingScheduler::new(monitor(&server), Duration::from_secs(3600), Duration::from_secs(3600));
        let handle = tokio::spawn(scheduler.run(rx));

        wait_for_requests(&server, 1).await;
        drop(tx);

        let summary = time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(summary.cycles, 1);
    }
}
