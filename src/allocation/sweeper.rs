//! 预约超时清扫器
//!
//! 周期性释放超时未支付的预约。与 `allocate` 内联清扫互为幂等：
//! 低流量时没有新分配触发内联清扫，周期任务保证预约生命周期有上界。

use super::AllocationManager;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodic task releasing reservations past their timeout
///
/// Spawned once at startup; stops ticking on the shutdown signal without
/// interrupting in-flight allocations (the manager lock serializes them).
pub struct ReservationSweeper {
    allocator: Arc<AllocationManager>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ReservationSweeper {
    pub fn new(
        allocator: Arc<AllocationManager>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            allocator,
            interval,
            shutdown,
        }
    }

    /// 主循环：周期触发 sweep，收到 shutdown 信号后退出
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reservation sweeper started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reservation sweeper received shutdown signal");
                    break;
                }
            }

            let released = self.allocator.sweep();
            if released > 0 {
                tracing::info!(released, "Sweeper released expired reservations");
            } else {
                tracing::debug!("Sweeper tick: nothing expired");
            }
        }

        tracing::info!("Reservation sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectibleUnit, Warehouse};

    fn test_manager() -> Arc<AllocationManager> {
        let warehouse = Warehouse {
            id: "wh-1".into(),
            name: "Warehouse 1".into(),
            collectible_id: "col-001".into(),
            serves: [("A".to_string(), 1)].into_iter().collect(),
        };
        Arc::new(AllocationManager::new(
            vec![CollectibleUnit::available("unit-1", "col-001", "wh-1")],
            vec![warehouse],
            Duration::from_secs(900),
        ))
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let shutdown = CancellationToken::new();
        let sweeper = ReservationSweeper::new(
            test_manager(),
            Duration::from_secs(3600),
            shutdown.clone(),
        );

        let handle = tokio::spawn(sweeper.run());
        shutdown.cancel();
        // The loop must observe the signal and return promptly
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop on shutdown")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_releases_after_timeout() {
        let manager = test_manager();
        let allocated = manager.allocate("col-001", "A", "r1").unwrap();
        manager.backdate_reservation(&allocated.unit.id, 900_000 + 1000);

        let shutdown = CancellationToken::new();
        let sweeper = ReservationSweeper::new(
            manager.clone(),
            Duration::from_secs(300),
            shutdown.clone(),
        );
        let handle = tokio::spawn(sweeper.run());

        // Let one tick elapse under the paused clock
        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(manager.get_total_stock("col-001"), 1);
        shutdown.cancel();
        let _ = handle.await;
    }
}
