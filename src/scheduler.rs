//! Periodic refresh timer plus the settings change poller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::change_detector::ChangeMonitor;
use crate::engine::AggregationEngine;

pub const DEFAULT_REFRESH_SECS: u64 = 300;
pub const DEFAULT_MONITOR_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub refresh_interval: Duration,
    pub monitor_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            monitor_interval: Duration::from_secs(DEFAULT_MONITOR_SECS),
        }
    }
}

impl SchedulerConfig {
    /// Defaults overridden by `DAILY_BRIEF_REFRESH_SECS` and
    /// `DAILY_BRIEF_MONITOR_SECS` when they parse as positive integers.
    pub fn from_env() -> Self {
        let secs = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self {
            refresh_interval: Duration::from_secs(secs("DAILY_BRIEF_REFRESH_SECS", DEFAULT_REFRESH_SECS)),
            monitor_interval: Duration::from_secs(secs("DAILY_BRIEF_MONITOR_SECS", DEFAULT_MONITOR_SECS)),
        }
    }
}

#[derive(Default)]
struct Shutdown {
    stopping: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    fn trigger(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a trigger in between is not lost.
        notified.as_mut().enable();
        if self.stopping.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }
}

pub struct Scheduler;

impl Scheduler {
    /// Spawn both loops. The refresh timer fires immediately, which is the
    /// start-up refresh; the monitor's first poll only records the
    /// fingerprint.
    pub fn start(engine: Arc<AggregationEngine>, cfg: SchedulerConfig) -> SchedulerHandle {
        let shutdown = Arc::new(Shutdown::default());
        tracing::info!(
            target: "scheduler",
            refresh_secs = cfg.refresh_interval.as_secs(),
            monitor_secs = cfg.monitor_interval.as_secs(),
            "scheduler started"
        );
        let tasks = vec![
            tokio::spawn(refresh_loop(engine.clone(), cfg.refresh_interval, shutdown.clone())),
            tokio::spawn(monitor_loop(engine, cfg.monitor_interval, shutdown.clone())),
        ];
        SchedulerHandle { shutdown, tasks }
    }
}

async fn refresh_loop(engine: Arc<AggregationEngine>, every: Duration, shutdown: Arc<Shutdown>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }

        let engine = engine.clone();
        let cycle = tokio::spawn(async move { engine.refresh(None).await });
        // A panicking cycle ends only its own task; the timer keeps going.
        tokio::spawn(async move {
            if let Err(e) = cycle.await {
                tracing::error!(target: "scheduler", error = %e, "refresh task died");
            }
        });
    }
    tracing::info!(target: "scheduler", "refresh timer stopped");
}

async fn monitor_loop(engine: Arc<AggregationEngine>, every: Duration, shutdown: Arc<Shutdown>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut monitor = ChangeMonitor::new();

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {}
        }
        monitor.check(&engine).await;
    }
    tracing::info!(target: "scheduler", "settings monitor stopped");
}

/// Owns the loop tasks. `shutdown` stops them gracefully; dropping the
/// handle aborts them. In-flight refresh cycles always run to completion.
pub struct SchedulerHandle {
    shutdown: Arc<Shutdown>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(target: "scheduler", error = %e, "loop task ended abnormally");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
