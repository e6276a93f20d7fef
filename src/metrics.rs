use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::scheduler::SchedulerConfig;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder and publish the
    /// configured intervals as static gauges. Fails if a recorder is
    /// already installed.
    pub fn init(cfg: &SchedulerConfig) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        gauge!("brief_refresh_interval_secs").set(cfg.refresh_interval.as_secs_f64());
        gauge!("brief_monitor_interval_secs").set(cfg.monitor_interval.as_secs_f64());

        Ok(Self { handle })
    }
}
