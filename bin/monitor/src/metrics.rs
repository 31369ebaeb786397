//! Prometheus metrics for the withdrawal monitor.
//!
//! All metrics are recorded through the [`Metrics`] struct.

use crate::{state::MonitorState, CycleReport};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;
use withdrawal::Verdict;

/// Counters are fed from the monitor state's running totals, so the last
/// reported totals are kept to increment by the difference.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    previous_events_processed: u64,
    previous_withdrawals_processed: u64,
    previous_node_connection_failures: u64,
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self::default()
    }

    fn register_descriptions() {
        describe_counter!("monitor_cycles_total", "Total number of monitor cycles executed");
        describe_counter!(
            "monitor_cycles_success_total",
            "Total number of successful monitor cycles"
        );
        describe_counter!(
            "monitor_cycles_failure_total",
            "Total number of failed monitor cycles"
        );
        describe_histogram!(
            "monitor_cycle_duration_seconds",
            "Duration of each monitor cycle in seconds"
        );

        describe_counter!(
            "monitor_events_processed_total",
            "Proven withdrawal events reconciled against the rollup"
        );
        describe_counter!(
            "monitor_withdrawals_processed_total",
            "Proven withdrawals that reached a final verdict"
        );
        describe_counter!(
            "monitor_node_connection_failures_total",
            "Checks where the rollup node output root was unavailable"
        );

        describe_gauge!(
            "monitor_open_alerts",
            "Withdrawals currently alerting or pending, by kind"
        );
        describe_gauge!("monitor_l1_head_block", "Latest settlement chain block seen");
        describe_gauge!("monitor_l2_head_block", "Latest rollup chain block seen");
        describe_gauge!(
            "monitor_next_l1_block",
            "First settlement block not yet fully processed"
        );
    }

    /// Record a completed cycle.
    pub fn record_cycle(&self, success: bool, duration: Duration) {
        counter!("monitor_cycles_total").increment(1);
        histogram!("monitor_cycle_duration_seconds").record(duration.as_secs_f64());

        if success {
            counter!("monitor_cycles_success_total").increment(1);
        } else {
            counter!("monitor_cycles_failure_total").increment(1);
        }
    }

    pub fn record_heads(&self, report: &CycleReport) {
        gauge!("monitor_l1_head_block").set(report.l1_head as f64);
        gauge!("monitor_l2_head_block").set(report.l2_head as f64);
    }

    /// Publish the monitor state. Called after every cycle, failed or not.
    pub fn record_state(&mut self, state: &MonitorState) {
        counter!("monitor_events_processed_total")
            .increment(state.events_processed() - self.previous_events_processed);
        counter!("monitor_withdrawals_processed_total")
            .increment(state.withdrawals_processed() - self.previous_withdrawals_processed);
        counter!("monitor_node_connection_failures_total")
            .increment(state.node_connection_failures() - self.previous_node_connection_failures);

        self.previous_events_processed = state.events_processed();
        self.previous_withdrawals_processed = state.withdrawals_processed();
        self.previous_node_connection_failures = state.node_connection_failures();

        if let Some(next) = state.next_l1_block() {
            gauge!("monitor_next_l1_block").set(next as f64);
        }

        let alerts = state.alerts();
        for (kind, open) in [
            (Verdict::PotentialAttackOnDefenderWinsGame, alerts.defender_wins),
            (Verdict::PotentialAttackOnInProgressGame, alerts.in_progress),
            (Verdict::SuspiciousEventOnChallengerWinsGame, alerts.challenger_wins),
            (Verdict::Unverified, alerts.unverified),
        ] {
            gauge!("monitor_open_alerts", "kind" => kind.as_str()).set(open as f64);
        }
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
