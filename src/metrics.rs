use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    register_metrics();

    handle
}

/// Pre-register counters and gauges so they appear in the scrape payload
/// even before the first increment.
pub fn register_metrics() {
    counter!("cycles_total").absolute(0);
    counter!("signals_sent_total").absolute(0);
    counter!("delivery_failures_total").absolute(0);
    counter!("empty_cycles_total").absolute(0);
    counter!("forced_sends_total").absolute(0);
    counter!("recoveries_total").absolute(0);
    counter!("full_restarts_total").absolute(0);

    gauge!("minutes_since_last_send").set(0.0);
}
