use metrics::{describe_histogram, histogram};
use std::time::Duration;

/// Initialize histogram descriptions
pub fn init() {
    describe_histogram!(
        "indexer_tick_duration_seconds",
        "Time for one reconciler tick"
    );
    describe_histogram!(
        "indexer_event_apply_duration_seconds",
        "Time to apply a single event to the mirror"
    );
    describe_histogram!(
        "indexer_rpc_request_duration_seconds",
        "Time for RPC requests"
    );
}

pub fn tick_duration(duration: Duration) {
    histogram!("indexer_tick_duration_seconds").record(duration.as_secs_f64());
}

pub fn event_apply_duration(duration: Duration, kind: &str) {
    histogram!("indexer_event_apply_duration_seconds", "kind" => kind.to_string())
        .record(duration.as_secs_f64());
}

/// Record RPC request duration
pub fn rpc_request_duration(duration: Duration, method: &str) {
    histogram!("indexer_rpc_request_duration_seconds", "method" => method.to_string())
        .record(duration.as_secs_f64());
}
