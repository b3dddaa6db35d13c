use metrics::{counter, describe_counter};

/// Initialize counter descriptions
pub fn init() {
    describe_counter!(
        "indexer_events_applied_total",
        "Decoded factory events applied to the mirror"
    );
    describe_counter!(
        "indexer_blocks_processed_total",
        "Total number of blocks reconciled"
    );
    describe_counter!("indexer_tokens_total", "Tokens inserted into the mirror");
    describe_counter!("indexer_trades_total", "Trades inserted into the mirror");
    describe_counter!(
        "indexer_duplicate_events_total",
        "Events that were already mirrored"
    );
    describe_counter!(
        "indexer_decode_failures_total",
        "Logs skipped because they could not be decoded"
    );
    describe_counter!(
        "indexer_stale_reserve_reads_total",
        "Reserve refreshes that returned a stale read"
    );
    describe_counter!(
        "indexer_curve_discrepancies_total",
        "Trades whose reserves disagreed with the mirrored curve state"
    );
    describe_counter!(
        "indexer_ticks_total",
        "Reconciler ticks by outcome"
    );
    describe_counter!(
        "indexer_notifications_total",
        "Messages broadcast to live subscribers"
    );
    describe_counter!(
        "indexer_subscribers_dropped_total",
        "Subscribers dropped for a full queue or failed liveness probe"
    );
    describe_counter!("indexer_errors_total", "Total number of errors");
}

pub fn events_applied(count: u64, kind: &str) {
    counter!("indexer_events_applied_total", "kind" => kind.to_string()).increment(count);
}

/// Increment blocks processed counter
pub fn blocks_processed(count: u64) {
    counter!("indexer_blocks_processed_total").increment(count);
}

pub fn tokens_indexed(count: u64) {
    counter!("indexer_tokens_total").increment(count);
}

/// Increment trades counter
pub fn trades_indexed(count: u64) {
    counter!("indexer_trades_total").increment(count);
}

pub fn duplicate_events(count: u64) {
    counter!("indexer_duplicate_events_total").increment(count);
}

pub fn decode_failures(count: u64) {
    counter!("indexer_decode_failures_total").increment(count);
}

pub fn stale_reserve_reads(count: u64) {
    counter!("indexer_stale_reserve_reads_total").increment(count);
}

pub fn curve_discrepancies(count: u64) {
    counter!("indexer_curve_discrepancies_total").increment(count);
}

/// `outcome` is one of applied, idle, skipped, failed
pub fn ticks(outcome: &str) {
    counter!("indexer_ticks_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn notifications(count: u64, kind: &str) {
    counter!("indexer_notifications_total", "kind" => kind.to_string()).increment(count);
}

pub fn subscribers_dropped(count: u64, reason: &str) {
    counter!("indexer_subscribers_dropped_total", "reason" => reason.to_string())
        .increment(count);
}

/// Increment errors counter
pub fn errors(count: u64, error_type: &str) {
    counter!("indexer_errors_total", "type" => error_type.to_string()).increment(count);
}
