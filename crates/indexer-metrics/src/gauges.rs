use metrics::{describe_gauge, gauge};

/// Initialize gauge descriptions
pub fn init() {
    describe_gauge!("indexer_chain_head", "Latest block height reported by the chain");
    describe_gauge!(
        "indexer_last_confirmed_block",
        "Last block whose events were fully applied"
    );
    describe_gauge!(
        "indexer_blocks_behind",
        "Distance between the chain head and the watermark"
    );
    describe_gauge!("indexer_watched_tokens", "Tokens in the reconciler watch set");
    describe_gauge!("indexer_subscribers", "Connected live subscribers");
}

pub fn set_chain_head(block: u64) {
    gauge!("indexer_chain_head").set(block as f64);
}

pub fn set_last_confirmed_block(block: u64) {
    gauge!("indexer_last_confirmed_block").set(block as f64);
}

pub fn set_blocks_behind(blocks: u64) {
    gauge!("indexer_blocks_behind").set(blocks as f64);
}

pub fn set_watched_tokens(count: usize) {
    gauge!("indexer_watched_tokens").set(count as f64);
}

pub fn set_subscribers(count: usize) {
    gauge!("indexer_subscribers").set(count as f64);
}
