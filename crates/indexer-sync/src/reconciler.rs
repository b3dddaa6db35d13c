use alloy::rpc::types::Log;
use alloy_primitives::Address;
use indexer_core::config::ReconcilerConfig;
use indexer_core::{EventDecoder, LogKind, Result};
use indexer_processor::{EventProcessor, WindowSummary};
use indexer_store::{ReconcilerState, ReconcilerStats};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::client::ChainClient;

/// Where the reconciler is within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Polling,
    Applying,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Polling => "polling",
            Phase::Applying => "applying",
        }
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another pass was already running
    Skipped,
    /// Nothing new on chain
    Idle { head: u64 },
    /// A window was applied and the cursor moved to `to`
    Applied {
        from: u64,
        to: u64,
        summary: WindowSummary,
    },
}

/// Read-only view of the loop, refreshed after every tick
#[derive(Debug, Clone)]
pub struct ReconcilerStatus {
    pub phase: Phase,
    pub last_confirmed_block: Option<u64>,
    pub chain_head: Option<u64>,
    pub watched_tokens: usize,
    pub stats: ReconcilerStats,
    pub last_error: Option<String>,
}

impl Default for ReconcilerStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            last_confirmed_block: None,
            chain_head: None,
            watched_tokens: 0,
            stats: ReconcilerStats::default(),
            last_error: None,
        }
    }
}

/// Releases the in-flight flag however the pass ends
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Polls the factory in bounded windows and mirrors what it finds.
///
/// At most one pass runs at a time: a tick that finds another in flight
/// returns `TickOutcome::Skipped` immediately. The cursor in
/// `ReconcilerState` only moves after a window is fully applied and the
/// checkpoint is saved, so a failed pass is retried over the same range.
pub struct Reconciler {
    chain: Arc<dyn ChainClient>,
    decoder: EventDecoder,
    processor: Arc<EventProcessor>,
    config: ReconcilerConfig,
    in_flight: AtomicBool,
    status: RwLock<ReconcilerStatus>,
}

impl Reconciler {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        decoder: EventDecoder,
        processor: Arc<EventProcessor>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            chain,
            decoder,
            processor,
            config,
            in_flight: AtomicBool::new(false),
            status: RwLock::new(ReconcilerStatus::default()),
        }
    }

    /// Current status snapshot
    pub async fn status(&self) -> ReconcilerStatus {
        self.status.read().await.clone()
    }

    /// Build the initial state from the persisted checkpoint and the
    /// tokens already mirrored
    pub async fn bootstrap(&self) -> Result<ReconcilerState> {
        let store = self.processor.store();
        let checkpoint = store.load_checkpoint().await?;
        let known = store.known_token_addresses().await?;

        info!(
            checkpoint = ?checkpoint,
            known_tokens = known.len(),
            "Reconciler bootstrapped"
        );

        let state = ReconcilerState::new(checkpoint, known);
        indexer_metrics::gauges::set_watched_tokens(state.watched_tokens.len());
        self.publish_status(&state, None).await;
        Ok(state)
    }

    /// Run one pass. Errors leave the cursor untouched and are also
    /// recorded in the status and stats.
    pub async fn tick(&self, state: &mut ReconcilerState) -> Result<TickOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Previous pass still running, skipping tick");
            indexer_metrics::counters::ticks("skipped");
            return Ok(TickOutcome::Skipped);
        }
        let _guard = PassGuard(&self.in_flight);

        let start = Instant::now();
        let result = self.pass(state).await;
        indexer_metrics::histograms::tick_duration(start.elapsed());

        let last_error = match &result {
            Ok(TickOutcome::Applied { from, to, summary }) => {
                indexer_metrics::counters::ticks("applied");
                info!(
                    from = from,
                    to = to,
                    applied = summary.applied,
                    trades = summary.trades,
                    duplicates = summary.duplicates,
                    unknown_tokens = summary.unknown_tokens,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Window applied"
                );
                None
            }
            Ok(_) => {
                indexer_metrics::counters::ticks("idle");
                None
            }
            Err(e) => {
                state.stats.ticks_failed += 1;
                indexer_metrics::counters::ticks("failed");
                indexer_metrics::counters::errors(1, if e.is_transient() { "transient" } else { "tick" });
                error!(
                    cursor = ?state.last_confirmed_block,
                    error = %e,
                    "Tick failed, window will be retried"
                );
                Some(e.to_string())
            }
        };

        self.publish_status(state, last_error).await;
        result
    }

    async fn pass(&self, state: &mut ReconcilerState) -> Result<TickOutcome> {
        self.set_phase(Phase::Polling).await;

        let head = self.chain.current_height().await?;
        indexer_metrics::gauges::set_chain_head(head);
        self.status.write().await.chain_head = Some(head);

        let cursor = match state.last_confirmed_block {
            Some(cursor) => cursor,
            None => {
                let start = head.saturating_sub(self.config.lookback_blocks);
                info!(head = head, cursor = start, "No checkpoint, starting from lookback");
                state.last_confirmed_block = Some(start);
                start
            }
        };

        indexer_metrics::gauges::set_blocks_behind(head.saturating_sub(cursor));
        if head <= cursor {
            return Ok(TickOutcome::Idle { head });
        }

        let from = cursor + 1;
        let to = head.min(from + self.config.window_blocks.max(1) - 1);

        let logs = self.fetch_window(from, to).await?;
        let events = self.decoder.decode_all(&logs);
        let failed = logs.len() - events.len();
        if failed > 0 {
            indexer_metrics::counters::decode_failures(failed as u64);
        }
        debug!(from = from, to = to, logs = logs.len(), events = events.len(), "Window fetched");

        self.set_phase(Phase::Applying).await;
        let summary = self.processor.process_window(events).await?;

        if self.config.reserve_refresh {
            self.refresh_reserves(&summary.touched, to, state).await;
        }

        self.processor.store().save_checkpoint(to).await?;
        state.confirm(to);

        // A token inserted by a failed earlier attempt comes back as a
        // duplicate and is only counted once it joins the watch set
        for token in &summary.created {
            if state.watch(*token) {
                state.stats.tokens_indexed += 1;
            }
        }

        state.stats.events_applied += summary.applied;
        state.stats.trades_indexed += summary.trades;
        state.stats.duplicates_skipped += summary.duplicates;
        state.stats.unknown_token_events += summary.unknown_tokens;
        state.stats.curve_discrepancies += summary.curve_discrepancies;

        indexer_metrics::counters::blocks_processed(to - from + 1);
        indexer_metrics::gauges::set_last_confirmed_block(to);
        indexer_metrics::gauges::set_blocks_behind(head - to);
        indexer_metrics::gauges::set_watched_tokens(state.watched_tokens.len());

        Ok(TickOutcome::Applied { from, to, summary })
    }

    /// One `get_logs` per watched event kind over the same range
    async fn fetch_window(&self, from: u64, to: u64) -> Result<Vec<Log>> {
        let mut logs = Vec::new();
        for kind in LogKind::WATCHED {
            if let Some(signature) = kind.signature() {
                logs.extend(self.chain.get_logs(signature, from, to).await?);
            }
        }
        Ok(logs)
    }

    /// Re-read reserves pinned to the end of the window. Failures keep
    /// the event-derived values.
    async fn refresh_reserves(&self, tokens: &BTreeSet<Address>, at: u64, state: &mut ReconcilerState) {
        for token in tokens {
            let snapshot = match self.chain.read_reserves(*token, Some(at)).await {
                Ok(snapshot) => snapshot,
                Err(stale) => {
                    warn!(token = ?token, block = at, reason = %stale.reason, "Reserve read stale, keeping mirrored values");
                    indexer_metrics::counters::stale_reserve_reads(1);
                    state.stats.stale_reserve_reads += 1;
                    continue;
                }
            };

            match self
                .processor
                .store()
                .apply_reserve_update(snapshot.into_update(*token))
                .await
            {
                Ok(changed) => {
                    if changed {
                        debug!(token = ?token, block = at, "Reserves refreshed from chain");
                    }
                }
                Err(e) => warn!(token = ?token, error = %e, "Failed to store refreshed reserves"),
            }
        }
    }

    /// Bootstrap, retrying every poll period while the store is
    /// unavailable, then drive ticks until shutdown
    pub async fn start(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let period = self.poll_period();
        let state = loop {
            match self.bootstrap().await {
                Ok(state) => break state,
                Err(e) => {
                    error!(error = %e, retry_ms = period.as_millis() as u64, "Reconciler bootstrap failed");
                    indexer_metrics::counters::errors(1, "bootstrap");
                    self.status.write().await.last_error = Some(e.to_string());

                    tokio::select! {
                        _ = tokio::time::sleep(period) => {}
                        _ = shutdown.recv() => {
                            info!("Reconciler shutting down before bootstrap");
                            return;
                        }
                    }
                }
            }
        };

        self.run(state, shutdown).await;
    }

    /// Drive ticks on a fixed period until shutdown
    pub async fn run(self: Arc<Self>, mut state: ReconcilerState, mut shutdown: broadcast::Receiver<()>) {
        let period = self.poll_period();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poll_ms = self.config.poll_interval_ms,
            window = self.config.window_blocks,
            cursor = ?state.last_confirmed_block,
            "Reconciler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Errors are recorded by `tick`; the next period retries
                    let _ = self.tick(&mut state).await;
                }
                _ = shutdown.recv() => {
                    info!(cursor = ?state.last_confirmed_block, "Reconciler shutting down");
                    break;
                }
            }
        }
    }

    fn poll_period(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms.max(1))
    }

    async fn set_phase(&self, phase: Phase) {
        self.status.write().await.phase = phase;
    }

    async fn publish_status(&self, state: &ReconcilerState, last_error: Option<String>) {
        let mut status = self.status.write().await;
        status.phase = Phase::Idle;
        status.last_confirmed_block = state.last_confirmed_block;
        status.watched_tokens = state.watched_tokens.len();
        status.stats = state.stats.clone();
        status.last_error = last_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{check_range, ReserveSnapshot};
    use alloy_primitives::{Log as PrimitiveLog, LogData, B256, U256};
    use alloy_sol_types::SolEvent;
    use async_trait::async_trait;
    use indexer_core::events::{TokenCreated, TokensPurchased, TokensSold};
    use indexer_core::types::{Comment, ReserveUpdate, Reserves, StatsTotals, Token, Trade};
    use indexer_core::{IndexerError, StaleRead};
    use indexer_notifier::{Frame, Notifier, NotifierConfig};
    use indexer_processor::{CompositeSink, NotifierSink};
    use indexer_store::{InMemoryStore, MirrorStore, TokenQuery, TradeQuery};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn factory() -> Address {
        Address::repeat_byte(0xfa)
    }

    fn token_t() -> Address {
        Address::repeat_byte(0x11)
    }

    fn creator_c() -> Address {
        Address::repeat_byte(0xc0)
    }

    fn wrap(data: LogData, block: u64, log_index: u64) -> Log {
        Log {
            inner: PrimitiveLog { address: factory(), data },
            block_hash: Some(B256::repeat_byte(0xbb)),
            block_number: Some(block),
            block_timestamp: Some(1_700_000_000 + block),
            transaction_hash: Some(B256::left_padding_from(&(block * 1000 + log_index).to_be_bytes())),
            transaction_index: Some(0),
            log_index: Some(log_index),
            removed: false,
        }
    }

    fn created_log(block: u64) -> Log {
        let event = TokenCreated {
            token: token_t(),
            creator: creator_c(),
            name: "Claw".to_string(),
            symbol: "CLAW".to_string(),
            timestamp: U256::from(1_700_000_000u64),
        };
        wrap(event.encode_log_data(), block, 0)
    }

    fn purchased_log(block: u64) -> Log {
        let event = TokensPurchased {
            token: token_t(),
            buyer: creator_c(),
            ethIn: U256::from(500u64),
            tokensOut: U256::from(100_000u64),
            fee: U256::from(5u64),
            newReserveETH: U256::from(505u64),
            newReserveTokens: U256::from(999_900_000u64),
        };
        wrap(event.encode_log_data(), block, 1)
    }

    fn sold_log(block: u64) -> Log {
        let event = TokensSold {
            token: token_t(),
            seller: creator_c(),
            tokensIn: U256::from(50_000u64),
            ethOut: U256::from(100u64),
            newReserveETH: U256::from(405u64),
            newReserveTokens: U256::from(999_950_000u64),
        };
        wrap(event.encode_log_data(), block, 2)
    }

    /// In-memory store with injectable one-shot failures
    #[derive(Default)]
    struct FlakyStore {
        inner: Arc<InMemoryStore>,
        failing_trades: AtomicU32,
        failing_checkpoint_loads: AtomicU32,
    }

    impl FlakyStore {
        fn trip(counter: &AtomicU32, what: &str) -> Result<()> {
            match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)) {
                Ok(_) => Err(IndexerError::Store(format!("injected {} failure", what))),
                Err(_) => Ok(()),
            }
        }
    }

    #[async_trait]
    impl MirrorStore for FlakyStore {
        async fn upsert_token_on_create(&self, token: Token) -> Result<bool> {
            self.inner.upsert_token_on_create(token).await
        }

        async fn record_trade(&self, trade: Trade) -> Result<bool> {
            Self::trip(&self.failing_trades, "trade")?;
            self.inner.record_trade(trade).await
        }

        async fn apply_reserve_update(&self, update: ReserveUpdate) -> Result<bool> {
            self.inner.apply_reserve_update(update).await
        }

        async fn get_token(&self, address: &Address) -> Result<Option<Token>> {
            self.inner.get_token(address).await
        }

        async fn list_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>> {
            self.inner.list_tokens(query).await
        }

        async fn list_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
            self.inner.list_trades(query).await
        }

        async fn list_comments(&self, token: &Address, limit: usize) -> Result<Vec<Comment>> {
            self.inner.list_comments(token, limit).await
        }

        async fn agent_by_wallet(&self, wallet: &Address) -> Result<Option<String>> {
            self.inner.agent_by_wallet(wallet).await
        }

        async fn known_token_addresses(&self) -> Result<Vec<Address>> {
            self.inner.known_token_addresses().await
        }

        async fn load_checkpoint(&self) -> Result<Option<u64>> {
            Self::trip(&self.failing_checkpoint_loads, "checkpoint")?;
            self.inner.load_checkpoint().await
        }

        async fn save_checkpoint(&self, block: u64) -> Result<()> {
            self.inner.save_checkpoint(block).await
        }

        async fn stats_totals(&self, now: u64) -> Result<StatsTotals> {
            self.inner.stats_totals(now).await
        }
    }

    /// Scripted chain: a fixed set of logs, a settable head and optional
    /// injected failures
    #[derive(Default)]
    struct ScriptedChain {
        head: Mutex<u64>,
        logs: Mutex<Vec<Log>>,
        reserves: Mutex<HashMap<Address, ReserveSnapshot>>,
        fail_on_signature: Mutex<Option<B256>>,
        queried: Mutex<Vec<(u64, u64)>>,
        gate: Option<Arc<Notify>>,
        entered: Option<Arc<Notify>>,
    }

    impl ScriptedChain {
        fn set_head(&self, head: u64) {
            *self.head.lock().unwrap() = head;
        }

        fn push(&self, log: Log) {
            self.logs.lock().unwrap().push(log);
        }

        fn queried(&self) -> Vec<(u64, u64)> {
            self.queried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChainClient for ScriptedChain {
        async fn current_height(&self) -> Result<u64> {
            if let (Some(entered), Some(gate)) = (&self.entered, &self.gate) {
                entered.notify_one();
                gate.notified().await;
            }
            Ok(*self.head.lock().unwrap())
        }

        async fn get_logs(&self, signature: B256, from: u64, to: u64) -> Result<Vec<Log>> {
            check_range(from, to)?;
            self.queried.lock().unwrap().push((from, to));
            if *self.fail_on_signature.lock().unwrap() == Some(signature) {
                return Err(IndexerError::ChainUnavailable("injected".to_string()));
            }
            Ok(self
                .logs
                .lock()
                .unwrap()
                .iter()
                .filter(|log| {
                    let block = log.block_number.unwrap_or_default();
                    log.topics().first() == Some(&signature) && block >= from && block <= to
                })
                .cloned()
                .collect())
        }

        async fn read_reserves(
            &self,
            token: Address,
            _at_block: Option<u64>,
        ) -> std::result::Result<ReserveSnapshot, StaleRead> {
            self.reserves
                .lock()
                .unwrap()
                .get(&token)
                .copied()
                .ok_or(StaleRead {
                    token,
                    reason: "scripted".to_string(),
                })
        }
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        chain: Arc<ScriptedChain>,
        notifier: Notifier,
        reconciler: Arc<Reconciler>,
    }

    async fn harness(chain: ScriptedChain) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        build(chain, store.clone(), store, ReconcilerConfig::default()).await
    }

    async fn flaky_harness(chain: ScriptedChain, flaky: FlakyStore, config: ReconcilerConfig) -> Harness {
        let memory = flaky.inner.clone();
        build(chain, Arc::new(flaky), memory, config).await
    }

    async fn build(
        chain: ScriptedChain,
        mirror: Arc<dyn MirrorStore>,
        store: Arc<InMemoryStore>,
        config: ReconcilerConfig,
    ) -> Harness {
        let chain = Arc::new(chain);
        let notifier = Notifier::new(mirror.clone(), NotifierConfig::default());

        let processor = Arc::new(EventProcessor::new(mirror));
        processor
            .set_sinks(CompositeSink::new().with_sink(Arc::new(NotifierSink::new(notifier.clone()))))
            .await;

        let reconciler = Arc::new(Reconciler::new(
            chain.clone(),
            EventDecoder::new(factory()),
            processor,
            config,
        ));

        Harness {
            store,
            chain,
            notifier,
            reconciler,
        }
    }

    fn frame_json(frame: Frame) -> serde_json::Value {
        match frame {
            Frame::Text(text) => serde_json::from_str(&text).unwrap(),
            Frame::Probe => serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_then_create_then_buy() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(10_000);
        h.chain.push(created_log(9_800));

        let mut state = h.reconciler.bootstrap().await.unwrap();
        assert_eq!(state.last_confirmed_block, None);

        let outcome = h.reconciler.tick(&mut state).await.unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Applied {
                from: 9_501,
                to: 10_000,
                summary: WindowSummary {
                    applied: 1,
                    created: vec![token_t()],
                    ..Default::default()
                },
            }
        );
        assert!(h.store.tokens.contains(&token_t()));
        assert_eq!(h.store.trades.count(), 0);
        assert!(state.is_watched(&token_t()));
        assert_eq!(h.store.load_checkpoint().await.unwrap(), Some(10_000));

        let mut sub = h.notifier.subscribe().await;
        assert_eq!(frame_json(sub.receiver.recv().await.unwrap())["type"], "stats");

        h.chain.set_head(10_010);
        h.chain.push(purchased_log(10_005));
        h.reconciler.tick(&mut state).await.unwrap();

        let trades = h.store.trades.query(&Default::default());
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.direction.as_str(), "BUY");
        assert_eq!(trade.amount_in, U256::from(500u64));
        assert_eq!(trade.amount_out, U256::from(100_000u64));
        assert_eq!(trade.fee, U256::from(5u64));
        assert_eq!(h.store.tokens.get(&token_t()).unwrap().reserves.base, U256::from(505u64));

        let event = frame_json(sub.receiver.recv().await.unwrap());
        assert_eq!(event["type"], "event");
        assert_eq!(event["data"]["type"], "buy");
        assert_eq!(frame_json(sub.receiver.recv().await.unwrap())["type"], "stats");
        assert!(sub.receiver.try_recv().is_err());

        assert_eq!(state.last_confirmed_block, Some(10_010));
        assert_eq!(state.stats.trades_indexed, 1);
        assert_eq!(state.stats.stale_reserve_reads, 1);
    }

    #[tokio::test]
    async fn test_failed_window_is_retried_over_same_range() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(2_000);
        h.chain.push(created_log(1_900));
        h.chain.push(purchased_log(1_950));
        *h.chain.fail_on_signature.lock().unwrap() = Some(TokensPurchased::SIGNATURE_HASH);

        let mut state = ReconcilerState::new(Some(1_500), []);
        assert!(h.reconciler.tick(&mut state).await.is_err());
        assert_eq!(state.last_confirmed_block, Some(1_500));
        assert_eq!(state.stats.ticks_failed, 1);
        assert_eq!(h.store.load_checkpoint().await.unwrap(), None);
        assert!(h.reconciler.status().await.last_error.is_some());

        *h.chain.fail_on_signature.lock().unwrap() = None;
        h.reconciler.tick(&mut state).await.unwrap();

        let queried = h.chain.queried();
        assert!(queried.iter().all(|range| *range == (1_501, 2_000)));
        assert_eq!(state.last_confirmed_block, Some(2_000));
        assert_eq!(h.store.trades.count(), 1);
        assert!(h.reconciler.status().await.last_error.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_mid_window_is_retried_without_duplicates() {
        let flaky = FlakyStore {
            failing_trades: AtomicU32::new(1),
            ..Default::default()
        };
        let h = flaky_harness(ScriptedChain::default(), flaky, ReconcilerConfig::default()).await;
        h.chain.set_head(2_000);
        h.chain.push(created_log(1_900));
        h.chain.push(purchased_log(1_950));

        // The token is written before the trade write fails
        let mut state = ReconcilerState::new(Some(1_500), []);
        assert!(h.reconciler.tick(&mut state).await.is_err());
        assert_eq!(state.last_confirmed_block, Some(1_500));
        assert_eq!(h.store.load_checkpoint().await.unwrap(), None);
        assert!(h.store.tokens.contains(&token_t()));
        assert!(!state.is_watched(&token_t()));

        h.reconciler.tick(&mut state).await.unwrap();

        assert!(h.chain.queried().iter().all(|range| *range == (1_501, 2_000)));
        assert_eq!(state.last_confirmed_block, Some(2_000));
        assert_eq!(h.store.load_checkpoint().await.unwrap(), Some(2_000));
        assert_eq!(h.store.tokens.count(), 1);
        assert_eq!(h.store.trades.count(), 1);

        // The creation came back as a duplicate but the token is still tracked
        assert!(state.is_watched(&token_t()));
        assert_eq!(state.stats.tokens_indexed, 1);
        assert_eq!(state.stats.trades_indexed, 1);
        assert_eq!(state.stats.ticks_failed, 1);
    }

    #[tokio::test]
    async fn test_sell_is_mirrored_once_across_replays() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(100);
        h.chain.push(created_log(90));
        h.chain.push(purchased_log(92));
        h.chain.push(sold_log(95));

        let mut sub = h.notifier.subscribe().await;
        assert_eq!(frame_json(sub.receiver.recv().await.unwrap())["type"], "stats");

        let mut state = ReconcilerState::new(Some(50), []);
        h.reconciler.tick(&mut state).await.unwrap();

        // Replay the same range as after a lost checkpoint
        let mut replay = ReconcilerState::new(Some(50), []);
        match h.reconciler.tick(&mut replay).await.unwrap() {
            TickOutcome::Applied { summary, .. } => {
                assert_eq!(summary.applied, 0);
                assert_eq!(summary.duplicates, 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let trades = h.store.trades.query(&TradeQuery {
            limit: 10,
            ..Default::default()
        });
        assert_eq!(trades.len(), 2);
        let sell = trades
            .iter()
            .find(|t| t.direction.as_str() == "SELL")
            .unwrap();
        assert_eq!(sell.fee, U256::ZERO);
        assert_eq!(sell.amount_in, U256::from(50_000u64));
        assert_eq!(sell.amount_out, U256::from(100u64));

        let token = h.store.tokens.get(&token_t()).unwrap();
        assert_eq!(token.reserves.base, U256::from(405u64));
        assert_eq!(token.reserves.quote, U256::from(999_950_000u64));

        let mut events = Vec::new();
        while let Ok(frame) = sub.receiver.try_recv() {
            let json = frame_json(frame);
            if json["type"] == "event" {
                events.push(json["data"]["type"].as_str().unwrap().to_string());
            }
        }
        assert_eq!(events, vec!["deploy", "buy", "sell"]);
    }

    #[tokio::test]
    async fn test_start_retries_bootstrap_until_store_answers() {
        let flaky = FlakyStore {
            failing_checkpoint_loads: AtomicU32::new(2),
            ..Default::default()
        };
        let config = ReconcilerConfig {
            poll_interval_ms: 10,
            ..Default::default()
        };
        let h = flaky_harness(ScriptedChain::default(), flaky, config).await;
        h.chain.set_head(100);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(h.reconciler.clone().start(shutdown_rx));

        let confirmed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if h.reconciler.status().await.last_confirmed_block == Some(100) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(confirmed.is_ok());
        assert!(h.reconciler.status().await.last_error.is_none());

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_reserve_read_keeps_event_values() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(100);
        h.chain.push(created_log(90));
        h.chain.push(purchased_log(95));

        let mut state = ReconcilerState::new(Some(50), []);
        h.reconciler.tick(&mut state).await.unwrap();

        let token = h.store.tokens.get(&token_t()).unwrap();
        assert_eq!(token.reserves.base, U256::from(505u64));
        assert_eq!(token.reserves.quote, U256::from(999_900_000u64));
        assert_eq!(state.stats.stale_reserve_reads, 1);
    }

    #[tokio::test]
    async fn test_reserve_refresh_overwrites_from_chain() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(100);
        h.chain.push(created_log(90));
        h.chain.push(purchased_log(95));
        h.chain.reserves.lock().unwrap().insert(
            token_t(),
            ReserveSnapshot {
                reserves: Reserves::new(U256::from(700u64), U256::from(999_000_000u64)),
                migrated: false,
                pool: None,
            },
        );

        let mut state = ReconcilerState::new(Some(50), []);
        h.reconciler.tick(&mut state).await.unwrap();

        let token = h.store.tokens.get(&token_t()).unwrap();
        assert_eq!(token.reserves.base, U256::from(700u64));
        assert_eq!(state.stats.stale_reserve_reads, 0);
    }

    #[tokio::test]
    async fn test_window_is_bounded_and_idle_when_caught_up() {
        let h = harness(ScriptedChain::default()).await;
        h.chain.set_head(5_000);

        let mut state = ReconcilerState::new(Some(1_000), []);
        match h.reconciler.tick(&mut state).await.unwrap() {
            TickOutcome::Applied { from, to, .. } => {
                assert_eq!(from, 1_001);
                assert_eq!(to, 2_000);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let mut caught_up = ReconcilerState::new(Some(5_000), []);
        assert_eq!(
            h.reconciler.tick(&mut caught_up).await.unwrap(),
            TickOutcome::Idle { head: 5_000 }
        );
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let chain = ScriptedChain {
            gate: Some(gate.clone()),
            entered: Some(entered.clone()),
            ..Default::default()
        };
        let h = harness(chain).await;
        h.chain.set_head(100);

        let reconciler = h.reconciler.clone();
        let first = tokio::spawn(async move {
            let mut state = ReconcilerState::new(Some(90), []);
            reconciler.tick(&mut state).await
        });

        entered.notified().await;
        let mut other = ReconcilerState::new(Some(90), []);
        assert_eq!(
            h.reconciler.tick(&mut other).await.unwrap(),
            TickOutcome::Skipped
        );
        assert_eq!(other.last_confirmed_block, Some(90));

        gate.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, TickOutcome::Applied { to: 100, .. }));
    }
}
