mod client;
mod reconciler;
mod rpc;

pub use client::{check_range, ChainClient, ReserveSnapshot};
pub use reconciler::{Phase, Reconciler, ReconcilerStatus, TickOutcome};
pub use rpc::{BoxedProvider, RpcChainClient};
