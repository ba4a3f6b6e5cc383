//! # Lariat client
//!
//! Client side of the Lariat RPC framework. [`client::RpcClient`] performs
//! one logical remote call: build the envelope, POST it, race the exchange
//! against the configured timeout and unwrap the response. [`proxy`] turns
//! generated interface adapters into cached, strongly-typed proxies over
//! that pipeline, and [`retry`] adds bounded retry/backoff for
//! persistent-channel transports.

pub mod client;
pub mod config;
pub mod proxy;
pub mod retry;

pub use client::{CallParams, RpcClient};
pub use config::ClientConfig;
pub use proxy::{ProxyHandle, RpcProxy, clear_proxy_cache, wait_for};
pub use retry::{ChannelFactory, ReliableChannel, RetryPolicy};

pub use lariat_core::{Error, Result};
