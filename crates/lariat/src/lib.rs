//! # Lariat
//!
//! A typed JSON-RPC service framework. A service is a set of modules;
//! each module exposes its own methods plus the methods of the contract
//! traits it implements, merged into one case-insensitive dispatch table.
//! Clients call through generated interface proxies or a raw [`client::RpcClient`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lariat::prelude::*;
//!
//! #[rpc_interface]
//! pub trait ICalculator {
//!     async fn add(&self, a: i64, b: i64) -> lariat::Result<i64>;
//! }
//!
//! struct Calculator;
//!
//! #[lariat::async_trait]
//! impl ICalculator for Calculator {
//!     async fn add(&self, a: i64, b: i64) -> lariat::Result<i64> {
//!         Ok(a + b)
//!     }
//! }
//!
//! impl RpcModule for Calculator {
//!     fn module_name(&self) -> &str {
//!         "Calculator"
//!     }
//!
//!     fn method_defs(self: Arc<Self>) -> Vec<MethodDef> {
//!         i_calculator_method_defs(self)
//!     }
//!
//!     fn interface_defs(&self) -> Vec<InterfaceDef> {
//!         vec![i_calculator_interface_def()]
//!     }
//! }
//! ```

pub use lariat_core::*;

pub use lariat_client as client;
pub use lariat_server as server;

pub use lariat_derive::{rpc_interface, rpc_methods};

// Generated code and module authors reach these through `::lariat::`.
pub use async_trait::async_trait;
pub use serde_json;

pub mod prelude;
