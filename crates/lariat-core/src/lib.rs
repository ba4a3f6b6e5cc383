//! # Lariat wire protocol
//!
//! Shared vocabulary for the Lariat RPC framework: the JSON-RPC style
//! request/response envelope, the wire error shape, the unified error
//! taxonomy, correlation headers and the credentials contract. No dispatch
//! logic lives here; this crate is consumed by both the server and the
//! client side.

pub mod credentials;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod services;
pub mod types;

pub use credentials::{BasicCredentials, Credentials};
pub use error::{Error, Result, RpcError};
pub use request::{Params, RpcRequest};
pub use response::RpcResponse;
pub use types::{RequestId, Version};

/// Protocol version marker carried by every envelope.
pub const PROTOCOL_VERSION: &str = "2.0";
