//! Common imports for service and client authors.

pub use lariat_core::{BasicCredentials, Credentials, Error, Result, RpcError};

pub use lariat_client::{CallParams, ClientConfig, RpcClient, RpcProxy, wait_for};
pub use lariat_server::{
    InterfaceDef, MethodDef, RpcModule, RpcService, ServiceConfig, StaticModulesRegistry,
};

pub use lariat_derive::{rpc_interface, rpc_methods};

pub use async_trait::async_trait;
