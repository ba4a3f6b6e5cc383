//! # Lariat server
//!
//! Server side of the Lariat RPC framework: turns a set of modules into an
//! HTTP-hosted JSON-RPC service.
//!
//! A module's remotely callable surface is assembled from its own methods
//! plus the methods declared by the interfaces it implements, merged into
//! one immutable dispatch table at construction (see [`registry`]). Each
//! inbound request is parsed, bound against the canonical signature and
//! invoked by the [`dispatch::Dispatcher`]; the [`service::RpcService`]
//! runner resolves a listening port, serves HTTP and registers every module
//! with a service directory.

pub mod binder;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod endpoint;
pub mod http;
pub mod method;
pub mod registry;
pub mod service;

pub use binder::bind;
pub use config::ServiceConfig;
pub use discovery::{NoopDirectory, ServiceDirectory, ServiceRegistration};
pub use dispatch::{CallerInfo, Dispatcher};
pub use endpoint::{BindProbe, PortProbe};
pub use method::{
    Declaration, Invoker, MethodDef, MethodDescriptor, MethodHandle, ParamSpec, from_arg,
};
pub use registry::{
    InterfaceDef, ModuleRegistration, ModulesRegistry, RpcModule, StaticModulesRegistry,
};
pub use service::RpcService;

pub use lariat_core::{Error, Result};
