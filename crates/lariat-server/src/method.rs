//! Compiled method handles.
//!
//! A [`MethodDef`] is the unit the registry merges: the method's descriptor
//! (exposed name plus parameter specs), where it was declared (the module
//! itself or one of its interfaces) and a compiled invoker. Invokers are
//! built once per module and never re-inspected per call; they take the
//! already-bound positional argument values and perform the typed call.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lariat_core::{Error, Params, Result};

use crate::binder::bind;

/// Compiled invocation closure: bound argument values in, result value out.
/// Safe for concurrent invocation; the closure owns its module instance.
pub type Invoker = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// One formal parameter of a canonical signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub optional: bool,
    /// Default supplied when an optional parameter is absent from the call.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            default: None,
        }
    }

    /// Optional parameter with no declared default; binds to null when absent.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            optional: true,
            default: Some(default),
        }
    }
}

/// Exposed name and parameter specs of one method.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Where a method was declared. Module-declared methods win over
/// interface-declared ones for the same exposed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Declaration {
    Module,
    Interface(&'static str),
}

/// A method as contributed to the registry merge.
pub struct MethodDef {
    pub descriptor: MethodDescriptor,
    pub declaration: Declaration,
    pub invoker: Invoker,
}

impl MethodDef {
    pub fn module_declared(descriptor: MethodDescriptor, invoker: Invoker) -> Self {
        Self {
            descriptor,
            declaration: Declaration::Module,
            invoker,
        }
    }

    pub fn interface_declared(
        descriptor: MethodDescriptor,
        interface: &'static str,
        invoker: Invoker,
    ) -> Self {
        Self {
            descriptor,
            declaration: Declaration::Interface(interface),
            invoker,
        }
    }
}

/// A merged, immutable binding from an exposed method name to its
/// invocation logic. The parameter specs here are the canonical signature
/// selected by the registry, which may come from an implemented interface
/// rather than the concrete method.
pub struct MethodHandle {
    specs: Vec<ParamSpec>,
    invoker: Invoker,
}

impl MethodHandle {
    pub(crate) fn new(specs: Vec<ParamSpec>, invoker: Invoker) -> Self {
        Self { specs, invoker }
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Bind the raw argument payload against the canonical signature and
    /// run the compiled invoker.
    pub async fn invoke(&self, params: Option<&Params>) -> Result<Value> {
        let args = bind(&self.specs, params)?;
        (self.invoker)(args).await
    }
}

/// Typed extraction of one bound argument inside a compiled invoker.
/// A conversion failure is a binding error naming the parameter.
pub fn from_arg<T: DeserializeOwned>(value: Option<Value>, name: &str) -> Result<T> {
    let value = value.unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| Error::binding(format!("parameter {}: {}", name, e)))
}
