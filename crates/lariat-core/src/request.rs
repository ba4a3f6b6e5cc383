use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{RequestId, Version};

/// Call arguments: an object of named arguments or an array of positional
/// ones. Which form arrives is the caller's choice; the binder on the server
/// side handles both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Named(Map<String, Value>),
    Positional(Vec<Value>),
}

impl Params {
    /// Look up an argument by formal parameter name (named form only).
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(name),
            Params::Positional(_) => None,
        }
    }

    /// Look up an argument by position (positional form only).
    pub fn by_index(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(vec) => vec.get(index),
            Params::Named(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::Named(map) => map.is_empty(),
            Params::Positional(vec) => vec.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Named(map) => map.len(),
            Params::Positional(vec) => vec.len(),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl From<Vec<Value>> for Params {
    fn from(vec: Vec<Value>) -> Self {
        Params::Positional(vec)
    }
}

/// One remote call on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: Version,
    pub id: RequestId,
    /// Matched case-insensitively by the dispatcher.
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl RpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            jsonrpc: Version,
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Request with named arguments.
    pub fn named(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        args: Map<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(Params::Named(args)))
    }

    /// Request with positional arguments.
    pub fn positional(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self::new(id, method, Some(Params::Positional(args)))
    }
}
