use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result alias used across the framework. Remote method signatures return
/// this type; the dispatcher and the client pipeline both speak it.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error taxonomy for the framework.
///
/// Server-side errors are never thrown past the hosting boundary: the
/// dispatcher converts every variant into a wire [`RpcError`]. Client-side
/// local failures (transport, timeout, empty response) surface directly to
/// the caller; remote errors arrive as [`Error::Remote`] with the original
/// message and stack preserved.
#[derive(Debug, Error)]
pub enum Error {
    /// Two methods resolved to the same exposed name at registry build.
    /// Fatal: the module is unusable and the service cannot start.
    #[error("method {method} already exists in {module}")]
    DuplicateMethod { module: String, method: String },

    /// No handler registered under the requested name.
    #[error("Method not found. The method does not exist / is not available.")]
    MethodNotFound { module: String, method: String },

    /// A required parameter was absent, or a value failed typed conversion.
    #[error("parameter binding failed: {message}")]
    Binding { message: String },

    /// A handler failed; carries the handler's own message.
    #[error("{message}")]
    Invocation { message: String },

    /// Error received from the remote side of a call.
    #[error("{0}")]
    Remote(RpcError),

    /// Network-level failure. Eligible for retry by the reliability layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The per-call timer won the race against the network exchange.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The exchange completed but no response body was obtained. Not retried.
    #[error("Response from {0} is empty.")]
    EmptyResponse(String),

    /// Explicitly configured port is already bound. Fatal at startup.
    #[error("port {0} already in use")]
    PortInUse(u16),

    /// No bindable port in the configured range. Fatal at startup.
    #[error("no free port in range {0}-{1}")]
    NoFreePort(u16, u16),

    /// Service directory registration/deregistration failure.
    #[error("service directory error: {0}")]
    Directory(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn binding(message: impl Into<String>) -> Self {
        Error::Binding {
            message: message.into(),
        }
    }

    pub fn invocation(message: impl fmt::Display) -> Self {
        Error::Invocation {
            message: message.to_string(),
        }
    }

    pub fn transport(message: impl fmt::Display) -> Self {
        Error::Transport(message.to_string())
    }

    /// Transient failures are timeout/connection-class errors that the
    /// reliability layer may retry. Remote (protocol-level) errors are not
    /// transient: the call reached the server and failed there.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_) | Error::Io(_))
    }
}

/// Error shape on the wire. Carries the original message plus a stack that
/// accumulates one `handled by` line per dispatch boundary it crosses, so a
/// failure that hops through several services stays attributable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub message: String,
    #[serde(default)]
    pub stack: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
            code: None,
            data: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Wrap a framework error crossing a dispatch boundary, appending the
    /// handling module and method as causal context.
    ///
    /// A remote error passes through with its original message and stack;
    /// anything else is reduced to its innermost cause first.
    pub fn handled_by(err: &Error, module_info: &str, method: &str) -> Self {
        let context = format!("\n\n<---- handled by {}, {}", module_info, method);
        match err {
            Error::Remote(remote) => Self {
                message: remote.message.clone(),
                stack: format!("{}{}", remote.stack, context),
                code: remote.code,
                data: remote.data.clone(),
            },
            other => Self {
                message: innermost(other).to_string(),
                stack: context,
                code: None,
                data: None,
            },
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for RpcError {}

/// Walk a causal chain to its innermost cause. Wrapper layers added by
/// intermediate code are stripped before an error is put on the wire.
pub fn innermost<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}
