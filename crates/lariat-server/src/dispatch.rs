//! Server dispatcher: one inbound call at a time, stateless across calls.
//!
//! `Received -> Parsed -> { MethodFound -> Bound -> Invoked -> { Succeeded |
//! Faulted } } | MethodNotFound`. Every failure past parsing produces an
//! error response echoing the request id; nothing is thrown past the
//! hosting boundary.

use std::sync::Arc;

use tracing::{debug, error, warn};

use lariat_core::{Error, RpcError, RpcRequest, RpcResponse};

use crate::registry::ModuleRegistration;

/// Caller identity lifted from the correlation headers. All fields optional;
/// used for logging only.
#[derive(Debug, Default, Clone)]
pub struct CallerInfo {
    pub ip: Option<String>,
    pub process_name: Option<String>,
    pub proxy_interface: Option<String>,
    pub service_name: Option<String>,
    pub proxy_name: Option<String>,
}

/// Dispatches requests against one module's immutable registration. Holds
/// no per-call state, so concurrent invocations are independent.
#[derive(Clone)]
pub struct Dispatcher {
    registration: Arc<ModuleRegistration>,
}

impl Dispatcher {
    pub fn new(registration: Arc<ModuleRegistration>) -> Self {
        Self { registration }
    }

    pub fn registration(&self) -> &ModuleRegistration {
        &self.registration
    }

    /// Parse a raw request body and dispatch it. A body that fails to parse
    /// produces an error response with a null id and no handler invocation.
    pub async fn dispatch_bytes(&self, body: &[u8], caller: &CallerInfo) -> RpcResponse {
        let request: RpcRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    service = self.registration.module_name(),
                    error = %e,
                    "failed to parse request body"
                );
                return RpcResponse::failure(
                    None,
                    RpcError::new(format!("Parse error: {}", e), String::new()),
                );
            }
        };
        self.dispatch(request, caller).await
    }

    /// Dispatch an already-parsed request.
    pub async fn dispatch(&self, request: RpcRequest, caller: &CallerInfo) -> RpcResponse {
        let service = self.registration.module_name();
        let method = request.method.to_lowercase();

        debug!(
            service,
            method,
            request_id = %request.id,
            caller_ip = caller.ip.as_deref(),
            caller_process = caller.process_name.as_deref(),
            caller_proxy = caller.proxy_interface.as_deref(),
            caller_service = caller.service_name.as_deref(),
            "request received"
        );

        let Some(handle) = self.registration.handler(&method) else {
            warn!(service, method, request_id = %request.id, "method not found");
            let err = Error::MethodNotFound {
                module: service.to_owned(),
                method: method.clone(),
            };
            return RpcResponse::failure(
                Some(request.id),
                RpcError::handled_by(&err, &self.registration.module_info(), &method),
            );
        };

        match handle.invoke(request.params.as_ref()).await {
            Ok(result) => {
                debug!(service, method, request_id = %request.id, "response sent");
                RpcResponse::success(request.id, result)
            }
            Err(err) => {
                let wire = RpcError::handled_by(&err, &self.registration.module_info(), &method);
                error!(
                    service,
                    method,
                    request_id = %request.id,
                    error = %wire.message,
                    "error occurred during method invocation"
                );
                RpcResponse::failure(Some(request.id), wire)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{Invoker, MethodDef, MethodDescriptor, ParamSpec, from_arg};
    use crate::registry::RpcModule;
    use lariat_core::RequestId;
    use serde_json::json;

    struct Calculator;

    impl RpcModule for Calculator {
        fn module_name(&self) -> &str {
            "Calculator"
        }

        fn method_defs(self: Arc<Self>) -> Vec<MethodDef> {
            let add: Invoker = Arc::new(|args| {
                Box::pin(async move {
                    let mut args = args.into_iter();
                    let a: i64 = from_arg(args.next(), "a")?;
                    let b: i64 = from_arg(args.next(), "b")?;
                    Ok(json!(a + b))
                })
            });
            let explode: Invoker = Arc::new(|_args| {
                Box::pin(async move { Err(Error::invocation("NotImplemented: x")) })
            });
            vec![
                MethodDef::module_declared(
                    MethodDescriptor::new(
                        "Add",
                        vec![ParamSpec::required("a"), ParamSpec::required("b")],
                    ),
                    add,
                ),
                MethodDef::module_declared(MethodDescriptor::new("Explode", vec![]), explode),
            ]
        }
    }

    fn dispatcher() -> Dispatcher {
        let registration = ModuleRegistration::build(Arc::new(Calculator)).unwrap();
        Dispatcher::new(Arc::new(registration))
    }

    #[tokio::test]
    async fn dispatches_named_call_and_echoes_id() {
        let body = br#"{"jsonrpc":"2.0","id":"tok-1","method":"Add","params":{"a":2,"b":3}}"#;
        let response = dispatcher()
            .dispatch_bytes(body, &CallerInfo::default())
            .await;
        assert_eq!(response.result, Some(json!(5)));
        assert!(response.error.is_none());
        assert_eq!(response.id, Some(RequestId::String("tok-1".into())));
    }

    #[tokio::test]
    async fn method_lookup_is_case_insensitive() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"ADD","params":[2,3]}"#;
        let response = dispatcher()
            .dispatch_bytes(body, &CallerInfo::default())
            .await;
        assert_eq!(response.result, Some(json!(5)));
    }

    #[tokio::test]
    async fn unknown_method_reports_not_found() {
        let body = br#"{"jsonrpc":"2.0","id":7,"method":"missing","params":{}}"#;
        let response = dispatcher()
            .dispatch_bytes(body, &CallerInfo::default())
            .await;
        let error = response.error.unwrap();
        assert!(error.message.contains("Method not found"));
        assert_eq!(response.id, Some(RequestId::Number(7)));
    }

    #[tokio::test]
    async fn handler_failure_carries_original_message_and_context() {
        let body = br#"{"jsonrpc":"2.0","id":2,"method":"explode"}"#;
        let response = dispatcher()
            .dispatch_bytes(body, &CallerInfo::default())
            .await;
        let error = response.error.unwrap();
        assert!(error.message.contains("x"));
        assert!(error.stack.contains("handled by Module [Calculator]"));
        assert!(error.stack.contains("explode"));
    }

    #[tokio::test]
    async fn missing_required_parameter_is_a_binding_failure() {
        let body = br#"{"jsonrpc":"2.0","id":3,"method":"add","params":{"a":2}}"#;
        let response = dispatcher()
            .dispatch_bytes(body, &CallerInfo::default())
            .await;
        let error = response.error.unwrap();
        assert!(error.message.contains("b"));
    }

    #[tokio::test]
    async fn unparseable_body_yields_error_without_invocation() {
        let response = dispatcher()
            .dispatch_bytes(b"not json", &CallerInfo::default())
            .await;
        assert!(response.error.unwrap().message.starts_with("Parse error"));
        assert_eq!(response.id, None);
    }
}
