//! HTTP host: routes `POST /{serviceName}` into the dispatcher, answers any
//! other method on a known path with the module descriptor string, and 404s
//! unknown paths.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use lariat_core::{RpcError, RpcResponse, headers};

use crate::dispatch::{CallerInfo, Dispatcher};
use crate::registry::ModuleRegistration;

impl CallerInfo {
    /// Lift caller identity from the correlation headers.
    pub fn from_headers(headers_map: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers_map
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            ip: get(headers::CLIENT_IP),
            process_name: get(headers::CLIENT_PROCESS_NAME),
            proxy_interface: get(headers::CLIENT_PROXY_INTERFACE),
            service_name: get(headers::CLIENT_SERVICE_NAME),
            proxy_name: get(headers::CLIENT_SERVICE_PROXY_NAME),
        }
    }
}

/// Maps URL path segments to per-module dispatchers.
pub struct Router {
    services: HashMap<String, Dispatcher>,
}

impl Router {
    pub fn new(registrations: &HashMap<String, Arc<ModuleRegistration>>) -> Self {
        let services = registrations
            .iter()
            .map(|(name, reg)| (name.clone(), Dispatcher::new(reg.clone())))
            .collect();
        Self { services }
    }

    pub async fn route(&self, req: Request<hyper::body::Incoming>) -> Response<Full<Bytes>> {
        let path = req.uri().path().trim_matches('/').to_owned();
        let Some(dispatcher) = self.services.get(&path) else {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::new()))
                .unwrap();
        };

        if req.method() != Method::POST {
            // Human-readable module descriptor for browsers and health checks.
            let info = dispatcher.registration().module_info();
            return Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Full::new(Bytes::from(info)))
                .unwrap();
        }

        let caller = CallerInfo::from_headers(req.headers());
        let response = match req.into_body().collect().await {
            Ok(collected) => {
                dispatcher
                    .dispatch_bytes(&collected.to_bytes(), &caller)
                    .await
            }
            Err(e) => {
                warn!(service = path, error = %e, "failed to read request body");
                RpcResponse::failure(
                    None,
                    RpcError::new(format!("failed to read request body: {}", e), String::new()),
                )
            }
        };

        json_response(&response)
    }
}

fn json_response(response: &RpcResponse) -> Response<Full<Bytes>> {
    match serde_json::to_vec(response) {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap(),
        Err(e) => {
            warn!(error = %e, "failed to serialize response");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::new()))
                .unwrap()
        }
    }
}

/// Accept loop. Runs until the shutdown signal fires; each connection is
/// served on its own task.
pub async fn run(listener: TcpListener, router: Arc<Router>, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("http host shutting down");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                debug!(%peer, "connection accepted");
                let router = router.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let router = router.clone();
                        async move { Ok::<_, Infallible>(router.route(req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        debug!(error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
}
