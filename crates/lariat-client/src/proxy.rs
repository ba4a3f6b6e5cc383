//! Interface proxies and the process-wide proxy cache.
//!
//! The `#[rpc_interface]` macro generates one adapter type per interface;
//! those adapters implement [`RpcProxy`] so the client can construct and
//! cache them. One proxy instance exists per (endpoint, service, interface)
//! key for the process lifetime; proxies are immutable wrappers over a
//! [`ProxyHandle`] and hold no request-specific state.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use lariat_core::{Credentials, Result, services};

use crate::client::{CallParams, RpcClient};

/// Implemented by generated interface adapters.
pub trait RpcProxy: Send + Sync + 'static {
    /// Name of the interface this proxy fronts.
    const INTERFACE_NAME: &'static str;

    fn bind(handle: ProxyHandle) -> Self;
}

/// Everything a proxy needs to forward a call: the client, the target
/// service and the credentials the proxy was created with.
#[derive(Clone)]
pub struct ProxyHandle {
    client: Arc<RpcClient>,
    service_name: String,
    interface_name: &'static str,
    credentials: Option<Arc<dyn Credentials>>,
}

impl ProxyHandle {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Forward one intercepted call into the pipeline.
    pub async fn invoke<T>(&self, method: &str, args: Map<String, Value>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.client
            .call(CallParams {
                service_name: self.service_name.clone(),
                method_name: method.to_owned(),
                args,
                proxy_interface: self.interface_name,
                credentials: self.credentials.clone(),
            })
            .await
    }
}

type CacheKey = (String, String, TypeId);

static PROXIES: Lazy<Mutex<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl RpcClient {
    /// Proxy for `service_name` implementing the interface behind `P`.
    /// Repeated calls for the same target return the same cached instance.
    pub fn proxy<P: RpcProxy>(self: &Arc<Self>, service_name: &str) -> Arc<P> {
        self.proxy_with_credentials(service_name, None)
    }

    pub fn proxy_with_credentials<P: RpcProxy>(
        self: &Arc<Self>,
        service_name: &str,
        credentials: Option<Arc<dyn Credentials>>,
    ) -> Arc<P> {
        let key = (
            self.endpoint().to_owned(),
            service_name.to_owned(),
            TypeId::of::<P>(),
        );
        let mut cache = PROXIES.lock();
        let entry = cache.entry(key).or_insert_with(|| {
            services::add_proxy(service_name, P::INTERFACE_NAME);
            let handle = ProxyHandle {
                client: self.clone(),
                service_name: service_name.to_owned(),
                interface_name: P::INTERFACE_NAME,
                credentials,
            };
            Arc::new(P::bind(handle))
        });
        match entry.clone().downcast::<P>() {
            Ok(proxy) => proxy,
            Err(_) => unreachable!("proxy cache key and value types diverged"),
        }
    }

    /// Proxy whose service name is derived from the interface name, with a
    /// leading `I` trimmed (`ICalculator` targets service `Calculator`).
    pub fn connect<P: RpcProxy>(self: &Arc<Self>) -> Arc<P> {
        let name = P::INTERFACE_NAME
            .strip_prefix('I')
            .unwrap_or(P::INTERFACE_NAME);
        self.proxy::<P>(name)
    }
}

/// Drop every cached proxy. Intended for process shutdown and tests.
pub fn clear_proxy_cache() {
    PROXIES.lock().clear();
}

/// Resolve a pending call from a synchronous proxy method.
///
/// Inside a multi-thread runtime the current worker is released while
/// blocking; outside any runtime a throwaway current-thread runtime drives
/// the future.
pub fn wait_for<F: Future>(future: F) -> F::Output {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build blocking runtime")
            .block_on(future),
    }
}
