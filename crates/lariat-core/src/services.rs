//! Process-wide record of services and proxies living in this process.
//!
//! The server runner records each hosted module here; proxy construction
//! records the interface it fronts. The client reads the map to stamp the
//! `X-Client-Service-Name` / `X-Client-ServiceProxyName` headers on
//! outgoing calls, so the receiving side can tell which service is calling.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

static REGISTERED: Lazy<RwLock<HashMap<String, HashSet<String>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Record a hosted service. Returns false if the name was already present.
pub fn add_service(service_name: &str) -> bool {
    let mut map = REGISTERED.write();
    if map.contains_key(service_name) {
        return false;
    }
    map.insert(service_name.to_owned(), HashSet::new());
    true
}

/// Record a proxy created for `service_name`.
pub fn add_proxy(service_name: &str, proxy_name: &str) {
    REGISTERED
        .write()
        .entry(service_name.to_owned())
        .or_default()
        .insert(proxy_name.to_owned());
}

/// Names of all services hosted in this process.
pub fn service_names() -> Vec<String> {
    REGISTERED.read().keys().cloned().collect()
}

/// First (service, proxy) pair, used for caller-identity headers.
pub fn caller_identity() -> Option<(String, Option<String>)> {
    let map = REGISTERED.read();
    map.iter()
        .next()
        .map(|(service, proxies)| (service.clone(), proxies.iter().next().cloned()))
}

/// Clear all recorded info. Intended for process shutdown and tests.
pub fn clear() {
    REGISTERED.write().clear();
}
