//! Correlation headers attached by the client and logged by the server.
//! All optional; used for observability only, never for routing.

pub const CLIENT_IP: &str = "X-Client-Ip";
pub const CLIENT_PROCESS_NAME: &str = "X-Client-ProcessName";
pub const CLIENT_PROXY_INTERFACE: &str = "X-Client-Proxyname";
pub const CLIENT_SERVICE_PROXY_NAME: &str = "X-Client-ServiceProxyName";
pub const CLIENT_SERVICE_NAME: &str = "X-Client-Service-Name";
