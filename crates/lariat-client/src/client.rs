//! Client call pipeline: one logical remote call per invocation.

use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use url::Url;
use uuid::Uuid;

use lariat_core::{Credentials, Error, Result, RpcRequest, RpcResponse, headers, services};

use crate::config::ClientConfig;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:12345";

/// Everything needed for one logical call.
pub struct CallParams {
    pub service_name: String,
    pub method_name: String,
    /// Named arguments, formal parameter name to value.
    pub args: Map<String, Value>,
    /// Interface the call originates from; sent as a correlation header.
    pub proxy_interface: &'static str,
    pub credentials: Option<Arc<dyn Credentials>>,
}

/// Performs remote calls against one endpoint. Holds no per-call state, so
/// a single instance may be shared and invoked concurrently.
pub struct RpcClient {
    endpoint: Url,
    http: reqwest::Client,
    config: ClientConfig,
}

impl RpcClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::transport(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::transport(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            endpoint,
            http,
            config,
        })
    }

    /// Client against the conventional local endpoint.
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_ENDPOINT)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn service_url(&self, service_name: &str) -> String {
        let base = self.endpoint.as_str();
        if base.ends_with('/') {
            format!("{}{}", base, service_name)
        } else {
            format!("{}/{}", base, service_name)
        }
    }

    /// Perform one logical remote call and deserialize its result.
    ///
    /// A null or absent result yields the type default. A response with
    /// `error` set is raised as [`Error::Remote`] with the remote message
    /// and stack preserved; timer expiry abandons the exchange with
    /// [`Error::Timeout`] without waiting for the network operation.
    pub async fn call<T>(&self, params: CallParams) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let id = Uuid::new_v4().to_string();
        let request = RpcRequest::named(
            id.as_str(),
            params.method_name.to_lowercase(),
            params.args,
        );
        let url = self.service_url(&params.service_name);

        trace!(
            service = params.service_name,
            method = params.method_name,
            request_id = id,
            proxy = params.proxy_interface,
            "request sent"
        );

        let mut outgoing = self
            .http
            .post(&url)
            .json(&request)
            .header(headers::CLIENT_IP, local_ip().as_str())
            .header(headers::CLIENT_PROCESS_NAME, process_name().as_str())
            .header(headers::CLIENT_PROXY_INTERFACE, params.proxy_interface);
        if let Some((service, proxy)) = services::caller_identity() {
            outgoing = outgoing.header(headers::CLIENT_SERVICE_NAME, service);
            if let Some(proxy) = proxy {
                outgoing = outgoing.header(headers::CLIENT_SERVICE_PROXY_NAME, proxy);
            }
        }
        if let Some(credentials) = &params.credentials {
            outgoing = outgoing.header(AUTHORIZATION, credentials.header_value());
        }

        let exchange = async {
            let response = outgoing.send().await?;
            response.bytes().await
        };
        let body = match tokio::time::timeout(self.config.timeout, exchange).await {
            Err(_) => {
                warn!(
                    service = params.service_name,
                    method = params.method_name,
                    request_id = id,
                    "timeout occurred during service invocation"
                );
                return Err(Error::Timeout(self.config.timeout));
            }
            Ok(Err(e)) if e.is_timeout() => return Err(Error::Timeout(self.config.timeout)),
            Ok(Err(e)) => return Err(Error::transport(e)),
            Ok(Ok(body)) => body,
        };

        if body.is_empty() {
            return Err(Error::EmptyResponse(url));
        }
        let response: RpcResponse = serde_json::from_slice(&body)?;

        debug!(
            service = params.service_name,
            method = params.method_name,
            request_id = id,
            status = if response.is_error() { "fail" } else { "ok" },
            "response received"
        );

        match response.into_result()? {
            Some(value) => serde_json::from_value(value).map_err(Error::from),
            None => Ok(T::default()),
        }
    }
}

/// Short name of the current process, resolved once.
fn process_name() -> &'static String {
    static NAME: Lazy<String> = Lazy::new(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_owned())
    });
    &NAME
}

/// Primary outward-facing IPv4 address of this host, resolved once.
fn local_ip() -> &'static String {
    static IP: Lazy<String> = Lazy::new(|| {
        UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .and_then(|socket| {
                socket.connect(("8.8.8.8", 80))?;
                socket.local_addr()
            })
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|_| Ipv4Addr::LOCALHOST.to_string())
    });
    &IP
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> RpcClient {
        RpcClient::new(endpoint).unwrap()
    }

    #[test]
    fn service_url_handles_trailing_slash() {
        assert_eq!(
            client("http://10.0.0.1:5678").service_url("Calc"),
            "http://10.0.0.1:5678/Calc"
        );
        assert_eq!(
            client("http://10.0.0.1:5678/").service_url("Calc"),
            "http://10.0.0.1:5678/Calc"
        );
    }

    #[test]
    fn rejects_invalid_endpoint() {
        assert!(matches!(
            RpcClient::new("not a url"),
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test]
    async fn empty_body_is_reported_as_empty_response() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
                .await;
        });

        let client = RpcClient::new(&format!("http://{}", addr)).unwrap();
        let result: Result<i64> = client
            .call(CallParams {
                service_name: "Calc".into(),
                method_name: "Add".into(),
                args: Map::new(),
                proxy_interface: "ICalc",
                credentials: None,
            })
            .await;
        assert!(matches!(result, Err(Error::EmptyResponse(_))));
    }

    #[tokio::test]
    async fn timeout_wins_the_race_against_a_hanging_server() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept, read the request, never answer.
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            std::future::pending::<()>().await;
        });

        let timeout = std::time::Duration::from_millis(300);
        let client = RpcClient::with_config(
            &format!("http://{}", addr),
            ClientConfig::default().timeout(timeout),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result: Result<i64> = client
            .call(CallParams {
                service_name: "Calc".into(),
                method_name: "Add".into(),
                args: Map::new(),
                proxy_interface: "ICalc",
                credentials: None,
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout(t)) if t == timeout));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Reserved TEST-NET-1 address; nothing listens there.
        let client = RpcClient::with_config(
            "http://192.0.2.1:9",
            ClientConfig::default().timeout(std::time::Duration::from_millis(200)),
        )
        .unwrap();
        let result: Result<i64> = client
            .call(CallParams {
                service_name: "Calc".into(),
                method_name: "Add".into(),
                args: Map::new(),
                proxy_interface: "ICalc",
                credentials: None,
            })
            .await;
        match result {
            Err(Error::Transport(_)) | Err(Error::Timeout(_)) => {}
            other => panic!("expected transport failure, got {:?}", other),
        }
    }
}
