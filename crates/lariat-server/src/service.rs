//! Service runner: builds every module's registration, resolves the
//! endpoint, serves HTTP and keeps the service directory in sync.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

use lariat_core::{Result, services};

use crate::config::ServiceConfig;
use crate::discovery::{ServiceDirectory, ServiceRegistration};
use crate::endpoint::{self, BindProbe};
use crate::http::{self, Router};
use crate::registry::{ModuleRegistration, ModulesRegistry};

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    registered_ids: Vec<String>,
    base_url: String,
}

/// Hosts every module from a registry under one HTTP endpoint.
///
/// Construction of any module's registration failing (a duplicate method
/// surface) aborts startup; so does an occupied explicit port or an
/// exhausted port range.
pub struct RpcService {
    registry: Arc<dyn ModulesRegistry>,
    directory: Arc<dyn ServiceDirectory>,
    config: ServiceConfig,
    running: Option<Running>,
}

impl RpcService {
    pub fn new(registry: Arc<dyn ModulesRegistry>, directory: Arc<dyn ServiceDirectory>) -> Self {
        Self {
            registry,
            directory,
            config: ServiceConfig::from_env(),
            running: None,
        }
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Externally advertised base URL, once started.
    pub fn base_url(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.base_url.as_str())
    }

    /// Build all registrations, resolve the endpoint, start serving and
    /// register every module with the directory. Returns the advertised
    /// base URL.
    pub async fn start(&mut self) -> Result<String> {
        let modules = self.registry.all_services();

        let mut registrations: HashMap<String, Arc<ModuleRegistration>> = HashMap::new();
        for (name, module) in modules {
            let registration = ModuleRegistration::build(module).inspect_err(|e| {
                error!(service = name, error = %e, "module registration failed");
            })?;
            registrations.insert(name, Arc::new(registration));
        }

        let address = self
            .config
            .address
            .clone()
            .unwrap_or_else(endpoint::primary_ipv4);
        // A non-address hostname in config still advertises itself; binding
        // then falls back to all interfaces.
        let bind_address: IpAddr = address
            .parse()
            .unwrap_or_else(|_| Ipv4Addr::UNSPECIFIED.into());

        let probe = BindProbe::new(bind_address);
        let (listener, port) = endpoint::resolve(&self.config, bind_address, &probe).await?;
        let base_url = endpoint::advertised_url(&address, port);
        info!(url = %base_url, "starting RPC service");

        for (name, registration) in &registrations {
            registration.set_binding_url(format!("{}{}", base_url, name));
            services::add_service(name);
        }

        let router = Arc::new(Router::new(&registrations));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(http::run(listener, router, shutdown_rx));

        let mut registered_ids = Vec::with_capacity(registrations.len());
        for name in registrations.keys() {
            let entry = ServiceRegistration::new(name, &address, port, &base_url);
            self.directory.register(&entry).await?;
            registered_ids.push(entry.id);
        }
        info!(
            count = registered_ids.len(),
            services = registered_ids.join(", "),
            "registered services in directory"
        );

        self.running = Some(Running {
            shutdown,
            task,
            registered_ids,
            base_url: base_url.clone(),
        });
        Ok(base_url)
    }

    /// Stop serving and deregister every module.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(());
            let _ = running.task.await;
            for id in running.registered_ids {
                self.directory.deregister(&id).await?;
            }
            info!("RPC service stopped");
        }
        Ok(())
    }
}
