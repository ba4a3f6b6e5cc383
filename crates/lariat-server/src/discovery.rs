//! Service-directory boundary.
//!
//! The runner announces each hosted module to an external directory (for
//! example Consul) once per resolved endpoint, and withdraws it at
//! shutdown. Only the Register/Deregister contract is consumed here; the
//! directory's own behavior is out of scope.

use std::time::Duration;

use async_trait::async_trait;

use lariat_core::Result;

/// One module's directory entry.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    /// Unique id, `{address}:{port}-{module}`.
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub health_check_url: String,
    pub check_interval: Duration,
    pub deregister_after: Duration,
}

impl ServiceRegistration {
    pub fn new(name: &str, address: &str, port: u16, base_url: &str) -> Self {
        Self {
            id: format!("{}:{}-{}", address, port, name),
            name: name.to_owned(),
            address: address.to_owned(),
            port,
            health_check_url: format!("{}{}", base_url, name),
            check_interval: Duration::from_secs(10),
            deregister_after: Duration::from_secs(3600),
        }
    }
}

#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    async fn register(&self, registration: &ServiceRegistration) -> Result<()>;
    async fn deregister(&self, service_id: &str) -> Result<()>;
}

/// Directory that accepts everything and records nothing. Used when no
/// directory is wired in, and by tests.
pub struct NoopDirectory;

#[async_trait]
impl ServiceDirectory for NoopDirectory {
    async fn register(&self, _registration: &ServiceRegistration) -> Result<()> {
        Ok(())
    }

    async fn deregister(&self, _service_id: &str) -> Result<()> {
        Ok(())
    }
}
