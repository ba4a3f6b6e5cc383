use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Supplies the opaque `Authorization` header value attached to outgoing
/// calls. The server side treats the value as opaque; validating it is an
/// external collaborator's concern.
pub trait Credentials: Send + Sync {
    fn header_value(&self) -> String;
}

/// HTTP Basic authorization.
pub struct BasicCredentials {
    header: String,
}

impl BasicCredentials {
    pub fn new(login: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", login, password));
        Self {
            header: format!("Basic {}", encoded),
        }
    }
}

impl Credentials for BasicCredentials {
    fn header_value(&self) -> String {
        self.header.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_credentials_encode() {
        let creds = BasicCredentials::new("user", "pass");
        // "user:pass" in base64
        assert_eq!(creds.header_value(), "Basic dXNlcjpwYXNz");
    }
}
