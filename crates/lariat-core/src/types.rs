use std::fmt;

use serde::{Deserialize, Serialize};

/// Request correlation token. Opaque to the framework: the server echoes it
/// back verbatim, the client uses it to match log lines to calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => f.write_str(s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_owned())
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

/// Protocol version marker. Serializes as the constant `"2.0"` and rejects
/// anything else on the way in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

impl Version {
    pub fn as_str(&self) -> &'static str {
        crate::PROTOCOL_VERSION
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == crate::PROTOCOL_VERSION {
            Ok(Version)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported protocol version: {}",
                s
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_round_trips() {
        let s: RequestId = "abc-1".into();
        let n: RequestId = 42.into();

        assert_eq!(serde_json::to_string(&s).unwrap(), r#""abc-1""#);
        assert_eq!(serde_json::to_string(&n).unwrap(), "42");

        let parsed: RequestId = serde_json::from_str("17").unwrap();
        assert_eq!(parsed, RequestId::Number(17));
    }

    #[test]
    fn version_rejects_unknown() {
        assert!(serde_json::from_str::<Version>(r#""2.0""#).is_ok());
        assert!(serde_json::from_str::<Version>(r#""1.1""#).is_err());
    }
}
