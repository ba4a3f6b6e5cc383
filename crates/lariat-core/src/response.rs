use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, RpcError};
use crate::types::{RequestId, Version};

/// Wire response envelope. Exactly one of `result`/`error` is set; both are
/// null only when a void method completed. `id` echoes the request id, and
/// is null only when the request itself could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: Version,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<RequestId>,
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        let result = if result.is_null() { None } else { Some(result) };
        Self {
            jsonrpc: Version,
            result,
            error: None,
            id: Some(id),
        }
    }

    pub fn failure(id: Option<RequestId>, error: RpcError) -> Self {
        Self {
            jsonrpc: Version,
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Unwrap the envelope: a set `error` becomes [`Error::Remote`],
    /// otherwise the (possibly absent) result value is returned.
    pub fn into_result(self) -> Result<Option<Value>, Error> {
        match self.error {
            Some(error) => Err(Error::Remote(error)),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_null_error() {
        let resp = RpcResponse::success(RequestId::Number(1), json!(5));
        let wire = serde_json::to_value(&resp).unwrap();

        assert_eq!(wire["jsonrpc"], json!("2.0"));
        assert_eq!(wire["result"], json!(5));
        assert_eq!(wire["error"], Value::Null);
        assert_eq!(wire["id"], json!(1));
    }

    #[test]
    fn void_result_is_null() {
        let resp = RpcResponse::success(RequestId::Number(1), Value::Null);
        assert!(resp.result.is_none());
        assert!(!resp.is_error());
    }

    #[test]
    fn into_result_raises_remote_error() {
        let resp = RpcResponse::failure(
            Some("abc".into()),
            RpcError::new("boom", "somewhere deep"),
        );
        match resp.into_result() {
            Err(Error::Remote(e)) => {
                assert_eq!(e.message, "boom");
                assert_eq!(e.stack, "somewhere deep");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn echoes_id_verbatim() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","result":"ok","error":null,"id":"tok-9"}"#,
        )
        .unwrap();
        assert_eq!(resp.id, Some(RequestId::String("tok-9".into())));
    }
}
