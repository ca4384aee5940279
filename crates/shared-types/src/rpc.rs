//! JSON-RPC envelope exchanged over every connection.
//!
//! Error codes follow EIP-1474 (JSON-RPC) and EIP-1193 (provider errors).

use crate::entities::ActionId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Wire value of `result` while a request waits on user approval.
pub const DEFERRED_RESPONSE: &str = "DEFERRED_RESPONSE";

/// Standard error codes
pub mod codes {
    // JSON-RPC 2.0 standard errors
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // EIP-1193 provider errors
    pub const USER_REJECTED: i32 = 4001;
    pub const UNAUTHORIZED: i32 = 4100;
}

/// Request identifier as chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Num(i64),
    Str(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Num(n) => write!(f, "{n}"),
            RequestId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Num(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::Str(s.to_string())
    }
}

/// Origin of a dApp request, stamped by the pipeline from the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<u32>,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Inbound call.
///
/// Top-level fields other than `id`, `method`, `params` and `site` are kept in
/// `extra` and echoed back on the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Request {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params: None,
            site: None,
            extra: Map::new(),
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    /// Positional parameter `index`, treating non-array params as absent.
    pub fn param(&self, index: usize) -> Option<&Value> {
        match &self.params {
            Some(Value::Array(items)) => items.get(index),
            _ => None,
        }
    }

    /// Domain of the calling site, if the pipeline stamped one.
    pub fn domain(&self) -> Option<&str> {
        self.site.as_ref().map(|s| s.domain.as_str())
    }
}

/// Outcome carried by a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Terminal answer.
    Final(Result<Value, RpcError>),
    /// Acknowledgement that an approval is pending; the terminal answer
    /// follows on the same connection with the same id.
    Deferred { action_id: ActionId },
}

/// Reply to a [`Request`]: the request fields plus exactly one of
/// `result`/`error`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub request: Request,
    pub body: ResponseBody,
}

impl Response {
    pub fn result(request: Request, value: Value) -> Self {
        Self {
            request,
            body: ResponseBody::Final(Ok(value)),
        }
    }

    pub fn error(request: Request, error: RpcError) -> Self {
        Self {
            request,
            body: ResponseBody::Final(Err(error)),
        }
    }

    pub fn deferred(request: Request, action_id: ActionId) -> Self {
        Self {
            request,
            body: ResponseBody::Deferred { action_id },
        }
    }

    pub fn from_result(request: Request, outcome: Result<Value, RpcError>) -> Self {
        Self {
            request,
            body: ResponseBody::Final(outcome),
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.request.id
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.body, ResponseBody::Deferred { .. })
    }

    /// JSON object as written to the wire.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut object = match serde_json::to_value(&self.request)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        // Never echo a caller-supplied result/error next to ours.
        object.remove("result");
        object.remove("error");
        match &self.body {
            ResponseBody::Final(Ok(value)) => {
                object.insert("result".into(), value.clone());
            }
            ResponseBody::Final(Err(error)) => {
                object.insert("error".into(), serde_json::to_value(error)?);
            }
            ResponseBody::Deferred { .. } => {
                object.insert("result".into(), Value::String(DEFERRED_RESPONSE.into()));
            }
        }
        Ok(Value::Object(object))
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Error carried in the `error` field of a response.
///
/// Without a code it travels as a bare string (`"wallet undefined"`), otherwise
/// as `{code, message, data?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: Option<i32>,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    /// Structured error with a code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
            data: None,
        }
    }

    /// Plain message error, serialized as a string.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    /// Upstream failure rendered the way a thrown error stringifies.
    pub fn stringified(error: impl fmt::Display) -> Self {
        Self::message(format!("Error: {error}"))
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, details)
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, details)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("The method \"{method}\" does not exist / is not available."),
        )
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, details)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, details)
    }

    /// The requested method or account has not been authorized for the caller.
    pub fn unauthorized() -> Self {
        Self::new(
            codes::UNAUTHORIZED,
            "The requested account and/or method has not been authorized by the user.",
        )
    }

    pub fn user_rejected() -> Self {
        Self::new(codes::USER_REJECTED, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(codes::USER_REJECTED)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RpcError {}

impl Serialize for RpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let Some(code) = self.code else {
            return serializer.serialize_str(&self.message);
        };
        let mut state = serializer.serialize_struct("RpcError", 3)?;
        state.serialize_field("code", &code)?;
        state.serialize_field("message", &self.message)?;
        if let Some(ref data) = self.data {
            state.serialize_field("data", data)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for RpcError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ErrorHelper {
            Plain(String),
            Structured {
                code: i32,
                message: String,
                #[serde(default)]
                data: Option<Value>,
            },
        }

        Ok(match ErrorHelper::deserialize(deserializer)? {
            ErrorHelper::Plain(message) => RpcError::message(message),
            ErrorHelper::Structured {
                code,
                message,
                data,
            } => RpcError {
                code: Some(code),
                message,
                data,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_keeps_unknown_fields() {
        let raw = json!({"id": 7, "method": "eth_chainId", "jsonrpc": "2.0", "tag": "x"});
        let request: Request = serde_json::from_value(raw).unwrap();
        assert_eq!(request.id, RequestId::Num(7));
        assert_eq!(request.extra.get("tag"), Some(&json!("x")));

        let response = Response::result(request, json!("0xa86a"));
        let wire = response.to_value().unwrap();
        assert_eq!(wire["tag"], json!("x"));
        assert_eq!(wire["jsonrpc"], json!("2.0"));
        assert_eq!(wire["result"], json!("0xa86a"));
        assert!(wire.get("error").is_none());
    }

    #[test]
    fn test_string_id() {
        let request: Request =
            serde_json::from_value(json!({"id": "abc", "method": "m"})).unwrap();
        assert_eq!(request.id, RequestId::Str("abc".into()));
    }

    #[test]
    fn test_deferred_serializes_sentinel() {
        let response = Response::deferred(Request::new(1, "personal_sign"), ActionId::new());
        let wire = response.to_value().unwrap();
        assert_eq!(wire["result"], json!(DEFERRED_RESPONSE));
        assert!(response.is_deferred());
    }

    #[test]
    fn test_null_result_is_kept() {
        let wire = Response::result(Request::new(1, "m"), Value::Null)
            .to_value()
            .unwrap();
        assert!(wire.as_object().unwrap().contains_key("result"));
        assert_eq!(wire["result"], Value::Null);
    }

    #[test]
    fn test_error_without_code_is_plain_string() {
        let wire = Response::error(Request::new(2, "personal_sign"), RpcError::message("wallet undefined"))
            .to_value()
            .unwrap();
        assert_eq!(wire["error"], json!("wallet undefined"));
        assert!(wire.get("result").is_none());
    }

    #[test]
    fn test_coded_error_is_object() {
        let value = serde_json::to_value(RpcError::user_rejected()).unwrap();
        assert_eq!(value["code"], json!(4001));
        assert_eq!(value["message"], json!("User rejected the request."));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_stringified_error() {
        let error = RpcError::stringified("some error");
        assert_eq!(error.message, "Error: some error");
        assert_eq!(error.code, None);
    }

    #[test]
    fn test_error_deserializes_both_shapes() {
        let plain: RpcError = serde_json::from_value(json!("oops")).unwrap();
        assert_eq!(plain, RpcError::message("oops"));
        let coded: RpcError =
            serde_json::from_value(json!({"code": -32602, "message": "bad"})).unwrap();
        assert_eq!(coded, RpcError::invalid_params("bad"));
    }

    #[test]
    fn test_positional_param() {
        let request = Request::new(1, "m").with_params(json!(["a", 2]));
        assert_eq!(request.param(1), Some(&json!(2)));
        assert_eq!(request.param(2), None);
        let object = Request::new(1, "m").with_params(json!({"a": 1}));
        assert_eq!(object.param(0), None);
    }
}
