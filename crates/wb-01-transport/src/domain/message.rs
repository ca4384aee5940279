//! Connection classification and outbound frames.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{Response, RpcError};
use url::Url;

/// Trust domain of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// First-party extension pages, including the approval surface.
    Extension,
    /// A page-injected provider speaking for an arbitrary website.
    DApp,
}

/// Connection names recognised by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionNames {
    pub extension: String,
    pub approval: String,
    pub provider: String,
}

impl Default for ConnectionNames {
    fn default() -> Self {
        Self {
            extension: "extension".into(),
            approval: "approval".into(),
            provider: "provider".into(),
        }
    }
}

impl ConnectionNames {
    pub fn classify(&self, name: &str) -> Option<ConnectionKind> {
        if name == self.provider {
            Some(ConnectionKind::DApp)
        } else if name == self.extension || name == self.approval {
            Some(ConnectionKind::Extension)
        } else {
            None
        }
    }

    pub fn is_approval(&self, name: &str) -> bool {
        name == self.approval
    }
}

/// What the host knows about the other end of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderInfo {
    pub tab_id: Option<u32>,
    pub url: Option<String>,
}

impl SenderInfo {
    pub fn new(tab_id: Option<u32>, url: Option<String>) -> Self {
        Self { tab_id, url }
    }

    /// Host name of the sender URL.
    pub fn domain(&self) -> Option<String> {
        let url = Url::parse(self.url.as_deref()?).ok()?;
        url.host_str().map(str::to_string)
    }
}

/// Event pushed to a connection outside the request/response flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub name: String,
    pub value: Value,
}

impl ConnectionEvent {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Frame written to a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Response(Response),
    Event(ConnectionEvent),
    /// Answer to a frame that could not be read as a request.
    FrameError(RpcError),
}

impl OutboundMessage {
    pub fn to_value(&self) -> Value {
        match self {
            OutboundMessage::Response(response) => response
                .to_value()
                .unwrap_or_else(|e| json!({ "id": response.id(), "error": e.to_string() })),
            OutboundMessage::Event(event) => json!({ "name": event.name, "value": event.value }),
            OutboundMessage::FrameError(error) => json!({ "id": Value::Null, "error": error }),
        }
    }

    pub fn to_text(&self) -> String {
        self.to_value().to_string()
    }
}
