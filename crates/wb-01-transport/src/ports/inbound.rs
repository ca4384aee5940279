//! Inbound port: what the transport hands requests to.

use crate::connection::Connection;
use async_trait::async_trait;
use shared_types::{Request, Response};
use std::sync::Arc;

/// Consumer of parsed requests.
///
/// Must always produce a response; failures are expressed as error responses.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, connection: Arc<Connection>, request: Request) -> Response;
}
