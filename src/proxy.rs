//! Downstream delegation boundary.
//!
//! Once a request is authorized, the gateway may hand it to an external
//! call-routing client. This module supplies only the handoff: the
//! already-authorized request travels as an opaque argument bundle, and no
//! routing decisions are made here.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AppResult;

/// Argument name under which the authorized request snapshot is handed over.
pub const PROXY_REQUEST_ARG: &str = "proxyHttpRequest";

/// External call-routing client.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    /// Forward one argument bundle downstream.
    async fn call(&self, arguments: HashMap<String, serde_json::Value>) -> AppResult<()>;
}

/// Snapshot of an authorized request, serialized into the argument bundle.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthorizedRequest {
    pub method: String,
    pub path: String,
    pub query_string: String,
}

/// Hands authorized requests to the proxy client.
pub struct ProxyInvoker<C> {
    client: C,
}

impl<C: ProxyClient> ProxyInvoker<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Forward an authorized request downstream.
    ///
    /// Errors from the client propagate as-is; the gateway reports them as
    /// a bad-gateway outcome, never retries here.
    pub async fn invoke(&self, request: AuthorizedRequest) -> AppResult<()> {
        let mut arguments = HashMap::new();
        arguments.insert(
            PROXY_REQUEST_ARG.to_string(),
            serde_json::to_value(&request)
                .map_err(|e| crate::error::AppError::Proxy(e.to_string()))?,
        );

        self.client.call(arguments).await
    }
}
