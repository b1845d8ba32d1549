// src/rpc/grpc.rs
use super::*;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::time::timeout;
use tonic::transport::Endpoint;
use tower::service_fn;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// gRPC transport. Every call dials a fresh channel and drops it when the
/// call returns; nothing is pooled.
#[derive(Debug, Clone, Default)]
pub struct GrpcTransport {
    config: TransportConfig,
}

impl GrpcTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn connect(&self, srv: &ServerAddr) -> Result<Channel> {
        let endpoint = match srv {
            ServerAddr::Tcp(uri) => {
                Endpoint::from_shared(uri.clone()).context("Invalid endpoint")?
            }
            // uri is ignored by the unix connector
            ServerAddr::Unix(_) => Endpoint::from_static("http://[::]:50051"),
        };

        let connecting = async {
            match srv {
                ServerAddr::Tcp(_) => endpoint.connect().await,
                ServerAddr::Unix(path) => {
                    let path = path.clone();
                    endpoint
                        .connect_with_connector(service_fn(move |_: Uri| {
                            UnixStream::connect(path.clone())
                        }))
                        .await
                }
            }
        };

        timeout(self.config.connect_timeout, connecting)
            .await
            .context("Timed out while connecting")?
            .context("Connection failed")
    }

    async fn try_call<O: Operation>(&self, srv: &ServerAddr, args: O::Args) -> Result<O::Reply> {
        let channel = self
            .connect(srv)
            .await
            .with_context(|| format!("Failed to reach {}", srv))?;
        let mut client = LockServerClient::new(channel);

        let reply = timeout(self.config.request_timeout, O::dispatch(&mut client, args))
            .await
            .with_context(|| format!("{} timed out", O::NAME))?
            .with_context(|| format!("{} RPC failed", O::NAME))?;
        Ok(reply)
    }
}

#[tonic::async_trait]
impl Transport for GrpcTransport {
    async fn call<O: Operation>(&self, srv: &ServerAddr, args: O::Args) -> Option<O::Reply> {
        let request_id = O::request_id(&args).to_string();
        match self.try_call::<O>(srv, args).await {
            Ok(reply) => {
                tracing::debug!("{} {} -> {:?}", O::NAME, srv, reply);
                Some(reply)
            }
            Err(e) => {
                tracing::debug!("{} {} request {} failed: {:#}", O::NAME, srv, request_id, e);
                None
            }
        }
    }
}
