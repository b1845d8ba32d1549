use anyhow::Context;
use proto::lockservice::{
    lock_server_client::LockServerClient, LockArgs, LockReply, UnlockArgs, UnlockReply,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tonic::transport::{Channel, Uri};
use tonic::Status;

use crate::ids::RequestId;

pub mod grpc;

pub use grpc::{GrpcTransport, TransportConfig};

/// Where a replica listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerAddr {
    /// `http://host:port`
    Tcp(String),
    /// Unix-domain socket path
    Unix(PathBuf),
}

impl FromStr for ServerAddr {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            anyhow::bail!("Server address is empty");
        }

        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                anyhow::bail!("Socket path missing in {:?}", s);
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if s.starts_with('/') {
            return Ok(Self::Unix(PathBuf::from(s)));
        }

        let uri = if s.contains("://") {
            s.to_string()
        } else {
            format!("http://{}", s)
        };
        let parsed: Uri = uri
            .parse()
            .with_context(|| format!("Invalid server address {:?}", s))?;
        // no tls feature on tonic, so https cannot be dialed
        if parsed.scheme_str() != Some("http") {
            anyhow::bail!("Unsupported scheme in {:?}, expected http", s);
        }
        if parsed.host().map_or(true, str::is_empty) {
            anyhow::bail!("No host in {:?}", s);
        }
        Ok(Self::Tcp(uri))
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerAddr::Tcp(uri) => f.write_str(uri),
            ServerAddr::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// A remote operation exposed by every lock server replica.
///
/// Each implementor pins the request/reply message pair of one RPC, so the
/// transport stays generic without erasing types.
#[tonic::async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Name used in logs, `Service.Method`.
    const NAME: &'static str;

    type Args: Clone + fmt::Debug + Send + Sync + 'static;
    type Reply: fmt::Debug + Send + 'static;

    fn args(lock_name: &str, request_id: &RequestId) -> Self::Args;
    fn lock_name(args: &Self::Args) -> &str;
    fn request_id(args: &Self::Args) -> &str;

    /// Builds a reply the way a replica would answer `request_id`. The clerk
    /// never calls this; it exists for transport doubles and test servers.
    fn reply(verdict: bool, request_id: String) -> Self::Reply;
    fn verdict(reply: &Self::Reply) -> bool;

    async fn dispatch(
        client: &mut LockServerClient<Channel>,
        args: Self::Args,
    ) -> Result<Self::Reply, Status>;
}

/// `LockServer.Lock`: verdict is "granted".
pub struct LockOp;

/// `LockServer.Unlock`: verdict is "was held".
pub struct UnlockOp;

#[tonic::async_trait]
impl Operation for LockOp {
    const NAME: &'static str = "LockServer.Lock";

    type Args = LockArgs;
    type Reply = LockReply;

    fn args(lock_name: &str, request_id: &RequestId) -> LockArgs {
        LockArgs {
            lock_name: lock_name.to_string(),
            request_id: request_id.to_string(),
        }
    }

    fn lock_name(args: &LockArgs) -> &str {
        &args.lock_name
    }

    fn request_id(args: &LockArgs) -> &str {
        &args.request_id
    }

    fn reply(verdict: bool, request_id: String) -> LockReply {
        LockReply {
            granted: verdict,
            request_id,
        }
    }

    fn verdict(reply: &LockReply) -> bool {
        reply.granted
    }

    async fn dispatch(
        client: &mut LockServerClient<Channel>,
        args: LockArgs,
    ) -> Result<LockReply, Status> {
        Ok(client.lock(args).await?.into_inner())
    }
}

#[tonic::async_trait]
impl Operation for UnlockOp {
    const NAME: &'static str = "LockServer.Unlock";

    type Args = UnlockArgs;
    type Reply = UnlockReply;

    fn args(lock_name: &str, request_id: &RequestId) -> UnlockArgs {
        UnlockArgs {
            lock_name: lock_name.to_string(),
            request_id: request_id.to_string(),
        }
    }

    fn lock_name(args: &UnlockArgs) -> &str {
        &args.lock_name
    }

    fn request_id(args: &UnlockArgs) -> &str {
        &args.request_id
    }

    fn reply(verdict: bool, request_id: String) -> UnlockReply {
        UnlockReply {
            was_held: verdict,
            request_id,
        }
    }

    fn verdict(reply: &UnlockReply) -> bool {
        reply.was_held
    }

    async fn dispatch(
        client: &mut LockServerClient<Channel>,
        args: UnlockArgs,
    ) -> Result<UnlockReply, Status> {
        Ok(client.unlock(args).await?.into_inner())
    }
}

/// One synchronous round trip to a replica.
///
/// Returns `None` if the replica could not be reached or the call failed in
/// any way; the reply exists only when the call succeeded. Network failures
/// never surface as errors.
#[tonic::async_trait]
pub trait Transport: Send + Sync {
    async fn call<O: Operation>(&self, srv: &ServerAddr, args: O::Args) -> Option<O::Reply>;
}
