// In-process lock server replicas for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{TcpListenerStream, UnixListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use lock_client::{LockOp, Operation, UnlockOp};

use proto::lockservice::{
    lock_server_server::{LockServer, LockServerServer},
    LockArgs, LockReply, UnlockArgs, UnlockReply,
};

/// Lock table that answers a repeated request id with its first reply.
#[derive(Debug, Default, Clone)]
pub struct TestLockServer {
    locked: Arc<Mutex<HashSet<String>>>,
    replies: Arc<Mutex<HashMap<String, bool>>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl TestLockServer {
    /// Request ids in arrival order, duplicates included.
    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }

    pub async fn is_locked(&self, name: &str) -> bool {
        self.locked.lock().await.contains(name)
    }

    async fn apply(&self, request_id: String, op: impl FnOnce(&mut HashSet<String>) -> bool) -> bool {
        self.seen.lock().await.push(request_id.clone());

        let mut replies = self.replies.lock().await;
        if let Some(verdict) = replies.get(&request_id) {
            return *verdict;
        }
        let verdict = op(&mut *self.locked.lock().await);
        replies.insert(request_id, verdict);
        verdict
    }
}

#[tonic::async_trait]
impl LockServer for TestLockServer {
    async fn lock(&self, request: Request<LockArgs>) -> Result<Response<LockReply>, Status> {
        let LockArgs {
            lock_name,
            request_id,
        } = request.into_inner();

        let granted = self
            .apply(request_id.clone(), |locked| locked.insert(lock_name))
            .await;
        Ok(Response::new(LockOp::reply(granted, request_id)))
    }

    async fn unlock(&self, request: Request<UnlockArgs>) -> Result<Response<UnlockReply>, Status> {
        let UnlockArgs {
            lock_name,
            request_id,
        } = request.into_inner();

        let was_held = self
            .apply(request_id.clone(), |locked| locked.remove(&lock_name))
            .await;
        Ok(Response::new(UnlockOp::reply(was_held, request_id)))
    }
}

/// Replica that rejects every request with `UNAVAILABLE`.
#[derive(Debug, Default, Clone)]
pub struct FailingLockServer;

#[tonic::async_trait]
impl LockServer for FailingLockServer {
    async fn lock(&self, _: Request<LockArgs>) -> Result<Response<LockReply>, Status> {
        Err(Status::unavailable("replica is recovering"))
    }

    async fn unlock(&self, _: Request<UnlockArgs>) -> Result<Response<UnlockReply>, Status> {
        Err(Status::unavailable("replica is recovering"))
    }
}

/// A background task aborted on drop, with the address it listens on.
pub struct Background {
    pub addr: String,
    handle: JoinHandle<()>,
}

impl Drop for Background {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn spawn_failing_replica(dir: &Path, name: &str) -> Background {
    let path = dir.join(format!("{}.sock", name));
    let listener = UnixListener::bind(&path).expect("bind unix socket");
    let service = LockServerServer::new(FailingLockServer);

    let handle = tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(service)
            .serve_with_incoming(UnixListenerStream::new(listener))
            .await;
    });

    Background {
        addr: format!("unix:{}", path.display()),
        handle,
    }
}

/// Accepts connections and never reads or writes on them.
pub fn spawn_silent_replica(dir: &Path, name: &str) -> Background {
    let path = dir.join(format!("{}.sock", name));
    let listener = UnixListener::bind(&path).expect("bind unix socket");

    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    Background {
        addr: format!("unix:{}", path.display()),
        handle,
    }
}

/// A running replica. The server task is aborted on drop.
pub struct Replica {
    pub addr: String,
    pub state: TestLockServer,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl Replica {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Replica {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn spawn_unix_replica(dir: &Path, name: &str) -> Replica {
    let path = dir.join(format!("{}.sock", name));
    let listener = UnixListener::bind(&path).expect("bind unix socket");
    let state = TestLockServer::default();
    let service = LockServerServer::new(state.clone());

    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_incoming(UnixListenerStream::new(listener))
            .await
    });

    Replica {
        addr: format!("unix:{}", path.display()),
        state,
        handle,
    }
}

pub async fn spawn_tcp_replica() -> Replica {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind tcp");
    let addr = listener.local_addr().expect("local addr");
    let state = TestLockServer::default();
    let service = LockServerServer::new(state.clone());

    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
    });

    Replica {
        addr: addr.to_string(),
        state,
        handle,
    }
}

/// Address of a socket nobody listens on.
pub fn dead_addr(dir: &Path, name: &str) -> String {
    format!("unix:{}", dir.join(format!("{}.sock", name)).display())
}
