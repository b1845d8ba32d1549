//! The lock service clerk.
//!
//! A [`Clerk`] talks to a primary and a backup replica. Every call goes to the
//! primary while it is believed up and falls over to the backup within the
//! same call when the primary does not answer. A primary that fails once is
//! never contacted again by that clerk.
//!
//! `lock`/`unlock` return plain booleans, so "the server said no" and "no
//! replica answered" look the same. Callers that must tell them apart use
//! [`Clerk::try_lock`] / [`Clerk::try_unlock`], which return an [`Outcome`].

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ids::ClientId;
use crate::rpc::{
    GrpcTransport, LockOp, Operation, ServerAddr, Transport, TransportConfig, UnlockOp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replica {
    Primary,
    Backup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A replica answered; `verdict` is its granted / was-held flag.
    Answered { replica: Replica, verdict: bool },
    /// Neither replica answered during this call.
    Unreachable,
}

impl Outcome {
    /// Collapses to the boolean contract: unreachable reads as `false`.
    pub fn verdict(&self) -> bool {
        matches!(self, Outcome::Answered { verdict: true, .. })
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Outcome::Unreachable)
    }
}

pub struct Clerk<T = GrpcTransport> {
    servers: [ServerAddr; 2], // primary, backup
    primary_active: AtomicBool,
    client_id: ClientId,
    transport: T,
}

impl Clerk<GrpcTransport> {
    pub fn new(primary: &str, backup: &str) -> Result<Self> {
        Self::with_config(primary, backup, TransportConfig::default())
    }

    pub fn with_config(primary: &str, backup: &str, config: TransportConfig) -> Result<Self> {
        Self::with_transport(primary, backup, GrpcTransport::new(config))
    }
}

impl<T: Transport> Clerk<T> {
    pub fn with_transport(primary: &str, backup: &str, transport: T) -> Result<Self> {
        let primary: ServerAddr = primary.parse().context("Invalid primary address")?;
        let backup: ServerAddr = backup.parse().context("Invalid backup address")?;
        if primary == backup {
            tracing::warn!("Primary and backup share address {}", primary);
        }

        let client_id = ClientId::generate();
        tracing::debug!(
            "Clerk {} created, primary {} backup {}",
            client_id,
            primary,
            backup
        );

        Ok(Self {
            servers: [primary, backup],
            primary_active: AtomicBool::new(true),
            client_id,
            transport,
        })
    }

    /// Asks the lock service for `lock_name`.
    ///
    /// Returns `true` if the lock was granted, `false` if it is held by
    /// someone else or if no replica could be reached.
    pub async fn lock(&self, lock_name: &str) -> bool {
        self.try_lock(lock_name).await.verdict()
    }

    /// Releases `lock_name`.
    ///
    /// Returns `true` if the lock was held, `false` if it was not or if no
    /// replica could be reached.
    pub async fn unlock(&self, lock_name: &str) -> bool {
        self.try_unlock(lock_name).await.verdict()
    }

    pub async fn try_lock(&self, lock_name: &str) -> Outcome {
        self.invoke::<LockOp>(lock_name).await
    }

    pub async fn try_unlock(&self, lock_name: &str) -> Outcome {
        self.invoke::<UnlockOp>(lock_name).await
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn servers(&self) -> &[ServerAddr; 2] {
        &self.servers
    }

    pub fn primary_believed_up(&self) -> bool {
        self.primary_active.load(Ordering::Relaxed)
    }

    /// The transport this clerk dials through. Used to inspect transport
    /// doubles; production callers have no need for it.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // Both replica attempts of one call share the request id.
    async fn invoke<O: Operation>(&self, lock_name: &str) -> Outcome {
        let request_id = self.client_id.next_request_id();
        let args = O::args(lock_name, &request_id);

        if self.primary_active.load(Ordering::Relaxed) {
            let reply = self.transport.call::<O>(&self.servers[0], args.clone()).await;
            self.primary_active.store(reply.is_some(), Ordering::Relaxed);

            if let Some(reply) = reply {
                return Outcome::Answered {
                    replica: Replica::Primary,
                    verdict: O::verdict(&reply),
                };
            }
            tracing::warn!(
                "Primary {} did not answer {} {}, failing over to backup {}",
                self.servers[0],
                O::NAME,
                request_id,
                self.servers[1]
            );
        }

        match self.transport.call::<O>(&self.servers[1], args).await {
            Some(reply) => Outcome::Answered {
                replica: Replica::Backup,
                verdict: O::verdict(&reply),
            },
            None => {
                tracing::warn!(
                    "{} {} on '{}': no replica reachable",
                    O::NAME,
                    request_id,
                    lock_name
                );
                Outcome::Unreachable
            }
        }
    }
}
