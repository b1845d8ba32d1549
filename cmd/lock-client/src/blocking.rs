use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};

use crate::clerk::{Clerk, Outcome};
use crate::rpc::TransportConfig;

/// A [`Clerk`] for callers without an async runtime. Each call blocks the
/// calling thread until a replica answers or both have failed.
///
/// Must not be used from inside a tokio runtime; `block_on` panics there.
pub struct BlockingClerk {
    rt: Runtime,
    inner: Clerk,
}

impl BlockingClerk {
    pub fn new(primary: &str, backup: &str) -> Result<Self> {
        Self::with_config(primary, backup, TransportConfig::default())
    }

    pub fn with_config(primary: &str, backup: &str, config: TransportConfig) -> Result<Self> {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build tokio runtime")?;
        let inner = Clerk::with_config(primary, backup, config)?;
        Ok(Self { rt, inner })
    }

    pub fn lock(&self, lock_name: &str) -> bool {
        self.rt.block_on(self.inner.lock(lock_name))
    }

    pub fn unlock(&self, lock_name: &str) -> bool {
        self.rt.block_on(self.inner.unlock(lock_name))
    }

    pub fn try_lock(&self, lock_name: &str) -> Outcome {
        self.rt.block_on(self.inner.try_lock(lock_name))
    }

    pub fn try_unlock(&self, lock_name: &str) -> Outcome {
        self.rt.block_on(self.inner.try_unlock(lock_name))
    }

    pub fn clerk(&self) -> &Clerk {
        &self.inner
    }
}
