//! Client side of a primary/backup replicated lock service.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! let ck = lock_client::Clerk::new("unix:/var/tmp/lock-p", "unix:/var/tmp/lock-b")?;
//! if ck.lock("file1").await {
//!     // ...
//!     ck.unlock("file1").await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod clerk;
pub mod cli;
pub mod ids;
pub mod rpc;

pub use blocking::BlockingClerk;
pub use clerk::{Clerk, Outcome, Replica};
pub use cli::{Cli, Commands};
pub use ids::{ClientId, RequestId};
pub use rpc::{GrpcTransport, LockOp, Operation, ServerAddr, Transport, TransportConfig, UnlockOp};
