use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::clerk::Outcome;
use crate::rpc::TransportConfig;

#[derive(Parser)]
#[command(name = "lockctl")]
#[command(about = "Acquire and release locks on a primary/backup lock service", long_about = None)]
pub struct Cli {
    /// Primary replica: host:port, http://host:port or unix:/path
    #[arg(long, env = "LOCKSERVICE_PRIMARY")]
    pub primary: String,

    /// Backup replica, same address forms as --primary
    #[arg(long, env = "LOCKSERVICE_BACKUP")]
    pub backup: String,

    #[arg(long, default_value_t = 1000)]
    pub connect_timeout_ms: u64,

    /// Per-RPC timeout
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Try to acquire a lock
    Lock {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Release a lock
    Unlock {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

impl Cli {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Message and exit status for a finished command: 0 yes, 1 no, 2 unreachable.
pub fn report(command: &Commands, outcome: &Outcome) -> (&'static str, i32) {
    match (command, outcome) {
        (_, Outcome::Unreachable) => ("unreachable", 2),
        (Commands::Lock { .. }, Outcome::Answered { verdict: true, .. }) => ("granted", 0),
        (Commands::Lock { .. }, Outcome::Answered { verdict: false, .. }) => ("denied", 1),
        (Commands::Unlock { .. }, Outcome::Answered { verdict: true, .. }) => ("released", 0),
        (Commands::Unlock { .. }, Outcome::Answered { verdict: false, .. }) => ("not held", 1),
    }
}
