//! Client and request identifiers.
//!
//! A request id is `"<client id>-<random>"`. Both halves are decimal, so the
//! separator never occurs inside either of them and the owning client can be
//! recovered from any request id.

use rand::rngs::OsRng;
use rand::Rng;
use std::fmt;

pub const SEPARATOR: char = '-';

const NRAND_MAX: u64 = 1 << 62;

/// Draws a value uniformly from `[0, 2^62)` using the OS CSPRNG.
///
/// Panics if the OS entropy source is unavailable. There is no degraded mode:
/// without unique ids the server cannot deduplicate retried requests.
pub fn nrand() -> u64 {
    OsRng.gen_range(0..NRAND_MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn generate() -> Self {
        Self(nrand().to_string())
    }

    /// Fresh id for one logical Lock/Unlock call.
    pub fn next_request_id(&self) -> RequestId {
        RequestId(format!("{}{}{}", self.0, SEPARATOR, nrand()))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// The client half of the id, or `None` if the id was not built by
    /// [`ClientId::next_request_id`].
    pub fn client_id(&self) -> Option<&str> {
        self.0.split_once(SEPARATOR).map(|(client, _)| client)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
