//! Definition of client configurations and the origin they download from.
//!
//! A [`ClientConfig`] is a named, immutable description of how downloads are
//! performed: which HTTP client library does the work, and whether a
//! persistent connection pool is shared between the downloads of a cycle.

use crate::error::Error;
use http::Uri;
use std::{fmt, str::FromStr, time::Duration};

/// The HTTP origin serving the benchmark files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Origin {
    base: String,
}

impl Origin {
    /// Parse an origin from a base URL such as `http://127.0.0.1:8080`.
    ///
    /// Only plain `http` URLs with an authority are accepted. Any path is
    /// ignored.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let uri: Uri = url
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("bad origin '{}': {}", url, e)))?;

        if uri.scheme_str() != Some("http") {
            return Err(Error::InvalidConfig(format!(
                "origin '{}' must use the http scheme",
                url
            )));
        }

        let authority = uri
            .authority()
            .ok_or_else(|| Error::InvalidConfig(format!("origin '{}' has no host", url)))?;

        Ok(Self {
            base: format!("http://{}", authority),
        })
    }

    /// Get the full URL of a file on this origin.
    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base, name)
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            base: String::from("http://127.0.0.1:80"),
        }
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// The HTTP client library used to perform downloads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClientKind {
    /// libcurl easy handles, driven directly.
    Curl,
    /// The isahc client.
    Isahc,
    /// The blocking reqwest client.
    Reqwest,
}

/// Limits of a persistent connection pool shared by the downloads of one
/// cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolConfig {
    /// Maximum number of connections open at the same time. Downloads beyond
    /// this limit wait for a connection to become free.
    pub max_connections: usize,
    /// Maximum number of idle connections kept for reuse.
    pub max_idle: usize,
    /// How long an idle connection is kept before it is closed.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 3,
            max_idle: 3,
            idle_timeout: Duration::from_millis(500),
        }
    }
}

/// A named description of how a trial downloads its files.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    name: String,
    kind: ClientKind,
    pool: Option<PoolConfig>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration without connection pooling or timeout.
    pub fn new(name: impl Into<String>, kind: ClientKind) -> Self {
        Self {
            name: name.into(),
            kind,
            pool: None,
            timeout: None,
        }
    }

    /// Share a persistent connection pool with the given limits between the
    /// downloads of each cycle.
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Fail any single download that takes longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Name of this configuration. This is also the trial name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn pool_config(&self) -> Option<&PoolConfig> {
        self.pool.as_ref()
    }

    pub fn timeout_config(&self) -> Option<Duration> {
        self.timeout
    }

    /// A file-system friendly version of the name: lower case, with each run
    /// of other characters replaced by a single `-`.
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

pub(crate) fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// The standard set of configurations compared by the harness.
pub fn default_configs() -> Vec<ClientConfig> {
    vec![
        ClientConfig::new("curl - defaults", ClientKind::Curl),
        ClientConfig::new("curl - keepalive", ClientKind::Curl).pool(PoolConfig::default()),
        ClientConfig::new("isahc - defaults", ClientKind::Isahc),
        ClientConfig::new("isahc - keepalive", ClientKind::Isahc).pool(PoolConfig::default()),
        ClientConfig::new("reqwest - defaults", ClientKind::Reqwest),
    ]
}
