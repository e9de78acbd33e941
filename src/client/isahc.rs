//! Downloads performed through isahc.

use crate::{config::PoolConfig, error::Error};
use isahc::{config::Configurable, HttpClient, ReadResponseExt};
use std::{io::Write, time::Duration};

/// Builds a new isahc client per download, so no connection is shared
/// between downloads.
pub(crate) struct IsahcClient {
    timeout: Option<Duration>,
}

impl IsahcClient {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl super::Client for IsahcClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        let mut builder = HttpClient::builder().connection_cache_size(1);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        fetch(&builder.build()?, url, writer)
    }
}

/// One isahc client shared by all downloads of a cycle. The client's agent
/// owns the connection cache and shuts it down when the client is dropped.
pub(crate) struct PooledIsahcClient {
    client: HttpClient,
}

impl PooledIsahcClient {
    pub(crate) fn new(pool: &PoolConfig, timeout: Option<Duration>) -> Result<Self, Error> {
        if pool.max_connections == 0 {
            return Err(Error::InvalidConfig(String::from(
                "max_connections must be at least 1",
            )));
        }

        // isahc always keeps at least one connection cached.
        if pool.max_idle == 0 {
            return Err(Error::InvalidConfig(String::from(
                "isahc cannot disable its connection cache, max_idle must be at least 1",
            )));
        }

        let mut builder = HttpClient::builder()
            .max_connections(pool.max_connections)
            .connection_cache_size(pool.max_idle)
            .connection_cache_ttl(pool.idle_timeout);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl super::Client for PooledIsahcClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        fetch(&self.client, url, writer)
    }
}

fn fetch(client: &HttpClient, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
    let mut response = client.get(url)?;

    if !response.status().is_success() {
        return Err(Error::Status(response.status().as_u16()));
    }

    Ok(response.copy_to(writer)?)
}
