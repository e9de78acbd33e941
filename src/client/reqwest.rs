//! Downloads performed through the blocking reqwest client.

use super::Slots;
use crate::{config::PoolConfig, error::Error};
use reqwest::blocking::Client;
use std::{io::Write, time::Duration};

/// Builds a new reqwest client per download with idle pooling disabled.
pub(crate) struct ReqwestClient {
    timeout: Option<Duration>,
}

impl ReqwestClient {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl super::Client for ReqwestClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(self.timeout)
            .build()?;

        fetch(&client, url, writer)
    }
}

/// One reqwest client shared by all downloads of a cycle.
///
/// reqwest has no limit on open connections, so concurrent requests are
/// bounded by a set of permits instead.
pub(crate) struct PooledReqwestClient {
    client: Client,
    permits: Slots<()>,
}

impl PooledReqwestClient {
    pub(crate) fn new(pool: &PoolConfig, timeout: Option<Duration>) -> Result<Self, Error> {
        if pool.max_connections == 0 {
            return Err(Error::InvalidConfig(String::from(
                "max_connections must be at least 1",
            )));
        }

        let client = Client::builder()
            .pool_max_idle_per_host(pool.max_idle)
            .pool_idle_timeout(pool.idle_timeout)
            .tcp_keepalive(pool.idle_timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            permits: Slots::new(vec![(); pool.max_connections]),
        })
    }
}

impl super::Client for PooledReqwestClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        self.permits.with(|_| fetch(&self.client, url, writer))?
    }
}

fn fetch(client: &Client, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
    let mut response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(Error::Status(response.status().as_u16()));
    }

    Ok(response.copy_to(writer)?)
}
