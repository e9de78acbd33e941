//! Downloads driven directly through libcurl easy handles.

use super::Slots;
use crate::{config::PoolConfig, error::Error};
use curl::easy::Easy;
use std::{
    io::{self, Write},
    time::Duration,
};

/// Creates a fresh easy handle per download and forbids connection reuse,
/// so every download opens and closes its own connection.
pub(crate) struct EasyClient {
    timeout: Option<Duration>,
}

impl EasyClient {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl super::Client for EasyClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        let mut easy = Easy::new();
        easy.forbid_reuse(true)?;

        if let Some(timeout) = self.timeout {
            easy.timeout(timeout)?;
        }

        perform(&mut easy, url, writer)
    }
}

/// Shares a bounded set of long-lived easy handles. Each handle caches the
/// connection it last used, so a handle is one pooled connection.
pub(crate) struct PooledEasyClient {
    handles: Slots<Easy>,
}

impl PooledEasyClient {
    pub(crate) fn new(pool: &PoolConfig, timeout: Option<Duration>) -> Result<Self, Error> {
        if pool.max_connections == 0 {
            return Err(Error::InvalidConfig(String::from(
                "max_connections must be at least 1",
            )));
        }

        let mut handles = Vec::with_capacity(pool.max_connections);

        for i in 0..pool.max_connections {
            let mut easy = Easy::new();

            // Handles past the idle limit close their connection after each
            // transfer.
            easy.forbid_reuse(i >= pool.max_idle)?;
            easy.maxage_conn(pool.idle_timeout)?;
            easy.tcp_keepalive(true)?;

            if let Some(timeout) = timeout {
                easy.timeout(timeout)?;
            }

            handles.push(easy);
        }

        Ok(Self {
            handles: Slots::new(handles),
        })
    }
}

impl super::Client for PooledEasyClient {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
        self.handles.with(|easy| perform(easy, url, writer))?
    }
}

fn perform(easy: &mut Easy, url: &str, writer: &mut dyn Write) -> Result<u64, Error> {
    easy.url(url)?;
    easy.get(true)?;

    let mut written = 0u64;
    let mut write_error = None;

    let result = {
        let mut transfer = easy.transfer();

        transfer.write_function(|data| match writer.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_error = Some(e);
                // Returning a short count makes curl abort the transfer.
                Ok(0)
            }
        })?;

        transfer.perform()
    };

    if let Some(e) = write_error {
        return Err(Error::Stream(e));
    }

    result?;

    match easy.response_code()? {
        code @ 200..=299 => {
            tracing::trace!(url, code, bytes = written, "transfer complete");
            Ok(written)
        }
        0 => Err(Error::Stream(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no response received",
        ))),
        code => Err(Error::Status(code as u16)),
    }
}
