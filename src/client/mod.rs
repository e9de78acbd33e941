//! HTTP client variants used to perform downloads.
//!
//! A [`Client`] is created at the start of each cycle from a
//! [`ClientConfig`] and dropped once every download of that cycle has
//! completed. Pooled variants own their persistent connections, so dropping
//! the client is what closes them; no pool ever outlives its cycle.

use crate::{
    config::{ClientConfig, ClientKind},
    error::Error,
};
use async_channel::{Receiver, Sender};
use futures_lite::future::block_on;
use std::io::Write;

mod curl;
mod isahc;
mod reqwest;

/// Performs GET requests and streams response bodies into a writer.
///
/// Implementations must be shareable between the threads of a cycle.
pub trait Client: Send + Sync {
    /// Fetch `url` and write the response body into `writer`.
    ///
    /// Returns the number of body bytes written. A non-success status is
    /// reported as [`Error::Status`].
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64, Error>;
}

/// Build a client for one cycle according to the given configuration.
pub fn connect(config: &ClientConfig) -> Result<Box<dyn Client>, Error> {
    tracing::debug!(
        client = config.name(),
        pooled = config.pool_config().is_some(),
        "creating client"
    );

    Ok(match (config.kind(), config.pool_config()) {
        (ClientKind::Curl, None) => Box::new(curl::EasyClient::new(config.timeout_config())),
        (ClientKind::Curl, Some(pool)) => {
            Box::new(curl::PooledEasyClient::new(pool, config.timeout_config())?)
        }
        (ClientKind::Isahc, None) => Box::new(isahc::IsahcClient::new(config.timeout_config())),
        (ClientKind::Isahc, Some(pool)) => {
            Box::new(isahc::PooledIsahcClient::new(pool, config.timeout_config())?)
        }
        (ClientKind::Reqwest, None) => {
            Box::new(reqwest::ReqwestClient::new(config.timeout_config()))
        }
        (ClientKind::Reqwest, Some(pool)) => {
            Box::new(reqwest::PooledReqwestClient::new(pool, config.timeout_config())?)
        }
    })
}

/// A fixed-size set of reusable items handed out one at a time.
///
/// Taking an item blocks while all of them are in use, which is how pooled
/// clients bound the number of simultaneous connections.
pub(crate) struct Slots<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Slots<T> {
    pub(crate) fn new(items: impl IntoIterator<Item = T>) -> Self {
        let items = items.into_iter().collect::<Vec<_>>();
        let (sender, receiver) = async_channel::bounded(items.len().max(1));

        for item in items {
            // Capacity matches the number of items.
            let _ = sender.try_send(item);
        }

        Self { sender, receiver }
    }

    /// Take an item, run `f` with it, and put it back afterwards regardless
    /// of the outcome, including a panic inside `f`.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let item = block_on(self.receiver.recv())
            .map_err(|_| Error::Transport(String::from("connection pool closed")))?;

        let mut checkout = Checkout {
            slots: self,
            item: Some(item),
        };

        // Always populated until the checkout is dropped.
        let result = match checkout.item.as_mut() {
            Some(item) => Ok(f(item)),
            None => Err(Error::Transport(String::from("connection pool slot missing"))),
        };

        result
    }
}

/// An item taken out of [`Slots`], returned when dropped.
struct Checkout<'a, T> {
    slots: &'a Slots<T>,
    item: Option<T>,
}

impl<T> Drop for Checkout<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            // Only fails if the pool is being dropped, in which case the item
            // can be dropped too.
            let _ = self.slots.sender.try_send(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        panic::{self, AssertUnwindSafe},
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    static_assertions::assert_impl_all!(Slots<()>: Send, Sync);

    #[test]
    fn slots_limit_concurrent_use() {
        let slots = Slots::new(vec![(), ()]);
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        crossbeam_utils::thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|_| {
                    slots
                        .with(|_| {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            active.fetch_sub(1, Ordering::SeqCst);
                        })
                        .unwrap();
                });
            }
        })
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn slots_return_items_after_use() {
        let slots = Slots::new(vec![0u32]);

        for _ in 0..3 {
            slots.with(|n| *n += 1).unwrap();
        }

        assert_eq!(slots.with(|n| *n).unwrap(), 3);
    }

    #[test]
    fn slots_survive_a_panicking_user() {
        let slots = Slots::new(vec![7u32]);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            slots.with(|_| panic!("download blew up")).unwrap();
        }));

        assert!(outcome.is_err());
        assert_eq!(slots.receiver.len(), 1);
        assert_eq!(slots.with(|n| *n).unwrap(), 7);
    }
}
