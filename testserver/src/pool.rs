//! Handler threads for file servers.
//!
//! A cycle issues all of its downloads at once, so each request gets its own
//! thread for as long as it is in flight. A delayed file then only stalls
//! its own download. Threads are kept between cycles and shared by every
//! server in the process.

use once_cell::sync::Lazy;
use threadfin::ThreadPool;

/// Up to this many requests are answered at the same time.
const MAX_HANDLERS: usize = 100;

pub(crate) fn pool() -> &'static ThreadPool {
    static POOL: Lazy<ThreadPool> =
        Lazy::new(|| ThreadPool::builder().size(..MAX_HANDLERS).build());

    &POOL
}
