//! A tiny HTTP origin serving fixed-size files, used by the benchmark's
//! tests and by its `--serve` option.
//!
//! Each server listens on its own ephemeral loopback port. Responses can be
//! delayed or replaced with error statuses per path to simulate slow or
//! failing downloads.
//!
//! Only HTTP/1.x is implemented.

mod pool;
mod server;

pub use server::{Builder, FileServer};
