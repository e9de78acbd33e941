//! A harness for comparing the download throughput of HTTP clients.
//!
//! Each client configuration becomes a [`Trial`](engine::Trial). A trial
//! downloads the same ten files from a local origin on every cycle, all ten
//! at once, into a scratch directory that is created before and removed after
//! the cycle. The [`Engine`](engine::Engine) repeats the cycles of one trial
//! until its timings are stable, moves on to the next, and finally ranks all
//! trials by mean cycle time.
//!
//! # Example
//!
//! ```no_run
//! use httpbench::{
//!     config::{ClientConfig, ClientKind, Origin, PoolConfig},
//!     engine::{Engine, Registry, StopRule, Trial},
//!     report::ConsoleReporter,
//! };
//! use std::path::Path;
//!
//! let origin = Origin::parse("http://127.0.0.1:8080")?;
//! let base = Path::new("downloads");
//!
//! let registry = Registry::new()
//!     .trial(Trial::downloads(
//!         ClientConfig::new("no-pool", ClientKind::Curl),
//!         origin.clone(),
//!         base,
//!     ))
//!     .trial(Trial::downloads(
//!         ClientConfig::new("fast-pool", ClientKind::Curl).pool(PoolConfig::default()),
//!         origin,
//!         base,
//!     ));
//!
//! let comparison = Engine::new(registry, StopRule::default())
//!     .run(&mut ConsoleReporter::new(std::io::stdout()))?;
//!
//! println!("{:?}", comparison.fastest());
//! # Ok::<(), httpbench::Error>(())
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through [tracing](https://docs.rs/tracing), with
//! one span per trial. Failed downloads are logged at the `warn` level.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod client;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod files;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod stats;

pub use crate::error::Error;
