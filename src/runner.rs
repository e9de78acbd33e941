//! Concurrent fan-out of the downloads of one cycle.
//!
//! Every task of a cycle runs on its own thread so that no task waits on
//! another to start. Each task reports exactly once through a completion
//! channel, and the runner acts as a barrier: it returns only after it has
//! received one completion per task, successful or not.

use crate::{
    client,
    config::{ClientConfig, Origin},
    download::download,
    engine::Workload,
    error::Error,
};
use futures_lite::future::block_on;
use std::{
    panic::{self, AssertUnwindSafe},
    path::Path,
    time::Instant,
};

/// The completion signal of one task.
#[derive(Debug)]
pub struct Completion {
    /// Name of the file the task handled.
    pub name: String,
    /// When the task started.
    pub started: Instant,
    /// When the task completed.
    pub finished: Instant,
    /// Bytes downloaded, or the error that stopped the task.
    pub result: Result<u64, Error>,
}

/// Outcome of one cycle: one completion per task, in completion order.
#[derive(Debug, Default)]
pub struct CycleReport {
    completions: Vec<Completion>,
}

impl CycleReport {
    pub fn completions(&self) -> &[Completion] {
        &self.completions
    }

    /// Number of tasks that completed successfully.
    pub fn succeeded(&self) -> usize {
        self.completions.iter().filter(|c| c.result.is_ok()).count()
    }

    /// Number of tasks that failed.
    pub fn failed(&self) -> usize {
        self.completions.len() - self.succeeded()
    }

    /// Iterate over the failed tasks and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.completions
            .iter()
            .filter_map(|c| c.result.as_ref().err().map(|e| (c.name.as_str(), e)))
    }

    /// Total number of bytes downloaded by successful tasks.
    pub fn bytes(&self) -> u64 {
        self.completions
            .iter()
            .filter_map(|c| c.result.as_ref().ok())
            .sum()
    }
}

/// Run `task` once per name, all concurrently, and wait for every one of them
/// to complete.
///
/// A failing or panicking task does not affect its siblings; its error is
/// captured in its [`Completion`].
pub fn fan_out<F>(names: &[String], task: F) -> CycleReport
where
    F: Fn(&str) -> Result<u64, Error> + Sync,
{
    let (sender, receiver) = async_channel::bounded(names.len().max(1));
    let task = &task;

    let result = crossbeam_utils::thread::scope(|s| {
        for name in names {
            let sender = sender.clone();

            s.spawn(move |_| {
                let started = Instant::now();
                let result = panic::catch_unwind(AssertUnwindSafe(|| task(name)))
                    .unwrap_or_else(|_| {
                        Err(Error::Transport(String::from("download task panicked")))
                    });

                // The channel has room for every task.
                let _ = sender.try_send(Completion {
                    name: name.clone(),
                    started,
                    finished: Instant::now(),
                    result,
                });
            });
        }

        // Only the tasks may hold senders, otherwise the barrier below could
        // never observe a closed channel.
        drop(sender);

        let mut completions = Vec::with_capacity(names.len());

        while completions.len() < names.len() {
            match block_on(receiver.recv()) {
                Ok(completion) => {
                    if let Err(e) = &completion.result {
                        tracing::warn!(name = %completion.name, "download failed: {}", e);
                    }
                    completions.push(completion);
                }
                Err(_) => break,
            }
        }

        CycleReport { completions }
    });

    match result {
        Ok(report) => report,
        Err(e) => panic::resume_unwind(e),
    }
}

/// A trial workload that downloads a set of files from an origin using one
/// client configuration.
pub struct Downloads {
    config: ClientConfig,
    origin: Origin,
    files: Vec<String>,
}

impl Downloads {
    pub fn new(config: ClientConfig, origin: Origin, files: Vec<String>) -> Self {
        Self {
            config,
            origin,
            files,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Workload for Downloads {
    fn run_cycle(&self, scratch: &Path) -> Result<CycleReport, Error> {
        let client = client::connect(&self.config)?;

        let report = fan_out(&self.files, |name| {
            download(client.as_ref(), &self.origin, name, scratch)
        });

        // Close any pooled connections before the scratch directory goes
        // away and the next cycle starts.
        drop(client);

        Ok(report)
    }
}
