//! Types for error handling.

use std::{error::Error as StdError, fmt, io, path::PathBuf};

/// The phase of a cycle in which a fatal error occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Creating the scratch directory.
    Setup,
    /// Downloading the files.
    Run,
    /// Removing the scratch directory.
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::Run => "run",
            Phase::Teardown => "teardown",
        })
    }
}

/// All possible types of errors that can be produced by a benchmark run.
///
/// Transport and stream errors are captured per download and never abort a
/// cycle. Fixture errors and configuration errors are fatal to the trial they
/// occur in, and are returned wrapped in [`Error::Trial`].
#[derive(Debug)]
pub enum Error {
    /// Failed to connect to the origin.
    ConnectFailed,
    /// Couldn't resolve the origin host name.
    CouldntResolveHost,
    /// A download took longer than the configured timeout.
    Timeout,
    /// The origin answered with a non-success status code.
    Status(u16),
    /// Any other error raised by the underlying HTTP client.
    Transport(String),
    /// Writing the response body to disk failed, or the body ended early.
    Stream(io::Error),
    /// The scratch directory could not be created or removed.
    Fixture {
        /// Directory that was being managed.
        path: PathBuf,
        /// The underlying filesystem error.
        source: io::Error,
    },
    /// A client configuration could not be turned into a client.
    InvalidConfig(String),
    /// A fatal error that stopped a trial.
    Trial {
        /// Name of the trial.
        trial: String,
        /// Phase of the cycle that failed.
        phase: Phase,
        /// The error that caused the failure.
        source: Box<Error>,
    },
}

impl Error {
    /// Returns true if this error was caused by the network or the origin.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::ConnectFailed
                | Error::CouldntResolveHost
                | Error::Timeout
                | Error::Status(_)
                | Error::Transport(_)
        )
    }

    /// Returns true if this error occurred while writing a body to disk.
    pub fn is_stream(&self) -> bool {
        matches!(self, Error::Stream(_))
    }

    /// Returns true if this error was caused by managing the scratch
    /// directory, either directly or as the cause of a failed trial.
    pub fn is_fixture(&self) -> bool {
        match self {
            Error::Fixture { .. } => true,
            Error::Trial { source, .. } => source.is_fixture(),
            _ => false,
        }
    }

    pub(crate) fn in_trial(self, trial: impl Into<String>, phase: Phase) -> Self {
        Error::Trial {
            trial: trial.into(),
            phase,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectFailed => f.write_str("failed to connect to the server"),
            Error::CouldntResolveHost => f.write_str("couldn't resolve host name"),
            Error::Timeout => f.write_str("request took longer than the configured timeout"),
            Error::Status(code) => write!(f, "server responded with status {}", code),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::Stream(e) => write!(f, "failed to write response body: {}", e),
            Error::Fixture { path, source } => {
                write!(f, "scratch directory {}: {}", path.display(), source)
            }
            Error::InvalidConfig(e) => write!(f, "invalid client configuration: {}", e),
            Error::Trial {
                trial,
                phase,
                source,
            } => write!(f, "trial '{}' failed during {}: {}", trial, phase, source),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Stream(e) => Some(e),
            Error::Fixture { source, .. } => Some(source),
            Error::Trial { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<curl::Error> for Error {
    fn from(error: curl::Error) -> Error {
        if error.is_couldnt_connect() {
            Error::ConnectFailed
        } else if error.is_couldnt_resolve_host() {
            Error::CouldntResolveHost
        } else if error.is_operation_timedout() {
            Error::Timeout
        } else if error.is_write_error() || error.is_partial_file() {
            Error::Stream(io::Error::new(
                io::ErrorKind::Other,
                error.extra_description().unwrap_or_else(|| error.description()).to_owned(),
            ))
        } else {
            Error::Transport(error.to_string())
        }
    }
}

#[doc(hidden)]
impl From<isahc::Error> for Error {
    fn from(error: isahc::Error) -> Error {
        use isahc::error::ErrorKind;

        match error.kind() {
            ErrorKind::ConnectionFailed => Error::ConnectFailed,
            ErrorKind::NameResolution => Error::CouldntResolveHost,
            ErrorKind::Timeout => Error::Timeout,
            ErrorKind::ClientInitialization => Error::InvalidConfig(error.to_string()),
            _ => Error::Transport(error.to_string()),
        }
    }
}

#[doc(hidden)]
impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout
        } else if error.is_connect() {
            Error::ConnectFailed
        } else if error.is_builder() {
            Error::InvalidConfig(error.to_string())
        } else if let Some(status) = error.status() {
            Error::Status(status.as_u16())
        } else {
            Error::Transport(error.to_string())
        }
    }
}

#[doc(hidden)]
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        match error.kind() {
            io::ErrorKind::ConnectionRefused => Error::ConnectFailed,
            io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Stream(error),
        }
    }
}
