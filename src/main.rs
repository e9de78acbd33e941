//! Command line entry point: compares the standard client configurations
//! against a local origin and prints the results.

use httpbench::{
    config::{default_configs, ClientConfig, Origin},
    engine::{Engine, Registry, StopRule, Trial},
    files::FILES,
    report::ConsoleReporter,
    Error,
};
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
    time::Duration,
};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(about = "Compare the download throughput of HTTP clients")]
struct Options {
    /// Base URL of the origin serving the benchmark files.
    #[structopt(long, default_value = "http://127.0.0.1:80")]
    origin: Origin,

    /// Directory under which each trial gets its scratch directory.
    #[structopt(long, default_value = "downloads", parse(from_os_str))]
    base_path: PathBuf,

    /// Minimum number of cycles per trial.
    #[structopt(long, default_value = "5")]
    min_cycles: u64,

    /// Maximum number of cycles per trial.
    #[structopt(long, default_value = "100")]
    max_cycles: u64,

    /// Stop a trial once this much time has been measured.
    #[structopt(long, default_value = "5s", parse(try_from_str = humantime::parse_duration))]
    max_time: Duration,

    /// Stop a trial once its relative margin of error is at most this
    /// percentage.
    #[structopt(long, default_value = "1")]
    max_rme: f64,

    /// Fail any single download that takes longer than this.
    #[structopt(long, parse(try_from_str = humantime::parse_duration))]
    timeout: Option<Duration>,

    /// Only run the named trials. May be repeated.
    #[structopt(long)]
    only: Vec<String>,

    /// Serve the files from a built-in origin, each this many bytes long,
    /// instead of using --origin.
    #[structopt(long)]
    serve: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let options = Options::from_args();

    if let Err(e) = run(options, io::stdout()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

/// Run the selected trials, writing the report to `out`. Every scratch
/// directory, and any parent of one created along the way, is gone again
/// when this returns.
fn run(options: Options, out: impl Write) -> Result<(), Error> {
    let server = match options.serve {
        Some(size) => Some(
            testserver::FileServer::builder()
                .files(FILES.iter().copied(), size)
                .try_build()
                .map_err(|e| {
                    Error::InvalidConfig(format!("cannot start built-in origin: {}", e))
                })?,
        ),
        None => None,
    };

    let origin = match &server {
        Some(server) => Origin::parse(&server.url())?,
        None => options.origin.clone(),
    };

    let configs = select(default_configs(), &options.only)?;

    let registry = configs
        .into_iter()
        .map(|config| match options.timeout {
            Some(timeout) => config.timeout(timeout),
            None => config,
        })
        .fold(Registry::new(), |registry, config| {
            registry.trial(Trial::downloads(config, origin.clone(), &options.base_path))
        });

    let rule = StopRule {
        min_cycles: options.min_cycles,
        max_cycles: options.max_cycles,
        max_time: Some(options.max_time),
        max_rme: options.max_rme,
    };

    tracing::info!(%origin, trials = registry.len(), "starting benchmark");

    Engine::new(registry, rule)
        .run(&mut ConsoleReporter::new(out))
        .map(drop)
}

/// Keep only the configurations named in `only`, matched by name or slug.
fn select(configs: Vec<ClientConfig>, only: &[String]) -> Result<Vec<ClientConfig>, Error> {
    if only.is_empty() {
        return Ok(configs);
    }

    let selected = configs
        .into_iter()
        .filter(|config| {
            only.iter()
                .any(|wanted| wanted == config.name() || *wanted == config.slug())
        })
        .collect::<Vec<_>>();

    if selected.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "no trial matches {}",
            only.join(", ")
        )));
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_case::test_case;

    fn options(args: &[&str]) -> Options {
        Options::from_iter_safe(std::iter::once("httpbench").chain(args.iter().copied())).unwrap()
    }

    fn names(configs: &[ClientConfig]) -> Vec<&str> {
        configs.iter().map(ClientConfig::name).collect()
    }

    #[test]
    fn no_filter_keeps_everything() {
        let selected = select(default_configs(), &[]).unwrap();

        assert_eq!(selected.len(), default_configs().len());
    }

    #[test_case("curl - keepalive" ; "by name")]
    #[test_case("curl-keepalive" ; "by slug")]
    fn filter_matches(wanted: &str) {
        let selected = select(default_configs(), &[wanted.to_owned()]).unwrap();

        assert_eq!(names(&selected), ["curl - keepalive"]);
    }

    #[test]
    fn filter_keeps_registration_order() {
        let only = vec![String::from("reqwest-defaults"), String::from("curl - defaults")];
        let selected = select(default_configs(), &only).unwrap();

        assert_eq!(names(&selected), ["curl - defaults", "reqwest - defaults"]);
    }

    #[test]
    fn filter_without_match_is_rejected() {
        let error = select(default_configs(), &[String::from("wget")]).unwrap_err();

        assert!(matches!(error, Error::InvalidConfig(_)));
        assert!(error.to_string().contains("wget"));
    }

    #[test]
    fn run_leaves_no_scratch_state() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a/b");
        let base = base.to_str().unwrap();

        let mut out = Vec::new();
        run(
            options(&[
                "--serve", "1024",
                "--only", "curl-keepalive",
                "--min-cycles", "1",
                "--max-cycles", "2",
                "--base-path", base,
            ]),
            &mut out,
        )
        .unwrap();

        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("curl - keepalive x "));
        assert!(report.ends_with("Fastest is curl - keepalive\n"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn fatal_error_names_trial_and_phase() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let base = blocker.join("downloads");

        let error = run(
            options(&[
                "--serve", "16",
                "--only", "isahc-defaults",
                "--base-path", base.to_str().unwrap(),
            ]),
            io::sink(),
        )
        .unwrap_err();

        assert!(error.is_fixture());
        assert!(error
            .to_string()
            .starts_with("trial 'isahc - defaults' failed during setup"));
    }
}
