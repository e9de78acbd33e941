use httpbench::{
    config::{ClientConfig, ClientKind},
    engine::Workload,
    files::{file_names, FILE_COUNT},
    runner::Downloads,
    Error,
};
use std::time::{Duration, Instant};
use test_case::test_case;

mod utils;

#[test_case(ClientKind::Curl ; "curl")]
#[test_case(ClientKind::Isahc ; "isahc")]
#[test_case(ClientKind::Reqwest ; "reqwest")]
fn hung_download_times_out_and_cycle_completes(kind: ClientKind) {
    utils::logging();

    // Spawn an origin where one file is far too slow.
    let server = utils::files().delay("2.zip", Duration::from_secs(3)).build();
    let dir = tempfile::tempdir().unwrap();
    let downloads = Downloads::new(
        ClientConfig::new("with timeout", kind).timeout(Duration::from_millis(500)),
        utils::origin_of(&server),
        file_names(),
    );

    let start = Instant::now();
    let report = downloads.run_cycle(dir.path()).unwrap();

    // The barrier completes without waiting for the slow response.
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(report.completions().len(), FILE_COUNT);
    assert_eq!(report.succeeded(), FILE_COUNT - 1);

    let (name, error) = report.failures().next().unwrap();
    assert_eq!(name, "2.zip");
    assert!(matches!(error, Error::Timeout));
}
