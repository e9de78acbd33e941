use httpbench::{config::Origin, files::FILES};
use testserver::FileServer;

/// Size of each file served to the benchmarks.
pub const FILE_SIZE: usize = 0x10000; // 64K

/// Start a local origin serving the standard file set.
pub fn spawn_origin() -> (FileServer, Origin) {
    let server = FileServer::builder()
        .files(FILES.iter().copied(), FILE_SIZE)
        .build();
    let origin = Origin::parse(&server.url()).unwrap();

    (server, origin)
}
