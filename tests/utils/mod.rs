#![allow(dead_code)]

use httpbench::{config::Origin, files::FILES};
use std::net::TcpListener;
use testserver::FileServer;

pub const FILE_SIZE: usize = 32 * 1024;

pub fn logging() {
    env_logger::try_init().ok();
}

/// Builder for an origin serving the standard file set.
pub fn files() -> testserver::Builder {
    FileServer::builder().files(FILES.iter().copied(), FILE_SIZE)
}

pub fn origin_of(server: &FileServer) -> Origin {
    Origin::parse(&server.url()).unwrap()
}

/// An origin on a loopback port that nothing listens on.
pub fn dead_origin() -> Origin {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    Origin::parse(&format!("http://127.0.0.1:{}", port)).unwrap()
}
