use crate::pool::pool;
use std::{
    collections::HashMap,
    io::{self, Cursor, Read, Write},
    net::{SocketAddr, TcpStream},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};
use tiny_http::{Header, Response, Server};

/// Answered with `204 No Content` once the server accepts requests.
const READY_PATH: &str = "/.ready";

/// How a single path is answered.
#[derive(Clone)]
struct Route {
    body: Arc<[u8]>,
    status_code: u16,
    delay: Option<Duration>,
}

/// A local HTTP origin serving fixed-size files.
///
/// The server keeps running until the `FileServer` handle is dropped.
pub struct FileServer(Arc<Inner>);

struct Inner {
    server: Server,

    routes: HashMap<String, Route>,

    /// Number of file requests received since the server was started.
    request_counter: AtomicU32,

    /// Paths requested so far, in arrival order.
    requests: Mutex<Vec<String>>,
}

impl FileServer {
    /// Create a builder for a server with no files.
    pub fn builder() -> Builder {
        Builder {
            routes: HashMap::new(),
        }
    }

    /// Get the socket address of this server.
    pub fn addr(&self) -> SocketAddr {
        self.0.server.server_addr()
    }

    /// Get the base HTTP URL of this server, without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr())
    }

    /// Get the number of file requests received so far.
    pub fn requests_received(&self) -> u32 {
        self.0.request_counter.load(Ordering::SeqCst)
    }

    /// Get the number of requests received so far for one file.
    pub fn requests_for(&self, name: &str) -> usize {
        let path = format!("/{}", name);

        self.0
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| **p == path)
            .count()
    }

    /// Size of the body served for `name`, if it is served at all.
    pub fn file_len(&self, name: &str) -> Option<usize> {
        self.0.routes.get(&format!("/{}", name)).map(|r| r.body.len())
    }

    /// Whether the accept loop answers yet. Ready checks are not counted as file
    /// requests.
    fn is_ready(&self) -> bool {
        let request = format!(
            "GET {} HTTP/1.1\r\nhost: {}\r\nconnection: close\r\n\r\n",
            READY_PATH,
            self.addr()
        );

        let mut status_line = [0; 12];

        TcpStream::connect(self.addr())
            .and_then(|mut stream| {
                stream.write_all(request.as_bytes())?;
                stream.read_exact(&mut status_line)
            })
            .map(|()| status_line.ends_with(b" 204"))
            .unwrap_or(false)
    }

    fn wait_until_ready(&self) -> io::Result<()> {
        for _ in 0..9 {
            if self.is_ready() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(50));
        }

        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "file server did not answer its ready check",
        ))
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        self.0.server.unblock();
    }
}

impl Inner {
    fn handle_request(&self, request: tiny_http::Request) {
        if request.url() == READY_PATH {
            let _ = request.respond(Response::empty(204));
            return;
        }

        let path = request.url().to_owned();
        self.request_counter.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(path.clone());

        let route = match self.routes.get(&path) {
            Some(route) if request.method() == &tiny_http::Method::Get => route.clone(),
            _ => {
                let _ = request.respond(Response::empty(404));
                return;
            }
        };

        if let Some(delay) = route.delay {
            thread::sleep(delay);
        }

        let len = route.body.len();
        let response = Response::new(
            route.status_code.into(),
            content_type().into_iter().collect(),
            Cursor::new(route.body),
            Some(len),
            None,
        );

        let _ = request.respond(response);
    }
}

fn content_type() -> Option<Header> {
    Header::from_bytes("content-type", "application/octet-stream").ok()
}

/// A builder for file servers.
pub struct Builder {
    routes: HashMap<String, Route>,
}

impl Builder {
    /// Serve `size` bytes at `/<name>`.
    pub fn file(mut self, name: &str, size: usize) -> Self {
        let body = (0..size).map(|i| (i % 251) as u8).collect::<Vec<u8>>();

        self.routes.insert(
            format!("/{}", name),
            Route {
                body: body.into(),
                status_code: 200,
                delay: None,
            },
        );
        self
    }

    /// Serve `size` bytes at each of the given names.
    pub fn files<'a>(self, names: impl IntoIterator<Item = &'a str>, size: usize) -> Self {
        names
            .into_iter()
            .fold(self, |builder, name| builder.file(name, size))
    }

    /// Wait `delay` before answering requests for `name`.
    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        if let Some(route) = self.routes.get_mut(&format!("/{}", name)) {
            route.delay = Some(delay);
        }
        self
    }

    /// Wait `delay` before answering any request.
    pub fn delay_all(mut self, delay: Duration) -> Self {
        for route in self.routes.values_mut() {
            route.delay = Some(delay);
        }
        self
    }

    /// Answer requests for `name` with the given status code and an empty
    /// body.
    pub fn fail(mut self, name: &str, status_code: u16) -> Self {
        self.routes.insert(
            format!("/{}", name),
            Route {
                body: Arc::from(Vec::new()),
                status_code,
                delay: None,
            },
        );
        self
    }

    /// Start a new server, panicking if it cannot be started.
    pub fn build(self) -> FileServer {
        self.try_build().expect("failed to start file server")
    }

    /// Start a new server.
    pub fn try_build(self) -> io::Result<FileServer> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

        let inner = Arc::new(Inner {
            server,
            routes: self.routes,
            request_counter: AtomicU32::new(0),
            requests: Default::default(),
        });

        pool().execute({
            let inner = inner.clone();

            move || {
                for request in inner.server.incoming_requests() {
                    let inner = inner.clone();
                    pool().execute(move || inner.handle_request(request));
                }
            }
        });

        let server = FileServer(inner);
        server.wait_until_ready()?;

        Ok(server)
    }
}
