use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

const REQUEST_HEAD_LIMIT: usize = 16 * 1024;

/// How the test server answers each request.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Answers `200 OK` with a body of `bytes` zero bytes.
    Body { bytes: usize },
    /// Alternates `200 OK` and `500 Internal Server Error`, starting with 200.
    AlternatingStatus,
}

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ServerHandle {
    /// Request heads received so far, one entry per request.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a lightweight HTTP server for tests.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(behavior: Behavior) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let served = Arc::new(AtomicUsize::new(0));
    let server_requests = Arc::clone(&requests);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let requests = Arc::clone(&server_requests);
                    let served = Arc::clone(&served);
                    thread::spawn(move || handle_client(stream, behavior, &requests, &served));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            requests,
        },
    ))
}

/// Like `spawn_http_server`, but skips in sandboxes that forbid sockets.
///
/// # Errors
///
/// Returns an error if the server fails for any other reason.
pub fn spawn_http_server_or_skip(
    behavior: Behavior,
) -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_http_server(behavior) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Returns a URL whose port has no listener.
///
/// # Errors
///
/// Returns an error if a temporary listener cannot be bound.
pub fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind port check failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("port check addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

fn handle_client(
    mut stream: TcpStream,
    behavior: Behavior,
    requests: &Mutex<Vec<String>>,
    served: &AtomicUsize,
) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(head) = read_request_head(&mut stream) else {
        return;
    };
    if let Ok(mut requests) = requests.lock() {
        requests.push(head);
    }

    let index = served.fetch_add(1, Ordering::SeqCst);
    let (status_line, body) = match behavior {
        Behavior::Body { bytes } => ("200 OK", vec![0u8; bytes]),
        Behavior::AlternatingStatus if index % 2 == 0 => ("200 OK", b"OK".to_vec()),
        Behavior::AlternatingStatus => ("500 Internal Server Error", b"ERR".to_vec()),
    };
    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_line,
        body.len()
    );
    if stream.write_all(header.as_bytes()).is_err() || stream.write_all(&body).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Write));
}

fn read_request_head(stream: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buffer = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 || head.len() > REQUEST_HEAD_LIMIT {
            break;
        }
        head.extend_from_slice(buffer.get(..read)?);
    }
    Some(String::from_utf8_lossy(&head).into_owned())
}

/// Run the `volley` binary inside `dir` and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_volley<I, S>(dir: &Path, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = volley_bin()?;
    Command::new(bin)
        .current_dir(dir)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("VOLLEY_LOG")
        .output()
        .map_err(|err| format!("run volley failed: {}", err))
}

fn volley_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_volley").map_or_else(
        || Err("CARGO_BIN_EXE_volley missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
