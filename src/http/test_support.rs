use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

/// Largest request head the stub reads before answering.
const MAX_HEAD_BYTES: usize = 16 * 1024;
/// Largest request body the stub records.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub(crate) enum StubReply {
    Ok(String),
    Status(u16, String),
    Delayed(Duration, String),
}

/// What the stub saw on the wire for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    /// Header names are lowercased.
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Handler = Arc<dyn Fn(&str) -> StubReply + Send + Sync>;
type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

pub(crate) struct StubServer {
    base_url: String,
    requests: RequestLog,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawns a blocking HTTP/1.1 server on an ephemeral port; `handler` maps the
/// request path to a reply.
pub(crate) fn spawn_stub_server<F>(handler: F) -> Result<StubServer, String>
where
    F: Fn(&str) -> StubReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let handler: Handler = Arc::new(handler);
    let requests: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let handler = Arc::clone(&handler);
                    let log = Arc::clone(&log);
                    thread::spawn(move || handle_client(stream, &handler, &log));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok(StubServer {
        base_url: format!("http://{}", addr),
        requests,
        shutdown: shutdown_tx,
        thread: Some(handle),
    })
}

/// URL of a local port with nothing listening on it.
pub(crate) fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/process", addr))
}

fn handle_client(mut stream: TcpStream, handler: &Handler, log: &RequestLog) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let path = request.path.clone();
    log.lock().unwrap_or_else(PoisonError::into_inner).push(request);

    let (status, reason, body) = match handler(&path) {
        StubReply::Ok(body) => (200, "OK", body),
        StubReply::Status(status, body) => (status, "Stub Status", body),
        StubReply::Delayed(delay, body) => {
            thread::sleep(delay);
            (200, "OK", body)
        }
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut received = Vec::new();
    let mut buffer = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = received.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
        if received.len() >= MAX_HEAD_BYTES {
            return None;
        }
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            return None;
        }
        received.extend_from_slice(buffer.get(..read)?);
    };

    let head = String::from_utf8_lossy(received.get(..head_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();

    // Bytes past the head are kept even without a Content-Length.
    let mut body = received.get(head_end.checked_add(4)?..)?.to_vec();
    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .map(|length| length.min(MAX_BODY_BYTES));
    if let Some(length) = content_length {
        while body.len() < length {
            let read = stream.read(&mut buffer).ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(buffer.get(..read)?);
        }
        body.truncate(length);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}
