//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one static body on every path except `/login`. Every response
//! closes the connection. Options simulate servers that block HEAD, omit
//! Content-Length, require a session cookie or basic auth, or trickle the
//! body slowly.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cookie handed out by a successful `/login`.
pub const SESSION_COOKIE: &str = "session=ok";

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// If false, HEAD returns 405.
    pub head_allowed: bool,
    /// If false, responses carry no Content-Length; the body ends at close.
    pub send_length: bool,
    /// Sent as `Content-Disposition` on HEAD and GET when set.
    pub content_disposition: Option<&'static str>,
    /// Status for GET/HEAD on the body path (e.g. 404).
    pub status: u16,
    /// When true, requests without `session=ok` get 403.
    pub require_session: bool,
    /// Expected `Authorization` header value; 401 when it does not match.
    pub require_authorization: Option<&'static str>,
    /// Form body `/login` must receive to set the session cookie.
    pub login_body: &'static str,
    /// When set, the body is written in chunks of `chunk_size` with this pause.
    pub chunk_delay: Option<Duration>,
    pub chunk_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            send_length: true,
            content_disposition: None,
            status: 200,
            require_session: false,
            require_authorization: None,
            login_body: "user=jane&pass=secret",
            chunk_delay: None,
            chunk_size: 16 * 1024,
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the base
/// URL (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &body, &opts));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

struct Request {
    method: String,
    path: String,
    cookies: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();

    let mut content_length = 0usize;
    let mut cookies = Vec::new();
    let mut authorization = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => content_length = value.parse().unwrap_or(0),
            "cookie" => cookies.push(value.to_string()),
            "authorization" => authorization = Some(value.to_string()),
            _ => {}
        }
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Request {
        method,
        path,
        cookies: cookies.join("; "),
        authorization,
        body,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Error",
    }
}

fn respond_empty(stream: &mut TcpStream, status: u16, extra: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n{}\r\n",
        status,
        reason(status),
        extra
    );
    let _ = stream.write_all(response.as_bytes());
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    if req.path == "/login" {
        if req.method.eq_ignore_ascii_case("POST") && req.body == opts.login_body.as_bytes() {
            respond_empty(
                &mut stream,
                200,
                &format!("Set-Cookie: {}; Path=/\r\n", SESSION_COOKIE),
            );
        } else {
            respond_empty(&mut stream, 403, "");
        }
        return;
    }

    if let Some(expected) = opts.require_authorization {
        if req.authorization.as_deref() != Some(expected) {
            respond_empty(&mut stream, 401, "WWW-Authenticate: Basic realm=\"test\"\r\n");
            return;
        }
    }
    if opts.require_session && !req.cookies.split(';').any(|c| c.trim() == SESSION_COOKIE) {
        respond_empty(&mut stream, 403, "");
        return;
    }

    let is_head = req.method.eq_ignore_ascii_case("HEAD");
    if is_head && !opts.head_allowed {
        respond_empty(&mut stream, 405, "");
        return;
    }
    if !is_head && !req.method.eq_ignore_ascii_case("GET") {
        respond_empty(&mut stream, 405, "");
        return;
    }
    if opts.status != 200 {
        respond_empty(&mut stream, opts.status, "");
        return;
    }

    let mut headers = String::from("HTTP/1.1 200 OK\r\nConnection: close\r\n");
    if opts.send_length {
        headers.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    if let Some(cd) = opts.content_disposition {
        headers.push_str(&format!("Content-Disposition: {}\r\n", cd));
    }
    headers.push_str("\r\n");
    if stream.write_all(headers.as_bytes()).is_err() || is_head {
        return;
    }

    match opts.chunk_delay {
        None => {
            let _ = stream.write_all(body);
        }
        Some(delay) => {
            for piece in body.chunks(opts.chunk_size.max(1)) {
                if stream.write_all(piece).is_err() || stream.flush().is_err() {
                    return;
                }
                thread::sleep(delay);
            }
        }
    }
}
