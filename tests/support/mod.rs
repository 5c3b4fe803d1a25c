//! Echo server for the integration tests
//!
//! Reflects `{method, path, query, headers, body}` back as JSON. `body` is only
//! present when the request carried a non-empty `application/json` body.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Map, Value};

const MAX_HEAD: usize = 64 * 1024;

pub const STREAM_TEXT: &str = "hello, stream!\n";

/// 1x1 transparent PNG
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

pub struct EchoServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EchoServer {
    pub fn listen() -> EchoServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind echo server");
        let addr = listener.local_addr().expect("echo server addr");
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::spawn(move || {
            for conn in listener.incoming() {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(conn) = conn {
                    thread::spawn(move || {
                        let _ = serve(conn);
                    });
                }
            }
        });
        EchoServer {
            addr,
            stop,
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // wake the accept loop
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Incoming {
    method: String,
    path: String,
    query: String,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

fn serve(mut conn: TcpStream) -> std::io::Result<()> {
    conn.set_read_timeout(Some(Duration::from_secs(5)))?;
    let req = match read_request(&mut conn)? {
        Some(req) => req,
        None => return Ok(()),
    };

    match req.path.as_str() {
        "/stream.txt" => respond(&mut conn, 200, "OK", "text/plain", STREAM_TEXT.as_bytes())?,
        "/chunked.txt" => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            conn.write_all(head.as_bytes())?;
            conn.write_all(b"7\r\nhello, \r\n8;ext=x\r\nstream!\n\r\n0\r\nX-Done: 1\r\n\r\n")?;
        }
        "/404" => {
            let body = json!({"message": "Not found"}).to_string();
            respond(&mut conn, 404, "Not Found", "application/json", body.as_bytes())?;
        }
        "/text" => respond(&mut conn, 200, "OK", "text/plain", b"definitely not json")?,
        _ => {
            let body = echo(&req).to_string();
            respond(&mut conn, 200, "OK", "application/json", body.as_bytes())?;
        }
    }
    conn.flush()?;
    let _ = conn.shutdown(Shutdown::Write);
    Ok(())
}

fn read_request(conn: &mut TcpStream) -> std::io::Result<Option<Incoming>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = conn.read(&mut chunk)?;
        if read == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..read]);

        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut parsed = httparse::Request::new(&mut headers);
        let len = match parsed.parse(&buf) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) if buf.len() < MAX_HEAD => continue,
            _ => return Ok(None),
        };

        let target = parsed.path.unwrap_or("/");
        let (path, query) = match target.find('?') {
            Some(i) => (&target[..i], &target[i + 1..]),
            None => (target, ""),
        };
        let mut map = BTreeMap::new();
        for header in parsed.headers.iter() {
            let value = String::from_utf8_lossy(header.value).into_owned();
            map.entry(header.name.to_ascii_lowercase())
                .and_modify(|v: &mut String| {
                    v.push_str(", ");
                    v.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }

        let length = map.get("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = buf[len..].to_vec();
        while body.len() < length {
            let read = conn.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }
        body.truncate(length);

        return Ok(Some(Incoming {
            method: parsed.method.unwrap_or("").to_string(),
            path: path.to_string(),
            query: query.to_string(),
            headers: map,
            body,
        }));
    }
}

fn echo(req: &Incoming) -> Value {
    let query: Map<String, Value> = url::form_urlencoded::parse(req.query.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    let headers: Map<String, Value> = req.headers.iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let mut echo = json!({
        "method": req.method,
        "path": req.path,
        "query": query,
        "headers": headers,
        "length": req.body.len(),
    });
    let is_json = req.headers.get("content-type")
        .map_or(false, |ct| ct.starts_with("application/json"));
    if is_json && !req.body.is_empty() {
        if let Ok(body) = serde_json::from_slice::<Value>(&req.body) {
            echo["body"] = body;
        }
    }
    echo
}

fn respond(conn: &mut TcpStream, status: u16, reason: &str, content_type: &str, body: &[u8]) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status, reason, content_type, body.len()
    );
    conn.write_all(head.as_bytes())?;
    conn.write_all(body)
}
