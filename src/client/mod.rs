pub use client::{HttpClient, DEFAULT_USER_AGENT};

mod client;

// A basic Http request will take the following steps
// for example we request http://api.example.com:8080/v2/bot?x=10 with GET method
// The first step is to resolve the hostname, every address it resolves to is
// tried in order until one accepts the connection
// then the client writes the request with `Connection: close`
// reads until the response head is complete
// and finally reads the body, framed by content-length, chunked encoding
// or the close of the connection.

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read, Write};
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use crate::error::{HttpError, InvalidUrl, JsonParseError, Result};
    use crate::produce::*;
    use crate::proto::{Connector, MAX_HEAD_SIZE};

    #[derive(Debug, Default)]
    struct Canned {
        reply: Vec<u8>,
        sent: Arc<Mutex<Vec<u8>>>,
        dialed: Vec<SocketAddr>,
    }

    #[derive(Debug)]
    struct CannedStream {
        reply: Cursor<Vec<u8>>,
        sent: Arc<Mutex<Vec<u8>>>,
    }

    impl Read for CannedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reply.read(buf)
        }
    }

    impl Write for CannedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.sent.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Connector for Canned {
        type Stream = CannedStream;

        fn connect(&mut self, addr: &SocketAddr) -> Result<CannedStream> {
            self.dialed.push(*addr);
            Ok(CannedStream {
                reply: Cursor::new(self.reply.clone()),
                sent: self.sent.clone(),
            })
        }
    }

    fn canned(reply: &str) -> (HttpClient<Canned>, Arc<Mutex<Vec<u8>>>) {
        let canned = Canned {
            reply: reply.as_bytes().to_vec(),
            ..Canned::default()
        };
        let sent = canned.sent.clone();
        (HttpClient::from_connector(canned), sent)
    }

    fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&sent.lock().unwrap()).into_owned()
    }

    const OK_JSON: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\n\r\n{\"ok\":true}";

    #[test]
    fn get_writes_request_and_decodes_json() {
        let (mut client, sent) = canned(OK_JSON);
        let headers = http_header! { "Test-Header-Key" => "Test-Header-Value" };
        let value: Value = client.get("http://127.0.0.1:8080/get?x=10#frag", headers).unwrap();
        assert_eq!(json!({"ok": true}), value);

        let wire = sent_text(&sent);
        assert!(wire.starts_with("GET /get?x=10 HTTP/1.1\r\n"), "{}", wire);
        assert!(wire.contains("test-header-key: Test-Header-Value\r\n"));
        assert!(wire.contains("host: 127.0.0.1:8080\r\n"));
        assert!(wire.contains(&format!("user-agent: {}\r\n", DEFAULT_USER_AGENT)));
        assert!(wire.contains("connection: close\r\n"));
        assert!(!wire.contains("content-length"));
        assert!(wire.ends_with("\r\n\r\n"));
        assert_eq!(vec!["127.0.0.1:8080".parse::<std::net::SocketAddr>().unwrap()], client.connector_mut().dialed);
    }

    #[test]
    fn caller_user_agent_is_replaced() {
        let (client, sent) = canned(OK_JSON);
        let mut client = client.with_user_agent("custom/1.0").unwrap();
        let headers = http_header! { "User-Agent" => "spoofed" };
        let _: Value = client.delete("http://127.0.0.1:8080/delete", headers).unwrap();

        let wire = sent_text(&sent);
        assert!(wire.starts_with("DELETE /delete HTTP/1.1\r\n"));
        assert!(wire.contains("user-agent: custom/1.0\r\n"));
        assert!(!wire.contains("spoofed"));
    }

    #[test]
    fn post_without_body_sends_zero_length_json() {
        let (mut client, sent) = canned(OK_JSON);
        let _: Value = client.post("http://127.0.0.1/post", HeaderMap::new(), None).unwrap();

        let wire = sent_text(&sent);
        assert!(wire.starts_with("POST /post HTTP/1.1\r\n"));
        assert!(wire.contains("host: 127.0.0.1\r\n"));
        assert!(wire.contains("content-type: application/json\r\n"));
        assert!(wire.contains("content-length: 0\r\n"));
    }

    #[test]
    fn post_with_body_sends_json() {
        let (mut client, sent) = canned(OK_JSON);
        let body = Body::from_json(&json!({"id": 12345})).unwrap();
        let _: Value = client.post("http://127.0.0.1/post/body", HeaderMap::new(), Some(body)).unwrap();

        let wire = sent_text(&sent);
        assert!(wire.contains("content-length: 12\r\n"));
        assert!(wire.ends_with("\r\n\r\n{\"id\":12345}"));
    }

    #[test]
    fn caller_framing_headers_are_replaced() {
        let (mut client, sent) = canned(OK_JSON);
        let headers = http_header! { "Content-Length" => "5" };
        let _: Value = client.get("http://127.0.0.1/get", headers).unwrap();
        let wire = sent_text(&sent);
        assert!(!wire.contains("content-length"), "{}", wire);
        assert!(wire.ends_with("\r\n\r\n"));

        let (mut client, sent) = canned(OK_JSON);
        let headers = http_header! {
            "Transfer-Encoding" => "chunked",
            "Content-Length" => "99",
        };
        let _: Value = client.post("http://127.0.0.1/post", headers, Some(Body::from_str("{\"a\":1}"))).unwrap();
        let wire = sent_text(&sent);
        assert!(!wire.contains("transfer-encoding"), "{}", wire);
        assert!(!wire.contains("content-length: 99"));
        assert_eq!(1, wire.matches("content-length").count());
        assert!(wire.ends_with("content-length: 7\r\n\r\n{\"a\":1}"), "{}", wire);
    }

    #[test]
    fn post_binary_sniffs_content_type() {
        let (mut client, sent) = canned(OK_JSON);
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        let _: Value = client.post_binary("http://127.0.0.1/upload", HeaderMap::new(), png, None).unwrap();
        let wire = sent_text(&sent);
        assert!(wire.contains("content-type: image/png\r\n"));
        assert!(wire.contains("content-length: 16\r\n"));

        let (mut client, sent) = canned(OK_JSON);
        let _: Value = client.post_binary_reader("http://127.0.0.1/upload", HeaderMap::new(), &b"plain"[..], Some("text/plain")).unwrap();
        assert!(sent_text(&sent).contains("content-type: text/plain\r\n"));
    }

    #[test]
    fn error_status_carries_code_and_body() {
        let (mut client, _) = canned("HTTP/1.1 404 Not Found\r\nContent-Length: 23\r\n\r\n{\"message\":\"not found\"}");
        let err = client.get::<Value>("http://127.0.0.1/404", HeaderMap::new()).unwrap_err();
        assert!(err.is::<HttpError>());
        assert_eq!(Some(StatusCode::NOT_FOUND), err.status_code());
        let inner = err.get_ref().downcast_ref::<HttpError>().unwrap();
        assert_eq!("Not Found", inner.status_message());
        assert_eq!("{\"message\":\"not found\"}", inner.body());
    }

    #[test]
    fn error_body_is_capped() {
        let size = MAX_HEAD_SIZE + 1024;
        let reply = format!("HTTP/1.1 502 Bad Gateway\r\nContent-Length: {}\r\n\r\n{}", size, "x".repeat(size));
        let (mut client, _) = canned(&reply);
        let err = client.get::<Value>("http://127.0.0.1/", HeaderMap::new()).unwrap_err();
        assert_eq!(Some(StatusCode::BAD_GATEWAY), err.status_code());
        let inner = err.get_ref().downcast_ref::<HttpError>().unwrap();
        assert_eq!(MAX_HEAD_SIZE, inner.body().len());
    }

    #[test]
    fn non_json_body_is_parse_error() {
        let (mut client, _) = canned("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello");
        let err = client.get::<Value>("http://127.0.0.1/", HeaderMap::new()).unwrap_err();
        assert!(err.is::<JsonParseError>());
    }

    #[test]
    fn stream_reads_body() {
        let (mut client, _) = canned("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nf\r\nhello, stream!\n\r\n0\r\n\r\n");
        let stream = client.stream("http://127.0.0.1/stream.txt", HeaderMap::new()).unwrap();
        assert_eq!("hello, stream!\n", stream.into_string().unwrap());
    }

    #[test]
    fn send_skips_status_check() {
        let (mut client, _) = canned("HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n");
        let req = Request::builder()
            .uri("http://127.0.0.1/raw")
            .body(Body::empty())
            .unwrap();
        let resp = client.send(req).unwrap();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, resp.status());
    }

    #[test]
    fn https_is_rejected() {
        let (mut client, _) = canned(OK_JSON);
        let err = client.get::<Value>("https://127.0.0.1/", HeaderMap::new()).unwrap_err();
        assert!(err.is::<InvalidUrl>());
        assert!(client.connector_mut().dialed.is_empty());
    }
}
