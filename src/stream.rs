use std::fmt;
use std::io::{self, BufReader, Read};
use std::net::TcpStream;

use bytes::BytesMut;
use http::header::HeaderMap;
use http::{Method, Response, StatusCode, Version};

use crate::body::Body;
use crate::error::{Error, RequestError, Result};
use crate::proto::{BodyReader, Framing, ResponseHead};

type Wire<S> = BufReader<io::Chain<io::Cursor<BytesMut>, S>>;

/// A response whose body is read straight off the connection
///
/// ```no_run
/// use std::io::Read;
/// use sdk_http::headers::HeaderMap;
///
/// let mut stream = sdk_http::stream("http://127.0.0.1:8080/stream.txt", HeaderMap::new()).unwrap();
/// let mut text = String::new();
/// stream.read_to_string(&mut text).unwrap();
/// ```
pub struct ResponseStream<S = TcpStream> {
    head: ResponseHead,
    body: BodyReader<Wire<S>>,
}

impl<S: Read> ResponseStream<S> {
    /// `leftover` holds the body bytes that were read together with the head
    pub(crate) fn new(head: ResponseHead, leftover: BytesMut, stream: S, method: &Method) -> Result<Self> {
        let framing = Framing::of(method, head.status, &head.headers)?;
        let wire = BufReader::new(io::Cursor::new(leftover).chain(stream));
        Ok(Self {
            head,
            body: BodyReader::new(wire, framing),
        })
    }

    /// response status
    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// reason phrase, the canonical one when the server sent none
    pub fn reason(&self) -> &str {
        if self.head.reason.is_empty() {
            self.head.status.canonical_reason().unwrap_or("")
        } else {
            self.head.reason.as_str()
        }
    }

    /// response version
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Read the rest of the body
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.body.read_to_end(&mut data)
            .map_err(|e| Error::from(RequestError::from_io(&e)))?;
        Ok(data)
    }

    /// Read the rest of the body as UTF-8 text
    pub fn into_string(self) -> Result<String> {
        Ok(String::from_utf8(self.into_bytes()?)?)
    }

    /// Read the rest of the body and hand back a complete response
    pub fn into_response(self) -> Result<Response<Body>> {
        let status = self.head.status;
        let version = self.head.version;
        let headers = self.head.headers.clone();
        let data = self.into_bytes()?;
        let body = if data.is_empty() { Body::empty() } else { Body::from_vec(data) };
        let mut resp = Response::builder()
            .status(status)
            .version(version)
            .body(body)?;
        *resp.headers_mut() = headers;
        Ok(resp)
    }
}

impl<S: Read> Read for ResponseStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl<S> fmt::Debug for ResponseStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("status", &self.head.status)
            .field("version", &self.head.version)
            .field("headers", &self.head.headers)
            .finish()
    }
}
