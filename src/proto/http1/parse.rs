use std::fmt::Write as _;
use std::io::Read;
use std::net::SocketAddr;

use bytes::{BufMut, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Request, StatusCode, Version};
use url::Url;

use crate::body::Body;
use crate::body_kind;
use crate::error::{Error, InvalidHttpHeader, InvalidUrl, RequestError, Result};
use crate::proto::ParserResult;

const MAX_HEADERS: usize = 100;

/// response heads above this size are rejected
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

/// status line and headers of a response
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// protocol version of the status line
    pub version: Version,
    /// response status
    pub status: StatusCode,
    /// reason phrase as sent by the server
    pub reason: String,
    /// response headers
    pub headers: HeaderMap,
}

/// parses response heads
#[derive(Debug, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// create a parser
    pub fn new() -> Self {
        ResponseParser
    }

    /// Read from `stream` until a final response head is parsed
    ///
    /// Interim `1xx` responses other than `101` are skipped. Bytes read past the
    /// head stay in `buf`; they are the start of the body.
    pub fn read_head<S: Read>(&mut self, stream: &mut S, buf: &mut BytesMut) -> Result<ResponseHead> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if !buf.is_empty() {
                if let ParserResult::Complete(head) = self.parse(buf)? {
                    if head.status.is_informational() && head.status != StatusCode::SWITCHING_PROTOCOLS {
                        trace!("skipping interim response {}", head.status);
                        continue;
                    }
                    return Ok(head);
                }
            }
            let read = stream.read(&mut chunk).map_err(|e| Error::from(RequestError::from_io(&e)))?;
            if read == 0 {
                return Err(RequestError::new("ECONNRESET", "socket hang up").into());
            }
            buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Parse a response head from the front of `buf`
    ///
    /// On `Complete` the head is split off `buf`. Heads larger than
    /// [`MAX_HEAD_SIZE`] are rejected.
    pub fn parse(&mut self, buf: &mut BytesMut) -> Result<ParserResult<ResponseHead>> {
        let mut headers_indices = [HeaderIndices::default(); MAX_HEADERS];

        let (len, status_code, version, reason, header_len) = {
            let mut header = [httparse::EMPTY_HEADER; MAX_HEADERS];
            let mut resp = httparse::Response::new(&mut header);

            match resp.parse(buf.as_ref())? {
                httparse::Status::Complete(len) => {
                    let code = resp.code.ok_or_else(|| InvalidHttpHeader::new("missing status code"))?;
                    let status_code = StatusCode::from_u16(code)?;
                    let version = if resp.version.unwrap_or(1) == 1 {
                        Version::HTTP_11
                    } else {
                        Version::HTTP_10
                    };
                    let reason = resp.reason.unwrap_or("").to_string();
                    let header_len = resp.headers.len();

                    record_header_indices(buf.as_ref(), &*resp.headers, &mut headers_indices)?;
                    (len, status_code, version, reason, header_len)
                }
                httparse::Status::Partial => {
                    if buf.len() > MAX_HEAD_SIZE {
                        return Err(InvalidHttpHeader::new("response head too large").into());
                    }
                    return Ok(ParserResult::Partial);
                }
            }
        };
        // immutable header buffer
        let headers_buf = buf.split_to(len).freeze();

        let mut header_map = HeaderMap::with_capacity(header_len);
        for header in &headers_indices[..header_len] {
            let name = HeaderName::from_bytes(&headers_buf[header.name.start..header.name.end])?;
            let value = HeaderValue::from_maybe_shared(headers_buf.slice(header.value.start..header.value.end))?;
            header_map.append(name, value);
        }
        debug!("response {:?} {}", version, status_code);

        Ok(ParserResult::Complete(ResponseHead {
            version,
            status: status_code,
            reason,
            headers: header_map,
        }))
    }
}

/// encodes requests and resolves their target
#[derive(Debug)]
pub struct RequestParser;

impl RequestParser {
    /// get socket addresses from given url, in resolver order
    ///
    /// A failed lookup or an empty answer is reported as `ENOTFOUND`.
    pub fn socket_addrs(url: &Url) -> Result<Vec<SocketAddr>> {
        let host = url.host_str().ok_or_else(|| InvalidUrl::new("url has no host"))?;
        let port = url.port_or_known_default()
            .ok_or_else(|| InvalidUrl::new("url has no port"))?;
        let addrs = url.socket_addrs(|| Some(port)).map_err(|e| {
            debug!("failed to resolve {}: {}", host, e);
            Error::from(RequestError::not_found(host))
        })?;
        if addrs.is_empty() {
            return Err(RequestError::not_found(host).into());
        }
        Ok(addrs)
    }

    /// encode a request to wire bytes
    pub fn encode(req: Request<Body>) -> Result<BytesMut> {
        Self::ready(&req)
    }

    fn ready(req: &Request<Body>) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(256 + req.body().body_length());
        Self::ready_start_line(&mut buf, req)?;
        Self::ready_headers(&mut buf, req)?;
        Self::end_of_headers(&mut buf);
        Self::ready_body(&mut buf, req);
        Ok(buf)
    }

    /// write \r\n
    fn end_of_headers(buf: &mut BytesMut) {
        buf.put_slice(b"\r\n");
    }

    /// ready for request start line
    fn ready_start_line(buf: &mut BytesMut, req: &Request<Body>) -> Result<()> {
        let target = req.uri().path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let target = if target.is_empty() { "/" } else { target };
        let version = match req.version() {
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_11 => "HTTP/1.1",
            other => {
                warn!("{:?} is not spoken here, falling back to HTTP/1.1", other);
                "HTTP/1.1"
            }
        };
        // [Method Path Version]
        write!(buf, "{} {} {}\r\n", req.method().as_str(), target, version)
            .map_err(|_| InvalidHttpHeader::new("failed to write request line"))?;
        Ok(())
    }

    fn ready_body(buf: &mut BytesMut, req: &Request<Body>) {
        body_kind!(req.body().kind(),
            text => {
                buf.put_slice(text.as_bytes());
            },
            binary => {
                buf.put_slice(binary.as_ref());
            },
            _empty => {

            }
        );
    }

    /// ready for request headers
    fn ready_headers(buf: &mut BytesMut, req: &Request<Body>) -> Result<()> {
        for (name, value) in req.headers() {
            buf.put_slice(name.as_str().as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
struct HeaderIndices {
    name: Range,
    value: Range,
}

#[derive(Clone, Copy, Default)]
struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

fn record_header_indices(
    bytes: &[u8],
    headers: &[httparse::Header<'_>],
    indices: &mut [HeaderIndices],
) -> Result<()> {
    let bytes_ptr = bytes.as_ptr() as usize;

    for (header, indices) in headers.iter().zip(indices.iter_mut()) {
        if header.name.len() >= (1 << 16) {
            debug!("header name larger than 64kb: {:?}", header.name);
            return Err(InvalidHttpHeader::new("header name too long").into());
        }
        let name_start = header.name.as_ptr() as usize - bytes_ptr;
        let name_end = name_start + header.name.len();
        indices.name = Range::new(name_start, name_end);

        let value_start = header.value.as_ptr() as usize - bytes_ptr;
        let value_end = value_start + header.value.len();
        indices.value = Range::new(value_start, value_end);
    }

    Ok(())
}
