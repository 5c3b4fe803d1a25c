use std::cmp;
use std::io::{self, BufRead, Read};

use http::header::{HeaderMap, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{Method, StatusCode};

use crate::error::{InvalidHttpHeader, Result};

// chunk-size lines longer than this are garbage
const MAX_CHUNK_LINE: usize = 4096;

/// How the end of a response body is found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// exactly this many bytes follow the head
    Length(u64),
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// the body runs until the server closes the connection
    Eof,
}

impl Framing {
    /// Pick the framing of a response to `method` (RFC 7230 section 3.3.3)
    pub fn of(method: &Method, status: StatusCode, headers: &HeaderMap) -> Result<Framing> {
        if *method == Method::HEAD
            || status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            return Ok(Framing::Length(0));
        }
        if let Some(te) = headers.get_all(TRANSFER_ENCODING).iter().last() {
            let chunked = te.to_str()
                .map(|s| s.rsplit(',').next().unwrap_or("").trim().eq_ignore_ascii_case("chunked"))
                .unwrap_or(false);
            if chunked {
                return Ok(Framing::Chunked);
            }
            // some other coding is last, only the close delimits the body
            return Ok(Framing::Eof);
        }
        let mut length = None;
        for value in headers.get_all(CONTENT_LENGTH) {
            let parsed = value.to_str().ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .ok_or_else(|| InvalidHttpHeader::new("invalid content-length"))?;
            if length.map_or(false, |l| l != parsed) {
                return Err(InvalidHttpHeader::new("conflicting content-length").into());
            }
            length = Some(parsed);
        }
        Ok(length.map_or(Framing::Eof, Framing::Length))
    }
}

#[derive(Debug, Clone, Copy)]
enum Chunk {
    Size,
    Data(u64),
    DataEnd,
    Trailers,
    Done,
}

#[derive(Debug)]
enum State {
    Length(u64),
    Chunked(Chunk),
    Eof,
}

/// Reads a response body off the connection, stripping the transfer framing
#[derive(Debug)]
pub struct BodyReader<R> {
    inner: R,
    state: State,
}

impl<R: BufRead> BodyReader<R> {
    /// decode the body that follows the head on `inner`
    pub fn new(inner: R, framing: Framing) -> Self {
        let state = match framing {
            Framing::Length(len) => State::Length(len),
            Framing::Chunked => State::Chunked(Chunk::Size),
            Framing::Eof => State::Eof,
        };
        trace!("body framing {:?}", framing);
        Self { inner, state }
    }

    /// true once the whole body has been read
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Length(0) | State::Chunked(Chunk::Done))
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        let read = (&mut self.inner).take(MAX_CHUNK_LINE as u64).read_until(b'\n', &mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside chunked body"));
        }
        if line.last() != Some(&b'\n') {
            return Err(invalid("chunk line too long"));
        }
        while let Some(b'\n') | Some(b'\r') = line.last() {
            line.pop();
        }
        Ok(line)
    }

    fn read_chunked(&mut self, buf: &mut [u8], mut chunk: Chunk) -> io::Result<usize> {
        loop {
            match chunk {
                Chunk::Size => {
                    let line = self.read_line()?;
                    let size = parse_chunk_size(&line)?;
                    chunk = if size == 0 { Chunk::Trailers } else { Chunk::Data(size) };
                }
                Chunk::Data(remaining) => {
                    let want = cmp::min(buf.len() as u64, remaining) as usize;
                    let read = self.inner.read(&mut buf[..want])?;
                    if read == 0 && want > 0 {
                        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed inside chunk"));
                    }
                    let remaining = remaining - read as u64;
                    self.state = State::Chunked(if remaining == 0 { Chunk::DataEnd } else { Chunk::Data(remaining) });
                    return Ok(read);
                }
                Chunk::DataEnd => {
                    if !self.read_line()?.is_empty() {
                        return Err(invalid("missing CRLF after chunk data"));
                    }
                    chunk = Chunk::Size;
                }
                Chunk::Trailers => {
                    let line = match self.read_line() {
                        Ok(line) => line,
                        // tolerate servers that close right after the last chunk
                        Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => Vec::new(),
                        Err(e) => return Err(e),
                    };
                    if line.is_empty() {
                        chunk = Chunk::Done;
                    } else {
                        trace!("ignoring trailer {:?}", String::from_utf8_lossy(&line));
                    }
                }
                Chunk::Done => {
                    self.state = State::Chunked(Chunk::Done);
                    return Ok(0);
                }
            }
            self.state = State::Chunked(chunk);
        }
    }
}

impl<R: BufRead> Read for BodyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.state {
            State::Length(0) => Ok(0),
            State::Length(remaining) => {
                let want = cmp::min(buf.len() as u64, remaining) as usize;
                let read = self.inner.read(&mut buf[..want])?;
                if read == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("connection closed with {} body bytes outstanding", remaining),
                    ));
                }
                self.state = State::Length(remaining - read as u64);
                Ok(read)
            }
            State::Chunked(chunk) => self.read_chunked(buf, chunk),
            State::Eof => self.inner.read(buf),
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> io::Result<u64> {
    // drop chunk extensions
    let digits = line.split(|b| *b == b';').next().unwrap_or(&[]);
    let digits = std::str::from_utf8(digits).map_err(|_| invalid("chunk size is not ascii"))?;
    u64::from_str_radix(digits.trim(), 16).map_err(|_| invalid("invalid chunk size"))
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}
