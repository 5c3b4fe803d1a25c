//! Errors returned by the client
//!
//! Every failure is an [`Error`]. Use [`Error::is`] or [`Error::get_ref`] to
//! tell an [`HttpError`] (the server answered with status >= 400) from a
//! [`RequestError`] (no answer, with a network code such as `ENOTFOUND`).

use std::error;
use std::fmt;
use std::io;
use std::result;
use std::string::FromUtf8Error;

use http::header::{InvalidHeaderName, InvalidHeaderValue, ToStrError};
use http::method::InvalidMethod;
use http::status::InvalidStatusCode;
use http::StatusCode;

macro_rules! from_error {
    ($from:ty,$to:expr) => {
        impl From<$from> for Error{
            fn from(err: $from) -> Self {
                Error{
                    inner: $to(err)
                }
            }
        }
    };
}

macro_rules! impl_error {
    ($err_ty:ty) => {
        impl std::error::Error for $err_ty{}
    };
}

/// The error returned by every request helper of this crate
///
/// Consumers usually only care about two cases: the server answered with an
/// error status ([`HttpError`], see [`Error::status_code`]) or the request never
/// got an answer ([`RequestError`], see [`Error::code`]). Everything else can be
/// inspected with [`Error::is`] and [`Error::get_ref`].
pub struct Error {
    inner: ErrorKind,
}

/// A `Result` typedef to use with the crate's `Error` type
pub type Result<T> = result::Result<T, Error>;

/// The server answered with a status code >= 400
#[derive(Debug, Clone)]
pub struct HttpError {
    status: StatusCode,
    message: String,
    body: String,
}

impl HttpError {
    /// create the error from the response status line and the (lossy) body text
    pub fn new(status: StatusCode, message: &str, body: String) -> Self {
        Self {
            status,
            message: message.to_string(),
            body,
        }
    }

    /// numeric status code of the response
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// reason phrase of the response, e.g. `Not Found`
    pub fn status_message(&self) -> &str {
        self.message.as_str()
    }

    /// response body, usually the API's error document
    pub fn body(&self) -> &str {
        self.body.as_str()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request failed with status code {}", self.status.as_u16())
    }
}

/// The request could not be completed: name resolution, connect, or socket IO failed
#[derive(Debug, Clone)]
pub struct RequestError {
    code: &'static str,
    message: String,
}

impl RequestError {
    /// create the error with a network error code such as `ECONNREFUSED`
    pub fn new(code: &'static str, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    /// the host name could not be resolved
    pub fn not_found(host: &str) -> Self {
        Self::new("ENOTFOUND", &format!("getaddrinfo ENOTFOUND {}", host))
    }

    /// map a socket level failure to its network error code
    pub fn from_io(err: &io::Error) -> Self {
        Self::new(io_code(err.kind()), &err.to_string())
    }

    /// network error code, e.g. `ENOTFOUND`
    pub fn code(&self) -> &str {
        self.code
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_str())
    }
}

fn io_code(kind: io::ErrorKind) -> &'static str {
    use std::io::ErrorKind::*;
    match kind {
        ConnectionRefused => "ECONNREFUSED",
        // the peer hung up before the response was complete
        ConnectionReset | UnexpectedEof => "ECONNRESET",
        ConnectionAborted => "ECONNABORTED",
        // read timeouts surface as WouldBlock on unix
        TimedOut | WouldBlock => "ETIMEDOUT",
        BrokenPipe => "EPIPE",
        AddrNotAvailable => "EADDRNOTAVAIL",
        AddrInUse => "EADDRINUSE",
        NotConnected => "ENOTCONN",
        _ => "EIO",
    }
}

/// Reading the payload for an upload failed
#[derive(Debug, Clone)]
pub struct ReaderError {
    msg: String,
}

impl ReaderError {
    /// create the error from the underlying reader failure
    pub fn new(msg: &str) -> Self {
        Self { msg: msg.to_string() }
    }
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read payload: {}", self.msg)
    }
}

/// A successful response carried a body that is not the expected JSON
#[derive(Debug, Clone)]
pub struct JsonParseError {
    msg: String,
    raw: String,
}

impl JsonParseError {
    /// create the error from the decoder message and the raw body
    pub fn new(msg: &str, raw: String) -> Self {
        Self {
            msg: msg.to_string(),
            raw,
        }
    }

    /// the body as received
    pub fn raw(&self) -> &str {
        self.raw.as_str()
    }
}

impl fmt::Display for JsonParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse response body as JSON: {}", self.msg)
    }
}

/// The url is missing a host, uses an unsupported scheme, and so on
#[derive(Debug, Clone)]
pub struct InvalidUrl {
    msg: String,
}

impl InvalidUrl {
    /// create the error with a description
    pub fn new(msg: &str) -> Self {
        Self { msg: msg.to_string() }
    }
}

impl fmt::Display for InvalidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg.as_str())
    }
}

/// The response head is malformed or too large
#[derive(Debug, Clone)]
pub struct InvalidHttpHeader {
    msg: String,
}

impl InvalidHttpHeader {
    /// create the error with a description
    pub fn new(msg: &str) -> Self {
        Self { msg: msg.to_string() }
    }
}

impl fmt::Display for InvalidHttpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg.as_str())
    }
}

enum ErrorKind {
    Http(HttpError),
    Request(RequestError),
    Reader(ReaderError),
    JsonParse(JsonParseError),
    InvalidUrl(InvalidUrl),
    InvalidHttpHeader(InvalidHttpHeader),
    Uri(url::ParseError),
    Builder(http::Error),
    StatusCode(InvalidStatusCode),
    Method(InvalidMethod),
    HeaderName(InvalidHeaderName),
    HeaderValue(InvalidHeaderValue),
    ToStrError(ToStrError),
    Parse(httparse::Error),
    Json(serde_json::Error),
    Io(io::Error),
    FromUtf8Error(FromUtf8Error),
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("sdk_http::Error")
            // Skip the noise of the ErrorKind enum
            .field(&self.get_ref())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.get_ref(), f)
    }
}

impl Error {
    /// Return true if the underlying error has the same type as T.
    pub fn is<T: error::Error + 'static>(&self) -> bool {
        self.get_ref().is::<T>()
    }

    /// Return a reference to the lower level, inner error.
    pub fn get_ref(&self) -> &(dyn error::Error + 'static) {
        use self::ErrorKind::*;
        match self.inner {
            Http(ref e) => e,
            Request(ref e) => e,
            Reader(ref e) => e,
            JsonParse(ref e) => e,
            InvalidUrl(ref e) => e,
            InvalidHttpHeader(ref e) => e,
            Uri(ref e) => e,
            Builder(ref e) => e,
            StatusCode(ref e) => e,
            Method(ref e) => e,
            HeaderName(ref e) => e,
            HeaderValue(ref e) => e,
            ToStrError(ref e) => e,
            Parse(ref e) => e,
            Json(ref e) => e,
            Io(ref e) => e,
            FromUtf8Error(ref e) => e,
        }
    }

    /// status code of the response when the server answered with an error status
    pub fn status_code(&self) -> Option<StatusCode> {
        match self.inner {
            ErrorKind::Http(ref e) => Some(e.status_code()),
            _ => None,
        }
    }

    /// network error code when the request itself failed, e.g. `ENOTFOUND`
    pub fn code(&self) -> Option<&str> {
        match self.inner {
            ErrorKind::Request(ref e) => Some(e.code()),
            _ => None,
        }
    }
}

impl error::Error for Error {
    // Return any available cause from the inner error. Note the inner error is
    // not itself the cause.
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.get_ref().source()
    }
}

impl_error!(HttpError);
impl_error!(RequestError);
impl_error!(ReaderError);
impl_error!(JsonParseError);
impl_error!(InvalidUrl);
impl_error!(InvalidHttpHeader);

from_error!(HttpError,ErrorKind::Http);
from_error!(RequestError,ErrorKind::Request);
from_error!(ReaderError,ErrorKind::Reader);
from_error!(JsonParseError,ErrorKind::JsonParse);
from_error!(InvalidUrl,ErrorKind::InvalidUrl);
from_error!(InvalidHttpHeader,ErrorKind::InvalidHttpHeader);
from_error!(url::ParseError,ErrorKind::Uri);
from_error!(http::Error,ErrorKind::Builder);
from_error!(InvalidStatusCode,ErrorKind::StatusCode);
from_error!(InvalidMethod,ErrorKind::Method);
from_error!(InvalidHeaderName,ErrorKind::HeaderName);
from_error!(InvalidHeaderValue,ErrorKind::HeaderValue);
from_error!(ToStrError,ErrorKind::ToStrError);
from_error!(httparse::Error,ErrorKind::Parse);
from_error!(serde_json::Error,ErrorKind::Json);
from_error!(io::Error,ErrorKind::Io);
from_error!(FromUtf8Error,ErrorKind::FromUtf8Error);
