//! A small sync HTTP/1.1 client wrapper for JSON APIs
//!
//! The crate exposes five helpers, [`get`], [`post`], [`delete`], [`stream`]
//! and [`post_binary`], that forward method, path, query, headers and body
//! to the server, tag every request with
//! `user-agent: <package-name>/<package-version>` and decode JSON responses.
//! Failures come back as [`Error`](error::Error): an error status carries its
//! [`status_code`](error::Error::status_code), a request that never got an
//! answer carries a network [`code`](error::Error::code) such as `ENOTFOUND`.
//!
//! Messages are built with the types of the [http](https://github.com/hyperium/http)
//! crate.

#![deny(warnings, missing_docs, missing_debug_implementations)]

#[macro_use]
extern crate log;

pub use url;

#[macro_use]
mod macros;
pub mod body;
pub mod error;
pub mod mime;
pub mod proto;
mod client;
mod shortcuts;
mod stream;

pub use crate::client::{HttpClient, DEFAULT_USER_AGENT};
pub use crate::shortcuts::{delete, get, post, post_binary, post_binary_reader, stream};
pub use crate::stream::ResponseStream;

/// Header names and maps
pub mod headers {
    pub use ::http::header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, AUTHORIZATION,
                             CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST,
                             TRANSFER_ENCODING, USER_AGENT,
                             HeaderMap, HeaderName, HeaderValue};
}

/// Everything needed to issue requests
pub mod produce {
    pub use url::{ParseError, Url};
    pub use ::http::{HeaderMap, Method, Request, Response, StatusCode, Version};

    pub use crate::body::{Body, BodyKind};
    pub use crate::client::{HttpClient, DEFAULT_USER_AGENT};
    pub use crate::error::{Error, Result};
    pub use crate::proto::{HttpConfig, HttpConnector};
    pub use crate::stream::ResponseStream;
}


#[allow(dead_code)]
fn _assert_types() {
    use produce::*;
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    assert_send::<Request<Body>>();
    assert_send::<Response<Body>>();
    assert_send::<Error>();
    assert_send::<HttpClient>();
    assert_send::<ResponseStream>();

    assert_sync::<Request<Body>>();
    assert_sync::<Response<Body>>();
    assert_sync::<Error>();
}
