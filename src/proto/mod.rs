//! The HTTP/1 wire layer: connections, request encoding, response heads
//! and body framing.

use std::io::{Read, Write};
use std::net::SocketAddr;

pub use http1::conn::{HttpConfig, HttpConnector};
pub use http1::decode::{BodyReader, Framing};
pub use http1::parse::{RequestParser, ResponseHead, ResponseParser, MAX_HEAD_SIZE};

use crate::error::Result;

pub(crate) mod http1;

/// outcome of feeding bytes to a parser
#[derive(Debug)]
pub enum ParserResult<T> {
    /// a full message was parsed
    Complete(T),
    /// more bytes are needed
    Partial,
}

/// the HttpClient inner type
/// usr can implement Connector and use it by HttpClient::from_connector()
pub trait Connector {
    /// the duplex byte stream of one connection
    type Stream: Read + Write;

    /// open a new connection to the socket addr
    fn connect(&mut self, addr: &SocketAddr) -> Result<Self::Stream>;
}
