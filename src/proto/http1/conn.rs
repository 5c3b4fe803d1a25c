use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

use net2::{TcpBuilder, TcpStreamExt};

use crate::error::{Error, RequestError, Result};
use crate::proto::Connector;

/// the tcp configuration for http client
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// if is None block until the OS gives up
    pub connect_timeout: Option<Duration>,
    /// if is None reads never time out
    pub read_timeout: Option<Duration>,
    /// if is None writes never time out
    pub write_timeout: Option<Duration>,
    /// if is None `SO_KEEPALIVE` is left alone
    pub keep_alive_timeout: Option<Duration>,
    /// if is None use System given ip address
    pub local_address: Option<IpAddr>,
    /// not delay
    pub nodelay: bool,
    /// tcp connector will reuse ip address and port if `reuse_address` is true
    pub reuse_address: bool,
    ///
    pub ttl: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(30)),
            keep_alive_timeout: None,
            local_address: None,
            nodelay: true,
            reuse_address: false,
            ttl: 64,
        }
    }
}

/// Opens one plain TCP connection per request
#[derive(Debug, Default)]
pub struct HttpConnector {
    config: HttpConfig,
}

impl HttpConnector {
    /// Construct a new HttpConnector.
    pub fn new() -> Self {
        Self::with_http_config(HttpConfig::default())
    }

    /// Construct a new HttpConnector use given http config
    pub fn with_http_config(config: HttpConfig) -> Self {
        Self {
            config,
        }
    }

    /// Set that all sockets have `SO_KEEPALIVE` set with the supplied duration.
    ///
    /// If `None`, the option will not be set.
    ///
    /// Default is `None`.
    #[inline]
    pub fn set_keepalive(&mut self, dur: Option<Duration>) {
        self.config.keep_alive_timeout = dur;
    }

    ///
    #[inline]
    pub fn set_ttl(&mut self, ttl: u32) {
        self.config.ttl = ttl;
    }

    /// Set that all sockets have `SO_NODELAY` set to the supplied value `nodelay`.
    ///
    /// Default is `true`.
    #[inline]
    pub fn set_nodelay(&mut self, nodelay: bool) {
        self.config.nodelay = nodelay;
    }

    /// Set that all sockets are bound to the configured address before connection.
    ///
    /// If `None`, the sockets will not be bound.
    ///
    /// Default is `None`.
    #[inline]
    pub fn set_local_address(&mut self, addr: Option<IpAddr>) {
        self.config.local_address = addr;
    }

    /// Set the connect timeout.
    ///
    /// Only honoured when the socket needs no local binding or address reuse;
    /// otherwise the connect blocks until the OS gives up.
    ///
    /// Default is 30 seconds.
    #[inline]
    pub fn set_connect_timeout(&mut self, dur: Option<Duration>) {
        self.config.connect_timeout = dur;
    }

    /// Set the timeout of every single read on the connection.
    ///
    /// Default is 30 seconds.
    #[inline]
    pub fn set_read_timeout(&mut self, dur: Option<Duration>) {
        self.config.read_timeout = dur;
    }

    /// Set the timeout of every single write on the connection.
    ///
    /// Default is 30 seconds.
    #[inline]
    pub fn set_write_timeout(&mut self, dur: Option<Duration>) {
        self.config.write_timeout = dur;
    }

    /// the active configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn create_connection(&self, socket_addr: &SocketAddr) -> io::Result<TcpStream> {
        let config = &self.config;
        let stream = match config.connect_timeout {
            Some(timeout) if config.local_address.is_none() && !config.reuse_address => {
                let stream = TcpStream::connect_timeout(socket_addr, timeout)?;
                stream.set_ttl(config.ttl)?;
                stream
            }
            _ => {
                // use net2 crate to build Tcp Stream
                let tcp_builder = match socket_addr {
                    SocketAddr::V4(_) => TcpBuilder::new_v4(),
                    SocketAddr::V6(_) => TcpBuilder::new_v6(),
                }?;
                //  Set value for the `SO_REUSEADDR` option on this socket
                if config.reuse_address {
                    tcp_builder.reuse_address(true)?;
                }
                tcp_builder.ttl(config.ttl)?;
                if let Some(local) = config.local_address {
                    // let system chose port
                    tcp_builder.bind(SocketAddr::new(local, 0))?;
                }
                tcp_builder.connect(socket_addr)?
            }
        };
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;
        stream.set_keepalive(config.keep_alive_timeout)?;
        Ok(stream)
    }
}

impl Connector for HttpConnector {
    type Stream = TcpStream;

    fn connect(&mut self, addr: &SocketAddr) -> Result<TcpStream> {
        debug!("connecting to {}", addr);
        self.create_connection(addr).map_err(|e| {
            debug!("connect to {} failed: {}", addr, e);
            Error::from(RequestError::from_io(&e))
        })
    }
}
