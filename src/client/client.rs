use std::io::{Read, Write};

use bytes::BytesMut;
use http::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TRANSFER_ENCODING, USER_AGENT};
use http::{Method, Request, Response, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::body::Body;
use crate::error::{Error, HttpError, InvalidUrl, RequestError, Result};
use crate::mime;
use crate::proto::{Connector, HttpConfig, HttpConnector, RequestParser, ResponseParser, MAX_HEAD_SIZE};
use crate::stream::ResponseStream;

/// `<package-name>/<package-version>`, sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";
const JSON: &str = "application/json";

/// the struct of http client
#[derive(Debug)]
pub struct HttpClient<C: Connector = HttpConnector> {
    connector: C,
    user_agent: HeaderValue,
}

impl<C: Connector> HttpClient<C> {
    /// Build a client on top of a custom connector
    ///
    /// ```
    /// use sdk_http::produce::*;
    ///
    /// let client = HttpClient::from_connector(HttpConnector::new());
    /// assert_eq!(DEFAULT_USER_AGENT, client.user_agent());
    /// ```
    pub fn from_connector(connector: C) -> Self {
        Self {
            connector,
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
        }
    }

    /// Replace the `user-agent` sent with every request
    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self> {
        self.user_agent = HeaderValue::from_str(user_agent)?;
        Ok(self)
    }

    /// the `user-agent` sent with every request
    pub fn user_agent(&self) -> &str {
        // built from a &str, always visible ascii
        self.user_agent.to_str().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// the connector opening the connections
    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    /// Send a prepared request and hand back the response with its body unread
    ///
    /// No status check happens here; see [`HttpClient::request`].
    pub fn send_streaming(&mut self, req: Request<Body>) -> Result<ResponseStream<C::Stream>> {
        let url = Url::parse(&req.uri().to_string())?;
        let method = req.method().clone();
        debug!("{} {}", method, url);

        let req_buf = RequestParser::encode(req)?;
        let mut stream = self.open(&url)?;

        // send request
        stream.write_all(req_buf.as_ref())
            .and_then(|_| stream.flush())
            .map_err(|e| Error::from(RequestError::from_io(&e)))?;

        // response
        let mut buf = BytesMut::new();
        let head = ResponseParser::new().read_head(&mut stream, &mut buf)?;
        ResponseStream::new(head, buf, stream, &method)
    }

    /// Send a prepared request and read the whole response
    ///
    /// No status check happens here; see [`HttpClient::request`].
    pub fn send(&mut self, req: Request<Body>) -> Result<Response<Body>> {
        self.send_streaming(req)?.into_response()
    }

    /// Build a request the way every helper does and send it
    ///
    /// The caller's headers are forwarded unchanged except for `user-agent`,
    /// which is always this client's, and the framing headers. A response
    /// status >= 400 is turned into an [`HttpError`].
    pub fn request(&mut self, method: Method, url: &str, headers: HeaderMap, body: Option<Body>) -> Result<Response<Body>> {
        self.execute(method, url, headers, body)?.into_response()
    }

    /// do http get request, decoding the JSON response
    pub fn get<T: DeserializeOwned>(&mut self, url: &str, headers: HeaderMap) -> Result<T> {
        self.fetch_json(Method::GET, url, headers, None)
    }

    /// do http post request with an optional JSON body
    ///
    /// ```no_run
    /// use sdk_http::produce::*;
    /// use sdk_http::http_header;
    ///
    /// let mut client = HttpClient::http();
    /// let body = Body::from_json(&serde_json::json!({"id": 12345})).unwrap();
    /// let headers = http_header! { "Authorization" => "Bearer token" };
    /// let echo: serde_json::Value = client.post("http://127.0.0.1:8080/post", headers, Some(body)).unwrap();
    /// ```
    pub fn post<T: DeserializeOwned>(&mut self, url: &str, mut headers: HeaderMap, body: Option<Body>) -> Result<T> {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        self.fetch_json(Method::POST, url, headers, body)
    }

    /// do http delete request
    pub fn delete<T: DeserializeOwned>(&mut self, url: &str, headers: HeaderMap) -> Result<T> {
        self.fetch_json(Method::DELETE, url, headers, None)
    }

    /// do http get request and return the body as a readable stream
    pub fn stream(&mut self, url: &str, headers: HeaderMap) -> Result<ResponseStream<C::Stream>> {
        self.execute(Method::GET, url, headers, None)
    }

    /// POST raw bytes
    ///
    /// Without an explicit `content_type` it is sniffed from the data, falling
    /// back to `application/octet-stream`.
    pub fn post_binary<T, B>(&mut self, url: &str, mut headers: HeaderMap, data: B, content_type: Option<&str>) -> Result<T>
        where T: DeserializeOwned,
              B: Into<Body>,
    {
        let body = data.into();
        let content_type = match content_type {
            Some(ct) => HeaderValue::from_str(ct)?,
            None => HeaderValue::from_static(mime::sniff_or_default(body.as_bytes())),
        };
        trace!("uploading {} bytes as {:?}", body.body_length(), content_type);
        headers.insert(CONTENT_TYPE, content_type);
        self.fetch_json(Method::POST, url, headers, Some(body))
    }

    /// [`HttpClient::post_binary`] with the payload drained from `reader` first
    ///
    /// A failure while reading is reported as a
    /// [`ReaderError`](crate::error::ReaderError) and nothing is sent.
    pub fn post_binary_reader<T, R>(&mut self, url: &str, headers: HeaderMap, reader: R, content_type: Option<&str>) -> Result<T>
        where T: DeserializeOwned,
              R: Read,
    {
        let body = Body::from_reader(reader)?;
        self.post_binary(url, headers, body, content_type)
    }

    fn fetch_json<T: DeserializeOwned>(&mut self, method: Method, url: &str, headers: HeaderMap, body: Option<Body>) -> Result<T> {
        let data = self.execute(method, url, headers, body)?.into_bytes()?;
        Body::from_vec(data).json()
    }

    fn execute(&mut self, method: Method, url: &str, headers: HeaderMap, body: Option<Body>) -> Result<ResponseStream<C::Stream>> {
        let req = self.prepare(method, url, headers, body)?;
        let stream = self.send_streaming(req)?;
        error_for_status(stream)
    }

    fn prepare(&self, method: Method, url: &str, mut headers: HeaderMap, body: Option<Body>) -> Result<Request<Body>> {
        let mut url = Url::parse(url)?;
        if url.scheme() != "http" {
            return Err(InvalidUrl::new(&format!("unsupported scheme `{}`", url.scheme())).into());
        }
        url.set_fragment(None);
        let host = host_header(&url)?;

        headers.entry(HOST).or_insert(host);
        headers.entry(ACCEPT).or_insert_with(|| HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(USER_AGENT, self.user_agent.clone());
        // one connection per request
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        // the body is always sent whole, its framing is ours
        headers.remove(TRANSFER_ENCODING);
        headers.remove(CONTENT_LENGTH);

        let expects_body = method == Method::POST || method == Method::PUT || method == Method::PATCH;
        let body = body.unwrap_or_default();
        if expects_body || !body.is_empty() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.body_length()));
        }

        let mut req = Request::builder()
            .method(method)
            .version(Version::HTTP_11)
            .uri(url.as_str())
            .body(body)?;
        *req.headers_mut() = headers;
        Ok(req)
    }

    fn open(&mut self, url: &Url) -> Result<C::Stream> {
        let addrs = RequestParser::socket_addrs(url)?;
        let mut last_err = None;
        for addr in &addrs {
            match self.connector.connect(addr) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("connect to {} failed, {} candidates", addr, addrs.len());
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| RequestError::not_found(url.host_str().unwrap_or("")).into()))
    }
}

impl HttpClient<HttpConnector> {
    /// use http connector
    ///
    /// ```
    /// use sdk_http::produce::*;
    ///
    /// let client = HttpClient::http();
    /// assert!(client.user_agent().starts_with("sdk-http/"));
    /// ```
    pub fn http() -> Self {
        Self::from_connector(HttpConnector::new())
    }

    /// with http config
    ///
    /// ```
    /// use std::time::Duration;
    /// use sdk_http::produce::*;
    ///
    /// let config = HttpConfig {
    ///     read_timeout: Some(Duration::from_secs(5)),
    ///     ..HttpConfig::default()
    /// };
    /// let _client = HttpClient::with_config(config);
    /// ```
    pub fn with_config(config: HttpConfig) -> Self {
        Self::from_connector(HttpConnector::with_http_config(config))
    }
}

impl Default for HttpClient<HttpConnector> {
    fn default() -> Self {
        Self::http()
    }
}

fn host_header(url: &Url) -> Result<HeaderValue> {
    let host = url.host_str().ok_or_else(|| InvalidUrl::new("url has no host"))?;
    let value = match url.port() {
        Some(port) => HeaderValue::from_str(&format!("{}:{}", host, port))?,
        None => HeaderValue::from_str(host)?,
    };
    Ok(value)
}

fn error_for_status<S: Read>(stream: ResponseStream<S>) -> Result<ResponseStream<S>> {
    let status = stream.status();
    if status.as_u16() >= 400 {
        let reason = stream.reason().to_string();
        // the error document is best effort and capped like a head
        let mut body = Vec::new();
        if let Err(e) = stream.take(MAX_HEAD_SIZE as u64).read_to_end(&mut body) {
            debug!("error body of {} unreadable: {}", status, e);
        }
        debug!("request failed with {}", status);
        return Err(HttpError::new(status, &reason, String::from_utf8_lossy(&body).into_owned()).into());
    }
    Ok(stream)
}
