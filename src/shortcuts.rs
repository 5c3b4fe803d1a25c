//! One-shot helpers
//!
//! Each call opens a fresh [`HttpClient`] with the default configuration,
//! performs a single request and closes the connection. Every request carries
//! `user-agent: <package-name>/<package-version>`; a response status >= 400
//! fails with an [`HttpError`](crate::error::HttpError) and a request that
//! never got an answer fails with a [`RequestError`](crate::error::RequestError).

use std::io::Read;

use http::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::client::HttpClient;
use crate::error::Result;
use crate::stream::ResponseStream;

/// GET `url` and decode the JSON response
///
/// ```no_run
/// use sdk_http::http_header;
///
/// let headers = http_header! { "Authorization" => "Bearer token" };
/// let echo: serde_json::Value = sdk_http::get("http://127.0.0.1:8080/get?x=10", headers).unwrap();
/// assert_eq!("10", echo["query"]["x"]);
/// ```
pub fn get<T: DeserializeOwned>(url: &str, headers: HeaderMap) -> Result<T> {
    HttpClient::http().get(url, headers)
}

/// POST `body` as JSON to `url` and decode the JSON response
pub fn post<T: DeserializeOwned>(url: &str, headers: HeaderMap, body: Option<Body>) -> Result<T> {
    HttpClient::http().post(url, headers, body)
}

/// DELETE `url` and decode the JSON response
pub fn delete<T: DeserializeOwned>(url: &str, headers: HeaderMap) -> Result<T> {
    HttpClient::http().delete(url, headers)
}

/// GET `url` and return the body as a byte stream
pub fn stream(url: &str, headers: HeaderMap) -> Result<ResponseStream> {
    HttpClient::http().stream(url, headers)
}

/// POST raw bytes, the content type is sniffed unless given
pub fn post_binary<T, B>(url: &str, headers: HeaderMap, data: B, content_type: Option<&str>) -> Result<T>
    where T: DeserializeOwned,
          B: Into<Body>,
{
    HttpClient::http().post_binary(url, headers, data, content_type)
}

/// POST everything `reader` yields, the content type is sniffed unless given
pub fn post_binary_reader<T, R>(url: &str, headers: HeaderMap, reader: R, content_type: Option<&str>) -> Result<T>
    where T: DeserializeOwned,
          R: Read,
{
    HttpClient::http().post_binary_reader(url, headers, reader, content_type)
}
