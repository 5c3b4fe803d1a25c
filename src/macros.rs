/// macro for http header
/// # Usage
/// ```no_run
/// use sdk_http::http_header;
///
/// let headers = http_header! {
///     "Accept" => "application/json",
///     "Authorization" => "Bearer token",
/// };
/// let profile: serde_json::Value = sdk_http::get("http://127.0.0.1:8080/v2/bot/profile", headers).expect("failed");
/// ```
///
/// Panics when a value is not a valid header value.
#[macro_export]
macro_rules! http_header {

    (@item $($x:tt)*) => (());

    (@count $($key:expr),*) => (<[()]>::len(&[$($crate::http_header!(@item $key)),*]));

    ($($key:expr => $value:expr),*$(,)*) => {
        {
            let len = $crate::http_header! (@count $($key),*);
            let mut __inner_map: $crate::headers::HeaderMap<$crate::headers::HeaderValue> = $crate::headers::HeaderMap::with_capacity(len);
            $(
                __inner_map.append($key,$value.parse::<$crate::headers::HeaderValue>().unwrap());
            )*
            __inner_map
        }
    };
}
