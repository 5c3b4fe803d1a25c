//! Request and response bodies

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{JsonParseError, ReaderError, Result};

/// Request/Response body
#[derive(Clone, Debug)]
pub struct Body {
    kind: BodyKind
}

/// match body kind and process
#[macro_export]
macro_rules! body_kind {
    ($kind:expr, $text:ident => $process_text:block, $binary:ident  => $process_bin:block, $empty:ident => $process_ety:block) => {
        match $kind {
            $crate::body::BodyKind::Text($text) => $process_text
            $crate::body::BodyKind::Binary($binary) => $process_bin
            $crate::body::BodyKind::Empty =>  $process_ety
        }
    };
}

impl Body {
    /// create a empty Request body
    pub fn empty() -> Self {
        Self::new(BodyKind::Empty)
    }

    /// create the body use given `kind`
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind
        }
    }

    /// Create the Request Body from bytes
    pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> Self {
        Body::new(BodyKind::Binary(BytesMut::from(bytes.as_ref())))
    }

    /// Create the Request Body from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(str: &str) -> Self {
        Body::new(BodyKind::Text(str.to_owned()))
    }

    /// Create the Request Body from string
    pub fn from_string(str: String) -> Self {
        Body::new(BodyKind::Text(str))
    }

    /// Create the Request Body from Vec
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Body::new(BodyKind::Binary(BytesMut::from(vec.as_slice())))
    }

    /// Create the Request Body from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self::from_vec(data))
    }

    /// Drain `reader` into a binary body
    ///
    /// Any failure while reading is reported as a [`ReaderError`].
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)
            .map_err(|e| ReaderError::new(&e.to_string()))?;
        Ok(Self::from_vec(data))
    }

    /// Serialize `value` as a JSON text body
    pub fn from_json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::from_string(serde_json::to_string(value)?))
    }

    /// return the Body length
    pub fn body_length(&self) -> usize {
        body_kind!(self.kind(),
            text => {
                text.len()
            },
            binary => {
                binary.len()
            },
            _empty => {
                0
            }
        )
    }

    /// true when the body carries no bytes
    pub fn is_empty(&self) -> bool {
        self.body_length() == 0
    }

    /// return http body kind (Empty, Text or Binary)
    pub fn kind(&self) -> &BodyKind {
        &self.kind
    }

    /// the raw bytes of the body
    pub fn as_bytes(&self) -> &[u8] {
        body_kind!(self.kind(),
            text => {
                text.as_bytes()
            },
            binary => {
                binary.as_ref()
            },
            _empty => {
                &[]
            }
        )
    }

    /// the body as text, invalid UTF-8 is replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Decode the body as JSON
    ///
    /// An empty body decodes as JSON `null`. Malformed input is reported as a
    /// [`JsonParseError`] carrying the raw text.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.as_bytes();
        let parsed = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(bytes)
        };
        parsed.map_err(|e| JsonParseError::new(&e.to_string(), self.text()).into())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for Body {
    fn from(vec: Vec<u8>) -> Self {
        Self::from_vec(vec)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(str: String) -> Self {
        Self::from_string(str)
    }
}

impl From<&str> for Body {
    fn from(str: &str) -> Self {
        Self::from_str(str)
    }
}

/// The Http Request/Response Body Type
#[derive(Clone, Debug)]
pub enum BodyKind {
    /// the request content is text
    Text(String),
    /// the request content is binary
    Binary(BytesMut),
    /// the request content is empty
    Empty,
}
