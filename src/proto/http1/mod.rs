pub(crate) mod conn;
pub(crate) mod decode;
pub(crate) mod parse;
