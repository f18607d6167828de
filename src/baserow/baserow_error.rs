use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BaserowError {
    Network(String),
    /// Non-2xx response from the Baserow API: status plus response body.
    Api(u16, String),
    SchemaFetch(String),
    JsonParse(String),
    Upload(String),
}

impl fmt::Display for BaserowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaserowError::Network(msg) => write!(f, "Network error: {msg}"),
            BaserowError::Api(status, body) => write!(f, "Baserow API error: {status} - {body}"),
            BaserowError::SchemaFetch(msg) => write!(f, "Schema fetch failed: {msg}"),
            BaserowError::JsonParse(msg) => write!(f, "JSON parse error: {msg}"),
            BaserowError::Upload(msg) => write!(f, "File upload failed: {msg}"),
        }
    }
}

impl Error for BaserowError {}
