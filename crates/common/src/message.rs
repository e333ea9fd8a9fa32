//! Hand-off of decrypted plaintext to message dispatch
//!
//! The envelope layer treats plaintext as opaque text. Dispatch lives
//! elsewhere; this module only does the one check every consumer needs
//! before routing, pulling out the `@type` a message claims to be.

use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum MessageParseError {
    #[error("could not parse message json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a json object")]
    NotAnObject,
    #[error("message does not contain '@type' parameter")]
    MissingType,
}

/// A decrypted message, parsed just enough to route it
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    msg_type: String,
    body: Map<String, Value>,
}

impl Message {
    pub fn parse(plaintext: &str) -> Result<Self, MessageParseError> {
        let Value::Object(body) = serde_json::from_str(plaintext)? else {
            return Err(MessageParseError::NotAnObject);
        };
        let msg_type = match body.get("@type") {
            Some(Value::String(t)) if !t.is_empty() => t.clone(),
            _ => return Err(MessageParseError::MissingType),
        };
        Ok(Self { msg_type, body })
    }

    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    pub fn id(&self) -> Option<&str> {
        self.body.get("@id").and_then(Value::as_str)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}
