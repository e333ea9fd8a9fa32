use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PackError;
use crate::encoding::{b64_decode, b64_encode};

/// Value of `enc` in every protected header we produce
pub const ENC_XCHACHA20POLY1305_IETF: &str = "xchacha20poly1305_ietf";
/// Value of `typ` in every protected header we produce
pub const TYP_JWM: &str = "JWM/1.0";

/// How the content key is wrapped for each recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackAlg {
    /// Sender identity is sealed to, and provable to, each recipient
    Authcrypt,
    /// No sender identity
    Anoncrypt,
}

impl PackAlg {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackAlg::Authcrypt => "Authcrypt",
            PackAlg::Anoncrypt => "Anoncrypt",
        }
    }
}

impl fmt::Display for PackAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackAlg {
    type Err = PackError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Authcrypt" => Ok(PackAlg::Authcrypt),
            "Anoncrypt" => Ok(PackAlg::Anoncrypt),
            other => Err(PackError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Per-recipient header
///
/// On the wire this is `{kid, sender, iv}` with `sender` and `iv` either
/// both strings or both null. Any other combination fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecipientHeader", into = "RawRecipientHeader")]
pub enum RecipientHeader {
    Anonymous {
        /// base58 recipient verkey
        kid: String,
    },
    Authenticated {
        /// base58 recipient verkey
        kid: String,
        /// base64url sealed box holding the sender's base58 verkey
        sender: String,
        /// base64url `crypto_box` nonce for `encrypted_key`
        iv: String,
    },
}

impl RecipientHeader {
    pub fn kid(&self) -> &str {
        match self {
            RecipientHeader::Anonymous { kid } => kid,
            RecipientHeader::Authenticated { kid, .. } => kid,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, RecipientHeader::Authenticated { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct RawRecipientHeader {
    kid: String,
    sender: Option<String>,
    iv: Option<String>,
}

impl TryFrom<RawRecipientHeader> for RecipientHeader {
    type Error = String;
    fn try_from(raw: RawRecipientHeader) -> Result<Self, Self::Error> {
        match (raw.sender, raw.iv) {
            (None, None) => Ok(RecipientHeader::Anonymous { kid: raw.kid }),
            (Some(sender), Some(iv)) => Ok(RecipientHeader::Authenticated {
                kid: raw.kid,
                sender,
                iv,
            }),
            _ => Err(format!(
                "recipient header for {} must carry both sender and iv, or neither",
                raw.kid
            )),
        }
    }
}

impl From<RecipientHeader> for RawRecipientHeader {
    fn from(header: RecipientHeader) -> Self {
        match header {
            RecipientHeader::Anonymous { kid } => RawRecipientHeader {
                kid,
                sender: None,
                iv: None,
            },
            RecipientHeader::Authenticated { kid, sender, iv } => RawRecipientHeader {
                kid,
                sender: Some(sender),
                iv: Some(iv),
            },
        }
    }
}

/// The content key wrapped for a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientBlock {
    /// base64url wrapped content key
    pub encrypted_key: String,
    pub header: RecipientHeader,
}

/// The envelope's authenticated-but-plaintext header
///
/// Field order here is the order on the wire. `alg` is kept as the raw
/// string so that an unknown algorithm can be reported as such instead of
/// as a parse failure; see [`ProtectedHeader::alg`]. `enc` and `typ` are
/// informational: peers may omit them, and they are never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    #[serde(default = "default_enc")]
    pub enc: String,
    #[serde(default = "default_typ")]
    pub typ: String,
    pub alg: String,
    pub recipients: Vec<RecipientBlock>,
}

fn default_enc() -> String {
    ENC_XCHACHA20POLY1305_IETF.to_string()
}

fn default_typ() -> String {
    TYP_JWM.to_string()
}

impl ProtectedHeader {
    pub fn new(alg: PackAlg, recipients: Vec<RecipientBlock>) -> Self {
        Self {
            enc: ENC_XCHACHA20POLY1305_IETF.to_string(),
            typ: TYP_JWM.to_string(),
            alg: alg.as_str().to_string(),
            recipients,
        }
    }

    pub fn alg(&self) -> Result<PackAlg, PackError> {
        self.alg.parse()
    }

    /// Serialize to JSON, then base64url
    ///
    /// The returned string is used verbatim as the `protected` field and as
    /// the payload's associated data.
    pub fn encode(&self) -> Result<String, PackError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| PackError::MalformedEnvelope(format!("header encode error: {}", e)))?;
        Ok(b64_encode(json))
    }

    pub fn decode(protected: &str) -> Result<Self, PackError> {
        let json = b64_decode(protected)?;
        serde_json::from_slice(&json)
            .map_err(|e| PackError::MalformedEnvelope(format!("invalid protected header: {}", e)))
    }

    /// Reject headers that address the same `kid` twice
    ///
    /// Resolution is first-match-wins, so a repeated `kid` would make the
    ///  outcome depend on block order.
    pub fn check_unique_kids(&self) -> Result<(), PackError> {
        let mut seen = HashSet::with_capacity(self.recipients.len());
        for block in &self.recipients {
            if !seen.insert(block.header.kid()) {
                return Err(PackError::MalformedEnvelope(format!(
                    "duplicate recipient kid {}",
                    block.header.kid()
                )));
            }
        }
        Ok(())
    }
}
