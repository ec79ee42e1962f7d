//! Scenario fixture schema.
//!
//! Fixtures are JSON. The staged request is assembled from parts so a
//! fixture can express well-formed lists and raw garbage alike; the
//! authenticator digest is derived from the password exactly the way the
//! OS-side stager derives it, never written literally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mokman_core::{auth, siglist};
use mokman_efi::guid;

/// Fixture decode and validation failures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("bad hex in {context}: {source}")]
    BadHex {
        context: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("sha256 part must be 32 bytes, got {0}")]
    BadDigestLen(usize),
    #[error("unknown keystroke {0:?}")]
    BadKeystroke(String),
}

pub(crate) fn decode_hex(context: &'static str, value: &str) -> Result<Vec<u8>, FixtureError> {
    hex::decode(value).map_err(|source| FixtureError::BadHex { context, source })
}

/// One building block of the staged request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// A one-entry certificate list wrapped around this DER (hex).
    CertDer { hex: String },
    /// A one-entry hash list wrapped around this digest (hex, 32 bytes).
    Sha256 { hex: String },
    /// Bytes appended verbatim (malformed-region fixtures).
    Raw { hex: String },
}

impl Part {
    /// The bytes this part contributes to the request.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FixtureError> {
        match self {
            Part::CertDer { hex } => {
                let der = decode_hex("cert_der", hex)?;
                Ok(siglist::encode_cert(&der, &guid::SHIM_LOCK))
            }
            Part::Sha256 { hex } => {
                let bytes = decode_hex("sha256", hex)?;
                let digest: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| FixtureError::BadDigestLen(bytes.len()))?;
                Ok(siglist::encode_hash(&digest, &guid::SHIM_LOCK))
            }
            Part::Raw { hex } => decode_hex("raw", hex),
        }
    }
}

/// One filesystem instance visible to the browse screens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsFixture {
    pub device_path: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Path ("dir/file.der") to file contents (hex).
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

/// Expected state after the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Expectations {
    /// Exact `MokList` contents (hex).
    #[serde(default)]
    pub mok_list_hex: Option<String>,
    /// `MokList` must not exist.
    #[serde(default)]
    pub mok_list_absent: bool,
    #[serde(default)]
    pub mok_new_deleted: bool,
    #[serde(default)]
    pub mok_auth_deleted: bool,
    /// Substrings that must appear in the captured console output.
    #[serde(default)]
    pub output_contains: Vec<String>,
    /// Substrings that must not appear.
    #[serde(default)]
    pub output_lacks: Vec<String>,
}

/// One replayable session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Parts concatenated into `MokNew`. Empty means no staged request.
    #[serde(default)]
    pub staged: Vec<Part>,
    /// Session password; when present, `MokAuth` is derived from it and
    /// the staged request the way the stager computes it.
    #[serde(default)]
    pub password: Option<String>,
    /// Pre-existing `MokList` contents (hex).
    #[serde(default)]
    pub mok_list: Option<String>,
    #[serde(default)]
    pub filesystems: Vec<FsFixture>,
    /// Whether the shim-lock protocol is registered.
    #[serde(default)]
    pub shim_lock: bool,
    /// Keystroke script: `up`, `down`, `enter`, `text:<chars>`,
    /// `line:<chars>` (text followed by Enter).
    #[serde(default)]
    pub keys: Vec<String>,
    pub expect: Expectations,
}

impl Scenario {
    /// The staged request bytes, or `None` when nothing is staged.
    pub fn request_bytes(&self) -> Result<Option<Vec<u8>>, FixtureError> {
        if self.staged.is_empty() {
            return Ok(None);
        }
        let mut request = Vec::new();
        for part in &self.staged {
            request.extend_from_slice(&part.to_bytes()?);
        }
        Ok(Some(request))
    }

    /// The authenticator digest, when a password is given.
    pub fn auth_digest(&self) -> Result<Option<[u8; 32]>, FixtureError> {
        let Some(password) = &self.password else {
            return Ok(None);
        };
        let request = self.request_bytes()?.unwrap_or_default();
        let units: Vec<u16> = password.encode_utf16().collect();
        Ok(Some(auth::compute_pw_hash(&request, &units)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_round_trips_through_codec() {
        let part = Part::Sha256 {
            hex: "11".repeat(32),
        };
        let bytes = part.to_bytes().unwrap();
        assert_eq!(siglist::count(&bytes), 1);
    }

    #[test]
    fn test_bad_digest_length_rejected() {
        let part = Part::Sha256 {
            hex: "11".repeat(16),
        };
        assert!(matches!(part.to_bytes(), Err(FixtureError::BadDigestLen(16))));
    }

    #[test]
    fn test_schema_round_trip() {
        let scenario = Scenario {
            name: "decline".into(),
            staged: vec![Part::CertDer { hex: "00ff".into() }],
            password: Some("hunter2".into()),
            mok_list: None,
            filesystems: vec![],
            shim_lock: false,
            keys: vec!["down".into(), "enter".into(), "line:n".into()],
            expect: Expectations {
                mok_list_absent: true,
                mok_new_deleted: true,
                mok_auth_deleted: true,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&scenario).unwrap();
        let back: Scenario = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "decline");
        assert_eq!(back.keys.len(), 3);
    }
}
