//!
//! `Content-Digest` handling
//!
//! The digest is always computed over the exact bytes that are transmitted
//!

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use strum::{AsRefStr, EnumString};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Digest error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Failed to decode the Base64 payload
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    /// Header isn't in the `<algorithm>=:<base64>:` form
    #[error("Malformed Content-Digest header")]
    Malformed,

    /// Algorithm isn't supported
    #[error("Unsupported digest algorithm")]
    UnsupportedAlgorithm(#[from] strum::ParseError),
}

/// Digest algorithm
#[derive(AsRefStr, Clone, Copy, Debug, Default, Deserialize, EnumString, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum Algorithm {
    /// SHA-256
    #[default]
    #[serde(rename = "sha-256")]
    #[strum(serialize = "sha-256")]
    Sha256,
}

impl Algorithm {
    /// Hash the data
    #[must_use]
    pub fn digest(&self, data: impl AsRef<[u8]>) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

/// Value of a `Content-Digest` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentDigest {
    algorithm: Algorithm,
    hash: Vec<u8>,
}

impl ContentDigest {
    /// Compute the SHA-256 digest over the body bytes
    #[must_use]
    pub fn compute(body: &[u8]) -> Self {
        Self::compute_with(Algorithm::Sha256, body)
    }

    /// Compute the digest over the body bytes with the provided algorithm
    #[must_use]
    pub fn compute_with(algorithm: Algorithm, body: &[u8]) -> Self {
        Self {
            algorithm,
            hash: algorithm.digest(body),
        }
    }

    /// Algorithm the digest was computed with
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw hash bytes
    #[must_use]
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Check whether the body matches this digest
    ///
    /// The comparison runs in constant time
    #[must_use]
    pub fn matches(&self, body: &[u8]) -> bool {
        let computed = self.algorithm.digest(body);
        computed.as_slice().ct_eq(self.hash.as_slice()).into()
    }
}

impl FromStr for ContentDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, value) = s.trim().split_once('=').ok_or(Error::Malformed)?;
        let encoded = value
            .strip_prefix(':')
            .and_then(|value| value.strip_suffix(':'))
            .ok_or(Error::Malformed)?;

        Ok(Self {
            algorithm: Algorithm::from_str(algorithm)?,
            hash: base64_simd::STANDARD.decode_to_vec(encoded)?,
        })
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}=:{}:",
            self.algorithm.as_ref(),
            base64_simd::STANDARD.encode_to_string(&self.hash)
        )
    }
}
