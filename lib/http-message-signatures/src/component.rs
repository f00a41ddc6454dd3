//!
//! Covered components of a signature
//!

use http::{header::InvalidHeaderName, HeaderName};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Component identifier failed to parse
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Identifier is empty
    #[error("Empty component identifier")]
    Empty,

    /// Identifier isn't a valid header name
    #[error("Invalid header name")]
    InvalidHeaderName(#[from] InvalidHeaderName),

    /// Identifier starts with `@` but isn't one of the supported derived components
    #[error("Unsupported derived component \"{0}\"")]
    UnsupportedDerived(String),
}

/// Components of the signature
///
/// Derived components are computed from the request itself, header components are taken verbatim from the header snapshot
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureComponent {
    /// HTTP method (`@method`)
    Method,

    /// Target path, optionally with the query (`@path`)
    TargetPath,

    /// Host and non-default port (`@authority`)
    Authority,

    /// Header of the request
    Header(HeaderName),
}

impl SignatureComponent {
    /// `Content-Digest` header component
    #[must_use]
    pub fn content_digest() -> Self {
        Self::Header(crate::CONTENT_DIGEST_HEADER.clone())
    }

    /// Construct a header component
    #[must_use]
    pub fn header(name: HeaderName) -> Self {
        Self::Header(name)
    }

    /// Identifier as it appears inside the `Signature-Input` header and the signature base
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Method => "@method",
            Self::TargetPath => "@path",
            Self::Authority => "@authority",
            Self::Header(name) => name.as_str(),
        }
    }

    /// Whether this is a derived component
    #[must_use]
    pub fn is_derived(&self) -> bool {
        !matches!(self, Self::Header(..))
    }
}

impl FromStr for SignatureComponent {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let component = match raw {
            "" => return Err(Error::Empty),
            "@method" => Self::Method,
            "@path" => Self::TargetPath,
            "@authority" => Self::Authority,
            derived if derived.starts_with('@') => {
                return Err(Error::UnsupportedDerived(derived.to_string()))
            }
            // `HeaderName::from_bytes` lower-cases the name for us
            header => Self::Header(HeaderName::from_bytes(header.as_bytes())?),
        };

        Ok(component)
    }
}

impl TryFrom<String> for SignatureComponent {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignatureComponent> for String {
    fn from(value: SignatureComponent) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SignatureComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
