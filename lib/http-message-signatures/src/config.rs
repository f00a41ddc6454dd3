//!
//! Configuration of the signer and the verifier
//!

use crate::{
    component::SignatureComponent,
    crypto::{parse::KeyEncoding, SignatureEncoding},
    digest,
    error::ConfigurationError,
    rfc9421::PathMode,
    signer::HttpSigner,
    verifier::HttpVerifier,
};
use http::HeaderName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum signature age unless configured otherwise (5 minutes)
pub const DEFAULT_MAX_AGE: u64 = 5 * 60;

/// Components the verifier accepts unless configured otherwise
#[must_use]
pub fn default_allowed_components() -> Vec<SignatureComponent> {
    vec![
        SignatureComponent::content_digest(),
        SignatureComponent::Header(crate::DEFAULT_KEY_REFERENCE_HEADER.clone()),
        SignatureComponent::Method,
        SignatureComponent::TargetPath,
        SignatureComponent::Authority,
    ]
}

/// Signature configuration, usually loaded from a TOML file
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Configuration {
    /// Components the verifier accepts in a `Signature-Input` header
    pub allowed_components: Vec<SignatureComponent>,

    /// Algorithm of the `Content-Digest` header
    pub digest_algorithm: digest::Algorithm,

    /// Container format of the private key
    pub key_encoding: KeyEncoding,

    /// Header carrying the opaque key envelope
    pub key_reference_header: String,

    /// Dictionary label of the signature
    pub label: String,

    /// Maximum signature age in seconds (0 disables the check)
    pub max_age: u64,

    /// What `@path` covers
    pub path_mode: PathMode,

    /// Text encoding of the signature bytes
    pub signature_encoding: SignatureEncoding,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            allowed_components: default_allowed_components(),
            digest_algorithm: digest::Algorithm::default(),
            key_encoding: KeyEncoding::default(),
            key_reference_header: crate::DEFAULT_KEY_REFERENCE_HEADER.as_str().to_string(),
            label: crate::DEFAULT_LABEL.to_string(),
            max_age: DEFAULT_MAX_AGE,
            path_mode: PathMode::default(),
            signature_encoding: SignatureEncoding::default(),
        }
    }
}

impl Configuration {
    /// Parse the configuration from its TOML representation
    pub fn from_toml(content: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(content)?;
        config.key_reference_header()?;

        Ok(config)
    }

    /// Header carrying the opaque key envelope
    pub fn key_reference_header(&self) -> Result<HeaderName, ConfigurationError> {
        Ok(HeaderName::from_bytes(
            self.key_reference_header.as_bytes(),
        )?)
    }

    /// Maximum signature age, `None` if unchecked
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age != 0).then(|| Duration::from_secs(self.max_age))
    }

    /// Construct a signer from this configuration
    pub fn signer(&self) -> Result<HttpSigner, ConfigurationError> {
        Ok(HttpSigner::builder()
            .label(self.label.clone())
            .digest_algorithm(self.digest_algorithm)
            .path_mode(self.path_mode)
            .signature_encoding(self.signature_encoding)
            .key_reference_header(self.key_reference_header()?)
            .build())
    }

    /// Construct a verifier from this configuration
    #[must_use]
    pub fn verifier(&self) -> HttpVerifier {
        HttpVerifier::builder()
            .label(self.label.clone())
            .path_mode(self.path_mode)
            .signature_encoding(self.signature_encoding)
            .max_age(self.max_age())
            .allowed_components(self.allowed_components.clone())
            .build()
    }
}
