//!
//! Errors surfaced by the signer and the verifier
//!
//! Verification outcomes are not errors, see [`crate::verifier::Rejection`]
//!

use crate::{clock::ClockError, component, crypto, rfc9421::signature_base};
use http::{
    header::{InvalidHeaderName, InvalidHeaderValue},
    HeaderName,
};
use miette::Diagnostic;
use thiserror::Error;

/// Invalid configuration, fatal to the call
#[derive(Debug, Diagnostic, Error)]
pub enum ConfigurationError {
    /// Component list contains the same component twice
    #[error("Component \"{0}\" is covered more than once")]
    DuplicateComponent(component::SignatureComponent),

    /// Component list is empty
    #[error("No components to cover")]
    EmptyComponents,

    /// Component identifier couldn't be parsed
    #[error(transparent)]
    InvalidComponent(#[from] component::Error),

    /// Configured header name isn't valid
    #[error(transparent)]
    InvalidHeaderName(#[from] InvalidHeaderName),

    /// Configuration file couldn't be parsed
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Processing stage an error occurred in
///
/// Verification doesn't fail with an [`Error`] for malformed input, it reports a [`Rejection`](crate::verifier::Rejection)
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    /// Building the signature base while signing
    Signing,
}

/// Signer/verifier error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Clock couldn't be read
    #[error("Clock failure")]
    Clock(#[from] ClockError),

    /// Invalid configuration
    #[error("Invalid configuration")]
    Configuration(#[from] ConfigurationError),

    /// Produced header value isn't a valid HTTP header value
    #[error("Invalid value for header \"{header}\"")]
    InvalidHeaderValue {
        /// Header the value was meant for
        header: HeaderName,

        /// Conversion error
        #[source]
        source: InvalidHeaderValue,
    },

    /// Key material couldn't be parsed
    #[error("Malformed key material")]
    KeyFormat(#[from] crypto::parse::Error),

    /// Request didn't contain what the covered components require
    #[error("Malformed input during {stage}")]
    MalformedInput {
        /// Stage the error occurred in
        stage: Stage,

        /// Underlying error, naming the component
        #[source]
        source: signature_base::Error,
    },
}

impl Error {
    /// Attach the stage to a signature base error
    ///
    /// Errors caused by the component list itself are reported as configuration errors
    #[must_use]
    pub fn signature_base(stage: Stage, source: signature_base::Error) -> Self {
        match source {
            signature_base::Error::EmptyComponents => ConfigurationError::EmptyComponents.into(),
            signature_base::Error::DuplicateComponent(component) => {
                ConfigurationError::DuplicateComponent(component).into()
            }
            source => Self::MalformedInput { stage, source },
        }
    }
}
