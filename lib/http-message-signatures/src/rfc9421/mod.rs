//!
//! RFC 9421 style signature headers
//!
//! Implements the fixed subset used by the target API: `@method`, `@path` and `@authority` as derived
//! components, arbitrary header components, and `created` as the only signature parameter
//!

use crate::component::SignatureComponent;

mod parse;
mod serialise;

pub mod safety_check;
pub mod signature_base;

pub use self::{
    parse::{parse_signature, parse_signature_input, ParseError, ParseErrorKind},
    serialise::{serialise_input, serialise_params, serialise_signature},
    signature_base::{PathMode, SignatureBase},
};

/// Parameters of a single signature
///
/// Constructed by the signer and parsed back by the verifier from the `Signature-Input` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParams {
    /// Dictionary key identifying the signature (`sig1`)
    pub label: String,

    /// Covered components in the order they are signed
    pub components: Vec<SignatureComponent>,

    /// Creation timestamp in seconds since the UNIX epoch
    pub created: u64,
}

impl SignatureParams {
    /// Construct a new set of signature parameters
    #[must_use]
    pub fn new(label: impl Into<String>, components: Vec<SignatureComponent>, created: u64) -> Self {
        Self {
            label: label.into(),
            components,
            created,
        }
    }

    /// Whether the component is covered by the signature
    #[must_use]
    pub fn covers(&self, component: &SignatureComponent) -> bool {
        self.components.contains(component)
    }
}
