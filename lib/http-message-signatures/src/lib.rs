//!
//! HTTP message signatures
//!
//! Signs and verifies HTTP requests with Ed25519 using an RFC 9421 style signature base,
//! binding request bodies through the `Content-Digest` header.
//!

#![deny(missing_docs)]

use http::HeaderName;

pub mod clock;
pub mod component;
pub mod config;
pub mod crypto;
pub mod digest;
pub mod error;
pub mod request;
pub mod rfc9421;
pub mod signer;
pub mod verifier;

pub use self::{
    clock::Clock,
    component::SignatureComponent,
    config::Configuration,
    crypto::parse::{KeyEncoding, KeyMaterial, PublicKeyMaterial},
    digest::ContentDigest,
    error::Error,
    request::RequestDescriptor,
    signer::{HttpSigner, SignedHeaders},
    verifier::{HttpVerifier, Rejection, RejectionReason, SignatureHeaders, Verdict},
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// `Signature` header
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("signature");

/// `Signature-Input` header
pub static SIGNATURE_INPUT_HEADER: HeaderName = HeaderName::from_static("signature-input");

/// `Content-Digest` header
pub static CONTENT_DIGEST_HEADER: HeaderName = HeaderName::from_static("content-digest");

/// Header carrying the opaque key envelope unless configured otherwise
pub static DEFAULT_KEY_REFERENCE_HEADER: HeaderName =
    HeaderName::from_static("x-ebay-signature-key");

/// Label used for the signature dictionary member unless configured otherwise
pub const DEFAULT_LABEL: &str = "sig1";
