//!
//! Verification of inbound requests
//!
//! Verification failures are an expected outcome and are reported as a [`Verdict`], not as an [`Error`]
//!

use crate::{
    clock::Clock,
    component::SignatureComponent,
    config::{default_allowed_components, DEFAULT_MAX_AGE},
    crypto::{self, SignatureEncoding, VerifyError},
    digest::{self, ContentDigest},
    error::Error,
    request::RequestDescriptor,
    rfc9421::{
        self,
        safety_check::{self, SafetyCheckError},
        signature_base, ParseError, PathMode, SignatureBase, SignatureParams,
    },
    CONTENT_DIGEST_HEADER, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use http::{HeaderMap, HeaderName, HeaderValue, Request};
use miette::Diagnostic;
use ring::signature::UnparsedPublicKey;
use std::{borrow::Cow, time::Duration};
use strum::{AsRefStr, Display};
use thiserror::Error;
use tracing::{debug, info, instrument};
use typed_builder::TypedBuilder;

/// Signature headers are malformed
#[derive(Debug, Diagnostic, Error)]
pub enum MalformedHeader {
    /// Covered component list is empty or lists a component twice
    #[error(transparent)]
    Components(signature_base::Error),

    /// `Content-Digest` header couldn't be parsed
    #[error("Malformed Content-Digest header")]
    Digest(#[source] digest::Error),

    /// Header value contains non-visible ASCII characters
    #[error("Header \"{0}\" has an invalid value")]
    InvalidValue(HeaderName),

    /// Header is missing
    #[error("Missing header \"{0}\"")]
    Missing(HeaderName),

    /// No dictionary member with the configured label
    #[error("No signature labelled \"{0}\"")]
    MissingLabel(String),

    /// Dictionary syntax error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Signature isn't encoded in the configured encoding
    #[error("Malformed signature encoding")]
    SignatureEncoding(#[source] base64_simd::Error),
}

/// Reason code of a [`Rejection`]
#[derive(AsRefStr, Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum RejectionReason {
    /// Signature headers are malformed
    MalformedHeader,

    /// Request lacks what the covered components require
    MalformedRequest,

    /// Signature covers a component outside of the allow-list
    DisallowedComponent,

    /// Body doesn't match the `Content-Digest` header
    DigestMismatch,

    /// Signature doesn't match the signature base
    SignatureInvalid,

    /// Signature is older than the maximum age
    TimestampTooOld,
}

/// Reason a signature was rejected
#[derive(Debug, Diagnostic, Error)]
pub enum Rejection {
    /// Signature headers are malformed
    #[error("Malformed signature header")]
    MalformedHeader(#[from] MalformedHeader),

    /// Request lacks what the covered components require
    #[error("Malformed request")]
    MalformedRequest(#[source] signature_base::Error),

    /// Signature covers a component outside of the allow-list
    #[error("Component \"{0}\" isn't allowed")]
    DisallowedComponent(SignatureComponent),

    /// Body doesn't match the `Content-Digest` header
    #[error("Body doesn't match the content digest")]
    DigestMismatch,

    /// Signature doesn't match the signature base
    #[error("Invalid signature")]
    SignatureInvalid,

    /// Signature is older than the maximum age
    #[error("Signature too old (created {created}, maximum age {max_age:?})")]
    TimestampTooOld {
        /// Creation timestamp of the signature
        created: u64,

        /// Maximum accepted age
        max_age: Duration,
    },
}

impl Rejection {
    /// Machine-readable reason code
    #[must_use]
    pub fn reason(&self) -> RejectionReason {
        match self {
            Self::MalformedHeader(..) => RejectionReason::MalformedHeader,
            Self::MalformedRequest(..) => RejectionReason::MalformedRequest,
            Self::DisallowedComponent(..) => RejectionReason::DisallowedComponent,
            Self::DigestMismatch => RejectionReason::DigestMismatch,
            Self::SignatureInvalid => RejectionReason::SignatureInvalid,
            Self::TimestampTooOld { .. } => RejectionReason::TimestampTooOld,
        }
    }
}

impl From<SafetyCheckError> for Rejection {
    fn from(value: SafetyCheckError) -> Self {
        match value {
            SafetyCheckError::DisallowedComponent(component) => {
                Self::DisallowedComponent(component)
            }
            SafetyCheckError::SignatureTooOld { created, max_age } => {
                Self::TimestampTooOld { created, max_age }
            }
        }
    }
}

impl From<signature_base::Error> for Rejection {
    fn from(value: signature_base::Error) -> Self {
        if value.is_configuration_error() {
            MalformedHeader::Components(value).into()
        } else {
            Self::MalformedRequest(value)
        }
    }
}

impl From<VerifyError> for Rejection {
    fn from(value: VerifyError) -> Self {
        match value {
            VerifyError::Base64(err) => MalformedHeader::SignatureEncoding(err).into(),
            VerifyError::Verification => Self::SignatureInvalid,
        }
    }
}

/// Outcome of a verification
#[derive(Debug)]
#[must_use]
pub enum Verdict {
    /// Signature is valid
    Accepted,

    /// Signature was rejected
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the signature was accepted
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Reason of the rejection, if rejected
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Convert into a result
    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(value: Result<(), Rejection>) -> Self {
        match value {
            Ok(()) => Self::Accepted,
            Err(rejection) => Self::Rejected(rejection),
        }
    }
}

/// Header values consumed by the verifier
#[derive(Clone, Debug)]
pub struct SignatureHeaders<'a> {
    /// Value of the `Signature-Input` header
    pub signature_input: Cow<'a, str>,

    /// Value of the `Signature` header
    pub signature: Cow<'a, str>,

    /// Value of the `Content-Digest` header, if present
    pub content_digest: Option<&'a str>,
}

impl<'a> SignatureHeaders<'a> {
    /// Take the header values from a header map
    ///
    /// Dictionary members spread over multiple field lines are combined into one value
    pub fn from_headers(headers: &'a HeaderMap) -> Result<Self, Rejection> {
        let to_str = |name: &HeaderName, value: &'a HeaderValue| -> Result<&'a str, Rejection> {
            value
                .to_str()
                .map_err(|_| MalformedHeader::InvalidValue(name.clone()).into())
        };
        let dictionary = |name: &HeaderName| -> Result<Cow<'a, str>, Rejection> {
            let mut values = headers.get_all(name).iter();
            let first = values
                .next()
                .ok_or_else(|| MalformedHeader::Missing(name.clone()))?;

            let mut combined = Cow::Borrowed(to_str(name, first)?);
            for value in values {
                let combined = combined.to_mut();
                combined.push_str(", ");
                combined.push_str(to_str(name, value)?);
            }

            Ok(combined)
        };

        Ok(Self {
            signature_input: dictionary(&SIGNATURE_INPUT_HEADER)?,
            signature: dictionary(&SIGNATURE_HEADER)?,
            content_digest: headers
                .get(&CONTENT_DIGEST_HEADER)
                .map(|value| to_str(&CONTENT_DIGEST_HEADER, value))
                .transpose()?,
        })
    }
}

/// HTTP verifier
#[derive(Clone, Debug, TypedBuilder)]
pub struct HttpVerifier {
    /// Dictionary label of the signature that is verified
    #[builder(default = crate::DEFAULT_LABEL.to_string(), setter(into))]
    label: String,

    /// What `@path` covers
    #[builder(default)]
    path_mode: PathMode,

    /// Text encoding of the signature bytes
    #[builder(default)]
    signature_encoding: SignatureEncoding,

    /// Reject signatures older than this duration
    ///
    /// Defaults to 5 minutes, `None` disables the check
    #[builder(default = Some(Duration::from_secs(DEFAULT_MAX_AGE)))]
    max_age: Option<Duration>,

    /// Components a signature is allowed to cover
    #[builder(default = default_allowed_components())]
    allowed_components: Vec<SignatureComponent>,
}

impl HttpVerifier {
    /// Verify the signature of an HTTP request
    ///
    /// Only returns an error if the clock couldn't be read.
    /// The clock is only consulted if a maximum age is configured.
    #[instrument(skip_all, fields(label = %self.label))]
    pub fn verify<K, C>(
        &self,
        request: &RequestDescriptor<'_>,
        headers: &SignatureHeaders<'_>,
        public_key: &UnparsedPublicKey<K>,
        clock: &C,
    ) -> Result<Verdict, Error>
    where
        K: AsRef<[u8]>,
        C: Clock + ?Sized,
    {
        let now = self.max_age.map(|_| clock.unix_timestamp()).transpose()?;
        let verdict = Verdict::from(self.check(request, headers, public_key, now));

        match verdict {
            Verdict::Accepted => debug!("accepted signature"),
            Verdict::Rejected(ref rejection) => {
                info!(reason = %rejection.reason(), error = %rejection, "rejected signature");
            }
        }

        Ok(verdict)
    }

    /// Verify the signature of an HTTP request, taking the signature headers from the request itself
    pub fn verify_request<B, K, C>(
        &self,
        request: &Request<B>,
        public_key: &UnparsedPublicKey<K>,
        clock: &C,
    ) -> Result<Verdict, Error>
    where
        B: AsRef<[u8]>,
        K: AsRef<[u8]>,
        C: Clock + ?Sized,
    {
        let headers = match SignatureHeaders::from_headers(request.headers()) {
            Ok(headers) => headers,
            Err(rejection) => {
                info!(reason = %rejection.reason(), error = %rejection, "rejected signature");
                return Ok(Verdict::Rejected(rejection));
            }
        };

        self.verify(
            &RequestDescriptor::from_request(request),
            &headers,
            public_key,
            clock,
        )
    }

    fn find_params(&self, signature_input: &str) -> Result<SignatureParams, Rejection> {
        rfc9421::parse_signature_input(signature_input)
            .map_err(MalformedHeader::from)?
            .into_iter()
            .find(|params| params.label == self.label)
            .ok_or_else(|| MalformedHeader::MissingLabel(self.label.clone()).into())
    }

    fn find_signature<'a>(&self, signature: &'a str) -> Result<&'a str, Rejection> {
        rfc9421::parse_signature(signature)
            .map_err(MalformedHeader::from)?
            .into_iter()
            .find_map(|(label, signature)| (label == self.label).then_some(signature))
            .ok_or_else(|| MalformedHeader::MissingLabel(self.label.clone()).into())
    }

    fn check<K>(
        &self,
        request: &RequestDescriptor<'_>,
        headers: &SignatureHeaders<'_>,
        public_key: &UnparsedPublicKey<K>,
        now: Option<u64>,
    ) -> Result<(), Rejection>
    where
        K: AsRef<[u8]>,
    {
        let params = self.find_params(&headers.signature_input)?;
        let encoded_signature = self.find_signature(&headers.signature)?;

        safety_check::check_components(&params, &self.allowed_components)?;
        if let (Some(max_age), Some(now)) = (self.max_age, now) {
            safety_check::check_age(&params, max_age, now)?;
        }

        let content_digest = SignatureComponent::content_digest();
        let header_map = if params.covers(&content_digest) {
            let declared = headers
                .content_digest
                .ok_or_else(|| MalformedHeader::Missing(CONTENT_DIGEST_HEADER.clone()))?;
            let parsed: ContentDigest = declared.parse().map_err(MalformedHeader::Digest)?;

            // The digest has to match the received body before it is trusted as a covered value
            if !parsed.matches(request.body().unwrap_or_default()) {
                return Err(Rejection::DigestMismatch);
            }

            let value = HeaderValue::from_str(declared)
                .map_err(|_| MalformedHeader::InvalidValue(CONTENT_DIGEST_HEADER.clone()))?;
            let mut header_map = request.headers().clone();
            header_map.insert(CONTENT_DIGEST_HEADER.clone(), value);

            Cow::Owned(header_map)
        } else {
            Cow::Borrowed(request.headers())
        };

        let request = RequestDescriptor::new(
            request.method(),
            request.uri(),
            &header_map,
            request.body(),
        );
        let signature_base = SignatureBase::resolve(&request, &params, self.path_mode)?.to_string();

        crypto::verify(
            signature_base.as_bytes(),
            encoded_signature,
            self.signature_encoding,
            public_key,
        )?;

        Ok(())
    }
}

impl Default for HttpVerifier {
    fn default() -> Self {
        Self::builder().build()
    }
}
