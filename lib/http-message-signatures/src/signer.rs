//!
//! Signing of outgoing requests
//!

use crate::{
    clock::Clock,
    component::SignatureComponent,
    crypto::{self, parse::KeyMaterial, SignatureEncoding},
    digest::{self, ContentDigest},
    error::{ConfigurationError, Error, Stage},
    request::RequestDescriptor,
    rfc9421::{self, PathMode, SignatureBase, SignatureParams},
    CONTENT_DIGEST_HEADER, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use http::{HeaderMap, HeaderName, HeaderValue, Request};
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

#[inline]
fn header_value(header: &HeaderName, value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|source| Error::InvalidHeaderValue {
        header: header.clone(),
        source,
    })
}

/// Headers produced by a signing operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value of the `Signature-Input` header
    pub signature_input: String,

    /// Value of the `Signature` header
    pub signature: String,

    /// Value of the `Content-Digest` header, if the request carries a body
    pub content_digest: Option<String>,

    /// Key reference header and the envelope it carries, if an envelope was attached to the key
    pub key_reference: Option<(HeaderName, String)>,
}

impl SignedHeaders {
    /// Insert the headers into the map, replacing existing values
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        if let Some(ref content_digest) = self.content_digest {
            headers.insert(
                CONTENT_DIGEST_HEADER.clone(),
                header_value(&CONTENT_DIGEST_HEADER, content_digest)?,
            );
        }

        if let Some((ref name, ref envelope)) = self.key_reference {
            headers.insert(name.clone(), header_value(name, envelope)?);
        }

        headers.insert(
            SIGNATURE_INPUT_HEADER.clone(),
            header_value(&SIGNATURE_INPUT_HEADER, &self.signature_input)?,
        );
        headers.insert(
            SIGNATURE_HEADER.clone(),
            header_value(&SIGNATURE_HEADER, &self.signature)?,
        );

        Ok(())
    }

    /// Collect the headers into a new map
    pub fn to_header_map(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::with_capacity(4);
        self.apply(&mut headers)?;
        Ok(headers)
    }
}

/// HTTP signer
#[derive(Clone, Debug, TypedBuilder)]
pub struct HttpSigner {
    /// Dictionary label of the signature
    #[builder(default = crate::DEFAULT_LABEL.to_string(), setter(into))]
    label: String,

    /// Algorithm of the `Content-Digest` header
    #[builder(default)]
    digest_algorithm: digest::Algorithm,

    /// What `@path` covers
    #[builder(default)]
    path_mode: PathMode,

    /// Text encoding of the signature bytes
    #[builder(default)]
    signature_encoding: SignatureEncoding,

    /// Header the key envelope is placed in
    #[builder(default = crate::DEFAULT_KEY_REFERENCE_HEADER.clone())]
    key_reference_header: HeaderName,
}

impl HttpSigner {
    /// Components actually covered by the signature
    ///
    /// `content-digest` leads the list if and only if the request carries a body
    fn covered_components(
        components: &[SignatureComponent],
        has_body: bool,
    ) -> Vec<SignatureComponent> {
        let content_digest = SignatureComponent::content_digest();

        let mut covered = Vec::with_capacity(components.len() + 1);
        if has_body {
            covered.push(content_digest.clone());
        }
        covered.extend(
            components
                .iter()
                .filter(|component| **component != content_digest)
                .cloned(),
        );

        covered
    }

    /// Sign an HTTP request
    ///
    /// The components are covered in the order they are passed in.
    /// If the request carries a body, its digest is computed and covered first.
    #[instrument(skip_all, fields(label = %self.label))]
    pub fn sign<C>(
        &self,
        request: &RequestDescriptor<'_>,
        components: &[SignatureComponent],
        key: &KeyMaterial<'_>,
        clock: &C,
    ) -> Result<SignedHeaders, Error>
    where
        C: Clock + ?Sized,
    {
        if components.is_empty() {
            return Err(ConfigurationError::EmptyComponents.into());
        }

        let key_pair = crypto::parse::private_key(key)?;
        let created = clock.unix_timestamp()?;

        let content_digest = request
            .body()
            .map(|body| ContentDigest::compute_with(self.digest_algorithm, body).to_string());
        let key_reference = key
            .envelope()
            .map(|envelope| (self.key_reference_header.clone(), envelope.to_string()));

        // Snapshot the headers as they will go out on the wire
        let mut headers = request.headers().clone();
        if let Some(ref content_digest) = content_digest {
            headers.insert(
                CONTENT_DIGEST_HEADER.clone(),
                header_value(&CONTENT_DIGEST_HEADER, content_digest)?,
            );
        }
        if let Some((ref name, ref envelope)) = key_reference {
            headers.insert(name.clone(), header_value(name, envelope)?);
        }

        let params = SignatureParams::new(
            self.label.clone(),
            Self::covered_components(components, content_digest.is_some()),
            created,
        );
        let request = RequestDescriptor::new(
            request.method(),
            request.uri(),
            &headers,
            request.body(),
        );

        let signature_base = SignatureBase::resolve(&request, &params, self.path_mode)
            .map_err(|err| Error::signature_base(Stage::Signing, err))?
            .to_string();

        let signature = crypto::sign(
            signature_base.as_bytes(),
            &key_pair,
            self.signature_encoding,
        );

        debug!(
            created,
            components = params.components.len(),
            has_digest = content_digest.is_some(),
            "signed request"
        );

        Ok(SignedHeaders {
            signature_input: rfc9421::serialise_input(&params),
            signature: rfc9421::serialise_signature(&params.label, &signature),
            content_digest,
            key_reference,
        })
    }

    /// Sign an HTTP request and insert the produced headers into it
    pub fn sign_request<B, C>(
        &self,
        request: &mut Request<B>,
        components: &[SignatureComponent],
        key: &KeyMaterial<'_>,
        clock: &C,
    ) -> Result<SignedHeaders, Error>
    where
        B: AsRef<[u8]>,
        C: Clock + ?Sized,
    {
        let signed = self.sign(
            &RequestDescriptor::from_request(request),
            components,
            key,
            clock,
        )?;
        signed.apply(request.headers_mut())?;

        Ok(signed)
    }
}

impl Default for HttpSigner {
    fn default() -> Self {
        Self::builder().build()
    }
}
