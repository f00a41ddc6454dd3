//!
//! Construction of the signature base, the exact string that gets signed
//!

use super::SignatureParams;
use crate::{component::SignatureComponent, request::RequestDescriptor};
use http::{header::ToStrError, HeaderName};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashSet, fmt};
use thiserror::Error;

/// Signature base error
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    /// Component is listed more than once
    #[error("Component \"{0}\" is covered more than once")]
    DuplicateComponent(SignatureComponent),

    /// No components were listed
    #[error("No components to cover")]
    EmptyComponents,

    /// Header had an invalid value (non-visible ASCII value)
    #[error("Header \"{name}\" has an invalid value")]
    InvalidHeaderValue {
        /// Name of the header
        name: HeaderName,

        /// Conversion error
        #[source]
        source: ToStrError,
    },

    /// Neither an absolute URI nor a `Host` header were present
    #[error("Missing request authority")]
    MissingAuthority,

    /// Header is missing from the request
    #[error("Missing value for header \"{0}\"")]
    MissingHeaderValue(HeaderName),
}

impl Error {
    /// Whether the error stems from the component list rather than the request
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::DuplicateComponent(..) | Self::EmptyComponents)
    }
}

/// What `@path` covers
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMode {
    /// Only the path, without the query
    #[default]
    PathOnly,

    /// The path followed by `?` and the query, if there is one
    PathAndQuery,
}

/// Resolved signature base
///
/// Ordered component values followed by the signature parameters.
/// Its [`Display`](fmt::Display) implementation produces the signed string.
#[derive(Clone, Debug)]
pub struct SignatureBase<'a> {
    entries: Vec<(&'a SignatureComponent, Cow<'a, str>)>,
    params: &'a SignatureParams,
}

impl<'a> SignatureBase<'a> {
    /// Resolve all components of the parameters against the request
    pub fn resolve(
        request: &RequestDescriptor<'a>,
        params: &'a SignatureParams,
        path_mode: PathMode,
    ) -> Result<Self, Error> {
        check_components(&params.components)?;

        let entries = params
            .components
            .iter()
            .map(|component| Ok((component, resolve_component(request, component, path_mode)?)))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self { entries, params })
    }

    /// Resolved values in signing order
    pub fn entries(&self) -> impl Iterator<Item = (&SignatureComponent, &str)> {
        self.entries
            .iter()
            .map(|(component, value)| (*component, value.as_ref()))
    }
}

impl fmt::Display for SignatureBase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (component, value) in &self.entries {
            writeln!(f, "\"{}\": {value}", component.as_str())?;
        }

        write!(
            f,
            "\"@signature-params\": {}",
            super::serialise_params(self.params)
        )
    }
}

#[inline]
fn check_components(components: &[SignatureComponent]) -> Result<(), Error> {
    if components.is_empty() {
        return Err(Error::EmptyComponents);
    }

    let mut seen = HashSet::with_capacity(components.len());
    for component in components {
        if !seen.insert(component) {
            return Err(Error::DuplicateComponent(component.clone()));
        }
    }

    Ok(())
}

fn resolve_component<'a>(
    request: &RequestDescriptor<'a>,
    component: &SignatureComponent,
    path_mode: PathMode,
) -> Result<Cow<'a, str>, Error> {
    let value = match component {
        SignatureComponent::Method => {
            let method = request.method().as_str();
            if method.bytes().any(|byte| byte.is_ascii_lowercase()) {
                Cow::Owned(method.to_ascii_uppercase())
            } else {
                Cow::Borrowed(method)
            }
        }
        SignatureComponent::TargetPath => {
            let uri = request.uri();
            let path = match path_mode {
                PathMode::PathOnly => uri.path(),
                PathMode::PathAndQuery => uri
                    .path_and_query()
                    .map_or_else(|| uri.path(), |path_and_query| path_and_query.as_str()),
            };

            Cow::Borrowed(path)
        }
        SignatureComponent::Authority => {
            Cow::Owned(request.authority().ok_or(Error::MissingAuthority)?)
        }
        SignatureComponent::Header(name) => {
            let mut values = request.headers().get_all(name).iter().map(|value| {
                value.to_str().map_err(|source| Error::InvalidHeaderValue {
                    name: name.clone(),
                    source,
                })
            });

            let first = values
                .next()
                .ok_or_else(|| Error::MissingHeaderValue(name.clone()))??;

            // Multiple field lines get combined into one value
            let mut combined = Cow::Borrowed(first);
            for value in values {
                let combined = combined.to_mut();
                combined.push_str(", ");
                combined.push_str(value?);
            }

            combined
        }
    };

    Ok(value)
}

/// Construct the signature base string for the request
#[inline]
pub fn construct(
    request: &RequestDescriptor<'_>,
    params: &SignatureParams,
    path_mode: PathMode,
) -> Result<String, Error> {
    SignatureBase::resolve(request, params, path_mode).map(|base| base.to_string())
}
