//!
//! Policy checks run on parsed signature parameters before any cryptographic work happens
//!

use super::SignatureParams;
use crate::component::SignatureComponent;
use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

/// Policy violation
#[derive(Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum SafetyCheckError {
    /// Signature covers a component outside of the allow-list
    #[error("Component \"{0}\" isn't allowed")]
    DisallowedComponent(SignatureComponent),

    /// Signature was created too long ago
    #[error("Signature too old (created {created}, maximum age {max_age:?})")]
    SignatureTooOld {
        /// Creation timestamp of the signature
        created: u64,

        /// Maximum accepted age
        max_age: Duration,
    },
}

/// First element of `left` that isn't contained in `right`
#[inline]
fn first_outside<'a, I>(left: &'a [I], right: &[I]) -> Option<&'a I>
where
    I: PartialEq,
{
    left.iter().find(|item| !right.contains(item))
}

/// Ensure every covered component is allow-listed
#[inline]
pub fn check_components(
    params: &SignatureParams,
    allowed: &[SignatureComponent],
) -> Result<(), SafetyCheckError> {
    match first_outside(&params.components, allowed) {
        Some(component) => Err(SafetyCheckError::DisallowedComponent(component.clone())),
        None => Ok(()),
    }
}

/// Ensure the signature isn't older than the maximum age
///
/// `now` is the current time in seconds since the UNIX epoch.
/// Signatures claiming a creation time in the future are not considered too old.
#[inline]
pub fn check_age(
    params: &SignatureParams,
    max_age: Duration,
    now: u64,
) -> Result<(), SafetyCheckError> {
    if now.saturating_sub(params.created) > max_age.as_secs() {
        return Err(SafetyCheckError::SignatureTooOld {
            created: params.created,
            max_age,
        });
    }

    Ok(())
}
