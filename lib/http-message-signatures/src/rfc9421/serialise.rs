use super::SignatureParams;
use std::fmt::Write;

/// Serialise the parameters as an inner list (`("@method" "@path");created=1618884473`)
///
/// This is the value of the `@signature-params` line as well as of the `Signature-Input` dictionary member
#[inline]
pub fn serialise_params(params: &SignatureParams) -> String {
    let mut buffer = String::from("(");
    for (idx, component) in params.components.iter().enumerate() {
        if idx > 0 {
            buffer.push(' ');
        }
        let _ = write!(buffer, "\"{}\"", component.as_str());
    }
    buffer.push(')');

    let _ = write!(buffer, ";created={}", params.created);

    buffer
}

/// Serialise the `Signature-Input` header value
#[inline]
pub fn serialise_input(params: &SignatureParams) -> String {
    format!("{}={}", params.label, serialise_params(params))
}

/// Serialise the `Signature` header value
#[inline]
pub fn serialise_signature(label: &str, encoded_signature: &str) -> String {
    format!("{label}=:{encoded_signature}:")
}

#[cfg(test)]
mod test {
    use crate::{component::SignatureComponent, rfc9421::SignatureParams};
    use http::HeaderName;

    #[test]
    fn signature_input() {
        let params = SignatureParams::new(
            "sig1",
            vec![
                SignatureComponent::content_digest(),
                SignatureComponent::Header(HeaderName::from_static("x-signature-key")),
                SignatureComponent::Method,
                SignatureComponent::TargetPath,
                SignatureComponent::Authority,
            ],
            1_658_440_308,
        );

        assert_eq!(
            super::serialise_input(&params),
            r#"sig1=("content-digest" "x-signature-key" "@method" "@path" "@authority");created=1658440308"#
        );
    }

    #[test]
    fn single_component() {
        let params = SignatureParams::new("sig1", vec![SignatureComponent::Method], 1);
        assert_eq!(super::serialise_params(&params), r#"("@method");created=1"#);
    }

    #[test]
    fn signature() {
        assert_eq!(super::serialise_signature("sig1", "AAAA"), "sig1=:AAAA:");
    }
}
