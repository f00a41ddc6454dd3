use crate::{args::SignArgs, util};
use http_message_signatures::{Configuration, KeyMaterial, SignatureComponent};
use miette::{Context, IntoDiagnostic};
use std::fs;

pub fn do_it(config: &Configuration, args: SignArgs) -> miette::Result<()> {
    let signer = config.signer()?;
    let mut request = util::build_request(&args.request)?;

    let key_data = fs::read(&args.key)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", args.key.display()))?;
    let mut key = KeyMaterial::new(
        &key_data,
        args.key_encoding.unwrap_or(config.key_encoding),
    );
    if let Some(ref envelope) = args.envelope {
        key = key.with_envelope(envelope);
    }

    let components = if args.components.is_empty() {
        let mut components = Vec::with_capacity(4);
        if args.envelope.is_some() {
            components.push(SignatureComponent::header(config.key_reference_header()?));
        }
        components.extend([
            SignatureComponent::Method,
            SignatureComponent::TargetPath,
            SignatureComponent::Authority,
        ]);
        components
    } else {
        args.components
    };

    let clock = util::clock(&args.request);
    let signed = signer.sign_request(&mut request, &components, &key, clock.as_ref())?;

    if let Some(ref content_digest) = signed.content_digest {
        println!("content-digest: {content_digest}");
    }
    if let Some((ref name, ref envelope)) = signed.key_reference {
        println!("{name}: {envelope}");
    }
    println!("signature-input: {}", signed.signature_input);
    println!("signature: {}", signed.signature);

    Ok(())
}
