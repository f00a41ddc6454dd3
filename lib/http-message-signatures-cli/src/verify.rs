use crate::{
    args::VerifyArgs,
    util::{self, error_kaomoji, success_kaomoji},
};
use http_message_signatures::{crypto::parse, Configuration, PublicKeyMaterial, Verdict};
use miette::{Context, IntoDiagnostic};
use std::fs;

pub fn do_it(config: &Configuration, args: &VerifyArgs) -> miette::Result<()> {
    let verifier = config.verifier();
    let request = util::build_request(&args.request)?;

    let pem = fs::read_to_string(&args.public_key)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", args.public_key.display()))?;
    let public_key = parse::public_key(&PublicKeyMaterial::Pem(&pem))?;

    let clock = util::clock(&args.request);
    match verifier.verify_request(&request, &public_key, clock.as_ref())? {
        Verdict::Accepted => {
            println!("✅ Signature is valid! {}", success_kaomoji());
            Ok(())
        }
        Verdict::Rejected(rejection) => {
            println!("❌ Signature rejected ({}) {}", rejection.reason(), error_kaomoji());
            Err(rejection.into())
        }
    }
}
