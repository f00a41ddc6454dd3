use divan::{black_box, Bencher};
use http::{Method, Request, Uri};
use http_message_signatures::{
    rfc9421::{self, signature_base, PathMode},
    RequestDescriptor,
};

#[global_allocator]
static GLOBAL: divan::AllocProfiler = divan::AllocProfiler::system();

const SIGNATURE_INPUT: &str = r#"sig1=("content-digest" "x-ebay-signature-key" "@method" "@path" "@authority");created=1658440308"#;

#[divan::bench]
fn build_signature_base(bencher: Bencher<'_, '_>) {
    let params = rfc9421::parse_signature_input(SIGNATURE_INPUT)
        .unwrap()
        .remove(0);
    let request = Request::builder()
        .method(Method::POST)
        .uri(Uri::from_static(
            "https://api.ebay.com/sell/inventory/v1/offer?marketplace_id=EBAY_US",
        ))
        .header("Content-Type", "application/json")
        .header(
            "Content-Digest",
            "sha-256=:X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=:",
        )
        .header("X-EBAY-Signature-Key", "eyJ6aXAiOiJERUYiLCJlbmMiOiJBMjU2R0NNIn0.opaque")
        .body(br#"{"hello": "world"}"#.to_vec())
        .unwrap();

    bencher.bench(|| {
        signature_base::construct(
            black_box(&RequestDescriptor::from_request(&request)),
            black_box(&params),
            PathMode::PathOnly,
        )
    });
}

fn main() {
    divan::main();
}
