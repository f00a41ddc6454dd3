use divan::black_box;
use http_message_signatures::rfc9421;

#[global_allocator]
static GLOBAL: divan::AllocProfiler = divan::AllocProfiler::system();

const SINGLE_MEMBER: &str = r#"sig1=("content-digest" "x-ebay-signature-key" "@method" "@path" "@authority");created=1658440308"#;
const MULTIPLE_MEMBERS: &str = r#"sig0=("@method" "@path");created=1658440000, sig1=("content-digest" "x-ebay-signature-key" "@method" "@path" "@authority");created=1658440308"#;

#[divan::bench(args = [SINGLE_MEMBER, MULTIPLE_MEMBERS])]
fn parse_signature_input(input: &str) {
    let _ = black_box(rfc9421::parse_signature_input(black_box(input)));
}

fn main() {
    divan::main();
}
