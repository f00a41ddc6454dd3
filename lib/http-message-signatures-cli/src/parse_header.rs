use crate::util::success_kaomoji;
use http_message_signatures::rfc9421;

pub fn do_it(header: String) -> miette::Result<()> {
    let members = match rfc9421::parse_signature_input(&header) {
        Ok(members) => members,
        Err(err) => return Err(miette::Error::new(err).with_source_code(header)),
    };

    for params in &members {
        println!(
            "{}: {} component(s), created {}",
            params.label,
            params.components.len(),
            params.created
        );
    }
    println!("✅ Header is valid! {}", success_kaomoji());

    Ok(())
}
