use crate::args::RequestArgs;
use http::{HeaderName, HeaderValue, Request};
use http_message_signatures::{
    clock::{FixedClock, SystemClock},
    Clock, Configuration,
};
use miette::{Context, IntoDiagnostic};
use owo_colors::{OwoColorize, Stream};
use std::{fmt::Display, fs, path::Path};

#[inline]
pub fn error_kaomoji() -> impl Display {
    "(┬┬﹏┬┬)".if_supports_color(Stream::Stdout, |text| text.red())
}

#[inline]
pub fn success_kaomoji() -> impl Display {
    "(^///^)".if_supports_color(Stream::Stdout, |text| text.green())
}

pub fn load_config(path: Option<&Path>) -> miette::Result<Configuration> {
    let Some(path) = path else {
        return Ok(Configuration::default());
    };

    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    Configuration::from_toml(&content).map_err(|err| miette::Error::new(err).with_source_code(content))
}

pub fn clock(args: &RequestArgs) -> Box<dyn Clock> {
    match args.timestamp {
        Some(timestamp) => Box::new(FixedClock::from_unix_timestamp(timestamp)),
        None => Box::new(SystemClock),
    }
}

pub fn build_request(args: &RequestArgs) -> miette::Result<Request<Vec<u8>>> {
    let body = match args.body {
        Some(ref path) => fs::read(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?,
        None => Vec::new(),
    };

    let mut request = Request::builder()
        .method(args.method.clone())
        .uri(args.url.as_str())
        .body(body)
        .into_diagnostic()
        .wrap_err("Invalid request")?;

    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| miette::miette!("Header \"{header}\" isn't in the `name: value` form"))?;

        let name = HeaderName::from_bytes(name.trim().as_bytes()).into_diagnostic()?;
        let value = HeaderValue::from_str(value.trim()).into_diagnostic()?;
        request.headers_mut().append(name, value);
    }

    Ok(request)
}
