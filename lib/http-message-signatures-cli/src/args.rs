use clap::{Args, Parser, Subcommand};
use http::Method;
use http_message_signatures::{KeyEncoding, SignatureComponent};
use std::path::PathBuf;

/// Request the signature is computed over
#[derive(Args)]
pub struct RequestArgs {
    /// Absolute URL of the request
    pub url: String,

    /// HTTP method of the request
    #[arg(default_value_t = Method::POST, long, short = 'X')]
    pub method: Method,

    /// File containing the exact body bytes
    #[arg(long, short)]
    pub body: Option<PathBuf>,

    /// Additional header in the `name: value` form
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Pin the clock to this UNIX timestamp instead of reading the system time
    #[arg(long)]
    pub timestamp: Option<u64>,
}

#[derive(Args)]
pub struct SignArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// File containing the Ed25519 private key
    #[arg(long, short)]
    pub key: PathBuf,

    /// Container format of the private key (defaults to the configured one)
    #[arg(long)]
    pub key_encoding: Option<KeyEncoding>,

    /// Opaque key envelope placed in the key reference header
    #[arg(long, short)]
    pub envelope: Option<String>,

    /// Covered component, in signing order
    ///
    /// Defaults to the key reference header (if an envelope is passed), `@method`, `@path` and `@authority`
    #[arg(long = "component", short)]
    pub components: Vec<SignatureComponent>,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// File containing the Ed25519 public key (SPKI PEM)
    #[arg(long, short)]
    pub public_key: PathBuf,
}

#[derive(Args)]
pub struct ParseHeaderArgs {
    /// The `Signature-Input` header to parse
    pub header: String,
}

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// Sign a request and print the signature headers
    Sign(SignArgs),

    /// Verify the signature headers of a request
    Verify(VerifyArgs),

    /// Parse the `Signature-Input` header and report any format errors
    ParseHeader(ParseHeaderArgs),
}

#[derive(Parser)]
#[command(about, version)]
pub struct ToolArgs {
    /// TOML configuration file
    #[arg(global = true, long, short)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub subcommand: ToolSubcommand,
}
