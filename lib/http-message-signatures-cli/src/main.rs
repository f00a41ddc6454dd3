use self::args::{ToolArgs, ToolSubcommand};
use clap::Parser;
use std::{env, io};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    layer::SubscriberExt,
    Layer, Registry,
};

mod args;
mod parse_header;
mod sign;
mod util;
mod verify;

fn initialise_logging() -> miette::Result<()> {
    let env_filter = env::var("RUST_LOG")
        .ok()
        .and_then(|targets| targets.parse().ok())
        .unwrap_or_else(|| Targets::default().with_default(LevelFilter::INFO));

    let subscriber = Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_filter(env_filter),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| miette::miette!("Couldn't install the global tracing subscriber: {err}"))
}

fn main() -> miette::Result<()> {
    initialise_logging()?;

    let args = ToolArgs::parse();
    let config = util::load_config(args.config.as_deref())?;

    match args.subcommand {
        ToolSubcommand::Sign(args) => sign::do_it(&config, args),
        ToolSubcommand::Verify(args) => verify::do_it(&config, &args),
        ToolSubcommand::ParseHeader(args) => parse_header::do_it(args.header),
    }
}
