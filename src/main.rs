use color_eyre::Report;
use structopt::StructOpt;
use tei_editor::config::Flags;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[cfg(debug_assertions)]
const DEFAULT_FILTER: &str = "warn,tei_editor=debug";
#[cfg(not(debug_assertions))]
const DEFAULT_FILTER: &str = "warn,tei_editor=info";

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;
    setup_tracing();

    let flags = Flags::from_args();
    let cfg = flags.load_cfg().await?;
    let output = flags.cmd.run(&cfg).await?;
    print!("{}", output);
    Ok(())
}
