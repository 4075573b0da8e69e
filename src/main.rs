use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = credadm::cli::Cli::parse();
    credadm::util::logging::init(cli.log_level.as_deref())?;
    cli.run()
}
