use anyhow::Result;
use greenmap::cli;

fn main() -> Result<()> {
    let cli = cli::parse_args();
    cli::init_logging(cli.verbosity);
    cli::run(cli)
}
