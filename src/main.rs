use anyhow::Result;

fn main() -> Result<()> {
    tracewipe_cli::run_cli()
}
