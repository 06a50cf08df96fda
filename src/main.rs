use netpolicy_injector::cli;

fn main() -> anyhow::Result<()> {
    cli::run_cli()
}
