use clap::Parser;
use std::process;
use xray_gen::cli::Cli;

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    if let Err(e) = xray_gen::run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
